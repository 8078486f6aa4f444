//! Integration tests for the `validate` command.
use elysim::cli::handle_validate_command;
use elysim::settings::Settings;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// An integration test for the `validate` command.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("ELYSIM_LOG_LEVEL", "off") };

    for name in ["simple", "hybrid_ammonia"] {
        let scenario_dir = Path::new("scenarios").join(name);
        handle_validate_command(&scenario_dir, Some(Settings::default())).unwrap();
    }

    // A scenario whose location has no traces is rejected
    let dir = tempdir().unwrap();
    for file_name in ["scenario.toml", "solar_traces.csv", "wind_traces.csv"] {
        fs::copy(
            Path::new("scenarios/simple").join(file_name),
            dir.path().join(file_name),
        )
        .unwrap();
    }
    let scenario = fs::read_to_string(dir.path().join("scenario.toml")).unwrap();
    fs::write(
        dir.path().join("scenario.toml"),
        scenario.replace("\"north\"", "\"west\""),
    )
    .unwrap();
    assert!(handle_validate_command(dir.path(), Some(Settings::default())).is_err());
}
