//! Integration tests for the `run` command.
use elysim::cli::{RunOpts, handle_run_command};
use elysim::settings::Settings;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the simple example scenario.
fn get_scenario_dir() -> PathBuf {
    PathBuf::from("scenarios/simple")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("ELYSIM_LOG_LEVEL", "off") };

    // Save results to a non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_run_command(&get_scenario_dir(), &opts, Some(Settings::default())).unwrap();

    for file_name in [
        "annual_summary.csv",
        "hourly_operation.csv",
        "capital_costs.csv",
        "operating_costs.csv",
        "levelised_costs.csv",
        "metadata.toml",
        "elysim_info.log",
        "elysim_error.log",
    ] {
        assert!(output_dir.join(file_name).is_file(), "{file_name} missing");
    }

    // Running again needs permission to replace the results
    assert!(handle_run_command(&get_scenario_dir(), &opts, Some(Settings::default())).is_err());
    let opts = RunOpts {
        overwrite: true,
        ..opts
    };
    handle_run_command(&get_scenario_dir(), &opts, Some(Settings::default())).unwrap();
}
