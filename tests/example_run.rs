//! Integration tests for the `example run` command.
use elysim::cli::RunOpts;
use elysim::cli::example::handle_example_run_command;
use elysim::settings::Settings;
use std::fs;
use tempfile::tempdir;

/// Run every bundled example and check that costs are produced for each.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("ELYSIM_LOG_LEVEL", "off") };

    for name in ["simple", "hybrid_ammonia"] {
        let tempdir = tempdir().unwrap();
        let opts = RunOpts {
            output_dir: Some(tempdir.path().to_path_buf()),
            overwrite: false,
        };
        handle_example_run_command(name, &opts, Some(Settings::default())).unwrap();

        let levelised = fs::read_to_string(tempdir.path().join("levelised_costs.csv")).unwrap();
        let total = levelised.lines().last().unwrap();
        let (component, cost) = total.split_once(',').unwrap();
        assert_eq!(component, "Total");
        assert!(cost.parse::<f64>().unwrap() > 0.0, "{name}: {total}");
    }
}
