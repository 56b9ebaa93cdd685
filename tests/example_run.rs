//! Integration tests for the `example run` command.
use steel_emissions::cli::RunOpts;
use steel_emissions::cli::example::handle_example_run_command;
use steel_emissions::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("STEEL_EMISSIONS_LOG_LEVEL", "off") };

    let dir = tempdir().unwrap();
    let output_dir = dir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_example_run_command("china", &opts, Some(Settings::default())).unwrap();
    assert!(output_dir.join("projections.csv").is_file());
}
