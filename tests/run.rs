//! Integration tests for the `run` command.
use std::fs;
use std::path::PathBuf;
use steel_emissions::cli::{RunOpts, handle_run_command};
use steel_emissions::settings::Settings;
use tempfile::tempdir;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/china")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("STEEL_EMISSIONS_LOG_LEVEL", "off") };

    {
        // Save results to non-existent directory to check that directory creation works
        let tempdir = tempdir().unwrap();
        let output_dir = tempdir.path().join("results");
        let opts = RunOpts {
            output_dir: Some(output_dir.clone()),
            overwrite: false,
        };
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

        for file_name in [
            "plant_years.csv",
            "company_years.csv",
            "company_totals.csv",
            "company_trends.csv",
            "projections.csv",
            "technology_emissions.csv",
            "production_comparison.csv",
            "data_quality_warnings.csv",
            "metadata.toml",
            "steel_emissions_info.log",
            "steel_emissions_error.log",
        ] {
            assert!(output_dir.join(file_name).is_file(), "missing {file_name}");
        }
    }

    // Second time will fail because the logging is already initialised
    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
    };
    assert_eq!(
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}

/// A model which fails to load must not remove the results of an earlier run
#[test]
fn test_handle_run_command_bad_model_keeps_output() {
    let model_dir = tempdir().unwrap();
    fs::write(model_dir.path().join("model.toml"), "start_year = 2020\n").unwrap();

    let output_dir = tempdir().unwrap();
    let old_results = output_dir.path().join("plant_years.csv");
    fs::write(&old_results, "plant_id,year\n").unwrap();

    let opts = RunOpts {
        output_dir: Some(output_dir.path().to_path_buf()),
        overwrite: true,
    };
    let err = handle_run_command(model_dir.path(), &opts, Some(Settings::default())).unwrap_err();
    assert_eq!(err.to_string(), "Failed to load model.");
    assert!(old_results.is_file());
}
