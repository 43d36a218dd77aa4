//! Integration tests for the `run` command.
use std::path::PathBuf;
use tempfile::tempdir;
use windvalue::cli::{RunOpts, handle_run_command};
use windvalue::settings::Settings;

/// Get the path to the example project.
fn get_project_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("WINDVALUE_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        ..RunOpts::default()
    };
    handle_run_command(&get_project_dir(), &opts, Some(Settings::default())).unwrap();

    for file_name in [
        "metadata.toml",
        "unit_status.csv",
        "value_factor_summary.csv",
        "windvalue_info.log",
        "windvalue_error.log",
        "wind_power/wind_power_2020.csv",
        "regions/wp_DE_2020.csv",
        "regions/wp_DK_1_2020.csv",
        "capture_price/capture_price_DE_2020.csv",
        "value_factor/value_factor_DE_2020.csv",
        "value_factor_zonal/value_factor_DK_2020.csv",
        "value_factor_zonal/value_factor_DK_1_2020.csv",
    ] {
        assert!(output_dir.join(file_name).is_file(), "Missing {file_name}");
    }

    // No data for 2021
    assert!(!output_dir.join("regions/wp_DE_2021.csv").exists());

    // Second time will fail because the output folder is not empty
    assert_eq!(
        handle_run_command(&get_project_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    );

    // ...and with --overwrite, because the logging is already initialised
    let opts = RunOpts {
        overwrite: true,
        ..opts
    };
    assert_eq!(
        handle_run_command(&get_project_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}
