//! Common functionality for the windvalue pipeline.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod boundary;
pub mod capture_price;
pub mod cli;
pub mod grid;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod power_curve;
pub mod project;
pub mod region;
pub mod settings;
pub mod timeseries;
pub mod units;
pub mod value_factor;
pub mod wind_power;
pub mod year;
pub mod zonal;

#[cfg(test)]
mod fixture;

/// Get the path to the windvalue config directory (e.g. `~/.config/windvalue` on Linux)
pub fn get_windvalue_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        panic!("Could not get user's config directory")
    };

    config_dir.push("windvalue");
    config_dir
}
