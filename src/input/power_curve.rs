//! Code for reading power curve tables.
use super::{check_input_exists, input_err_msg, parse_value};
use crate::power_curve::PowerCurve;
use crate::units::{Power, WindSpeed};
use anyhow::{Context, Result, ensure};
use log::warn;
use std::path::Path;

/// Read a power curve table from a semicolon-separated file.
///
/// The file has two columns (wind speed in m/s and power in kW). The first `header_rows` rows are
/// skipped and rows which do not contain two numbers are dropped with a warning.
///
/// # Arguments
///
/// * `file_path` - Path to the power curve file
/// * `header_rows` - Number of header rows to skip
pub fn read_power_curve(file_path: &Path, header_rows: usize) -> Result<PowerCurve> {
    check_input_exists(file_path)?;
    read_power_curve_from_file(file_path, header_rows).with_context(|| input_err_msg(file_path))
}

fn read_power_curve_from_file(file_path: &Path, header_rows: usize) -> Result<PowerCurve> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(file_path)?;

    let mut points = Vec::new();
    let mut dropped = 0;
    for record in reader.records().skip(header_rows) {
        let record = record?;
        let parsed = match (record.get(0), record.get(1)) {
            (Some(speed), Some(power)) => parse_value(speed, None)
                .ok()
                .zip(parse_value(power, None).ok())
                .filter(|(speed, power)| !speed.is_nan() && !power.is_nan()),
            _ => None,
        };

        match parsed {
            Some((speed, power)) => points.push((WindSpeed(speed), Power(power))),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(
            "Dropped {dropped} non-numeric row(s) from power curve file {}",
            file_path.display()
        );
    }
    ensure!(!points.is_empty(), "Power curve file contains no entries");

    PowerCurve::new(points)
}
