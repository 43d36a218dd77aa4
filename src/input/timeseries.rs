//! Code for reading regional time series written by an earlier pipeline stage.
use super::{deserialise_timestamp, input_err_msg, read_csv};
use crate::timeseries::TimeSeries;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct TimeSeriesRaw {
    #[serde(deserialize_with = "deserialise_timestamp")]
    time: DateTime<Utc>,
    generation: Option<f64>,
}

/// Read a regional generation time series.
///
/// The file has `time` and `generation` columns; empty generation fields are missing values.
pub fn read_generation_series(file_path: &Path) -> Result<TimeSeries> {
    let rows: Vec<TimeSeriesRaw> = read_csv(file_path)?;
    let (times, values) = rows
        .into_iter()
        .map(|row| (row.time, row.generation.unwrap_or(f64::NAN)))
        .unzip();
    TimeSeries::new(times, values).with_context(|| input_err_msg(file_path))
}
