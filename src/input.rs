//! Common routines for handling input data.
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use float_cmp::approx_eq;
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub mod boundary;
pub mod grid;
pub mod power_curve;
pub mod prices;
pub mod timeseries;

/// Formats accepted for timestamps without an explicit offset. These are interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
];

/// Indicates that an expected input file is absent.
///
/// Units of work whose input is missing are skipped rather than treated as failures, so this error
/// is kept distinct from other input errors.
#[derive(Debug, Clone)]
pub struct MissingInputError {
    path: PathBuf,
}

impl MissingInputError {
    /// Create a new [`MissingInputError`] for the given path
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// The path of the missing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for MissingInputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Input file not found: {}", self.path.display())
    }
}

impl Error for MissingInputError {}

/// Check that the given input file exists, returning a [`MissingInputError`] if not
pub fn check_input_exists(file_path: &Path) -> Result<()> {
    if !file_path.is_file() {
        Err(MissingInputError::new(file_path))?;
    }

    Ok(())
}

/// Whether the error (or any error in its chain) indicates a missing input file
pub fn is_missing_input(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<MissingInputError>().is_some())
}

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    check_input_exists(file_path)?;

    let vec: Vec<T> = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .try_collect()
        .with_context(|| input_err_msg(file_path))?;

    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    check_input_exists(file_path)?;
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Indicates whether an iterator is sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Read a value, checking that it is greater than 0 and less than or equal to 1
pub fn deserialise_proportion_nonzero<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Into<f64> + Copy,
{
    let value: T = Deserialize::deserialize(deserialiser)?;
    let raw: f64 = value.into();
    if !(raw > 0.0 && raw <= 1.0) {
        Err(serde::de::Error::custom("Value must be > 0 and <= 1"))?;
    }

    Ok(value)
}

/// Parse a timestamp, converting it to UTC.
///
/// Timestamps with an offset (RFC 3339, e.g. `2015-01-01T00:00:00+01:00`) are converted to UTC.
/// Timestamps without one (e.g. `2015-01-01 00:00:00`) are taken to already be in UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc());
        }
    }

    // A bare date refers to midnight
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    bail!("Invalid timestamp: '{s}'")
}

/// Deserialise a timestamp with [`parse_timestamp`]
pub fn deserialise_timestamp<'de, D>(deserialiser: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserialiser)?;
    parse_timestamp(&s).map_err(serde::de::Error::custom)
}

/// Parse a numeric field which may be missing.
///
/// Empty fields and `NaN` are treated as missing and returned as NaN, as is `no_data_value` if
/// provided. Decimal commas (e.g. `41,5`) are accepted.
pub fn parse_value(s: &str, no_data_value: Option<f64>) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") {
        return Ok(f64::NAN);
    }

    let value: f64 = match s.parse() {
        Ok(value) => value,
        Err(_) => s
            .replace(',', ".")
            .parse()
            .with_context(|| format!("Invalid number: '{s}'"))?,
    };

    if no_data_value.is_some_and(|no_data| approx_eq!(f64, value, no_data, ulps = 2)) {
        return Ok(f64::NAN);
    }

    Ok(value)
}
