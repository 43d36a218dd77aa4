//! Code for reading gridded hourly data from long-format CSV files.
use super::{check_input_exists, input_err_msg, parse_timestamp, parse_value};
use crate::grid::GriddedField;
use anyhow::{Context, Result, bail, ensure};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::warn;
use ndarray::Array3;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use unicase::UniCase;

/// The name of the time column
const TIME_COLUMN: &str = "time";

/// Options for reading a gridded data file
#[derive(Debug, Clone, Copy)]
pub struct GridFileOptions<'a> {
    /// The name of the column containing the variable's values
    pub variable: &'a str,
    /// Sentinel value which indicates missing data
    pub no_data_value: Option<f64>,
}

/// The positions of the columns of interest in a gridded data file
struct ColumnIndexes {
    time: usize,
    latitude: usize,
    longitude: usize,
    value: usize,
}

impl ColumnIndexes {
    /// Find the columns of interest from the file's headers.
    ///
    /// Latitude and longitude are the first columns whose names contain `lat` and `lon`.
    fn from_headers(headers: &csv::StringRecord, variable: &str) -> Result<Self> {
        let find_exact = |name: &str| {
            headers
                .iter()
                .position(|header| UniCase::new(header) == UniCase::new(name))
                .with_context(|| format!("Missing column: {name}"))
        };
        let find_containing = |fragment: &str| {
            headers
                .iter()
                .position(|header| header.to_lowercase().contains(fragment))
                .with_context(|| format!("No column name containing '{fragment}'"))
        };

        Ok(Self {
            time: find_exact(TIME_COLUMN)?,
            latitude: find_containing("lat")?,
            longitude: find_containing("lon")?,
            value: find_exact(variable)?,
        })
    }
}

/// Read a gridded field from a long-format CSV file.
///
/// Each row gives the value for one grid cell at one time. Cells absent from the file are treated
/// as missing values; duplicate cells are an error.
pub fn read_gridded_field(file_path: &Path, options: &GridFileOptions) -> Result<GriddedField> {
    check_input_exists(file_path)?;
    read_gridded_field_from_file(file_path, options).with_context(|| input_err_msg(file_path))
}

fn read_gridded_field_from_file(file_path: &Path, options: &GridFileOptions) -> Result<GriddedField> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;
    let columns = ColumnIndexes::from_headers(reader.headers()?, options.variable)?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let row = parse_row(&record?, &columns, options)
            .with_context(|| format!("Invalid data on row {}", row_idx + 1))?;
        rows.push(row);
    }
    ensure!(!rows.is_empty(), "File contains no data");

    let times = rows.iter().map(|(time, ..)| *time).sorted().dedup().collect_vec();
    let latitudes = sorted_unique_coordinates(rows.iter().map(|(_, lat, ..)| *lat));
    let longitudes = sorted_unique_coordinates(rows.iter().map(|(_, _, lon, _)| *lon));

    let time_idx: HashMap<DateTime<Utc>, usize> =
        times.iter().enumerate().map(|(idx, time)| (*time, idx)).collect();
    let mut values = Array3::from_elem((times.len(), latitudes.len(), longitudes.len()), f64::NAN);
    let mut seen = Array3::from_elem(values.dim(), false);
    for (time, lat, lon, value) in rows {
        let t = time_idx[&time];
        let i = coordinate_index(&latitudes, lat)?;
        let j = coordinate_index(&longitudes, lon)?;
        if seen[[t, i, j]] {
            bail!("Duplicate entry for time {time}, latitude {lat}, longitude {lon}");
        }
        seen[[t, i, j]] = true;
        values[[t, i, j]] = value;
    }

    let absent = seen.iter().filter(|present| !**present).count();
    if absent > 0 {
        warn!(
            "{absent} grid cell value(s) are absent from {} and will be treated as missing",
            file_path.display()
        );
    }

    GriddedField::new(times, latitudes, longitudes, values)
}

/// Parse a single row into (time, latitude, longitude, value)
fn parse_row(
    record: &csv::StringRecord,
    columns: &ColumnIndexes,
    options: &GridFileOptions,
) -> Result<(DateTime<Utc>, f64, f64, f64)> {
    let field = |idx: usize| record.get(idx).unwrap_or_default();
    let time = parse_timestamp(field(columns.time))?;
    let lat: f64 = field(columns.latitude)
        .parse()
        .context("Invalid latitude")?;
    let lon: f64 = field(columns.longitude)
        .parse()
        .context("Invalid longitude")?;
    let value = parse_value(field(columns.value), options.no_data_value)?;

    Ok((time, lat, lon, value))
}

fn sorted_unique_coordinates<I: Iterator<Item = f64>>(iter: I) -> Vec<f64> {
    iter.sorted_by(f64::total_cmp)
        .dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal)
        .collect()
}

fn coordinate_index(axis: &[f64], value: f64) -> Result<usize> {
    axis.binary_search_by(|x| x.total_cmp(&value))
        .ok()
        .with_context(|| format!("Coordinate {value} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::is_missing_input;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const OPTIONS: GridFileOptions = GridFileOptions {
        variable: "wind_speed",
        no_data_value: Some(-9999.0),
    };

    fn create_grid_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("grid.csv");
        let mut file = File::create(&file_path).unwrap();
        write!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_gridded_field() {
        let dir = tempdir().unwrap();
        let file_path = create_grid_file(
            dir.path(),
            "time,latitude,longitude,wind_speed\n\
             2020-01-01 01:00:00,51.0,5.0,4.0\n\
             2020-01-01 00:00:00,50.0,5.0,1.0\n\
             2020-01-01 00:00:00,51.0,5.0,2.0\n\
             2020-01-01 01:00:00,50.0,5.0,-9999\n",
        );
        let field = read_gridded_field(&file_path, &OPTIONS).unwrap();
        assert_eq!(field.values().dim(), (2, 2, 1));
        assert_eq!(field.latitudes(), &[50.0, 51.0]);
        assert_eq!(field.values()[[0, 0, 0]], 1.0);
        assert_eq!(field.values()[[0, 1, 0]], 2.0);
        assert!(field.values()[[1, 0, 0]].is_nan());
        assert_eq!(field.values()[[1, 1, 0]], 4.0);
    }

    #[test]
    fn test_read_gridded_field_absent_cells() {
        let dir = tempdir().unwrap();
        let file_path = create_grid_file(
            dir.path(),
            "valid_time,lat,lon,extra,wind_speed\n\
             2020-01-01T00:00:00Z,50,5,x,1\n\
             2020-01-01T00:00:00Z,50,6,x,1\n\
             2020-01-01T01:00:00Z,50,5,x,3\n",
        );

        // "valid_time" is not the time column
        let err = read_gridded_field(&file_path, &OPTIONS).unwrap_err();
        assert_eq!(err.chain().nth(1).unwrap().to_string(), "Missing column: time");

        let file_path = create_grid_file(
            dir.path(),
            "time,lat,lon,extra,wind_speed\n\
             2020-01-01T00:00:00Z,50,5,x,1\n\
             2020-01-01T00:00:00Z,50,6,x,1\n\
             2020-01-01T01:00:00Z,50,5,x,3\n",
        );
        let field = read_gridded_field(&file_path, &OPTIONS).unwrap();
        assert!(field.values()[[1, 0, 1]].is_nan());
    }

    #[test]
    fn test_read_gridded_field_duplicate() {
        let dir = tempdir().unwrap();
        let file_path = create_grid_file(
            dir.path(),
            "time,lat,lon,wind_speed\n2020-01-01 00:00,50,5,1\n2020-01-01 00:00,50,5,2\n",
        );
        let err = read_gridded_field(&file_path, &OPTIONS).unwrap_err();
        assert_eq!(
            err.chain().nth(1).unwrap().to_string(),
            "Duplicate entry for time 2020-01-01 00:00:00 UTC, latitude 50, longitude 5"
        );
    }

    #[test]
    fn test_read_gridded_field_missing_column() {
        let dir = tempdir().unwrap();
        let file_path = create_grid_file(dir.path(), "time,lat,lon,u100\n2020-01-01,50,5,1\n");
        let err = read_gridded_field(&file_path, &OPTIONS).unwrap_err();
        assert_eq!(
            err.chain().nth(1).unwrap().to_string(),
            "Missing column: wind_speed"
        );
    }

    #[test]
    fn test_read_gridded_field_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_gridded_field(&dir.path().join("absent.csv"), &OPTIONS).unwrap_err();
        assert!(is_missing_input(&err));
    }
}
