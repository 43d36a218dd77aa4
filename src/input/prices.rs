//! Code for reading hourly electricity price files.
use super::{check_input_exists, input_err_msg, parse_timestamp, parse_value};
use crate::region::RegionID;
use crate::timeseries::TimeSeries;
use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::warn;
use std::path::Path;
use unicase::UniCase;

/// The names of the columns in a single-zone price file
#[derive(Debug, Clone, Copy)]
pub struct PriceColumns<'a> {
    /// The column containing UTC timestamps
    pub time: &'a str,
    /// The column containing prices
    pub value: &'a str,
}

fn open_price_file(file_path: &Path) -> Result<csv::Reader<std::fs::File>> {
    check_input_exists(file_path)?;
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| UniCase::new(header) == UniCase::new(name))
}

/// Parse a price field, counting values which are not numbers. These are treated as missing.
fn parse_price(field: Option<&str>, invalid: &mut usize) -> f64 {
    parse_value(field.unwrap_or_default(), None).unwrap_or_else(|_| {
        *invalid += 1;
        f64::NAN
    })
}

fn log_invalid_prices(invalid: usize) {
    if invalid > 0 {
        warn!("{invalid} non-numeric price value(s) treated as missing");
    }
}

/// Read the price series for a single bidding zone.
///
/// Only rows falling in `year` (UTC) are returned. Empty and non-numeric price fields become
/// missing values.
pub fn read_prices(file_path: &Path, columns: &PriceColumns, year: u32) -> Result<TimeSeries> {
    let mut reader = open_price_file(file_path)?;
    read_prices_from_reader(&mut reader, columns, year).with_context(|| input_err_msg(file_path))
}

fn read_prices_from_reader<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    columns: &PriceColumns,
    year: u32,
) -> Result<TimeSeries> {
    let headers = reader.headers()?.clone();
    let time_idx = find_column(&headers, columns.time)
        .with_context(|| format!("Missing column: {}", columns.time))?;
    let value_idx = find_column(&headers, columns.value)
        .with_context(|| format!("Missing column: {}", columns.value))?;

    let mut rows = Vec::new();
    let mut invalid = 0;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let time = parse_timestamp(record.get(time_idx).unwrap_or_default())
            .with_context(|| format!("Invalid timestamp on row {}", row_idx + 1))?;
        let price = parse_price(record.get(value_idx), &mut invalid);
        rows.push((time, price));
    }
    ensure!(!rows.is_empty(), "Price file contains no data");
    log_invalid_prices(invalid);

    TimeSeries::from_unsorted(rows)
        .map(|series| series.filter_year(year))
}

/// Get the name of the column holding a zone's prices.
///
/// This is the zone name itself if present, otherwise the name with underscores removed (e.g.
/// `SE1` for `SE_1`).
fn zone_column(headers: &csv::StringRecord, zone: &RegionID) -> Result<usize> {
    find_column(headers, zone.as_str())
        .or_else(|| find_column(headers, &zone.as_str().replace('_', "")))
        .with_context(|| format!("No price column for zone {zone}"))
}

/// Read the price series for several bidding zones from a wide price file.
///
/// The first column holds timestamps and the remaining columns hold each zone's prices. Only rows
/// falling in `year` (UTC) are returned. Every zone in `zones` must be present.
pub fn read_zonal_prices(
    file_path: &Path,
    zones: &[RegionID],
    year: u32,
) -> Result<IndexMap<RegionID, TimeSeries>> {
    let mut reader = open_price_file(file_path)?;
    read_zonal_prices_from_reader(&mut reader, zones, year)
        .with_context(|| input_err_msg(file_path))
}

fn read_zonal_prices_from_reader<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    zones: &[RegionID],
    year: u32,
) -> Result<IndexMap<RegionID, TimeSeries>> {
    let headers = reader.headers()?.clone();
    let zone_columns: Vec<_> = zones
        .iter()
        .map(|zone| zone_column(&headers, zone))
        .collect::<Result<_>>()?;

    let mut times: Vec<DateTime<Utc>> = Vec::new();
    let mut values = vec![Vec::new(); zones.len()];
    let mut invalid = 0;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let time = parse_timestamp(record.get(0).unwrap_or_default())
            .with_context(|| format!("Invalid timestamp on row {}", row_idx + 1))?;
        times.push(time);
        for (zone_values, idx) in values.iter_mut().zip(&zone_columns) {
            zone_values.push(parse_price(record.get(*idx), &mut invalid));
        }
    }
    ensure!(!times.is_empty(), "Price file contains no data");
    log_invalid_prices(invalid);

    zones
        .iter()
        .zip(values)
        .map(|(zone, zone_values)| {
            let series = TimeSeries::from_unsorted(times.iter().copied().zip(zone_values))?;
            Ok((zone.clone(), series.filter_year(year)))
        })
        .collect()
}
