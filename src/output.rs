//! The module responsible for writing output data to disk.
use crate::grid::GriddedField;
use crate::region::RegionID;
use crate::timeseries::TimeSeries;
use crate::value_factor::MarketValue;
use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which project-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "windvalue_results";

/// The output folder for gridded capacity factors
pub const WIND_POWER_DIR: &str = "wind_power";

/// The output folder for regional generation series
pub const REGIONS_DIR: &str = "regions";

/// The output folder for capture prices
pub const CAPTURE_PRICE_DIR: &str = "capture_price";

/// The output folder for value factors
pub const VALUE_FACTOR_DIR: &str = "value_factor";

/// The output folder for value factors of zonal countries and their zones
pub const VALUE_FACTOR_ZONAL_DIR: &str = "value_factor_zonal";

/// The output file name for all value factors of a run
const VALUE_FACTOR_SUMMARY_FILE_NAME: &str = "value_factor_summary.csv";

/// The output file name for the outcome of each work unit
const UNIT_STATUS_FILE_NAME: &str = "unit_status.csv";

/// The name of the capacity factor column in gridded output files
pub const CAPACITY_FACTOR_VARIABLE: &str = "capacity_factor";

/// Get the default output directory for the project in the specified directory
pub fn get_output_dir(project_dir: &Path) -> Result<PathBuf> {
    // Get the project name from the dir path. This ends up being convoluted because we need to
    // check for all possible errors.
    let project_dir = project_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to project")?;

    let project_name = project_dir
        .file_name()
        .context("Project cannot be in root folder")?
        .to_str()
        .context("Invalid chars in project dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, project_name].iter().collect())
}

/// Create a new output directory, along with a subfolder for each stage.
///
/// If the directory already exists and is not empty, `allow_overwrite` must be set. Existing files
/// are then kept, so that outputs of earlier stages can be read by later ones, and any file written
/// by this run replaces its previous version.
///
/// # Returns
///
/// Whether existing output will be overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            false
        } else {
            ensure!(
                allow_overwrite,
                "Output folder already exists and is not empty. Please delete the folder or pass \
                the --overwrite command-line option."
            );
            true
        }
    } else {
        false
    };

    for sub_dir in [
        WIND_POWER_DIR,
        REGIONS_DIR,
        CAPTURE_PRICE_DIR,
        VALUE_FACTOR_DIR,
        VALUE_FACTOR_ZONAL_DIR,
    ] {
        fs::create_dir_all(output_dir.join(sub_dir))?;
    }

    Ok(overwrite)
}

/// The path to the gridded capacity factor file for a year
pub fn wind_power_file(output_dir: &Path, year: u32) -> PathBuf {
    output_dir
        .join(WIND_POWER_DIR)
        .join(format!("wind_power_{year}.csv"))
}

/// The path to a region's generation series for a year
pub fn region_series_file(output_dir: &Path, region: &RegionID, year: u32) -> PathBuf {
    output_dir
        .join(REGIONS_DIR)
        .join(format!("wp_{region}_{year}.csv"))
}

/// The path to a region's capture price file for a year
pub fn capture_price_file(output_dir: &Path, region: &RegionID, year: u32) -> PathBuf {
    output_dir
        .join(CAPTURE_PRICE_DIR)
        .join(format!("capture_price_{region}_{year}.csv"))
}

/// The path to a region's value factor file for a year
pub fn value_factor_file(output_dir: &Path, region: &RegionID, year: u32) -> PathBuf {
    output_dir
        .join(VALUE_FACTOR_DIR)
        .join(format!("value_factor_{region}_{year}.csv"))
}

/// The path to the value factor file of a zonal country or one of its zones
pub fn zonal_value_factor_file(output_dir: &Path, name: &impl Display, year: u32) -> PathBuf {
    output_dir
        .join(VALUE_FACTOR_ZONAL_DIR)
        .join(format!("value_factor_{name}_{year}.csv"))
}

/// Convert a missing (NaN) value into an empty field
fn optional(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Represents a row in a gridded output file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct GridRow {
    time: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    capacity_factor: Option<f64>,
}

/// Represents a row in a regional time series file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TimeSeriesRow {
    time: DateTime<Utc>,
    generation: Option<f64>,
}

/// Represents a row in a capture price file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct CapturePriceRow {
    /// The region (or zonal country)
    pub region: String,
    /// The year
    pub year: u32,
    /// Capture price, empty if undefined
    pub capture_price: Option<f64>,
    /// The number of hours used
    pub hours: usize,
}

/// Represents a row in a value factor file
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ValueFactorRow {
    /// The region (or zonal country)
    pub region: String,
    /// The year
    pub year: u32,
    /// Capture price, empty if undefined
    pub capture_price: Option<f64>,
    /// Baseload price
    pub baseload_price: f64,
    /// Value factor, empty if undefined
    pub value_factor: Option<f64>,
    /// The number of hours used
    pub hours: usize,
    /// The number of days discarded for missing data
    pub excluded_days: usize,
}

impl ValueFactorRow {
    /// Create a new [`ValueFactorRow`]
    pub fn new(region: &impl Display, year: u32, market_value: &MarketValue) -> Self {
        Self {
            region: region.to_string(),
            year,
            capture_price: market_value.capture_price.map(|price| price.value()),
            baseload_price: market_value.baseload_price.value(),
            value_factor: market_value.value_factor.map(|value| value.value()),
            hours: market_value.hours,
            excluded_days: market_value.excluded_days,
        }
    }
}

/// Represents a row in the value factor file of a zonal country
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ZonalValueFactorRow {
    region: String,
    year: u32,
    capture_price: Option<f64>,
    baseload_price: f64,
    value_factor: Option<f64>,
    hours: usize,
    excluded_days: usize,
    zones: String,
}

/// Represents a row in the unit status file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct UnitStatusRow {
    /// The pipeline stage
    pub stage: String,
    /// The unit, e.g. `DE 2020`
    pub unit: String,
    /// `completed`, `skipped` or `failed`
    pub status: String,
    /// The reason a unit was skipped or failed
    pub message: String,
}

/// Write rows to a new CSV file
fn write_rows<T, I>(file_path: &Path, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write a gridded capacity factor field in long format
pub fn write_gridded_field(file_path: &Path, field: &GriddedField) -> Result<()> {
    let rows = field
        .values()
        .indexed_iter()
        .map(|((t, i, j), value)| GridRow {
            time: field.times()[t],
            latitude: field.latitudes()[i],
            longitude: field.longitudes()[j],
            capacity_factor: optional(*value),
        });
    write_rows(file_path, rows)
}

/// Write a regional generation series
pub fn write_time_series(file_path: &Path, series: &TimeSeries) -> Result<()> {
    let rows = series.iter().map(|(time, value)| TimeSeriesRow {
        time,
        generation: optional(value),
    });
    write_rows(file_path, rows)
}

/// Write a capture price
pub fn write_capture_price(file_path: &Path, row: &ValueFactorRow) -> Result<()> {
    let row = CapturePriceRow {
        region: row.region.clone(),
        year: row.year,
        capture_price: row.capture_price,
        hours: row.hours,
    };
    write_rows(file_path, [row])
}

/// Write a value factor
pub fn write_value_factor(file_path: &Path, row: &ValueFactorRow) -> Result<()> {
    write_rows(file_path, [row])
}

/// Write the value factor of a zonal country, listing its zones
pub fn write_zonal_value_factor(
    file_path: &Path,
    row: &ValueFactorRow,
    zones: &[RegionID],
) -> Result<()> {
    let row = ZonalValueFactorRow {
        region: row.region.clone(),
        year: row.year,
        capture_price: row.capture_price,
        baseload_price: row.baseload_price,
        value_factor: row.value_factor,
        hours: row.hours,
        excluded_days: row.excluded_days,
        zones: zones.iter().join(";"),
    };
    write_rows(file_path, [row])
}

/// Write every value factor of the run, sorted by region and year
pub fn write_value_factor_summary(output_dir: &Path, rows: &[ValueFactorRow]) -> Result<()> {
    let rows = rows
        .iter()
        .sorted_by(|a, b| (&a.region, a.year).cmp(&(&b.region, b.year)));
    write_rows(&output_dir.join(VALUE_FACTOR_SUMMARY_FILE_NAME), rows)
}

/// Write the outcome of every work unit
pub fn write_unit_status(output_dir: &Path, rows: &[UnitStatusRow]) -> Result<()> {
    write_rows(&output_dir.join(UNIT_STATUS_FILE_NAME), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{hours, wind_speed_field};
    use crate::units::{Dimensionless, MoneyPerEnergy};
    use rstest::rstest;
    use std::fs::File;
    use tempfile::tempdir;

    fn read_rows<T: for<'de> Deserialize<'de>>(file_path: &Path) -> Vec<T> {
        csv::Reader::from_path(file_path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    fn market_value() -> MarketValue {
        MarketValue {
            capture_price: Some(MoneyPerEnergy(45.0)),
            baseload_price: MoneyPerEnergy(50.0),
            value_factor: Some(Dimensionless(0.9)),
            hours: 24,
            excluded_days: 1,
            interpolated_hours: 0,
        }
    }

    #[test]
    fn test_create_output_directory_new() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.join(WIND_POWER_DIR).is_dir());
        assert!(output_dir.join(VALUE_FACTOR_ZONAL_DIR).is_dir());
    }

    #[test]
    fn test_create_output_directory_existing() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("file.txt")).unwrap();

        assert!(create_output_directory(dir.path(), false).is_err());
        assert!(create_output_directory(dir.path(), true).unwrap());
        assert!(dir.path().join("file.txt").is_file()); // existing files are kept
    }

    #[rstest]
    fn test_write_gridded_field(wind_speed_field: GriddedField) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("wind_power_2020.csv");
        let mut values = wind_speed_field.values().clone();
        values[[0, 0, 0]] = f64::NAN;
        let field = wind_speed_field.with_values(values).unwrap();
        write_gridded_field(&file_path, &field).unwrap();

        let rows: Vec<GridRow> = read_rows(&file_path);
        assert_eq!(rows.len(), field.values().len());
        assert_eq!(rows[0].capacity_factor, None);
        assert_eq!(
            rows[1],
            GridRow {
                time: hours(2020, 1)[0],
                latitude: 50.0,
                longitude: 6.0,
                capacity_factor: Some(2.0),
            }
        );
    }

    #[test]
    fn test_write_time_series() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("wp_DE_2020.csv");
        let series = TimeSeries::new(hours(2020, 2), vec![0.5, f64::NAN]).unwrap();
        write_time_series(&file_path, &series).unwrap();

        let rows: Vec<TimeSeriesRow> = read_rows(&file_path);
        assert_eq!(rows[0].generation, Some(0.5));
        assert_eq!(rows[1].generation, None);
    }

    #[test]
    fn test_write_value_factor() {
        let dir = tempdir().unwrap();
        let row = ValueFactorRow::new(&"DE", 2020, &market_value());

        let file_path = value_factor_file(dir.path(), &"DE".into(), 2020);
        fs::create_dir(dir.path().join(VALUE_FACTOR_DIR)).unwrap();
        write_value_factor(&file_path, &row).unwrap();
        assert_eq!(read_rows::<ValueFactorRow>(&file_path), [row.clone()]);

        let file_path = dir.path().join("capture_price.csv");
        write_capture_price(&file_path, &row).unwrap();
        let rows: Vec<CapturePriceRow> = read_rows(&file_path);
        assert_eq!(rows[0].capture_price, Some(45.0));
        assert_eq!(rows[0].hours, 24);
    }

    #[test]
    fn test_write_value_factor_undefined() {
        let dir = tempdir().unwrap();
        let market_value = MarketValue {
            capture_price: None,
            value_factor: None,
            ..market_value()
        };
        let row = ValueFactorRow::new(&"DE", 2020, &market_value);
        let file_path = dir.path().join("value_factor.csv");
        write_value_factor(&file_path, &row).unwrap();

        let contents = fs::read_to_string(&file_path).unwrap();
        assert_eq!(
            contents,
            "region,year,capture_price,baseload_price,value_factor,hours,excluded_days\n\
             DE,2020,,50.0,,24,1\n"
        );
    }

    #[test]
    fn test_write_zonal_value_factor() {
        let dir = tempdir().unwrap();
        let row = ValueFactorRow::new(&"DK", 2020, &market_value());
        let file_path = dir.path().join("value_factor_DK_2020.csv");
        write_zonal_value_factor(&file_path, &row, &["DK_1".into(), "DK_2".into()]).unwrap();

        let rows: Vec<ZonalValueFactorRow> = read_rows(&file_path);
        assert_eq!(rows[0].zones, "DK_1;DK_2");
        assert_eq!(rows[0].value_factor, Some(0.9));
    }

    #[test]
    fn test_write_value_factor_summary_sorted() {
        let dir = tempdir().unwrap();
        let rows = [
            ValueFactorRow::new(&"DK", 2020, &market_value()),
            ValueFactorRow::new(&"DE", 2021, &market_value()),
            ValueFactorRow::new(&"DE", 2020, &market_value()),
        ];
        write_value_factor_summary(dir.path(), &rows).unwrap();

        let rows: Vec<ValueFactorRow> =
            read_rows(&dir.path().join(VALUE_FACTOR_SUMMARY_FILE_NAME));
        let keys = rows
            .iter()
            .map(|row| (row.region.as_str(), row.year))
            .collect_vec();
        assert_eq!(keys, [("DE", 2020), ("DE", 2021), ("DK", 2020)]);
    }
}
