//! Defines the `ProjectParameters` struct, which represents the contents of `project.toml`.
use crate::capture_price::GapPolicy;
use crate::input::{
    deserialise_proportion_nonzero, input_err_msg, is_sorted_and_unique, read_toml,
};
use crate::power_curve::PowerCurve;
use crate::region::{CountryCode, RegionID, SpatialWeighting};
use crate::units::{Dimensionless, Power, WindSpeed};
use crate::wind_power::PlausibilityLimits;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The name of the project configuration file
pub const PROJECT_PARAMETERS_FILE_NAME: &str = "project.toml";

/// The placeholder substituted with the year in file name patterns
const YEAR_PLACEHOLDER: &str = "{year}";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_wind_speed_dir, PathBuf, PathBuf::from("."));
define_param_default!(
    default_wind_speed_file_pattern,
    String,
    "ERA5_wind_speed_{year}.csv".into()
);
define_param_default!(default_boundary_dir, PathBuf, PathBuf::from("."));
define_param_default!(default_price_dir, PathBuf, PathBuf::from("."));
define_param_default!(default_wind_speed_variable, String, "wind_speed".into());
define_unit_param_default!(default_min_wind_speed, WindSpeed, 0.0);
define_unit_param_default!(default_max_wind_speed, WindSpeed, 30.0);
define_unit_param_default!(default_max_capacity_factor, Dimensionless, 0.95);
define_param_default!(default_power_curve_header_rows, usize, 2);
define_unit_param_default!(default_cut_in_speed, WindSpeed, 3.0);
define_unit_param_default!(default_rated_speed, WindSpeed, 12.0);
define_unit_param_default!(default_cut_out_speed, WindSpeed, 25.0);
define_unit_param_default!(default_rated_power, Power, 2000.0);
define_param_default!(default_price_time_column, String, "Datetime (UTC)".into());
define_param_default!(default_price_value_column, String, "Price (EUR/MWhe)".into());
define_param_default!(default_max_missing_hours_per_day, u32, 6);
define_param_default!(default_max_interpolation_gap, usize, 3);

/// Represents the contents of the entire project file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ProjectParameters {
    /// The years to process
    pub years: Vec<u32>,
    /// Locations of input files
    #[serde(default)]
    pub paths: PathParameters,
    /// Wind speed and power curve options
    #[serde(default)]
    pub wind: WindParameters,
    /// Regional extraction options
    #[serde(default)]
    pub regions: RegionParameters,
    /// Price input and gap handling options
    #[serde(default)]
    pub prices: PriceParameters,
    /// Countries made up of several bidding zones, keyed by country code
    #[serde(default)]
    pub zonal: IndexMap<CountryCode, ZonalCountry>,
}

/// The `[paths]` section of the project file.
///
/// Relative paths are relative to the project directory.
#[derive(Debug, Deserialize, PartialEq)]
pub struct PathParameters {
    /// Folder containing gridded wind speed files
    #[serde(default = "default_wind_speed_dir")]
    pub wind_speed_dir: PathBuf,
    /// File name of each year's wind speed file, with `{year}` standing for the year
    #[serde(default = "default_wind_speed_file_pattern")]
    pub wind_speed_file_pattern: String,
    /// Folder containing one GeoJSON boundary file per region
    #[serde(default = "default_boundary_dir")]
    pub boundary_dir: PathBuf,
    /// Folder containing price files
    #[serde(default = "default_price_dir")]
    pub price_dir: PathBuf,
}

impl Default for PathParameters {
    fn default() -> Self {
        Self {
            wind_speed_dir: default_wind_speed_dir(),
            wind_speed_file_pattern: default_wind_speed_file_pattern(),
            boundary_dir: default_boundary_dir(),
            price_dir: default_price_dir(),
        }
    }
}

/// The `[wind]` section of the project file
#[derive(Debug, Deserialize, PartialEq)]
pub struct WindParameters {
    /// The name of the wind speed column in gridded files
    #[serde(default = "default_wind_speed_variable")]
    pub wind_speed_variable: String,
    /// A sentinel value which marks missing wind speeds
    #[serde(default)]
    pub no_data_value: Option<f64>,
    /// Wind speeds below this are reported as implausible
    #[serde(default = "default_min_wind_speed")]
    pub min_wind_speed: WindSpeed,
    /// Wind speeds above this are reported as implausible
    #[serde(default = "default_max_wind_speed")]
    pub max_wind_speed: WindSpeed,
    /// Grid cells with a mean capacity factor above this are reported as implausible
    #[serde(default = "default_max_capacity_factor")]
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub max_capacity_factor: Dimensionless,
    /// A power curve table. If absent, a generic turbine is used.
    #[serde(default)]
    pub power_curve_file: Option<PathBuf>,
    /// The number of header rows in the power curve table
    #[serde(default = "default_power_curve_header_rows")]
    pub power_curve_header_rows: usize,
    /// Cut-in speed of the generic turbine
    #[serde(default = "default_cut_in_speed")]
    pub cut_in_speed: WindSpeed,
    /// Rated speed of the generic turbine
    #[serde(default = "default_rated_speed")]
    pub rated_speed: WindSpeed,
    /// Cut-out speed of the generic turbine
    #[serde(default = "default_cut_out_speed")]
    pub cut_out_speed: WindSpeed,
    /// Rated power (kW) of the generic turbine
    #[serde(default = "default_rated_power")]
    pub rated_power: Power,
}

impl Default for WindParameters {
    fn default() -> Self {
        Self {
            wind_speed_variable: default_wind_speed_variable(),
            no_data_value: None,
            min_wind_speed: default_min_wind_speed(),
            max_wind_speed: default_max_wind_speed(),
            max_capacity_factor: default_max_capacity_factor(),
            power_curve_file: None,
            power_curve_header_rows: default_power_curve_header_rows(),
            cut_in_speed: default_cut_in_speed(),
            rated_speed: default_rated_speed(),
            cut_out_speed: default_cut_out_speed(),
            rated_power: default_rated_power(),
        }
    }
}

impl WindParameters {
    /// The plausibility limits for wind speed and capacity factor
    pub fn plausibility_limits(&self) -> PlausibilityLimits {
        PlausibilityLimits {
            min_wind_speed: self.min_wind_speed,
            max_wind_speed: self.max_wind_speed,
            max_capacity_factor: self.max_capacity_factor,
        }
    }

    /// The power curve of the generic turbine
    pub fn generic_power_curve(&self) -> Result<PowerCurve> {
        PowerCurve::generic(
            self.cut_in_speed,
            self.rated_speed,
            self.cut_out_speed,
            self.rated_power,
        )
    }
}

/// The `[regions]` section of the project file
#[derive(Debug, Deserialize, PartialEq, Default)]
pub struct RegionParameters {
    /// How grid cells are weighted within a region
    #[serde(default)]
    pub weighting: SpatialWeighting,
    /// Only process these regions. If absent, every region with a boundary file is processed.
    #[serde(default)]
    pub include: Option<Vec<RegionID>>,
}

/// The `[prices]` section of the project file
#[derive(Debug, Deserialize, PartialEq)]
pub struct PriceParameters {
    /// The name of the timestamp column in single-zone price files
    #[serde(default = "default_price_time_column")]
    pub price_time_column: String,
    /// The name of the price column in single-zone price files
    #[serde(default = "default_price_value_column")]
    pub price_value_column: String,
    /// Days with more missing hours than this are discarded
    #[serde(default = "default_max_missing_hours_per_day")]
    pub max_missing_hours_per_day: u32,
    /// The longest run of missing prices (hours) which is interpolated
    #[serde(default = "default_max_interpolation_gap")]
    pub max_interpolation_gap: usize,
    /// The price file (in `price_dir`) for each single-zone country
    #[serde(default)]
    pub countries: IndexMap<CountryCode, PathBuf>,
}

impl Default for PriceParameters {
    fn default() -> Self {
        Self {
            price_time_column: default_price_time_column(),
            price_value_column: default_price_value_column(),
            max_missing_hours_per_day: default_max_missing_hours_per_day(),
            max_interpolation_gap: default_max_interpolation_gap(),
            countries: IndexMap::new(),
        }
    }
}

impl PriceParameters {
    /// The rules for handling missing data
    pub fn gap_policy(&self) -> GapPolicy {
        GapPolicy {
            max_missing_hours_per_day: self.max_missing_hours_per_day,
            max_interpolation_gap: self.max_interpolation_gap,
        }
    }
}

/// A `[zonal.<code>]` section of the project file
#[derive(Debug, Deserialize, PartialEq)]
pub struct ZonalCountry {
    /// A wide price file (in `price_dir`) with one column per zone
    pub price_file: PathBuf,
    /// The country's bidding zones. Every zone is required.
    pub zones: Vec<RegionID>,
}

/// Check that the `years` parameter is valid
fn check_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`years` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the wind speed file pattern contains the year placeholder
fn check_wind_speed_file_pattern(pattern: &str) -> Result<()> {
    ensure!(
        pattern.contains(YEAR_PLACEHOLDER),
        "wind_speed_file_pattern must contain {YEAR_PLACEHOLDER}"
    );

    Ok(())
}

/// Check the wind speed plausibility range
fn check_wind_speed_range(min: WindSpeed, max: WindSpeed) -> Result<()> {
    ensure!(
        min.is_finite() && max.is_finite() && min < max,
        "min_wind_speed must be less than max_wind_speed"
    );

    Ok(())
}

/// Check the `max_missing_hours_per_day` parameter is valid
fn check_max_missing_hours_per_day(value: u32) -> Result<()> {
    ensure!(
        value <= 24,
        "max_missing_hours_per_day must be between 0 and 24"
    );

    Ok(())
}

/// Check the zones of a zonal country
fn check_zonal_country(country: &CountryCode, zonal: &ZonalCountry) -> Result<()> {
    ensure!(!zonal.zones.is_empty(), "No zones given for {country}");
    ensure!(
        zonal.zones.iter().all_unique(),
        "Zones of {country} must be unique"
    );
    for zone in &zonal.zones {
        ensure!(
            zone.country_code() == *country && zone.as_str() != country.as_str(),
            "Zone {zone} does not belong to {country} (zone names must start with {country}_)"
        );
    }

    Ok(())
}

impl ProjectParameters {
    /// Read a project file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `project_dir` - Folder containing the project configuration file
    ///
    /// # Returns
    ///
    /// The file contents as a [`ProjectParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(project_dir: P) -> Result<ProjectParameters> {
        let file_path = project_dir.as_ref().join(PROJECT_PARAMETERS_FILE_NAME);
        let project_params: ProjectParameters = read_toml(&file_path)?;

        project_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(project_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // years
        check_years(&self.years)?;

        // paths
        check_wind_speed_file_pattern(&self.paths.wind_speed_file_pattern)?;

        // wind (max_capacity_factor already validated with deserialise_proportion_nonzero)
        check_wind_speed_range(self.wind.min_wind_speed, self.wind.max_wind_speed)?;
        if self.wind.power_curve_file.is_none() {
            self.wind
                .generic_power_curve()
                .context("Invalid generic turbine parameters")?;
        }

        // prices
        check_max_missing_hours_per_day(self.prices.max_missing_hours_per_day)?;

        // zonal
        for (country, zonal) in &self.zonal {
            check_zonal_country(country, zonal)?;
            ensure!(
                !self.prices.countries.contains_key(country),
                "{country} is listed both in prices.countries and zonal"
            );
        }

        Ok(())
    }

    /// The name of the wind speed file for the given year
    pub fn wind_speed_file_name(&self, year: u32) -> String {
        self.paths
            .wind_speed_file_pattern
            .replace(YEAR_PLACEHOLDER, &year.to_string())
    }
}
