//! Functionality for running the pipeline as a set of independent work units.
//!
//! Each stage reads the persisted output of the stage before it, so a stage can be rerun on its own
//! against the output folder of an earlier run. Within a stage (and between the value factor and
//! zonal stages, which do not depend on each other) units are run in parallel.
use crate::input::boundary::read_boundary;
use crate::input::grid::{GridFileOptions, read_gridded_field};
use crate::input::is_missing_input;
use crate::input::prices::{read_prices, read_zonal_prices};
use crate::input::timeseries::read_generation_series;
use crate::output::{
    CAPACITY_FACTOR_VARIABLE, UnitStatusRow, ValueFactorRow, capture_price_file,
    region_series_file, value_factor_file, wind_power_file, write_capture_price,
    write_gridded_field, write_time_series, write_unit_status, write_value_factor,
    write_value_factor_summary, write_zonal_value_factor, zonal_value_factor_file,
};
use crate::project::Project;
use crate::region::{CountryCode, RegionID, extract_region};
use crate::value_factor::assess;
use crate::wind_power::estimate_capacity_factor;
use crate::zonal::{ZoneSeries, aggregate_zones};
use anyhow::{Context, Result};
use indexmap::IndexSet;
use itertools::Itertools;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, IntoEnumIterator};

/// A stage of the pipeline
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Stage {
    /// Convert gridded wind speed into gridded capacity factor
    WindPower,
    /// Extract a generation series for each region
    Regions,
    /// Calculate capture prices and value factors for each region
    ValueFactor,
    /// Calculate capture prices and value factors for countries with several bidding zones
    Zonal,
}

impl Stage {
    /// Groups of stages, in the order they must run. Stages in a group are independent.
    const GROUPS: [&'static [Stage]; 3] = [
        &[Stage::WindPower],
        &[Stage::Regions],
        &[Stage::ValueFactor, Stage::Zonal],
    ];
}

/// A single independent piece of work
#[derive(Debug, Clone, PartialEq)]
pub enum WorkUnit {
    /// Estimate capacity factors for a year
    WindPower {
        /// The year
        year: u32,
    },
    /// Extract a region's generation series for a year
    Region {
        /// The region
        region: RegionID,
        /// The year
        year: u32,
    },
    /// Calculate a region's value factor for a year
    ValueFactor {
        /// The region
        region: RegionID,
        /// The year
        year: u32,
    },
    /// Calculate a zonal country's value factor for a year
    Zonal {
        /// The country
        country: CountryCode,
        /// The year
        year: u32,
    },
}

impl WorkUnit {
    /// The stage this unit belongs to
    pub fn stage(&self) -> Stage {
        match self {
            Self::WindPower { .. } => Stage::WindPower,
            Self::Region { .. } => Stage::Regions,
            Self::ValueFactor { .. } => Stage::ValueFactor,
            Self::Zonal { .. } => Stage::Zonal,
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindPower { year } => write!(f, "{year}"),
            Self::Region { region, year } | Self::ValueFactor { region, year } => {
                write!(f, "{region} {year}")
            }
            Self::Zonal { country, year } => write!(f, "{country} {year}"),
        }
    }
}

/// The outcome of running a work unit
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// The unit ran successfully, producing these value factors (if any)
    Completed(Vec<ValueFactorRow>),
    /// The unit was not run, e.g. because an input file is missing
    Skipped(String),
    /// The unit failed
    Failed(String),
}

impl UnitOutcome {
    /// A label for the outcome
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Completed(_) => "",
            Self::Skipped(message) | Self::Failed(message) => message,
        }
    }
}

/// Options restricting which parts of the pipeline are run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The stages to run. If empty, every stage is run.
    pub stages: Vec<Stage>,
    /// The years to process. If `None`, every configured year is processed.
    pub years: Option<Vec<u32>>,
    /// The regions to process. If `None`, every configured region is processed.
    pub regions: Option<IndexSet<RegionID>>,
    /// The number of worker threads (0 means one per CPU)
    pub num_threads: usize,
}

impl RunOptions {
    /// The stages to run, in order
    pub fn selected_stages(&self) -> Vec<Stage> {
        Stage::iter()
            .filter(|stage| self.stages.is_empty() || self.stages.contains(stage))
            .collect()
    }
}

/// The outcome of every work unit in a run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Each unit along with its outcome, in the order they were run
    pub outcomes: Vec<(WorkUnit, UnitOutcome)>,
}

impl RunSummary {
    /// The number of units with the given status
    pub fn count(&self, status: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.status() == status)
            .count()
    }

    /// Every value factor calculated during the run
    pub fn value_factors(&self) -> Vec<ValueFactorRow> {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                UnitOutcome::Completed(rows) => Some(rows),
                _ => None,
            })
            .flatten()
            .cloned()
            .collect()
    }
}

/// Build the list of work units for a stage
pub fn build_work_list(project: &Project, stage: Stage, options: &RunOptions) -> Vec<WorkUnit> {
    let years = options.years.as_deref().unwrap_or(project.years());
    let regions = options.regions.as_ref().unwrap_or(&project.regions);
    let zonal = &project.parameters.zonal;

    match stage {
        Stage::WindPower => years
            .iter()
            .map(|&year| WorkUnit::WindPower { year })
            .collect(),
        Stage::Regions => regions
            .iter()
            .cartesian_product(years)
            .map(|(region, &year)| WorkUnit::Region {
                region: region.clone(),
                year,
            })
            .collect(),
        // Zones of zonal countries are handled by the zonal stage
        Stage::ValueFactor => regions
            .iter()
            .filter(|region| !zonal.contains_key(&region.country_code()))
            .cartesian_product(years)
            .map(|(region, &year)| WorkUnit::ValueFactor {
                region: region.clone(),
                year,
            })
            .collect(),
        Stage::Zonal => zonal
            .iter()
            .filter(|(_, country)| country.zones.iter().any(|zone| regions.contains(zone)))
            .cartesian_product(years)
            .map(|((country, _), &year)| WorkUnit::Zonal {
                country: country.clone(),
                year,
            })
            .collect(),
    }
}

/// Run the pipeline for a project, writing outputs to `output_dir`.
///
/// A unit which fails or lacks input does not stop the others. The outcome of every unit is
/// written to `unit_status.csv` and every value factor to `value_factor_summary.csv`.
pub fn run(project: &Project, output_dir: &Path, options: &RunOptions) -> Result<RunSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.num_threads)
        .build()
        .context("Failed to create thread pool")?;
    info!("Running with {} worker thread(s)", pool.current_num_threads());

    let stages = options.selected_stages();
    let mut summary = RunSummary::default();
    for group in Stage::GROUPS {
        let units = group
            .iter()
            .filter(|stage| stages.contains(*stage))
            .flat_map(|stage| build_work_list(project, *stage, options))
            .collect_vec();
        if units.is_empty() {
            continue;
        }

        info!(
            "Running stage(s) {}: {} unit(s)",
            group.iter().filter(|stage| stages.contains(*stage)).join(", "),
            units.len()
        );
        let outcomes: Vec<_> = pool.install(|| {
            units
                .into_par_iter()
                .map(|unit| {
                    let outcome = execute_unit(project, output_dir, &unit);
                    (unit, outcome)
                })
                .collect()
        });
        summary.outcomes.extend(outcomes);
    }

    let status_rows = summary
        .outcomes
        .iter()
        .map(|(unit, outcome)| UnitStatusRow {
            stage: unit.stage().to_string(),
            unit: unit.to_string(),
            status: outcome.status().into(),
            message: outcome.message().into(),
        })
        .collect_vec();
    write_unit_status(output_dir, &status_rows)?;
    write_value_factor_summary(output_dir, &summary.value_factors())?;

    Ok(summary)
}

/// Run a unit, logging and recording any error
fn execute_unit(project: &Project, output_dir: &Path, unit: &WorkUnit) -> UnitOutcome {
    let stage = unit.stage();
    debug!("Starting {stage} unit {unit}");
    let outcome = match run_unit(project, output_dir, unit) {
        Ok(outcome) => outcome,
        Err(err) if is_missing_input(&err) => UnitOutcome::Skipped(format!("{err:#}")),
        Err(err) => {
            error!("{stage} unit {unit} failed: {err:?}");
            UnitOutcome::Failed(format!("{err:#}"))
        }
    };

    if let UnitOutcome::Skipped(reason) = &outcome {
        warn!("Skipping {stage} unit {unit}: {reason}");
    }

    // Later stages must not pick up outputs from an earlier run
    if !matches!(outcome, UnitOutcome::Completed(_)) {
        remove_stale_outputs(unit, &unit_outputs(project, output_dir, unit));
    }

    outcome
}

/// The output files written by a unit
fn unit_outputs(project: &Project, output_dir: &Path, unit: &WorkUnit) -> Vec<PathBuf> {
    match unit {
        WorkUnit::WindPower { year } => vec![wind_power_file(output_dir, *year)],
        WorkUnit::Region { region, year } => vec![region_series_file(output_dir, region, *year)],
        WorkUnit::ValueFactor { region, year } => vec![
            capture_price_file(output_dir, region, *year),
            value_factor_file(output_dir, region, *year),
        ],
        WorkUnit::Zonal { country, year } => project
            .parameters
            .zonal
            .get(country)
            .into_iter()
            .flat_map(|zonal| &zonal.zones)
            .map(|zone| zonal_value_factor_file(output_dir, zone, *year))
            .chain([zonal_value_factor_file(output_dir, country, *year)])
            .collect(),
    }
}

/// Remove output files left by an earlier run for a unit which did not complete
fn remove_stale_outputs(unit: &WorkUnit, paths: &[PathBuf]) {
    for path in paths.iter().filter(|path| path.is_file()) {
        match fs::remove_file(path) {
            Ok(()) => warn!(
                "Removed {} from an earlier run as {} unit {unit} did not complete",
                path.display(),
                unit.stage()
            ),
            Err(err) => error!("Could not remove {}: {err}", path.display()),
        }
    }
}

fn run_unit(project: &Project, output_dir: &Path, unit: &WorkUnit) -> Result<UnitOutcome> {
    match unit {
        WorkUnit::WindPower { year } => run_wind_power(project, output_dir, *year),
        WorkUnit::Region { region, year } => run_region(project, output_dir, region, *year),
        WorkUnit::ValueFactor { region, year } => {
            run_value_factor(project, output_dir, region, *year)
        }
        WorkUnit::Zonal { country, year } => run_zonal(project, output_dir, country, *year),
    }
}

fn run_wind_power(project: &Project, output_dir: &Path, year: u32) -> Result<UnitOutcome> {
    let wind_speed = read_gridded_field(
        &project.wind_speed_file(year),
        &project.grid_file_options(),
    )?;
    let limits = project.parameters.wind.plausibility_limits();
    let capacity_factor = estimate_capacity_factor(&wind_speed, &project.power_curve, &limits)
        .with_context(|| format!("Failed to estimate wind power for {year}"))?;
    write_gridded_field(&wind_power_file(output_dir, year), &capacity_factor)?;

    Ok(UnitOutcome::Completed(Vec::new()))
}

fn run_region(
    project: &Project,
    output_dir: &Path,
    region: &RegionID,
    year: u32,
) -> Result<UnitOutcome> {
    let options = GridFileOptions {
        variable: CAPACITY_FACTOR_VARIABLE,
        no_data_value: None,
    };
    let capacity_factor = read_gridded_field(&wind_power_file(output_dir, year), &options)?;
    let boundary = read_boundary(&project.boundary_file(region))?;
    let series = extract_region(
        &capacity_factor,
        &boundary,
        project.parameters.regions.weighting,
    )
    .with_context(|| format!("Failed to extract region {region} for {year}"))?;
    write_time_series(&region_series_file(output_dir, region, year), &series)?;

    Ok(UnitOutcome::Completed(Vec::new()))
}

fn run_value_factor(
    project: &Project,
    output_dir: &Path,
    region: &RegionID,
    year: u32,
) -> Result<UnitOutcome> {
    let country = region.country_code();
    let Some(price_file) = project.country_price_file(&country) else {
        return Ok(UnitOutcome::Skipped(format!("No price data for {country}")));
    };

    let generation = read_generation_series(&region_series_file(output_dir, region, year))?;
    let prices = read_prices(&price_file, &project.price_columns(), year)?;
    let market_value = assess(&generation, &prices, &project.parameters.prices.gap_policy())
        .with_context(|| format!("Failed to calculate value factor for {region} {year}"))?;
    market_value.log_warnings(&format!("{region} {year}"));

    let row = ValueFactorRow::new(region, year, &market_value);
    write_capture_price(&capture_price_file(output_dir, region, year), &row)?;
    write_value_factor(&value_factor_file(output_dir, region, year), &row)?;

    Ok(UnitOutcome::Completed(vec![row]))
}

fn run_zonal(
    project: &Project,
    output_dir: &Path,
    country: &CountryCode,
    year: u32,
) -> Result<UnitOutcome> {
    let zones = &project.parameters.zonal[country].zones;
    let price_file = project
        .zonal_price_file(country)
        .with_context(|| format!("{country} is not a zonal country"))?;
    let mut prices = read_zonal_prices(&price_file, zones, year)?;

    // Every zone is required
    let zone_series = zones
        .iter()
        .map(|zone| {
            let generation = read_generation_series(&region_series_file(output_dir, zone, year))?;
            let prices = prices
                .swap_remove(zone)
                .with_context(|| format!("No prices for zone {zone}"))?;
            Ok(ZoneSeries {
                zone: zone.clone(),
                generation,
                prices,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let policy = project.parameters.prices.gap_policy();
    let mut rows = Vec::new();
    for zone in &zone_series {
        let market_value = assess(&zone.generation, &zone.prices, &policy).with_context(|| {
            format!("Failed to calculate value factor for {} {year}", zone.zone)
        })?;
        market_value.log_warnings(&format!("{} {year}", zone.zone));

        let row = ValueFactorRow::new(&zone.zone, year, &market_value);
        write_value_factor(&zonal_value_factor_file(output_dir, &zone.zone, year), &row)?;
        rows.push(row);
    }

    let aggregate = aggregate_zones(country, &zone_series)?;
    if let Some(weights) = &aggregate.weights {
        for (zone, weight) in weights {
            debug!("Weight of {zone} in {country} {year}: {weight}");
        }
    }
    let market_value = assess(&aggregate.generation, &aggregate.prices, &policy)
        .with_context(|| format!("Failed to calculate value factor for {country} {year}"))?;
    market_value.log_warnings(&format!("{country} {year}"));

    let row = ValueFactorRow::new(country, year, &market_value);
    write_zonal_value_factor(
        &zonal_value_factor_file(output_dir, country, year),
        &row,
        zones,
    )?;
    rows.push(row);

    Ok(UnitOutcome::Completed(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::create_output_directory;
    use rstest::{fixture, rstest};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    const PROJECT_FILE: &str = r#"years = [2020, 2021]

[prices]
max_interpolation_gap = 0
countries = { DE = "Germany.csv", FR = "France.csv" }

[zonal.DK]
price_file = "Denmark.csv"
zones = ["DK_1", "DK_2"]
"#;

    /// Write a rectangular boundary
    fn write_boundary(dir: &Path, region: &str, lon: (f64, f64)) {
        let contents = format!(
            r#"{{"type": "Polygon", "coordinates": [[[{0}, 49.0], [{1}, 49.0], [{1}, 52.0], [{0}, 52.0], [{0}, 49.0]]]}}"#,
            lon.0, lon.1
        );
        fs::write(dir.join(format!("{region}.geojson")), contents).unwrap();
    }

    /// Write a wind speed file: one latitude, longitudes 5, 6 and 7, 24 hours
    fn write_wind_speed(dir: &Path, year: u32) {
        let mut contents = String::from("time,latitude,longitude,wind_speed\n");
        for hour in 0..24 {
            for (lon, speed) in [(5.0, 4.0 + f64::from(hour) / 4.0), (6.0, 9.0), (7.0, 14.0)] {
                contents.push_str(&format!(
                    "{year}-01-01T{hour:02}:00:00Z,50.0,{lon},{speed}\n"
                ));
            }
        }
        fs::write(dir.join(format!("ERA5_wind_speed_{year}.csv")), contents).unwrap();
    }

    fn write_prices(dir: &Path) {
        let mut germany = String::from("Datetime (UTC),Price (EUR/MWhe)\n");
        let mut denmark = String::from("Datetime,DK1,DK2\n");
        for hour in 0..24 {
            let price = 20.0 + f64::from(hour) * 2.0;
            germany.push_str(&format!("2020-01-01 {hour:02}:00:00,{price}\n"));
            denmark.push_str(&format!("2020-01-01 {hour:02}:00:00,{price},{}\n", price + 5.0));
        }
        fs::write(dir.join("Germany.csv"), germany).unwrap();
        fs::write(dir.join("Denmark.csv"), denmark).unwrap();
    }

    #[fixture]
    fn project_dir() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("project.toml"), PROJECT_FILE).unwrap();
        write_boundary(dir.path(), "DE", (4.5, 5.5));
        write_boundary(dir.path(), "DK_1", (5.5, 6.5));
        write_boundary(dir.path(), "DK_2", (6.5, 7.5));
        write_boundary(dir.path(), "NL", (4.5, 7.5));
        write_boundary(dir.path(), "FR", (0.0, 1.0)); // no grid cells
        write_wind_speed(dir.path(), 2020);
        write_prices(dir.path());
        dir
    }

    fn run_project(project_dir: &Path, options: &RunOptions) -> (RunSummary, PathBuf) {
        let project = Project::from_path(project_dir).unwrap();
        let output_dir = project_dir.join("output");
        create_output_directory(&output_dir, true).unwrap();
        let summary = run(&project, &output_dir, options).unwrap();
        (summary, output_dir)
    }

    fn outcome<'a>(summary: &'a RunSummary, stage: Stage, unit: &str) -> &'a UnitOutcome {
        summary
            .outcomes
            .iter()
            .find(|(u, _)| u.stage() == stage && u.to_string() == unit)
            .map(|(_, outcome)| outcome)
            .unwrap()
    }

    #[rstest]
    fn test_build_work_list(project_dir: TempDir) {
        let project = Project::from_path(project_dir.path()).unwrap();
        let options = RunOptions::default();

        assert_eq!(
            build_work_list(&project, Stage::WindPower, &options),
            [
                WorkUnit::WindPower { year: 2020 },
                WorkUnit::WindPower { year: 2021 }
            ]
        );
        assert_eq!(build_work_list(&project, Stage::Regions, &options).len(), 10);

        // DK zones are handled by the zonal stage
        let value_factor_units = build_work_list(&project, Stage::ValueFactor, &options);
        assert_eq!(value_factor_units.len(), 6);
        assert!(value_factor_units.iter().all(|unit| !unit.to_string().starts_with("DK")));

        let options = RunOptions {
            years: Some(vec![2020]),
            regions: Some(["DE".into()].into_iter().collect()),
            ..RunOptions::default()
        };
        assert!(build_work_list(&project, Stage::Zonal, &options).is_empty());
        assert_eq!(
            build_work_list(&project, Stage::ValueFactor, &options),
            [WorkUnit::ValueFactor {
                region: "DE".into(),
                year: 2020
            }]
        );
    }

    #[test]
    fn test_selected_stages() {
        assert_eq!(RunOptions::default().selected_stages().len(), 4);
        let options = RunOptions {
            stages: vec![Stage::Zonal, Stage::WindPower],
            ..RunOptions::default()
        };
        assert_eq!(options.selected_stages(), [Stage::WindPower, Stage::Zonal]);
    }

    #[rstest]
    fn test_run_failure_isolation(project_dir: TempDir) {
        let (summary, output_dir) = run_project(project_dir.path(), &RunOptions::default());

        // No wind speed data for 2021, so all of its units are skipped
        assert!(matches!(
            outcome(&summary, Stage::WindPower, "2021"),
            UnitOutcome::Skipped(_)
        ));
        assert!(matches!(
            outcome(&summary, Stage::Regions, "DE 2021"),
            UnitOutcome::Skipped(_)
        ));

        // FR boundary contains no grid cells
        assert!(matches!(
            outcome(&summary, Stage::Regions, "FR 2020"),
            UnitOutcome::Failed(_)
        ));
        assert!(matches!(
            outcome(&summary, Stage::ValueFactor, "FR 2020"),
            UnitOutcome::Skipped(_)
        ));

        // NL has no price data
        assert_eq!(
            outcome(&summary, Stage::ValueFactor, "NL 2020"),
            &UnitOutcome::Skipped("No price data for NL".into())
        );

        // Other units still complete
        assert!(matches!(
            outcome(&summary, Stage::ValueFactor, "DE 2020"),
            UnitOutcome::Completed(rows) if rows.len() == 1
        ));
        assert!(matches!(
            outcome(&summary, Stage::Zonal, "DK 2020"),
            UnitOutcome::Completed(rows) if rows.len() == 3
        ));
        assert_eq!(summary.count("failed"), 1);

        let region = RegionID::new("DE");
        assert!(wind_power_file(&output_dir, 2020).is_file());
        assert!(region_series_file(&output_dir, &region, 2020).is_file());
        assert!(capture_price_file(&output_dir, &region, 2020).is_file());
        assert!(value_factor_file(&output_dir, &region, 2020).is_file());
        assert!(zonal_value_factor_file(&output_dir, &"DK", 2020).is_file());
        assert!(zonal_value_factor_file(&output_dir, &"DK_2", 2020).is_file());
        assert!(output_dir.join("unit_status.csv").is_file());
        assert!(output_dir.join("value_factor_summary.csv").is_file());
    }

    #[rstest]
    fn test_run_value_factors(project_dir: TempDir) {
        let (summary, _) = run_project(project_dir.path(), &RunOptions::default());
        let value_factors = summary.value_factors();
        let get = |region: &str| {
            value_factors
                .iter()
                .find(|row| row.region == region && row.year == 2020)
                .unwrap()
        };

        // DE generation rises through the day along with prices
        let germany = get("DE");
        assert_eq!(germany.hours, 24);
        assert!(germany.value_factor.unwrap() > 1.0);

        // DK_1 and DK_2 have constant wind speed, so their capture price is the baseload price
        let dk_1 = get("DK_1");
        assert!((dk_1.value_factor.unwrap() - 1.0).abs() < 1e-12);
        let denmark = get("DK");
        assert!(denmark.capture_price.unwrap() > get("DK_1").capture_price.unwrap());
        assert!(denmark.capture_price.unwrap() < get("DK_2").capture_price.unwrap());
    }

    #[rstest]
    fn test_rerun_removes_outputs_of_failed_units(project_dir: TempDir) {
        let options = RunOptions {
            years: Some(vec![2020]),
            ..RunOptions::default()
        };
        let (_, output_dir) = run_project(project_dir.path(), &options);
        let region = RegionID::new("DE");
        assert!(value_factor_file(&output_dir, &region, 2020).is_file());

        // Duplicate the first data row of the wind speed file
        let wind_speed_path = project_dir.path().join("ERA5_wind_speed_2020.csv");
        let mut contents = fs::read_to_string(&wind_speed_path).unwrap();
        let first_row = contents.lines().nth(1).unwrap().to_string();
        contents.push_str(&format!("{first_row}\n"));
        fs::write(&wind_speed_path, contents).unwrap();

        let (summary, output_dir) = run_project(project_dir.path(), &options);
        assert!(matches!(
            outcome(&summary, Stage::WindPower, "2020"),
            UnitOutcome::Failed(_)
        ));
        assert!(matches!(
            outcome(&summary, Stage::Regions, "DE 2020"),
            UnitOutcome::Skipped(_)
        ));
        assert!(matches!(
            outcome(&summary, Stage::ValueFactor, "DE 2020"),
            UnitOutcome::Skipped(_)
        ));
        assert!(matches!(
            outcome(&summary, Stage::Zonal, "DK 2020"),
            UnitOutcome::Skipped(_)
        ));
        assert!(summary.value_factors().is_empty());

        assert!(!wind_power_file(&output_dir, 2020).exists());
        assert!(!region_series_file(&output_dir, &region, 2020).exists());
        assert!(!capture_price_file(&output_dir, &region, 2020).exists());
        assert!(!value_factor_file(&output_dir, &region, 2020).exists());
        assert!(!zonal_value_factor_file(&output_dir, &"DK", 2020).exists());
        assert!(!zonal_value_factor_file(&output_dir, &"DK_1", 2020).exists());
    }

    #[rstest]
    fn test_run_single_stage_reuses_outputs(project_dir: TempDir) {
        let options = RunOptions {
            stages: vec![Stage::WindPower, Stage::Regions],
            years: Some(vec![2020]),
            ..RunOptions::default()
        };
        let (summary, _) = run_project(project_dir.path(), &options);
        assert!(summary.value_factors().is_empty());

        let options = RunOptions {
            stages: vec![Stage::ValueFactor],
            years: Some(vec![2020]),
            ..RunOptions::default()
        };
        let (summary, _) = run_project(project_dir.path(), &options);
        assert!(matches!(
            outcome(&summary, Stage::ValueFactor, "DE 2020"),
            UnitOutcome::Completed(_)
        ));
    }
}
