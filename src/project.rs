//! Code for loading a project: its configuration plus the inputs shared by every work unit.
use crate::input::grid::GridFileOptions;
use crate::input::power_curve::read_power_curve;
use crate::input::prices::PriceColumns;
use crate::power_curve::PowerCurve;
use crate::region::{CountryCode, RegionID};
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::ProjectParameters;

/// The file extension of region boundary files
const BOUNDARY_FILE_EXTENSION: &str = "geojson";

/// A project loaded from its directory
pub struct Project {
    /// The project directory. Relative paths in the configuration are relative to this.
    pub dir: PathBuf,
    /// The contents of `project.toml`
    pub parameters: ProjectParameters,
    /// The regions to process
    pub regions: IndexSet<RegionID>,
    /// The power curve used to convert wind speed to power
    pub power_curve: PowerCurve,
}

impl Project {
    /// Load a project from the specified directory.
    ///
    /// This reads and validates the project file, finds the regions to process and reads the power
    /// curve. Per-year input files are not read.
    pub fn from_path<P: AsRef<Path>>(project_dir: P) -> Result<Project> {
        let dir = project_dir.as_ref().to_path_buf();
        let parameters = ProjectParameters::from_path(&dir)?;

        let boundary_dir = dir.join(&parameters.paths.boundary_dir);
        let available = discover_regions(&boundary_dir)?;
        let regions = match &parameters.regions.include {
            None => available,
            Some(include) => {
                for region in include.iter().filter(|region| !available.contains(*region)) {
                    warn!(
                        "No boundary file for region {region} in {}",
                        boundary_dir.display()
                    );
                }
                include.iter().cloned().collect()
            }
        };

        for (country, zonal) in &parameters.zonal {
            for zone in zonal.zones.iter().filter(|zone| !regions.contains(*zone)) {
                warn!("Zone {zone} of {country} is not among the regions to process");
            }
        }

        let power_curve = match &parameters.wind.power_curve_file {
            Some(file) => {
                let path = dir.join(file);
                info!("Reading power curve from {}", path.display());
                read_power_curve(&path, parameters.wind.power_curve_header_rows)?
            }
            None => {
                info!("No power curve file given; using a generic turbine");
                parameters.wind.generic_power_curve()?
            }
        };

        Ok(Project {
            dir,
            parameters,
            regions,
            power_curve,
        })
    }

    /// The years to process
    pub fn years(&self) -> &[u32] {
        &self.parameters.years
    }

    /// The path to the wind speed file for the given year
    pub fn wind_speed_file(&self, year: u32) -> PathBuf {
        self.dir
            .join(&self.parameters.paths.wind_speed_dir)
            .join(self.parameters.wind_speed_file_name(year))
    }

    /// The path to a region's boundary file
    pub fn boundary_file(&self, region: &RegionID) -> PathBuf {
        self.dir
            .join(&self.parameters.paths.boundary_dir)
            .join(format!("{region}.{BOUNDARY_FILE_EXTENSION}"))
    }

    /// The path to the price file of a single-zone country, if it has one
    pub fn country_price_file(&self, country: &CountryCode) -> Option<PathBuf> {
        let file = self.parameters.prices.countries.get(country)?;
        Some(self.price_path(file))
    }

    /// The path to the wide price file of a zonal country, if it is zonal
    pub fn zonal_price_file(&self, country: &CountryCode) -> Option<PathBuf> {
        let zonal = self.parameters.zonal.get(country)?;
        Some(self.price_path(&zonal.price_file))
    }

    fn price_path(&self, file: &Path) -> PathBuf {
        self.dir.join(&self.parameters.paths.price_dir).join(file)
    }

    /// The columns to read from single-zone price files
    pub fn price_columns(&self) -> PriceColumns<'_> {
        PriceColumns {
            time: &self.parameters.prices.price_time_column,
            value: &self.parameters.prices.price_value_column,
        }
    }

    /// Options for reading gridded wind speed files
    pub fn grid_file_options(&self) -> GridFileOptions<'_> {
        GridFileOptions {
            variable: &self.parameters.wind.wind_speed_variable,
            no_data_value: self.parameters.wind.no_data_value,
        }
    }
}

/// Find the regions which have a boundary file, sorted by ID
fn discover_regions(boundary_dir: &Path) -> Result<IndexSet<RegionID>> {
    let entries = fs::read_dir(boundary_dir).with_context(|| {
        format!(
            "Could not read boundary directory {}",
            boundary_dir.display()
        )
    })?;

    let mut regions = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(BOUNDARY_FILE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            regions.push(RegionID::new(stem));
        }
    }
    ensure!(
        !regions.is_empty(),
        "No region boundary files (*.{BOUNDARY_FILE_EXTENSION}) found in {}",
        boundary_dir.display()
    );
    regions.sort();

    Ok(regions.into_iter().collect())
}
