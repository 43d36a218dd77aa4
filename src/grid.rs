//! Gridded hourly fields on a regular latitude/longitude grid.
use crate::timeseries::check_hourly;
use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use ndarray::Array3;

/// Relative tolerance used when checking that grid spacing is constant
const SPACING_TOLERANCE: f64 = 1e-6;

/// A 3-D field of values indexed by `(time, latitude, longitude)`.
///
/// Times are hourly and in UTC. Latitudes and longitudes are strictly increasing with constant
/// spacing. Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    times: Vec<DateTime<Utc>>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    values: Array3<f64>,
}

impl GriddedField {
    /// Create a new [`GriddedField`], checking that the coordinates are valid and match the shape
    /// of `values`.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        values: Array3<f64>,
    ) -> Result<Self> {
        ensure!(
            values.dim() == (times.len(), latitudes.len(), longitudes.len()),
            "Grid values have shape {:?} but coordinates have lengths ({}, {}, {})",
            values.dim(),
            times.len(),
            latitudes.len(),
            longitudes.len()
        );
        ensure!(!times.is_empty(), "Grid has no time steps");
        check_hourly(&times)?;
        check_regular_axis("latitude", &latitudes)?;
        check_regular_axis("longitude", &longitudes)?;

        Ok(Self {
            times,
            latitudes,
            longitudes,
            values,
        })
    }

    /// The timestamps of the field
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// The latitudes of the grid cell centres
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    /// The longitudes of the grid cell centres
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// The values of the field
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Create a new field with the same coordinates but different values
    pub fn with_values(&self, values: Array3<f64>) -> Result<Self> {
        Self::new(
            self.times.clone(),
            self.latitudes.clone(),
            self.longitudes.clone(),
            values,
        )
    }

    /// A human-readable description of the extent of the grid
    pub fn extent(&self) -> String {
        let first_last = |axis: &[f64]| (axis[0], axis[axis.len() - 1]);
        let (lat0, lat1) = first_last(&self.latitudes);
        let (lon0, lon1) = first_last(&self.longitudes);
        format!("latitude {lat0} to {lat1}, longitude {lon0} to {lon1}")
    }
}

/// Check that the coordinates are strictly increasing with constant spacing
fn check_regular_axis(name: &str, axis: &[f64]) -> Result<()> {
    ensure!(!axis.is_empty(), "Grid has no {name} values");
    ensure!(
        axis.iter().all(|x| x.is_finite()),
        "Grid {name} values must be finite"
    );
    ensure!(
        axis.iter().tuple_windows().all(|(a, b)| a < b),
        "Grid {name} values must be strictly increasing"
    );

    if let Some((a, b)) = axis.iter().tuple_windows().next() {
        let spacing = b - a;
        ensure!(
            axis.iter()
                .tuple_windows()
                .all(|(a, b)| ((b - a) - spacing).abs() <= SPACING_TOLERANCE * spacing),
            "Grid {name} values must be evenly spaced"
        );
    }

    Ok(())
}
