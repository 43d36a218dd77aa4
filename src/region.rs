//! Regions are the geographical areas (countries or bidding zones) for which time series are
//! extracted from gridded data.
use crate::boundary::RegionBoundary;
use crate::grid::GriddedField;
use crate::id::{IDCollection, define_id_type};
use crate::timeseries::TimeSeries;
use anyhow::{Result, ensure};
use indexmap::IndexSet;
use ndarray::{Array2, Axis};
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {RegionID}
define_id_type! {CountryCode}

impl RegionID {
    /// The code of the country the region belongs to.
    ///
    /// This is the part of the region ID before the first underscore (e.g. `DK` for `DK_1`).
    pub fn country_code(&self) -> CountryCode {
        let code = self.as_str().split('_').next().unwrap_or_default();
        CountryCode::new(code)
    }
}

/// How grid cells within a region are weighted when averaging
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq, Default)]
pub enum SpatialWeighting {
    /// Every selected cell has the same weight
    #[default]
    #[string = "uniform"]
    Uniform,
    /// Cells are weighted by the cosine of their latitude, i.e. by their area
    #[string = "cos_latitude"]
    CosLatitude,
}

impl SpatialWeighting {
    fn weight(self, latitude: f64) -> f64 {
        match self {
            Self::Uniform => 1.0,
            Self::CosLatitude => latitude.to_radians().cos(),
        }
    }
}

/// Parse a string of regions separated by semicolons into a set of [`RegionID`]s.
///
/// The string can be either "all" (case-insensitive), a single region, or a semicolon-separated
/// list of regions (e.g. "DE;DK_1;DK_2" or "DE; DK_1; DK_2")
pub fn parse_region_str(s: &str, region_ids: &IndexSet<RegionID>) -> Result<IndexSet<RegionID>> {
    let s = s.trim();
    ensure!(!s.is_empty(), "No regions provided");

    if s.eq_ignore_ascii_case("all") {
        return Ok(region_ids.clone());
    }

    s.split(';')
        .map(|region| region_ids.get_id_by_str(region.trim()))
        .collect()
}

/// Extract the time series for a region from a gridded field.
///
/// Every grid cell whose centre lies within the boundary is selected. For each time step, the
/// result is the weighted mean over selected cells with a valid value, or missing if all selected
/// cells are missing.
pub fn extract_region(
    field: &GriddedField,
    boundary: &RegionBoundary,
    weighting: SpatialWeighting,
) -> Result<TimeSeries> {
    // Weight for each (latitude, longitude) cell; zero for cells outside the region
    let mut weights = Array2::<f64>::zeros((field.latitudes().len(), field.longitudes().len()));
    for ((i, j), weight) in weights.indexed_iter_mut() {
        let (lat, lon) = (field.latitudes()[i], field.longitudes()[j]);
        if boundary.contains(lon, lat) {
            *weight = weighting.weight(lat);
        }
    }

    let selected = weights.iter().filter(|weight| **weight > 0.0).count();
    ensure!(
        selected > 0,
        "Region boundary does not contain any grid cell centres (grid covers {})",
        field.extent()
    );

    let values: Vec<f64> = field
        .values()
        .axis_iter(Axis(0))
        .map(|slice| {
            let (weighted_sum, weight_sum) = slice
                .iter()
                .zip(weights.iter())
                .filter(|(value, weight)| **weight > 0.0 && !value.is_nan())
                .fold((0.0, 0.0), |(sum, total), (value, weight)| {
                    (sum + value * weight, total + weight)
                });
            if weight_sum > 0.0 {
                weighted_sum / weight_sum
            } else {
                f64::NAN
            }
        })
        .collect();

    TimeSeries::new(field.times().to_vec(), values)
}
