//! Conversion of gridded wind speed into gridded capacity factor.
use crate::grid::GriddedField;
use crate::power_curve::PowerCurve;
use crate::units::{Dimensionless, WindSpeed};
use anyhow::Result;
use log::{debug, warn};
use ndarray::Axis;

/// Plausibility limits used to flag suspicious input and output values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibilityLimits {
    /// Wind speeds below this are reported
    pub min_wind_speed: WindSpeed,
    /// Wind speeds above this are reported
    pub max_wind_speed: WindSpeed,
    /// Grid cells whose mean capacity factor exceeds this are reported
    pub max_capacity_factor: Dimensionless,
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        Self {
            min_wind_speed: WindSpeed(0.0),
            max_wind_speed: WindSpeed(30.0),
            max_capacity_factor: Dimensionless(0.95),
        }
    }
}

/// Convert a field of wind speeds (m/s) to a field of capacity factors with the given power curve.
///
/// The output has exactly the same coordinates as the input. Missing wind speeds give missing
/// capacity factors. Implausible wind speeds and capacity factors are logged, but still converted.
pub fn estimate_capacity_factor(
    wind_speed: &GriddedField,
    curve: &PowerCurve,
    limits: &PlausibilityLimits,
) -> Result<GriddedField> {
    let speeds = wind_speed.values();
    let out_of_range = speeds
        .iter()
        .filter(|&&speed| {
            let speed = WindSpeed(speed);
            speed < limits.min_wind_speed || speed > limits.max_wind_speed
        })
        .count();
    if out_of_range > 0 {
        warn!(
            "{out_of_range} wind speed value(s) fall outside the plausible range [{}, {}] m/s",
            limits.min_wind_speed, limits.max_wind_speed
        );
    }

    let missing = speeds.iter().filter(|speed| speed.is_nan()).count();
    if missing > 0 {
        debug!("{missing} wind speed value(s) are missing");
    }

    let capacity_factor = speeds.mapv(|speed| curve.capacity_factor_at(WindSpeed(speed)).value());

    let implausible_cells = capacity_factor
        .lanes(Axis(0))
        .into_iter()
        .filter_map(|series| mean_valid(series.iter().copied()))
        .filter(|mean| Dimensionless(*mean) > limits.max_capacity_factor)
        .count();
    if implausible_cells > 0 {
        warn!(
            "{implausible_cells} grid cell(s) have a mean capacity factor above {}",
            limits.max_capacity_factor
        );
    }

    wind_speed.with_values(capacity_factor)
}

/// The mean of the non-missing values, or `None` if all are missing
fn mean_valid<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .filter(|value| !value.is_nan())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
