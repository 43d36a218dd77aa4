//! Calculation of value factors, i.e. the ratio of capture price to baseload price.
use crate::capture_price::{AlignedSeries, GapPolicy, align_with_policy, capture_price};
use crate::timeseries::TimeSeries;
use crate::units::{Dimensionless, MoneyPerEnergy};
use anyhow::Result;
use log::{info, warn};

/// The range of value factors considered plausible
const PLAUSIBLE_VALUE_FACTOR: (Dimensionless, Dimensionless) =
    (Dimensionless(0.0), Dimensionless(2.0));

/// Market value metrics of wind generation for one region and year
#[derive(Debug, Clone, PartialEq)]
pub struct MarketValue {
    /// Generation-weighted average price (`None` if undefined)
    pub capture_price: Option<MoneyPerEnergy>,
    /// Unweighted mean price over the same hours
    pub baseload_price: MoneyPerEnergy,
    /// Capture price divided by baseload price (`None` if undefined)
    pub value_factor: Option<Dimensionless>,
    /// The number of hours used in the calculation
    pub hours: usize,
    /// The number of UTC days discarded for having too many missing hours
    pub excluded_days: usize,
    /// The number of price hours filled by interpolation
    pub interpolated_hours: usize,
}

impl MarketValue {
    /// Log warnings about undefined or implausible results
    pub fn log_warnings(&self, label: &str) {
        if self.excluded_days > 0 {
            warn!(
                "{label}: {} day(s) excluded for having too many missing hours",
                self.excluded_days
            );
        }
        if self.interpolated_hours > 0 {
            info!(
                "{label}: {} missing price hour(s) filled by interpolation",
                self.interpolated_hours
            );
        }

        match (self.capture_price, self.value_factor) {
            (None, _) => {
                warn!("{label}: total generation is zero, so capture price is undefined");
            }
            (Some(_), None) => {
                warn!("{label}: baseload price is zero, so value factor is undefined");
            }
            (Some(_), Some(value_factor)) => {
                let (min, max) = PLAUSIBLE_VALUE_FACTOR;
                if !(min..=max).contains(&value_factor) {
                    warn!("{label}: value factor {value_factor} is outside the range [{min}, {max}]");
                }
            }
        }
    }
}

/// The unweighted mean price over the aligned hours
pub fn baseload_price(aligned: &AlignedSeries) -> MoneyPerEnergy {
    let valid = aligned
        .prices()
        .iter()
        .filter(|price| !price.is_nan())
        .collect::<Vec<_>>();
    let sum: f64 = valid.iter().copied().sum();
    MoneyPerEnergy(sum / valid.len() as f64)
}

/// Calculate the value factor from capture price and baseload price.
///
/// The result is not clamped. Returns `None` if the capture price is undefined or the baseload
/// price is zero.
pub fn value_factor(
    capture_price: Option<MoneyPerEnergy>,
    baseload_price: MoneyPerEnergy,
) -> Option<Dimensionless> {
    let capture_price = capture_price?;
    (baseload_price != MoneyPerEnergy(0.0) && !baseload_price.is_nan())
        .then(|| capture_price / baseload_price)
}

/// Calculate the market value metrics for a generation series against a price series.
///
/// Returns an error if the gap policy leaves no valid hours.
pub fn assess(
    generation: &TimeSeries,
    prices: &TimeSeries,
    policy: &GapPolicy,
) -> Result<MarketValue> {
    let alignment = align_with_policy(generation, prices, policy)?;
    let capture_price = capture_price(&alignment.aligned);
    let baseload_price = baseload_price(&alignment.aligned);

    Ok(MarketValue {
        capture_price,
        baseload_price,
        value_factor: value_factor(capture_price, baseload_price),
        hours: alignment.aligned.len(),
        excluded_days: alignment.excluded_days,
        interpolated_hours: alignment.interpolated_hours,
    })
}
