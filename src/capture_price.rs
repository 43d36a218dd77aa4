//! Calculation of generation-weighted capture prices.
//!
//! The capture price of a region is the average electricity price weighted by the region's hourly
//! generation:
//!
//! ```text
//! capture_price = Σ(g_t × p_t) / Σ g_t
//! ```
//!
//! Generation and price series are joined on their UTC timestamps before the calculation. Hours
//! present in only one series are never assumed to be zero.
use crate::timeseries::TimeSeries;
use crate::units::MoneyPerEnergy;
use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Rules for handling missing data when aligning generation and prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapPolicy {
    /// Days with more missing hours than this are discarded entirely
    pub max_missing_hours_per_day: u32,
    /// Runs of missing prices no longer than this many hours are linearly interpolated
    pub max_interpolation_gap: usize,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            max_missing_hours_per_day: 6,
            max_interpolation_gap: 3,
        }
    }
}

/// Generation and prices for the hours common to both series
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    times: Vec<DateTime<Utc>>,
    generation: Vec<f64>,
    prices: Vec<f64>,
}

impl AlignedSeries {
    /// The timestamps of the aligned hours
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Generation for each aligned hour
    pub fn generation(&self) -> &[f64] {
        &self.generation
    }

    /// Price for each aligned hour
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// The number of aligned hours
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether there are no aligned hours
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate over (timestamp, generation, price)
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64, f64)> + '_ {
        self.times
            .iter()
            .zip(&self.generation)
            .zip(&self.prices)
            .map(|((time, generation), price)| (*time, *generation, *price))
    }

    fn push(&mut self, time: DateTime<Utc>, generation: f64, price: f64) {
        self.times.push(time);
        self.generation.push(generation);
        self.prices.push(price);
    }
}

/// Join generation and prices on their timestamps (inner join).
///
/// Values in the result may still be missing (NaN).
pub fn align(generation: &TimeSeries, prices: &TimeSeries) -> AlignedSeries {
    let price_lookup: HashMap<_, _> = prices.iter().collect();
    let mut aligned = AlignedSeries::default();
    for (time, value) in generation.iter() {
        if let Some(price) = price_lookup.get(&time) {
            aligned.push(time, value, *price);
        }
    }

    aligned
}

/// The outcome of aligning generation with prices under a [`GapPolicy`]
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// The hours with valid generation and price
    pub aligned: AlignedSeries,
    /// The number of UTC days discarded for having too many missing hours
    pub excluded_days: usize,
    /// The number of price hours filled by interpolation
    pub interpolated_hours: usize,
}

/// Align generation with prices, applying the gap policy.
///
/// Short runs of missing prices are interpolated. Only hours listed in the price series with a
/// missing value are filled; hours absent from it are never given a price. Then, for every UTC day
/// of the generation series, hours which are absent from the prices or have a missing value are
/// counted. Days with too many missing hours are discarded,
/// otherwise only the missing hours are excluded.
///
/// Returns an error if no valid hours remain.
pub fn align_with_policy(
    generation: &TimeSeries,
    prices: &TimeSeries,
    policy: &GapPolicy,
) -> Result<Alignment> {
    let listed: HashSet<_> = prices.times().iter().copied().collect();
    let (filled, _) = prices
        .regularise_hourly()?
        .interpolate_gaps(policy.max_interpolation_gap);

    // Hours absent from the price file stay absent
    let price_lookup: HashMap<_, _> = filled
        .iter()
        .filter(|(time, _)| listed.contains(time))
        .collect();
    let interpolated_hours = prices
        .iter()
        .filter(|(time, price)| price.is_nan() && !price_lookup[time].is_nan())
        .count();

    let mut aligned = AlignedSeries::default();
    let mut excluded_days = 0;
    for (_, day) in &generation.iter().chunk_by(|(time, _)| time.date_naive()) {
        let hours = day
            .map(|(time, value)| {
                let price = price_lookup.get(&time).copied().unwrap_or(f64::NAN);
                (time, value, price)
            })
            .collect_vec();
        let missing = hours
            .iter()
            .filter(|(_, value, price)| value.is_nan() || price.is_nan())
            .count();
        if missing > policy.max_missing_hours_per_day as usize {
            excluded_days += 1;
            continue;
        }

        for (time, value, price) in hours {
            if !value.is_nan() && !price.is_nan() {
                aligned.push(time, value, price);
            }
        }
    }

    ensure!(
        !aligned.is_empty(),
        "No valid hours remain after aligning generation with prices ({} generation hours, {} \
        price hours, {excluded_days} day(s) excluded)",
        generation.len(),
        prices.len()
    );

    Ok(Alignment {
        aligned,
        excluded_days,
        interpolated_hours,
    })
}

/// Calculate the generation-weighted average price.
///
/// Hours with missing values are ignored. Returns `None` if total generation is zero (or there are
/// no valid hours).
pub fn capture_price(aligned: &AlignedSeries) -> Option<MoneyPerEnergy> {
    let (revenue, total_generation) = aligned
        .iter()
        .filter(|(_, generation, price)| !generation.is_nan() && !price.is_nan())
        .fold((0.0, 0.0), |(revenue, total), (_, generation, price)| {
            (revenue + generation * price, total + generation)
        });

    (total_generation != 0.0).then(|| MoneyPerEnergy(revenue / total_generation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, hours};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::new(hours(2020, values.len()), values.to_vec()).unwrap()
    }

    #[test]
    fn test_align_inner_join() {
        let generation = series(&[1.0, 2.0, 3.0, 4.0]);
        let times = hours(2020, 4);
        let prices =
            TimeSeries::new(vec![times[1], times[3]], vec![20.0, 40.0]).unwrap();
        let aligned = align(&generation, &prices);
        assert_eq!(aligned.times(), &[times[1], times[3]]);
        assert_eq!(aligned.generation(), &[2.0, 4.0]);
        assert_eq!(aligned.prices(), &[20.0, 40.0]);
    }

    #[test]
    fn test_capture_price_weighted() {
        // (2*14 + 5*16 + 10*26) / (2 + 5 + 10)
        let aligned = align(&series(&[2.0, 5.0, 10.0]), &series(&[14.0, 16.0, 26.0]));
        assert_approx_eq!(
            MoneyPerEnergy,
            capture_price(&aligned).unwrap(),
            MoneyPerEnergy(368.0 / 17.0)
        );
    }

    #[rstest]
    #[case(&[0.1, 0.5, 0.9, 0.0])]
    #[case(&[1.0])]
    fn test_capture_price_constant_price(#[case] generation: &[f64]) {
        let prices = vec![37.5; generation.len()];
        let aligned = align(&series(generation), &series(&prices));
        assert_approx_eq!(
            MoneyPerEnergy,
            capture_price(&aligned).unwrap(),
            MoneyPerEnergy(37.5)
        );
    }

    #[test]
    fn test_capture_price_zero_generation() {
        let aligned = align(&series(&[0.0, 0.0]), &series(&[10.0, 20.0]));
        assert_eq!(capture_price(&aligned), None);
        assert_eq!(capture_price(&AlignedSeries::default()), None);
    }

    #[test]
    fn test_align_with_policy_interpolates_prices() {
        let generation = series(&[1.0; 5]);
        let prices = series(&[10.0, f64::NAN, f64::NAN, f64::NAN, 50.0]);
        let alignment = align_with_policy(&generation, &prices, &GapPolicy::default()).unwrap();
        assert_eq!(alignment.interpolated_hours, 3);
        assert_eq!(alignment.excluded_days, 0);
        assert_eq!(alignment.aligned.prices(), &[10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_align_with_policy_keeps_absent_price_hours_out() {
        let generation = series(&[1.0, 10.0, 5.0]);
        let times = hours(2020, 3);
        let prices = TimeSeries::new(vec![times[0], times[2]], vec![10.0, 30.0]).unwrap();
        let alignment = align_with_policy(&generation, &prices, &GapPolicy::default()).unwrap();
        assert_eq!(alignment.interpolated_hours, 0);
        assert_eq!(alignment.aligned, align(&generation, &prices));
        assert_approx_eq!(
            MoneyPerEnergy,
            capture_price(&alignment.aligned).unwrap(),
            MoneyPerEnergy(160.0 / 6.0)
        );
    }

    #[test]
    fn test_align_with_policy_discards_days() {
        // Day 1 has 7 missing hours (discarded), day 2 has 2 (kept, minus those hours)
        let generation = series(&[1.0; 48]);
        let mut price_values = vec![30.0; 48];
        for hour in [0, 2, 4, 6, 8, 10, 12, 30, 40] {
            price_values[hour] = f64::NAN;
        }
        let prices = series(&price_values);
        let policy = GapPolicy {
            max_missing_hours_per_day: 6,
            max_interpolation_gap: 0,
        };
        let alignment = align_with_policy(&generation, &prices, &policy).unwrap();
        assert_eq!(alignment.excluded_days, 1);
        assert_eq!(alignment.aligned.len(), 22);
        assert!(alignment.aligned.times().iter().all(|time| time >= &hours(2020, 25)[24]));
    }

    #[test]
    fn test_align_with_policy_absent_prices_count_as_missing() {
        let generation = series(&[1.0; 24]);
        let times = hours(2020, 24);
        let prices = TimeSeries::new(times[..12].to_vec(), vec![30.0; 12]).unwrap();
        assert_error!(
            align_with_policy(&generation, &prices, &GapPolicy::default()),
            "No valid hours remain after aligning generation with prices (24 generation hours, 12 \
            price hours, 1 day(s) excluded)"
        );
    }

    #[test]
    fn test_align_with_policy_unaligned() {
        let generation = series(&[1.0; 3]);
        let prices = TimeSeries::new(hours(2021, 3), vec![30.0; 3]).unwrap();
        assert!(align_with_policy(&generation, &prices, &GapPolicy::default()).is_err());
    }
}
