//! Aggregation of bidding zones into a country-level generation and price series.
//!
//! Some countries are split into several bidding zones, each with its own prices. For these, a
//! country series is built by weighting each zone by its share of total generation.
use crate::region::{CountryCode, RegionID};
use crate::timeseries::TimeSeries;
use crate::units::Dimensionless;
use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::warn;
use std::collections::HashMap;

/// The generation and price series for a single bidding zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSeries {
    /// The zone's region ID
    pub zone: RegionID,
    /// Hourly generation (capacity factor)
    pub generation: TimeSeries,
    /// Hourly prices
    pub prices: TimeSeries,
}

/// Country-level series built from the series of its zones
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalAggregate {
    /// Weighted generation
    pub generation: TimeSeries,
    /// Weighted prices
    pub prices: TimeSeries,
    /// The weight given to each zone, or `None` if every zone has zero generation
    pub weights: Option<Vec<(RegionID, Dimensionless)>>,
}

/// Combine the series of a country's zones into a country-level series.
///
/// The country series cover only the timestamps common to every zone's generation and prices. Each
/// zone is weighted by its share of total generation over those hours, and an hour missing in any
/// zone is missing for the country.
///
/// If every zone has zero generation the weights are undefined. The generation series is then zero
/// throughout (so the capture price is undefined) and prices are an unweighted mean.
pub fn aggregate_zones(country: &CountryCode, zones: &[ZoneSeries]) -> Result<ZonalAggregate> {
    ensure!(!zones.is_empty(), "No zones provided for {country}");

    let generation: Vec<Lookup> = zones
        .iter()
        .map(|zone| zone.generation.iter().collect())
        .collect();
    let prices: Vec<Lookup> = zones.iter().map(|zone| zone.prices.iter().collect()).collect();
    let common = common_times(generation.iter().chain(&prices));

    // Weights only cover the hours which are aggregated
    let totals: Vec<f64> = generation
        .iter()
        .map(|lookup| {
            common
                .iter()
                .map(|time| lookup[time])
                .filter(|value| !value.is_nan())
                .sum::<f64>()
        })
        .collect();
    let grand_total: f64 = totals.iter().sum();
    let weights = if grand_total > 0.0 {
        Some(totals.iter().map(|total| total / grand_total).collect::<Vec<_>>())
    } else {
        warn!("Every zone of {country} has zero total generation; zone weights are undefined");
        None
    };

    let price_weights = weights
        .clone()
        .unwrap_or_else(|| vec![1.0 / zones.len() as f64; zones.len()]);
    let generation_weights = weights.clone().unwrap_or_else(|| vec![0.0; zones.len()]);

    Ok(ZonalAggregate {
        generation: weighted_sum(&generation, &common, &generation_weights)?,
        prices: weighted_sum(&prices, &common, &price_weights)?,
        weights: weights.map(|weights| {
            zones
                .iter()
                .zip(weights)
                .map(|(zone, weight)| (zone.zone.clone(), Dimensionless(weight)))
                .collect()
        }),
    })
}

type Lookup = HashMap<DateTime<Utc>, f64>;

/// The sorted timestamps present in every series
fn common_times<'a, I>(mut lookups: I) -> Vec<DateTime<Utc>>
where
    I: Iterator<Item = &'a Lookup> + Clone,
{
    let Some(first) = lookups.next() else {
        return Vec::new();
    };

    first
        .keys()
        .filter(|time| lookups.clone().all(|lookup| lookup.contains_key(*time)))
        .copied()
        .sorted()
        .collect()
}

/// Weighted sum of several series at the given timestamps
fn weighted_sum(lookups: &[Lookup], times: &[DateTime<Utc>], weights: &[f64]) -> Result<TimeSeries> {
    let values: Vec<f64> = times
        .iter()
        .map(|time| {
            lookups
                .iter()
                .zip(weights)
                .map(|(lookup, weight)| lookup[time] * weight)
                .sum::<f64>()
        })
        .collect();
    TimeSeries::new(times.to_vec(), values)
}
