//! Hourly time series indexed by UTC timestamp.
//!
//! Both regional generation series and electricity price series are represented by [`TimeSeries`].
//! Missing values are stored as NaN so that they can be told apart from genuine zeros.
use crate::input::is_sorted_and_unique;
use anyhow::{Result, bail, ensure};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use itertools::Itertools;

/// A series of values indexed by strictly increasing UTC timestamps
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    times: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a new [`TimeSeries`].
    ///
    /// Returns an error if the lengths of `times` and `values` differ or if the timestamps are not
    /// strictly increasing.
    pub fn new(times: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        ensure!(
            times.len() == values.len(),
            "Time series has {} timestamps but {} values",
            times.len(),
            values.len()
        );
        if let Some((t1, _)) = times.iter().tuple_windows().find(|(t1, t2)| t1 >= t2) {
            if times.iter().filter(|t| *t == t1).count() > 1 {
                bail!("Duplicate timestamp in time series: {t1}");
            }
            bail!("Timestamps must be in increasing order (found {t1} out of order)");
        }

        Ok(Self { times, values })
    }

    /// Create a [`TimeSeries`] from an iterator of (timestamp, value) pairs, sorting by timestamp.
    ///
    /// Returns an error if there are duplicate timestamps.
    pub fn from_unsorted<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let (times, values) = iter
            .into_iter()
            .sorted_by_key(|(time, _)| *time)
            .unzip();
        Self::new(times, values)
    }

    /// The timestamps of the series
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// The values of the series (NaN = missing)
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The number of entries in the series
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate over (timestamp, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// The number of missing values
    pub fn count_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// The sum of all non-missing values
    pub fn sum_valid(&self) -> f64 {
        self.values.iter().filter(|v| !v.is_nan()).sum()
    }

    /// Get the subset of the series which falls in the given calendar year (UTC)
    pub fn filter_year(&self, year: u32) -> TimeSeries {
        let (times, values) = self
            .iter()
            .filter(|(time, _)| u32::try_from(time.year()) == Ok(year))
            .unzip();
        Self { times, values }
    }

    /// Reindex the series onto a regular hourly index spanning its first and last timestamps.
    ///
    /// Hours absent from the series become missing values. Every timestamp must fall exactly on the
    /// hour.
    pub fn regularise_hourly(&self) -> Result<TimeSeries> {
        let (Some(first), Some(last)) = (self.times.first(), self.times.last()) else {
            return Ok(self.clone());
        };

        if let Some(time) = self
            .times
            .iter()
            .find(|time| time.minute() != 0 || time.second() != 0 || time.nanosecond() != 0)
        {
            bail!("Timestamp {time} does not fall on the hour");
        }

        let num_hours = usize::try_from((*last - *first).num_hours())? + 1;
        let mut times = Vec::with_capacity(num_hours);
        let mut values = Vec::with_capacity(num_hours);
        let mut existing = self.iter().peekable();
        for hour in 0..num_hours {
            let time = *first + Duration::hours(i64::try_from(hour)?);
            let value = existing
                .next_if(|(existing_time, _)| *existing_time == time)
                .map_or(f64::NAN, |(_, value)| value);
            times.push(time);
            values.push(value);
        }

        Ok(Self { times, values })
    }

    /// Linearly interpolate runs of missing values no longer than `max_gap` entries.
    ///
    /// Only interior gaps (with valid values on both sides) are filled. The series is assumed to be
    /// regular (see [`TimeSeries::regularise_hourly`]).
    ///
    /// # Returns
    ///
    /// The new series and the number of values which were filled in.
    pub fn interpolate_gaps(&self, max_gap: usize) -> (TimeSeries, usize) {
        let mut values = self.values.clone();
        let mut filled = 0;
        let mut last_valid: Option<usize> = None;
        for i in 0..values.len() {
            if values[i].is_nan() {
                continue;
            }

            if let Some(start) = last_valid {
                let gap = i - start - 1;
                if gap > 0 && gap <= max_gap {
                    let (v0, v1) = (values[start], values[i]);
                    let span = (i - start) as f64;
                    for (offset, value) in values[start + 1..i].iter_mut().enumerate() {
                        *value = v0 + (v1 - v0) * (offset + 1) as f64 / span;
                    }
                    filled += gap;
                }
            }
            last_valid = Some(i);
        }

        (
            Self {
                times: self.times.clone(),
                values,
            },
            filled,
        )
    }
}

/// Check that the timestamps are strictly increasing and exactly one hour apart
pub fn check_hourly(times: &[DateTime<Utc>]) -> Result<()> {
    ensure!(
        is_sorted_and_unique(times.iter()),
        "Timestamps must be unique and in increasing order"
    );
    if let Some((t1, t2)) = times
        .iter()
        .tuple_windows()
        .find(|(t1, t2)| **t2 - **t1 != Duration::hours(1))
    {
        bail!("Timestamps must be hourly, but {t1} is followed by {t2}");
    }

    Ok(())
}
