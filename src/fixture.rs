//! Fixtures for tests

use crate::boundary::RegionBoundary;
use crate::grid::GriddedField;
use crate::power_curve::PowerCurve;
use crate::units::{Power, WindSpeed};
use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::Array3;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// `n` consecutive hourly timestamps starting at midnight UTC on 1 January of `year`
pub fn hours(year: u32, n: usize) -> Vec<DateTime<Utc>> {
    let start = Utc
        .with_ymd_and_hms(year.try_into().unwrap(), 1, 1, 0, 0, 0)
        .unwrap();
    (0..n)
        .map(|hour| start + Duration::hours(hour.try_into().unwrap()))
        .collect()
}

/// The power curve table used in most tests (rated power 2000 kW)
#[fixture]
pub fn power_curve_points() -> Vec<(WindSpeed, Power)> {
    [
        (0.0, 0.0),
        (3.0, 0.0),
        (5.0, 200.0),
        (8.0, 600.0),
        (10.0, 1200.0),
        (12.0, 2000.0),
        (15.0, 2000.0),
        (20.0, 2000.0),
        (25.0, 0.0),
        (30.0, 0.0),
    ]
    .into_iter()
    .map(|(speed, power)| (WindSpeed(speed), Power(power)))
    .collect()
}

#[fixture]
pub fn power_curve(power_curve_points: Vec<(WindSpeed, Power)>) -> PowerCurve {
    PowerCurve::new(power_curve_points).unwrap()
}

/// A 4-hour field on a 2x3 grid (latitudes 50 and 51, longitudes 5, 6 and 7)
#[fixture]
pub fn wind_speed_field() -> GriddedField {
    let values = Array3::from_shape_fn((4, 2, 3), |(t, i, j)| (t + i + j) as f64 * 2.0);
    GriddedField::new(hours(2020, 4), vec![50.0, 51.0], vec![5.0, 6.0, 7.0], values).unwrap()
}

/// A square boundary which covers every cell of [`wind_speed_field`]
#[fixture]
pub fn covering_boundary() -> RegionBoundary {
    RegionBoundary::from_rectangle(4.0, 49.0, 8.0, 52.0)
}
