//! Turbine power curves, mapping wind speed to power output.
use crate::units::{Dimensionless, Power, WindSpeed};
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use log::warn;

/// Spacing of the samples taken along the cubic ramp of a generic power curve
const GENERIC_RAMP_STEP: WindSpeed = WindSpeed(0.5);

/// Offset above the cut-out speed at which a generic power curve drops to zero
const GENERIC_CUT_OUT_OFFSET: WindSpeed = WindSpeed(0.01);

/// A turbine power curve given as a table of (wind speed, power) entries.
///
/// Power at speeds between entries is found by linear interpolation. Speeds outside the tabulated
/// range produce no power.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCurve {
    /// Entries sorted by strictly increasing wind speed
    points: Vec<(WindSpeed, Power)>,
    /// The maximum tabulated power
    rated_power: Power,
}

impl PowerCurve {
    /// Create a new [`PowerCurve`] from a table of entries.
    ///
    /// The entries are sorted by wind speed before being validated. A valid table:
    ///
    /// * has at least two entries
    /// * contains only finite values and no negative power
    /// * has no duplicate wind speeds
    /// * has non-decreasing power up to the rated (maximum) power
    /// * ends with a zero-power entry, i.e. an explicit cut-out
    pub fn new(points: Vec<(WindSpeed, Power)>) -> Result<Self> {
        ensure!(
            points.len() >= 2,
            "Power curve must have at least two entries"
        );
        ensure!(
            points
                .iter()
                .all(|(speed, power)| speed.is_finite() && power.is_finite()),
            "Power curve contains non-finite values"
        );
        ensure!(
            points.iter().all(|(_, power)| *power >= Power(0.0)),
            "Power curve contains negative power values"
        );

        let points = points
            .into_iter()
            .sorted_by(|(s1, _), (s2, _)| s1.0.total_cmp(&s2.0))
            .collect_vec();
        if let Some(((speed, _), _)) = points.iter().tuple_windows().find(|(a, b)| a.0 >= b.0) {
            bail!("Power curve contains duplicate wind speed {speed} m/s");
        }

        let rated_power = points
            .iter()
            .map(|(_, power)| *power)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .context("Power curve is empty")?;
        ensure!(
            rated_power > Power(0.0),
            "Power curve must have a positive rated power"
        );

        let rated_idx = points
            .iter()
            .position(|(_, power)| *power == rated_power)
            .context("Power curve has no rated power entry")?;
        if let Some(((speed, _), _)) = points[..=rated_idx]
            .iter()
            .tuple_windows()
            .find(|((_, p1), (_, p2))| p2 < p1)
        {
            bail!(
                "Power curve must be non-decreasing up to rated power, but decreases after \
                {speed} m/s"
            );
        }

        let (_, last_power) = points[points.len() - 1];
        ensure!(
            last_power == Power(0.0),
            "The last entry of the power curve must have zero power (cut-out)"
        );

        let (first_speed, first_power) = points[0];
        if first_power > Power(0.0) {
            warn!(
                "Power curve has non-zero power ({first_power} kW) at its lowest wind speed \
                ({first_speed} m/s)"
            );
        }

        Ok(Self {
            points,
            rated_power,
        })
    }

    /// Create a power curve for a generic turbine.
    ///
    /// Power is zero up to `cut_in`, follows a cubic ramp up to `rated_power` at `rated_speed`, stays
    /// at rated power up to `cut_out` and then drops to zero.
    pub fn generic(
        cut_in: WindSpeed,
        rated_speed: WindSpeed,
        cut_out: WindSpeed,
        rated_power: Power,
    ) -> Result<Self> {
        ensure!(
            cut_in >= WindSpeed(0.0) && cut_in < rated_speed && rated_speed < cut_out,
            "Generic turbine speeds must satisfy 0 <= cut-in < rated < cut-out"
        );
        ensure!(
            rated_power.is_finite() && rated_power > Power(0.0),
            "Generic turbine rated power must be positive"
        );

        let mut points = Vec::new();
        if cut_in > WindSpeed(0.0) {
            points.push((WindSpeed(0.0), Power(0.0)));
        }
        points.push((cut_in, Power(0.0)));
        let ramp = (1u32..)
            .map(|step| cut_in + WindSpeed(GENERIC_RAMP_STEP.0 * f64::from(step)))
            .take_while(|speed| *speed < rated_speed)
            .map(|speed| {
                let fraction = (speed - cut_in) / (rated_speed - cut_in);
                (speed, fraction.powi(3) * rated_power)
            });
        points.extend(ramp);
        points.push((rated_speed, rated_power));
        points.push((cut_out, rated_power));
        points.push((cut_out + GENERIC_CUT_OUT_OFFSET, Power(0.0)));

        Self::new(points)
    }

    /// The table entries, sorted by wind speed
    pub fn points(&self) -> &[(WindSpeed, Power)] {
        &self.points
    }

    /// The maximum power output of the turbine
    pub fn rated_power(&self) -> Power {
        self.rated_power
    }

    /// Get the power output at the given wind speed.
    ///
    /// Missing (NaN) speeds give NaN. Speeds below the lowest or above the highest tabulated speed
    /// give zero.
    pub fn power_at(&self, speed: WindSpeed) -> Power {
        if speed.is_nan() {
            return Power(f64::NAN);
        }

        let (min_speed, _) = self.points[0];
        let (max_speed, _) = self.points[self.points.len() - 1];
        if speed < min_speed || speed > max_speed {
            return Power(0.0);
        }

        // Index of the first entry at or above `speed`
        let idx = self.points.partition_point(|(s, _)| *s < speed);
        let (s1, p1) = self.points[idx];
        if s1 == speed || idx == 0 {
            return p1;
        }

        let (s0, p0) = self.points[idx - 1];
        let fraction = (speed - s0) / (s1 - s0);
        p0 + fraction * (p1 - p0)
    }

    /// Get the capacity factor (power as a fraction of rated power) at the given wind speed
    pub fn capacity_factor_at(&self, speed: WindSpeed) -> Dimensionless {
        self.power_at(speed) / self.rated_power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, power_curve, power_curve_points};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn to_points(table: &[(f64, f64)]) -> Vec<(WindSpeed, Power)> {
        table
            .iter()
            .map(|&(speed, power)| (WindSpeed(speed), Power(power)))
            .collect()
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(3.0, 0.0)]
    #[case(4.0, 100.0)]
    #[case(9.0, 900.0)]
    #[case(12.0, 2000.0)]
    #[case(22.5, 1000.0)]
    #[case(25.0, 0.0)]
    #[case(-1.0, 0.0)] // below table
    #[case(35.0, 0.0)] // above table
    fn test_power_at(power_curve: PowerCurve, #[case] speed: f64, #[case] expected: f64) {
        assert_approx_eq!(Power, power_curve.power_at(WindSpeed(speed)), Power(expected));
    }

    #[rstest]
    fn test_power_at_tabulated_values(
        power_curve: PowerCurve,
        power_curve_points: Vec<(WindSpeed, Power)>,
    ) {
        for (speed, power) in power_curve_points {
            assert_eq!(power_curve.power_at(speed), power);
        }
    }

    #[rstest]
    fn test_power_at_missing(power_curve: PowerCurve) {
        assert!(power_curve.power_at(WindSpeed(f64::NAN)).is_nan());
    }

    #[rstest]
    fn test_power_at_bounds_and_monotonic(power_curve: PowerCurve) {
        let rated = power_curve.rated_power();
        let mut previous = Power(0.0);
        for step in 0..=240 {
            let speed = WindSpeed(f64::from(step) * 0.05);
            let power = power_curve.power_at(speed);
            assert!(power >= Power(0.0) && power <= rated);
            assert!(power >= previous, "power decreased at {speed} m/s");
            previous = power;
        }
    }

    #[rstest]
    fn test_capacity_factor_at(power_curve: PowerCurve) {
        assert_approx_eq!(
            Dimensionless,
            power_curve.capacity_factor_at(WindSpeed(9.0)),
            Dimensionless(0.45)
        );
        assert_eq!(power_curve.rated_power(), Power(2000.0));
    }

    #[test]
    fn test_generic_speed_sequence() {
        let curve = PowerCurve::generic(
            WindSpeed(3.0),
            WindSpeed(12.0),
            WindSpeed(25.0),
            Power(2000.0),
        )
        .unwrap();
        let power: Vec<_> = [2.0, 5.0, 10.0, 14.0, 16.0, 26.0]
            .into_iter()
            .map(|speed| curve.power_at(WindSpeed(speed)))
            .collect();
        assert_eq!(power[0], Power(0.0));
        assert!(power[1] > Power(0.0) && power[1] < Power(2000.0));
        assert!(power[2] > power[1] && power[2] <= Power(2000.0));
        assert_eq!(power[3], Power(2000.0));
        assert_eq!(power[4], Power(2000.0));
        assert_eq!(power[5], Power(0.0));
    }

    #[test]
    fn test_new_sorts_entries() {
        let curve = PowerCurve::new(to_points(&[(10.0, 100.0), (0.0, 0.0), (20.0, 0.0)])).unwrap();
        assert_eq!(curve.points()[0], (WindSpeed(0.0), Power(0.0)));
        assert_eq!(curve.points()[2], (WindSpeed(20.0), Power(0.0)));
    }

    #[rstest]
    #[case(&[(0.0, 0.0)], "Power curve must have at least two entries")]
    #[case(&[(0.0, 0.0), (5.0, -1.0), (6.0, 0.0)], "Power curve contains negative power values")]
    #[case(&[(0.0, 0.0), (f64::NAN, 1.0), (6.0, 0.0)], "Power curve contains non-finite values")]
    #[case(
        &[(0.0, 0.0), (5.0, 1.0), (5.0, 2.0), (6.0, 0.0)],
        "Power curve contains duplicate wind speed 5 m/s"
    )]
    #[case(&[(0.0, 0.0), (5.0, 0.0)], "Power curve must have a positive rated power")]
    #[case(
        &[(0.0, 0.0), (5.0, 10.0), (6.0, 5.0), (7.0, 20.0), (8.0, 0.0)],
        "Power curve must be non-decreasing up to rated power, but decreases after 5 m/s"
    )]
    #[case(
        &[(0.0, 0.0), (5.0, 10.0)],
        "The last entry of the power curve must have zero power (cut-out)"
    )]
    fn test_new_invalid(#[case] table: &[(f64, f64)], #[case] msg: &str) {
        assert_error!(PowerCurve::new(to_points(table)), msg);
    }

    #[test]
    fn test_generic() {
        let curve = PowerCurve::generic(
            WindSpeed(3.0),
            WindSpeed(12.0),
            WindSpeed(25.0),
            Power(2000.0),
        )
        .unwrap();
        assert_eq!(curve.rated_power(), Power(2000.0));
        assert_eq!(curve.power_at(WindSpeed(2.0)), Power(0.0));
        assert_eq!(curve.power_at(WindSpeed(12.0)), Power(2000.0));
        assert_eq!(curve.power_at(WindSpeed(25.0)), Power(2000.0));
        assert_eq!(curve.power_at(WindSpeed(26.0)), Power(0.0));

        // Sampled point on the cubic ramp
        assert_approx_eq!(
            Power,
            curve.power_at(WindSpeed(7.5)),
            Power(2000.0 * 0.5f64.powi(3))
        );
    }

    #[rstest]
    #[case(12.0, 12.0, 25.0, 2000.0)]
    #[case(3.0, 12.0, 10.0, 2000.0)]
    #[case(3.0, 12.0, 25.0, 0.0)]
    #[case(-1.0, 12.0, 25.0, 2000.0)]
    fn test_generic_invalid(
        #[case] cut_in: f64,
        #[case] rated_speed: f64,
        #[case] cut_out: f64,
        #[case] rated_power: f64,
    ) {
        assert!(
            PowerCurve::generic(
                WindSpeed(cut_in),
                WindSpeed(rated_speed),
                WindSpeed(cut_out),
                Power(rated_power)
            )
            .is_err()
        );
    }
}
