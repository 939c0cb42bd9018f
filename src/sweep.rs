//! Constant current sweep: step the CI set-point, measure the voltage the
//! device under test settles to after each step.

use std::time::Duration;

use tracing::{info, warn};

use crate::{Error, Result, commands::Quantity, mp71077x::Mp71077x};

/// Headroom added above the largest set-point when raising the current limit.
const LIMIT_HEADROOM: f64 = 0.1;

/// Longest sweep accepted.
pub const MAX_SET_POINTS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPlan {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub delay: Duration,
}

impl SweepPlan {
    /// Set-points from `start` towards `end`, including `end` when it lies
    /// within 1 % of a step of the last point. Descending when `end < start`.
    ///
    /// Fails for non-finite bounds or steps and for plans longer than
    /// [`MAX_SET_POINTS`].
    pub fn set_points(&self) -> Result<Vec<f64>> {
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(Error::Config(format!("Sweep plan is not finite: {self:?}")));
        }

        let step = if self.end >= self.start {
            self.step.abs()
        } else {
            -self.step.abs()
        };
        if step == 0.0 {
            return Ok(vec![self.start]);
        }

        let steps = ((self.end - self.start) / step + 0.01).floor();
        if steps >= MAX_SET_POINTS as f64 {
            return Err(Error::Config(format!(
                "Sweep from {} to {} by {} exceeds {MAX_SET_POINTS} points",
                self.start, self.end, self.step
            )));
        }

        Ok((0..=steps as usize)
            .map(|index| self.start + index as f64 * step)
            .collect())
    }

    pub fn current_limit(&self) -> f64 {
        self.start.max(self.end) + LIMIT_HEADROOM
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub current: f64,
    pub voltage: f64,
}

impl SweepPoint {
    pub fn power(&self) -> f64 {
        self.current * self.voltage
    }

    /// Zero when no current flows.
    pub fn resistance(&self) -> f64 {
        if self.current != 0.0 {
            self.voltage / self.current
        } else {
            0.0
        }
    }
}

/// Runs `plan` and leaves the load with zero current and input off.
///
/// An invalid plan is rejected before anything is sent. On failure the load
/// is shut down with [`safe_shutdown`] before the original error is returned.
pub async fn run_sweep(load: &mut Mp71077x, plan: &SweepPlan) -> Result<Vec<SweepPoint>> {
    let set_points = plan.set_points()?;
    match sweep(load, plan, set_points).await {
        Ok(points) => {
            safe_shutdown(load).await?;
            Ok(points)
        }
        Err(e) => {
            warn!("Sweep failed: {e}");
            if let Err(shutdown) = safe_shutdown(load).await {
                warn!("Failed to turn off load properly: {shutdown}");
            }
            Err(e)
        }
    }
}

async fn sweep(
    load: &mut Mp71077x,
    plan: &SweepPlan,
    set_points: Vec<f64>,
) -> Result<Vec<SweepPoint>> {
    load.current()
        .set_upper_limit(plan.current_limit(), false)
        .await?;
    load.current().set_value(plan.start, true).await?;
    load.turn_input_on(true).await?;
    info!(
        "Load input turned ON, sweeping from {}A to {}A",
        plan.start, plan.end
    );

    let mut points = Vec::new();
    for current in set_points {
        load.current().set_value(current, true).await?;
        tokio::time::sleep(plan.delay).await;
        let voltage = load.measure(Quantity::Voltage).await?;

        let point = SweepPoint { current, voltage };
        info!(
            current,
            voltage,
            power = point.power(),
            resistance = point.resistance(),
            "Sweep point"
        );
        points.push(point);
    }

    Ok(points)
}

/// Sets the current back to zero and turns the input off, both verified.
/// The input is switched off even when zeroing the current fails; the first
/// error is returned.
pub async fn safe_shutdown(load: &mut Mp71077x) -> Result<()> {
    let current = load.current().set_value(0.0, true).await;
    let input = load.turn_input_off(true).await;
    current.and(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(start: f64, end: f64, step: f64) -> SweepPlan {
        SweepPlan {
            start,
            end,
            step,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_ascending_includes_end() {
        let points = plan(0.0, 1.0, 0.25).set_points().unwrap();
        assert_eq!(points, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_accumulated_error_keeps_end() {
        let points = plan(0.0, 1.0, 0.05).set_points().unwrap();
        assert_eq!(points.len(), 21);
        assert!((points[20] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_descending() {
        let points = plan(1.0, 0.0, 0.5).set_points().unwrap();
        assert_eq!(points, vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_zero_step() {
        assert_eq!(plan(0.3, 1.0, 0.0).set_points().unwrap(), vec![0.3]);
    }

    #[test]
    fn test_step_too_small_for_start() {
        // start + step == start in f64
        let result = plan(1.0e6, 2.0e6, 1.0e-12).set_points();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = plan(0.0, 1.0, 1.0e-9).set_points();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_non_finite_plan() {
        assert!(plan(f64::NAN, 1.0, 0.1).set_points().is_err());
        assert!(plan(0.0, f64::INFINITY, 0.1).set_points().is_err());
        assert!(plan(0.0, 1.0, f64::NAN).set_points().is_err());
    }

    #[test]
    fn test_current_limit() {
        assert!((plan(0.0, 1.0, 0.05).current_limit() - 1.1).abs() < 1e-9);
        assert!((plan(2.0, 1.0, 0.05).current_limit() - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_derived_values() {
        let point = SweepPoint {
            current: 2.0,
            voltage: 12.0,
        };
        assert_eq!(point.power(), 24.0);
        assert_eq!(point.resistance(), 6.0);

        let open = SweepPoint {
            current: 0.0,
            voltage: 12.0,
        };
        assert_eq!(open.resistance(), 0.0);
    }
}
