//! Rate-driven fractional accumulator.
//!
//! Accumulation (`add_increments`, `add_time`) and draining (`reduce`) are
//! separate so that irregular polling produces exactly the same cumulative
//! output as regular polling. `reduce` is the only way down.

use crate::{
    duration::{as_seconds_f64, from_seconds_f64},
    error::{FountainError, FountainResult},
};
use chrono::TimeDelta;

/// Relative distance from a whole number under which a time-derived amount
/// is taken to be that whole number.
const WHOLE_SNAP_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Incrementer {
    exact_increments: f64,
    /// Completions per second. Zero means never, infinity means instantly.
    hertz:            f64,
}

impl Incrementer {
    pub fn new(hertz: f64) -> FountainResult<Self> {
        let mut inc = Self::default();
        inc.set_hertz(hertz)?;
        Ok(inc)
    }

    pub fn hertz(&self) -> f64 {
        self.hertz
    }

    pub fn set_hertz(&mut self, hertz: f64) -> FountainResult<()> {
        if hertz.is_nan() || hertz < 0.0 {
            return Err(FountainError::InvalidArgument(format!(
                "hertz must be a non-negative number, got {hertz}"
            )));
        }
        self.hertz = hertz;
        Ok(())
    }

    /// `None` when the rate is zero.
    pub fn period(&self) -> Option<TimeDelta> {
        if self.hertz == 0.0 {
            None
        } else if self.hertz.is_infinite() {
            Some(TimeDelta::zero())
        } else {
            Some(from_seconds_f64(1.0 / self.hertz))
        }
    }

    pub fn set_period(&mut self, period: Option<TimeDelta>) -> FountainResult<()> {
        match period {
            None => self.hertz = 0.0,
            Some(p) if p < TimeDelta::zero() => {
                return Err(FountainError::InvalidArgument(format!(
                    "period must not be negative, got {p}"
                )));
            }
            Some(p) if p.is_zero() => self.hertz = f64::INFINITY,
            Some(p) => self.hertz = 1.0 / as_seconds_f64(p),
        }
        Ok(())
    }

    pub fn exact_increments(&self) -> f64 {
        self.exact_increments
    }

    pub fn add_increments(&mut self, amount: f64) -> FountainResult<()> {
        if amount.is_nan() || amount < 0.0 {
            return Err(FountainError::InvalidArgument(format!(
                "increment amount must be non-negative, got {amount}"
            )));
        }
        self.exact_increments += amount;
        Ok(())
    }

    /// Convert elapsed time into increments at the current rate.
    /// A negative `elapsed` is a clock fault, not bad input.
    ///
    /// Amounts within float noise of a whole number land on it, so 45 s at
    /// 1.4/s is 63 increments rather than 62.999...
    pub fn add_time(&mut self, elapsed: TimeDelta) -> FountainResult<()> {
        if elapsed < TimeDelta::zero() {
            return Err(FountainError::ClockRegression {
                context: "incrementer add_time".into(),
                elapsed,
            });
        }
        let amount = if elapsed.is_zero() || self.hertz == 0.0 {
            0.0
        } else if self.hertz.is_infinite() {
            f64::INFINITY
        } else {
            snap_to_whole(as_seconds_f64(elapsed) * self.hertz)
        };
        self.add_increments(amount)
    }

    /// Whole completions available. Saturates at `u64::MAX`.
    pub fn full_increments(&self) -> u64 {
        // `as` saturates, including for infinity.
        self.exact_increments.floor() as u64
    }

    pub fn partial_increments(&self) -> f64 {
        if self.exact_increments.is_finite() {
            self.exact_increments - self.exact_increments.floor()
        } else {
            0.0
        }
    }

    /// Drain the whole completions, keeping the fractional remainder.
    pub fn reduce(&mut self) -> u64 {
        let full = self.full_increments();
        self.exact_increments = self.partial_increments();
        full
    }
}

fn snap_to_whole(amount: f64) -> f64 {
    let nearest = amount.round();
    if (amount - nearest).abs() <= WHOLE_SNAP_EPSILON * nearest.max(1.0) {
        nearest
    } else {
        amount
    }
}
