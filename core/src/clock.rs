//! Wall-clock sources.
//!
//! RULE: evaluate `now()` once per logical tick and pass the result down.
//! Two generation checks in the same tick must never see different instants.

use crate::types::{utc_now, Timestamp};
use chrono::TimeDelta;
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// The real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        utc_now()
    }
}

/// A clock that only moves when told to. Used by tests and headless runs.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { current: Cell::new(start) }
    }

    /// Move forward by `delta`. Panics on a negative delta. Callers
    /// wanting a regression must use `set` explicitly.
    pub fn advance(&self, delta: TimeDelta) -> Timestamp {
        assert!(delta >= TimeDelta::zero(), "advance() called with negative delta {delta}");
        let next = self.current.get() + delta;
        self.current.set(next);
        next
    }

    pub fn set(&self, at: Timestamp) {
        self.current.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.current.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
