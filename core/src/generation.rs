//! Generation engine: turns elapsed wall-clock time into throwables.
//!
//! CHECK ORDER (per valuable, all against one `now`):
//!   1. elapsed = now - last_generate_check_time   (negative → ClockRegression)
//!   2. window  = min(elapsed, limit - generate_time_utilized)
//!   3. items   = whole increments over (utilized + window) minus those
//!                over utilized; the remainder stays as carried fraction
//!   4. last_generate_check_time = now
//!   5. items > 0 → throwables into the hand, one event, observers notified
//!
//! RULES:
//!   - Time outside the window is discarded, never carried forward.
//!   - A zero rate generates nothing and consumes no window.
//!   - Batch checks validate every valuable before mutating any of them.

use crate::{
    catalog::{ValuableCatalog, ValuableType},
    error::{FountainError, FountainResult},
    event::{GenerationEvent, GenerationObserver},
    hand::{Hand, Throwable},
    player_valuable::PlayerValuable,
    save_data::SaveData,
    types::Timestamp,
};
use chrono::TimeDelta;

/// Per-call overrides for `check_generate`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerateOptions {
    /// Overrides the hand's generate time limit.
    pub limit:       Option<TimeDelta>,
    /// Overrides the catalog face value of generated items.
    pub throw_value: Option<f64>,
}

pub struct GenerationEngine {
    catalog:   ValuableCatalog,
    observers: Vec<Box<dyn GenerationObserver>>,
}

impl GenerationEngine {
    pub fn new(catalog: ValuableCatalog) -> Self {
        Self { catalog, observers: Vec::new() }
    }

    pub fn catalog(&self) -> &ValuableCatalog {
        &self.catalog
    }

    /// Register an observer. It is notified of every non-zero generation
    /// made through this engine until the engine is dropped.
    pub fn subscribe(&mut self, observer: Box<dyn GenerationObserver>) {
        self.observers.push(observer);
    }

    /// Generate items for one valuable. Returns how many were made.
    pub fn check_generate(
        &mut self,
        valuable: &mut PlayerValuable,
        hand: &mut Hand,
        now: Timestamp,
        options: GenerateOptions,
    ) -> FountainResult<u64> {
        let throw_value = self.prepare(valuable, now, options)?;
        let event = self.apply(valuable, hand, now, options, throw_value)?;
        Ok(event.map_or(0, |e| e.amount))
    }

    /// Generate for every valuable in the save against the same `now`.
    /// Returns one event per valuable that produced anything.
    pub fn check_generate_all(
        &mut self,
        save: &mut SaveData,
        now: Timestamp,
    ) -> FountainResult<Vec<GenerationEvent>> {
        let options = GenerateOptions::default();

        let mut throw_values = Vec::with_capacity(save.player_valuables.len());
        for valuable in save.player_valuables.iter() {
            throw_values.push(self.prepare(valuable, now, options)?);
        }

        // Explicit loop: every valuable's side effects must run exactly once.
        let mut events = Vec::new();
        for (valuable, throw_value) in save.player_valuables.iter_mut().zip(throw_values) {
            if let Some(event) = self.apply(valuable, &mut save.hand, now, options, throw_value)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Validation that must pass before anything is mutated.
    fn prepare(
        &self,
        valuable: &PlayerValuable,
        now: Timestamp,
        options: GenerateOptions,
    ) -> FountainResult<f64> {
        let elapsed = now - valuable.last_generate_check_time();
        if elapsed < TimeDelta::zero() {
            return Err(FountainError::ClockRegression {
                context: format!(
                    "{} last checked at {}, now is {now}",
                    valuable.valuable_type,
                    valuable.last_generate_check_time()
                ),
                elapsed,
            });
        }
        // Surfaces a bad rate or utilized time before anything changes.
        valuable.session_incrementer()?;
        if let Some(limit) = options.limit {
            if limit < TimeDelta::zero() {
                return Err(FountainError::InvalidArgument(format!(
                    "generate limit must not be negative, got {limit}"
                )));
            }
        }
        match options.throw_value {
            Some(value) => Ok(value),
            None => Ok(self.catalog.face_value(valuable.valuable_type)? as f64),
        }
    }

    fn apply(
        &mut self,
        valuable: &mut PlayerValuable,
        hand: &mut Hand,
        now: Timestamp,
        options: GenerateOptions,
        throw_value: f64,
    ) -> FountainResult<Option<GenerationEvent>> {
        let elapsed = now - valuable.last_generate_check_time();
        valuable.set_last_generate_check_time(now);

        if valuable.rate() == 0.0 {
            return Ok(None);
        }

        let limit = options.limit.unwrap_or(hand.generate_time_limit);
        let remaining = (limit - valuable.generate_time_utilized()).max(TimeDelta::zero());
        let window = elapsed.min(remaining);
        if window < elapsed {
            log::debug!(
                "generation: {} discarded {} of backlog beyond the {} limit",
                valuable.valuable_type,
                elapsed - window,
                limit
            );
        }

        let produced_before = valuable.session_incrementer()?.full_increments();
        valuable.consume_generate_time(window);
        let mut session = valuable.session_incrementer()?;
        let amount = session.reduce().saturating_sub(produced_before);

        log::debug!(
            "generation: {} rate={} window={} items={amount} carried={:.6}",
            valuable.valuable_type,
            valuable.rate(),
            window,
            session.exact_increments()
        );

        if amount == 0 {
            return Ok(None);
        }

        for _ in 0..amount {
            hand.add_to_hand(Throwable::new(valuable.valuable_type, throw_value), now);
        }

        let event = GenerationEvent {
            valuable_type: valuable.valuable_type,
            amount,
            generated_at: now,
        };
        for observer in &mut self.observers {
            observer.on_generated(&event);
        }
        Ok(Some(event))
    }
}

/// Convenience for callers that only care about one type.
pub fn generated_of(events: &[GenerationEvent], valuable_type: ValuableType) -> u64 {
    events
        .iter()
        .filter(|e| e.valuable_type == valuable_type)
        .map(|e| e.amount)
        .sum()
}
