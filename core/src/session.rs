//! The save session: one explicit handle owning the active save.
//!
//! RULES:
//!   - There is no process-wide "current save". Whoever holds the
//!     session owns the save; everything goes through it.
//!   - Each operation reads the clock once and uses that instant for
//!     every valuable it touches.

use crate::{
    catalog::ValuableType,
    clock::Clock,
    duration::number_of_times_completed,
    error::FountainResult,
    event::GenerationEvent,
    generation::{GenerateOptions, GenerationEngine},
    save_data::{SaveData, ThrowOutcome},
    store::SaveStore,
    types::Timestamp,
};
use chrono::TimeDelta;
use std::path::PathBuf;
use uuid::Uuid;

pub struct SaveSession<C: Clock> {
    store:  SaveStore,
    engine: GenerationEngine,
    clock:  C,
    data:   SaveData,
}

impl<C: Clock> SaveSession<C> {
    /// Load `nickname`, creating it on first run.
    pub fn load_or_create(
        store: SaveStore,
        engine: GenerationEngine,
        clock: C,
        nickname: &str,
    ) -> FountainResult<Self> {
        let data = store.load(nickname, clock.now())?;
        Ok(Self { store, engine, clock, data })
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SaveData {
        &mut self.data
    }

    pub fn engine_mut(&mut self) -> &mut GenerationEngine {
        &mut self.engine
    }

    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Generate every valuable up to now.
    pub fn check_generate(&mut self) -> FountainResult<Vec<GenerationEvent>> {
        let now = self.clock.now();
        self.engine.check_generate_all(&mut self.data, now)
    }

    /// Generate a single valuable up to now, with overrides.
    pub fn check_generate_one(
        &mut self,
        valuable_type: ValuableType,
        options: GenerateOptions,
    ) -> FountainResult<u64> {
        let now = self.clock.now();
        let (valuable, hand) = self.data.valuable_and_hand_mut(valuable_type)?;
        self.engine.check_generate(valuable, hand, now, options)
    }

    pub fn grab(&mut self, valuable_type: ValuableType) -> FountainResult<Uuid> {
        let now = self.clock.now();
        self.data.grab(valuable_type, self.engine.catalog(), now)
    }

    pub fn throw(&mut self) -> ThrowOutcome {
        let now = self.clock.now();
        self.data.throw(now)
    }

    pub fn redeem_single(&mut self, id: Uuid) -> FountainResult<f64> {
        self.data.redeem_single(id)
    }

    /// Save, honouring the re-save delay.
    pub fn save(&mut self) -> FountainResult<PathBuf> {
        let now = self.clock.now();
        self.store.save(&mut self.data, now, true)
    }

    /// Save regardless of the re-save delay.
    pub fn save_now(&mut self) -> FountainResult<PathBuf> {
        let now = self.clock.now();
        self.store.save(&mut self.data, now, false)
    }

    /// Drop unsaved changes and reload the newest file.
    pub fn reload(&mut self) -> FountainResult<()> {
        let now = self.clock.now();
        self.data = self.store.reload(&self.data, now)?;
        Ok(())
    }

    pub fn into_data(self) -> SaveData {
        self.data
    }
}

/// Fixed-interval trigger for periodic saves, free of drift: the anchor
/// only ever moves by whole intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSchedule {
    interval: TimeDelta,
    anchor:   Timestamp,
}

impl AutosaveSchedule {
    /// Panics on a non-positive interval.
    pub fn new(interval: TimeDelta, anchor: Timestamp) -> Self {
        assert!(interval > TimeDelta::zero(), "autosave interval must be positive, got {interval}");
        Self { interval, anchor }
    }

    pub fn anchor(&self) -> Timestamp {
        self.anchor
    }

    /// How many intervals completed since the last due poll. Advances the
    /// anchor past them. Zero when `now` is not after the anchor.
    pub fn poll(&mut self, now: Timestamp) -> u64 {
        if now <= self.anchor {
            return 0;
        }
        let completions = number_of_times_completed(self.anchor, now, self.interval);
        self.anchor = completions.last_completion_time;
        completions.count
    }
}
