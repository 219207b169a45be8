//! The hand: items held but not yet redeemed.
//!
//! The hand never touches karma itself. Crediting happens on the owning
//! `SaveData`, which takes items out through `take_all` / `remove`.

use crate::{
    catalog::ValuableType,
    types::{duration_nanos, Timestamp},
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One held item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Throwable {
    pub id:            Uuid,
    pub valuable_type: ValuableType,
    /// Karma yielded on redemption. Starts at the catalog face value but is
    /// stored separately so modifiers can change it.
    pub throw_value:   f64,
}

impl Throwable {
    pub fn new(valuable_type: ValuableType, throw_value: f64) -> Self {
        Self { id: Uuid::new_v4(), valuable_type, throw_value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    throwables:              Vec<Throwable>,
    pub last_throw_time:     Timestamp,
    pub last_grab_time:      Timestamp,
    /// Cap on generation time between throws.
    #[serde(with = "duration_nanos")]
    pub generate_time_limit: TimeDelta,
}

impl Hand {
    pub fn new(now: Timestamp, generate_time_limit: TimeDelta) -> Self {
        Self {
            throwables: Vec::new(),
            last_throw_time: now,
            last_grab_time: now,
            generate_time_limit,
        }
    }

    pub fn add_to_hand(&mut self, throwable: Throwable, now: Timestamp) {
        self.throwables.push(throwable);
        self.last_grab_time = now;
    }

    /// Remove one specific item.
    pub fn remove(&mut self, id: Uuid) -> Option<Throwable> {
        let index = self.throwables.iter().position(|t| t.id == id)?;
        Some(self.throwables.remove(index))
    }

    /// Empty the hand, returning everything that was in it.
    pub fn take_all(&mut self) -> Vec<Throwable> {
        std::mem::take(&mut self.throwables)
    }

    pub fn throwables(&self) -> &[Throwable] {
        &self.throwables
    }

    pub fn get(&self, id: Uuid) -> Option<&Throwable> {
        self.throwables.iter().find(|t| t.id == id)
    }

    pub fn karma_in_hand(&self) -> f64 {
        self.throwables.iter().map(|t| t.throw_value).sum()
    }

    pub fn grouped_throwables(&self) -> BTreeMap<ValuableType, Vec<&Throwable>> {
        let mut groups: BTreeMap<ValuableType, Vec<&Throwable>> = BTreeMap::new();
        for throwable in &self.throwables {
            groups.entry(throwable.valuable_type).or_default().push(throwable);
        }
        groups
    }

    pub fn valuable_type_counts(&self) -> BTreeMap<ValuableType, usize> {
        let mut counts = BTreeMap::new();
        for throwable in &self.throwables {
            *counts.entry(throwable.valuable_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.throwables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.throwables.is_empty()
    }
}
