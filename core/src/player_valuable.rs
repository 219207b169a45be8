//! Per-save generation state, one entry per valuable type.

use crate::{
    catalog::{ValuableCatalog, ValuableType},
    error::{FountainError, FountainResult},
    incrementer::Incrementer,
    types::{duration_nanos, Timestamp},
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerValuable {
    pub valuable_type:          ValuableType,
    rate:                       f64,
    last_generate_check_time:   Timestamp,
    /// Generation time consumed since the last throw. Never exceeds the
    /// hand's generate time limit.
    #[serde(with = "duration_nanos")]
    generate_time_utilized:     TimeDelta,
}

impl PlayerValuable {
    pub fn new(valuable_type: ValuableType, rate: f64, now: Timestamp) -> FountainResult<Self> {
        let mut valuable = Self {
            valuable_type,
            rate: 0.0,
            last_generate_check_time: now,
            generate_time_utilized: TimeDelta::zero(),
        };
        valuable.set_rate(rate)?;
        Ok(valuable)
    }

    /// Items per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) -> FountainResult<()> {
        check_rate(self.valuable_type, rate)?;
        self.rate = rate;
        Ok(())
    }

    /// Recheck state that arrived through deserialization rather than
    /// through the setters.
    pub(crate) fn validate(&self) -> FountainResult<()> {
        check_rate(self.valuable_type, self.rate)?;
        if self.generate_time_utilized < TimeDelta::zero() {
            return Err(FountainError::InvalidArgument(format!(
                "generate time utilized for {} is negative: {}",
                self.valuable_type, self.generate_time_utilized
            )));
        }
        Ok(())
    }

    /// Time between two generated items, `None` when the rate is zero.
    pub fn generate_interval(&self) -> Option<TimeDelta> {
        self.session_incrementer().ok().and_then(|inc| inc.period())
    }

    pub fn last_generate_check_time(&self) -> Timestamp {
        self.last_generate_check_time
    }

    /// Move the generation checkpoint. Intended for the generation engine
    /// and for tests that need to simulate time away.
    pub fn set_last_generate_check_time(&mut self, at: Timestamp) {
        self.last_generate_check_time = at;
    }

    pub fn generate_time_utilized(&self) -> TimeDelta {
        self.generate_time_utilized
    }

    /// Fractional progress toward the next item, carried between checks.
    pub fn pending_increments(&self) -> f64 {
        self.session_incrementer()
            .map(|inc| inc.partial_increments())
            .unwrap_or(0.0)
    }

    /// An accumulator fed with all generation time used since the last
    /// throw. Rebuilding it from the persisted duration, rather than
    /// carrying a float, keeps successive checks exactly telescoping.
    pub fn session_incrementer(&self) -> FountainResult<Incrementer> {
        let mut inc = Incrementer::new(self.rate)?;
        inc.add_time(self.generate_time_utilized)?;
        Ok(inc)
    }

    pub(crate) fn consume_generate_time(&mut self, used: TimeDelta) {
        self.generate_time_utilized += used;
    }

    pub(crate) fn reset_generate_time_utilized(&mut self) {
        self.generate_time_utilized = TimeDelta::zero();
    }
}

/// Keyed collection with exactly one `PlayerValuable` per type.
/// Persisted as a list; duplicates are rejected on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlayerValuable>", into = "Vec<PlayerValuable>")]
pub struct PlayerValuables {
    entries: BTreeMap<ValuableType, PlayerValuable>,
}

impl PlayerValuables {
    /// One entry per catalog type, with rates from `starting_rate`.
    pub fn for_catalog(
        catalog: &ValuableCatalog,
        now: Timestamp,
        starting_rate: impl Fn(ValuableType) -> f64,
    ) -> FountainResult<Self> {
        let mut valuables = Self::default();
        for valuable_type in catalog.all_types() {
            valuables.insert(PlayerValuable::new(valuable_type, starting_rate(valuable_type), now)?)?;
        }
        Ok(valuables)
    }

    pub fn insert(&mut self, valuable: PlayerValuable) -> FountainResult<()> {
        let valuable_type = valuable.valuable_type;
        if self.entries.contains_key(&valuable_type) {
            return Err(FountainError::DuplicateValuable { valuable_type });
        }
        self.entries.insert(valuable_type, valuable);
        Ok(())
    }

    /// Every catalog type present, nothing the catalog doesn't know, and
    /// every entry's rate and utilized time in range.
    pub fn validate_against(&self, catalog: &ValuableCatalog) -> FountainResult<()> {
        for valuable_type in catalog.all_types() {
            if !self.entries.contains_key(&valuable_type) {
                return Err(FountainError::MissingValuable { valuable_type });
            }
        }
        for (valuable_type, valuable) in &self.entries {
            catalog.lookup(*valuable_type)?;
            valuable.validate()?;
        }
        Ok(())
    }

    pub fn get(&self, valuable_type: ValuableType) -> FountainResult<&PlayerValuable> {
        self.entries
            .get(&valuable_type)
            .ok_or(FountainError::MissingValuable { valuable_type })
    }

    pub fn get_mut(&mut self, valuable_type: ValuableType) -> FountainResult<&mut PlayerValuable> {
        self.entries
            .get_mut(&valuable_type)
            .ok_or(FountainError::MissingValuable { valuable_type })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerValuable> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerValuable> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_rate(valuable_type: ValuableType, rate: f64) -> FountainResult<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(FountainError::InvalidArgument(format!(
            "rate for {valuable_type} must be finite and >= 0, got {rate}"
        )));
    }
    Ok(())
}

impl TryFrom<Vec<PlayerValuable>> for PlayerValuables {
    type Error = FountainError;

    fn try_from(list: Vec<PlayerValuable>) -> Result<Self, Self::Error> {
        let mut valuables = Self::default();
        for valuable in list {
            valuables.insert(valuable)?;
        }
        Ok(valuables)
    }
}

impl From<PlayerValuables> for Vec<PlayerValuable> {
    fn from(valuables: PlayerValuables) -> Self {
        valuables.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn rejects_duplicate_types() {
        let now = Utc::now();
        let mut valuables = PlayerValuables::default();
        valuables.insert(PlayerValuable::new(ValuableType::Coin, 1.0, now).unwrap()).unwrap();
        let err = valuables
            .insert(PlayerValuable::new(ValuableType::Coin, 2.0, now).unwrap())
            .unwrap_err();
        assert!(matches!(err, FountainError::DuplicateValuable { valuable_type: ValuableType::Coin }));
        assert_eq!(valuables.get(ValuableType::Coin).unwrap().rate(), 1.0);
    }

    #[test]
    fn duplicate_entries_fail_to_deserialize() {
        let now = Utc::now();
        let coin = PlayerValuable::new(ValuableType::Coin, 1.0, now).unwrap();
        let json = serde_json::to_string(&vec![coin.clone(), coin]).unwrap();
        assert!(serde_json::from_str::<PlayerValuables>(&json).is_err());
    }

    #[test]
    fn validation_finds_missing_types() {
        let catalog = ValuableCatalog::standard();
        let now = Utc::now();
        let mut valuables = PlayerValuables::default();
        valuables.insert(PlayerValuable::new(ValuableType::Coin, 1.0, now).unwrap()).unwrap();
        let err = valuables.validate_against(&catalog).unwrap_err();
        assert!(matches!(err, FountainError::MissingValuable { valuable_type: ValuableType::Gem }));

        let full = PlayerValuables::for_catalog(&catalog, now, |_| 0.0).unwrap();
        full.validate_against(&catalog).unwrap();
        assert_eq!(full.len(), catalog.len());
    }

    #[test]
    fn validation_rechecks_deserialized_state() {
        let catalog = ValuableCatalog::standard();
        let mut valuables = PlayerValuables::for_catalog(&catalog, Utc::now(), |_| 1.0).unwrap();

        valuables.get_mut(ValuableType::Gem).unwrap().rate = -1.0;
        let err = valuables.validate_against(&catalog).unwrap_err();
        assert!(matches!(err, FountainError::InvalidArgument(_)), "got {err:?}");

        let gem = valuables.get_mut(ValuableType::Gem).unwrap();
        gem.rate = 1.0;
        gem.generate_time_utilized = TimeDelta::seconds(-3);
        assert!(valuables.validate_against(&catalog).is_err());
    }

    #[test]
    fn rejects_bad_rates() {
        let now = Utc::now();
        assert!(PlayerValuable::new(ValuableType::Gem, -1.0, now).is_err());
        assert!(PlayerValuable::new(ValuableType::Gem, f64::INFINITY, now).is_err());
        assert!(PlayerValuable::new(ValuableType::Gem, f64::NAN, now).is_err());
    }

    #[test]
    fn pending_fraction_follows_utilized_time() {
        let mut coin = PlayerValuable::new(ValuableType::Coin, 2.0, Utc::now()).unwrap();
        coin.consume_generate_time(TimeDelta::milliseconds(1_250));
        assert!((coin.pending_increments() - 0.5).abs() < 1e-9);
        assert_eq!(coin.generate_interval(), Some(TimeDelta::milliseconds(500)));
    }
}
