//! The save aggregate: currency, hand and generation state for one nickname.

use crate::{
    catalog::{ValuableCatalog, ValuableType},
    config::GenerationConfig,
    error::{FountainError, FountainResult},
    hand::{Hand, Throwable},
    player_valuable::{PlayerValuable, PlayerValuables},
    types::{duration_nanos, Nickname, Timestamp},
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bumped whenever the persisted layout changes incompatibly.
pub const SAVE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub nickname:       Nickname,
    pub schema_version: u32,
    pub game_version:   String,
    /// Durable currency. Only throws and redemptions add to it.
    pub(crate) karma:            f64,
    pub(crate) hand:             Hand,
    pub(crate) player_valuables: PlayerValuables,
    #[serde(with = "duration_nanos")]
    pub(crate) out_of_game_time_since_last_throw: TimeDelta,
    pub created_at:            Timestamp,
    pub(crate) last_save_time: Timestamp,
    pub(crate) last_load_time: Timestamp,
}

/// What a throw moved out of the hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowOutcome {
    pub thrown:         Vec<Throwable>,
    pub karma_credited: f64,
}

impl SaveData {
    /// A blank save: empty hand, zero karma, one valuable per catalog type.
    pub fn new_blank(
        nickname: &str,
        catalog: &ValuableCatalog,
        generation: &GenerationConfig,
        now: Timestamp,
    ) -> FountainResult<Self> {
        Ok(Self {
            nickname: nickname.to_string(),
            schema_version: SAVE_SCHEMA_VERSION,
            game_version: env!("CARGO_PKG_VERSION").to_string(),
            karma: 0.0,
            hand: Hand::new(now, generation.generate_time_limit()),
            player_valuables: PlayerValuables::for_catalog(catalog, now, |t| generation.starting_rate(t))?,
            out_of_game_time_since_last_throw: TimeDelta::zero(),
            created_at: now,
            last_save_time: now,
            last_load_time: now,
        })
    }

    pub fn karma(&self) -> f64 {
        self.karma
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }

    pub fn player_valuables(&self) -> &PlayerValuables {
        &self.player_valuables
    }

    pub fn player_valuable(&self, valuable_type: ValuableType) -> FountainResult<&PlayerValuable> {
        self.player_valuables.get(valuable_type)
    }

    pub fn player_valuable_mut(&mut self, valuable_type: ValuableType) -> FountainResult<&mut PlayerValuable> {
        self.player_valuables.get_mut(valuable_type)
    }

    /// Split borrow for generating a single valuable into the hand.
    pub fn valuable_and_hand_mut(
        &mut self,
        valuable_type: ValuableType,
    ) -> FountainResult<(&mut PlayerValuable, &mut Hand)> {
        let valuable = self.player_valuables.get_mut(valuable_type)?;
        Ok((valuable, &mut self.hand))
    }

    pub fn out_of_game_time_since_last_throw(&self) -> TimeDelta {
        self.out_of_game_time_since_last_throw
    }

    pub fn last_save_time(&self) -> Timestamp {
        self.last_save_time
    }

    pub fn last_load_time(&self) -> Timestamp {
        self.last_load_time
    }

    /// Player action: take one item of `valuable_type` at face value.
    pub fn grab(
        &mut self,
        valuable_type: ValuableType,
        catalog: &ValuableCatalog,
        now: Timestamp,
    ) -> FountainResult<Uuid> {
        let value = catalog.face_value(valuable_type)? as f64;
        let throwable = Throwable::new(valuable_type, value);
        let id = throwable.id;
        self.hand.add_to_hand(throwable, now);
        Ok(id)
    }

    /// Redeem the whole hand. Safe on an empty hand: only the timestamp
    /// and the per-throw counters change.
    pub fn throw(&mut self, now: Timestamp) -> ThrowOutcome {
        self.hand.last_throw_time = now;
        let thrown = self.hand.take_all();
        let karma_credited: f64 = thrown.iter().map(|t| t.throw_value).sum();
        self.karma += karma_credited;

        self.out_of_game_time_since_last_throw = TimeDelta::zero();
        for valuable in self.player_valuables.iter_mut() {
            valuable.reset_generate_time_utilized();
        }

        log::debug!(
            "throw: '{}' threw {} items for {karma_credited} karma (total {})",
            self.nickname,
            thrown.len(),
            self.karma
        );
        ThrowOutcome { thrown, karma_credited }
    }

    /// Redeem one specific item. An absent id is an upstream logic bug.
    pub fn redeem_single(&mut self, id: Uuid) -> FountainResult<f64> {
        let throwable = self
            .hand
            .remove(id)
            .ok_or(FountainError::ThrowableNotInHand { id })?;
        self.karma += throwable.throw_value;
        Ok(throwable.throw_value)
    }

    /// Check a freshly deserialized save against the running catalog.
    pub(crate) fn validate(&self, catalog: &ValuableCatalog) -> FountainResult<()> {
        if self.schema_version > SAVE_SCHEMA_VERSION {
            return Err(FountainError::InvalidArgument(format!(
                "schema version {} is newer than supported version {SAVE_SCHEMA_VERSION}",
                self.schema_version
            )));
        }
        if !self.karma.is_finite() {
            return Err(FountainError::InvalidArgument(format!("karma is not finite: {}", self.karma)));
        }
        if self.hand.generate_time_limit < TimeDelta::zero() {
            return Err(FountainError::InvalidArgument(format!(
                "generate time limit is negative: {}",
                self.hand.generate_time_limit
            )));
        }
        self.player_valuables.validate_against(catalog)?;
        for throwable in self.hand.throwables() {
            catalog.lookup(throwable.valuable_type)?;
        }
        Ok(())
    }

    /// Fold time spent with the game closed into the offline counter.
    pub(crate) fn mark_loaded(&mut self, now: Timestamp) -> FountainResult<()> {
        let offline = now - self.last_save_time;
        if offline < TimeDelta::zero() {
            return Err(FountainError::ClockRegression {
                context: format!(
                    "'{}' last saved at {}, loading at {now}",
                    self.nickname, self.last_save_time
                ),
                elapsed: offline,
            });
        }
        self.out_of_game_time_since_last_throw += offline;
        self.last_load_time = now;
        Ok(())
    }

    pub(crate) fn set_last_save_time(&mut self, at: Timestamp) {
        self.last_save_time = at;
    }
}
