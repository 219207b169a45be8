//! Fortune Fountain core: time-reconciled generation of valuables and the
//! save-file lifecycle that carries generation state across restarts.
//!
//! Data flow:
//!   store::SaveStore::load        → SaveData (hand, player valuables, karma)
//!   generation::GenerationEngine  → backfills elapsed time into the hand
//!   SaveData::throw               → hand value becomes karma
//!   store::SaveStore::save        → timestamped, trimmed snapshot on disk

pub mod catalog;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod generation;
pub mod hand;
pub mod incrementer;
pub mod player_valuable;
pub mod save_data;
pub mod session;
pub mod store;
pub mod types;
