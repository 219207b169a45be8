use crate::{
    catalog::ValuableType,
    types::{Nickname, Timestamp},
};
use chrono::TimeDelta;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FountainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Elapsed time came out negative. Never clamped: it means the clock
    /// or the caller is wrong.
    #[error("Clock went backwards ({context}): elapsed {elapsed}")]
    ClockRegression { context: String, elapsed: TimeDelta },

    #[error("Valuable {valuable_type} is not in the catalog")]
    CatalogMiss { valuable_type: ValuableType },

    #[error("Unknown valuable type '{name}'")]
    UnknownValuable { name: String },

    #[error("Player valuable {valuable_type} appears more than once")]
    DuplicateValuable { valuable_type: ValuableType },

    #[error("Player valuable {valuable_type} is missing")]
    MissingValuable { valuable_type: ValuableType },

    #[error("Throwable {id} is not in the hand")]
    ThrowableNotInHand { id: Uuid },

    #[error(
        "Re-save of '{nickname}' throttled: last save {last_save}, attempted {attempted}, \
         re-save delay {delay}"
    )]
    ReSaveThrottled {
        nickname:  Nickname,
        last_save: Timestamp,
        attempted: Timestamp,
        delay:     TimeDelta,
    },

    #[error("No save for '{nickname}' after {attempts} attempts")]
    SaveNotFound { nickname: Nickname, attempts: u32 },

    #[error("Save data for '{nickname}' is unusable: {reason}. Raw content: {raw}")]
    SaveData {
        nickname: Nickname,
        reason:   String,
        raw:      String,
    },

    #[error("Invalid nickname '{0}'")]
    InvalidNickname(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FountainResult<T> = Result<T, FountainError>;
