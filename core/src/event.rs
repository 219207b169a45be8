//! Generation notifications.
//!
//! RULE: every non-zero generation is returned to the caller AND delivered
//! to each registered observer exactly once. Observers are owned by the
//! engine that notifies them, so nothing outlives a reload by accident.

use crate::{catalog::ValuableType, types::Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationEvent {
    pub valuable_type: ValuableType,
    pub amount:        u64,
    pub generated_at:  Timestamp,
}

pub trait GenerationObserver {
    fn on_generated(&mut self, event: &GenerationEvent);
}

impl<F: FnMut(&GenerationEvent)> GenerationObserver for F {
    fn on_generated(&mut self, event: &GenerationEvent) {
        self(event)
    }
}
