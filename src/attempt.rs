use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::Category;
use crate::error::{ProgressError, Result};

/// How a single attempt ended. `Missed` means the countdown ran out before
/// an answer was given; it counts as a failure just like `Wrong`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
pub enum Outcome {
    #[strum(serialize = "right")]
    #[serde(rename = "right")]
    Right,
    #[strum(serialize = "wrong")]
    #[serde(rename = "wrong")]
    Wrong,
    #[strum(serialize = "missed")]
    #[serde(rename = "missed")]
    Missed,
}

/// One completed question, created exactly once by the gameplay loop at
/// answer/timeout and never mutated after it is appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub category: Category,
    /// Number of premises presented; always at least 1.
    pub premises: u32,
    /// Countdown budget in seconds, or `None` for an untimed attempt.
    pub seconds_allotted: Option<u32>,
    /// Variant qualifiers (e.g. nested-binary depth). Order-significant for
    /// key stability.
    pub modifiers: Vec<String>,
    pub outcome: Outcome,
    /// Time from presentation to answer or timeout.
    pub elapsed_ms: u64,
    /// Used only for chronological ordering, never for the statistics.
    pub recorded_at: DateTime<Local>,
}

/// Largest time budget a well-formed attempt may carry. The controller only
/// ever writes budgets of at most 60s plus goal-relative slack; anything past
/// an hour is a caller bug, not a real countdown.
pub const MAX_SECONDS_ALLOTTED: u32 = 3600;

impl AttemptRecord {
    /// Canonical grouping key for this attempt's exact configuration.
    pub fn key(&self) -> ProgressKey {
        self.key_for(self.category)
    }

    /// The key this attempt would have under a different category, keeping
    /// premises, time budget and modifiers. Collision-free for distinct
    /// configurations because modifiers never contain the separator slots.
    pub fn key_for(&self, category: Category) -> ProgressKey {
        let seconds = match self.seconds_allotted {
            Some(s) => s.to_string(),
            None => "untimed".to_string(),
        };
        let mut key = format!("{category}-{}-{seconds}", self.premises);
        for modifier in &self.modifiers {
            key.push('-');
            key.push_str(modifier);
        }
        ProgressKey(key)
    }

    /// Rejects records the controller cannot evaluate, before any key
    /// derivation happens.
    pub fn validate(&self) -> Result<()> {
        if self.premises == 0 {
            return Err(ProgressError::MalformedRecord(
                "premise count must be at least 1".into(),
            ));
        }
        if self.seconds_allotted == Some(0) {
            return Err(ProgressError::MalformedRecord(
                "time budget must be at least 1 second".into(),
            ));
        }
        if let Some(s) = self.seconds_allotted {
            if s > MAX_SECONDS_ALLOTTED {
                return Err(ProgressError::MalformedRecord(format!(
                    "time budget of {s}s exceeds the {MAX_SECONDS_ALLOTTED}s ceiling"
                )));
            }
        }
        Ok(())
    }
}

/// Canonical identifier of a `(category, premises, time budget, modifiers)`
/// configuration. Two attempts sharing a key are pooled as the same
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey(String);

impl ProgressKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
