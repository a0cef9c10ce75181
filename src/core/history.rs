//! Transition history for a single machine instance.
//!
//! Every applied transition is recorded by the engine. Ignored actions
//! are not recorded, so the history is the exact sequence of state
//! types a subscriber has observed after the initial replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single applied transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the state type being left
    pub from: String,
    /// Name of the state type being entered
    pub to: String,
    /// Name of the action that caused the transition
    pub action: String,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of applied transitions.
///
/// # Example
///
/// ```rust
/// use exchange_connect::core::{TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = TransitionHistory::new();
/// history.record(TransitionRecord {
///     from: "idle".into(),
///     to: "exchanges:loading".into(),
///     action: "LOAD_EXCHANGES".into(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.path(), vec!["idle", "exchanges:loading"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: Vec<TransitionRecord>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition.
    pub fn record(&mut self, record: TransitionRecord) {
        self.records.push(record);
    }

    /// All recorded transitions in application order.
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.last()
    }

    /// Sequence of state names visited, starting with the first `from`.
    ///
    /// Empty when nothing has been recorded.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Time between the first and the last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}
