use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;

/// A recorded value with the time it was observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryValue {
    /// Recorded value.
    pub value: Value,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Bounded, oldest-first sequence of recorded values.
#[derive(Debug, Clone)]
pub(crate) struct HistoryEntry {
    values: VecDeque<HistoryValue>,
    max_entries: usize,
}

impl HistoryEntry {
    pub(crate) fn new(max_entries: usize) -> Self {
        Self {
            values: VecDeque::new(),
            max_entries,
        }
    }

    pub(crate) fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Changes the capacity, evicting the oldest values that no longer fit.
    pub(crate) fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        self.trim();
    }

    pub(crate) fn add(&mut self, value: Value, timestamp: u64) {
        self.values.push_back(HistoryValue { value, timestamp });
        self.trim();
    }

    pub(crate) fn values(&self) -> Vec<HistoryValue> {
        self.values.iter().cloned().collect()
    }

    /// Renders the recorded values as a JSON array, oldest first.
    pub(crate) fn to_json(&self) -> Value {
        Value::Array(
            self.values
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "value": entry.value,
                        "timestamp": entry.timestamp,
                    })
                })
                .collect(),
        )
    }

    fn trim(&mut self) {
        while self.values.len() > self.max_entries {
            self.values.pop_front();
        }
    }
}
