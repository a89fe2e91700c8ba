use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use mgmt_types::{RequestType, ResourceName, ResponseEnvelope};

use crate::request::ManagementRequest;

use super::HISTORY_TARGET;
use super::entry::{HistoryEntry, HistoryValue};
use super::key::HistoryKey;

/// Layout of a successful READ result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadShape {
    /// One attribute of one resource: the value itself.
    Scalar,
    /// Several attributes of one resource: attribute name to value.
    AttributeMap,
    /// A pattern read: canonical resource name to attribute map.
    ResourceMap,
}

impl ReadShape {
    fn of(request: &ManagementRequest) -> Self {
        if request.is_pattern() {
            Self::ResourceMap
        } else if request.is_multi_attribute() {
            Self::AttributeMap
        } else {
            Self::Scalar
        }
    }
}

#[derive(Debug)]
struct HistoryState {
    global_max_entries: usize,
    entries: HashMap<HistoryKey, HistoryEntry>,
    patterns: HashMap<HistoryKey, usize>,
}

impl HistoryState {
    fn clamp(&self, max_entries: usize) -> usize {
        max_entries.min(self.global_max_entries)
    }

    fn configure_exact(&mut self, key: HistoryKey, max_entries: usize) {
        let capacity = self.clamp(max_entries);
        if capacity == 0 {
            self.entries.remove(&key);
            return;
        }
        self.entries
            .entry(key)
            .and_modify(|entry| entry.set_max_entries(capacity))
            .or_insert_with(|| HistoryEntry::new(capacity));
    }

    fn configure_pattern(&mut self, key: HistoryKey, max_entries: usize) {
        let capacity = self.clamp(max_entries);
        if capacity == 0 {
            self.entries.retain(|exact, _| !key.matches(exact));
            self.patterns.remove(&key);
            return;
        }
        for (exact, entry) in &mut self.entries {
            if key.matches(exact) {
                entry.set_max_entries(capacity);
            }
        }
        self.patterns.insert(key, capacity);
    }

    fn pattern_capacity(&self, key: &HistoryKey) -> Option<usize> {
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.matches(key))
            .map(|(_, capacity)| *capacity)
    }

    /// Records `value` under `key` and returns the values recorded before it.
    ///
    /// Keys without an entry are created only when a configured pattern
    /// covers them; otherwise nothing is recorded.
    fn record(&mut self, key: HistoryKey, value: Value, timestamp: u64) -> Option<Value> {
        if !self.entries.contains_key(&key) {
            let capacity = self.pattern_capacity(&key)?;
            self.entries.insert(key.clone(), HistoryEntry::new(capacity));
        }
        let entry = self.entries.get_mut(&key)?;
        let previous = entry.to_json();
        entry.add(value, timestamp);
        Some(previous)
    }

    /// Like [`Self::record`] but never creates entries.
    fn record_exact(&mut self, key: &HistoryKey, value: Value, timestamp: u64) -> Option<Value> {
        let entry = self.entries.get_mut(key)?;
        let previous = entry.to_json();
        entry.add(value, timestamp);
        Some(previous)
    }

    fn record_attributes(
        &mut self,
        resource: &ResourceName,
        values: &Map<String, Value>,
        request: &ManagementRequest,
        timestamp: u64,
    ) -> Map<String, Value> {
        let target = request.target_url().map(str::to_owned);
        let mut history = Map::new();
        for (attribute, value) in values {
            let key = HistoryKey::attribute(resource.clone(), attribute, None, target.clone());
            if let Some(previous) = self.record(key, value.clone(), timestamp) {
                history.insert(attribute.clone(), previous);
            }
        }
        history
    }

    fn annotate_read(
        &mut self,
        request: &ManagementRequest,
        envelope: &mut ResponseEnvelope,
        timestamp: u64,
    ) {
        let Some(resource) = request.resource() else {
            return;
        };
        let history = match (ReadShape::of(request), &envelope.value) {
            (ReadShape::Scalar, value) => HistoryKey::for_request(request)
                .and_then(|key| self.record(key, value.clone(), timestamp)),
            (ReadShape::AttributeMap, Value::Object(values)) => {
                let history = self.record_attributes(resource, values, request, timestamp);
                (!history.is_empty()).then_some(Value::Object(history))
            }
            (ReadShape::ResourceMap, Value::Object(resources)) => {
                let mut history = Map::new();
                for (name, values) in resources {
                    let (Ok(matched), Value::Object(values)) = (ResourceName::parse(name), values)
                    else {
                        warn!(
                            target: HISTORY_TARGET,
                            resource = %name,
                            "skipping unparseable resource in pattern read result"
                        );
                        continue;
                    };
                    let recorded = self.record_attributes(&matched, values, request, timestamp);
                    if !recorded.is_empty() {
                        history.insert(name.clone(), Value::Object(recorded));
                    }
                }
                (!history.is_empty()).then_some(Value::Object(history))
            }
            (shape, _) => {
                warn!(
                    target: HISTORY_TARGET,
                    ?shape,
                    request = %request,
                    "read result does not have the expected shape"
                );
                None
            }
        };
        if history.is_some() {
            envelope.history = history;
        }
    }
}

/// Bounded per-key value history shared by every pipeline caller.
///
/// Every operation holds one store-wide lock for its whole duration.
#[derive(Debug)]
pub struct HistoryStore {
    inner: Mutex<HistoryState>,
}

impl HistoryStore {
    /// Creates an empty store with the given global ceiling.
    pub fn new(global_max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(HistoryState {
                global_max_entries,
                entries: HashMap::new(),
                patterns: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HistoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the global ceiling on per-key capacity.
    pub fn global_ceiling(&self) -> usize {
        self.state().global_max_entries
    }

    /// Changes the global ceiling and trims every entry to fit.
    ///
    /// A ceiling of zero stops all tracking: entries and patterns are dropped.
    pub fn set_global_ceiling(&self, max_entries: usize) {
        let mut state = self.state();
        state.global_max_entries = max_entries;
        if max_entries == 0 {
            state.entries.clear();
            state.patterns.clear();
        }
        for entry in state.entries.values_mut() {
            if entry.max_entries() > max_entries {
                entry.set_max_entries(max_entries);
            }
        }
        for capacity in state.patterns.values_mut() {
            *capacity = (*capacity).min(max_entries);
        }
        debug!(target: HISTORY_TARGET, max_entries, "history ceiling updated");
    }

    /// Enables tracking for `key` with the given capacity.
    ///
    /// Capacities above the global ceiling are clamped to it. A capacity
    /// that ends up zero stops tracking: the key's entry is removed, and for
    /// a pattern key so is every entry it covers.
    pub fn configure(&self, key: HistoryKey, max_entries: usize) {
        debug!(target: HISTORY_TARGET, key = %key, max_entries, "configuring history");
        let mut state = self.state();
        if key.is_pattern() {
            state.configure_pattern(key, max_entries);
        } else {
            state.configure_exact(key, max_entries);
        }
    }

    /// Drops every entry and pattern.
    pub fn reset(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.patterns.clear();
        debug!(target: HISTORY_TARGET, "history reset");
    }

    /// Returns the recorded values for an exact key, oldest first.
    pub fn values(&self, key: &HistoryKey) -> Vec<HistoryValue> {
        self.state()
            .entries
            .get(key)
            .map(HistoryEntry::values)
            .unwrap_or_default()
    }

    /// Returns the capacity of a tracked key.
    pub fn capacity(&self, key: &HistoryKey) -> Option<usize> {
        let state = self.state();
        if key.is_pattern() {
            state.patterns.get(key).copied()
        } else {
            state.entries.get(key).map(HistoryEntry::max_entries)
        }
    }

    /// Returns the number of exact entries currently held.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Returns `true` when no exact entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stamps `timestamp` on a successful envelope, attaches prior values
    /// for tracked keys, and records the new values.
    pub fn record_and_annotate(
        &self,
        request: &ManagementRequest,
        envelope: &mut ResponseEnvelope,
        timestamp: u64,
    ) {
        envelope.timestamp = Some(timestamp);
        let mut state = self.state();
        match request.request_type() {
            RequestType::Read => state.annotate_read(request, envelope, timestamp),
            RequestType::Write => {
                let (Some(key), Some(value)) =
                    (HistoryKey::for_request(request), request.write_value())
                else {
                    return;
                };
                envelope.history = state.record_exact(&key, value.clone(), timestamp);
            }
            RequestType::Exec => {
                let Some(key) = HistoryKey::for_request(request) else {
                    return;
                };
                envelope.history = state.record_exact(&key, envelope.value.clone(), timestamp);
            }
            RequestType::List | RequestType::Version | RequestType::Search => {}
        }
    }
}
