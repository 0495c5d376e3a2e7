use serde_json::{Map, Value};

/// Dirty-tracked holder of a panel's render data.
///
/// The dirty flag is tracked at store granularity, not per key: any number of
/// `update` calls between two reads collapse into a single "changed" signal.
#[derive(Debug, Clone)]
pub struct Store {
    data: Option<Map<String, Value>>,
    changed: bool,
}

impl Store {
    /// Create a store seeded with `initial`. A fresh store always counts as
    /// changed so the first read yields its data.
    pub fn new(initial: Option<Map<String, Value>>) -> Self {
        Self {
            data: initial,
            changed: true,
        }
    }

    /// Set `data[key] = value` and mark the store as changed.
    ///
    /// After a [`reset`](Self::reset) the mapping is absent; it is re-created
    /// empty before the write.
    pub fn update(&mut self, key: impl Into<String>, value: Value) {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self.changed = true;
    }

    /// Read the data if it changed since the last read, or unconditionally
    /// when `force` is set. Any read that gets past the dirty check clears it.
    pub fn get(&mut self, force: bool) -> Option<&Map<String, Value>> {
        if !self.changed && !force {
            return None;
        }
        self.changed = false;
        self.data.as_ref()
    }

    /// Drop all data and mark the store as changed.
    pub fn reset(&mut self) {
        self.changed = true;
        self.data = None;
    }

    /// True when there is no data worth rendering: absent, or an empty mapping.
    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map_or(true, Map::is_empty)
    }

    /// Flag the store as changed without touching the data.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(None)
    }
}
