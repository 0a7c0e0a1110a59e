use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

/// Process-lifetime memo of JSON responses, keyed by request URL.
///
/// Entries are never evicted. The lock is never held across an await, so two
/// concurrent misses on one key may both fetch; the later insert wins and
/// both values are equal.
#[derive(Debug, Default)]
pub(crate) struct ResponseCache {
    entries: Mutex<HashMap<String, Arc<Value>>>,
}

impl ResponseCache {
    pub(crate) fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub(crate) fn insert(&self, key: String, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&value));
        value
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
