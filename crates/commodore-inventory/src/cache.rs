//! Process-wide keyed cache with single-flight fills
//!
//! Concurrent lookups of the same key wait for one computation instead of
//! starting their own. A failed computation leaves the key empty, so the
//! next lookup retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Map from string keys to lazily computed values
pub struct KeyedCache<V> {
    slots: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> KeyedCache<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing it with `init` if absent
    pub async fn get_or_try_init<E, F, Fut>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.slot(key);
        cell.get_or_try_init(init).await.cloned()
    }

    /// Value for `key` if it has been computed
    pub fn get(&self, key: &str) -> Option<V> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|cell| cell.get().cloned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of computed entries
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn slot(&self, key: &str) -> Arc<OnceCell<V>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

impl<V: Clone> Default for KeyedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
