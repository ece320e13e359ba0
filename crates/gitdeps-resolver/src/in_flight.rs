//! Per-key serialization of concurrent work.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One mutex per storage path, handed out on demand.
///
/// Two downloads of the same package hold the same slot, so the second one
/// starts only after the first has promoted its checkout.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    slots: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `key`, shared by every caller asking for the same key.
    pub fn slot(&self, key: &Path) -> Arc<Mutex<()>> {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key.to_path_buf()).or_default())
    }
}

/// Acquire a mutex, ignoring poisoning. Every mutex here guards either `()`
/// or a map that stays consistent across a panic.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
