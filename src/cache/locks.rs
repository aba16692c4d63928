//! Per-artifact mutual exclusion
//!
//! Download and patching of one (package, filename) happen under its lock,
//! so concurrent first requests for the same artifact coalesce: the first
//! caller fetches, the rest find the finished file once they get the lock.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Lock table keyed by (package, filename)
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for a key, creating it on first use
    pub fn handle(&self, package: &str, filename: &str) -> Arc<Mutex<()>> {
        let key = (package.to_string(), filename.to_string());
        Arc::clone(self.locks.entry(key).or_default().value())
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
