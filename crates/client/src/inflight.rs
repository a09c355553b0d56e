//! One-at-a-time guards for mutating operations.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::{ClientError, ClientResult};
use crate::lock;

/// Set of keys with an operation in flight. A second acquire of a held key
/// fails with [`ClientError::Busy`] instead of queueing.
#[derive(Debug)]
pub struct InFlight<K> {
    label: &'static str,
    held: Arc<Mutex<HashSet<K>>>,
}

impl<K> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            held: Arc::clone(&self.held),
        }
    }
}

impl<K: Eq + Hash + Clone + Display> InFlight<K> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            held: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn try_acquire(&self, key: K) -> ClientResult<InFlightGuard<K>> {
        self.try_acquire_all(vec![key])
    }

    /// Acquire every key or none of them.
    pub fn try_acquire_all(&self, keys: Vec<K>) -> ClientResult<InFlightGuard<K>> {
        let mut held = lock(&self.held);
        if let Some(busy) = keys.iter().find(|k| held.contains(*k)) {
            return Err(ClientError::Busy(format!("{} for {busy}", self.label)));
        }
        held.extend(keys.iter().cloned());
        Ok(InFlightGuard {
            held: Arc::clone(&self.held),
            keys,
        })
    }

    pub fn is_held(&self, key: &K) -> bool {
        lock(&self.held).contains(key)
    }
}

/// Releases its keys on drop, including when the owning future is dropped.
#[derive(Debug)]
pub struct InFlightGuard<K: Eq + Hash> {
    held: Arc<Mutex<HashSet<K>>>,
    keys: Vec<K>,
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        let mut held = lock(&self.held);
        for key in &self.keys {
            held.remove(key);
        }
    }
}
