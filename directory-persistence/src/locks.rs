use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutexes created on demand per key.
///
/// Used to make "look up, then insert" a single step for everything that
/// shares a uniqueness key. Idle entries are removed when the last holder
/// releases them.
#[derive(Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires every key in sorted order, so two callers locking
    /// overlapping key sets cannot deadlock.
    pub async fn lock_all(&self, mut keys: Vec<String>) -> KeyedGuard<'_> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let mutex = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(mutex.lock_owned().await);
        }

        KeyedGuard {
            owner: self,
            keys,
            guards,
        }
    }

    pub async fn lock(&self, key: impl Into<String>) -> KeyedGuard<'_> {
        self.lock_all(vec![key.into()]).await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct KeyedGuard<'a> {
    owner: &'a KeyedLocks,
    keys: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guards.clear();

        // Only the map's own handle left means nobody holds or awaits it
        for key in &self.keys {
            self.owner
                .locks
                .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}
