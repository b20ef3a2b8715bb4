use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async mutexes addressed by string key. Entries are created on
/// first use and dropped again once the last guard for the key is released.
/// Clones share the same registry.
#[derive(Default, Clone)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

pub struct KeyedGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: impl Into<String>) -> KeyedGuard {
        let key = key.into();
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyedGuard { key, locks: self.locks.clone(), guard: Some(guard) }
    }

    /// Locks several keys in sorted order so two callers asking for the
    /// same set never deadlock. Duplicates are taken once.
    pub async fn lock_all(&self, keys: impl IntoIterator<Item = String>) -> Vec<KeyedGuard> {
        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map itself still holds the mutex: nobody is waiting.
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
