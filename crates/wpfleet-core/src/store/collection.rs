// ── Generic keyed collection ──
//
// Lock-free concurrent storage with O(1) lookups and a version counter
// bumped once per mutation.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A lock-free collection for a single record type.
///
/// Uses `DashMap` for concurrent lookups. Every mutation bumps a version
/// counter exactly once, so a whole-value replace is observed as a single
/// change.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            by_key: DashMap::new(),
            version,
        }
    }

    /// Insert or replace a value. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: impl Into<String>, value: T) -> bool {
        let is_new = self.by_key.insert(key.into(), Arc::new(value)).is_none();
        self.bump_version();
        is_new
    }

    /// Mutate the value under `key` in place. Returns `None` if absent.
    pub(crate) fn modify<R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let out = {
            let mut entry = self.by_key.get_mut(key)?;
            f(Arc::make_mut(entry.value_mut()))
        };
        self.bump_version();
        Some(out)
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// All values, ordered by key.
    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        let mut entries: Vec<(String, Arc<T>)> = self
            .by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, v)| v).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump_version(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.version.send_modify(|v| *v += 1);
    }
}
