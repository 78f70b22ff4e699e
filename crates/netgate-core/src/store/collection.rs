// ── Keyed entity collection ──
//
// Concurrent keyed storage for the auxiliary resources (interfaces,
// routes, blocked domains). Lookups are O(1) through a `DashMap`; the
// snapshot handed to readers is kept in insertion order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// Stored value plus the sequence number it was first inserted with.
struct Slot<T> {
    seq: u64,
    value: Arc<T>,
}

/// A concurrent collection for a single entity type.
///
/// Every mutation rebuilds the ordered snapshot that readers receive,
/// so a snapshot never reflects a half-applied change.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    /// Primary storage: key string -> entity.
    by_key: DashMap<String, Slot<T>>,

    /// Next insertion sequence number.
    next_seq: AtomicU64,

    /// Insertion-ordered snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            next_seq: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the key was new.
    ///
    /// Replacing keeps the entity's original position in the snapshot.
    pub(crate) fn upsert(&self, key: String, entity: T) -> bool {
        let value = Arc::new(entity);
        let is_new = match self.by_key.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().value = value;
                false
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Slot { seq, value });
                true
            }
        };

        self.rebuild_snapshot();
        is_new
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, slot)| slot.value);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(&r.value))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Swap the whole collection for `entries`, in the given order.
    pub(crate) fn replace_all(&self, entries: impl IntoIterator<Item = (String, T)>) {
        self.by_key.clear();
        for (key, entity) in entries {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            self.by_key.insert(
                key,
                Slot {
                    seq,
                    value: Arc::new(entity),
                },
            );
        }
        self.rebuild_snapshot();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut slots: Vec<(u64, Arc<T>)> = self
            .by_key
            .iter()
            .map(|r| (r.seq, Arc::clone(&r.value)))
            .collect();
        slots.sort_by_key(|(seq, _)| *seq);
        let values = slots.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reports_new_keys() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.upsert("eth0".into(), "a".into()));
        assert!(!col.upsert("eth0".into(), "b".into()));
        assert_eq!(*col.get("eth0").unwrap(), "b");
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn snapshot_keeps_insertion_order_across_updates() {
        let col: EntityCollection<String> = EntityCollection::new();
        for key in ["c", "a", "b"] {
            col.upsert(key.into(), key.to_uppercase());
        }
        col.upsert("c".into(), "C2".into());

        let snap: Vec<String> = col.snapshot().iter().map(|v| v.to_string()).collect();
        assert_eq!(snap, vec!["C2", "A", "B"]);
    }

    #[test]
    fn remove_updates_snapshot() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert("a".into(), "x".into());
        assert_eq!(*col.remove("a").unwrap(), "x");
        assert!(col.remove("a").is_none());
        assert!(col.is_empty());
        assert!(col.snapshot().is_empty());
    }

    #[test]
    fn replace_all_swaps_contents() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert("old".into(), "x".into());
        col.replace_all(vec![("n1".into(), "1".into()), ("n2".into(), "2".into())]);
        assert!(!col.contains("old"));
        let snap: Vec<String> = col.snapshot().iter().map(|v| v.to_string()).collect();
        assert_eq!(snap, vec!["1", "2"]);
    }
}
