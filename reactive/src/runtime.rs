use std::{cell::RefCell, hash::BuildHasherDefault};

use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;

use crate::{callback::Callback, id::ObjectId};

pub(crate) type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

thread_local! {
    pub(crate) static OBSERVERS: RefCell<ObserverTable> = RefCell::new(ObserverTable::default());
}

/// Everything the observer knows about one object identity.
#[derive(Default)]
pub(crate) struct Entry {
    /// Subscribers per property key, in registration order.
    pub(crate) callbacks: FxIndexMap<String, SmallVec<[Callback; 2]>>,
    /// For lists: the (owner, key) pairs whose value is currently this list.
    pub(crate) pointers: FxIndexMap<ObjectId, SmallVec<[String; 1]>>,
}

impl Entry {
    fn is_unreferenced(&self) -> bool {
        self.callbacks.is_empty() && self.pointers.is_empty()
    }
}

/// The per-thread identity side table.
#[derive(Default)]
pub(crate) struct ObserverTable {
    pub(crate) entries: FxHashMap<ObjectId, Entry>,
}

impl ObserverTable {
    pub(crate) fn entry_mut(&mut self, id: ObjectId) -> &mut Entry {
        self.entries.entry(id).or_default()
    }

    /// Snapshot of the callbacks registered for `(id, key)`.
    pub(crate) fn callbacks(&self, id: ObjectId, key: &str) -> SmallVec<[Callback; 2]> {
        self.entries
            .get(&id)
            .and_then(|entry| entry.callbacks.get(key))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn has_callbacks(&self, id: ObjectId, key: &str) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.callbacks.contains_key(key))
    }

    /// Drops the entry for `id` once nothing references it.
    pub(crate) fn cleanup(&mut self, id: ObjectId) {
        if self
            .entries
            .get(&id)
            .is_some_and(Entry::is_unreferenced)
        {
            self.entries.remove(&id);
        }
    }
}
