//! Property observation.
//!
//! The observer keeps a per-thread side table keyed by [`ObjectId`]. Each
//! entry records the callbacks registered per property key and, for lists,
//! the `(owner, key)` pointers currently referencing the list. An entry is
//! removed as soon as it holds neither callbacks nor pointers, so objects
//! that go through many bind/unbind cycles do not grow the table.
//!
//! Notification is synchronous. Callback lists are snapshotted before they
//! run, so callbacks may observe or unobserve (even themselves) while a
//! notification is in flight without skipping or repeating the others.

use smallvec::SmallVec;
use tracing::trace;

use crate::{
    callback::Callback,
    id::ObjectId,
    runtime::OBSERVERS,
    value::Value,
};

/// Something whose keyed properties can be observed.
pub trait Observable {
    fn id(&self) -> ObjectId;

    /// Takes over writes to `key` so they notify subscribers. Returns
    /// `false` when the property can not be intercepted (accessor or
    /// non-configurable), in which case notification is manual.
    fn intercept(&self, key: &str) -> bool;

    /// Reads `key` without registering anything.
    fn peek(&self, key: &str) -> Value;
}

/// Registers `callback` for changes of `target[key]`.
///
/// The first registration for a key installs interception on the
/// property. Registering the same callback twice is a no-op. If the
/// current value is a [`List`](crate::List), in-place mutations of that
/// list also fire `callback`.
pub fn observe<O: Observable + ?Sized>(target: &O, key: &str, callback: &Callback) {
    let id = target.id();
    let first = OBSERVERS.with_borrow_mut(|table| {
        let callbacks = table
            .entry_mut(id)
            .callbacks
            .entry(key.to_owned())
            .or_default();
        let first = callbacks.is_empty();
        if !callbacks.contains(callback) {
            callbacks.push(callback.clone());
        }
        first
    });

    if first && !target.intercept(key) {
        trace!(?id, key, "property can not be intercepted, changes need a manual notify");
    }

    watch_list(&target.peek(key), id, key);
}

/// Removes `callback` from `target[key]`. Unknown callbacks are ignored.
pub fn unobserve<O: Observable + ?Sized>(target: &O, key: &str, callback: &Callback) {
    let id = target.id();
    let emptied = OBSERVERS.with_borrow_mut(|table| {
        let Some(entry) = table.entries.get_mut(&id) else {
            return false;
        };
        let Some(callbacks) = entry.callbacks.get_mut(key) else {
            return false;
        };
        let Some(index) = callbacks.iter().position(|c| c == callback) else {
            return false;
        };
        callbacks.remove(index);
        if callbacks.is_empty() {
            entry.callbacks.shift_remove(key);
            true
        } else {
            false
        }
    });

    if emptied {
        unwatch_list(&target.peek(key), id, key);
    }
    OBSERVERS.with_borrow_mut(|table| table.cleanup(id));
}

/// Fires the callbacks of `target[key]` by hand.
///
/// This is the only way subscribers of accessor and non-configurable
/// properties learn about changes.
pub fn notify<O: Observable + ?Sized>(target: &O, key: &str) {
    let callbacks = OBSERVERS.with_borrow(|table| table.callbacks(target.id(), key));
    for callback in callbacks {
        callback.call();
    }
}

/// Number of callbacks registered for `target[key]`.
pub fn callback_count<O: Observable + ?Sized>(target: &O, key: &str) -> usize {
    OBSERVERS.with_borrow(|table| {
        table
            .entries
            .get(&target.id())
            .and_then(|entry| entry.callbacks.get(key))
            .map_or(0, SmallVec::len)
    })
}

/// Number of `(owner, key)` pointers referencing the list `id`.
pub fn pointer_count(id: ObjectId) -> usize {
    OBSERVERS.with_borrow(|table| {
        table
            .entries
            .get(&id)
            .map_or(0, |entry| entry.pointers.values().map(SmallVec::len).sum())
    })
}

/// Whether the side table holds an entry for `id`.
pub fn is_tracked(id: ObjectId) -> bool {
    OBSERVERS.with_borrow(|table| table.entries.contains_key(&id))
}

/// Number of identities in this thread's side table.
pub fn tracked_count() -> usize {
    OBSERVERS.with_borrow(|table| table.entries.len())
}

/// Called by [`Object::set`](crate::Object::set) after an intercepted
/// property changed from `old` to `new`.
pub(crate) fn property_changed(id: ObjectId, key: &str, old: &Value, new: &Value) {
    unwatch_list(old, id, key);

    let callbacks = OBSERVERS.with_borrow(|table| table.callbacks(id, key));
    if callbacks.is_empty() {
        return;
    }
    trace!(?id, key, subscribers = callbacks.len(), "property changed");
    for callback in callbacks {
        callback.call();
    }

    // A callback may have torn the last subscription down.
    if OBSERVERS.with_borrow(|table| table.has_callbacks(id, key)) {
        watch_list(new, id, key);
    }
}

/// Called by every mutating [`List`](crate::List) method once interception
/// is installed.
pub(crate) fn sequence_mutated(list: ObjectId) {
    let (pointers, own) = OBSERVERS.with_borrow(|table| {
        let Some(entry) = table.entries.get(&list) else {
            return (Vec::new(), Vec::new());
        };
        let pointers = entry
            .pointers
            .iter()
            .flat_map(|(owner, keys)| keys.iter().map(move |key| (*owner, key.clone())))
            .collect::<Vec<_>>();
        let own = entry
            .callbacks
            .values()
            .flat_map(|callbacks| callbacks.iter().cloned())
            .collect::<Vec<_>>();
        (pointers, own)
    });
    trace!(?list, pointers = pointers.len(), "sequence mutated");

    for (owner, key) in pointers {
        let callbacks = OBSERVERS.with_borrow(|table| table.callbacks(owner, &key));
        for callback in callbacks {
            callback.call();
        }
    }
    for callback in own {
        callback.call();
    }
}

/// Records that `owner[key]` now points at `value`, if it is a list.
fn watch_list(value: &Value, owner: ObjectId, key: &str) {
    let Value::List(list) = value else {
        return;
    };
    if list.install_interception() {
        trace!(list = ?list.id(), "intercepting list mutations");
    }
    OBSERVERS.with_borrow_mut(|table| {
        let keys = table.entry_mut(list.id()).pointers.entry(owner).or_default();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_owned());
        }
    });
}

/// Drops the pointer from `owner[key]` to `value`, if it is a list.
fn unwatch_list(value: &Value, owner: ObjectId, key: &str) {
    let Value::List(list) = value else {
        return;
    };
    let id = list.id();
    OBSERVERS.with_borrow_mut(|table| {
        let Some(entry) = table.entries.get_mut(&id) else {
            return;
        };
        if let Some(keys) = entry.pointers.get_mut(&owner) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                entry.pointers.shift_remove(&owner);
            }
        }
        table.cleanup(id);
    });
}
