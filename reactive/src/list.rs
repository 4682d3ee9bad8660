use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    fmt,
    rc::Rc,
};

use crate::{
    id::ObjectId,
    observer::{self, Observable},
    value::Value,
};

struct ListInner {
    id: ObjectId,
    items: RefCell<Vec<Value>>,
    /// Set the first time the list is stored under an observed property.
    intercepted: Cell<bool>,
}

/// An observable sequence.
///
/// Every mutating method runs the underlying `Vec` operation and then, if
/// the list has ever been stored under an observed property, notifies
/// every (object, key) pair currently pointing at this list. Aliasing is
/// supported: a list held by two observed properties notifies both.
#[derive(Clone)]
pub struct List(Rc<ListInner>);

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl List {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ListInner {
            id: ObjectId::next(),
            items: RefCell::new(items),
            intercepted: Cell::new(false),
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    /// The item at `index`, or [`Value::Null`] past the end.
    pub fn get(&self, index: usize) -> Value {
        self.0.items.borrow().get(index).cloned().unwrap_or_default()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.0.items.borrow())
    }

    pub fn position(&self, value: &Value) -> Option<usize> {
        self.0.items.borrow().iter().position(|item| item == value)
    }

    /// Whether mutations of this list are reported to the observer.
    pub fn is_intercepted(&self) -> bool {
        self.0.intercepted.get()
    }

    /// Marks the list as intercepted. Returns `true` only the first time.
    pub(crate) fn install_interception(&self) -> bool {
        !self.0.intercepted.replace(true)
    }

    /// Runs `f` on the items, then notifies. `f` must not call back into
    /// user code; caller-supplied iterators and comparators run first.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        let result = f(&mut self.0.items.borrow_mut());
        if self.0.intercepted.get() {
            observer::sequence_mutated(self.0.id);
        }
        result
    }

    pub fn push(&self, value: impl Into<Value>) {
        let value = value.into();
        self.mutate(|items| items.push(value));
    }

    pub fn pop(&self) -> Option<Value> {
        self.mutate(Vec::pop)
    }

    /// Removes and returns the first item.
    pub fn shift(&self) -> Option<Value> {
        self.mutate(|items| (!items.is_empty()).then(|| items.remove(0)))
    }

    /// Inserts `value` at the front.
    pub fn unshift(&self, value: impl Into<Value>) {
        let value = value.into();
        self.mutate(|items| items.insert(0, value));
    }

    /// Inserts `value` at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        self.mutate(|items| {
            let index = index.min(items.len());
            items.insert(index, value);
        });
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        self.mutate(|items| (index < items.len()).then(|| items.remove(index)))
    }

    /// Removes `delete_count` items starting at `start` and inserts
    /// `insert` in their place, returning the removed items. Out of range
    /// arguments are clamped.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        insert: impl IntoIterator<Item = Value>,
    ) -> Vec<Value> {
        let insert: Vec<Value> = insert.into_iter().collect();
        self.mutate(|items| {
            let start = start.min(items.len());
            let end = start.saturating_add(delete_count).min(items.len());
            items.splice(start..end, insert).collect()
        })
    }

    /// Replaces the item at `index`. Writes past the end are ignored.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        if index >= self.len() {
            return;
        }
        let value = value.into();
        self.mutate(|items| items[index] = value);
    }

    pub fn sort(&self) {
        self.mutate(|items| items.sort_by(Value::sort_cmp));
    }

    /// Sorts with `compare`. The comparator may read this list, and sees
    /// the order from before the sort.
    pub fn sort_by(&self, compare: impl FnMut(&Value, &Value) -> Ordering) {
        let mut sorted = self.to_vec();
        sorted.sort_by(compare);
        self.mutate(|items| *items = sorted);
    }

    pub fn reverse(&self) {
        self.mutate(|items| items.reverse());
    }

    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        let values: Vec<Value> = values.into_iter().collect();
        self.mutate(|items| items.extend(values));
    }
}

impl Observable for List {
    fn id(&self) -> ObjectId {
        self.0.id
    }

    // Keys on a list (indices, `length`) change only through mutations,
    // which notify once interception is installed.
    fn intercept(&self, _key: &str) -> bool {
        self.install_interception();
        true
    }

    fn peek(&self, key: &str) -> Value {
        if key == "length" {
            return Value::from(self.len());
        }
        key.parse::<usize>()
            .map(|index| self.get(index))
            .unwrap_or_default()
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().map(Into::into).collect())
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("id", &self.0.id)
            .field("len", &self.len())
            .finish()
    }
}
