use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A stable identifier for an observable object.
///
/// Ids are handed out from a process-wide counter and never reused, so a
/// side-table entry can never be mistaken for one that belonged to an
/// object dropped earlier.
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) fn next() -> ObjectId {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        ObjectId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}
