//! # Nodes
//!
//! A small host tree for bound templates: elements with ordered attributes,
//! text and comment nodes, free-form properties (`value`, `checked`, ...)
//! and named event listeners. Nodes live in thread-local storage and are
//! addressed by [`NodeId`].

mod id;
pub(crate) mod storage;

use std::{fmt, rc::Rc};

pub use id::NodeId;

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with its lower-cased tag name.
    Element(String),
    Text,
    Comment,
}

/// An event delivered to a node's listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

/// A node event listener. Listeners are compared by identity.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
