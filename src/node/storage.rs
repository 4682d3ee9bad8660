use std::cell::RefCell;

use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};
use tether_reactive::Value;

use super::{Listener, NodeId, NodeKind};
use crate::FxIndexMap;

thread_local! {
    pub(crate) static NODE_STORAGE: RefCell<NodeStorage> = Default::default();
}

#[derive(Default)]
pub(crate) struct NodeStorage {
    pub(crate) kinds: SlotMap<NodeId, NodeKind>,
    pub(crate) attributes: SecondaryMap<NodeId, FxIndexMap<String, String>>,
    /// Character data of text and comment nodes.
    pub(crate) text: SecondaryMap<NodeId, String>,
    /// Raw markup assigned through `set_inner_html`, dropped on the next
    /// structural change of the element's children.
    pub(crate) markup: SecondaryMap<NodeId, String>,
    pub(crate) children: SecondaryMap<NodeId, Vec<NodeId>>,
    pub(crate) parent: SecondaryMap<NodeId, NodeId>,
    pub(crate) properties: SecondaryMap<NodeId, FxHashMap<String, Value>>,
    pub(crate) listeners: SecondaryMap<NodeId, Vec<(String, Listener)>>,
}

impl NodeStorage {
    pub(crate) fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = self.kinds.insert(kind);
        self.children.insert(id, Vec::new());
        id
    }

    /// `id` followed by all of its descendants in document order.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(children) = self.children.get(next) {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|c| *c != id);
            }
            self.markup.remove(parent);
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) {
        self.detach(id);
        for node in self.subtree(id) {
            self.attributes.remove(node);
            self.text.remove(node);
            self.markup.remove(node);
            self.children.remove(node);
            self.parent.remove(node);
            self.properties.remove(node);
            self.listeners.remove(node);
            self.kinds.remove(node);
        }
    }

    pub(crate) fn clear_children(&mut self, id: NodeId) {
        let children = self.children.get(id).cloned().unwrap_or_default();
        for child in children {
            self.free(child);
        }
        self.markup.remove(id);
    }
}
