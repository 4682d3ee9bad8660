use slotmap::new_key_type;
use tether_reactive::Value;

use super::{Event, Listener, NodeKind, storage::NODE_STORAGE};

new_key_type! {
    /// A small unique identifier for a node in the host tree.
    ///
    /// All node access goes through this id; a removed node's id stays
    /// valid as a value but no longer resolves (see [`NodeId::is_valid`]).
    pub struct NodeId;
}

impl NodeId {
    /// Creates a detached element. The tag is stored lower-cased.
    pub fn element(tag: &str) -> NodeId {
        NODE_STORAGE.with_borrow_mut(|s| s.insert(NodeKind::Element(tag.to_ascii_lowercase())))
    }

    /// Creates a detached text node.
    pub fn text(data: &str) -> NodeId {
        NODE_STORAGE.with_borrow_mut(|s| {
            let id = s.insert(NodeKind::Text);
            s.text.insert(id, data.to_owned());
            id
        })
    }

    /// Creates a detached comment node.
    pub fn comment(data: &str) -> NodeId {
        NODE_STORAGE.with_borrow_mut(|s| {
            let id = s.insert(NodeKind::Comment);
            s.text.insert(id, data.to_owned());
            id
        })
    }

    pub fn is_valid(&self) -> bool {
        NODE_STORAGE.with_borrow(|s| s.kinds.contains_key(*self))
    }

    pub fn kind(&self) -> Option<NodeKind> {
        NODE_STORAGE.with_borrow(|s| s.kinds.get(*self).cloned())
    }

    /// The element tag, or `None` for text and comment nodes.
    pub fn tag(&self) -> Option<String> {
        match self.kind()? {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind(), Some(NodeKind::Element(_)))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind(), Some(NodeKind::Text))
    }

    /// Removes this node and its whole subtree from storage.
    pub fn remove(&self) {
        NODE_STORAGE.with_borrow_mut(|s| s.free(*self));
    }

    // Attributes

    pub fn attribute(&self, name: &str) -> Option<String> {
        NODE_STORAGE.with_borrow(|s| s.attributes.get(*self)?.get(name).cloned())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        NODE_STORAGE.with_borrow_mut(|s| {
            if !s.kinds.contains_key(*self) {
                return;
            }
            if let Some(attributes) = s.attributes.entry(*self) {
                attributes
                    .or_default()
                    .insert(name.to_owned(), value.to_owned());
            }
        });
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        NODE_STORAGE.with_borrow_mut(|s| s.attributes.get_mut(*self)?.shift_remove(name))
    }

    /// All attributes in the order they were first set.
    pub fn attributes(&self) -> Vec<(String, String)> {
        NODE_STORAGE.with_borrow(|s| {
            s.attributes
                .get(*self)
                .map(|attributes| {
                    attributes
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    // Tree structure

    pub fn parent(&self) -> Option<NodeId> {
        NODE_STORAGE.with_borrow(|s| s.parent.get(*self).copied())
    }

    /// The topmost ancestor, or this node if it has no parent.
    pub fn root(&self) -> NodeId {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn children(&self) -> Vec<NodeId> {
        NODE_STORAGE.with_borrow(|s| s.children.get(*self).cloned().unwrap_or_default())
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        NODE_STORAGE.with_borrow(|s| {
            let parent = s.parent.get(*self)?;
            let siblings = s.children.get(*parent)?;
            let index = siblings.iter().position(|c| c == self)?;
            siblings.get(index + 1).copied()
        })
    }

    pub fn append_child(&self, child: NodeId) {
        self.insert_before(child, None);
    }

    /// Inserts `child` under this node before `reference`, or at the end
    /// when `reference` is `None` or not a child of this node. The child is
    /// first detached from its current parent.
    pub fn insert_before(&self, child: NodeId, reference: Option<NodeId>) {
        if child == *self {
            return;
        }
        NODE_STORAGE.with_borrow_mut(|s| {
            if !s.kinds.contains_key(*self) || !s.kinds.contains_key(child) {
                return;
            }
            s.detach(child);
            let Some(children) = s.children.get_mut(*self) else {
                return;
            };
            let index = reference
                .and_then(|reference| children.iter().position(|c| *c == reference))
                .unwrap_or(children.len());
            children.insert(index, child);
            s.parent.insert(child, *self);
            s.markup.remove(*self);
        });
    }

    /// Takes this node out of its parent without freeing it.
    pub fn detach(&self) {
        NODE_STORAGE.with_borrow_mut(|s| s.detach(*self));
    }

    /// All descendants in document order, not including this node.
    pub fn descendants(&self) -> Vec<NodeId> {
        NODE_STORAGE.with_borrow(|s| {
            let mut subtree = s.subtree(*self);
            subtree.remove(0);
            subtree
        })
    }

    /// Descendant elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        NODE_STORAGE.with_borrow(|s| {
            s.subtree(*self)
                .into_iter()
                .skip(1)
                .filter(|id| matches!(s.kinds.get(*id), Some(NodeKind::Element(t)) if *t == tag))
                .collect()
        })
    }

    /// Copies this node and its subtree. Listeners are not copied.
    pub fn deep_clone(&self) -> NodeId {
        let copy = NODE_STORAGE.with_borrow_mut(|s| {
            let kind = s.kinds.get(*self)?.clone();
            let copy = s.insert(kind);
            if let Some(attributes) = s.attributes.get(*self).cloned() {
                s.attributes.insert(copy, attributes);
            }
            if let Some(text) = s.text.get(*self).cloned() {
                s.text.insert(copy, text);
            }
            if let Some(markup) = s.markup.get(*self).cloned() {
                s.markup.insert(copy, markup);
            }
            if let Some(properties) = s.properties.get(*self).cloned() {
                s.properties.insert(copy, properties);
            }
            Some(copy)
        });
        let Some(copy) = copy else {
            return *self;
        };
        let markup = NODE_STORAGE.with_borrow(|s| s.markup.get(copy).cloned());
        for child in self.children() {
            copy.append_child(child.deep_clone());
        }
        if let Some(markup) = markup {
            NODE_STORAGE.with_borrow_mut(|s| s.markup.insert(copy, markup));
        }
        copy
    }

    // Content

    /// Text of a text or comment node, or the concatenated text of all
    /// descendant text nodes of an element.
    pub fn text_content(&self) -> String {
        NODE_STORAGE.with_borrow(|s| match s.kinds.get(*self) {
            Some(NodeKind::Element(_)) => s
                .subtree(*self)
                .into_iter()
                .filter(|id| matches!(s.kinds.get(*id), Some(NodeKind::Text)))
                .filter_map(|id| s.text.get(id).map(String::as_str))
                .collect(),
            Some(_) => s.text.get(*self).cloned().unwrap_or_default(),
            None => String::new(),
        })
    }

    /// Replaces the character data of a text node, or all children of an
    /// element with a single text node.
    pub fn set_text_content(&self, text: &str) {
        let is_element = self.is_element();
        if !is_element {
            NODE_STORAGE.with_borrow_mut(|s| {
                if s.kinds.contains_key(*self) {
                    s.text.insert(*self, text.to_owned());
                }
            });
            return;
        }
        NODE_STORAGE.with_borrow_mut(|s| s.clear_children(*self));
        if !text.is_empty() {
            self.append_child(NodeId::text(text));
        }
    }

    /// Replaces the children of an element with raw markup. The markup is
    /// kept verbatim for [`NodeId::inner_html`]; the element's text content
    /// becomes the markup with its tags stripped.
    pub fn set_inner_html(&self, html: &str) {
        if !self.is_element() {
            return;
        }
        self.set_text_content(&strip_tags(html));
        NODE_STORAGE.with_borrow_mut(|s| s.markup.insert(*self, html.to_owned()));
    }

    pub fn inner_html(&self) -> String {
        if let Some(markup) = NODE_STORAGE.with_borrow(|s| s.markup.get(*self).cloned()) {
            return markup;
        }
        let mut out = String::new();
        for child in self.children() {
            child.write_html(&mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self.kind() {
            Some(NodeKind::Element(tag)) => {
                out.push('<');
                out.push_str(&tag);
                for (name, value) in self.attributes() {
                    out.push(' ');
                    out.push_str(&name);
                    out.push_str("=\"");
                    out.push_str(&escape(&value).replace('"', "&quot;"));
                    out.push('"');
                }
                out.push('>');
                out.push_str(&self.inner_html());
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
            Some(NodeKind::Text) => out.push_str(&escape(&self.text_content())),
            Some(NodeKind::Comment) => {
                out.push_str("<!--");
                out.push_str(&self.text_content());
                out.push_str("-->");
            }
            None => {}
        }
    }

    // Properties

    pub fn property(&self, name: &str) -> Value {
        NODE_STORAGE.with_borrow(|s| {
            s.properties
                .get(*self)
                .and_then(|properties| properties.get(name).cloned())
                .unwrap_or_default()
        })
    }

    pub fn set_property(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        NODE_STORAGE.with_borrow_mut(|s| {
            if !s.kinds.contains_key(*self) {
                return;
            }
            if let Some(properties) = s.properties.entry(*self) {
                properties.or_default().insert(name.to_owned(), value);
            }
        });
    }

    /// The `value` property, falling back to the `value` attribute.
    pub fn value(&self) -> String {
        match self.property("value") {
            Value::Null => self.attribute("value").unwrap_or_default(),
            value => value.to_display_string(),
        }
    }

    pub fn set_value(&self, value: &str) {
        self.set_property("value", value);
    }

    pub fn checked(&self) -> bool {
        self.property("checked").is_truthy()
    }

    pub fn set_checked(&self, checked: bool) {
        self.set_property("checked", checked);
    }

    pub fn disabled(&self) -> bool {
        self.property("disabled").is_truthy()
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.set_property("disabled", disabled);
    }

    pub fn hidden(&self) -> bool {
        self.property("hidden").is_truthy()
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.set_property("hidden", hidden);
    }

    /// The lower-cased `type` attribute of an input, `text` when unset.
    pub fn input_type(&self) -> String {
        self.attribute("type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_owned())
    }

    pub fn is_input_of_type(&self, input_type: &str) -> bool {
        self.tag().as_deref() == Some("input") && self.input_type() == input_type
    }

    // Classes

    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|class| class.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    /// Adds `class` when `on` is true, removes it otherwise.
    pub fn toggle_class(&self, class: &str, on: bool) {
        let mut classes = self.classes();
        let present = classes.iter().any(|c| c == class);
        if on == present {
            return;
        }
        if on {
            classes.push(class.to_owned());
        } else {
            classes.retain(|c| c != class);
        }
        self.set_attribute("class", &classes.join(" "));
    }

    // Events

    pub fn add_listener(&self, event: &str, listener: Listener) {
        NODE_STORAGE.with_borrow_mut(|s| {
            if !s.kinds.contains_key(*self) {
                return;
            }
            if let Some(listeners) = s.listeners.entry(*self) {
                listeners.or_default().push((event.to_owned(), listener));
            }
        });
    }

    pub fn remove_listener(&self, event: &str, listener: &Listener) {
        NODE_STORAGE.with_borrow_mut(|s| {
            if let Some(listeners) = s.listeners.get_mut(*self) {
                listeners.retain(|(name, l)| !(name == event && l.ptr_eq(listener)));
            }
        });
    }

    pub fn listener_count(&self, event: &str) -> usize {
        NODE_STORAGE.with_borrow(|s| {
            s.listeners
                .get(*self)
                .map_or(0, |listeners| listeners.iter().filter(|(name, _)| name == event).count())
        })
    }

    /// Delivers `event` to this node's listeners in registration order.
    pub fn dispatch(&self, event: &str) {
        let listeners = NODE_STORAGE.with_borrow(|s| {
            s.listeners
                .get(*self)
                .map(|listeners| {
                    listeners
                        .iter()
                        .filter(|(name, _)| name == event)
                        .map(|(_, listener)| listener.clone())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        });
        let event = Event {
            name: event.to_owned(),
            target: *self,
        };
        for listener in listeners {
            listener.call(&event);
        }
    }

    /// Simulates a user click. Checkboxes toggle and radios become checked
    /// (unchecking same-named radios in the tree); either then receives
    /// `input` and `change` after `click`.
    pub fn click(&self) {
        let toggled = if self.is_input_of_type("checkbox") {
            self.set_checked(!self.checked());
            true
        } else if self.is_input_of_type("radio") && !self.checked() {
            self.check_radio();
            true
        } else {
            false
        };
        self.dispatch("click");
        if toggled {
            self.dispatch("input");
            self.dispatch("change");
        }
    }

    fn check_radio(&self) {
        self.set_checked(true);
        let Some(name) = self.attribute("name") else {
            return;
        };
        let root = self.root();
        let mut group = root.elements_by_tag("input");
        group.push(root);
        for other in group {
            if other != *self
                && other.is_input_of_type("radio")
                && other.attribute("name").as_deref() == Some(name.as_str())
            {
                other.set_checked(false);
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
