use tether_reactive::{Object, Value};
use tracing::{trace, warn};

use crate::{binder::Binder, binding::Binding, node::NodeId, view::View};

/// The `each-*` binder: stamps one child view per item of a list.
///
/// The template element is replaced by a comment marker when bound. Each
/// child view binds a deep copy of the template in a scope holding
/// `{<item name>: item, <index property>: index}` over the parent scope.
///
/// On every change the children are reconciled against the new list by
/// identity: a child already showing the item at its position is kept and
/// only its index updated; a later child showing the item is moved into
/// place; anything else gets a freshly stamped child. Children left over
/// at the end are unbound and removed.
#[derive(Clone, Copy, Debug, Default)]
pub struct EachBinder;

struct IterationState {
    marker: NodeId,
    template: NodeId,
    /// Whether the template was lifted out of the tree at bind time, so
    /// nothing but this state can reach it.
    owns_template: bool,
    iterated: Vec<View>,
}

impl Drop for IterationState {
    fn drop(&mut self) {
        if self.owns_template && self.template.parent().is_none() {
            self.template.remove();
        }
        if self.marker.parent().is_none() {
            self.marker.remove();
        }
    }
}

impl EachBinder {
    fn children(binding: &Binding) -> Vec<View> {
        binding
            .with_state(|state: &mut IterationState| state.iterated.clone())
            .unwrap_or_default()
    }
}

impl Binder for EachBinder {
    fn priority(&self) -> Option<i32> {
        Some(4000)
    }

    fn block(&self) -> bool {
        true
    }

    fn bind(&self, binding: &Binding) {
        if binding
            .with_state(|_: &mut IterationState| ())
            .is_some()
        {
            for view in Self::children(binding) {
                view.bind();
            }
            return;
        }

        let template = binding.node();
        let marker = NodeId::comment(&format!(" tether: {} ", binding.name()));
        let owns_template = match template.parent() {
            Some(parent) => {
                parent.insert_before(marker, Some(template));
                template.detach();
                true
            }
            None => {
                warn!(
                    directive = binding.name(),
                    "iteration template has no parent, stamped items stay detached"
                );
                false
            }
        };
        binding.set_state(IterationState {
            marker,
            template,
            owns_template,
            iterated: Vec::new(),
        });
    }

    fn unbind(&self, binding: &Binding) {
        for view in Self::children(binding) {
            view.unbind();
        }
    }

    fn routine(&self, binding: &Binding, value: &Value) {
        let Some(mut state) = binding.take_state::<IterationState>() else {
            trace!(
                directive = binding.name(),
                "iteration changed while reconciling, skipping"
            );
            return;
        };
        reconcile(binding, &mut state, value);
        binding.set_state(state);
    }

    fn update(&self, binding: &Binding, models: &Object) {
        let data = Object::new();
        for key in models.keys() {
            if binding.arg() != Some(key.as_str()) {
                data.set(&key, models.get(&key));
            }
        }
        for view in Self::children(binding) {
            view.update(&data);
        }
    }
}

fn reconcile(binding: &Binding, state: &mut IterationState, value: &Value) {
    let items = match value {
        Value::List(list) => list.to_vec(),
        Value::Null => Vec::new(),
        other => {
            trace!(?other, "iterating a value that is not a list as empty");
            Vec::new()
        }
    };
    let item_name = binding.arg().unwrap_or_default();
    let options = binding.options();
    let index_property = state
        .template
        .attribute(&options.index_attribute)
        .unwrap_or_else(|| options.index_property.clone());
    trace!(
        directive = binding.name(),
        items = items.len(),
        views = state.iterated.len(),
        "reconciling iteration"
    );

    for (index, item) in items.iter().enumerate() {
        let Some(current) = state.iterated.get(index).cloned() else {
            let previous = state
                .iterated
                .last()
                .and_then(View::first_node)
                .unwrap_or(state.marker);
            let view = stamp(binding, state.template, item_name, &index_property, index, item);
            if let (Some(parent), Some(node)) = (previous.parent(), view.first_node()) {
                parent.insert_before(node, previous.next_sibling());
            }
            state.iterated.push(view);
            continue;
        };

        if current.models().get(item_name) == *item {
            current.models().set(&index_property, index);
            continue;
        }

        let found = state
            .iterated
            .iter()
            .skip(index + 1)
            .position(|view| view.models().get(item_name) == *item)
            .map(|offset| index + 1 + offset);
        let next = match found {
            Some(found) => state.iterated.remove(found),
            None => stamp(binding, state.template, item_name, &index_property, index, item),
        };
        if let (Some(parent), Some(node)) = (state.marker.parent(), next.first_node()) {
            parent.insert_before(node, current.first_node());
        }
        next.models().set(&index_property, index);
        state.iterated.insert(index, next);
    }

    while state.iterated.len() > items.len() {
        let Some(view) = state.iterated.pop() else {
            break;
        };
        view.unbind();
        if let Some(node) = view.first_node() {
            node.remove();
        }
    }
}

fn stamp(
    binding: &Binding,
    template: NodeId,
    item_name: &str,
    index_property: &str,
    index: usize,
    item: &Value,
) -> View {
    let data = Object::new();
    data.set(index_property, index);
    data.set(item_name, item.clone());
    let view = View::new(
        [template.deep_clone()],
        binding.scope().child(data),
        binding.view_options().clone(),
    );
    view.bind();
    view
}
