//! Stock binders.
//!
//! | directive    | routine                                                  |
//! |--------------|----------------------------------------------------------|
//! | `text`       | replaces the node's text                                 |
//! | `html`       | replaces the element's children with markup              |
//! | `value`      | sets the input value, publishes on `input`               |
//! | `checked`    | checks the input (radios compare values), publishes      |
//! | `unchecked`  | the inverse of `checked`                                 |
//! | `show`/`hide`| toggles the `hidden` property                            |
//! | `enabled`/`disabled` | toggles the `disabled` property                  |
//! | `class-*`    | toggles the class named by the argument                  |
//! | `each-*`     | see [`EachBinder`](crate::EachBinder)                    |
//!
//! [`AttributeBinder`] is not registered by default; register it as `*` to
//! turn every unknown directive into a plain attribute.

use tether_reactive::Value;

use crate::{
    binder::{Binder, BinderRegistry},
    binding::Binding,
    iteration::EachBinder,
    node::{Listener, NodeId},
};

/// Attribute naming the event a `value` binding publishes on.
pub const EVENT_ATTRIBUTE: &str = "event-name";

pub(crate) fn stock() -> BinderRegistry {
    let mut binders = BinderRegistry::default();
    binders.insert("text", TextBinder);
    binders.insert("html", HtmlBinder);
    binders.insert("value", ValueBinder);
    binders.insert("checked", CheckedBinder { inverted: false });
    binders.insert("unchecked", CheckedBinder { inverted: true });
    binders.insert("show", HiddenBinder { inverted: true });
    binders.insert("hide", HiddenBinder { inverted: false });
    binders.insert("enabled", DisabledBinder { inverted: true });
    binders.insert("disabled", DisabledBinder { inverted: false });
    binders.insert("class-*", ClassBinder);
    binders.insert("each-*", EachBinder);
    binders
}

/// A node listener that publishes `binding` when fired.
struct PublishListener {
    event: String,
    listener: Listener,
}

impl PublishListener {
    fn install(binding: &Binding, event: String) {
        let weak = binding.downgrade();
        let listener = Listener::new(move |_| {
            if let Some(binding) = weak.upgrade() {
                binding.publish();
            }
        });
        binding.node().add_listener(&event, listener.clone());
        binding.set_state(PublishListener { event, listener });
    }

    fn uninstall(binding: &Binding) {
        if let Some(state) = binding.take_state::<PublishListener>() {
            binding.node().remove_listener(&state.event, &state.listener);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TextBinder;

impl Binder for TextBinder {
    fn routine(&self, binding: &Binding, value: &Value) {
        binding.node().set_text_content(&value.to_display_string());
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlBinder;

impl Binder for HtmlBinder {
    fn routine(&self, binding: &Binding, value: &Value) {
        binding.node().set_inner_html(&value.to_display_string());
    }
}

/// Two-way binding of an input's value.
///
/// Publishes on the event named by the element's `event-name` attribute,
/// `change` for selects and `input` otherwise. On radios the bound value
/// becomes the `value` attribute and nothing is published; pair the radio
/// with `checked` instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueBinder;

impl Binder for ValueBinder {
    fn priority(&self) -> Option<i32> {
        Some(3000)
    }

    fn publishes(&self) -> bool {
        true
    }

    fn bind(&self, binding: &Binding) {
        let node = binding.node();
        if node.is_input_of_type("radio") {
            return;
        }
        let event = node.attribute(EVENT_ATTRIBUTE).unwrap_or_else(|| {
            if node.tag().as_deref() == Some("select") {
                "change".to_owned()
            } else {
                "input".to_owned()
            }
        });
        PublishListener::install(binding, event);
    }

    fn unbind(&self, binding: &Binding) {
        PublishListener::uninstall(binding);
    }

    fn routine(&self, binding: &Binding, value: &Value) {
        let node = binding.node();
        let value = value.to_display_string();
        if node.is_input_of_type("radio") {
            node.set_attribute("value", &value);
        } else if node.value() != value {
            node.set_value(&value);
        }
    }

    fn value(&self, binding: &Binding) -> Value {
        Value::from(binding.node().value())
    }
}

/// `checked` and `unchecked`. A radio is checked when its value equals the
/// bound value and publishes its value when picked; a checkbox follows the
/// truthiness of the bound value and publishes a bool.
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckedBinder {
    inverted: bool,
}

impl Binder for CheckedBinder {
    fn priority(&self) -> Option<i32> {
        Some(2000)
    }

    fn publishes(&self) -> bool {
        true
    }

    fn bind(&self, binding: &Binding) {
        PublishListener::install(binding, "change".to_owned());
    }

    fn unbind(&self, binding: &Binding) {
        PublishListener::uninstall(binding);
    }

    fn routine(&self, binding: &Binding, value: &Value) {
        let node = binding.node();
        let checked = if node.is_input_of_type("radio") {
            node.value() == value.to_display_string()
        } else {
            value.is_truthy()
        };
        node.set_checked(checked != self.inverted);
    }

    fn value(&self, binding: &Binding) -> Value {
        let node = binding.node();
        if node.is_input_of_type("radio") {
            Value::from(node.value())
        } else {
            Value::Bool(node.checked() != self.inverted)
        }
    }
}

/// `show` and `hide`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HiddenBinder {
    inverted: bool,
}

impl Binder for HiddenBinder {
    fn routine(&self, binding: &Binding, value: &Value) {
        binding.node().set_hidden(value.is_truthy() != self.inverted);
    }
}

/// `enabled` and `disabled`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledBinder {
    inverted: bool,
}

impl Binder for DisabledBinder {
    fn routine(&self, binding: &Binding, value: &Value) {
        binding.node().set_disabled(value.is_truthy() != self.inverted);
    }
}

/// `class-<name>`: adds `<name>` to the class list while the value is
/// truthy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassBinder;

impl Binder for ClassBinder {
    fn routine(&self, binding: &Binding, value: &Value) {
        if let Some(class) = binding.arg() {
            binding.node().toggle_class(class, value.is_truthy());
        }
    }
}

/// Sets the attribute named after the directive to the bound value,
/// removing it when the value is `Null`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttributeBinder;

impl Binder for AttributeBinder {
    fn routine(&self, binding: &Binding, value: &Value) {
        set_or_remove(binding.node(), binding.name(), value);
    }
}

fn set_or_remove(node: NodeId, attribute: &str, value: &Value) {
    if value.is_null() {
        node.remove_attribute(attribute);
    } else {
        node.set_attribute(attribute, &value.to_display_string());
    }
}
