use tether_reactive::Value;

use crate::formatter::{Formatter, FormatterRegistry};

pub(crate) fn stock() -> FormatterRegistry {
    let mut formatters = FormatterRegistry::default();
    formatters.insert("watch", Watch);
    formatters.insert("not", Not);
    formatters.insert("negate", Not);
    formatters
}

/// Passes the value through. Its keypath arguments are still observed, so
/// `value | watch other` re-renders when `other` changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Watch;

impl Formatter for Watch {
    fn read(&self, value: Value, _args: &[Value]) -> Value {
        value
    }
}

/// Boolean negation of the value's truthiness, both ways.
#[derive(Clone, Copy, Debug, Default)]
pub struct Not;

impl Formatter for Not {
    fn read(&self, value: Value, _args: &[Value]) -> Value {
        Value::Bool(!value.is_truthy())
    }

    fn publish(&self, value: Value, _args: &[Value]) -> Value {
        Value::Bool(!value.is_truthy())
    }
}
