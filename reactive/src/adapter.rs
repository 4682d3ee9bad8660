use tracing::trace;

use crate::{
    callback::Callback,
    observer,
    value::Value,
};

/// Observe/get/set access to keyed properties of some kind of model.
///
/// Keypath segments pick their adapter by the interface character that
/// precedes them, so one keypath can cross from plain objects into a
/// custom model (`user:name` reads `name` through the `:` adapter).
pub trait Adapter {
    fn observe(&self, target: &Value, key: &str, callback: &Callback);

    fn unobserve(&self, target: &Value, key: &str, callback: &Callback);

    fn get(&self, target: &Value, key: &str) -> Value;

    fn set(&self, target: &Value, key: &str, value: Value);
}

/// The default adapter: structural access to [`Object`](crate::Object)
/// properties and [`List`](crate::List) indices, observed through
/// [`observer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyAdapter;

impl Adapter for PropertyAdapter {
    fn observe(&self, target: &Value, key: &str, callback: &Callback) {
        match target {
            Value::Object(obj) => observer::observe(obj, key, callback),
            Value::List(list) => observer::observe(list, key, callback),
            _ => {}
        }
    }

    fn unobserve(&self, target: &Value, key: &str, callback: &Callback) {
        match target {
            Value::Object(obj) => observer::unobserve(obj, key, callback),
            Value::List(list) => observer::unobserve(list, key, callback),
            _ => {}
        }
    }

    fn get(&self, target: &Value, key: &str) -> Value {
        match target {
            Value::Object(obj) => obj.get(key),
            Value::List(list) => observer::Observable::peek(list, key),
            _ => Value::Null,
        }
    }

    fn set(&self, target: &Value, key: &str, value: Value) {
        match target {
            Value::Object(obj) => obj.set(key, value),
            Value::List(list) => match key.parse::<usize>() {
                Ok(index) => list.set(index, value),
                Err(_) => trace!(key, "ignoring write to a non-index list key"),
            },
            _ => trace!(key, "ignoring write to a value without properties"),
        }
    }
}
