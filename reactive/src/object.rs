use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    id::ObjectId,
    observer::{self, Observable},
    runtime::FxIndexMap,
    value::Value,
};

type Getter = Rc<dyn Fn() -> Value>;
type Setter = Rc<dyn Fn(Value)>;

enum Property {
    Data {
        value: Value,
        configurable: bool,
        /// Set once the observer took over writes to this property.
        intercepted: bool,
    },
    Accessor {
        get: Getter,
        set: Option<Setter>,
    },
}

struct ObjectInner {
    id: ObjectId,
    props: RefCell<FxIndexMap<String, Property>>,
}

/// A keyed bag of properties with identity.
///
/// Writes through [`Object::set`] are intercepted once the property is
/// observed: unchanged writes are dropped and changed writes synchronously
/// notify every subscriber before `set` returns.
///
/// Properties defined with [`Object::define_accessor`] or
/// [`Object::define_locked`] are never intercepted. They can still be
/// observed, but whoever changes them must call [`observer::notify`].
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    pub fn new() -> Self {
        Self(Rc::new(ObjectInner {
            id: ObjectId::next(),
            props: RefCell::new(FxIndexMap::default()),
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Reads `key`, returning [`Value::Null`] when it is absent.
    pub fn get(&self, key: &str) -> Value {
        let getter = {
            let props = self.0.props.borrow();
            match props.get(key) {
                Some(Property::Data { value, .. }) => return value.clone(),
                Some(Property::Accessor { get, .. }) => get.clone(),
                None => return Value::Null,
            }
        };
        getter()
    }

    /// Writes `key`.
    ///
    /// On an intercepted property an equal value is a no-op; a different
    /// value notifies subscribers before returning.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut changed = None;
        let mut setter = None;
        {
            let mut props = self.0.props.borrow_mut();
            match props.get_mut(key) {
                Some(Property::Data {
                    value: current,
                    intercepted: true,
                    ..
                }) => {
                    if *current != value {
                        let old = std::mem::replace(current, value.clone());
                        changed = Some((old, value));
                    }
                }
                Some(Property::Data { value: current, .. }) => *current = value,
                Some(Property::Accessor { set, .. }) => {
                    setter = set.clone().map(|set| (set, value));
                }
                None => {
                    props.insert(
                        key.to_owned(),
                        Property::Data {
                            value,
                            configurable: true,
                            intercepted: false,
                        },
                    );
                }
            }
        }

        if let Some((old, new)) = changed {
            observer::property_changed(self.id(), key, &old, &new);
        } else if let Some((set, value)) = setter {
            set(value);
        }
    }

    /// Defines `key` as a computed property. Accessor properties are not
    /// intercepted by the observer.
    pub fn define_accessor(
        &self,
        key: &str,
        get: impl Fn() -> Value + 'static,
        set: Option<Box<dyn Fn(Value)>>,
    ) {
        self.0.props.borrow_mut().insert(
            key.to_owned(),
            Property::Accessor {
                get: Rc::new(get),
                set: set.map(Rc::from),
            },
        );
    }

    /// Defines `key` as a writable but non-configurable data property,
    /// which the observer leaves alone.
    pub fn define_locked(&self, key: &str, value: impl Into<Value>) {
        self.0.props.borrow_mut().insert(
            key.to_owned(),
            Property::Data {
                value: value.into(),
                configurable: false,
                intercepted: false,
            },
        );
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.props.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.props.borrow().is_empty()
    }

    /// Whether writes to `key` are currently intercepted.
    pub fn is_intercepted(&self, key: &str) -> bool {
        matches!(
            self.0.props.borrow().get(key),
            Some(Property::Data {
                intercepted: true,
                ..
            })
        )
    }
}

impl Observable for Object {
    fn id(&self) -> ObjectId {
        self.0.id
    }

    fn intercept(&self, key: &str) -> bool {
        let mut props = self.0.props.borrow_mut();
        match props.get_mut(key) {
            Some(Property::Data {
                intercepted: true, ..
            }) => true,
            Some(Property::Data {
                configurable: true,
                intercepted,
                ..
            }) => {
                *intercepted = true;
                true
            }
            Some(_) => false,
            None => {
                props.insert(
                    key.to_owned(),
                    Property::Data {
                        value: Value::Null,
                        configurable: true,
                        intercepted: true,
                    },
                );
                true
            }
        }
    }

    fn peek(&self, key: &str) -> Value {
        self.get(key)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let obj = Object::new();
        {
            let mut props = obj.0.props.borrow_mut();
            for (key, value) in iter {
                props.insert(
                    key.into(),
                    Property::Data {
                        value: value.into(),
                        configurable: true,
                        intercepted: false,
                    },
                );
            }
        }
        obj
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.0.id)
            .field("keys", &self.keys())
            .finish()
    }
}
