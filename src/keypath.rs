use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use smallvec::SmallVec;
use tether_reactive::{Adapter, Callback, Value};
use tracing::trace;

use crate::{
    FxIndexMap,
    error::Result,
    options::ViewOptions,
    parser::{KeyToken, tokenize_keypath},
    scope::Scope,
};

/// Adapters keyed by the interface character that selects them.
#[derive(Clone, Default)]
pub struct AdapterRegistry(FxIndexMap<char, Rc<dyn Adapter>>);

impl AdapterRegistry {
    pub fn insert(&mut self, interface: char, adapter: impl Adapter + 'static) {
        self.0.insert(interface, Rc::new(adapter));
    }

    pub fn get(&self, interface: char) -> Option<Rc<dyn Adapter>> {
        self.0.get(&interface).cloned()
    }

    pub fn is_interface(&self, c: char) -> bool {
        self.0.contains_key(&c)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = char> + '_ {
        self.0.keys().copied()
    }

    /// Adds every adapter of `other` whose interface is not registered yet.
    pub(crate) fn fill_from(&mut self, other: &AdapterRegistry) {
        for (interface, adapter) in &other.0 {
            self.0.entry(*interface).or_insert_with(|| adapter.clone());
        }
    }
}

/// Observes a keypath such as `user.address:city` from a scope.
///
/// Every intermediate segment is observed with the observer's own
/// callback, so when an intermediate object is replaced the chain is
/// re-linked: stale subscriptions are dropped, new ones installed, and the
/// dependent callback fires if the final value changed. The final key is
/// observed with the dependent callback directly.
#[derive(Clone)]
pub struct KeypathObserver(Rc<ObserverInner>);

struct ObserverInner {
    keypath: String,
    options: Rc<ViewOptions>,
    tokens: SmallVec<[KeyToken; 4]>,
    key: KeyToken,
    root: Value,
    /// The object reached at each intermediate segment.
    object_path: RefCell<Vec<Value>>,
    /// The object holding the final key.
    target: RefCell<Value>,
    callback: Callback,
    relink: Callback,
}

impl KeypathObserver {
    pub fn new(
        options: Rc<ViewOptions>,
        scope: &Scope,
        keypath: &str,
        callback: Callback,
    ) -> Result<Self> {
        let (tokens, key) = tokenize_keypath(
            keypath,
            |c| options.adapters.is_interface(c),
            options.options.root_interface,
        )?;
        let first = tokens.first().unwrap_or(&key);
        let root = Value::Object(scope.resolve(&first.path));

        let inner = Rc::new_cyclic(|weak: &Weak<ObserverInner>| {
            let weak = weak.clone();
            ObserverInner {
                keypath: keypath.to_owned(),
                options,
                tokens,
                key,
                root,
                object_path: RefCell::new(Vec::new()),
                target: RefCell::new(Value::Null),
                callback,
                relink: Callback::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        KeypathObserver(inner).sync();
                    }
                }),
            }
        });
        let observer = KeypathObserver(inner);
        let target = observer.realize();
        if target.is_observable() {
            observer.subscribe(&observer.0.key, &target, &observer.0.callback);
        }
        *observer.0.target.borrow_mut() = target;
        Ok(observer)
    }

    pub fn keypath(&self) -> &str {
        &self.0.keypath
    }

    /// The object holding the final key, or `Null` if the chain is broken.
    pub fn target(&self) -> Value {
        self.0.target.borrow().clone()
    }

    /// The current value at the keypath.
    pub fn value(&self) -> Value {
        let target = self.target();
        if target.is_observable() {
            self.read(&self.0.key, &target)
        } else {
            Value::Null
        }
    }

    /// Writes through the keypath. Ignored while the chain is broken.
    pub fn set_value(&self, value: Value) {
        let target = self.target();
        if !target.is_observable() {
            trace!(keypath = self.0.keypath, "dropping write through a broken keypath");
            return;
        }
        if let Some(adapter) = self.0.options.adapters.get(self.0.key.interface) {
            adapter.set(&target, &self.0.key.path, value);
        }
    }

    /// Drops every subscription held by this observer.
    pub fn unobserve(&self) {
        let path = self.0.object_path.take();
        for (token, object) in self.0.tokens.iter().zip(&path) {
            self.unsubscribe(token, object, &self.0.relink);
        }
        let target = self.0.target.replace(Value::Null);
        if target.is_observable() {
            self.unsubscribe(&self.0.key, &target, &self.0.callback);
        }
    }

    /// Re-links after an intermediate segment changed.
    fn sync(&self) {
        let next = self.realize();
        let target = self.target();
        if next != target {
            trace!(keypath = self.0.keypath, "keypath re-linked");
            if target.is_observable() {
                self.unsubscribe(&self.0.key, &target, &self.0.callback);
            }
            if next.is_observable() {
                self.subscribe(&self.0.key, &next, &self.0.callback);
            }
            let old = self.value();
            *self.0.target.borrow_mut() = next;
            if self.value() != old {
                self.0.callback.call();
            }
        }
    }

    /// Walks the intermediate segments, moving subscriptions to whatever
    /// objects are reachable now, and returns the object holding the key.
    fn realize(&self) -> Value {
        let inner = &*self.0;
        let mut path = inner.object_path.take();
        let mut current = inner.root.clone();
        let mut unreached = None;

        for (index, token) in inner.tokens.iter().enumerate() {
            if current.is_observable() {
                match path.get(index) {
                    Some(prev) if *prev != current => {
                        self.unsubscribe(token, prev, &inner.relink);
                        self.subscribe(token, &current, &inner.relink);
                        path[index] = current.clone();
                    }
                    Some(_) => {}
                    None => {
                        self.subscribe(token, &current, &inner.relink);
                        path.push(current.clone());
                    }
                }
                current = self.read(token, &current);
            } else {
                unreached.get_or_insert(index);
                if let Some(prev) = path.get(index) {
                    self.unsubscribe(token, prev, &inner.relink);
                }
            }
        }

        if let Some(unreached) = unreached {
            path.truncate(unreached);
        }
        *inner.object_path.borrow_mut() = path;
        current
    }

    fn read(&self, token: &KeyToken, object: &Value) -> Value {
        self.0
            .options
            .adapters
            .get(token.interface)
            .map(|adapter| adapter.get(object, &token.path))
            .unwrap_or_default()
    }

    fn subscribe(&self, token: &KeyToken, object: &Value, callback: &Callback) {
        if let Some(adapter) = self.0.options.adapters.get(token.interface) {
            adapter.observe(object, &token.path, callback);
        }
    }

    fn unsubscribe(&self, token: &KeyToken, object: &Value, callback: &Callback) {
        if let Some(adapter) = self.0.options.adapters.get(token.interface) {
            adapter.unobserve(object, &token.path, callback);
        }
    }
}

impl std::fmt::Debug for KeypathObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypathObserver")
            .field("keypath", &self.0.keypath)
            .field("target", &self.0.target.borrow())
            .finish()
    }
}
