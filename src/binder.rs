use std::rc::Rc;

use tether_reactive::{Object, Value};

use crate::{FxIndexMap, binding::Binding};

/// The behavior behind one directive name.
///
/// `routine` renders a value onto the binding's node; the other hooks are
/// optional. Any `Fn(&Binding, &Value)` closure is a routine-only binder.
pub trait Binder {
    /// Bindings are applied in descending priority order. `None` sorts as 0.
    fn priority(&self) -> Option<i32> {
        None
    }

    /// A block binder takes over its element: nothing below it, and no
    /// other directive on it, is bound by the enclosing view.
    fn block(&self) -> bool {
        false
    }

    /// Whether [`View::publish`](crate::View::publish) should push this
    /// binder's [`value`](Binder::value) back into the model.
    fn publishes(&self) -> bool {
        false
    }

    fn bind(&self, _binding: &Binding) {}

    fn unbind(&self, _binding: &Binding) {}

    fn routine(&self, binding: &Binding, value: &Value);

    fn update(&self, _binding: &Binding, _models: &Object) {}

    /// The node-side value published back to the model.
    fn value(&self, _binding: &Binding) -> Value {
        Value::Null
    }
}

impl<F> Binder for F
where
    F: Fn(&Binding, &Value),
{
    fn routine(&self, binding: &Binding, value: &Value) {
        self(binding, value)
    }
}

/// Binders by directive name.
///
/// A name ending in `*` (such as `each-*`) is a wildcard matching any
/// directive that starts with the part before the star; the rest of the
/// directive becomes the binding's argument. The bare name `*` is the
/// catch-all used when nothing else matches.
#[derive(Clone, Default)]
pub struct BinderRegistry(FxIndexMap<String, Rc<dyn Binder>>);

impl BinderRegistry {
    pub fn insert(&mut self, name: &str, binder: impl Binder + 'static) {
        self.0.insert(name.to_owned(), Rc::new(binder));
    }

    pub fn insert_rc(&mut self, name: &str, binder: Rc<dyn Binder>) {
        self.0.insert(name.to_owned(), binder);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Binder>> {
        self.0.get(name).cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn Binder>> {
        self.0.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Finds the binder for `directive`: exact name, then wildcards in
    /// registration order, then the catch-all. Returns the binder and the
    /// wildcard argument, if any.
    pub fn resolve(&self, directive: &str) -> Option<(Rc<dyn Binder>, Option<String>)> {
        if let Some(binder) = self.0.get(directive) {
            return Some((binder.clone(), None));
        }
        let wildcard = self.0.iter().find_map(|(name, binder)| {
            let head = name.strip_suffix('*').filter(|head| !head.is_empty())?;
            let arg = directive.strip_prefix(head)?;
            Some((binder.clone(), Some(arg.to_owned())))
        });
        wildcard.or_else(|| self.0.get("*").map(|binder| (binder.clone(), None)))
    }

    pub(crate) fn fill_from(&mut self, other: &BinderRegistry) {
        for (name, binder) in &other.0 {
            if !self.0.contains_key(name) {
                self.0.insert(name.clone(), binder.clone());
            }
        }
    }
}
