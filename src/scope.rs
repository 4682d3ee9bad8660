use std::rc::Rc;

use tether_reactive::Object;

/// The models a view binds against, layered over the scope of the view
/// that created it.
///
/// Iteration stamps a child scope per item holding the item and its index;
/// every other name falls through to the ancestors.
#[derive(Clone, Debug)]
pub struct Scope(Rc<ScopeInner>);

#[derive(Debug)]
struct ScopeInner {
    models: Object,
    parent: Option<Scope>,
}

impl Scope {
    pub fn new(models: Object) -> Self {
        Self(Rc::new(ScopeInner {
            models,
            parent: None,
        }))
    }

    /// A scope whose lookups fall back to `self`.
    pub fn child(&self, models: Object) -> Self {
        Self(Rc::new(ScopeInner {
            models,
            parent: Some(self.clone()),
        }))
    }

    /// The models owned by this scope, not including ancestors.
    pub fn models(&self) -> &Object {
        &self.0.models
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    /// The models a keypath starting with `key` is rooted at: the nearest
    /// scope that defines `key`, or the outermost scope if none does.
    pub fn resolve(&self, key: &str) -> Object {
        let mut current = self;
        while !current.0.models.contains_key(key)
            && let Some(parent) = &current.0.parent
        {
            current = parent;
        }
        current.0.models.clone()
    }
}
