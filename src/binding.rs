use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tether_reactive::{Callback, Object, Value};
use tracing::{trace, warn};

use crate::{
    binder::Binder,
    error::Result,
    formatter::FormatterCall,
    keypath::KeypathObserver,
    node::NodeId,
    options::{Options, ViewOptions},
    parser::{Target, parse_target, split_declaration, tokenize_keypath},
    scope::Scope,
};

/// One directive bound to one node in one scope.
///
/// A binding resolves its declaration (`keypath | formatter args | ...`)
/// against the scope, keeps the subscriptions for the keypath and for any
/// keypath formatter arguments, and calls its binder's routine whenever
/// one of them fires.
#[derive(Clone, Debug)]
pub struct Binding(Rc<BindingInner>);

#[derive(educe::Educe)]
#[educe(Debug)]
struct BindingInner {
    #[educe(Debug(ignore))]
    options: Rc<ViewOptions>,
    scope: Scope,
    node: NodeId,
    name: String,
    arg: Option<String>,
    #[educe(Debug(ignore))]
    binder: Rc<dyn Binder>,
    declaration: String,
    target: Target,
    formatters: SmallVec<[FormatterCall; 2]>,
    observer: RefCell<Option<KeypathObserver>>,
    /// Observers of keypath formatter arguments by (formatter, argument).
    formatter_observers: RefCell<FxHashMap<(usize, usize), KeypathObserver>>,
    state: RefCell<Option<Box<dyn Any>>>,
    bound: Cell<bool>,
    callback: Callback,
}

impl Binding {
    /// Parses `declaration` and builds an unbound binding.
    pub(crate) fn new(
        options: Rc<ViewOptions>,
        scope: Scope,
        node: NodeId,
        name: &str,
        binder: Rc<dyn Binder>,
        arg: Option<String>,
        declaration: &str,
    ) -> Result<Self> {
        let (target, pipes) = split_declaration(declaration)?;
        let target = parse_target(&target)?;
        if let Target::Keypath(keypath) = &target {
            tokenize_keypath(
                keypath,
                |c| options.adapters.is_interface(c),
                options.options.root_interface,
            )?;
        }
        let formatters = pipes
            .iter()
            .map(|pipe| FormatterCall::parse(pipe, &options.formatters))
            .collect::<Result<SmallVec<[FormatterCall; 2]>>>()?;
        for call in &formatters {
            for arg in &call.args {
                if let Target::Keypath(keypath) = arg {
                    tokenize_keypath(
                        keypath,
                        |c| options.adapters.is_interface(c),
                        options.options.root_interface,
                    )?;
                }
            }
        }

        Ok(Self(Rc::new_cyclic(|weak: &Weak<BindingInner>| {
            let weak = weak.clone();
            BindingInner {
                options,
                scope,
                node,
                name: name.to_owned(),
                arg,
                binder,
                declaration: declaration.to_owned(),
                target,
                formatters,
                observer: RefCell::new(None),
                formatter_observers: RefCell::new(FxHashMap::default()),
                state: RefCell::new(None),
                bound: Cell::new(false),
                callback: Callback::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        Binding(inner).sync();
                    }
                }),
            }
        })))
    }

    pub fn node(&self) -> NodeId {
        self.0.node
    }

    /// The directive name without the prefix, e.g. `text` or `each-item`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// What a wildcard binder matched, e.g. `item` for `each-item`.
    pub fn arg(&self) -> Option<&str> {
        self.0.arg.as_deref()
    }

    pub fn declaration(&self) -> &str {
        &self.0.declaration
    }

    /// The bound keypath, or `None` when the declaration is a constant.
    pub fn keypath(&self) -> Option<&str> {
        match &self.0.target {
            Target::Keypath(keypath) => Some(keypath),
            Target::Primitive(_) => None,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }

    pub fn options(&self) -> &Options {
        &self.0.options.options
    }

    pub fn view_options(&self) -> &Rc<ViewOptions> {
        &self.0.options
    }

    pub fn binder(&self) -> &Rc<dyn Binder> {
        &self.0.binder
    }

    pub fn priority(&self) -> i32 {
        self.0.binder.priority().unwrap_or_default()
    }

    pub fn is_bound(&self) -> bool {
        self.0.bound.get()
    }

    pub fn observer(&self) -> Option<KeypathObserver> {
        self.0.observer.borrow().clone()
    }

    /// The unformatted value currently bound.
    pub fn value(&self) -> Value {
        match &self.0.target {
            Target::Primitive(value) => value.clone(),
            Target::Keypath(_) => self.observer().map(|o| o.value()).unwrap_or_default(),
        }
    }

    /// Subscribes, runs the binder's `bind` hook and, when preloading,
    /// renders the current value. Binding twice is a no-op.
    pub fn bind(&self) {
        if self.0.bound.replace(true) {
            return;
        }
        if let Target::Keypath(keypath) = &self.0.target {
            match KeypathObserver::new(
                self.0.options.clone(),
                &self.0.scope,
                keypath,
                self.0.callback.clone(),
            ) {
                Ok(observer) => *self.0.observer.borrow_mut() = Some(observer),
                Err(err) => warn!(%err, "binding without a keypath observer"),
            }
        }
        self.observe_formatter_arguments();
        self.0.binder.bind(self);
        if self.0.options.options.preload_data {
            self.sync();
        }
    }

    /// Runs the binder's `unbind` hook and drops every subscription.
    pub fn unbind(&self) {
        if !self.0.bound.replace(false) {
            return;
        }
        self.0.binder.unbind(self);
        if let Some(observer) = self.0.observer.take() {
            observer.unobserve();
        }
        let observers = self.0.formatter_observers.take();
        for observer in observers.into_values() {
            observer.unobserve();
        }
    }

    /// Re-renders from the current model value.
    pub fn sync(&self) {
        if !self.is_bound() {
            trace!(name = self.name(), "ignoring change for an unbound binding");
            return;
        }
        self.set(self.value());
    }

    /// Formats `value` and hands it to the binder's routine.
    pub fn set(&self, value: Value) {
        let formatted = self.formatted_value(value);
        self.0.binder.routine(self, &formatted);
    }

    /// Writes the binder's node-side value back through the keypath,
    /// applying each formatter's `publish` in reverse order.
    pub fn publish(&self) {
        let Some(observer) = self.observer() else {
            return;
        };
        let mut value = self.0.binder.value(self);
        for (index, call) in self.0.formatters.iter().enumerate().rev() {
            if let Some(formatter) = &call.formatter {
                let args = self.formatter_args(index, call);
                value = formatter.publish(value, &args);
            }
        }
        observer.set_value(value);
    }

    pub fn update(&self, models: &Object) {
        self.0.binder.update(self, models);
    }

    /// Applies the formatter pipeline left to right.
    pub fn formatted_value(&self, value: Value) -> Value {
        self.0
            .formatters
            .iter()
            .enumerate()
            .fold(value, |value, (index, call)| match &call.formatter {
                Some(formatter) => {
                    let args = self.formatter_args(index, call);
                    formatter.read(value, &args)
                }
                None => value,
            })
    }

    fn formatter_args(&self, index: usize, call: &FormatterCall) -> SmallVec<[Value; 2]> {
        let observers = self.0.formatter_observers.borrow();
        call.args
            .iter()
            .enumerate()
            .map(|(arg_index, arg)| match arg {
                Target::Primitive(value) => value.clone(),
                Target::Keypath(_) => observers
                    .get(&(index, arg_index))
                    .map(KeypathObserver::value)
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn observe_formatter_arguments(&self) {
        for (index, call) in self.0.formatters.iter().enumerate() {
            for (arg_index, arg) in call.args.iter().enumerate() {
                let Target::Keypath(keypath) = arg else {
                    continue;
                };
                match KeypathObserver::new(
                    self.0.options.clone(),
                    &self.0.scope,
                    keypath,
                    self.0.callback.clone(),
                ) {
                    Ok(observer) => {
                        self.0
                            .formatter_observers
                            .borrow_mut()
                            .insert((index, arg_index), observer);
                    }
                    Err(err) => warn!(%err, "formatter argument not observed"),
                }
            }
        }
    }

    /// Stores per-binding binder state, replacing any previous state.
    pub fn set_state<T: Any>(&self, state: T) {
        *self.0.state.borrow_mut() = Some(Box::new(state));
    }

    pub fn with_state<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut state = self.0.state.borrow_mut();
        state.as_mut()?.downcast_mut::<T>().map(f)
    }

    /// Moves the binder state out, leaving none behind.
    pub fn take_state<T: Any>(&self) -> Option<T> {
        let boxed = self.0.state.borrow_mut().take()?;
        match boxed.downcast::<T>() {
            Ok(state) => Some(*state),
            Err(other) => {
                *self.0.state.borrow_mut() = Some(other);
                None
            }
        }
    }

    pub fn ptr_eq(&self, other: &Binding) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakBinding {
        WeakBinding(Rc::downgrade(&self.0))
    }
}

/// A handle to a [`Binding`] that does not keep it alive, for node
/// listeners stored in the binding's own state.
#[derive(Clone)]
pub struct WeakBinding(Weak<BindingInner>);

impl WeakBinding {
    pub fn upgrade(&self) -> Option<Binding> {
        self.0.upgrade().map(Binding)
    }
}
