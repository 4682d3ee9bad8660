//! # Tether
//! Tether keeps a tree of nodes in sync with plain application models. Nodes
//! carry declarative directives such as `rv-text="user.name | upper"`; binding
//! a view resolves every directive against the models, renders it, and
//! re-renders it synchronously whenever an observed property changes.
//!
//! ## Example
//! ```rust
//! use tether::prelude::*;
//!
//! let user = Object::from_iter([("name", "Ada")]);
//! let models = Object::from_iter([("user", user.clone())]);
//!
//! let el = NodeId::element("p");
//! el.set_attribute("rv-text", "user.name");
//!
//! let view = tether::bind([el], models, BindOptions::new());
//! assert_eq!(el.text_content(), "Ada");
//!
//! user.set("name", "Grace");
//! assert_eq!(el.text_content(), "Grace");
//!
//! view.unbind();
//! user.set("name", "Linus");
//! assert_eq!(el.text_content(), "Grace");
//! ```
//!
//! ## Observation
//! Models are [`Object`]s and [`List`]s from [`tether_reactive`]. Observing a
//! property intercepts writes to it; every changed write runs the
//! subscribers before returning, and in-place list mutations notify every
//! property currently holding the list. There is no batching and no
//! scheduler: everything happens on the calling thread.
//!
//! ## Directives
//! A directive attribute is `<prefix>-<name>`, with `rv` as the default
//! prefix. Its value is a declaration: a keypath or constant followed by
//! `|`-separated formatters, each with optional arguments. Keypath segments
//! are separated by interface characters (`.` by default) that pick the
//! [`Adapter`] used to read and observe the next segment, so a custom model
//! type can be reached with e.g. `user:name` after registering a `:` adapter.
//!
//! The [`Binder`] registered for the name does the rendering. Bindings are
//! applied in descending priority order; the `each-*` binder
//! ([`EachBinder`]) runs first and stamps one child view per list item.
//!
//! Text nodes containing `{ keypath | formatter }` are interpolated.
//!
//! ## Configuration
//! [`bind`] merges its [`BindOptions`] over this thread's defaults, which
//! [`configure`] changes.

pub mod binder;
pub mod binders;
pub mod binding;
pub mod error;
pub mod formatter;
pub mod formatters;
pub mod iteration;
pub mod keypath;
pub mod node;
pub mod options;
pub mod parser;
pub mod scope;
pub mod view;

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

pub use binder::{Binder, BinderRegistry};
pub use binders::AttributeBinder;
pub use binding::{Binding, WeakBinding};
pub use error::{Error, Result};
pub use formatter::{Formatter, FormatterRegistry};
pub use iteration::EachBinder;
pub use keypath::{AdapterRegistry, KeypathObserver};
pub use node::{Event, Listener, NodeId, NodeKind};
pub use options::{BindOptions, Options, ViewOptions, configure, reset_defaults};
pub use scope::Scope;
pub use tether_reactive as reactive;
pub use tether_reactive::{
    Adapter, Callback, List, Object, ObjectId, Observable, Opaque, PropertyAdapter, Value,
    observer,
};
pub use view::View;

pub(crate) type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Binds `nodes` to `models`.
///
/// Builds a [`View`] over the nodes using this thread's defaults merged
/// with `options`, binds it and returns it. Dropping the view does not
/// unbind it; call [`View::unbind`] to release its subscriptions.
pub fn bind(
    nodes: impl IntoIterator<Item = NodeId>,
    models: Object,
    options: BindOptions,
) -> View {
    view::bind_nodes(nodes, models, options::resolve(options))
}

pub mod prelude {
    pub use crate::{
        AttributeBinder, BindOptions, Binder, Binding, Formatter, List, NodeId, NodeKind, Object,
        Options, Value, View, bind,
    };
    pub use tether_reactive::{Adapter, Callback, observer};
}
