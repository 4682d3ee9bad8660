//! # tether_reactive
//!
//! The observation layer of tether: dynamically typed [`Value`]s,
//! identity-carrying [`Object`]s and [`List`]s, and the per-thread
//! [`observer`] side table that turns writes into synchronous callbacks.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//! use tether_reactive::{observer, Callback, Object};
//!
//! let user = Object::new();
//! user.set("name", "Ada");
//!
//! let seen = Rc::new(Cell::new(0));
//! let callback = Callback::new({
//!     let seen = seen.clone();
//!     move || seen.set(seen.get() + 1)
//! });
//! observer::observe(&user, "name", &callback);
//!
//! user.set("name", "Grace");
//! user.set("name", "Grace");
//! assert_eq!(seen.get(), 1);
//!
//! observer::unobserve(&user, "name", &callback);
//! assert!(!observer::is_tracked(user.id()));
//! ```
//!
//! Everything here is single threaded: values are `Rc` based and the side
//! table lives in a thread local.

mod adapter;
mod callback;
mod id;
mod list;
mod object;
pub mod observer;
mod runtime;
mod value;

pub use adapter::{Adapter, PropertyAdapter};
pub use callback::Callback;
pub use id::ObjectId;
pub use list::List;
pub use object::Object;
pub use observer::Observable;
pub use value::{Opaque, Value};
