#![forbid(unsafe_code)]

//! Core types for Bindery.
//!
//! This crate provides:
//! - [`Value`], the dynamic value type exchanged between widgets and models
//! - [`Error`] and [`ErrorKind`], shared by every Bindery crate
//! - [`LoopbackGuard`] for breaking notification cycles between two reactive
//!   systems wired together
//! - [`HasAttributes`], the reactive-object protocol, and [`Model`], its
//!   declared-attribute implementation for application state
//! - [`MetaClass`] and the [`Widget`]/[`Toolkit`] traits describing the native
//!   toolkit a backend plugs in
//!
//! # Architecture
//!
//! Everything is single-threaded and synchronous: a change notification is
//! fully handled, including every downstream reaction, before the call that
//! caused it returns. Shared state is `Rc<RefCell<..>>`; the active toolkit is
//! a thread-local.

pub mod attrs;
pub mod error;
pub mod guard;
pub mod meta;
pub mod model;
pub mod names;
pub mod notify;
pub mod toolkit;
pub mod value;

pub use attrs::{HasAttributes, ObjectRef, PathListener, get_path, observe_path, set_path};
pub use error::{Error, ErrorKind, Result};
pub use guard::{LoopbackGuard, LoopbackScope};
pub use meta::{MetaClass, MetaMethod, MetaProperty, MethodKind};
pub use model::{Model, ModelBuilder};
pub use notify::{Change, Listener, ListenerId, ListenerTable, listener};
pub use toolkit::{
    ConnectionId, LoadedUi, SignalHandler, Toolkit, ToolkitQuirks, Widget, WidgetRef,
};
pub use value::{Function, Value};
