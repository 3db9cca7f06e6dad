#![forbid(unsafe_code)]

//! Declarative bindings for Bindery.
//!
//! This crate provides:
//! - [`expr`], the small expression language binding right-hand sides are
//!   written in, with static extraction of the attributes an expression
//!   depends on
//! - [`Context`], the namespace expressions resolve against
//! - [`Binding`], parsed from `left OP right` strings, and the
//!   [`BindingHandle`] that undoes it
//! - [`BoundView`], which builds a proxy tree, binds it to a model, and tears
//!   both down again
//!
//! # Example
//!
//! ```ignore
//! use bindery_binding::{Binding, Context};
//!
//! let binding: Binding = "value := object.count".parse()?;
//! let ctx = Context::new().with("object", model);
//! let handle = binding.bind(&slider.object(), &ctx)?;
//! // ...
//! handle.unbind()?;
//! ```

pub mod binding;
pub mod bound_view;
pub mod context;
pub mod expr;

pub use binding::{Binding, BindingHandle, BindingKind, FactoryFn};
pub use bound_view::{BoundView, BoundViewBuilder, ConfigureFn};
pub use context::Context;
pub use expr::{Expression, find_ext_attrs};
