#![forbid(unsafe_code)]

//! Bindery public facade.
//!
//! Re-exports the layer crates under one name and offers a [`prelude`] with
//! the types most applications touch.
//!
//! | Module | Crate |
//! |--------|-------|
//! | [`core`] | `bindery-core`: values, errors, reactive objects, toolkit traits |
//! | [`binder`] | `bindery-binder`: proxies, composites, layouts, widgets |
//! | [`binding`] | `bindery-binding`: expressions, bindings, bound views (feature `binding`) |
//!
//! # Example
//!
//! ```ignore
//! use bindery::prelude::*;
//!
//! let model = Model::builder("Person").attr("name", "Ada").build();
//! let edit = raw::LineEdit::new()?;
//! let view = BoundView::builder(proxy_ref(&edit))
//!     .bind("text := object.name")
//!     .build()?;
//! let control = view.activate(&Context::new().with("object", model))?;
//! ```

pub use bindery_binder as binder;
#[cfg(feature = "binding")]
pub use bindery_binding as binding;
pub use bindery_core as core;

pub use bindery_core::{Error, ErrorKind, Result, Value};

/// Common imports for building bound views.
pub mod prelude {
    pub use bindery_core::toolkit::{install as install_toolkit, uninstall as uninstall_toolkit};
    pub use bindery_core::{
        Change, Error, ErrorKind, HasAttributes, LoopbackGuard, Model, ObjectRef, Result, Toolkit,
        ToolkitQuirks, Value, Widget, WidgetRef, listener,
    };

    pub use bindery_binder::raw;
    pub use bindery_binder::{
        Binder, BinderClass, BoxLayout, ButtonGroup, ButtonId, ClassDecl, Composite,
        EditableComboBox, EnumDropDown, FloatSlider, FormLayout, GridLayout, GroupBox, HBoxLayout,
        IntSlider, LogSlider, Proxy, ProxyRef, RangeSlider, Rename, SpanGridLayout, Splitter,
        StackedLayout, TextField, TextMode, UiFile, VBoxLayout, proxy_ref,
    };

    #[cfg(feature = "binding")]
    pub use bindery_binding::{Binding, BindingHandle, BindingKind, BoundView, Context, Expression};
}
