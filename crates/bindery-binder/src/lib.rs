#![forbid(unsafe_code)]

//! Reactive proxies for native toolkit widgets.
//!
//! A proxy class ([`BinderClass`]) names a toolkit class; the first time it
//! is instantiated, reflection over the toolkit's metadata turns every
//! property, signal, slot and getter/setter pair into an attribute of the
//! [`Binder`]. Proxies implement [`Proxy`] and compose into trees of
//! containers and layouts that build, wire and tear down native widgets in a
//! fixed order.
//!
//! # Example
//!
//! ```ignore
//! use bindery_binder::{Proxy, raw::LineEdit};
//! use bindery_core::{HasAttributes, Value};
//!
//! let edit = LineEdit::new()?;
//! edit.binder().set_attr("text", Value::from("buffered"))?;
//! edit.construct()?; // creates the widget and replays the write
//! ```

pub mod binder;
pub mod button_group;
pub mod class;
pub mod composite;
pub mod descriptor;
pub mod grid;
pub mod proxy;
pub mod raw;
pub mod registry;
pub mod ui_file;
pub mod widgets;

pub use binder::{Binder, as_binder};
pub use button_group::{ButtonGroup, ButtonId};
pub use class::{BinderClass, ClassDecl, ClassInfo, Rename, class_info, initialization_count};
pub use composite::{
    BoxDirection, BoxLayout, Composite, GroupBox, GroupBoxClass, HBoxLayout, Horizontal,
    SingleChild, Splitter, StackedLayout, VBoxLayout, Vertical, WithLayout,
};
pub use descriptor::{Descriptor, bundle_args, process_args};
pub use grid::{FormLabel, FormLayout, FormRow, GridCell, GridLayout, SpanGridLayout, SpanItem};
pub use proxy::{Proxy, ProxyRef, is_layout, proxy_ref, walk, wrap_layout};
pub use registry::{BinderRegistry, ProxyFactory};
pub use ui_file::{UiFile, UiFileBuilder};
pub use raw::LineEditFactory;
pub use widgets::{
    EditableComboBox, EnumDropDown, FloatSlider, IntSlider, LogSlider, RangeSlider, SameAs,
    Slider, SliderScale, TextField, TextMode, ValueFormat,
};
