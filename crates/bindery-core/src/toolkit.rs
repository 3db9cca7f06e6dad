#![forbid(unsafe_code)]

//! Interface to the native widget toolkit.
//!
//! The toolkit itself (widget implementations, layouts, event loop, signal
//! dispatch) lives outside Bindery. Backends implement [`Widget`] for their
//! widget handles and [`Toolkit`] for class lookup and construction, then
//! [`install`] the toolkit on the GUI thread.
//!
//! # Thread Safety
//!
//! Widget handles are `Rc`-based and never leave the GUI thread. The installed
//! toolkit is stored in a thread-local, so each thread (and each test) sees its
//! own installation.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::meta::{MetaClass, MetaMethod};
use crate::value::Value;

/// Shared handle to a live widget, layout or other toolkit object.
pub type WidgetRef = Rc<dyn Widget>;

/// Native signal handler. Receives the emitted arguments.
pub type SignalHandler = Rc<dyn Fn(&[Value]) -> Result<()>>;

/// Global counter for signal connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle for one signal connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh ID. Backends call this from [`Widget::connect`].
    #[must_use]
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A live toolkit object.
pub trait Widget {
    /// Class metadata of this object.
    fn meta_class(&self) -> Rc<MetaClass>;

    /// Read a static property. Unset values may come back as
    /// [`Value::NullVariant`].
    fn read_property(&self, name: &str) -> Result<Value>;

    /// Write a static property through the generic property path.
    ///
    /// Returns [`Error::PropertyWriteRejected`] when the generic path refuses
    /// the value (some flag-typed properties).
    fn write_property(&self, name: &str, value: Value) -> Result<()>;

    /// Read a dynamic (ad-hoc) property; `None` if it was never set.
    fn dynamic_property(&self, name: &str) -> Option<Value>;

    /// Set a dynamic property.
    fn set_dynamic_property(&self, name: &str, value: Value);

    /// Call a method, slot, getter or setter by name.
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value>;

    /// Emit a signal.
    fn emit(&self, signal: &MetaMethod, args: &[Value]) -> Result<()>;

    /// Connect a handler to a signal.
    fn connect(&self, signal: &MetaMethod, handler: SignalHandler) -> Result<ConnectionId>;

    /// Disconnect a previously connected handler.
    fn disconnect(&self, signal: &MetaMethod, id: ConnectionId) -> Result<()>;

    /// Re-evaluate style rules that depend on dynamic properties.
    fn repolish(&self);

    /// Find a descendant by object name.
    fn find_child(&self, _name: &str) -> Option<WidgetRef> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<widget {}>", self.meta_class().name())
    }
}

/// Backend-specific workarounds.
///
/// Supplied by [`Toolkit::quirks`]. Every flag defaults to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ToolkitQuirks {
    /// Always write static properties by calling their setter method.
    pub write_properties_via_setter: bool,
    /// Disconnect errors are reported even though the disconnect succeeded.
    pub benign_disconnect_errors: bool,
}

/// Values substituted for toolkit null sentinels, by property type name.
/// Types not listed translate to [`Value::None`].
pub const NULL_VARIANT_VALUES: &[(&str, &str)] = &[("QString", "")];

/// Translate a toolkit null sentinel to a normal value; other values pass
/// through unchanged.
#[must_use]
pub fn guard_null_variant(value: Value) -> Value {
    match value {
        Value::NullVariant(type_name) => NULL_VARIANT_VALUES
            .iter()
            .find(|(t, _)| *t == type_name)
            .map_or(Value::None, |(_, v)| Value::Str((*v).to_owned())),
        other => other,
    }
}

/// A widget tree loaded from a layout description file.
#[derive(Debug, Clone)]
pub struct LoadedUi {
    /// Top-level object.
    pub root: WidgetRef,
    /// Named descendants, by object name.
    pub names: BTreeMap<String, WidgetRef>,
}

/// A widget toolkit backend.
pub trait Toolkit {
    /// Look up a class by name.
    fn meta_class(&self, name: &str) -> Result<Rc<MetaClass>>;

    /// Create a new object of the given class.
    fn create(&self, class: &MetaClass) -> Result<WidgetRef>;

    /// Look up `name` and create an object of that class.
    fn create_named(&self, name: &str) -> Result<WidgetRef> {
        let class = self.meta_class(name)?;
        self.create(&class)
    }

    fn quirks(&self) -> ToolkitQuirks {
        ToolkitQuirks::default()
    }

    /// Build a widget tree from layout description source.
    fn load_ui(&self, _source: &str) -> Result<LoadedUi> {
        Err(Error::Toolkit("this toolkit cannot load layout files".into()))
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<dyn Toolkit>>> = const { RefCell::new(None) };
}

/// Install `toolkit` for the current thread, returning the previous one.
pub fn install(toolkit: Rc<dyn Toolkit>) -> Option<Rc<dyn Toolkit>> {
    tracing::debug!("installing toolkit");
    CURRENT.with(|cell| cell.borrow_mut().replace(toolkit))
}

/// Remove the current thread's toolkit.
pub fn uninstall() -> Option<Rc<dyn Toolkit>> {
    CURRENT.with(|cell| cell.borrow_mut().take())
}

/// The toolkit installed on this thread.
pub fn current() -> Result<Rc<dyn Toolkit>> {
    CURRENT.with(|cell| cell.borrow().clone().ok_or(Error::NoToolkit))
}

/// Quirks of the installed toolkit, or the defaults when none is installed.
#[must_use]
pub fn current_quirks() -> ToolkitQuirks {
    current().map(|t| t.quirks()).unwrap_or_default()
}
