#![forbid(unsafe_code)]

//! The reactive proxy around one native widget.
//!
//! A [`Binder`] exposes every attribute of its proxy class through
//! [`HasAttributes`], forwards reads and writes to the attached widget and
//! turns native signal emissions into change notifications.
//!
//! # Lifecycle
//!
//! 1. Created without a widget. Writes to widget-backed attributes are
//!    buffered; observing a signal-backed attribute queues the connection.
//! 2. [`Binder::set_target`] attaches the widget exactly once: queued
//!    connections are made, then dynamic-property defaults, declared defaults
//!    and buffered writes are applied (buffered writes win).
//! 3. [`Binder::dispose`] disconnects every native signal connection.
//!
//! # Invariants
//!
//! 1. A binder is attached to at most one widget per lifetime.
//! 2. A native signal is connected exactly while its attribute has at least
//!    one observer: the first observer connects, the last one leaving
//!    disconnects.
//!
//! # Failure Modes
//!
//! | Condition                          | Result                                 |
//! |------------------------------------|----------------------------------------|
//! | second `set_target`                | `Error::TargetReassigned`              |
//! | unknown attribute name             | `Error::UnknownAttribute`              |
//! | disconnect fails, benign quirk set | logged at debug level and ignored      |
//! | disconnect fails otherwise         | error returned to the caller           |

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use bindery_core::toolkit;
use bindery_core::{
    Change, ConnectionId, Error, HasAttributes, Listener, ListenerId, ListenerTable,
    LoopbackGuard, MetaMethod, ObjectRef, Result, SignalHandler, Value, WidgetRef, listener,
};

use crate::class::{BinderClass, ClassInfo, class_info, upsert};
use crate::descriptor::{Descriptor, bundle_args};

/// Connection work deferred until a widget is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    Connect,
    Disconnect,
}

/// Reactive proxy for one native widget.
pub struct Binder {
    class: Rc<ClassInfo>,
    this: Weak<Binder>,
    target: RefCell<Option<WidgetRef>>,
    values: RefCell<AHashMap<String, Value>>,
    children: RefCell<BTreeMap<String, ObjectRef>>,
    pending_writes: RefCell<Vec<(String, Value)>>,
    pending_connections: RefCell<VecDeque<(PendingOp, String)>>,
    listeners: ListenerTable,
    connections: RefCell<BTreeMap<String, (MetaMethod, ConnectionId)>>,
    loopback_guard: LoopbackGuard,
}

impl Binder {
    /// Create an unattached binder of proxy class `C`.
    pub fn new<C: BinderClass>() -> Result<Rc<Self>> {
        Ok(Self::with_class(class_info::<C>()?))
    }

    /// Create an unattached binder from an already reflected class.
    #[must_use]
    pub fn with_class(class: Rc<ClassInfo>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            class,
            this: this.clone(),
            target: RefCell::new(None),
            values: RefCell::new(AHashMap::new()),
            children: RefCell::new(BTreeMap::new()),
            pending_writes: RefCell::new(Vec::new()),
            pending_connections: RefCell::new(VecDeque::new()),
            listeners: ListenerTable::new(),
            connections: RefCell::new(BTreeMap::new()),
            loopback_guard: LoopbackGuard::new(),
        })
    }

    #[must_use]
    pub fn class(&self) -> &Rc<ClassInfo> {
        &self.class
    }

    /// The attached widget, if any.
    #[must_use]
    pub fn target(&self) -> Option<WidgetRef> {
        self.target.borrow().clone()
    }

    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target.borrow().is_some()
    }

    /// Guard that widget-specific handlers use to suppress their own echoes.
    #[must_use]
    pub fn loopback_guard(&self) -> &LoopbackGuard {
        &self.loopback_guard
    }

    /// The binder's `id`, if one was assigned.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.stored("id") {
            Some(Value::Str(id)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    pub fn set_id(&self, id: &str) -> Result<()> {
        self.set_attr("id", Value::from(id))
    }

    /// Expose `child` as an attribute of this binder.
    pub fn add_child(&self, name: &str, child: ObjectRef) {
        self.children.borrow_mut().insert(name.to_owned(), child);
    }

    /// Stop exposing the child `name`.
    pub fn remove_child(&self, name: &str) -> Option<ObjectRef> {
        self.children.borrow_mut().remove(name)
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<ObjectRef> {
        self.children.borrow().get(name).cloned()
    }

    /// Number of observers on `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.count(name)
    }

    /// Whether the native signal behind `name` is currently connected.
    #[must_use]
    pub fn is_connected(&self, name: &str) -> bool {
        self.connections.borrow().contains_key(name)
    }

    /// Attach the native widget. Allowed once per binder.
    pub fn set_target(&self, widget: WidgetRef) -> Result<()> {
        if self.has_target() {
            return Err(Error::TargetReassigned {
                class: self.class.name().to_owned(),
            });
        }
        *self.target.borrow_mut() = Some(widget);
        tracing::debug!(class = self.class.name(), "attached widget");

        loop {
            let next = self.pending_connections.borrow_mut().pop_front();
            match next {
                Some((op, name)) => self.apply(op, &name)?,
                None => break,
            }
        }

        let mut values = self.class.initial_values();
        for (name, value) in self.pending_writes.take() {
            upsert(&mut values, name, value);
        }
        for (name, value) in values {
            self.set_attr(&name, value)?;
        }
        Ok(())
    }

    /// Create a fresh widget of the wrapped class and attach it.
    pub fn construct(&self) -> Result<()> {
        let widget = toolkit::current()?.create(self.class.meta())?;
        self.set_target(widget)
    }

    /// Disconnect every native signal connection.
    pub fn dispose(&self) -> Result<()> {
        self.pending_connections.borrow_mut().clear();
        let names: Vec<String> = self.connections.borrow().keys().cloned().collect();
        for name in names {
            self.disconnect_signal(&name)?;
        }
        tracing::debug!(class = self.class.name(), "disposed");
        Ok(())
    }

    /// Send a change notification for `name` to its observers.
    pub fn notify(&self, name: &str, old: Value, new: Value) -> Result<()> {
        self.listeners.notify(&Change {
            name: name.to_owned(),
            old,
            new,
        })
    }

    /// Observe one of this binder's own attributes with a handler that
    /// receives the binder. The handler does not keep the binder alive.
    pub fn on_change(
        &self,
        name: &str,
        handler: impl Fn(&Binder, &Change) -> Result<()> + 'static,
    ) -> Result<ListenerId> {
        let this = self.this.clone();
        self.observe(
            name,
            listener(move |change| match this.upgrade() {
                Some(binder) => handler(&binder, change),
                None => Ok(()),
            }),
        )
    }

    pub(crate) fn stored(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    /// Store a plain attribute value, returning the previous one.
    pub(crate) fn store(&self, name: &str, value: Value) -> Option<Value> {
        self.values.borrow_mut().insert(name.to_owned(), value)
    }

    pub(crate) fn pending(&self, name: &str) -> Option<Value> {
        self.pending_writes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub(crate) fn buffer(&self, name: &str, value: Value) {
        upsert(&mut self.pending_writes.borrow_mut(), name.to_owned(), value);
    }

    fn schedule(&self, op: PendingOp, name: &str) -> Result<()> {
        if self.has_target() {
            return self.apply(op, name);
        }
        self.pending_connections
            .borrow_mut()
            .push_back((op, name.to_owned()));
        Ok(())
    }

    fn apply(&self, op: PendingOp, name: &str) -> Result<()> {
        match op {
            PendingOp::Connect => self.connect_signal(name),
            PendingOp::Disconnect => self.disconnect_signal(name),
        }
    }

    fn connect_signal(&self, name: &str) -> Result<()> {
        if self.is_connected(name) {
            return Ok(());
        }
        let Some(signal) = self.class.descriptor(name).and_then(Descriptor::signal) else {
            return Ok(());
        };
        let Some(widget) = self.target() else {
            return Ok(());
        };

        let this = self.this.clone();
        let attr = name.to_owned();
        let handler: SignalHandler = Rc::new(move |args: &[Value]| match this.upgrade() {
            Some(binder) => binder.notify(&attr, Value::None, bundle_args(args)),
            None => Ok(()),
        });
        let id = widget.connect(signal, handler)?;
        tracing::debug!(
            class = self.class.name(),
            attribute = name,
            signal = %signal.signature(),
            "connected signal"
        );
        self.connections
            .borrow_mut()
            .insert(name.to_owned(), (signal.clone(), id));
        Ok(())
    }

    fn disconnect_signal(&self, name: &str) -> Result<()> {
        let Some((signal, id)) = self.connections.borrow_mut().remove(name) else {
            return Ok(());
        };
        let Some(widget) = self.target() else {
            return Ok(());
        };
        match widget.disconnect(&signal, id) {
            Ok(()) => {
                tracing::debug!(
                    class = self.class.name(),
                    attribute = name,
                    "disconnected signal"
                );
                Ok(())
            }
            Err(err) if toolkit::current_quirks().benign_disconnect_errors => {
                tracing::debug!(
                    class = self.class.name(),
                    attribute = name,
                    %err,
                    "ignoring disconnect error"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn is_known(&self, name: &str) -> bool {
        self.class.descriptor(name).is_some() || self.children.borrow().contains_key(name)
    }
}

impl HasAttributes for Binder {
    fn type_name(&self) -> &str {
        self.class.name()
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        if let Some(child) = self.child(name) {
            return Ok(Value::Object(child));
        }
        match self.class.descriptor(name) {
            Some(descriptor) => descriptor.get(self, name),
            None => Err(Error::unknown_attribute(self.class.name(), name)),
        }
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        if self.children.borrow().contains_key(name) {
            return Err(Error::ReadOnly {
                name: name.to_owned(),
            });
        }
        match self.class.descriptor(name) {
            Some(descriptor) => descriptor.set(self, name, value),
            None => Err(Error::unknown_attribute(self.class.name(), name)),
        }
    }

    fn observe(&self, name: &str, listener: Listener) -> Result<ListenerId> {
        if !self.is_known(name) {
            return Err(Error::unknown_attribute(self.class.name(), name));
        }
        let (id, before) = self.listeners.add(name, listener);
        let has_signal = self
            .class
            .descriptor(name)
            .and_then(Descriptor::signal)
            .is_some();
        if before == 0 && has_signal {
            self.schedule(PendingOp::Connect, name)?;
        }
        Ok(id)
    }

    fn unobserve(&self, name: &str, id: ListenerId) -> Result<()> {
        if self.listeners.remove(name, id) != Some(0) {
            return Ok(());
        }
        let has_signal = self
            .class
            .descriptor(name)
            .and_then(Descriptor::signal)
            .is_some();
        if has_signal {
            self.schedule(PendingOp::Disconnect, name)?;
        }
        Ok(())
    }

    fn is_proxy(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.class.name())
            .field("id", &self.id())
            .field("attached", &self.has_target())
            .field("connections", &self.connections.borrow().len())
            .finish()
    }
}

/// The binder behind a reactive object, if it is one.
#[must_use]
pub fn as_binder(object: &ObjectRef) -> Option<&Binder> {
    object.as_any().downcast_ref::<Binder>()
}
