#![forbid(unsafe_code)]

//! Attribute descriptors: how one proxy attribute reads, writes and notifies.
//!
//! | Kind              | Read                      | Write                      | Change notification        |
//! |-------------------|---------------------------|----------------------------|----------------------------|
//! | `Attribute`       | stored value              | store                      | on change (or every write) |
//! | `Property`        | widget property           | generic write or setter    | notify signal, else write  |
//! | `DynamicProperty` | widget dynamic property   | set, repolish if styled    | on every write             |
//! | `GetterSetter`    | call getter               | call setter                | on every write             |
//! | `Slot`            | callable                  | call with the value        | none                       |
//! | `Signal`          | callable that emits       | emit with the value        | on every emission          |
//!
//! # Failure Modes
//!
//! Before a widget is attached, writes to widget-backed kinds are buffered on
//! the binder and replayed in order at attach. Reads return the buffered
//! value, a declared default, or [`Error::Unavailable`].

use bindery_core::toolkit::{self, guard_null_variant};
use bindery_core::{Error, Function, MetaMethod, MetaProperty, Result, Value, WidgetRef};

use crate::binder::Binder;

/// One attribute of a proxy class.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// Value stored on the binder itself.
    Attribute {
        default: Value,
        /// Only notify when the new value differs from the old one.
        compare: bool,
    },
    /// Static toolkit property.
    Property(MetaProperty),
    /// Ad-hoc property created on the widget.
    DynamicProperty { default: Value, styled: bool },
    /// Getter/setter method pair.
    GetterSetter { getter: String, setter: String },
    Slot(MetaMethod),
    Signal(MetaMethod),
}

impl Descriptor {
    /// Short kind name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Attribute { .. } => "attribute",
            Self::Property(_) => "property",
            Self::DynamicProperty { .. } => "dynamic property",
            Self::GetterSetter { .. } => "getter/setter",
            Self::Slot(_) => "slot",
            Self::Signal(_) => "signal",
        }
    }

    /// The native signal whose emissions drive this attribute's change
    /// notifications, if any.
    #[must_use]
    pub fn signal(&self) -> Option<&MetaMethod> {
        match self {
            Self::Property(prop) => prop.notify_signal(),
            Self::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub(crate) fn get(&self, binder: &Binder, name: &str) -> Result<Value> {
        match self {
            Self::Attribute { default, .. } => {
                Ok(binder.stored(name).unwrap_or_else(|| default.clone()))
            }
            Self::Property(prop) => match binder.target() {
                Some(widget) => Ok(guard_null_variant(widget.read_property(prop.name())?)),
                None => pending_or_unavailable(binder, "property", name),
            },
            Self::DynamicProperty { default, .. } => match binder.target() {
                Some(widget) => Ok(widget.dynamic_property(name).unwrap_or(Value::None)),
                None => Ok(binder.pending(name).unwrap_or_else(|| default.clone())),
            },
            Self::GetterSetter { getter, .. } => match binder.target() {
                Some(widget) => Ok(guard_null_variant(widget.invoke(getter, &[])?)),
                None => pending_or_unavailable(binder, "getter", name),
            },
            Self::Slot(method) => {
                let widget = require(binder, "slot", name)?;
                let method_name = method.name().to_owned();
                Ok(Value::Function(Function::new(name, move |args| {
                    widget.invoke(&method_name, args)
                })))
            }
            Self::Signal(signal) => {
                let widget = require(binder, "signal", name)?;
                let signal = signal.clone();
                Ok(Value::Function(Function::new(name, move |args| {
                    widget.emit(&signal, args).map(|()| Value::None)
                })))
            }
        }
    }

    pub(crate) fn set(&self, binder: &Binder, name: &str, value: Value) -> Result<()> {
        if let Self::Attribute { compare, .. } = self {
            let old = binder
                .store(name, value.clone())
                .unwrap_or_else(|| self.default_value());
            if *compare && old == value {
                return Ok(());
            }
            return binder.notify(name, old, value);
        }

        let Some(widget) = binder.target() else {
            binder.buffer(name, value);
            return Ok(());
        };
        match self {
            Self::Attribute { .. } => Ok(()),
            Self::Property(prop) => {
                let old = guard_null_variant(widget.read_property(prop.name())?);
                write_property(&widget, prop, value.clone())?;
                if prop.notify_signal().is_none() {
                    binder.notify(name, old, value)?;
                }
                Ok(())
            }
            Self::DynamicProperty { styled, .. } => {
                let old = widget.dynamic_property(name).unwrap_or(Value::None);
                widget.set_dynamic_property(name, value.clone());
                if *styled {
                    widget.repolish();
                }
                binder.notify(name, old, value)
            }
            Self::GetterSetter { getter, setter } => {
                let old = guard_null_variant(widget.invoke(getter, &[])?);
                widget.invoke(setter, &[value.clone()])?;
                binder.notify(name, old, value)
            }
            Self::Slot(method) => {
                let args = process_args(method, name, value)?;
                widget.invoke(method.name(), &args).map(drop)
            }
            Self::Signal(signal) => {
                let args = process_args(signal, name, value)?;
                widget.emit(signal, &args)
            }
        }
    }

    fn default_value(&self) -> Value {
        match self {
            Self::Attribute { default, .. } | Self::DynamicProperty { default, .. } => {
                default.clone()
            }
            _ => Value::None,
        }
    }
}

fn write_property(widget: &WidgetRef, prop: &MetaProperty, value: Value) -> Result<()> {
    if toolkit::current_quirks().write_properties_via_setter {
        return widget.invoke(&prop.setter_name(), &[value]).map(drop);
    }
    match widget.write_property(prop.name(), value.clone()) {
        Err(Error::PropertyWriteRejected { .. }) => {
            tracing::debug!(
                property = prop.name(),
                "generic property write rejected, calling setter"
            );
            widget.invoke(&prop.setter_name(), &[value]).map(drop)
        }
        other => other,
    }
}

fn pending_or_unavailable(binder: &Binder, kind: &'static str, name: &str) -> Result<Value> {
    binder.pending(name).ok_or_else(|| Error::Unavailable {
        kind,
        name: name.to_owned(),
    })
}

fn require(binder: &Binder, kind: &'static str, name: &str) -> Result<WidgetRef> {
    binder.target().ok_or_else(|| Error::Unavailable {
        kind,
        name: name.to_owned(),
    })
}

/// Turn an assigned value into call arguments for `method`.
///
/// A method without parameters ignores the value, a one-parameter method
/// receives it as is, and any other arity expects a tuple of exactly that
/// length.
pub fn process_args(method: &MetaMethod, name: &str, value: Value) -> Result<Vec<Value>> {
    let arity = method.arity();
    match (arity, value) {
        (0, _) => Ok(Vec::new()),
        (1, value) => Ok(vec![value]),
        (n, Value::Tuple(items)) if items.len() == n => Ok(items),
        (n, Value::Tuple(items)) => Err(Error::Arity {
            name: name.to_owned(),
            expected: n,
            got: items.len(),
        }),
        (n, _) => Err(Error::Arity {
            name: name.to_owned(),
            expected: n,
            got: 1,
        }),
    }
}

/// Turn emitted signal arguments into the single value carried by a change
/// notification: nothing for no arguments, the argument itself for one, a
/// tuple otherwise.
#[must_use]
pub fn bundle_args(args: &[Value]) -> Value {
    match args {
        [] => Value::None,
        [single] => single.clone(),
        many => Value::Tuple(many.to_vec()),
    }
}
