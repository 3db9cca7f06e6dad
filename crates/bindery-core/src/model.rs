#![forbid(unsafe_code)]

//! A declared-attribute reactive object for application state.
//!
//! # Attribute kinds
//!
//! | Kind | Read | Write | Notification |
//! |------|------|-------|--------------|
//! | stored (compare) | current value | replaces value | only when the value changed |
//! | stored (no compare) | current value | replaces value | on every write |
//! | event | `Error::EventRead` | fires | on every write, old value `None` |
//! | function | `Value::Function` | `Error::ReadOnly` | never |
//!
//! Reading or writing an undeclared name is `Error::UnknownAttribute`.
//!
//! # Example
//!
//! ```
//! use bindery_core::{HasAttributes, Model, Value};
//!
//! let model = Model::builder("Settings")
//!     .attr("volume", 5)
//!     .event("reset")
//!     .build();
//! model.set_attr("volume", Value::Int(7)).unwrap();
//! assert_eq!(model.get_attr("volume").unwrap(), Value::Int(7));
//! assert!(model.get_attr("reset").is_err());
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::attrs::HasAttributes;
use crate::error::{Error, Result};
use crate::notify::{Change, Listener, ListenerId, ListenerTable};
use crate::value::{Function, Value};

enum Slot {
    Stored { value: Value, compare: bool },
    Event,
    Function(Function),
}

/// Reactive object with declared attributes.
pub struct Model {
    type_name: String,
    slots: RefCell<AHashMap<String, Slot>>,
    listeners: ListenerTable,
}

impl Model {
    pub fn builder(type_name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            model: Model {
                type_name: type_name.into(),
                slots: RefCell::new(AHashMap::new()),
                listeners: ListenerTable::new(),
            },
        }
    }

    /// Whether `name` is declared.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Number of listeners on `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.count(name)
    }

    fn unknown(&self, name: &str) -> Error {
        Error::unknown_attribute(&self.type_name, name)
    }
}

impl HasAttributes for Model {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        match self.slots.borrow().get(name) {
            Some(Slot::Stored { value, .. }) => Ok(value.clone()),
            Some(Slot::Event) => Err(Error::EventRead { name: name.into() }),
            Some(Slot::Function(f)) => Ok(Value::Function(f.clone())),
            None => Err(self.unknown(name)),
        }
    }

    fn set_attr(&self, name: &str, value: Value) -> Result<()> {
        let change = {
            let mut slots = self.slots.borrow_mut();
            match slots.get_mut(name) {
                Some(Slot::Stored { value: stored, compare }) => {
                    if *compare && *stored == value {
                        return Ok(());
                    }
                    let old = std::mem::replace(stored, value.clone());
                    Change {
                        name: name.into(),
                        old,
                        new: value,
                    }
                }
                Some(Slot::Event) => Change {
                    name: name.into(),
                    old: Value::None,
                    new: value,
                },
                Some(Slot::Function(_)) => return Err(Error::ReadOnly { name: name.into() }),
                None => return Err(self.unknown(name)),
            }
        };
        self.listeners.notify(&change)
    }

    fn observe(&self, name: &str, listener: Listener) -> Result<ListenerId> {
        if !self.has_attr(name) {
            return Err(self.unknown(name));
        }
        Ok(self.listeners.add(name, listener).0)
    }

    fn unobserve(&self, name: &str, id: ListenerId) -> Result<()> {
        self.listeners.remove(name, id);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        let mut names: Vec<&str> = slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Model")
            .field("type_name", &self.type_name)
            .field("attributes", &names)
            .finish()
    }
}

/// Builder for [`Model`].
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    /// Declare a stored attribute that notifies only when its value changes.
    #[must_use]
    pub fn attr(self, name: &str, default: impl Into<Value>) -> Self {
        self.slot(
            name,
            Slot::Stored {
                value: default.into(),
                compare: true,
            },
        )
    }

    /// Declare a stored attribute that notifies on every write.
    #[must_use]
    pub fn attr_no_compare(self, name: &str, default: impl Into<Value>) -> Self {
        self.slot(
            name,
            Slot::Stored {
                value: default.into(),
                compare: false,
            },
        )
    }

    /// Declare a fire-only event attribute.
    #[must_use]
    pub fn event(self, name: &str) -> Self {
        self.slot(name, Slot::Event)
    }

    /// Declare a callable attribute.
    #[must_use]
    pub fn function(
        self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        let func = Function::new(name, f);
        self.slot(name, Slot::Function(func))
    }

    fn slot(self, name: &str, slot: Slot) -> Self {
        self.model.slots.borrow_mut().insert(name.to_owned(), slot);
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<Model> {
        Rc::new(self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::listener;
    use std::cell::Cell;

    fn counting(model: &Model, name: &str) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        model
            .observe(
                name,
                listener(move |_| {
                    h.set(h.get() + 1);
                    Ok(())
                }),
            )
            .unwrap();
        hits
    }

    #[test]
    fn compare_mode_suppresses_equal_writes() {
        let model = Model::builder("M").attr("x", 1).attr_no_compare("y", 1).build();
        let x_hits = counting(&model, "x");
        let y_hits = counting(&model, "y");
        model.set_attr("x", Value::Int(1)).unwrap();
        model.set_attr("y", Value::Int(1)).unwrap();
        assert_eq!((x_hits.get(), y_hits.get()), (0, 1));
        model.set_attr("x", Value::Int(2)).unwrap();
        assert_eq!(x_hits.get(), 1);
    }

    #[test]
    fn change_carries_old_and_new() {
        let model = Model::builder("M").attr("x", "a").build();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        model
            .observe(
                "x",
                listener(move |c| {
                    *s.borrow_mut() = Some(c.clone());
                    Ok(())
                }),
            )
            .unwrap();
        model.set_attr("x", Value::from("b")).unwrap();
        let change = seen.borrow().clone().unwrap();
        assert_eq!(change.old, Value::from("a"));
        assert_eq!(change.new, Value::from("b"));
    }

    #[test]
    fn events_fire_but_cannot_be_read() {
        let model = Model::builder("M").event("clicked").build();
        let hits = counting(&model, "clicked");
        model.set_attr("clicked", Value::None).unwrap();
        model.set_attr("clicked", Value::None).unwrap();
        assert_eq!(hits.get(), 2);
        assert!(matches!(
            model.get_attr("clicked"),
            Err(Error::EventRead { .. })
        ));
    }

    #[test]
    fn functions_are_callable_and_read_only() {
        let model = Model::builder("Handler")
            .function("double", |args| Ok(Value::Int(args[0].expect_int("double")? * 2)))
            .build();
        let Value::Function(f) = model.get_attr("double").unwrap() else {
            panic!("expected a function");
        };
        assert_eq!(f.call(&[Value::Int(21)]).unwrap(), Value::Int(42));
        assert!(matches!(
            model.set_attr("double", Value::None),
            Err(Error::ReadOnly { .. })
        ));
    }

    #[test]
    fn undeclared_names_are_rejected() {
        let model = Model::builder("M").build();
        assert!(matches!(
            model.get_attr("nope"),
            Err(Error::UnknownAttribute { .. })
        ));
        assert!(model.observe("nope", listener(|_| Ok(()))).is_err());
    }
}
