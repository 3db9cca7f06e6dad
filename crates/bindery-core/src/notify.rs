#![forbid(unsafe_code)]

//! Change records and per-attribute listener tables.
//!
//! Listeners are called synchronously, in registration order, from the call
//! that made the change. A listener may add or remove listeners (including
//! itself) while running: dispatch iterates over a snapshot.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;

use crate::error::Result;
use crate::value::Value;

/// Global counter for listener IDs.
static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `observe`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A change notification for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Attribute name.
    pub name: String,
    /// Previous value; `Value::None` when the source does not know it.
    pub old: Value,
    /// New value.
    pub new: Value,
}

/// Change listener. Errors propagate to whoever made the change.
pub type Listener = Rc<dyn Fn(&Change) -> Result<()>>;

/// Wrap a closure as a [`Listener`].
pub fn listener(f: impl Fn(&Change) -> Result<()> + 'static) -> Listener {
    Rc::new(f)
}

/// Listeners keyed by attribute name.
#[derive(Default)]
pub struct ListenerTable {
    by_name: RefCell<AHashMap<String, Vec<(ListenerId, Listener)>>>,
}

impl ListenerTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `name`, returning its ID and the number of
    /// listeners on `name` before the insertion.
    pub fn add(&self, name: &str, listener: Listener) -> (ListenerId, usize) {
        let id = ListenerId::next();
        let mut by_name = self.by_name.borrow_mut();
        let entries = by_name.entry(name.to_owned()).or_default();
        let before = entries.len();
        entries.push((id, listener));
        (id, before)
    }

    /// Remove a listener. Returns the number of listeners left on `name`, or
    /// `None` if the ID was not registered there.
    pub fn remove(&self, name: &str, id: ListenerId) -> Option<usize> {
        let mut by_name = self.by_name.borrow_mut();
        let entries = by_name.get_mut(name)?;
        let idx = entries.iter().position(|(lid, _)| *lid == id)?;
        entries.remove(idx);
        let left = entries.len();
        if left == 0 {
            by_name.remove(name);
        }
        Some(left)
    }

    /// Number of listeners on `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.by_name.borrow().get(name).map_or(0, Vec::len)
    }

    /// Call every listener on `change.name`, stopping at the first error.
    pub fn notify(&self, change: &Change) -> Result<()> {
        let snapshot: Vec<Listener> = match self.by_name.borrow().get(&change.name) {
            Some(entries) => entries.iter().map(|(_, l)| Rc::clone(l)).collect(),
            None => return Ok(()),
        };
        for listener in snapshot {
            listener(change)?;
        }
        Ok(())
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.by_name.borrow_mut().clear();
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let by_name = self.by_name.borrow();
        let mut names: Vec<_> = by_name.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        names.sort();
        f.debug_struct("ListenerTable").field("listeners", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn change(name: &str, new: i64) -> Change {
        Change {
            name: name.into(),
            old: Value::None,
            new: Value::Int(new),
        }
    }

    #[test]
    fn notifies_in_registration_order() {
        let table = ListenerTable::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            table.add(
                "x",
                listener(move |_| {
                    log.borrow_mut().push(tag);
                    Ok(())
                }),
            );
        }
        table.notify(&change("x", 1)).unwrap();
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn add_reports_previous_count_and_remove_reports_remaining() {
        let table = ListenerTable::new();
        let (a, before_a) = table.add("x", listener(|_| Ok(())));
        let (b, before_b) = table.add("x", listener(|_| Ok(())));
        assert_eq!((before_a, before_b), (0, 1));
        assert_eq!(table.remove("x", a), Some(1));
        assert_eq!(table.remove("x", a), None);
        assert_eq!(table.remove("x", b), Some(0));
        assert_eq!(table.count("x"), 0);
    }

    #[test]
    fn listener_may_remove_itself_during_dispatch() {
        let table = Rc::new(ListenerTable::new());
        let hits = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let t = Rc::clone(&table);
        let h = Rc::clone(&hits);
        let slot = Rc::clone(&id_slot);
        let (id, _) = table.add(
            "x",
            listener(move |_| {
                h.set(h.get() + 1);
                if let Some(id) = slot.get() {
                    t.remove("x", id);
                }
                Ok(())
            }),
        );
        id_slot.set(Some(id));

        table.notify(&change("x", 1)).unwrap();
        table.notify(&change("x", 2)).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn first_error_stops_dispatch() {
        let table = ListenerTable::new();
        let reached = Rc::new(Cell::new(false));
        table.add(
            "x",
            listener(|_| Err(crate::Error::Type("boom".into()))),
        );
        let r = Rc::clone(&reached);
        table.add(
            "x",
            listener(move |_| {
                r.set(true);
                Ok(())
            }),
        );
        assert!(table.notify(&change("x", 1)).is_err());
        assert!(!reached.get());
    }
}
