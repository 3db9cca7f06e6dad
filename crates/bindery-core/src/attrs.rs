#![forbid(unsafe_code)]

//! The reactive-object protocol.
//!
//! Anything bindings can read, write or observe implements [`HasAttributes`]:
//! application models ([`crate::Model`]) as well as widget proxies. Attribute
//! access is by name, so binding expressions can address objects they know
//! nothing about at compile time.
//!
//! Dotted paths (`"object.child.value"`) resolve every segment but the last by
//! attribute access on intermediate objects. Resolution happens once, at the
//! call: [`observe_path`] listens on whatever object the path named at that
//! moment.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::notify::{Listener, ListenerId};
use crate::value::Value;

/// Shared handle to a reactive object.
pub type ObjectRef = Rc<dyn HasAttributes>;

/// Named, observable attributes.
pub trait HasAttributes {
    /// Type name used in diagnostics.
    fn type_name(&self) -> &str;

    fn get_attr(&self, name: &str) -> Result<Value>;

    fn set_attr(&self, name: &str, value: Value) -> Result<()>;

    /// Register a change listener on `name`.
    fn observe(&self, name: &str, listener: Listener) -> Result<ListenerId>;

    /// Remove a listener registered with [`HasAttributes::observe`].
    fn unobserve(&self, name: &str, id: ListenerId) -> Result<()>;

    /// Whether this object is a widget proxy. Binding targets use this to
    /// decide whether a dotted left-hand side names a nested proxy.
    fn is_proxy(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn HasAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name())
    }
}

/// A listener registered through a dotted path.
#[derive(Debug, Clone)]
pub struct PathListener {
    /// The object the final segment was observed on.
    pub object: ObjectRef,
    /// Final path segment.
    pub name: String,
    pub id: ListenerId,
}

impl PathListener {
    /// Remove the listener.
    pub fn remove(&self) -> Result<()> {
        self.object.unobserve(&self.name, self.id)
    }
}

/// Walk all but the last segment of `path`, returning the owning object and
/// the final attribute name.
pub fn resolve_path(root: &ObjectRef, path: &str) -> Result<(ObjectRef, String)> {
    let mut segments = path.split('.');
    let mut last = segments.next().unwrap_or_default();
    let mut object = Rc::clone(root);
    for next in segments {
        object = match object.get_attr(last)? {
            Value::Object(obj) => obj,
            other => {
                return Err(Error::type_error(format!(
                    "cannot resolve {path:?}: {last:?} is {} rather than an object",
                    other.type_name()
                )));
            }
        };
        last = next;
    }
    if last.is_empty() {
        return Err(Error::unknown_attribute(object.type_name(), path));
    }
    Ok((object, last.to_owned()))
}

/// Read a dotted attribute path.
pub fn get_path(root: &ObjectRef, path: &str) -> Result<Value> {
    let (object, name) = resolve_path(root, path)?;
    object.get_attr(&name)
}

/// Assign through a dotted attribute path.
pub fn set_path(root: &ObjectRef, path: &str, value: Value) -> Result<()> {
    let (object, name) = resolve_path(root, path)?;
    object.set_attr(&name, value)
}

/// Observe the attribute a dotted path names.
pub fn observe_path(root: &ObjectRef, path: &str, listener: Listener) -> Result<PathListener> {
    let (object, name) = resolve_path(root, path)?;
    let id = object.observe(&name, listener)?;
    Ok(PathListener { object, name, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::notify::listener;
    use std::cell::RefCell;

    fn tree() -> (ObjectRef, ObjectRef) {
        let leaf: ObjectRef = Model::builder("Leaf").attr("value", 1).build();
        let root: ObjectRef = Model::builder("Root")
            .attr("child", Value::Object(Rc::clone(&leaf)))
            .attr("flat", 0)
            .build();
        (root, leaf)
    }

    #[test]
    fn paths_resolve_through_objects() {
        let (root, leaf) = tree();
        assert_eq!(get_path(&root, "child.value").unwrap(), Value::Int(1));
        set_path(&root, "child.value", Value::Int(5)).unwrap();
        assert_eq!(leaf.get_attr("value").unwrap(), Value::Int(5));
        assert_eq!(get_path(&root, "flat").unwrap(), Value::Int(0));
    }

    #[test]
    fn non_object_segment_is_a_type_error() {
        let (root, _) = tree();
        let err = get_path(&root, "flat.value").unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn observe_path_listens_on_the_leaf() {
        let (root, leaf) = tree();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let handle = observe_path(
            &root,
            "child.value",
            listener(move |c| {
                s.borrow_mut().push(c.new.clone());
                Ok(())
            }),
        )
        .unwrap();
        leaf.set_attr("value", Value::Int(7)).unwrap();
        handle.remove().unwrap();
        leaf.set_attr("value", Value::Int(8)).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::Int(7)]);
    }
}
