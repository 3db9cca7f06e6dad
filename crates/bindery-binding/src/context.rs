#![forbid(unsafe_code)]

//! The namespace binding expressions resolve against.
//!
//! A context combines externally supplied model objects and values with
//! every proxy in a view tree that has an `id`, so a binding can name either
//! side: `model.count` or `title_label.text`.

use std::rc::Rc;

use ahash::AHashMap;
use bindery_binder::{ProxyRef, walk};
use bindery_core::{ObjectRef, Value};

/// Name → value lookup for expression evaluation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: AHashMap<String, Value>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Builder-style [`Context::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries.get(name).cloned()
    }

    /// The entry, when it is a reactive object.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<ObjectRef> {
        match self.entries.get(name) {
            Some(Value::Object(object)) => Some(Rc::clone(object)),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` over this context.
    pub fn extend(&mut self, other: &Context) {
        self.entries
            .extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Register every proxy under `root` that has an `id`, by that id.
    pub fn add_proxies(&mut self, root: &ProxyRef) {
        for proxy in walk(root) {
            if let Some(id) = proxy.id() {
                tracing::trace!(id = %id, "context proxy");
                self.entries.insert(id, Value::Object(proxy.object()));
            }
        }
    }

    /// Entry names in unspecified order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (name, value) in iter {
            ctx.insert(name, value);
        }
        ctx
    }
}
