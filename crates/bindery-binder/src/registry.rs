#![forbid(unsafe_code)]

//! Mapping from toolkit class names to proxy factories.
//!
//! Used when widgets come from somewhere other than a proxy's own
//! `construct`, such as a loaded layout file: each widget gets the proxy
//! registered for its class or, failing that, for its nearest registered
//! ancestor.

use std::fmt;

use ahash::AHashMap;
use bindery_core::{MetaClass, Result};

use crate::button_group::ButtonGroup;
use crate::composite::{GroupBox, HBoxLayout, Splitter, StackedLayout, VBoxLayout};
use crate::grid::{FormLayout, GridLayout};
use crate::proxy::ProxyRef;
use crate::raw;

/// Creates an unattached proxy.
pub type ProxyFactory = fn() -> Result<ProxyRef>;

#[derive(Clone, Default)]
pub struct BinderRegistry {
    factories: AHashMap<String, ProxyFactory>,
}

impl BinderRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every raw proxy plus the childless forms of the layout composites.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        raw::register_all(&mut registry);
        registry.register("QVBoxLayout", || Ok(VBoxLayout::new(Vec::new())? as ProxyRef));
        registry.register("QHBoxLayout", || Ok(HBoxLayout::new(Vec::new())? as ProxyRef));
        registry.register("QStackedLayout", || {
            Ok(StackedLayout::new(Vec::new())? as ProxyRef)
        });
        registry.register("QGridLayout", || Ok(GridLayout::new(Vec::new())? as ProxyRef));
        registry.register("QFormLayout", || Ok(FormLayout::new(Vec::new())? as ProxyRef));
        registry.register("QSplitter", || Ok(Splitter::new(Vec::new())? as ProxyRef));
        registry.register("QGroupBox", || Ok(GroupBox::new(None)? as ProxyRef));
        registry.register("QButtonGroup", || Ok(ButtonGroup::new(Vec::new())? as ProxyRef));
        registry
    }

    /// Register `factory` for `class`, returning the factory it replaces.
    pub fn register(&mut self, class: &str, factory: ProxyFactory) -> Option<ProxyFactory> {
        self.factories.insert(class.to_owned(), factory)
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// The factory for `class` or its nearest registered ancestor.
    #[must_use]
    pub fn lookup(&self, class: &MetaClass) -> Option<ProxyFactory> {
        class
            .lineage()
            .find_map(|c| self.factories.get(c.name()).copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        classes.sort_unstable();
        f.debug_struct("BinderRegistry")
            .field("classes", &classes)
            .finish()
    }
}
