#![forbid(unsafe_code)]

//! Widget trees loaded from layout description files.
//!
//! Every named object in the loaded tree (names starting with `_` excepted)
//! becomes a child attribute of the [`UiFile`] proxy. Which proxy wraps it:
//!
//! 1. an override registered for that name, attached to the loaded object;
//! 2. an insertion registered for that name, constructed fresh and placed as
//!    the only child of the loaded object, filling it;
//! 3. otherwise the [`BinderRegistry`] entry for the object's class.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use bindery_core::toolkit;
use bindery_core::{Error, Result, Value, WidgetRef};

use crate::binder::Binder;
use crate::class::BinderClass;
use crate::proxy::{Proxy, ProxyRef};
use crate::registry::BinderRegistry;

/// A composite whose widget tree comes from a layout description.
pub struct UiFile {
    binder: Rc<Binder>,
    source: String,
    overrides: Vec<(String, ProxyRef)>,
    insertions: Vec<(String, ProxyRef)>,
    registry: BinderRegistry,
    children: RefCell<Vec<(String, ProxyRef)>>,
}

impl BinderClass for UiFile {
    const NAME: &'static str = "UiFile";
    const TARGET: &'static str = "QWidget";
}

impl UiFile {
    #[must_use]
    pub fn builder(source: impl Into<String>) -> UiFileBuilder {
        UiFileBuilder {
            source: source.into(),
            overrides: Vec::new(),
            insertions: Vec::new(),
            registry: None,
        }
    }

    /// Read the description from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<UiFileBuilder> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| Error::Toolkit(format!("cannot read {}: {err}", path.display())))?;
        Ok(Self::builder(source))
    }

    /// The proxy bound to a named object, once constructed.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<ProxyRef> {
        self.children
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| Rc::clone(c))
    }

    fn find<'a>(list: &'a [(String, ProxyRef)], name: &str) -> Option<&'a ProxyRef> {
        list.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    fn insert_into(&self, host: &WidgetRef, proxy: &ProxyRef) -> Result<()> {
        proxy.construct()?;
        let toolkit = toolkit::current()?;
        if let Some(old) = host.invoke("layout", &[])?.as_widget() {
            // Hand the old layout to a throwaway widget so it is deleted.
            let scrap = toolkit.create_named("QWidget")?;
            scrap.invoke("setLayout", &[Value::Widget(Rc::clone(old))])?;
        }
        let layout = toolkit.create_named("QVBoxLayout")?;
        layout.invoke("setContentsMargins", &[0, 0, 0, 0].map(Value::Int))?;
        layout.invoke("addWidget", &[Value::Widget(proxy.widget()?)])?;
        host.invoke("setLayout", &[Value::Widget(layout)])?;
        Ok(())
    }
}

impl Proxy for UiFile {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        self.children
            .borrow()
            .iter()
            .map(|(_, c)| Rc::clone(c))
            .collect()
    }

    fn construct(&self) -> Result<()> {
        let ui = toolkit::current()?.load_ui(&self.source)?;
        for (name, object) in &ui.names {
            if name.starts_with('_') || Rc::ptr_eq(object, &ui.root) {
                continue;
            }
            let proxy = if let Some(proxy) = Self::find(&self.overrides, name) {
                proxy.binder().set_target(Rc::clone(object))?;
                Rc::clone(proxy)
            } else if let Some(proxy) = Self::find(&self.insertions, name) {
                self.insert_into(object, proxy)?;
                Rc::clone(proxy)
            } else {
                let factory = self
                    .registry
                    .lookup(&object.meta_class())
                    .ok_or_else(|| Error::UnknownClass(object.meta_class().name().to_owned()))?;
                let proxy = factory()?;
                proxy.binder().set_target(Rc::clone(object))?;
                proxy
            };
            tracing::debug!(name = name.as_str(), "bound named object");
            self.binder.add_child(name, proxy.object());
            self.children.borrow_mut().push((name.clone(), proxy));
        }
        self.binder.set_target(ui.root)
    }
}

impl fmt::Debug for UiFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.children.borrow().iter().map(|(n, _)| n.clone()).collect();
        f.debug_struct("UiFile")
            .field("id", &self.binder.id())
            .field("children", &names)
            .finish()
    }
}

/// Builder for [`UiFile`].
#[derive(Debug)]
pub struct UiFileBuilder {
    source: String,
    overrides: Vec<(String, ProxyRef)>,
    insertions: Vec<(String, ProxyRef)>,
    registry: Option<BinderRegistry>,
}

impl UiFileBuilder {
    /// Attach `proxy` to the loaded object called `name`.
    #[must_use]
    pub fn override_with(mut self, name: &str, proxy: ProxyRef) -> Self {
        self.overrides.push((name.to_owned(), proxy));
        self
    }

    /// Construct `proxy` and make it fill the loaded object called `name`.
    #[must_use]
    pub fn insert(mut self, name: &str, proxy: ProxyRef) -> Self {
        self.insertions.push((name.to_owned(), proxy));
        self
    }

    /// Use `registry` instead of [`BinderRegistry::standard`].
    #[must_use]
    pub fn registry(mut self, registry: BinderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Rc<UiFile>> {
        Ok(Rc::new(UiFile {
            binder: Binder::new::<UiFile>()?,
            source: self.source,
            overrides: self.overrides,
            insertions: self.insertions,
            registry: self.registry.unwrap_or_else(BinderRegistry::standard),
            children: RefCell::new(Vec::new()),
        }))
    }
}
