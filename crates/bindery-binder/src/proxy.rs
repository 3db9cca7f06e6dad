#![forbid(unsafe_code)]

//! The [`Proxy`] trait shared by leaf binders and composites.
//!
//! Every widget proxy owns a [`Binder`]. Composites additionally own child
//! proxies and wire their widgets into their own.
//!
//! | Step        | Order                                      |
//! |-------------|--------------------------------------------|
//! | `construct` | children first, then this proxy's widget   |
//! | `configure` | children first, then this proxy's wiring   |
//! | `dispose`   | children first, then this proxy's binder   |
//! | `walk`      | this proxy, then children in pre-order     |

use std::fmt;
use std::rc::Rc;

use bindery_core::toolkit;
use bindery_core::{Error, ObjectRef, Result, Value, WidgetRef};

use crate::binder::Binder;

/// Shared handle to any widget proxy.
pub type ProxyRef = Rc<dyn Proxy>;

/// A widget proxy: a binder plus, for composites, child proxies.
pub trait Proxy {
    /// The binder wrapping this proxy's own widget.
    fn binder(&self) -> &Rc<Binder>;

    /// Direct child proxies, in wiring order.
    fn child_proxies(&self) -> Vec<ProxyRef> {
        Vec::new()
    }

    /// Create the widget tree: children first, then this proxy's widget.
    fn construct(&self) -> Result<()> {
        for child in self.child_proxies() {
            child.construct()?;
        }
        self.binder().construct()
    }

    /// Wire constructed widgets together: children first, then
    /// [`Proxy::configure_target`].
    fn configure(&self) -> Result<()> {
        for child in self.child_proxies() {
            child.configure()?;
        }
        self.configure_target()
    }

    /// Per-proxy wiring once every widget in the subtree exists.
    fn configure_target(&self) -> Result<()> {
        Ok(())
    }

    /// Tear down: children first, then [`Proxy::dispose_target`].
    fn dispose(&self) -> Result<()> {
        for child in self.child_proxies() {
            child.dispose()?;
        }
        self.dispose_target()
    }

    /// Per-proxy teardown.
    fn dispose_target(&self) -> Result<()> {
        self.binder().dispose()
    }

    /// The binder as a reactive object, for contexts and bindings.
    fn object(&self) -> ObjectRef {
        self.binder().clone()
    }

    fn id(&self) -> Option<String> {
        self.binder().id()
    }

    /// The attached widget, or [`Error::Unavailable`] before construction.
    fn widget(&self) -> Result<WidgetRef> {
        self.binder().target().ok_or_else(|| Error::Unavailable {
            kind: "widget",
            name: self.binder().class().name().to_owned(),
        })
    }
}

impl fmt::Debug for dyn Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.binder().as_ref(), f)
    }
}

/// `root` followed by every descendant, depth first.
#[must_use]
pub fn walk(root: &ProxyRef) -> Vec<ProxyRef> {
    let mut out = Vec::new();
    let mut stack = vec![Rc::clone(root)];
    while let Some(proxy) = stack.pop() {
        let mut children = proxy.child_proxies();
        children.reverse();
        stack.extend(children);
        out.push(proxy);
    }
    out
}

/// Whether `widget` is a layout rather than a widget.
#[must_use]
pub fn is_layout(widget: &WidgetRef) -> bool {
    widget.meta_class().inherits("QLayout")
}

/// Upcast a concrete proxy handle.
#[must_use]
pub fn proxy_ref<P: Proxy + 'static>(proxy: &Rc<P>) -> ProxyRef {
    Rc::clone(proxy) as ProxyRef
}

/// Create a plain `QWidget` holding `layout`, for containers that only
/// accept widgets.
pub fn wrap_layout(layout: &WidgetRef) -> Result<WidgetRef> {
    let toolkit = toolkit::current()?;
    let widget = toolkit.create_named("QWidget")?;
    widget.invoke("setLayout", &[Value::Widget(Rc::clone(layout))])?;
    Ok(widget)
}
