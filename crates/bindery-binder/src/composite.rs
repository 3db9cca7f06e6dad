#![forbid(unsafe_code)]

//! Composite proxies: containers and layouts that own child proxies.
//!
//! Composites construct, configure and dispose their children before
//! themselves (see [`Proxy`]). Wiring child widgets into the container
//! happens in [`Proxy::configure_target`], once every widget exists.
//!
//! | Composite              | Wraps          | Child wiring                                   |
//! |------------------------|----------------|------------------------------------------------|
//! | [`Composite`]          | `QWidget`      | none; children are named attributes            |
//! | [`SingleChild`]        | any widget     | widget child reparented, layout child set      |
//! | [`WithLayout`]         | `QWidget`      | `setLayout`                                    |
//! | [`BoxLayout`]          | box layouts    | `addWidget` or `addLayout`                     |
//! | [`StackedLayout`]      | stacked layout | `addWidget`, layouts wrapped in a plain widget |
//! | [`Splitter`]           | `QSplitter`    | `addWidget`, layouts wrapped in a plain widget |

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use bindery_core::{Result, Value, WidgetRef};

use crate::binder::Binder;
use crate::class::BinderClass;
use crate::proxy::{Proxy, ProxyRef, is_layout, wrap_layout};
use crate::raw;

/// A plain widget whose children are exposed as named attributes.
///
/// The container does not place its children anywhere; it groups them so a
/// view can address them as `container.child.attribute`.
pub struct Composite {
    binder: Rc<Binder>,
    children: RefCell<Vec<(String, ProxyRef)>>,
}

impl BinderClass for Composite {
    const NAME: &'static str = "Composite";
    const TARGET: &'static str = "QWidget";
}

impl Composite {
    pub fn new() -> Result<Rc<Self>> {
        Ok(Rc::new(Self {
            binder: Binder::new::<Self>()?,
            children: RefCell::new(Vec::new()),
        }))
    }

    /// Add a named child. Children are constructed in insertion order.
    pub fn add_child(&self, name: &str, child: ProxyRef) {
        self.binder.add_child(name, child.object());
        let mut children = self.children.borrow_mut();
        match children.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = child,
            None => children.push((name.to_owned(), child)),
        }
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<ProxyRef> {
        self.children
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| Rc::clone(c))
    }
}

impl Proxy for Composite {
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
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.children.borrow().iter().map(|(n, _)| n.clone()).collect();
        f.debug_struct("Composite")
            .field("id", &self.binder.id())
            .field("children", &names)
            .finish()
    }
}

/// Marker class for [`GroupBox`].
#[derive(Debug)]
pub struct GroupBoxClass;

impl BinderClass for GroupBoxClass {
    const NAME: &'static str = "GroupBox";
    const TARGET: &'static str = "QGroupBox";
}

/// A widget of class `C` holding at most one child widget or layout.
pub struct SingleChild<C = raw::Widget> {
    binder: Rc<Binder>,
    child: Option<ProxyRef>,
    _class: PhantomData<C>,
}

/// A group box with one child.
pub type GroupBox = SingleChild<GroupBoxClass>;

impl<C: BinderClass> SingleChild<C> {
    pub fn new(child: Option<ProxyRef>) -> Result<Rc<Self>> {
        let binder = Binder::new::<C>()?;
        if let Some(child) = &child {
            binder.add_child("child", child.object());
        }
        Ok(Rc::new(Self {
            binder,
            child,
            _class: PhantomData,
        }))
    }

    #[must_use]
    pub fn child(&self) -> Option<&ProxyRef> {
        self.child.as_ref()
    }
}

impl<C: BinderClass> Proxy for SingleChild<C> {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        self.child.iter().cloned().collect()
    }

    fn configure_target(&self) -> Result<()> {
        let Some(child) = &self.child else {
            return Ok(());
        };
        let own = self.widget()?;
        let inner = child.widget()?;
        if is_layout(&inner) {
            own.invoke("setLayout", &[Value::Widget(inner)])?;
        } else {
            inner.invoke("setParent", &[Value::Widget(own)])?;
        }
        Ok(())
    }
}

impl<C: BinderClass> fmt::Debug for SingleChild<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(C::NAME)
            .field("id", &self.binder.id())
            .field("child", &self.child)
            .finish()
    }
}

/// A plain widget around a layout, for places that need a widget.
pub struct WithLayout {
    binder: Rc<Binder>,
    layout: ProxyRef,
}

impl WithLayout {
    pub fn new(layout: ProxyRef) -> Result<Rc<Self>> {
        let binder = Binder::new::<raw::Widget>()?;
        binder.add_child("child_layout", layout.object());
        Ok(Rc::new(Self { binder, layout }))
    }
}

impl Proxy for WithLayout {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        vec![Rc::clone(&self.layout)]
    }

    fn configure_target(&self) -> Result<()> {
        let layout = self.layout.widget()?;
        self.widget()?
            .invoke("setLayout", &[Value::Widget(layout)])
            .map(drop)
    }
}

impl fmt::Debug for WithLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithLayout")
            .field("layout", &self.layout)
            .finish()
    }
}

/// Direction marker for [`BoxLayout`].
pub trait BoxDirection: BinderClass {}

#[derive(Debug)]
pub struct Vertical;

impl BinderClass for Vertical {
    const NAME: &'static str = "VBoxLayout";
    const TARGET: &'static str = "QVBoxLayout";
}

impl BoxDirection for Vertical {}

#[derive(Debug)]
pub struct Horizontal;

impl BinderClass for Horizontal {
    const NAME: &'static str = "HBoxLayout";
    const TARGET: &'static str = "QHBoxLayout";
}

impl BoxDirection for Horizontal {}

/// A box layout stacking its children in one direction.
pub struct BoxLayout<D> {
    binder: Rc<Binder>,
    children: Vec<ProxyRef>,
    _direction: PhantomData<D>,
}

pub type VBoxLayout = BoxLayout<Vertical>;
pub type HBoxLayout = BoxLayout<Horizontal>;

impl<D: BoxDirection> BoxLayout<D> {
    pub fn new(children: Vec<ProxyRef>) -> Result<Rc<Self>> {
        Ok(Rc::new(Self {
            binder: Binder::new::<D>()?,
            children,
            _direction: PhantomData,
        }))
    }
}

impl<D: BoxDirection> Proxy for BoxLayout<D> {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        self.children.clone()
    }

    fn configure_target(&self) -> Result<()> {
        let layout = self.widget()?;
        for child in &self.children {
            let inner = child.widget()?;
            let method = if is_layout(&inner) {
                "addLayout"
            } else {
                "addWidget"
            };
            layout.invoke(method, &[Value::Widget(inner)])?;
        }
        Ok(())
    }
}

impl<D: BoxDirection> fmt::Debug for BoxLayout<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(D::NAME)
            .field("id", &self.binder.id())
            .field("children", &self.children)
            .finish()
    }
}

/// The widget to insert for `child` into a container that only takes widgets.
fn as_widget(child: &ProxyRef) -> Result<WidgetRef> {
    let inner = child.widget()?;
    if is_layout(&inner) {
        wrap_layout(&inner)
    } else {
        Ok(inner)
    }
}

macro_rules! widget_stack {
    ($(#[$doc:meta])* $name:ident => $target:literal) => {
        $(#[$doc])*
        pub struct $name {
            binder: Rc<Binder>,
            children: Vec<ProxyRef>,
        }

        impl BinderClass for $name {
            const NAME: &'static str = stringify!($name);
            const TARGET: &'static str = $target;
        }

        impl $name {
            pub fn new(children: Vec<ProxyRef>) -> Result<Rc<Self>> {
                Ok(Rc::new(Self {
                    binder: Binder::new::<Self>()?,
                    children,
                }))
            }
        }

        impl Proxy for $name {
            fn binder(&self) -> &Rc<Binder> {
                &self.binder
            }

            fn child_proxies(&self) -> Vec<ProxyRef> {
                self.children.clone()
            }

            fn configure_target(&self) -> Result<()> {
                let container = self.widget()?;
                for child in &self.children {
                    container.invoke("addWidget", &[Value::Widget(as_widget(child)?)])?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("id", &self.binder.id())
                    .field("children", &self.children)
                    .finish()
            }
        }
    };
}

widget_stack! {
    /// A layout showing one child at a time.
    StackedLayout => "QStackedLayout"
}

widget_stack! {
    /// A container with user-resizable panes.
    Splitter => "QSplitter"
}
