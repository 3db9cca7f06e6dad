#![forbid(unsafe_code)]

//! Declarative glue between a proxy tree, its bindings and a model.
//!
//! A [`BoundView`] owns a root proxy plus the bindings that connect it to
//! the objects a host supplies at activation time.
//!
//! | Step | [`BoundView::activate`] | [`BoundView::deactivate`] |
//! |------|-------------------------|---------------------------|
//! | 1 | construct and configure the proxy tree | unbind, last binding first |
//! | 2 | build the context: host entries, extra entries, proxy ids, button groups | dispose button groups |
//! | 3 | fill button groups | dispose the proxy tree |
//! | 4 | bind in declaration order | |
//! | 5 | run the configure callback | |
//! | 6 | wrap a root layout in a plain widget, apply the stylesheet | |
//!
//! If binding fails part way, the bindings already made are undone and the
//! widgets are disposed before the error is returned.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bindery_binder::{ButtonGroup, Proxy, ProxyRef, is_layout, wrap_layout};
use bindery_core::{Result, Value, WidgetRef};

use crate::binding::{Binding, BindingHandle};
use crate::context::Context;

/// Callback run once the view is bound.
pub type ConfigureFn = Rc<dyn Fn(&ProxyRef, &Context) -> Result<()>>;

struct Active {
    control: WidgetRef,
    handles: Vec<BindingHandle>,
}

/// A proxy tree bound to a model.
pub struct BoundView {
    root: ProxyRef,
    bindings: Vec<Binding>,
    button_groups: Vec<(String, Rc<ButtonGroup>)>,
    extra: Context,
    configure: Option<ConfigureFn>,
    stylesheet: Option<String>,
    active: RefCell<Option<Active>>,
}

impl BoundView {
    #[must_use]
    pub fn builder(root: ProxyRef) -> BoundViewBuilder {
        BoundViewBuilder {
            root,
            bindings: Vec::new(),
            button_groups: Vec::new(),
            extra: Context::new(),
            configure: None,
            stylesheet: None,
        }
    }

    #[must_use]
    pub fn root(&self) -> &ProxyRef {
        &self.root
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.borrow().is_some()
    }

    /// The top-level widget, while active.
    #[must_use]
    pub fn control(&self) -> Option<WidgetRef> {
        self.active.borrow().as_ref().map(|a| Rc::clone(&a.control))
    }

    /// Build the widgets and bind them against `host`. Activating an active
    /// view returns its control unchanged.
    pub fn activate(&self, host: &Context) -> Result<WidgetRef> {
        if let Some(control) = self.control() {
            return Ok(control);
        }

        self.root.construct()?;
        let mut handles = Vec::with_capacity(self.bindings.len());
        match self.assemble(host, &mut handles) {
            Ok(control) => {
                tracing::debug!(
                    root = ?self.root,
                    bindings = handles.len(),
                    groups = self.button_groups.len(),
                    "bound view activated"
                );
                *self.active.borrow_mut() = Some(Active {
                    control: Rc::clone(&control),
                    handles,
                });
                Ok(control)
            }
            Err(err) => {
                tracing::debug!(root = ?self.root, error = %err, "activation failed; rolling back");
                self.roll_back(handles);
                Err(err)
            }
        }
    }

    /// Everything after construction. Handles bound so far are left in
    /// `handles` so a failure can undo them.
    fn assemble(&self, host: &Context, handles: &mut Vec<BindingHandle>) -> Result<WidgetRef> {
        self.root.configure()?;

        let mut ctx = host.clone();
        ctx.extend(&self.extra);
        ctx.add_proxies(&self.root);
        for (name, group) in &self.button_groups {
            group.construct()?;
            group.configure()?;
            ctx.insert(name.as_str(), Value::Object(group.object()));
        }
        for (_, group) in &self.button_groups {
            group.add_buttons(&|id: &str| ctx.get(id))?;
        }

        let root_object = self.root.object();
        for binding in &self.bindings {
            handles.push(binding.bind(&root_object, &ctx)?);
        }

        if let Some(configure) = &self.configure {
            configure(&self.root, &ctx)?;
        }

        let widget = self.root.widget()?;
        let control = if is_layout(&widget) {
            wrap_layout(&widget)?
        } else {
            widget
        };
        if let Some(stylesheet) = &self.stylesheet {
            control.write_property("styleSheet", Value::from(stylesheet.as_str()))?;
        }
        Ok(control)
    }

    fn roll_back(&self, handles: Vec<BindingHandle>) {
        if let Err(err) = unbind_all(handles) {
            tracing::warn!(root = ?self.root, error = %err, "unbinding after failed activation");
        }
        if let Err(err) = self.dispose_widgets() {
            tracing::warn!(root = ?self.root, error = %err, "disposing after failed activation");
        }
    }

    /// Unbind everything and dispose the widgets. Does nothing when the view
    /// is not active.
    pub fn deactivate(&self) -> Result<()> {
        let Some(active) = self.active.borrow_mut().take() else {
            return Ok(());
        };
        unbind_all(active.handles)?;
        self.dispose_widgets()?;
        tracing::debug!(root = ?self.root, "bound view deactivated");
        Ok(())
    }

    fn dispose_widgets(&self) -> Result<()> {
        for (_, group) in &self.button_groups {
            group.dispose()?;
        }
        self.root.dispose()
    }
}

fn unbind_all(mut handles: Vec<BindingHandle>) -> Result<()> {
    while let Some(handle) = handles.pop() {
        handle.unbind()?;
    }
    Ok(())
}

impl fmt::Debug for BoundView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundView")
            .field("root", &self.root)
            .field("bindings", &self.bindings)
            .field("button_groups", &self.button_groups)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// A binding as declared on the builder.
#[derive(Debug)]
enum Declared {
    Source(String),
    Parsed(Binding),
}

/// Builder for [`BoundView`].
pub struct BoundViewBuilder {
    root: ProxyRef,
    bindings: Vec<Declared>,
    button_groups: Vec<(String, Rc<ButtonGroup>)>,
    extra: Context,
    configure: Option<ConfigureFn>,
    stylesheet: Option<String>,
}

impl BoundViewBuilder {
    /// Add a binding written as `left OP right`; parsed by
    /// [`BoundViewBuilder::build`].
    #[must_use]
    pub fn bind(mut self, source: &str) -> Self {
        self.bindings.push(Declared::Source(source.to_owned()));
        self
    }

    /// Add already parsed bindings.
    #[must_use]
    pub fn bindings(mut self, bindings: impl IntoIterator<Item = Binding>) -> Self {
        self.bindings
            .extend(bindings.into_iter().map(Declared::Parsed));
        self
    }

    /// Make `group` available to bindings as `name`.
    #[must_use]
    pub fn button_group(mut self, name: &str, group: Rc<ButtonGroup>) -> Self {
        self.button_groups.push((name.to_owned(), group));
        self
    }

    /// Add an entry to the binding context.
    #[must_use]
    pub fn context(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(name, value);
        self
    }

    #[must_use]
    pub fn configure(mut self, f: impl Fn(&ProxyRef, &Context) -> Result<()> + 'static) -> Self {
        self.configure = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn stylesheet(mut self, stylesheet: &str) -> Self {
        self.stylesheet = Some(stylesheet.to_owned());
        self
    }

    /// Parse binding strings, keeping declaration order.
    pub fn build(self) -> Result<BoundView> {
        let bindings = self
            .bindings
            .into_iter()
            .map(|declared| match declared {
                Declared::Source(source) => source.parse(),
                Declared::Parsed(binding) => Ok(binding),
            })
            .collect::<Result<Vec<Binding>>>()?;
        Ok(BoundView {
            root: self.root,
            bindings,
            button_groups: self.button_groups,
            extra: self.extra,
            configure: self.configure,
            stylesheet: self.stylesheet,
            active: RefCell::new(None),
        })
    }
}

impl fmt::Debug for BoundViewBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundViewBuilder")
            .field("root", &self.root)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}
