#![forbid(unsafe_code)]

//! Button groups assembled from buttons elsewhere in a view.
//!
//! A button group is not a container: its buttons live wherever the view
//! placed them. The group names them by id and is filled in once the view's
//! context exists.

use std::fmt;
use std::rc::Rc;

use bindery_core::{Error, Result, Value};

use crate::binder::{Binder, as_binder};
use crate::class::BinderClass;
use crate::proxy::Proxy;

/// A button reference: its view id and an optional group-local integer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonId {
    pub id: String,
    pub group_id: Option<i64>,
}

impl From<&str> for ButtonId {
    fn from(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            group_id: None,
        }
    }
}

impl From<(&str, i64)> for ButtonId {
    fn from((id, group_id): (&str, i64)) -> Self {
        Self {
            id: id.to_owned(),
            group_id: Some(group_id),
        }
    }
}

/// Proxy for `QButtonGroup`.
pub struct ButtonGroup {
    binder: Rc<Binder>,
    button_ids: Vec<ButtonId>,
}

impl BinderClass for ButtonGroup {
    const NAME: &'static str = "ButtonGroup";
    const TARGET: &'static str = "QButtonGroup";
}

impl ButtonGroup {
    pub fn new(button_ids: Vec<ButtonId>) -> Result<Rc<Self>> {
        Ok(Rc::new(Self {
            binder: Binder::new::<Self>()?,
            button_ids,
        }))
    }

    #[must_use]
    pub fn button_ids(&self) -> &[ButtonId] {
        &self.button_ids
    }

    /// Add every listed button, resolving ids through `lookup`.
    pub fn add_buttons(&self, lookup: &dyn Fn(&str) -> Option<Value>) -> Result<()> {
        let group = self.widget()?;
        for button in &self.button_ids {
            let found = lookup(&button.id).ok_or_else(|| Error::UndefinedName(button.id.clone()))?;
            let widget = match &found {
                Value::Object(object) => as_binder(object).and_then(Binder::target),
                Value::Widget(widget) => Some(Rc::clone(widget)),
                _ => None,
            }
            .ok_or_else(|| {
                Error::type_error(format!(
                    "button group member {:?} is {} rather than a constructed button",
                    button.id,
                    found.type_name()
                ))
            })?;

            let mut args = vec![Value::Widget(widget)];
            args.extend(button.group_id.map(Value::Int));
            group.invoke("addButton", &args)?;
        }
        tracing::debug!(buttons = self.button_ids.len(), "filled button group");
        Ok(())
    }
}

impl Proxy for ButtonGroup {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }
}

impl fmt::Debug for ButtonGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonGroup")
            .field("id", &self.binder.id())
            .field("button_ids", &self.button_ids)
            .finish()
    }
}
