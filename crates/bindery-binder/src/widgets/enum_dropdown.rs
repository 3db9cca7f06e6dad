#![forbid(unsafe_code)]

//! Selection of one value from a fixed list of `(value, label)` pairs.
//!
//! Values are matched against the choices with a replaceable comparator
//! (plain equality by default), so a model value need not be the identical
//! object that was listed.

use std::fmt;
use std::rc::Rc;

use bindery_core::{HasAttributes, Result, Value};

use crate::binder::Binder;
use crate::class::{BinderClass, ClassDecl};
use crate::proxy::Proxy;
use crate::raw::ComboBox;
use crate::widgets::choices::{Comparator, choices, encode, item_index};

pub struct EnumDropDown {
    binder: Rc<Binder>,
    same_as: Comparator,
}

impl BinderClass for EnumDropDown {
    const NAME: &'static str = "EnumDropDown";
    const TARGET: &'static str = ComboBox::TARGET;

    fn declare(decl: &mut ClassDecl) {
        ComboBox::declare(decl);
        decl.attribute_no_compare("value", Value::None)
            .attribute("values", Value::Tuple(Vec::new()));
    }
}

impl EnumDropDown {
    pub fn new() -> Result<Rc<Self>> {
        let binder = Binder::new::<Self>()?;
        let same_as = Comparator::new();

        let cmp = same_as.clone();
        binder.on_change("values", move |b, _| {
            if b.has_target() {
                update_items(b, &cmp)?;
            }
            Ok(())
        })?;

        binder.on_change("currentIndexChanged", |b, change| {
            // Clearing the list reports index -1, which selects nothing.
            let Some(index) = change.new.as_int().and_then(|i| usize::try_from(i).ok()) else {
                return Ok(());
            };
            b.loopback_guard()
                .run_unlocked("value".to_owned(), || {
                    match choices(b)?.into_iter().nth(index) {
                        Some((value, _)) => b.set_attr("value", value),
                        None => Ok(()),
                    }
                })
                .unwrap_or(Ok(()))
        })?;

        let cmp = same_as.clone();
        binder.on_change("value", move |b, change| {
            b.loopback_guard()
                .run_unlocked("value".to_owned(), || {
                    let index = cmp.first(&choices(b)?, &change.new);
                    b.set_attr("currentIndex", item_index(index))
                })
                .unwrap_or(Ok(()))
        })?;

        Ok(Rc::new(Self { binder, same_as }))
    }

    /// Replace the choices.
    pub fn set_choices<V: Into<Value>, L: Into<String>>(
        &self,
        choices: impl IntoIterator<Item = (V, L)>,
    ) -> Result<()> {
        self.binder.set_attr("values", encode(choices))
    }

    /// Compare values with `same_as` instead of `==` when locating them
    /// among the choices.
    pub fn set_same_as(&self, same_as: impl Fn(&Value, &Value) -> bool + 'static) {
        self.same_as.set(Rc::new(same_as));
    }
}

/// Reload the native item list, keeping the current value selected when it
/// is still among the choices.
fn update_items(binder: &Binder, same_as: &Comparator) -> Result<()> {
    let Some(combo) = binder.target() else {
        return Ok(());
    };
    let current = binder.get_attr("value")?;
    let choices = choices(binder)?;
    let index = same_as.last(&choices, &current).unwrap_or(0);
    let labels: Vec<Value> = choices
        .into_iter()
        .map(|(_, label)| Value::Str(label))
        .collect();

    if combo.invoke("count", &[])?.as_int().unwrap_or(0) > 0 {
        combo.invoke("clear", &[])?;
    }
    combo.invoke("addItems", &[Value::Tuple(labels)])?;
    combo.invoke("setCurrentIndex", &[item_index(Some(index))])?;
    Ok(())
}

impl Proxy for EnumDropDown {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn configure_target(&self) -> Result<()> {
        update_items(&self.binder, &self.same_as)
    }
}

impl fmt::Debug for EnumDropDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.binder.as_ref(), f)
    }
}
