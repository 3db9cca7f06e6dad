#![forbid(unsafe_code)]

//! A combo box offering `(value, label)` choices that also accepts free text.
//!
//! Picking a listed item sets `value` to the item's value; typing sets it to
//! the text. Items carry their index into `values` as item data, so text the
//! user entered is told apart from listed labels. `value` follows the widget
//! only: writing it does not change the selection.

use std::fmt;
use std::rc::{Rc, Weak};

use bindery_core::{HasAttributes, Result, Value, WidgetRef};

use crate::binder::Binder;
use crate::class::{BinderClass, ClassDecl};
use crate::proxy::{Proxy, ProxyRef};
use crate::raw::{ComboBox, LineEditSlot};
use crate::widgets::choices::{Comparator, choices, encode, item_index};
use crate::widgets::text_field::TextField;

pub struct EditableComboBox {
    binder: Rc<Binder>,
    line_edit: Rc<LineEditSlot>,
    same_as: Comparator,
}

impl BinderClass for EditableComboBox {
    const NAME: &'static str = "EditableComboBox";
    const TARGET: &'static str = ComboBox::TARGET;

    fn declare(decl: &mut ClassDecl) {
        ComboBox::declare(decl);
        decl.attribute_no_compare("value", Value::None)
            .attribute("values", Value::Tuple(Vec::new()))
            .default_value("editable", true);
    }
}

impl EditableComboBox {
    pub fn new() -> Result<Rc<Self>> {
        let binder = Binder::new::<Self>()?;
        let line_edit = Rc::new(LineEditSlot::new(Box::new(|| {
            Ok(TextField::new()? as ProxyRef)
        })));
        let same_as = Comparator::new();

        let slot = Rc::clone(&line_edit);
        let weak = Rc::downgrade(&binder);
        binder.on_change("editable", move |b, _| match slot.sync(b)? {
            Some(edit) => watch_edits(&edit, weak.clone()),
            None => Ok(()),
        })?;

        let cmp = same_as.clone();
        binder.on_change("values", move |b, _| update_values(b, &cmp))?;

        binder.on_change("currentIndexChanged", |b, change| {
            let Some(index) = change.new.as_int().filter(|i| *i >= 0) else {
                return Ok(());
            };
            let Some(combo) = b.target() else {
                return Ok(());
            };
            b.loopback_guard()
                .run_unlocked("value".to_owned(), || {
                    let value = selected_value(b, &combo, index)?;
                    b.set_attr("value", value)
                })
                .unwrap_or(Ok(()))
        })?;

        Ok(Rc::new(Self {
            binder,
            line_edit,
            same_as,
        }))
    }

    /// Replace the choices.
    pub fn set_choices<V: Into<Value>, L: Into<String>>(
        &self,
        choices: impl IntoIterator<Item = (V, L)>,
    ) -> Result<()> {
        self.binder.set_attr("values", encode(choices))
    }

    /// Compare values with `same_as` instead of `==` when locating the
    /// current value among new choices.
    pub fn set_same_as(&self, same_as: impl Fn(&Value, &Value) -> bool + 'static) {
        self.same_as.set(Rc::new(same_as));
    }

    /// The text field wrapping the box's line edit.
    #[must_use]
    pub fn line_edit(&self) -> Option<ProxyRef> {
        self.line_edit.get()
    }
}

/// Copy what the user types into the box's `value`.
fn watch_edits(edit: &ProxyRef, combo: Weak<Binder>) -> Result<()> {
    edit.binder().on_change("textEdited", move |_, change| {
        let Some(combo) = combo.upgrade() else {
            return Ok(());
        };
        combo
            .loopback_guard()
            .run_unlocked("value".to_owned(), || combo.set_attr("value", change.new.clone()))
            .unwrap_or(Ok(()))
    })?;
    Ok(())
}

/// The value behind item `index`: its choice when it came from `values`,
/// otherwise its text.
fn selected_value(binder: &Binder, combo: &WidgetRef, index: i64) -> Result<Value> {
    let listed = combo
        .invoke("itemData", &[Value::Int(index)])?
        .as_int()
        .and_then(|i| usize::try_from(i).ok());
    if let Some(i) = listed
        && let Some((value, _)) = choices(binder)?.into_iter().nth(i)
    {
        return Ok(value);
    }
    combo.invoke("itemText", &[Value::Int(index)])
}

/// Reload the items. Text the user typed survives the reload; otherwise the
/// item matching the current value is selected.
fn update_values(binder: &Binder, same_as: &Comparator) -> Result<()> {
    let Some(combo) = binder.target() else {
        return Ok(());
    };
    let old_value = binder.get_attr("value")?;
    let current_text = combo
        .read_property("currentText")?
        .as_str()
        .unwrap_or_default()
        .to_owned();
    let current_index = combo.read_property("currentIndex")?.as_int().unwrap_or(-1);
    let preserve_text = current_index == -1
        || combo.invoke("itemData", &[Value::Int(current_index)])?.is_none()
        || combo.invoke("itemText", &[Value::Int(current_index)])?.as_str()
            != Some(current_text.as_str());

    let choices = choices(binder)?;
    let new_index = same_as.last(&choices, &old_value);
    {
        let _scope = binder.loopback_guard().lock(["value".to_owned()]);
        if combo.invoke("count", &[])?.as_int().unwrap_or(0) > 0 {
            combo.invoke("clear", &[])?;
        }
        for (i, (_, label)) in choices.into_iter().enumerate() {
            combo.invoke("addItem", &[Value::Str(label), item_index(Some(i))])?;
        }
    }

    if preserve_text {
        combo.invoke("setEditText", &[Value::from(current_text.as_str())])?;
        binder.set_attr("value", Value::Str(current_text))
    } else {
        combo
            .invoke("setCurrentIndex", &[item_index(new_index)])
            .map(drop)
    }
}

impl Proxy for EditableComboBox {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn configure_target(&self) -> Result<()> {
        if let Some(edit) = self.line_edit.sync(&self.binder)? {
            watch_edits(&edit, Rc::downgrade(&self.binder))?;
        }
        update_values(&self.binder, &self.same_as)
    }

    fn dispose_target(&self) -> Result<()> {
        self.line_edit.release(&self.binder)?;
        self.binder.dispose()
    }
}

impl fmt::Debug for EditableComboBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.binder.as_ref(), f)
    }
}
