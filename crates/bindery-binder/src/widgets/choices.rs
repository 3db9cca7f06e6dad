#![forbid(unsafe_code)]

//! `(value, label)` choice lists shared by the drop-down widgets.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bindery_core::{Error, HasAttributes, Result, Value};

use crate::binder::Binder;

/// Equality used to find a value among the choices.
pub type SameAs = Rc<dyn Fn(&Value, &Value) -> bool>;

/// The comparator a widget and its change handlers share. Plain `==` until
/// replaced.
#[derive(Clone)]
pub(crate) struct Comparator(Rc<RefCell<SameAs>>);

impl Comparator {
    pub(crate) fn new() -> Self {
        let equal: SameAs = Rc::new(|a: &Value, b: &Value| a == b);
        Self(Rc::new(RefCell::new(equal)))
    }

    pub(crate) fn set(&self, same_as: SameAs) {
        *self.0.borrow_mut() = same_as;
    }

    pub(crate) fn same(&self, a: &Value, b: &Value) -> bool {
        let same_as = Rc::clone(&self.0.borrow());
        same_as(a, b)
    }

    /// Index of the first choice matching `value`.
    pub(crate) fn first(&self, choices: &[(Value, String)], value: &Value) -> Option<usize> {
        choices.iter().position(|(v, _)| self.same(v, value))
    }

    /// Index of the last choice matching `value`.
    pub(crate) fn last(&self, choices: &[(Value, String)], value: &Value) -> Option<usize> {
        choices.iter().rposition(|(v, _)| self.same(v, value))
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator")
    }
}

/// The `(value, label)` pairs currently in `values`.
pub(crate) fn choices(binder: &Binder) -> Result<Vec<(Value, String)>> {
    let values = binder.get_attr("values")?;
    let Some(items) = values.as_tuple() else {
        return Err(Error::type_error(format!(
            "values must be a list of (value, label) pairs, got {values}"
        )));
    };
    items
        .iter()
        .map(|item| match item.as_tuple() {
            Some([value, label]) => Ok((value.clone(), label.to_display_string())),
            _ => Err(Error::type_error(format!(
                "values entries must be (value, label) pairs, got {item}"
            ))),
        })
        .collect()
}

/// Encode `(value, label)` pairs as a `values` attribute.
pub(crate) fn encode<V: Into<Value>, L: Into<String>>(
    choices: impl IntoIterator<Item = (V, L)>,
) -> Value {
    Value::Tuple(
        choices
            .into_iter()
            .map(|(value, label)| Value::Tuple(vec![value.into(), Value::Str(label.into())]))
            .collect(),
    )
}

/// `index` as a toolkit item index, `-1` for none.
pub(crate) fn item_index(index: Option<usize>) -> Value {
    Value::Int(index.and_then(|i| i64::try_from(i).ok()).unwrap_or(-1))
}
