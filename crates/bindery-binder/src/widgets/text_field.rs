#![forbid(unsafe_code)]

//! A line edit synchronized with a model string.
//!
//! `value` follows the text either on every edit (`mode = "auto"`) or when
//! editing finishes (`mode = "enter"`). With a validator set, the `valid`
//! dynamic property tracks whether the text is acceptable, and the
//! stylesheet installed at configure time paints invalid text.

use std::fmt;
use std::rc::Rc;

use bindery_core::{Error, HasAttributes, Result, Value};

use crate::binder::{Binder, as_binder};
use crate::class::{BinderClass, ClassDecl};
use crate::proxy::Proxy;
use crate::raw::LineEdit;

/// Style rule marking widgets whose `valid` property is false.
pub const INVALID_STYLE_RULE: &str = "*[valid='false'] { background-color: rgb(255, 192, 192); }";

/// `QValidator::Acceptable`.
const ACCEPTABLE: i64 = 2;

/// When a [`TextField`] copies its text into `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// On every user edit.
    #[default]
    Auto,
    /// When Enter is pressed or focus leaves.
    Enter,
}

impl TextMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Enter => "enter",
        }
    }
}

pub struct TextField {
    binder: Rc<Binder>,
}

impl BinderClass for TextField {
    const NAME: &'static str = "TextField";
    const TARGET: &'static str = LineEdit::TARGET;

    fn declare(decl: &mut ClassDecl) {
        LineEdit::declare(decl);
        decl.attribute_no_compare("value", "")
            .attribute("mode", TextMode::Auto.as_str())
            .dynamic_property("valid", true, true);
    }
}

impl TextField {
    pub fn new() -> Result<Rc<Self>> {
        let binder = Binder::new::<Self>()?;

        binder.on_change("textEdited", |b, change| {
            if b.get_attr("mode")?.as_str() != Some(TextMode::Auto.as_str()) {
                return Ok(());
            }
            let text = change.new.clone();
            b.loopback_guard()
                .run_unlocked("value".to_owned(), || {
                    update_valid(b, text.as_str().unwrap_or_default())?;
                    b.set_attr("value", text)
                })
                .unwrap_or(Ok(()))
        })?;

        binder.on_change("editingFinished", |b, _| {
            b.loopback_guard()
                .run_unlocked("value".to_owned(), || {
                    let text = b.get_attr("text")?;
                    b.set_attr("value", text)
                })
                .unwrap_or(Ok(()))
        })?;

        for name in ["text", "validator"] {
            binder.on_change(name, |b, _| {
                let text = b.get_attr("text")?;
                update_valid(b, text.as_str().unwrap_or_default())
            })?;
        }

        binder.on_change("value", |b, change| {
            let value = change.new.clone();
            b.loopback_guard()
                .run_unlocked("value".to_owned(), || b.set_attr("text", value))
                .unwrap_or(Ok(()))
        })?;

        Ok(Rc::new(Self { binder }))
    }

    pub fn set_mode(&self, mode: TextMode) -> Result<()> {
        self.binder.set_attr("mode", Value::from(mode.as_str()))
    }
}

/// Run the validator, if any, over `text` and record the outcome in `valid`.
fn update_valid(binder: &Binder, text: &str) -> Result<()> {
    let validator = match binder.get_attr("validator")? {
        Value::Widget(widget) => widget,
        Value::Object(object) => match as_binder(&object).and_then(Binder::target) {
            Some(widget) => widget,
            None => return Ok(()),
        },
        _ => return Ok(()),
    };
    let length = i64::try_from(text.chars().count()).unwrap_or(i64::MAX);
    let result = validator.invoke("validate", &[Value::from(text), Value::Int(length)])?;
    let state = result
        .as_tuple()
        .and_then(<[Value]>::first)
        .and_then(Value::as_int)
        .ok_or_else(|| {
            Error::type_error(format!("validator returned {result} instead of a state tuple"))
        })?;
    binder.set_attr("valid", Value::Bool(state == ACCEPTABLE))
}

impl Proxy for TextField {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn configure_target(&self) -> Result<()> {
        self.binder
            .set_attr("styleSheet", Value::from(INVALID_STYLE_RULE))
    }
}

impl fmt::Debug for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.binder.as_ref(), f)
    }
}
