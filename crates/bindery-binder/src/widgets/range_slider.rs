#![forbid(unsafe_code)]

//! A slider between two range labels, next to a text field for typing the
//! value.
//!
//! The slider and the field are the `slider` and `field` children. The
//! root widget carries the dynamic property `binder_class = "RangeSlider"`,
//! so stylesheets can align a column of them with
//! `*[binder_class="RangeSlider"] QLabel { ... }`.
//!
//! Typed text only reaches `value` when the field's validator accepts it;
//! the validator's bounds follow `range`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_core::toolkit;
use bindery_core::{Error, HasAttributes, Result, Value, WidgetRef};

use crate::binder::Binder;
use crate::class::{BinderClass, ClassDecl};
use crate::proxy::{Proxy, ProxyRef};
use crate::widgets::slider::{IntScale, Slider, SliderScale};
use crate::widgets::text_field::TextField;

/// `Qt::AlignLeft`.
const ALIGN_LEFT: i64 = 0x1;
/// `Qt::AlignRight`.
const ALIGN_RIGHT: i64 = 0x2;

/// Digits a floating-point field accepts.
const DECIMALS: i64 = 16;

/// Turns a value into label or field text.
pub type ValueFormat = Rc<dyn Fn(&Value) -> String>;

/// Native widgets created while wiring the layout.
#[derive(Clone)]
struct Parts {
    low: WidgetRef,
    high: WidgetRef,
    validator: WidgetRef,
}

pub struct RangeSlider<S = IntScale> {
    binder: Rc<Binder>,
    slider: Rc<Slider<S>>,
    field: Rc<TextField>,
    parts: RefCell<Option<Parts>>,
    label_format: RefCell<ValueFormat>,
    field_format: RefCell<ValueFormat>,
}

impl<S: SliderScale> BinderClass for RangeSlider<S> {
    const NAME: &'static str = "RangeSlider";
    const TARGET: &'static str = "QWidget";

    fn declare(decl: &mut ClassDecl) {
        let (lo, hi) = S::default_range();
        decl.attribute("value", S::default_value())
            .attribute("range", Value::Tuple(vec![lo, hi]))
            .dynamic_property("binder_class", "RangeSlider", false);
    }
}

fn display(value: &Value) -> String {
    value.to_display_string()
}

/// Whether `S` maps integers straight onto positions.
fn integral<S: SliderScale>() -> bool {
    S::PRECISION.is_none()
}

/// Parse typed text as a value of scale `S`.
fn parse<S: SliderScale>(text: &str) -> Option<Value> {
    let text = text.trim();
    if integral::<S>() {
        text.parse::<i64>().ok().map(Value::Int)
    } else {
        text.parse::<f64>().ok().filter(|x| x.is_finite()).map(Value::Float)
    }
}

impl<S: SliderScale> RangeSlider<S> {
    pub fn new() -> Result<Rc<Self>> {
        let binder = Binder::new::<Self>()?;
        let slider = Slider::<S>::new()?;
        let field = TextField::new()?;
        binder.add_child("slider", slider.object());
        binder.add_child("field", field.object());

        let this = Rc::new(Self {
            binder,
            slider,
            field,
            parts: RefCell::new(None),
            label_format: RefCell::new(Rc::new(display)),
            field_format: RefCell::new(Rc::new(display)),
        });

        let weak = Rc::downgrade(&this);
        for name in ["value", "range"] {
            let weak = weak.clone();
            this.binder
                .on_change(name, move |_, _| with(&weak, Self::update_widgets))?;
        }
        let moved = weak.clone();
        this.slider.binder().on_change("value", move |_, change| {
            with(&moved, |s| s.slider_moved(&change.new))
        })?;
        this.field.binder().on_change("value", move |_, change| {
            with(&weak, |s| s.text_entered(&change.new))
        })?;
        Ok(this)
    }

    #[must_use]
    pub fn slider(&self) -> &Rc<Slider<S>> {
        &self.slider
    }

    #[must_use]
    pub fn field(&self) -> &Rc<TextField> {
        &self.field
    }

    /// Set both ends of the inclusive range.
    pub fn set_range(&self, lo: impl Into<Value>, hi: impl Into<Value>) -> Result<()> {
        self.binder
            .set_attr("range", Value::Tuple(vec![lo.into(), hi.into()]))
    }

    /// Format the range labels with `format`.
    pub fn set_label_format(&self, format: impl Fn(&Value) -> String + 'static) -> Result<()> {
        *self.label_format.borrow_mut() = Rc::new(format);
        self.update_widgets()
    }

    /// Format the field text with `format` when the slider moves.
    pub fn set_field_format(&self, format: impl Fn(&Value) -> String + 'static) {
        *self.field_format.borrow_mut() = Rc::new(format);
    }

    /// Push `range` and `value` out to the labels, the validator, the field
    /// and the slider. The slider gets its range first so it accepts the
    /// value.
    fn update_widgets(&self) -> Result<()> {
        self.binder
            .loopback_guard()
            .run_unlocked("value".to_owned(), || {
                let value = self.binder.get_attr("value")?;
                let range = self.binder.get_attr("range")?;
                let Some([lo, hi]) = range.as_tuple() else {
                    return Err(Error::type_error(format!(
                        "range must be a (low, high) pair, got {range}"
                    )));
                };
                let parts = self.parts.borrow().clone();
                if let Some(parts) = parts {
                    parts
                        .validator
                        .invoke("setRange", &[lo.clone(), hi.clone()])?;
                    if !integral::<S>() {
                        parts
                            .validator
                            .invoke("setDecimals", &[Value::Int(DECIMALS)])?;
                    }
                    let label = Rc::clone(&self.label_format.borrow());
                    parts.low.invoke("setText", &[Value::Str(label(lo))])?;
                    parts.high.invoke("setText", &[Value::Str(label(hi))])?;
                }
                self.field
                    .binder()
                    .set_attr("text", Value::Str(value.to_display_string()))?;
                self.slider.binder().set_attr("range", range.clone())?;
                self.slider.binder().set_attr("value", value)
            })
            .unwrap_or(Ok(()))
    }

    fn slider_moved(&self, value: &Value) -> Result<()> {
        self.binder
            .loopback_guard()
            .run_unlocked("value".to_owned(), || {
                self.binder.set_attr("value", value.clone())?;
                let format = Rc::clone(&self.field_format.borrow());
                self.field
                    .binder()
                    .set_attr("text", Value::Str(format(value)))
            })
            .unwrap_or(Ok(()))
    }

    fn text_entered(&self, text: &Value) -> Result<()> {
        self.binder
            .loopback_guard()
            .run_unlocked("value".to_owned(), || {
                if !self.field.binder().get_attr("valid")?.truthy() {
                    return Ok(());
                }
                let Some(value) = text.as_str().and_then(parse::<S>) else {
                    return Ok(());
                };
                self.binder.set_attr("value", value.clone())?;
                self.slider.binder().set_attr("value", value)
            })
            .unwrap_or(Ok(()))
    }
}

fn with<T>(weak: &Weak<T>, f: impl FnOnce(&T) -> Result<()>) -> Result<()> {
    match weak.upgrade() {
        Some(this) => f(&this),
        None => Ok(()),
    }
}

impl<S: SliderScale> Proxy for RangeSlider<S> {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        vec![
            Rc::clone(&self.slider) as ProxyRef,
            Rc::clone(&self.field) as ProxyRef,
        ]
    }

    fn configure_target(&self) -> Result<()> {
        let toolkit = toolkit::current()?;
        let low = toolkit.create_named("QLabel")?;
        low.invoke("setAlignment", &[Value::Int(ALIGN_RIGHT)])?;
        let high = toolkit.create_named("QLabel")?;
        high.invoke("setAlignment", &[Value::Int(ALIGN_LEFT)])?;

        let layout = toolkit.create_named("QHBoxLayout")?;
        let row = [
            Rc::clone(&low),
            self.slider.widget()?,
            Rc::clone(&high),
            self.field.widget()?,
        ];
        for widget in row {
            layout.invoke("addWidget", &[Value::Widget(widget)])?;
        }
        layout.invoke("setContentsMargins", &vec![Value::Int(0); 4])?;
        self.widget()?
            .invoke("setLayout", &[Value::Widget(layout)])?;

        let validator = toolkit.create_named(if integral::<S>() {
            "QIntValidator"
        } else {
            "QDoubleValidator"
        })?;
        self.field
            .binder()
            .set_attr("validator", Value::Widget(Rc::clone(&validator)))?;
        *self.parts.borrow_mut() = Some(Parts {
            low,
            high,
            validator,
        });
        self.update_widgets()
    }

    fn dispose_target(&self) -> Result<()> {
        self.parts.borrow_mut().take();
        self.binder.dispose()
    }
}

impl<S: SliderScale> fmt::Debug for RangeSlider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeSlider")
            .field("id", &self.binder.id())
            .field("scale", &S::NAME)
            .field("wired", &self.parts.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::slider::FloatScale;

    #[test]
    fn typed_text_parses_per_scale() {
        assert_eq!(parse::<IntScale>(" 42 "), Some(Value::Int(42)));
        assert_eq!(parse::<IntScale>("4.2"), None);
        assert_eq!(parse::<FloatScale>("4.25"), Some(Value::Float(4.25)));
        assert_eq!(parse::<FloatScale>("inf"), None);
    }
}
