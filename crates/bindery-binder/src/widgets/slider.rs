#![forbid(unsafe_code)]

//! Sliders whose model value is mapped onto the toolkit's integer position.
//!
//! The native `value` property is renamed `qt_value`; `value` is the model
//! value in scale units and `range` its inclusive bounds. A loopback guard
//! on `"value"` keeps the two sides from echoing each other.
//!
//! | Scale          | Position of `v` for range `(lo, hi)` and precision `p` |
//! |----------------|--------------------------------------------------------|
//! | [`IntScale`]   | `v` itself; the native range is set to `(lo, hi)`      |
//! | [`FloatScale`] | `round((v - lo) * p / (hi - lo))`, clamped to `[0, p]` |
//! | [`LogScale`]   | the float mapping applied to `ln v`, `v` at least `lo` |

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use bindery_core::{Error, HasAttributes, Result, Value};

use crate::binder::Binder;
use crate::class::{BinderClass, ClassDecl};
use crate::proxy::Proxy;
use crate::raw;

/// `Qt::Horizontal`.
pub const HORIZONTAL: i64 = 1;

/// Default number of steps for continuous scales.
pub const DEFAULT_PRECISION: i64 = 1000;

/// Mapping between model values and slider positions.
pub trait SliderScale: 'static {
    const NAME: &'static str;

    /// Number of positions for continuous scales; `None` when positions are
    /// the values themselves.
    const PRECISION: Option<i64>;

    fn default_value() -> Value;

    fn default_range() -> (Value, Value);

    fn to_position(value: &Value, range: (&Value, &Value), precision: i64) -> Result<i64>;

    fn from_position(position: i64, range: (&Value, &Value), precision: i64) -> Result<Value>;
}

#[derive(Debug)]
pub struct IntScale;

impl SliderScale for IntScale {
    const NAME: &'static str = "IntSlider";
    const PRECISION: Option<i64> = None;

    fn default_value() -> Value {
        Value::Int(0)
    }

    fn default_range() -> (Value, Value) {
        (Value::Int(0), Value::Int(99))
    }

    fn to_position(value: &Value, _range: (&Value, &Value), _precision: i64) -> Result<i64> {
        value.expect_int("slider value")
    }

    fn from_position(position: i64, _range: (&Value, &Value), _precision: i64) -> Result<Value> {
        Ok(Value::Int(position))
    }
}

fn float_bounds((lo, hi): (&Value, &Value)) -> Result<(f64, f64)> {
    Ok((lo.expect_float("slider range")?, hi.expect_float("slider range")?))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn quantize(fraction: f64, precision: i64) -> i64 {
    let position = (fraction * precision as f64).round();
    if position.is_nan() {
        return 0;
    }
    (position as i64).clamp(0, precision)
}

#[allow(clippy::cast_precision_loss)]
fn fraction(position: i64, precision: i64) -> f64 {
    if precision == 0 {
        return 0.0;
    }
    position as f64 / precision as f64
}

#[derive(Debug)]
pub struct FloatScale;

impl SliderScale for FloatScale {
    const NAME: &'static str = "FloatSlider";
    const PRECISION: Option<i64> = Some(DEFAULT_PRECISION);

    fn default_value() -> Value {
        Value::Float(0.0)
    }

    fn default_range() -> (Value, Value) {
        (Value::Float(0.0), Value::Float(1.0))
    }

    fn to_position(value: &Value, range: (&Value, &Value), precision: i64) -> Result<i64> {
        let (lo, hi) = float_bounds(range)?;
        let value = value.expect_float("slider value")?;
        Ok(quantize((value - lo) / (hi - lo), precision))
    }

    fn from_position(position: i64, range: (&Value, &Value), precision: i64) -> Result<Value> {
        let (lo, hi) = float_bounds(range)?;
        Ok(Value::Float(fraction(position, precision) * (hi - lo) + lo))
    }
}

#[derive(Debug)]
pub struct LogScale;

impl SliderScale for LogScale {
    const NAME: &'static str = "LogSlider";
    const PRECISION: Option<i64> = Some(DEFAULT_PRECISION);

    /// Below any positive range, so a fresh slider sits at its low end.
    fn default_value() -> Value {
        Value::Float(0.0)
    }

    fn default_range() -> (Value, Value) {
        (Value::Float(1e-2), Value::Float(100.0))
    }

    fn to_position(value: &Value, range: (&Value, &Value), precision: i64) -> Result<i64> {
        let (lo, hi) = float_bounds(range)?;
        if lo <= 0.0 {
            return Err(Error::type_error(format!(
                "logarithmic slider range must be positive, got ({lo}, {hi})"
            )));
        }
        let value = value.expect_float("slider value")?.max(lo);
        let (log_lo, log_hi) = (lo.ln(), hi.ln());
        Ok(quantize((value.ln() - log_lo) / (log_hi - log_lo), precision))
    }

    fn from_position(position: i64, range: (&Value, &Value), precision: i64) -> Result<Value> {
        let (lo, hi) = float_bounds(range)?;
        let (log_lo, log_hi) = (lo.ln(), hi.ln());
        Ok(Value::Float(
            (fraction(position, precision) * (log_hi - log_lo) + log_lo).exp(),
        ))
    }
}

/// A slider synchronized with a model value through scale `S`.
pub struct Slider<S> {
    binder: Rc<Binder>,
    _scale: PhantomData<S>,
}

pub type IntSlider = Slider<IntScale>;
pub type FloatSlider = Slider<FloatScale>;
pub type LogSlider = Slider<LogScale>;

impl<S: SliderScale> BinderClass for Slider<S> {
    const NAME: &'static str = S::NAME;
    const TARGET: &'static str = raw::Slider::TARGET;

    fn declare(decl: &mut ClassDecl) {
        raw::Slider::declare(decl);
        let (lo, hi) = S::default_range();
        decl.attribute("value", S::default_value())
            .attribute("range", Value::Tuple(vec![lo, hi]))
            .rename("value", "qt_value")
            .default_value("orientation", HORIZONTAL);
        if let Some(precision) = S::PRECISION {
            decl.attribute("precision", precision);
        }
    }
}

impl<S: SliderScale> Slider<S> {
    pub fn new() -> Result<Rc<Self>> {
        let binder = Binder::new::<Self>()?;

        binder.on_change("value", |b, _| guarded(b, push_value::<S>))?;
        binder.on_change("qt_value", |b, change| {
            let position = change.new.expect_int("slider position")?;
            guarded(b, |b| {
                let value = with_range(b, |range| {
                    S::from_position(position, range, precision::<S>(b)?)
                })?;
                b.set_attr("value", value)
            })
        })?;
        binder.on_change("range", |b, _| {
            if S::PRECISION.is_some() {
                guarded(b, push_value::<S>)
            } else {
                apply_range(b)
            }
        })?;
        if S::PRECISION.is_some() {
            binder.on_change("precision", |b, change| b.set_attr("maximum", change.new.clone()))?;
        }

        Ok(Rc::new(Self {
            binder,
            _scale: PhantomData,
        }))
    }

    /// Set both ends of the inclusive range.
    pub fn set_range(&self, lo: impl Into<Value>, hi: impl Into<Value>) -> Result<()> {
        self.binder
            .set_attr("range", Value::Tuple(vec![lo.into(), hi.into()]))
    }
}

fn guarded(binder: &Binder, f: impl FnOnce(&Binder) -> Result<()>) -> Result<()> {
    binder
        .loopback_guard()
        .run_unlocked("value".to_owned(), || f(binder))
        .unwrap_or(Ok(()))
}

fn with_range<R>(binder: &Binder, f: impl FnOnce((&Value, &Value)) -> Result<R>) -> Result<R> {
    let range = binder.get_attr("range")?;
    match range.as_tuple() {
        Some([lo, hi]) => f((lo, hi)),
        _ => Err(Error::type_error(format!(
            "slider range must be a (low, high) pair, got {range}"
        ))),
    }
}

fn precision<S: SliderScale>(binder: &Binder) -> Result<i64> {
    match S::PRECISION {
        Some(_) => binder.get_attr("precision")?.expect_int("slider precision"),
        None => Ok(0),
    }
}

fn push_value<S: SliderScale>(binder: &Binder) -> Result<()> {
    let value = binder.get_attr("value")?;
    let position = with_range(binder, |range| {
        S::to_position(&value, range, precision::<S>(binder)?)
    })?;
    binder.set_attr("qt_value", Value::Int(position))
}

/// Give the native slider the model range, or buffer it as minimum and
/// maximum when no widget is attached yet.
fn apply_range(binder: &Binder) -> Result<()> {
    let range = binder.get_attr("range")?;
    if binder.has_target() {
        return binder.set_attr("setRange", range);
    }
    with_range(binder, |(lo, hi)| {
        binder.set_attr("minimum", lo.clone())?;
        binder.set_attr("maximum", hi.clone())
    })
}

impl<S: SliderScale> Proxy for Slider<S> {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn configure_target(&self) -> Result<()> {
        match S::PRECISION {
            Some(_) => {
                let precision = self.binder.get_attr("precision")?;
                self.binder.set_attr("maximum", precision)?;
            }
            None => apply_range(&self.binder)?,
        }
        guarded(&self.binder, push_value::<S>)
    }
}

impl<S: SliderScale> fmt::Debug for Slider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.binder.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_range() -> (Value, Value) {
        (Value::Float(0.0), Value::Float(10.0))
    }

    #[test]
    fn float_positions_quantize_and_clamp() {
        let (lo, hi) = float_range();
        let pos = |v: f64| FloatScale::to_position(&Value::Float(v), (&lo, &hi), 1000).unwrap();
        assert_eq!(pos(0.0), 0);
        assert_eq!(pos(5.0), 500);
        assert_eq!(pos(10.0), 1000);
        assert_eq!(pos(-3.0), 0);
        assert_eq!(pos(12.0), 1000);
        assert_eq!(
            FloatScale::from_position(250, (&lo, &hi), 1000).unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn log_positions_span_decades() {
        let (lo, hi) = LogScale::default_range();
        let pos = |v: f64| LogScale::to_position(&Value::Float(v), (&lo, &hi), 1000).unwrap();
        assert_eq!(pos(0.01), 0);
        assert_eq!(pos(1.0), 500);
        assert_eq!(pos(100.0), 1000);
        // Values below the range clamp to its low end.
        assert_eq!(pos(0.0), 0);

        let Value::Float(mid) = LogScale::from_position(500, (&lo, &hi), 1000).unwrap() else {
            panic!("expected a float");
        };
        assert!((mid - 1.0).abs() < 1e-9);
    }

    #[test]
    fn int_positions_are_values() {
        let (lo, hi) = IntScale::default_range();
        assert_eq!(IntScale::to_position(&Value::Int(42), (&lo, &hi), 0).unwrap(), 42);
        assert!(IntScale::to_position(&Value::from("x"), (&lo, &hi), 0).is_err());
    }

    #[test]
    fn non_positive_log_range_is_rejected() {
        let (lo, hi) = (Value::Float(0.0), Value::Float(1.0));
        assert!(LogScale::to_position(&Value::Float(0.5), (&lo, &hi), 1000).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn float_positions_stay_on_the_track(
                lo in -1e6f64..1e6,
                span in 1e-3f64..1e6,
                v in prop::num::f64::ANY,
                precision in 1i64..10_000,
            ) {
                let (lo_v, hi_v) = (Value::Float(lo), Value::Float(lo + span));
                let pos = FloatScale::to_position(&Value::Float(v), (&lo_v, &hi_v), precision).unwrap();
                prop_assert!((0..=precision).contains(&pos));
            }

            #[test]
            fn float_positions_survive_a_round_trip(
                lo in -1e3f64..1e3,
                span in 1e-2f64..1e3,
                pos in 0i64..=1000,
            ) {
                let range = (Value::Float(lo), Value::Float(lo + span));
                let value = FloatScale::from_position(pos, (&range.0, &range.1), 1000).unwrap();
                let back = FloatScale::to_position(&value, (&range.0, &range.1), 1000).unwrap();
                prop_assert_eq!(back, pos);
            }

            #[test]
            fn log_positions_grow_with_the_value(a in 1e-2f64..100.0, b in 1e-2f64..100.0) {
                let (lo, hi) = LogScale::default_range();
                let pos = |v: f64| LogScale::to_position(&Value::Float(v), (&lo, &hi), 1000).unwrap();
                let (small, large) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(pos(small) <= pos(large));
            }
        }
    }
}
