#![forbid(unsafe_code)]

//! Widgets that keep a model-facing `value` in sync with native widget state.

pub mod choices;
pub mod editable_combo_box;
pub mod enum_dropdown;
pub mod range_slider;
pub mod slider;
pub mod text_field;

pub use choices::SameAs;
pub use editable_combo_box::EditableComboBox;
pub use enum_dropdown::EnumDropDown;
pub use range_slider::{RangeSlider, ValueFormat};
pub use slider::{
    FloatScale, FloatSlider, IntScale, IntSlider, LogScale, LogSlider, Slider, SliderScale,
};
pub use text_field::{INVALID_STYLE_RULE, TextField, TextMode};
