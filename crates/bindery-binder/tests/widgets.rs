//! Synchronized widgets: text field, sliders, range slider and drop-downs.

use std::rc::Rc;

use bindery_binder::raw::{ComboBox, IntValidator};
use bindery_binder::widgets::text_field::INVALID_STYLE_RULE;
use bindery_binder::widgets::{FloatScale, IntScale};
use bindery_binder::{
    EditableComboBox, EnumDropDown, FloatSlider, IntSlider, LogSlider, Proxy, RangeSlider,
    TextField, TextMode,
};
use bindery_core::{HasAttributes, Value, WidgetRef};
use bindery_harness::{HORIZONTAL, MockWidget, install_mock_toolkit};

fn mock(widget: &WidgetRef) -> &MockWidget {
    MockWidget::of(widget).expect("created by the mock toolkit")
}

fn ready<P: Proxy>(proxy: &P) -> WidgetRef {
    proxy.construct().unwrap();
    proxy.configure().unwrap();
    proxy.widget().unwrap()
}

#[test]
fn text_field_follows_edits_in_auto_mode() {
    install_mock_toolkit();
    let field = TextField::new().unwrap();
    let widget = ready(field.as_ref());

    mock(&widget).user_edit_text("hello").unwrap();
    assert_eq!(field.binder().get_attr("value").unwrap(), Value::from("hello"));

    field.binder().set_attr("value", Value::from("model")).unwrap();
    assert_eq!(mock(&widget).value("text"), Value::from("model"));
}

#[test]
fn text_field_waits_for_editing_to_finish_in_enter_mode() {
    install_mock_toolkit();
    let field = TextField::new().unwrap();
    field.set_mode(TextMode::Enter).unwrap();
    let widget = ready(field.as_ref());

    mock(&widget).user_edit_text("draft").unwrap();
    assert_eq!(field.binder().get_attr("value").unwrap(), Value::from(""));

    mock(&widget).emit_by_name("editingFinished", &[]).unwrap();
    assert_eq!(field.binder().get_attr("value").unwrap(), Value::from("draft"));
}

#[test]
fn text_field_installs_the_invalid_style() {
    install_mock_toolkit();
    let field = TextField::new().unwrap();
    let widget = ready(field.as_ref());
    assert_eq!(mock(&widget).value("styleSheet"), Value::from(INVALID_STYLE_RULE));
    assert_eq!(widget.dynamic_property("valid"), Some(Value::Bool(true)));
}

#[test]
fn text_field_tracks_validity() {
    install_mock_toolkit();
    let validator = IntValidator::new().unwrap();
    validator.construct().unwrap();
    validator.binder().set_attr("bottom", Value::Int(0)).unwrap();
    validator.binder().set_attr("top", Value::Int(100)).unwrap();

    let field = TextField::new().unwrap();
    let widget = ready(field.as_ref());
    let polished = mock(&widget).repolish_count();

    // An empty text is only intermediate.
    field
        .binder()
        .set_attr("validator", Value::Object(validator.object()))
        .unwrap();
    assert_eq!(widget.dynamic_property("valid"), Some(Value::Bool(false)));

    mock(&widget).user_edit_text("42").unwrap();
    assert_eq!(widget.dynamic_property("valid"), Some(Value::Bool(true)));

    mock(&widget).user_edit_text("4x").unwrap();
    assert_eq!(field.binder().get_attr("valid").unwrap(), Value::Bool(false));
    assert!(mock(&widget).repolish_count() > polished);
}

#[test]
fn int_slider_syncs_both_ways() {
    install_mock_toolkit();
    let slider = IntSlider::new().unwrap();
    let widget = ready(slider.as_ref());
    let native = mock(&widget);
    assert_eq!(native.value("orientation"), Value::Int(HORIZONTAL));

    slider.binder().set_attr("value", Value::Int(42)).unwrap();
    assert_eq!(native.value("value"), Value::Int(42));

    native.set_value("value", Value::Int(7)).unwrap();
    assert_eq!(slider.binder().get_attr("value").unwrap(), Value::Int(7));

    // Narrowing the range clamps the native value, which flows back.
    slider.set_range(10, 20).unwrap();
    assert_eq!(native.value("minimum"), Value::Int(10));
    assert_eq!(native.value("maximum"), Value::Int(20));
    assert_eq!(slider.binder().get_attr("value").unwrap(), Value::Int(10));
}

#[test]
fn float_slider_maps_onto_precision_steps() {
    install_mock_toolkit();
    let slider = FloatSlider::new().unwrap();
    let widget = ready(slider.as_ref());
    let native = mock(&widget);
    assert_eq!(native.value("maximum"), Value::Int(1000));

    slider.binder().set_attr("value", Value::Float(0.25)).unwrap();
    assert_eq!(native.value("value"), Value::Int(250));

    native.set_value("value", Value::Int(500)).unwrap();
    assert_eq!(slider.binder().get_attr("value").unwrap(), Value::Float(0.5));

    slider.set_range(0.0, 2.0).unwrap();
    assert_eq!(native.value("value"), Value::Int(250));
    assert_eq!(slider.binder().get_attr("value").unwrap(), Value::Float(0.5));
}

#[test]
fn log_slider_spans_decades_from_its_low_end() {
    install_mock_toolkit();
    let slider = LogSlider::new().unwrap();
    assert_eq!(slider.binder().get_attr("value").unwrap(), Value::Float(0.0));
    let widget = ready(slider.as_ref());
    let native = mock(&widget);
    assert_eq!(native.value("value"), Value::Int(0));

    slider.binder().set_attr("value", Value::Float(1.0)).unwrap();
    assert_eq!(native.value("value"), Value::Int(500));

    slider.binder().set_attr("value", Value::Float(10.0)).unwrap();
    assert_eq!(native.value("value"), Value::Int(750));

    native.set_value("value", Value::Int(1000)).unwrap();
    let value = slider.binder().get_attr("value").unwrap();
    let value = value.as_float().unwrap();
    assert!((value - 100.0).abs() < 1e-9, "got {value}");
}

#[test]
fn enum_dropdown_selects_by_value() {
    install_mock_toolkit();
    let dropdown = EnumDropDown::new().unwrap();
    dropdown
        .set_choices([(1, "One"), (2, "Two"), (3, "Three")])
        .unwrap();
    let widget = ready(dropdown.as_ref());
    let native = mock(&widget);

    assert_eq!(native.items(), ["One", "Two", "Three"]);
    assert_eq!(dropdown.binder().get_attr("value").unwrap(), Value::Int(1));

    dropdown.binder().set_attr("value", Value::Int(3)).unwrap();
    assert_eq!(native.value("currentIndex"), Value::Int(2));

    native.set_value("currentIndex", Value::Int(1)).unwrap();
    assert_eq!(dropdown.binder().get_attr("value").unwrap(), Value::Int(2));

    // Unknown values clear the selection without touching the model.
    dropdown.binder().set_attr("value", Value::Int(9)).unwrap();
    assert_eq!(native.value("currentIndex"), Value::Int(-1));
    assert_eq!(dropdown.binder().get_attr("value").unwrap(), Value::Int(9));
}

#[test]
fn enum_dropdown_keeps_selection_across_new_choices() {
    install_mock_toolkit();
    let dropdown = EnumDropDown::new().unwrap();
    dropdown.set_choices([(1, "a"), (4, "b")]).unwrap();
    let widget = ready(dropdown.as_ref());
    let native = mock(&widget);

    dropdown.binder().set_attr("value", Value::Int(4)).unwrap();
    dropdown
        .set_choices([(7, "x"), (4, "y"), (8, "z")])
        .unwrap();

    assert_eq!(native.items(), ["x", "y", "z"]);
    assert_eq!(native.value("currentIndex"), Value::Int(1));
    assert_eq!(dropdown.binder().get_attr("value").unwrap(), Value::Int(4));
}

#[test]
fn enum_dropdown_matches_values_with_its_comparator() {
    install_mock_toolkit();
    let dropdown = EnumDropDown::new().unwrap();
    dropdown.set_same_as(|a, b| match (a.as_float(), b.as_float()) {
        (Some(a), Some(b)) => (a - b).abs() < 0.01,
        _ => false,
    });
    dropdown
        .set_choices([(Value::Float(1.0), "one"), (Value::Float(2.0), "two")])
        .unwrap();
    let widget = ready(dropdown.as_ref());
    let native = mock(&widget);

    dropdown.binder().set_attr("value", Value::Float(2.001)).unwrap();
    assert_eq!(native.value("currentIndex"), Value::Int(1));
    assert_eq!(dropdown.binder().get_attr("value").unwrap(), Value::Float(2.001));

    dropdown
        .set_choices([(Value::Float(3.0), "three"), (Value::Float(1.999), "almost two")])
        .unwrap();
    assert_eq!(native.value("currentIndex"), Value::Int(1));
}

#[test]
fn combo_box_wraps_its_line_edit_while_editable() {
    install_mock_toolkit();
    let combo = ComboBox::new().unwrap();
    let widget = ready(combo.as_ref());
    let native = mock(&widget);
    assert!(combo.line_edit().is_none());
    assert!(combo.binder().child("lineEdit").is_none());

    combo.binder().set_attr("editable", Value::Bool(true)).unwrap();
    let edit = combo.line_edit().expect("editable combo box has a line edit");
    let native_edit = native.line_edit().unwrap();
    assert!(Rc::ptr_eq(&edit.widget().unwrap(), &native_edit));
    assert!(combo.binder().child("lineEdit").is_some());

    mock(&native_edit).user_edit_text("typed").unwrap();
    assert_eq!(edit.binder().get_attr("text").unwrap(), Value::from("typed"));
    assert_eq!(native.value("currentText"), Value::from("typed"));

    combo.binder().set_attr("editable", Value::Bool(false)).unwrap();
    assert!(combo.line_edit().is_none());
    assert!(combo.binder().child("lineEdit").is_none());
    assert!(native.line_edit().is_none());
}

#[test]
fn editable_combo_box_takes_listed_and_typed_values() {
    install_mock_toolkit();
    let combo = EditableComboBox::new().unwrap();
    combo.set_choices([(1, "One"), (2, "Two")]).unwrap();
    let widget = ready(combo.as_ref());
    let native = mock(&widget);
    assert_eq!(native.items(), ["One", "Two"]);
    assert!(combo.line_edit().is_some());

    widget.invoke("setCurrentIndex", &[Value::Int(1)]).unwrap();
    assert_eq!(combo.binder().get_attr("value").unwrap(), Value::Int(2));

    let edit = native.line_edit().unwrap();
    mock(&edit).user_edit_text("Three").unwrap();
    assert_eq!(combo.binder().get_attr("value").unwrap(), Value::from("Three"));

    // Typed text survives a reload of the choices.
    combo.set_choices([(5, "Five")]).unwrap();
    assert_eq!(native.items(), ["Five"]);
    assert_eq!(native.value("currentText"), Value::from("Three"));
    assert_eq!(combo.binder().get_attr("value").unwrap(), Value::from("Three"));
}

#[test]
fn editable_combo_box_reselects_a_listed_value_after_reload() {
    install_mock_toolkit();
    let combo = EditableComboBox::new().unwrap();
    combo.set_choices([(1, "One"), (2, "Two")]).unwrap();
    let widget = ready(combo.as_ref());
    let native = mock(&widget);
    widget.invoke("setCurrentIndex", &[Value::Int(1)]).unwrap();
    assert_eq!(native.value("currentText"), Value::from("Two"));

    combo.set_choices([(2, "Deux"), (3, "Trois")]).unwrap();
    assert_eq!(native.value("currentIndex"), Value::Int(0));
    assert_eq!(native.value("currentText"), Value::from("Deux"));
}

fn range_parts(range: &WidgetRef) -> Vec<WidgetRef> {
    let layout = mock(range).value("layout");
    let layout = layout.as_widget().expect("range slider sets a layout");
    mock(layout).children()
}

#[test]
fn range_slider_lays_out_labels_slider_and_field() {
    install_mock_toolkit();
    let range = RangeSlider::<IntScale>::new().unwrap();
    range.set_range(0, 10).unwrap();
    range.binder().set_attr("value", Value::Int(3)).unwrap();
    let widget = ready(range.as_ref());

    let parts = range_parts(&widget);
    assert_eq!(parts.len(), 4);
    assert!(Rc::ptr_eq(&parts[1], &range.slider().widget().unwrap()));
    assert!(Rc::ptr_eq(&parts[3], &range.field().widget().unwrap()));
    assert_eq!(mock(&parts[0]).value("text"), Value::from("0"));
    assert_eq!(mock(&parts[2]).value("text"), Value::from("10"));
    assert_eq!(mock(&parts[1]).value("value"), Value::Int(3));
    assert_eq!(mock(&parts[3]).value("text"), Value::from("3"));
    assert_eq!(
        range.binder().get_attr("binder_class").unwrap(),
        Value::from("RangeSlider")
    );

    range
        .set_label_format(|v| format!("{}%", v.to_display_string()))
        .unwrap();
    assert_eq!(mock(&parts[2]).value("text"), Value::from("10%"));
}

#[test]
fn range_slider_follows_slider_and_valid_text() {
    install_mock_toolkit();
    let range = RangeSlider::<IntScale>::new().unwrap();
    range.set_range(0, 10).unwrap();
    let widget = ready(range.as_ref());
    let parts = range_parts(&widget);
    let (slider, field) = (mock(&parts[1]), mock(&parts[3]));

    slider.set_value("value", Value::Int(7)).unwrap();
    assert_eq!(range.binder().get_attr("value").unwrap(), Value::Int(7));
    assert_eq!(field.value("text"), Value::from("7"));

    field.user_edit_text("4").unwrap();
    assert_eq!(range.binder().get_attr("value").unwrap(), Value::Int(4));
    assert_eq!(slider.value("value"), Value::Int(4));

    // Out of range, so the validator rejects it.
    field.user_edit_text("42").unwrap();
    assert_eq!(range.field().binder().get_attr("valid").unwrap(), Value::Bool(false));
    assert_eq!(range.binder().get_attr("value").unwrap(), Value::Int(4));
    assert_eq!(slider.value("value"), Value::Int(4));
}

#[test]
fn float_range_slider_uses_a_double_validator() {
    install_mock_toolkit();
    let range = RangeSlider::<FloatScale>::new().unwrap();
    range.set_range(0.0, 2.0).unwrap();
    let widget = ready(range.as_ref());
    let parts = range_parts(&widget);

    let validator = range.field().binder().get_attr("validator").unwrap();
    let validator = mock(validator.as_widget().unwrap());
    assert_eq!(validator.value("top"), Value::Float(2.0));
    assert_eq!(validator.value("decimals"), Value::Int(16));

    mock(&parts[3]).user_edit_text("0.5").unwrap();
    assert_eq!(range.binder().get_attr("value").unwrap(), Value::Float(0.5));
    assert_eq!(mock(&parts[1]).value("value"), Value::Int(250));
}
