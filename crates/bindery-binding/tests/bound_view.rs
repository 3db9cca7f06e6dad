//! Activating and tearing down bound views.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_binder::raw::{Label, LineEdit, RadioButton};
use bindery_binder::{ButtonGroup, ButtonId, Proxy, ProxyRef, VBoxLayout, proxy_ref};
use bindery_binding::{Binding, BoundView, Context};
use bindery_core::{Error, HasAttributes, Model, ObjectRef, Value, WidgetRef};
use bindery_harness::{MockWidget, install_mock_toolkit};

fn mock(widget: &WidgetRef) -> &MockWidget {
    MockWidget::of(widget).expect("created by the mock toolkit")
}

fn model() -> Rc<Model> {
    Model::builder("Form")
        .attr("name", "Ada")
        .attr("greeting", "")
        .build()
}

fn host(model: &Rc<Model>) -> Context {
    let object: ObjectRef = model.clone();
    Context::new().with("object", object)
}

struct Form {
    root: ProxyRef,
    title: Rc<Label>,
    edit: Rc<LineEdit>,
}

fn form() -> Form {
    let title = Label::new().unwrap();
    title.binder().set_id("title").unwrap();
    let edit = LineEdit::new().unwrap();
    edit.binder().set_id("edit").unwrap();
    let root: ProxyRef = VBoxLayout::new(vec![proxy_ref(&title), proxy_ref(&edit)]).unwrap();
    Form { root, title, edit }
}

#[test]
fn activation_binds_and_deactivation_tears_down() {
    let tk = install_mock_toolkit();
    let model = model();
    let Form { root, title, edit } = form();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    let view = BoundView::builder(Rc::clone(&root))
        .bind("edit.text := object.name")
        .bind("title.text << prefix + object.name")
        .context("prefix", "Hello, ")
        .configure(move |_, ctx| {
            let mut names: Vec<String> = ctx.names().map(str::to_owned).collect();
            names.sort();
            *record.borrow_mut() = names;
            Ok(())
        })
        .stylesheet("QLabel { color: gray; }")
        .build()
        .unwrap();
    assert!(!view.is_active());

    let control = view.activate(&host(&model)).unwrap();
    assert!(view.is_active());
    assert_eq!(*seen.borrow(), ["edit", "object", "prefix", "title"]);

    // The root is a layout, so the control is a plain widget holding it.
    assert_eq!(control.meta_class().name(), "QWidget");
    assert_eq!(tk.created_of("QWidget").len(), 1);
    assert_eq!(
        mock(&control).value("styleSheet"),
        Value::from("QLabel { color: gray; }")
    );

    let title_widget = title.widget().unwrap();
    let edit_widget = edit.widget().unwrap();
    assert_eq!(mock(&title_widget).value("text"), Value::from("Hello, Ada"));
    assert_eq!(mock(&edit_widget).value("text"), Value::from("Ada"));

    mock(&edit_widget).user_edit_text("Grace").unwrap();
    assert_eq!(model.get_attr("name").unwrap(), Value::from("Grace"));
    assert_eq!(mock(&title_widget).value("text"), Value::from("Hello, Grace"));

    // A second activation hands back the same control.
    let again = view.activate(&host(&model)).unwrap();
    assert!(Rc::ptr_eq(&again, &control));

    view.deactivate().unwrap();
    assert!(!view.is_active());
    assert_eq!(model.listener_count("name"), 0);
    assert_eq!(mock(&edit_widget).total_connections(), 0);

    model.set_attr("name", Value::from("Lovelace")).unwrap();
    assert_eq!(mock(&title_widget).value("text"), Value::from("Hello, Grace"));

    view.deactivate().unwrap();
}

#[test]
fn widget_root_is_its_own_control() {
    install_mock_toolkit();
    let model = model();
    let label = Label::new().unwrap();
    let view = BoundView::builder(proxy_ref(&label))
        .bind("text << 'Hi ' + object.name")
        .build()
        .unwrap();

    let control = view.activate(&host(&model)).unwrap();
    assert!(Rc::ptr_eq(&control, &label.widget().unwrap()));
    assert_eq!(mock(&control).value("text"), Value::from("Hi Ada"));
    view.deactivate().unwrap();
}

#[test]
fn failed_binding_rolls_back_earlier_ones() {
    install_mock_toolkit();
    let model = model();
    let Form { root, .. } = form();
    let view = BoundView::builder(root)
        .bind("title.text << object.name")
        .bind("edit.text << object.missing")
        .build()
        .unwrap();

    let err = view.activate(&host(&model)).unwrap_err();
    assert!(matches!(err, Error::UnknownAttribute { .. }), "{err}");
    assert!(!view.is_active());
    assert_eq!(model.listener_count("name"), 0);
}

#[test]
fn failed_configure_callback_rolls_back_bindings() {
    install_mock_toolkit();
    let model = model();
    let Form { root, title, edit } = form();
    let view = BoundView::builder(root)
        .bind("title.text << object.name")
        .bind("edit.text := object.greeting")
        .configure(|_, _| Err(Error::Toolkit("configure refused".into())))
        .build()
        .unwrap();

    let err = view.activate(&host(&model)).unwrap_err();
    assert!(matches!(err, Error::Toolkit(ref message) if message == "configure refused"), "{err}");
    assert!(!view.is_active());
    assert_eq!(model.listener_count("name"), 0);
    assert_eq!(model.listener_count("greeting"), 0);

    let title_widget = title.widget().unwrap();
    let edit_widget = edit.widget().unwrap();
    assert_eq!(mock(&edit_widget).total_connections(), 0);
    model.set_attr("name", Value::from("Grace")).unwrap();
    assert_eq!(mock(&title_widget).value("text"), Value::from("Ada"));
}

#[test]
fn malformed_binding_fails_at_build() {
    install_mock_toolkit();
    let Form { root, .. } = form();
    let err = BoundView::builder(root).bind("title.text").build().unwrap_err();
    assert!(matches!(err, Error::MalformedBinding(_)));
}

#[test]
fn bindings_keep_declaration_order() {
    install_mock_toolkit();
    let Form { root, .. } = form();
    let view = BoundView::builder(root)
        .bind("title.text = 'first'")
        .bindings([Binding::set_once("title.text", "'second'").unwrap()])
        .bind("edit.text = 'third'")
        .build()
        .unwrap();
    let lefts: Vec<String> = view
        .bindings()
        .iter()
        .map(|b| format!("{b}"))
        .collect();
    assert_eq!(
        lefts,
        ["title.text = 'first'", "title.text = 'second'", "edit.text = 'third'"]
    );
}

#[test]
fn button_groups_collect_their_buttons() {
    install_mock_toolkit();
    let model = model();
    let first = RadioButton::new().unwrap();
    first.binder().set_id("first").unwrap();
    let second = RadioButton::new().unwrap();
    second.binder().set_id("second").unwrap();
    let root: ProxyRef = VBoxLayout::new(vec![proxy_ref(&first), proxy_ref(&second)]).unwrap();

    let group = ButtonGroup::new(vec![ButtonId::from("first"), ButtonId::from(("second", 7))])
        .unwrap();
    let view = BoundView::builder(root)
        .button_group("choices", Rc::clone(&group))
        .bind("choices.exclusive = False")
        .build()
        .unwrap();
    view.activate(&host(&model)).unwrap();

    let native = group.widget().unwrap();
    assert_eq!(
        mock(&native).calls_to("addButton"),
        vec![
            vec![Value::Widget(first.widget().unwrap())],
            vec![Value::Widget(second.widget().unwrap()), Value::Int(7)],
        ]
    );
    assert_eq!(mock(&native).value("exclusive"), Value::Bool(false));
    view.deactivate().unwrap();
}
