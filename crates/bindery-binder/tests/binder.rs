#![forbid(unsafe_code)]

//! Binder behavior against the in-memory toolkit: reflection, buffering,
//! lazy signal connection and toolkit quirks.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_binder::raw::{Label, LineEdit, PushButton, Slider, Timer};
use bindery_binder::{Binder, BinderClass, ClassDecl, Descriptor, Proxy, initialization_count};
use bindery_core::{
    Change, Error, HasAttributes, ListenerId, ToolkitQuirks, Value, listener,
};
use bindery_harness::{HORIZONTAL, MockWidget, install_mock_toolkit};

fn record(object: &Binder, name: &str) -> (Rc<RefCell<Vec<Change>>>, ListenerId) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let id = object
        .observe(
            name,
            listener(move |change| {
                sink.borrow_mut().push(change.clone());
                Ok(())
            }),
        )
        .unwrap();
    (log, id)
}

#[test]
fn reflection_runs_once_per_class() {
    install_mock_toolkit();
    let a = LineEdit::new().unwrap();
    let b = LineEdit::new().unwrap();
    assert_eq!(initialization_count::<LineEdit>(), 1);
    assert!(Rc::ptr_eq(a.binder().class(), b.binder().class()));
}

#[test]
fn reflected_attributes_cover_every_kind() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let class = edit.binder().class();
    let kind = |name: &str| class.descriptor(name).map(Descriptor::kind);

    assert_eq!(kind("text"), Some("property"));
    assert_eq!(kind("objectName"), Some("property"));
    assert_eq!(kind("textChanged"), Some("signal"));
    assert_eq!(kind("selectAll"), Some("slot"));
    assert_eq!(kind("validator"), Some("getter/setter"));
    assert_eq!(kind("font"), Some("getter/setter"));
    // `raise` is a reserved word in expressions.
    assert_eq!(kind("raise"), None);
    assert_eq!(kind("raise_"), None);
    // Overloaded signals get qualified names next to the plain one.
    assert_eq!(kind("destroyed"), Some("signal"));
    assert_eq!(kind("destroyed_QObject"), Some("signal"));
}

#[test]
fn buffered_writes_replay_on_attach_and_win_over_defaults() {
    struct Caption;
    impl BinderClass for Caption {
        const NAME: &'static str = "Caption";
        const TARGET: &'static str = "QLabel";
        fn declare(decl: &mut ClassDecl) {
            decl.default_value("text", "default").default_value("wordWrap", true);
        }
    }

    let tk = install_mock_toolkit();
    let binder = Binder::new::<Caption>().unwrap();
    binder.set_attr("text", Value::from("first")).unwrap();
    binder.set_attr("text", Value::from("second")).unwrap();
    assert_eq!(binder.get_attr("text").unwrap(), Value::from("second"));
    assert!(tk.created().is_empty());

    binder.construct().unwrap();
    assert_eq!(binder.get_attr("text").unwrap(), Value::from("second"));
    assert_eq!(binder.get_attr("wordWrap").unwrap(), Value::Bool(true));
}

#[test]
fn unattached_reads_without_buffer_are_unavailable() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let binder = edit.binder();
    assert!(matches!(
        binder.get_attr("text"),
        Err(Error::Unavailable { kind: "property", .. })
    ));
    assert!(matches!(
        binder.get_attr("validator"),
        Err(Error::Unavailable { kind: "getter", .. })
    ));
    assert!(matches!(
        binder.get_attr("selectAll"),
        Err(Error::Unavailable { kind: "slot", .. })
    ));
}

#[test]
fn target_is_assigned_once() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    edit.construct().unwrap();
    let err = edit.construct().unwrap_err();
    assert!(matches!(err, Error::TargetReassigned { .. }));
}

#[test]
fn property_without_notify_signal_notifies_exactly_once() {
    install_mock_toolkit();
    let label = Label::new().unwrap();
    label.construct().unwrap();
    let (log, _) = record(label.binder(), "text");

    label.binder().set_attr("text", Value::from("hi")).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].old, Value::from(""));
    assert_eq!(log[0].new, Value::from("hi"));
}

#[test]
fn notify_signal_drives_change_notifications() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    edit.construct().unwrap();
    let (log, _) = record(edit.binder(), "text");

    edit.binder().set_attr("text", Value::from("typed")).unwrap();
    let widget = edit.widget().unwrap();
    MockWidget::of(&widget)
        .unwrap()
        .user_edit_text("user")
        .unwrap();

    let news: Vec<Value> = log.borrow().iter().map(|c| c.new.clone()).collect();
    assert_eq!(news, vec![Value::from("typed"), Value::from("user")]);
}

#[test]
fn signals_connect_lazily_and_disconnect_with_last_observer() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let binder = edit.binder();

    // Observed before the widget exists: the connection is queued.
    let (_, first) = record(binder, "textEdited");
    assert!(!binder.is_connected("textEdited"));
    edit.construct().unwrap();
    assert!(binder.is_connected("textEdited"));

    let widget = edit.widget().unwrap();
    let mock = MockWidget::of(&widget).unwrap();
    assert_eq!(mock.connection_count("textEdited"), 1);

    let (_, second) = record(binder, "textEdited");
    assert_eq!(mock.connection_count("textEdited"), 1);

    binder.unobserve("textEdited", first).unwrap();
    assert_eq!(mock.connection_count("textEdited"), 1);
    binder.unobserve("textEdited", second).unwrap();
    assert_eq!(mock.connection_count("textEdited"), 0);
    assert!(!binder.is_connected("textEdited"));
}

#[test]
fn observe_then_unobserve_before_attach_leaves_nothing_connected() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let (_, id) = record(edit.binder(), "textChanged");
    edit.binder().unobserve("textChanged", id).unwrap();
    edit.construct().unwrap();

    let widget = edit.widget().unwrap();
    assert_eq!(MockWidget::of(&widget).unwrap().total_connections(), 0);
}

#[test]
fn signal_arguments_are_bundled() {
    install_mock_toolkit();
    let button = PushButton::new().unwrap();
    button.construct().unwrap();
    let (plain, _) = record(button.binder(), "clicked");
    let (with_state, _) = record(button.binder(), "clicked_bool");

    button.binder().set_attr("click", Value::None).unwrap();

    assert_eq!(plain.borrow()[0].new, Value::None);
    assert_eq!(with_state.borrow()[0].new, Value::Bool(false));
}

#[test]
fn slots_take_arguments_by_arity() {
    install_mock_toolkit();
    let timer = Timer::new().unwrap();
    timer.construct().unwrap();
    let binder = timer.binder();

    binder.set_attr("start_int", Value::Int(250)).unwrap();
    binder.set_attr("stop", Value::from("ignored")).unwrap();

    let widget = timer.widget().unwrap();
    let mock = MockWidget::of(&widget).unwrap();
    assert_eq!(mock.calls_to("start"), vec![vec![Value::Int(250)]]);
    assert_eq!(mock.calls_to("stop"), vec![Vec::<Value>::new()]);

    let Value::Function(stop) = binder.get_attr("stop").unwrap() else {
        panic!("slots read as callables");
    };
    stop.call(&[]).unwrap();
    assert_eq!(mock.calls_to("stop").len(), 2);
}

#[test]
fn slot_arity_mismatch_is_reported() {
    install_mock_toolkit();
    let slider = Slider::new().unwrap();
    slider.construct().unwrap();
    let err = slider
        .binder()
        .set_attr(
            "setRange",
            Value::Tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Arity {
            expected: 2,
            got: 3,
            ..
        }
    ));
}

#[test]
fn rejected_generic_write_falls_back_to_setter() {
    install_mock_toolkit();
    let group = bindery_binder::GroupBox::new(None).unwrap();
    group.construct().unwrap();
    group.binder().set_attr("alignment", Value::Int(4)).unwrap();

    let widget = group.widget().unwrap();
    let mock = MockWidget::of(&widget).unwrap();
    assert_eq!(mock.calls_to("setAlignment"), vec![vec![Value::Int(4)]]);
    assert_eq!(group.binder().get_attr("alignment").unwrap(), Value::Int(4));
}

#[test]
fn setter_quirk_routes_every_property_write_through_the_setter() {
    let tk = install_mock_toolkit();
    tk.set_quirks(ToolkitQuirks {
        write_properties_via_setter: true,
        ..ToolkitQuirks::default()
    });
    let label = Label::new().unwrap();
    label.construct().unwrap();
    label.binder().set_attr("wordWrap", Value::Bool(true)).unwrap();

    let widget = label.widget().unwrap();
    let mock = MockWidget::of(&widget).unwrap();
    assert_eq!(mock.calls_to("setWordWrap"), vec![vec![Value::Bool(true)]]);
}

#[test]
fn disconnect_errors_depend_on_the_quirk() {
    let tk = install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    edit.construct().unwrap();
    let (_, id) = record(edit.binder(), "textChanged");
    let widget = edit.widget().unwrap();
    MockWidget::of(&widget).unwrap().set_fail_disconnect(true);

    assert!(matches!(
        edit.binder().unobserve("textChanged", id),
        Err(Error::Disconnect { .. })
    ));

    tk.set_quirks(ToolkitQuirks {
        benign_disconnect_errors: true,
        ..ToolkitQuirks::default()
    });
    let (_, id) = record(edit.binder(), "textChanged");
    edit.binder().unobserve("textChanged", id).unwrap();
}

#[test]
fn dispose_disconnects_everything() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    edit.construct().unwrap();
    record(edit.binder(), "textChanged");
    record(edit.binder(), "returnPressed");
    let widget = edit.widget().unwrap();
    assert_eq!(MockWidget::of(&widget).unwrap().total_connections(), 2);

    edit.dispose().unwrap();
    assert_eq!(MockWidget::of(&widget).unwrap().total_connections(), 0);
}

#[test]
fn dynamic_properties_default_on_attach_and_repolish() {
    struct Flagged;
    impl BinderClass for Flagged {
        const NAME: &'static str = "Flagged";
        const TARGET: &'static str = "QWidget";
        fn declare(decl: &mut ClassDecl) {
            decl.dynamic_property("busy", false, true)
                .dynamic_property("tag", "none", false);
        }
    }

    install_mock_toolkit();
    let binder = Binder::new::<Flagged>().unwrap();
    assert_eq!(binder.get_attr("tag").unwrap(), Value::from("none"));
    binder.construct().unwrap();
    let widget = binder.target().unwrap();
    let mock = MockWidget::of(&widget).unwrap();
    assert_eq!(widget.dynamic_property("busy"), Some(Value::Bool(false)));
    let polished = mock.repolish_count();

    let (log, _) = record(&binder, "busy");
    binder.set_attr("busy", Value::Bool(true)).unwrap();
    assert_eq!(mock.repolish_count(), polished + 1);
    assert_eq!(log.borrow()[0].old, Value::Bool(false));

    binder.set_attr("tag", Value::from("x")).unwrap();
    assert_eq!(mock.repolish_count(), polished + 1);
}

#[test]
fn renamed_attribute_with_default() {
    struct Wide;
    impl BinderClass for Wide {
        const NAME: &'static str = "Wide";
        const TARGET: &'static str = "QSlider";
        fn declare(decl: &mut ClassDecl) {
            decl.rename_with_default("orientation", "direction", HORIZONTAL);
        }
    }

    install_mock_toolkit();
    let binder = Binder::new::<Wide>().unwrap();
    assert!(binder.class().descriptor("orientation").is_none());
    binder.construct().unwrap();
    assert_eq!(binder.get_attr("direction").unwrap(), Value::Int(HORIZONTAL));
}
