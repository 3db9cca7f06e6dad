#![forbid(unsafe_code)]

//! Composite proxies: construction order, wiring and teardown.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_binder::grid::alignment;
use bindery_binder::raw::{self, CheckBox, Label, LineEdit, PushButton};
use bindery_binder::{
    Binder, ButtonGroup, ButtonId, Composite, FormLabel, FormLayout, FormRow, GridCell,
    GridLayout, GroupBox, HBoxLayout, Proxy, ProxyRef, SingleChild, SpanGridLayout, SpanItem,
    Splitter, StackedLayout, TextField, UiFile, VBoxLayout, WithLayout, proxy_ref, walk,
};
use bindery_core::{Error, HasAttributes, Result, Value, WidgetRef, get_path};
use bindery_harness::{MockWidget, install_mock_toolkit};

fn mock(widget: &WidgetRef) -> &MockWidget {
    MockWidget::of(widget).expect("created by the mock toolkit")
}

fn build(root: &ProxyRef) {
    root.construct().unwrap();
    root.configure().unwrap();
}

fn class_names(widgets: &[WidgetRef]) -> Vec<String> {
    widgets
        .iter()
        .map(|w| w.meta_class().name().to_owned())
        .collect()
}

#[test]
fn children_are_constructed_before_their_parent() {
    let tk = install_mock_toolkit();
    let row = HBoxLayout::new(vec![proxy_ref(&PushButton::new().unwrap())]).unwrap();
    let root: ProxyRef = VBoxLayout::new(vec![
        proxy_ref(&Label::new().unwrap()),
        proxy_ref(&row),
    ])
    .unwrap();

    root.construct().unwrap();

    assert_eq!(
        class_names(&tk.created()),
        ["QLabel", "QPushButton", "QHBoxLayout", "QVBoxLayout"]
    );
}

#[test]
fn walk_visits_in_pre_order() {
    install_mock_toolkit();
    let row = HBoxLayout::new(vec![proxy_ref(&PushButton::new().unwrap())]).unwrap();
    let root: ProxyRef = VBoxLayout::new(vec![
        proxy_ref(&Label::new().unwrap()),
        proxy_ref(&row),
    ])
    .unwrap();

    let names: Vec<&str> = walk(&root).iter().map(|p| p.binder().class().name()).collect();
    assert_eq!(names, ["VBoxLayout", "Label", "HBoxLayout", "PushButton"]);
}

#[test]
fn box_layouts_add_widgets_and_nested_layouts() {
    install_mock_toolkit();
    let label = Label::new().unwrap();
    let button = PushButton::new().unwrap();
    let row = HBoxLayout::new(vec![proxy_ref(&button)]).unwrap();
    let root: ProxyRef = VBoxLayout::new(vec![proxy_ref(&label), proxy_ref(&row)]).unwrap();
    build(&root);

    let outer = root.widget().unwrap();
    assert_eq!(
        mock(&outer).calls_to("addWidget"),
        vec![vec![Value::Widget(label.widget().unwrap())]]
    );
    assert_eq!(
        mock(&outer).calls_to("addLayout"),
        vec![vec![Value::Widget(row.widget().unwrap())]]
    );
    assert_eq!(mock(&row.widget().unwrap()).children().len(), 1);
}

#[test]
fn dispose_runs_children_first() {
    struct Logged {
        binder: Rc<Binder>,
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        children: Vec<ProxyRef>,
    }

    impl Proxy for Logged {
        fn binder(&self) -> &Rc<Binder> {
            &self.binder
        }

        fn child_proxies(&self) -> Vec<ProxyRef> {
            self.children.clone()
        }

        fn configure_target(&self) -> Result<()> {
            self.log.borrow_mut().push(format!("configure {}", self.name));
            Ok(())
        }

        fn dispose_target(&self) -> Result<()> {
            self.log.borrow_mut().push(format!("dispose {}", self.name));
            self.binder.dispose()
        }
    }

    install_mock_toolkit();
    let log = Rc::new(RefCell::new(Vec::new()));
    let node = |name, children| -> ProxyRef {
        Rc::new(Logged {
            binder: Binder::new::<raw::Widget>().unwrap(),
            name,
            log: Rc::clone(&log),
            children,
        })
    };
    let root = node("root", vec![node("a", vec![node("a1", vec![])]), node("b", vec![])]);

    build(&root);
    root.dispose().unwrap();

    assert_eq!(
        *log.borrow(),
        [
            "configure a1",
            "configure a",
            "configure b",
            "configure root",
            "dispose a1",
            "dispose a",
            "dispose b",
            "dispose root",
        ]
    );
}

#[test]
fn composite_children_are_read_only_attributes() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let panel = Composite::new().unwrap();
    panel.add_child("name", proxy_ref(&edit));
    let root = proxy_ref(&panel);
    build(&root);

    edit.binder().set_attr("text", Value::from("Ada")).unwrap();
    assert_eq!(get_path(&root.object(), "name.text").unwrap(), Value::from("Ada"));
    assert!(matches!(
        panel.binder().set_attr("name", Value::None),
        Err(Error::ReadOnly { .. })
    ));
    assert!(panel.child("name").is_some());
    assert!(panel.child("other").is_none());
}

#[test]
fn group_box_takes_a_layout_child() {
    install_mock_toolkit();
    let inner = VBoxLayout::new(vec![proxy_ref(&CheckBox::new().unwrap())]).unwrap();
    let group = GroupBox::new(Some(proxy_ref(&inner))).unwrap();
    build(&proxy_ref(&group));

    let own = group.widget().unwrap();
    assert_eq!(
        mock(&own).calls_to("setLayout"),
        vec![vec![Value::Widget(inner.widget().unwrap())]]
    );
    assert!(matches!(group.binder().get_attr("child"), Ok(Value::Object(_))));
}

#[test]
fn single_widget_child_is_reparented() {
    install_mock_toolkit();
    let label = Label::new().unwrap();
    let holder = SingleChild::<raw::Widget>::new(Some(proxy_ref(&label))).unwrap();
    build(&proxy_ref(&holder));

    let parent = mock(&label.widget().unwrap()).parent().unwrap();
    assert!(Rc::ptr_eq(&parent, &holder.widget().unwrap()));
}

#[test]
fn with_layout_installs_its_layout() {
    install_mock_toolkit();
    let layout = HBoxLayout::new(vec![proxy_ref(&Label::new().unwrap())]).unwrap();
    let host = WithLayout::new(proxy_ref(&layout)).unwrap();
    build(&proxy_ref(&host));

    let own = host.widget().unwrap();
    assert_eq!(
        mock(&own).calls_to("setLayout"),
        vec![vec![Value::Widget(layout.widget().unwrap())]]
    );
}

#[test]
fn widget_stacks_wrap_layout_children() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let column = VBoxLayout::new(vec![proxy_ref(&Label::new().unwrap())]).unwrap();
    let splitter = Splitter::new(vec![proxy_ref(&edit), proxy_ref(&column)]).unwrap();
    build(&proxy_ref(&splitter));

    let children = mock(&splitter.widget().unwrap()).children();
    assert_eq!(class_names(&children), ["QLineEdit", "QWidget"]);
    let wrapper = mock(&children[1]).children();
    assert!(Rc::ptr_eq(&wrapper[0], &column.widget().unwrap()));

    let pages = StackedLayout::new(vec![proxy_ref(&Label::new().unwrap())]).unwrap();
    build(&proxy_ref(&pages));
    assert_eq!(mock(&pages.widget().unwrap()).calls_to("addWidget").len(), 1);
}

#[test]
fn grid_rows_must_have_equal_length() {
    install_mock_toolkit();
    let err = GridLayout::new(vec![
        vec![GridCell::from("a"), GridCell::from("b")],
        vec![GridCell::from("c")],
    ])
    .unwrap_err();
    assert!(matches!(err, Error::Layout(_)));

    let nested = GridCell::from("x").aligned(alignment::LEFT).aligned(alignment::TOP);
    assert!(GridLayout::new(vec![vec![nested]]).is_err());
}

#[test]
fn grid_places_labels_proxies_and_alignment() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let ok = PushButton::new().unwrap();
    let grid = GridLayout::new(vec![
        vec![GridCell::from("Name"), GridCell::from(proxy_ref(&edit))],
        vec![
            GridCell::Empty,
            GridCell::from(proxy_ref(&ok)).aligned(alignment::RIGHT),
        ],
    ])
    .unwrap();
    build(&proxy_ref(&grid));

    let calls = mock(&grid.widget().unwrap()).calls_to("addWidget");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0][1..], [Value::Int(0), Value::Int(0), Value::Int(0)]);
    assert_eq!(
        calls[1],
        [
            Value::Widget(edit.widget().unwrap()),
            Value::Int(0),
            Value::Int(1),
            Value::Int(0)
        ]
    );
    assert_eq!(
        calls[2],
        [
            Value::Widget(ok.widget().unwrap()),
            Value::Int(1),
            Value::Int(1),
            Value::Int(alignment::RIGHT)
        ]
    );

    let Value::Widget(label) = &calls[0][0] else {
        panic!("text cells become labels");
    };
    assert_eq!(mock(label).calls_to("setText"), vec![vec![Value::from("Name")]]);
}

#[test]
fn span_items_are_validated() {
    install_mock_toolkit();
    assert!(SpanGridLayout::new(vec![SpanItem::new(GridCell::Empty, 0, 0)]).is_err());
    assert!(SpanGridLayout::new(vec![SpanItem::new("a", -1, 0)]).is_err());
    assert!(SpanGridLayout::new(vec![SpanItem::new("a", 0, 0).span(0, 1)]).is_err());
    assert!(SpanGridLayout::new(vec![SpanItem::new("a", 0, 0).span(-1, 2)]).is_ok());
}

#[test]
fn span_grid_passes_spans_and_alignment() {
    install_mock_toolkit();
    let edit = LineEdit::new().unwrap();
    let grid = SpanGridLayout::new(vec![
        SpanItem::new(proxy_ref(&edit), 0, 0)
            .span(1, -1)
            .align(alignment::LEFT),
        SpanItem::new("Title", 1, 2),
    ])
    .unwrap();
    build(&proxy_ref(&grid));

    let calls = mock(&grid.widget().unwrap()).calls_to("addWidget");
    assert_eq!(
        calls[0],
        [
            Value::Widget(edit.widget().unwrap()),
            Value::Int(0),
            Value::Int(0),
            Value::Int(1),
            Value::Int(-1),
            Value::Int(alignment::LEFT)
        ]
    );
    assert_eq!(calls[1][1..], [Value::Int(1), Value::Int(2)]);
}

#[test]
fn form_rows_pair_labels_with_fields() {
    install_mock_toolkit();
    let name = LineEdit::new().unwrap();
    let agree = CheckBox::new().unwrap();
    let submit = PushButton::new().unwrap();
    let column = VBoxLayout::new(vec![]).unwrap();
    let form = FormLayout::new(vec![
        FormRow::text("Name", proxy_ref(&name)),
        FormRow::Labeled(FormLabel::None, proxy_ref(&agree)),
        FormRow::Full(proxy_ref(&submit)),
        FormRow::Full(proxy_ref(&column)),
    ])
    .unwrap();
    build(&proxy_ref(&form));

    let calls = mock(&form.widget().unwrap()).calls_to("addRow");
    assert_eq!(
        calls,
        vec![
            vec![Value::from("Name"), Value::Widget(name.widget().unwrap())],
            vec![Value::None, Value::Widget(agree.widget().unwrap())],
            vec![Value::Widget(submit.widget().unwrap())],
        ]
    );
}

#[test]
fn button_group_resolves_ids() {
    install_mock_toolkit();
    let ok = PushButton::new().unwrap();
    let cancel = PushButton::new().unwrap();
    ok.construct().unwrap();
    cancel.construct().unwrap();
    let group = ButtonGroup::new(vec![ButtonId::from("ok"), ButtonId::from(("cancel", 2))]).unwrap();
    group.construct().unwrap();

    let ok_object = ok.object();
    let cancel_widget = cancel.widget().unwrap();
    let lookup = |id: &str| match id {
        "ok" => Some(Value::Object(Rc::clone(&ok_object))),
        "cancel" => Some(Value::Widget(Rc::clone(&cancel_widget))),
        _ => None,
    };
    group.add_buttons(&lookup).unwrap();

    assert_eq!(
        mock(&group.widget().unwrap()).calls_to("addButton"),
        vec![
            vec![Value::Widget(ok.widget().unwrap())],
            vec![Value::Widget(cancel.widget().unwrap()), Value::Int(2)],
        ]
    );

    let err = group.add_buttons(&|_: &str| None).unwrap_err();
    assert!(matches!(err, Error::UndefinedName(name) if name == "ok"));
}

const FORM: &str = "\
QWidget form
  QLineEdit name_edit
  QWidget host
  QPushButton _hidden
  QLabel caption
";

#[test]
fn ui_file_binds_named_objects() {
    install_mock_toolkit();
    let field = TextField::new().unwrap();
    let inserted = Label::new().unwrap();
    let ui = UiFile::builder(FORM)
        .override_with("name_edit", proxy_ref(&field))
        .insert("host", proxy_ref(&inserted))
        .build()
        .unwrap();
    ui.construct().unwrap();

    // The override wraps the loaded line edit itself.
    let loaded = field.widget().unwrap();
    assert_eq!(
        loaded.read_property("objectName").unwrap(),
        Value::from("name_edit")
    );
    assert!(Rc::ptr_eq(&ui.child("name_edit").unwrap().widget().unwrap(), &loaded));

    // Unlisted names get a proxy from the registry.
    let caption = ui.child("caption").unwrap();
    assert_eq!(caption.binder().class().name(), "Label");
    assert!(matches!(ui.binder().get_attr("caption"), Ok(Value::Object(_))));

    assert!(ui.child("_hidden").is_none());
    assert!(ui.child("form").is_none());
    assert_eq!(
        ui.widget().unwrap().read_property("objectName").unwrap(),
        Value::from("form")
    );
}

#[test]
fn ui_file_insertion_fills_the_host() {
    install_mock_toolkit();
    let inserted = Label::new().unwrap();
    let ui = UiFile::builder(FORM)
        .insert("host", proxy_ref(&inserted))
        .build()
        .unwrap();
    ui.construct().unwrap();

    let host = ui.child("host").unwrap();
    assert!(Rc::ptr_eq(&host.widget().unwrap(), &inserted.widget().unwrap()));

    let root = ui.widget().unwrap();
    let host_widget = root.find_child("host").unwrap();
    let layouts = mock(&host_widget).calls_to("setLayout");
    assert_eq!(layouts.len(), 1);
    let Value::Widget(layout) = &layouts[0][0] else {
        panic!("setLayout takes a layout");
    };
    assert_eq!(layout.meta_class().name(), "QVBoxLayout");
    assert_eq!(
        mock(layout).calls_to("setContentsMargins"),
        vec![vec![Value::Int(0); 4]]
    );
    assert!(Rc::ptr_eq(&mock(layout).children()[0], &inserted.widget().unwrap()));
}

#[test]
fn ui_file_rejects_unknown_classes_without_registry_entry() {
    install_mock_toolkit();
    let ui = UiFile::builder("QWidget root\n  QLineEdit edit\n")
        .registry(bindery_binder::BinderRegistry::new())
        .build()
        .unwrap();
    assert!(matches!(ui.construct(), Err(Error::UnknownClass(_))));
}
