#![forbid(unsafe_code)]

//! In-memory widget objects.
//!
//! A [`MockWidget`] stores property values in a map, emits notify signals when
//! a stored property changes, and interprets a handful of well-known method
//! names (setters, getters, child insertion, combo-box items, validation).
//! Every `invoke` is logged so tests can assert on what a binder did.
//!
//! # Behavior table
//!
//! | Call | Effect |
//! |------|--------|
//! | `setFoo(x)` | stores `foo`, emits `foo`'s notify signal if it changed |
//! | `foo()` | reads `foo` (property, stored member, or class default) |
//! | signal name | emits the overload matching the argument count |
//! | `addWidget`, `addLayout`, `addRow`, `addButton`, `insertWidget`, `setLayout` | records widget arguments as children |
//! | `setParent(w)` | records the parent |
//! | `addItems(list)`, `addItem(text, data)`, `clear()`, `count()`, `itemText(i)`, `itemData(i)` | combo-box item list |
//! | `lineEdit()` | an editable combo box's line edit, created on first use |
//! | `setEditText(text)` | text of an editable combo box |
//! | `setRange(lo, hi)` | sets `minimum`/`maximum` (or `bottom`/`top`), clamping `value` |
//! | `validate(text, pos)` | integer or floating-point validation for validator classes |

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use bindery_core::{
    ConnectionId, Error, MetaClass, MetaMethod, MethodKind, Result, SignalHandler, Value, Widget,
    WidgetRef,
};

/// `QValidator::Invalid`.
pub const INVALID: i64 = 0;
/// `QValidator::Intermediate`.
pub const INTERMEDIATE: i64 = 1;
/// `QValidator::Acceptable`.
pub const ACCEPTABLE: i64 = 2;

struct Connection {
    signature: String,
    id: ConnectionId,
    handler: SignalHandler,
}

/// An in-memory toolkit object.
pub struct MockWidget {
    class: Rc<MetaClass>,
    values: RefCell<BTreeMap<String, Value>>,
    dynamic: RefCell<BTreeMap<String, Value>>,
    rejected: RefCell<Vec<String>>,
    connections: RefCell<Vec<Connection>>,
    calls: RefCell<Vec<(String, Vec<Value>)>>,
    children: RefCell<Vec<WidgetRef>>,
    parent: RefCell<Option<Weak<dyn Widget>>>,
    items: RefCell<Vec<String>>,
    item_data: RefCell<Vec<Value>>,
    line_edit: RefCell<Option<WidgetRef>>,
    repolished: Cell<usize>,
    fail_disconnect: Cell<bool>,
}

impl MockWidget {
    pub(crate) fn new(
        class: Rc<MetaClass>,
        defaults: BTreeMap<String, Value>,
        rejected: Vec<String>,
    ) -> Rc<Self> {
        Rc::new(Self {
            class,
            values: RefCell::new(defaults),
            dynamic: RefCell::new(BTreeMap::new()),
            rejected: RefCell::new(rejected),
            connections: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(None),
            items: RefCell::new(Vec::new()),
            item_data: RefCell::new(Vec::new()),
            line_edit: RefCell::new(None),
            repolished: Cell::new(0),
            fail_disconnect: Cell::new(false),
        })
    }

    /// Downcast a widget handle created by the mock toolkit.
    #[must_use]
    pub fn of(widget: &WidgetRef) -> Option<&MockWidget> {
        widget.as_any().downcast_ref::<MockWidget>()
    }

    /// Store a property value as the user or the toolkit would, emitting its
    /// notify signal when the value changes.
    pub fn set_value(&self, name: &str, value: Value) -> Result<()> {
        if name == "editable" && !value.truthy() {
            self.line_edit.borrow_mut().take();
        }
        let value = self.clamp(name, value);
        let old = self.values.borrow_mut().insert(name.to_owned(), value.clone());
        if old.as_ref() == Some(&value) {
            return Ok(());
        }
        let notify = self
            .class
            .property(name)
            .and_then(|p| p.notify_signal().cloned());
        if let Some(signal) = notify {
            self.emit(&signal, &[value])?;
        }
        Ok(())
    }

    /// Current stored value, or the type default for declared properties.
    #[must_use]
    pub fn value(&self, name: &str) -> Value {
        if name == "currentText"
            && let Some(edit) = self.line_edit.borrow().as_ref().and_then(MockWidget::of)
        {
            return edit.value("text");
        }
        if let Some(v) = self.values.borrow().get(name) {
            return v.clone();
        }
        match self.class.property(name).map(|p| p.type_name()) {
            Some("QString") => Value::NullVariant("QString".into()),
            Some("int") => Value::Int(0),
            Some("double") => Value::Float(0.0),
            Some("bool") => Value::Bool(false),
            _ => Value::None,
        }
    }

    /// Emit the first signal named `name` taking `args.len()` parameters.
    pub fn emit_by_name(&self, name: &str, args: &[Value]) -> Result<()> {
        let signal = self
            .signal_overload(name, args.len())
            .ok_or_else(|| Error::unknown_attribute(self.class.name(), name))?;
        self.emit(&signal, args)
    }

    /// Simulate the user typing into a line edit: updates `text`, then emits
    /// `textEdited`.
    pub fn user_edit_text(&self, text: &str) -> Result<()> {
        self.set_value("text", Value::from(text))?;
        self.emit_by_name("textEdited", &[Value::from(text)])
    }

    /// Every `invoke` so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.borrow().clone()
    }

    /// Arguments of each call to `method`.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Number of live connections on signals named `name`.
    #[must_use]
    pub fn connection_count(&self, name: &str) -> usize {
        let prefix = format!("{name}(");
        self.connections
            .borrow()
            .iter()
            .filter(|c| c.signature.starts_with(&prefix))
            .count()
    }

    /// Total number of live connections.
    #[must_use]
    pub fn total_connections(&self) -> usize {
        self.connections.borrow().len()
    }

    #[must_use]
    pub fn repolish_count(&self) -> usize {
        self.repolished.get()
    }

    /// Children recorded by insertion calls.
    #[must_use]
    pub fn children(&self) -> Vec<WidgetRef> {
        self.children.borrow().clone()
    }

    #[must_use]
    pub fn parent(&self) -> Option<WidgetRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Combo-box items.
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        self.items.borrow().clone()
    }

    /// The line edit of an editable combo box, once something asked for it.
    #[must_use]
    pub fn line_edit(&self) -> Option<WidgetRef> {
        self.line_edit.borrow().clone()
    }

    /// Make `disconnect` report failure after disconnecting.
    pub fn set_fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.set(fail);
    }

    /// Make the generic write path refuse `property`.
    pub fn reject_generic_write(&self, property: &str) {
        self.rejected.borrow_mut().push(property.to_owned());
    }

    fn signal_overload(&self, name: &str, arity: usize) -> Option<MetaMethod> {
        let methods = self.class.all_methods();
        let named: Vec<&MetaMethod> = methods
            .into_iter()
            .filter(|m| m.kind() == MethodKind::Signal && m.name() == name)
            .collect();
        named
            .iter()
            .find(|m| m.arity() == arity)
            .or_else(|| named.first())
            .map(|m| (*m).clone())
    }

    fn clamp(&self, name: &str, value: Value) -> Value {
        if name != "value" || !self.class.inherits("QAbstractSlider") {
            return value;
        }
        let (Some(v), Some(lo), Some(hi)) = (
            value.as_int(),
            self.value("minimum").as_int(),
            self.value("maximum").as_int(),
        ) else {
            return value;
        };
        Value::Int(v.clamp(lo, hi.max(lo)))
    }

    fn arg(args: &[Value], i: usize, method: &str) -> Result<Value> {
        args.get(i).cloned().ok_or_else(|| Error::Arity {
            name: method.to_owned(),
            expected: i + 1,
            got: args.len(),
        })
    }

    fn record_children(&self, args: &[Value]) {
        let mut children = self.children.borrow_mut();
        for arg in args {
            if let Value::Widget(w) = arg {
                children.push(Rc::clone(w));
            }
        }
    }

    fn set_current_index(&self, index: i64) -> Result<()> {
        let text = usize::try_from(index)
            .ok()
            .and_then(|i| self.items.borrow().get(i).cloned())
            .unwrap_or_default();
        self.set_edit_text(&text)?;
        self.set_value("currentIndex", Value::Int(index))?;
        self.set_value("currentText", Value::Str(text))
    }

    fn set_edit_text(&self, text: &str) -> Result<()> {
        let edit = self.line_edit.borrow().clone();
        match edit.as_ref().and_then(MockWidget::of) {
            Some(edit) => edit.set_value("text", Value::from(text)),
            None => Ok(()),
        }
    }

    /// The combo box's line edit, created when the box is editable.
    fn combo_line_edit(&self) -> Result<Value> {
        if !self.value("editable").truthy() {
            return Ok(Value::None);
        }
        if let Some(edit) = self.line_edit.borrow().as_ref() {
            return Ok(Value::Widget(Rc::clone(edit)));
        }
        let edit = bindery_core::toolkit::current()?.create_named("QLineEdit")?;
        if let Some(mock) = MockWidget::of(&edit) {
            let text = self.value("currentText").as_str().unwrap_or_default().to_owned();
            mock.set_value("text", Value::Str(text))?;
        }
        *self.line_edit.borrow_mut() = Some(Rc::clone(&edit));
        Ok(Value::Widget(edit))
    }

    fn add_items(&self, labels: Vec<String>, data: Vec<Value>) -> Result<()> {
        let was_empty = self.items.borrow().is_empty();
        self.items.borrow_mut().extend(labels);
        self.item_data.borrow_mut().extend(data);
        if was_empty && !self.items.borrow().is_empty() {
            return self.set_current_index(0);
        }
        Ok(())
    }

    fn set_range(&self, args: &[Value]) -> Result<Value> {
        let lo = Self::arg(args, 0, "setRange")?;
        let hi = Self::arg(args, 1, "setRange")?;
        let (lo_name, hi_name) = if self.class.inherits("QValidator") {
            ("bottom", "top")
        } else {
            ("minimum", "maximum")
        };
        {
            let mut values = self.values.borrow_mut();
            values.insert(lo_name.into(), lo);
            values.insert(hi_name.into(), hi);
        }
        if self.class.inherits("QAbstractSlider") {
            let current = self.value("value");
            self.set_value("value", current)?;
        }
        Ok(Value::None)
    }

    fn validate(&self, args: &[Value]) -> Result<Value> {
        let text = Self::arg(args, 0, "validate")?
            .as_str()
            .map(str::to_owned)
            .unwrap_or_default();
        let pos = args.get(1).cloned().unwrap_or(Value::Int(0));
        let parsed = if self.class.inherits("QDoubleValidator") {
            text.trim().parse::<f64>().ok().filter(|x| x.is_finite())
        } else {
            text.trim().parse::<i64>().ok().map(|n| n as f64)
        };
        let bottom = self.value("bottom").as_float().unwrap_or(f64::MIN);
        let top = self.value("top").as_float().unwrap_or(f64::MAX);
        let state = match parsed {
            Some(n) if (bottom..=top).contains(&n) => ACCEPTABLE,
            Some(_) => INTERMEDIATE,
            None if text.is_empty() || text == "-" => INTERMEDIATE,
            None => INVALID,
        };
        Ok(Value::Tuple(vec![Value::Int(state), Value::Str(text), pos]))
    }

    fn invoke_known(&self, method: &str, args: &[Value]) -> Option<Result<Value>> {
        let combo = self.class.inherits("QComboBox");
        let result = match method {
            "addWidget" | "addLayout" | "addRow" | "addButton" | "insertWidget" | "addItem"
                if !combo =>
            {
                self.record_children(args);
                Ok(Value::None)
            }
            "setLayout" => {
                self.record_children(args);
                self.values
                    .borrow_mut()
                    .insert("layout".into(), args.first().cloned().unwrap_or_default());
                Ok(Value::None)
            }
            "setParent" => {
                if let Some(Value::Widget(w)) = args.first() {
                    *self.parent.borrow_mut() = Some(Rc::downgrade(w));
                }
                Ok(Value::None)
            }
            "parent" => Ok(self.parent().map_or(Value::None, Value::Widget)),
            "addItems" if combo => {
                let new: Vec<String> = match args.first() {
                    Some(Value::Tuple(items)) => items.iter().map(Value::to_display_string).collect(),
                    _ => Vec::new(),
                };
                let data = vec![Value::None; new.len()];
                return Some(self.add_items(new, data).map(|()| Value::None));
            }
            "addItem" if combo => {
                let text = args.first().map(Value::to_display_string).unwrap_or_default();
                let data = args.get(1).cloned().unwrap_or_default();
                return Some(self.add_items(vec![text], vec![data]).map(|()| Value::None));
            }
            "clear" if combo => {
                self.items.borrow_mut().clear();
                self.item_data.borrow_mut().clear();
                return Some(self.set_current_index(-1).map(|()| Value::None));
            }
            "itemData" if combo => {
                let data = args
                    .first()
                    .and_then(Value::as_int)
                    .and_then(|i| usize::try_from(i).ok())
                    .and_then(|i| self.item_data.borrow().get(i).cloned())
                    .unwrap_or_default();
                Ok(data)
            }
            "lineEdit" if combo => self.combo_line_edit(),
            "setEditText" if combo => {
                let text = args.first().map(Value::to_display_string).unwrap_or_default();
                return Some(
                    self.set_edit_text(&text)
                        .and_then(|()| self.set_value("currentText", Value::Str(text)))
                        .map(|()| Value::None),
                );
            }
            "setCurrentIndex" if combo => {
                return Some(
                    Self::arg(args, 0, method)
                        .and_then(|v| v.expect_int(method))
                        .and_then(|i| self.set_current_index(i))
                        .map(|()| Value::None),
                );
            }
            "count" if combo => Ok(Value::Int(self.items.borrow().len() as i64)),
            "itemText" => {
                let text = args
                    .first()
                    .and_then(Value::as_int)
                    .and_then(|i| usize::try_from(i).ok())
                    .and_then(|i| self.items.borrow().get(i).cloned())
                    .unwrap_or_default();
                Ok(Value::Str(text))
            }
            "clear" if self.class.property("text").is_some() => {
                return Some(self.set_value("text", Value::from("")).map(|()| Value::None));
            }
            "setRange" => self.set_range(args),
            "validate" if self.class.inherits("QValidator") => self.validate(args),
            "click" => {
                let checked = self.value("checked");
                return Some(
                    self.emit_by_name("clicked", &[])
                        .and_then(|()| self.emit_by_name("clicked", &[checked]))
                        .map(|()| Value::None),
                );
            }
            "toggle" => {
                let checked = self.value("checked").truthy();
                return Some(self.set_value("checked", Value::Bool(!checked)).map(|()| Value::None));
            }
            "show" | "hide" => {
                return Some(
                    self.set_value("visible", Value::Bool(method == "show"))
                        .map(|()| Value::None),
                );
            }
            "setDisabled" => {
                let disabled = args.first().is_some_and(Value::truthy);
                return Some(self.set_value("enabled", Value::Bool(!disabled)).map(|()| Value::None));
            }
            "start" | "stop" => {
                return Some(
                    self.set_value("active", Value::Bool(method == "start"))
                        .map(|()| Value::None),
                );
            }
            _ => return None,
        };
        Some(result)
    }

    /// Property or member name `setFoo` writes, if `method` looks like a
    /// setter for something this class has.
    fn setter_target(&self, method: &str) -> Option<String> {
        let rest = method.strip_prefix("set")?;
        let mut chars = rest.chars();
        let first = chars.next()?;
        if !first.is_uppercase() {
            return None;
        }
        let getter = format!("{}{}", first.to_lowercase(), chars.as_str());
        let known = self.class.property(&getter).is_some()
            || self.class.has_member(&getter)
            || self.class.has_member(method);
        known.then_some(getter)
    }
}

impl Widget for MockWidget {
    fn meta_class(&self) -> Rc<MetaClass> {
        Rc::clone(&self.class)
    }

    fn read_property(&self, name: &str) -> Result<Value> {
        if self.class.property(name).is_none() {
            return Err(Error::unknown_attribute(self.class.name(), name));
        }
        Ok(self.value(name))
    }

    fn write_property(&self, name: &str, value: Value) -> Result<()> {
        if self.class.property(name).is_none() {
            return Err(Error::unknown_attribute(self.class.name(), name));
        }
        if self.rejected.borrow().iter().any(|r| r == name) {
            return Err(Error::PropertyWriteRejected {
                property: name.to_owned(),
            });
        }
        self.set_value(name, value)
    }

    fn dynamic_property(&self, name: &str) -> Option<Value> {
        self.dynamic.borrow().get(name).cloned()
    }

    fn set_dynamic_property(&self, name: &str, value: Value) {
        self.dynamic.borrow_mut().insert(name.to_owned(), value);
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.calls
            .borrow_mut()
            .push((method.to_owned(), args.to_vec()));
        tracing::trace!(class = self.class.name(), method, "mock invoke");

        if let Some(result) = self.invoke_known(method, args) {
            return result;
        }
        if let Some(signal) = self.signal_overload(method, args.len()) {
            self.emit(&signal, args)?;
            return Ok(Value::None);
        }
        if args.len() == 1 {
            if let Some(target) = self.setter_target(method) {
                let value = args[0].clone();
                if self.class.property(&target).is_some() {
                    self.set_value(&target, value)?;
                } else {
                    self.values.borrow_mut().insert(target, value);
                }
                return Ok(Value::None);
            }
        }
        if args.is_empty() && (self.class.property(method).is_some() || self.class.has_member(method)) {
            return Ok(self.value(method));
        }
        if self.class.has_member(method) {
            return Ok(Value::None);
        }
        Err(Error::unknown_attribute(self.class.name(), method))
    }

    fn emit(&self, signal: &MetaMethod, args: &[Value]) -> Result<()> {
        let signature = signal.signature();
        let handlers: Vec<SignalHandler> = self
            .connections
            .borrow()
            .iter()
            .filter(|c| c.signature == signature)
            .map(|c| Rc::clone(&c.handler))
            .collect();
        for handler in handlers {
            handler(args)?;
        }
        Ok(())
    }

    fn connect(&self, signal: &MetaMethod, handler: SignalHandler) -> Result<ConnectionId> {
        let id = ConnectionId::next();
        self.connections.borrow_mut().push(Connection {
            signature: signal.signature(),
            id,
            handler,
        });
        Ok(id)
    }

    fn disconnect(&self, signal: &MetaMethod, id: ConnectionId) -> Result<()> {
        let mut connections = self.connections.borrow_mut();
        let Some(idx) = connections.iter().position(|c| c.id == id) else {
            return Err(Error::Disconnect {
                signal: signal.signature(),
                reason: "not connected".into(),
            });
        };
        connections.remove(idx);
        if self.fail_disconnect.get() {
            return Err(Error::Disconnect {
                signal: signal.signature(),
                reason: "backend reported failure".into(),
            });
        }
        Ok(())
    }

    fn repolish(&self) {
        self.repolished.set(self.repolished.get() + 1);
    }

    fn find_child(&self, name: &str) -> Option<WidgetRef> {
        for child in self.children.borrow().iter() {
            if child.read_property("objectName").ok().as_ref().and_then(Value::as_str) == Some(name) {
                return Some(Rc::clone(child));
            }
            if let Some(found) = child.find_child(name) {
                return Some(found);
            }
        }
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MockWidget {
    /// Record `child` as a child without going through `invoke`.
    pub(crate) fn adopt(&self, child: WidgetRef) {
        self.children.borrow_mut().push(child);
    }
}
