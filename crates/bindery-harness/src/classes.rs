#![forbid(unsafe_code)]

//! Standard class table for the in-memory toolkit.
//!
//! Models the subset of a Qt-like class hierarchy that Bindery's binders and
//! tests exercise. Names, signatures and notify signals follow the native
//! toolkit so reflection sees realistic metadata: overloaded signals, slots
//! whose names clash with expression keywords, properties without notify
//! signals, and getter/setter pairs that are not properties.

use std::collections::BTreeMap;
use std::rc::Rc;

use bindery_core::{MetaClass, MetaMethod, MetaProperty, Value};

/// `Qt::Horizontal`.
pub const HORIZONTAL: i64 = 1;
/// `Qt::Vertical`.
pub const VERTICAL: i64 = 2;

/// Class metadata plus per-class property defaults and write rejections.
#[derive(Debug, Default)]
pub struct ClassTable {
    pub(crate) classes: BTreeMap<String, Rc<MetaClass>>,
    pub(crate) defaults: BTreeMap<String, BTreeMap<String, Value>>,
    pub(crate) rejected: BTreeMap<String, Vec<String>>,
}

impl ClassTable {
    /// Register a class.
    pub fn define(&mut self, class: Rc<MetaClass>) -> Rc<MetaClass> {
        self.classes
            .insert(class.name().to_owned(), Rc::clone(&class));
        class
    }

    /// Initial value of a property on fresh instances of `class` and its
    /// subclasses.
    pub fn set_default(&mut self, class: &str, property: &str, value: impl Into<Value>) {
        self.defaults
            .entry(class.to_owned())
            .or_default()
            .insert(property.to_owned(), value.into());
    }

    /// Make the generic property-write path refuse `property` on `class`.
    pub fn reject_generic_write(&mut self, class: &str, property: &str) {
        self.rejected
            .entry(class.to_owned())
            .or_default()
            .push(property.to_owned());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<MetaClass>> {
        self.classes.get(name).cloned()
    }

    /// Defaults for `class`, ancestors first so subclasses override.
    pub(crate) fn defaults_for(&self, class: &MetaClass) -> BTreeMap<String, Value> {
        let chain: Vec<&MetaClass> = class.lineage().collect();
        let mut out = BTreeMap::new();
        for c in chain.into_iter().rev() {
            if let Some(values) = self.defaults.get(c.name()) {
                out.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        out
    }

    pub(crate) fn rejected_for(&self, class: &MetaClass) -> Vec<String> {
        class
            .lineage()
            .filter_map(|c| self.rejected.get(c.name()))
            .flatten()
            .cloned()
            .collect()
    }

    /// The standard table.
    #[must_use]
    pub fn standard() -> Self {
        let mut t = Self::default();

        let object = t.define(
            MetaClass::builder("QObject")
                .property(
                    MetaProperty::new("objectName", "QString")
                        .with_notify(MetaMethod::signal("objectNameChanged", &["QString"])),
                )
                .signal("destroyed", &[])
                .signal("destroyed", &["QObject*"])
                .signal("objectNameChanged", &["QString"])
                .slot("deleteLater", &[])
                .members(&[
                    "parent",
                    "setParent",
                    "property",
                    "setProperty",
                    "blockSignals",
                    "signalsBlocked",
                    "objectName",
                    "setObjectName",
                ])
                .build(),
        );

        t.define(
            MetaClass::builder("QTimer")
                .parent(&object)
                .property(MetaProperty::new("interval", "int"))
                .property(MetaProperty::new("singleShot", "bool"))
                .property(MetaProperty::new("active", "bool"))
                .signal("timeout", &[])
                .slot("start", &[])
                .slot("start", &["int"])
                .slot("stop", &[])
                .members(&["setInterval", "setSingleShot", "isActive"])
                .build(),
        );

        let widget = t.define(
            MetaClass::builder("QWidget")
                .parent(&object)
                .property(MetaProperty::new("enabled", "bool"))
                .property(MetaProperty::new("visible", "bool"))
                .property(MetaProperty::new("toolTip", "QString"))
                .property(MetaProperty::new("styleSheet", "QString"))
                .property(
                    MetaProperty::new("windowTitle", "QString")
                        .with_notify(MetaMethod::signal("windowTitleChanged", &["QString"])),
                )
                .property(MetaProperty::new("minimumWidth", "int"))
                .signal("windowTitleChanged", &["QString"])
                .signal("customContextMenuRequested", &["QPoint"])
                .slot("setEnabled", &["bool"])
                .slot("setDisabled", &["bool"])
                .slot("setVisible", &["bool"])
                .slot("show", &[])
                .slot("hide", &[])
                .slot("raise", &[])
                .slot("update", &[])
                .members(&[
                    "layout",
                    "setLayout",
                    "font",
                    "setFont",
                    "isEnabled",
                    "isVisible",
                    "resize",
                    "setStyleSheet",
                    "setToolTip",
                    "setWindowTitle",
                    "setMinimumWidth",
                ])
                .build(),
        );
        t.set_default("QWidget", "enabled", true);

        t.define(
            MetaClass::builder("QLabel")
                .parent(&widget)
                .property(MetaProperty::new("text", "QString"))
                .property(MetaProperty::new("wordWrap", "bool"))
                .property(MetaProperty::new("alignment", "Qt::Alignment"))
                .signal("linkActivated", &["QString"])
                .slot("setText", &["QString"])
                .slot("clear", &[])
                .slot("setNum", &["int"])
                .slot("setNum", &["double"])
                .members(&["setWordWrap", "setAlignment"])
                .build(),
        );

        t.define(
            MetaClass::builder("QLineEdit")
                .parent(&widget)
                .property(
                    MetaProperty::new("text", "QString")
                        .with_notify(MetaMethod::signal("textChanged", &["QString"])),
                )
                .property(MetaProperty::new("placeholderText", "QString"))
                .property(MetaProperty::new("readOnly", "bool"))
                .property(MetaProperty::new("maxLength", "int"))
                .signal("textChanged", &["QString"])
                .signal("textEdited", &["QString"])
                .signal("editingFinished", &[])
                .signal("returnPressed", &[])
                .slot("setText", &["QString"])
                .slot("clear", &[])
                .slot("selectAll", &[])
                .members(&["validator", "setValidator", "setPlaceholderText", "setReadOnly"])
                .build(),
        );
        t.set_default("QLineEdit", "maxLength", 32767);

        let button = t.define(
            MetaClass::builder("QAbstractButton")
                .parent(&widget)
                .property(MetaProperty::new("text", "QString"))
                .property(MetaProperty::new("checkable", "bool"))
                .property(
                    MetaProperty::new("checked", "bool")
                        .with_notify(MetaMethod::signal("toggled", &["bool"])),
                )
                .signal("clicked", &[])
                .signal("clicked", &["bool"])
                .signal("pressed", &[])
                .signal("released", &[])
                .signal("toggled", &["bool"])
                .slot("click", &[])
                .slot("toggle", &[])
                .slot("setChecked", &["bool"])
                .members(&["setText", "setCheckable", "isChecked"])
                .build(),
        );
        t.define(
            MetaClass::builder("QPushButton")
                .parent(&button)
                .property(MetaProperty::new("default", "bool"))
                .property(MetaProperty::new("flat", "bool"))
                .build(),
        );
        t.define(
            MetaClass::builder("QCheckBox")
                .parent(&button)
                .property(MetaProperty::new("tristate", "bool"))
                .signal("stateChanged", &["int"])
                .build(),
        );
        t.define(MetaClass::builder("QRadioButton").parent(&button).build());
        t.set_default("QCheckBox", "checkable", true);
        t.set_default("QRadioButton", "checkable", true);

        t.define(
            MetaClass::builder("QGroupBox")
                .parent(&widget)
                .property(MetaProperty::new("title", "QString"))
                .property(MetaProperty::new("alignment", "Qt::Alignment"))
                .property(MetaProperty::new("checkable", "bool"))
                .property(
                    MetaProperty::new("checked", "bool")
                        .with_notify(MetaMethod::signal("toggled", &["bool"])),
                )
                .signal("clicked", &["bool"])
                .signal("toggled", &["bool"])
                .slot("setChecked", &["bool"])
                .members(&["setTitle", "setAlignment", "setCheckable"])
                .build(),
        );
        t.reject_generic_write("QGroupBox", "alignment");

        let slider = t.define(
            MetaClass::builder("QAbstractSlider")
                .parent(&widget)
                .property(MetaProperty::new("minimum", "int"))
                .property(MetaProperty::new("maximum", "int"))
                .property(MetaProperty::new("singleStep", "int"))
                .property(MetaProperty::new("pageStep", "int"))
                .property(
                    MetaProperty::new("value", "int")
                        .with_notify(MetaMethod::signal("valueChanged", &["int"])),
                )
                .property(
                    MetaProperty::new("sliderPosition", "int")
                        .with_notify(MetaMethod::signal("sliderMoved", &["int"])),
                )
                .property(MetaProperty::new("orientation", "Qt::Orientation"))
                .property(MetaProperty::new("tracking", "bool"))
                .signal("valueChanged", &["int"])
                .signal("sliderMoved", &["int"])
                .signal("sliderPressed", &[])
                .signal("sliderReleased", &[])
                .signal("rangeChanged", &["int", "int"])
                .slot("setValue", &["int"])
                .slot("setRange", &["int", "int"])
                .slot("setOrientation", &["Qt::Orientation"])
                .members(&["setMinimum", "setMaximum", "setSingleStep", "setPageStep", "setTracking"])
                .build(),
        );
        t.set_default("QAbstractSlider", "maximum", 99);
        t.set_default("QAbstractSlider", "singleStep", 1);
        t.set_default("QAbstractSlider", "pageStep", 10);
        t.set_default("QAbstractSlider", "orientation", VERTICAL);
        t.set_default("QAbstractSlider", "tracking", true);
        t.define(
            MetaClass::builder("QSlider")
                .parent(&slider)
                .property(MetaProperty::new("tickInterval", "int"))
                .members(&["setTickInterval"])
                .build(),
        );

        t.define(
            MetaClass::builder("QComboBox")
                .parent(&widget)
                .property(
                    MetaProperty::new("currentIndex", "int")
                        .with_notify(MetaMethod::signal("currentIndexChanged", &["int"])),
                )
                .property(
                    MetaProperty::new("currentText", "QString")
                        .with_notify(MetaMethod::signal("currentTextChanged", &["QString"])),
                )
                .property(MetaProperty::new("editable", "bool"))
                .signal("currentIndexChanged", &["int"])
                .signal("currentIndexChanged", &["QString"])
                .signal("currentTextChanged", &["QString"])
                .signal("activated", &["int"])
                .slot("clear", &[])
                .slot("setCurrentIndex", &["int"])
                .members(&[
                    "addItem", "addItems", "itemText", "itemData", "count", "setEditable", "lineEdit",
                    "setEditText",
                ])
                .build(),
        );
        t.set_default("QComboBox", "currentIndex", -1);

        let layout = t.define(
            MetaClass::builder("QLayout")
                .parent(&object)
                .property(MetaProperty::new("spacing", "int"))
                .members(&["addWidget", "addItem", "count", "setContentsMargins", "setSpacing"])
                .build(),
        );
        let box_layout = t.define(
            MetaClass::builder("QBoxLayout")
                .parent(&layout)
                .members(&["addLayout", "addStretch", "addSpacing", "insertWidget", "setDirection"])
                .build(),
        );
        t.define(MetaClass::builder("QVBoxLayout").parent(&box_layout).build());
        t.define(MetaClass::builder("QHBoxLayout").parent(&box_layout).build());
        t.define(
            MetaClass::builder("QStackedLayout")
                .parent(&layout)
                .property(
                    MetaProperty::new("currentIndex", "int")
                        .with_notify(MetaMethod::signal("currentChanged", &["int"])),
                )
                .signal("currentChanged", &["int"])
                .slot("setCurrentIndex", &["int"])
                .build(),
        );
        t.define(
            MetaClass::builder("QGridLayout")
                .parent(&layout)
                .members(&["addLayout", "rowCount", "columnCount"])
                .build(),
        );
        t.define(
            MetaClass::builder("QFormLayout")
                .parent(&layout)
                .members(&["addRow", "rowCount"])
                .build(),
        );

        t.define(
            MetaClass::builder("QSplitter")
                .parent(&widget)
                .property(MetaProperty::new("orientation", "Qt::Orientation"))
                .property(MetaProperty::new("childrenCollapsible", "bool"))
                .signal("splitterMoved", &["int", "int"])
                .members(&["addWidget", "insertWidget", "setOrientation", "sizes", "setSizes"])
                .build(),
        );
        t.set_default("QSplitter", "orientation", HORIZONTAL);

        t.define(
            MetaClass::builder("QButtonGroup")
                .parent(&object)
                .property(MetaProperty::new("exclusive", "bool"))
                .signal("buttonClicked", &["QAbstractButton*"])
                .signal("buttonClicked", &["int"])
                .members(&["addButton", "removeButton", "checkedId", "setExclusive"])
                .build(),
        );
        t.set_default("QButtonGroup", "exclusive", true);

        let validator = t.define(
            MetaClass::builder("QValidator")
                .parent(&object)
                .signal("changed", &[])
                .members(&["validate"])
                .build(),
        );
        t.define(
            MetaClass::builder("QIntValidator")
                .parent(&validator)
                .property(MetaProperty::new("bottom", "int"))
                .property(MetaProperty::new("top", "int"))
                .members(&["setBottom", "setTop", "setRange"])
                .build(),
        );
        t.set_default("QIntValidator", "bottom", i64::from(i32::MIN));
        t.set_default("QIntValidator", "top", i64::from(i32::MAX));
        t.define(
            MetaClass::builder("QDoubleValidator")
                .parent(&validator)
                .property(MetaProperty::new("bottom", "double"))
                .property(MetaProperty::new("top", "double"))
                .property(MetaProperty::new("decimals", "int"))
                .members(&["setBottom", "setTop", "setRange", "setDecimals"])
                .build(),
        );
        t.set_default("QDoubleValidator", "bottom", f64::MIN);
        t.set_default("QDoubleValidator", "top", f64::MAX);
        t.set_default("QDoubleValidator", "decimals", 1000);

        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subclasses_inherit_defaults() {
        let t = ClassTable::standard();
        let slider = t.get("QSlider").unwrap();
        let defaults = t.defaults_for(&slider);
        assert_eq!(defaults.get("maximum"), Some(&Value::Int(99)));
        assert_eq!(defaults.get("enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn group_box_rejects_alignment() {
        let t = ClassTable::standard();
        let gb = t.get("QGroupBox").unwrap();
        assert_eq!(t.rejected_for(&gb), vec!["alignment".to_owned()]);
    }
}
