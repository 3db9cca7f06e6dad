#![forbid(unsafe_code)]

//! The in-memory [`Toolkit`] implementation.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use bindery_core::toolkit;
use bindery_core::{Error, LoadedUi, MetaClass, Result, Toolkit, ToolkitQuirks, Value, WidgetRef};

use crate::classes::ClassTable;
use crate::widget::MockWidget;

/// In-memory toolkit backed by a [`ClassTable`].
///
/// Layout description files use a minimal indented format: one object per
/// line as `ClassName objectName`, children indented by two spaces under their
/// parent. The first line is the root.
///
/// ```text
/// QWidget form
///   QLineEdit name_edit
///   QPushButton ok_button
/// ```
#[derive(Debug)]
pub struct MockToolkit {
    table: RefCell<ClassTable>,
    quirks: Cell<ToolkitQuirks>,
    created: RefCell<Vec<WidgetRef>>,
}

impl MockToolkit {
    /// A toolkit with the standard class table.
    #[must_use]
    pub fn standard() -> Rc<Self> {
        Self::with_table(ClassTable::standard())
    }

    #[must_use]
    pub fn with_table(table: ClassTable) -> Rc<Self> {
        Rc::new(Self {
            table: RefCell::new(table),
            quirks: Cell::new(ToolkitQuirks::default()),
            created: RefCell::new(Vec::new()),
        })
    }

    /// Register an extra class.
    pub fn define(&self, class: Rc<MetaClass>) -> Rc<MetaClass> {
        self.table.borrow_mut().define(class)
    }

    /// Look up a class from the table, for building test metadata.
    pub fn class(&self, name: &str) -> Result<Rc<MetaClass>> {
        self.table
            .borrow()
            .get(name)
            .ok_or_else(|| Error::UnknownClass(name.to_owned()))
    }

    pub fn set_default(&self, class: &str, property: &str, value: impl Into<Value>) {
        self.table.borrow_mut().set_default(class, property, value);
    }

    pub fn set_quirks(&self, quirks: ToolkitQuirks) {
        self.quirks.set(quirks);
    }

    /// Every object created so far, in creation order.
    #[must_use]
    pub fn created(&self) -> Vec<WidgetRef> {
        self.created.borrow().clone()
    }

    /// Objects of `class` (exactly) created so far.
    #[must_use]
    pub fn created_of(&self, class: &str) -> Vec<WidgetRef> {
        self.created
            .borrow()
            .iter()
            .filter(|w| w.meta_class().name() == class)
            .cloned()
            .collect()
    }

    fn instantiate(&self, class: Rc<MetaClass>) -> Rc<MockWidget> {
        let (defaults, rejected) = {
            let table = self.table.borrow();
            (table.defaults_for(&class), table.rejected_for(&class))
        };
        let widget = MockWidget::new(class, defaults, rejected);
        let handle: WidgetRef = widget.clone();
        self.created.borrow_mut().push(handle);
        widget
    }
}

impl Toolkit for MockToolkit {
    fn meta_class(&self, name: &str) -> Result<Rc<MetaClass>> {
        self.class(name)
    }

    fn create(&self, class: &MetaClass) -> Result<WidgetRef> {
        let class = self.class(class.name())?;
        Ok(self.instantiate(class))
    }

    fn quirks(&self) -> ToolkitQuirks {
        self.quirks.get()
    }

    fn load_ui(&self, source: &str) -> Result<LoadedUi> {
        let mut stack: Vec<(usize, Rc<MockWidget>)> = Vec::new();
        let mut root: Option<WidgetRef> = None;
        let mut names = BTreeMap::new();

        for (lineno, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start().len();
            let mut parts = line.split_whitespace();
            let (Some(class_name), name) = (parts.next(), parts.next()) else {
                continue;
            };
            let class = self.class(class_name).map_err(|_| {
                Error::Toolkit(format!("line {}: unknown class {class_name:?}", lineno + 1))
            })?;
            let widget = self.instantiate(class);
            if let Some(name) = name {
                widget.set_value("objectName", Value::from(name))?;
                names.insert(name.to_owned(), widget.clone() as WidgetRef);
            }

            while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
                stack.pop();
            }
            match stack.last() {
                Some((_, parent)) => parent.adopt(widget.clone()),
                None if root.is_none() => root = Some(widget.clone() as WidgetRef),
                None => {
                    return Err(Error::Toolkit(format!(
                        "line {}: more than one root object",
                        lineno + 1
                    )));
                }
            }
            stack.push((indent, widget));
        }

        let root = root.ok_or_else(|| Error::Toolkit("empty layout description".into()))?;
        Ok(LoadedUi { root, names })
    }
}

/// Install a fresh standard [`MockToolkit`] on the current thread.
pub fn install_mock_toolkit() -> Rc<MockToolkit> {
    let toolkit = MockToolkit::standard();
    toolkit::install(toolkit.clone());
    toolkit
}
