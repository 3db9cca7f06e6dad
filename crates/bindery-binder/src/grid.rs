#![forbid(unsafe_code)]

//! Grid and form layouts.
//!
//! Cells may hold a child proxy, a text label created at configure time, or
//! nothing. Shapes are checked when the composite is created, before any
//! widget exists.

use std::fmt;
use std::rc::Rc;

use bindery_core::toolkit;
use bindery_core::{Error, Result, Value, WidgetRef};

use crate::binder::Binder;
use crate::class::BinderClass;
use crate::proxy::{Proxy, ProxyRef, is_layout};

/// `Qt::Alignment` flags.
pub mod alignment {
    pub const LEFT: i64 = 0x0001;
    pub const RIGHT: i64 = 0x0002;
    pub const HCENTER: i64 = 0x0004;
    pub const JUSTIFY: i64 = 0x0008;
    pub const TOP: i64 = 0x0020;
    pub const BOTTOM: i64 = 0x0040;
    pub const VCENTER: i64 = 0x0080;
    pub const CENTER: i64 = HCENTER | VCENTER;
}

/// Content of one grid cell.
#[derive(Clone)]
pub enum GridCell {
    Empty,
    /// A label showing this text.
    Text(String),
    Proxy(ProxyRef),
    /// Another cell with explicit alignment flags.
    Aligned(Box<GridCell>, i64),
}

impl GridCell {
    #[must_use]
    pub fn aligned(self, flags: i64) -> Self {
        Self::Aligned(Box::new(self), flags)
    }

    fn split(&self) -> (&GridCell, i64) {
        match self {
            Self::Aligned(inner, flags) => (&**inner, *flags),
            other => (other, 0),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Aligned(inner, _) if matches!(**inner, Self::Aligned(..)) => Err(Error::Layout(
                "alignment applies to a cell, not to another aligned cell".into(),
            )),
            _ => Ok(()),
        }
    }

    fn proxy(&self) -> Option<&ProxyRef> {
        match self.split().0 {
            Self::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }
}

impl From<&str> for GridCell {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<ProxyRef> for GridCell {
    fn from(proxy: ProxyRef) -> Self {
        Self::Proxy(proxy)
    }
}

impl From<Option<ProxyRef>> for GridCell {
    fn from(proxy: Option<ProxyRef>) -> Self {
        proxy.map_or(Self::Empty, Self::Proxy)
    }
}

impl fmt::Debug for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("None"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Proxy(proxy) => write!(f, "{proxy:?}"),
            Self::Aligned(inner, flags) => write!(f, "({inner:?}, {flags:#x})"),
        }
    }
}

fn new_label(text: &str) -> Result<WidgetRef> {
    let toolkit = toolkit::current()?;
    let label = toolkit.create_named("QLabel")?;
    label.invoke("setText", &[Value::from(text)])?;
    Ok(label)
}

/// Widget for a text or proxy cell; labels are created on the spot.
fn cell_widget(cell: &GridCell) -> Result<Option<WidgetRef>> {
    match cell {
        GridCell::Empty => Ok(None),
        GridCell::Text(text) => new_label(text).map(Some),
        GridCell::Proxy(proxy) => proxy.widget().map(Some),
        GridCell::Aligned(inner, _) => cell_widget(inner),
    }
}

fn add_to_grid(grid: &WidgetRef, widget: WidgetRef, mut args: Vec<Value>) -> Result<()> {
    let method = if is_layout(&widget) {
        "addLayout"
    } else {
        "addWidget"
    };
    args.insert(0, Value::Widget(widget));
    grid.invoke(method, &args).map(drop)
}

/// A grid without spans. Every row has the same number of cells.
pub struct GridLayout {
    binder: Rc<Binder>,
    rows: Vec<Vec<GridCell>>,
}

impl BinderClass for GridLayout {
    const NAME: &'static str = "GridLayout";
    const TARGET: &'static str = "QGridLayout";
}

impl GridLayout {
    /// Fails with [`Error::Layout`] when rows differ in length.
    pub fn new(rows: Vec<Vec<GridCell>>) -> Result<Rc<Self>> {
        if let Some(first) = rows.first() {
            let columns = first.len();
            if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
                return Err(Error::Layout(format!(
                    "expected the same number of columns in every row: row 0 has {columns}, row {i} has {}",
                    row.len()
                )));
            }
        }
        for cell in rows.iter().flatten() {
            cell.validate()?;
        }
        Ok(Rc::new(Self {
            binder: Binder::new::<Self>()?,
            rows,
        }))
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.rows
    }
}

impl Proxy for GridLayout {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        self.rows
            .iter()
            .flatten()
            .filter_map(GridCell::proxy)
            .cloned()
            .collect()
    }

    fn configure_target(&self) -> Result<()> {
        let grid = self.widget()?;
        for (irow, row) in (0_i64..).zip(&self.rows) {
            for (icol, cell) in (0_i64..).zip(row) {
                let (_, flags) = cell.split();
                if let Some(widget) = cell_widget(cell)? {
                    add_to_grid(
                        &grid,
                        widget,
                        vec![Value::Int(irow), Value::Int(icol), Value::Int(flags)],
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridLayout")
            .field("id", &self.binder.id())
            .field("rows", &self.rows)
            .finish()
    }
}

/// One placement in a [`SpanGridLayout`].
#[derive(Clone, Debug)]
pub struct SpanItem {
    pub cell: GridCell,
    pub row: i64,
    pub column: i64,
    /// `(rows, columns)`; `-1` extends to the last row or column.
    pub span: Option<(i64, i64)>,
    pub alignment: Option<i64>,
}

impl SpanItem {
    #[must_use]
    pub fn new(cell: impl Into<GridCell>, row: i64, column: i64) -> Self {
        Self {
            cell: cell.into(),
            row,
            column,
            span: None,
            alignment: None,
        }
    }

    #[must_use]
    pub fn span(mut self, rows: i64, columns: i64) -> Self {
        self.span = Some((rows, columns));
        self
    }

    #[must_use]
    pub fn align(mut self, flags: i64) -> Self {
        self.alignment = Some(flags);
        self
    }

    fn validate(&self) -> Result<()> {
        if !matches!(self.cell, GridCell::Text(_) | GridCell::Proxy(_)) {
            return Err(Error::Layout(format!(
                "span grid items hold a label or a proxy, got {:?}",
                self.cell
            )));
        }
        if self.row < 0 || self.column < 0 {
            return Err(Error::Layout(format!(
                "negative grid position ({}, {})",
                self.row, self.column
            )));
        }
        if let Some((rows, columns)) = self.span {
            let valid = |n: i64| n >= 1 || n == -1;
            if !valid(rows) || !valid(columns) {
                return Err(Error::Layout(format!("invalid span ({rows}, {columns})")));
            }
        }
        Ok(())
    }

    fn args(&self) -> Vec<Value> {
        let mut args = vec![Value::Int(self.row), Value::Int(self.column)];
        if let Some((rows, columns)) = self.span {
            args.extend([Value::Int(rows), Value::Int(columns)]);
        }
        if let Some(flags) = self.alignment {
            args.push(Value::Int(flags));
        }
        args
    }
}

/// A grid whose items may span several rows or columns.
pub struct SpanGridLayout {
    binder: Rc<Binder>,
    items: Vec<SpanItem>,
}

impl BinderClass for SpanGridLayout {
    const NAME: &'static str = "SpanGridLayout";
    const TARGET: &'static str = "QGridLayout";
}

impl SpanGridLayout {
    pub fn new(items: Vec<SpanItem>) -> Result<Rc<Self>> {
        for item in &items {
            item.validate()?;
        }
        Ok(Rc::new(Self {
            binder: Binder::new::<Self>()?,
            items,
        }))
    }
}

impl Proxy for SpanGridLayout {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        self.items
            .iter()
            .filter_map(|item| item.cell.proxy())
            .cloned()
            .collect()
    }

    fn configure_target(&self) -> Result<()> {
        let grid = self.widget()?;
        for item in &self.items {
            if let Some(widget) = cell_widget(&item.cell)? {
                add_to_grid(&grid, widget, item.args())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SpanGridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanGridLayout")
            .field("id", &self.binder.id())
            .field("items", &self.items)
            .finish()
    }
}

/// Label column of a [`FormRow`].
#[derive(Clone, Debug)]
pub enum FormLabel {
    None,
    Text(String),
    Proxy(ProxyRef),
}

/// One row of a [`FormLayout`].
#[derive(Clone, Debug)]
pub enum FormRow {
    /// A label and a field.
    Labeled(FormLabel, ProxyRef),
    /// A widget spanning both columns.
    Full(ProxyRef),
}

impl FormRow {
    #[must_use]
    pub fn text(label: &str, field: ProxyRef) -> Self {
        Self::Labeled(FormLabel::Text(label.to_owned()), field)
    }
}

/// A two-column label/field form.
pub struct FormLayout {
    binder: Rc<Binder>,
    rows: Vec<FormRow>,
}

impl BinderClass for FormLayout {
    const NAME: &'static str = "FormLayout";
    const TARGET: &'static str = "QFormLayout";
}

impl FormLayout {
    pub fn new(rows: Vec<FormRow>) -> Result<Rc<Self>> {
        Ok(Rc::new(Self {
            binder: Binder::new::<Self>()?,
            rows,
        }))
    }
}

impl Proxy for FormLayout {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn child_proxies(&self) -> Vec<ProxyRef> {
        let mut children = Vec::new();
        for row in &self.rows {
            match row {
                FormRow::Labeled(label, field) => {
                    if let FormLabel::Proxy(label) = label {
                        children.push(Rc::clone(label));
                    }
                    children.push(Rc::clone(field));
                }
                FormRow::Full(proxy) => children.push(Rc::clone(proxy)),
            }
        }
        children
    }

    fn configure_target(&self) -> Result<()> {
        let form = self.widget()?;
        for row in &self.rows {
            match row {
                FormRow::Labeled(label, field) => {
                    let label = match label {
                        FormLabel::None => Value::None,
                        FormLabel::Text(text) => Value::from(text.as_str()),
                        FormLabel::Proxy(proxy) => Value::Widget(proxy.widget()?),
                    };
                    form.invoke("addRow", &[label, Value::Widget(field.widget()?)])?;
                }
                FormRow::Full(proxy) => {
                    let widget = proxy.widget()?;
                    // Only widgets can span a whole form row.
                    if !is_layout(&widget) {
                        form.invoke("addRow", &[Value::Widget(widget)])?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FormLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormLayout")
            .field("id", &self.binder.id())
            .field("rows", &self.rows)
            .finish()
    }
}
