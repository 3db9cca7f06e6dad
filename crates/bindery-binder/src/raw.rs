#![forbid(unsafe_code)]

//! Leaf proxies that wrap one toolkit class each and add nothing beyond
//! what reflection finds, plus [`ComboBox`], which also wraps the line edit
//! of an editable box.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bindery_core::{HasAttributes, Result};

use crate::binder::Binder;
use crate::class::BinderClass;
use crate::proxy::{Proxy, ProxyRef};
use crate::registry::BinderRegistry;

macro_rules! raw_binders {
    ($($name:ident => $target:literal),* $(,)?) => {
        $(
            #[doc = concat!("Proxy for `", $target, "`.")]
            pub struct $name {
                binder: Rc<Binder>,
            }

            impl BinderClass for $name {
                const NAME: &'static str = stringify!($name);
                const TARGET: &'static str = $target;
            }

            impl $name {
                pub fn new() -> Result<Rc<Self>> {
                    Ok(Rc::new(Self {
                        binder: Binder::new::<Self>()?,
                    }))
                }
            }

            impl Proxy for $name {
                fn binder(&self) -> &Rc<Binder> {
                    &self.binder
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self.binder.as_ref(), f)
                }
            }
        )*

        fn register_leaves(registry: &mut BinderRegistry) {
            $(
                registry.register($target, || Ok($name::new()? as ProxyRef));
            )*
        }
    };
}

raw_binders! {
    Object => "QObject",
    Timer => "QTimer",
    Widget => "QWidget",
    Frame => "QFrame",
    Label => "QLabel",
    LineEdit => "QLineEdit",
    TextEdit => "QTextEdit",
    PlainTextEdit => "QPlainTextEdit",
    AbstractButton => "QAbstractButton",
    PushButton => "QPushButton",
    ToolButton => "QToolButton",
    CheckBox => "QCheckBox",
    RadioButton => "QRadioButton",
    AbstractSlider => "QAbstractSlider",
    Slider => "QSlider",
    Dial => "QDial",
    ScrollBar => "QScrollBar",
    SpinBox => "QSpinBox",
    DoubleSpinBox => "QDoubleSpinBox",
    ProgressBar => "QProgressBar",
    TabWidget => "QTabWidget",
    StackedWidget => "QStackedWidget",
    ListWidget => "QListWidget",
    Validator => "QValidator",
    IntValidator => "QIntValidator",
    DoubleValidator => "QDoubleValidator",
    RegExpValidator => "QRegExpValidator",
}

pub(crate) fn register_all(registry: &mut BinderRegistry) {
    register_leaves(registry);
    registry.register(ComboBox::TARGET, || Ok(ComboBox::new()? as ProxyRef));
}

/// Builds the proxy wrapping an editable combo box's line edit.
pub type LineEditFactory = Box<dyn Fn() -> Result<ProxyRef>>;

/// The line edit of an editable combo box. While the box is editable it is
/// wrapped in a proxy and exposed as the box's `lineEdit` child.
pub(crate) struct LineEditSlot {
    factory: LineEditFactory,
    proxy: RefCell<Option<ProxyRef>>,
}

impl LineEditSlot {
    pub(crate) fn new(factory: LineEditFactory) -> Self {
        Self {
            factory,
            proxy: RefCell::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<ProxyRef> {
        self.proxy.borrow().clone()
    }

    /// Wrap or release the native line edit to match `editable`. Returns the
    /// proxy when a new one was attached.
    pub(crate) fn sync(&self, combo: &Binder) -> Result<Option<ProxyRef>> {
        let Some(widget) = combo.target() else {
            return Ok(None);
        };
        let native = if combo.get_attr("editable")?.truthy() {
            widget.invoke("lineEdit", &[])?.as_widget().cloned()
        } else {
            None
        };
        let Some(native) = native else {
            self.release(combo)?;
            return Ok(None);
        };
        if let Some(current) = self.get()
            && current.binder().target().is_some_and(|w| Rc::ptr_eq(&w, &native))
        {
            return Ok(None);
        }

        self.release(combo)?;
        let proxy = (self.factory)()?;
        proxy.binder().set_target(native)?;
        proxy.configure()?;
        combo.add_child("lineEdit", proxy.object());
        *self.proxy.borrow_mut() = Some(Rc::clone(&proxy));
        tracing::debug!(class = combo.class().name(), "wrapped line edit");
        Ok(Some(proxy))
    }

    pub(crate) fn release(&self, combo: &Binder) -> Result<()> {
        let released = self.proxy.borrow_mut().take();
        if let Some(proxy) = released {
            combo.remove_child("lineEdit");
            proxy.dispose()?;
        }
        Ok(())
    }
}

/// Proxy for `QComboBox`.
pub struct ComboBox {
    binder: Rc<Binder>,
    line_edit: Rc<LineEditSlot>,
}

impl BinderClass for ComboBox {
    const NAME: &'static str = "ComboBox";
    const TARGET: &'static str = "QComboBox";
}

impl ComboBox {
    pub fn new() -> Result<Rc<Self>> {
        Self::with_line_edit(Box::new(|| Ok(LineEdit::new()? as ProxyRef)))
    }

    /// A combo box whose line edit, when editable, is wrapped by proxies
    /// from `factory`.
    pub fn with_line_edit(factory: LineEditFactory) -> Result<Rc<Self>> {
        let binder = Binder::new::<Self>()?;
        let line_edit = Rc::new(LineEditSlot::new(factory));
        let slot = Rc::clone(&line_edit);
        binder.on_change("editable", move |b, _| slot.sync(b).map(drop))?;
        Ok(Rc::new(Self { binder, line_edit }))
    }

    /// The wrapped line edit, while the box is editable.
    #[must_use]
    pub fn line_edit(&self) -> Option<ProxyRef> {
        self.line_edit.get()
    }
}

impl Proxy for ComboBox {
    fn binder(&self) -> &Rc<Binder> {
        &self.binder
    }

    fn configure_target(&self) -> Result<()> {
        self.line_edit.sync(&self.binder).map(drop)
    }

    fn dispose_target(&self) -> Result<()> {
        self.line_edit.release(&self.binder)?;
        self.binder.dispose()
    }
}

impl fmt::Debug for ComboBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.binder.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_wrapped_class() {
        assert_eq!(LineEdit::NAME, "LineEdit");
        assert_eq!(LineEdit::TARGET, "QLineEdit");
        assert_eq!(RegExpValidator::TARGET, "QRegExpValidator");
    }

    #[test]
    fn every_raw_class_is_registered() {
        let mut registry = BinderRegistry::new();
        register_all(&mut registry);
        assert!(registry.contains("QObject"));
        assert!(registry.contains("QComboBox"));
        assert!(!registry.contains("QVBoxLayout"));
    }
}
