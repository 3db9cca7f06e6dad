#![forbid(unsafe_code)]

//! Proxy classes and the reflection pass that populates them.
//!
//! A proxy class is a Rust type implementing [`BinderClass`]: it names the
//! toolkit class it wraps and may declare extra attributes, renames and
//! defaults in [`BinderClass::declare`]. The first time a binder of that type
//! is created, [`class_info`] reflects over the toolkit class and builds the
//! complete descriptor table, which every later instance shares.
//!
//! # Reflection order
//!
//! 1. Explicit declarations from [`ClassDecl`].
//! 2. Static properties, ancestors first.
//! 3. Signals and slots, grouped by name. The first signature of each group
//!    is registered under the plain name; when a group has several
//!    signatures, each is also registered as `name_Type1_Type2`.
//! 4. Getter/setter pairs (`foo`/`setFoo`) among the plain members of the
//!    class and its ancestors, in name order.
//!
//! Earlier entries win name collisions. Native names that are reserved words
//! in the expression language get an `_` suffix, and any resolved name ending
//! in `_` is not registered at all.
//!
//! # Invariants
//!
//! 1. Reflection runs at most once per proxy type per thread.
//! 2. Renames are applied before any name is registered.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use bindery_core::meta::setter_name;
use bindery_core::names::escape_keyword;
use bindery_core::toolkit;
use bindery_core::{MetaClass, MetaMethod, MethodKind, Result, Value};

use crate::descriptor::Descriptor;

/// A proxy class: a Rust type standing for one toolkit class.
pub trait BinderClass: 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;
    /// Toolkit class wrapped by instances.
    const TARGET: &'static str;

    /// Declare attributes, renames and defaults. Subclasses call their
    /// parent's `declare` first.
    fn declare(_decl: &mut ClassDecl) {}
}

/// Rename an automatically generated attribute, optionally giving it a
/// default.
#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    /// Native member name (without a signature).
    pub native: String,
    /// Attribute name to use instead.
    pub name: String,
    pub default: Option<Value>,
}

impl fmt::Display for Rename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "Rename({:?}, {default:?})", self.native),
            None => write!(f, "Rename({:?})", self.native),
        }
    }
}

/// Explicit declarations of a proxy class.
#[derive(Debug, Default)]
pub struct ClassDecl {
    descriptors: BTreeMap<String, Descriptor>,
    renames: Vec<Rename>,
    defaults: Vec<(String, Value)>,
}

impl ClassDecl {
    /// Plain stored attribute that notifies when its value changes.
    pub fn attribute(&mut self, name: &str, default: impl Into<Value>) -> &mut Self {
        self.descriptors.insert(
            name.to_owned(),
            Descriptor::Attribute {
                default: default.into(),
                compare: true,
            },
        );
        self
    }

    /// Plain stored attribute that notifies on every assignment.
    pub fn attribute_no_compare(&mut self, name: &str, default: impl Into<Value>) -> &mut Self {
        self.descriptors.insert(
            name.to_owned(),
            Descriptor::Attribute {
                default: default.into(),
                compare: false,
            },
        );
        self
    }

    /// Ad-hoc property created on the widget when it is attached. A styled
    /// property re-evaluates the widget's style rules on every write.
    pub fn dynamic_property(
        &mut self,
        name: &str,
        default: impl Into<Value>,
        styled: bool,
    ) -> &mut Self {
        self.descriptors.insert(
            name.to_owned(),
            Descriptor::DynamicProperty {
                default: default.into(),
                styled,
            },
        );
        self
    }

    /// Getter/setter pair that is not a toolkit property. The setter defaults
    /// to `setGetter`.
    pub fn getter_setter(&mut self, name: &str, getter: &str, setter: Option<&str>) -> &mut Self {
        self.descriptors.insert(
            name.to_owned(),
            Descriptor::GetterSetter {
                getter: getter.to_owned(),
                setter: setter.map_or_else(|| setter_name(getter), str::to_owned),
            },
        );
        self
    }

    pub fn rename(&mut self, native: &str, name: &str) -> &mut Self {
        self.renames.push(Rename {
            native: native.to_owned(),
            name: name.to_owned(),
            default: None,
        });
        self
    }

    pub fn rename_with_default(
        &mut self,
        native: &str,
        name: &str,
        default: impl Into<Value>,
    ) -> &mut Self {
        let default = default.into();
        self.defaults.push((name.to_owned(), default.clone()));
        self.renames.push(Rename {
            native: native.to_owned(),
            name: name.to_owned(),
            default: Some(default),
        });
        self
    }

    /// Value assigned to an attribute when the widget is attached.
    pub fn default_value(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.defaults.push((name.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    #[must_use]
    pub fn renames(&self) -> &[Rename] {
        &self.renames
    }
}

/// The reflected descriptor table of one proxy class.
pub struct ClassInfo {
    name: &'static str,
    meta: Rc<MetaClass>,
    descriptors: BTreeMap<String, Descriptor>,
    defaults: Vec<(String, Value)>,
}

impl ClassInfo {
    /// Run the reflection pass for `meta` on top of the explicit `decl`.
    #[must_use]
    pub fn reflect(name: &'static str, meta: Rc<MetaClass>, mut decl: ClassDecl) -> Self {
        // Every binder carries an `id`.
        decl.descriptors
            .entry("id".to_owned())
            .or_insert(Descriptor::Attribute {
                default: Value::from(""),
                compare: true,
            });

        let ClassDecl {
            mut descriptors,
            renames,
            defaults,
        } = decl;
        let renamings: AHashMap<&str, &str> = renames
            .iter()
            .map(|r| (r.native.as_str(), r.name.as_str()))
            .collect();
        let resolve = |native: &str| -> String {
            match renamings.get(native) {
                Some(name) => (*name).to_owned(),
                None => escape_keyword(native).into_owned(),
            }
        };
        let mut seen: BTreeSet<String> = descriptors.keys().cloned().collect();

        for prop in meta.all_properties() {
            let name = resolve(prop.name());
            if seen.contains(&name) || name.ends_with('_') {
                continue;
            }
            descriptors.insert(name.clone(), Descriptor::Property(prop.clone()));
            seen.insert(name);
        }

        let mut groups: Vec<(String, Vec<&MetaMethod>)> = Vec::new();
        let mut group_index: AHashMap<String, usize> = AHashMap::new();
        for method in meta.all_methods() {
            let name = resolve(method.name());
            match group_index.get(&name) {
                Some(&i) => groups[i].1.push(method),
                None => {
                    group_index.insert(name.clone(), groups.len());
                    groups.push((name, vec![method]));
                }
            }
        }
        for (name, methods) in groups {
            let Some(first) = methods.first() else {
                continue;
            };
            let make: fn(MetaMethod) -> Descriptor = match first.kind() {
                MethodKind::Slot => Descriptor::Slot,
                MethodKind::Signal => Descriptor::Signal,
                MethodKind::Method => continue,
            };
            if !seen.contains(&name) {
                if name.ends_with('_') {
                    continue;
                }
                descriptors.insert(name.clone(), make((*first).clone()));
                seen.insert(name.clone());
            }
            if methods.len() > 1 {
                for method in &methods {
                    let qualname = std::iter::once(name.as_str())
                        .chain(
                            method
                                .parameter_types()
                                .iter()
                                .map(|t| t.trim_end_matches('*')),
                        )
                        .collect::<Vec<_>>()
                        .join("_");
                    if seen.contains(&qualname) || qualname.ends_with('_') {
                        continue;
                    }
                    descriptors.insert(qualname.clone(), make((*method).clone()));
                    seen.insert(qualname);
                }
            }
        }

        let members = meta.all_members();
        for getter in &members {
            // `property(name)`/`setProperty(name, value)` look like a pair but
            // take a name argument.
            if *getter == "property" {
                continue;
            }
            let setter = setter_name(getter);
            if !members.contains(setter.as_str()) {
                continue;
            }
            let name = resolve(getter);
            if name.ends_with('_') || seen.contains(&name) {
                continue;
            }
            descriptors.insert(
                name.clone(),
                Descriptor::GetterSetter {
                    getter: (*getter).to_owned(),
                    setter,
                },
            );
            seen.insert(name);
        }

        Self {
            name,
            meta,
            descriptors,
            defaults,
        }
    }

    /// Proxy class name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Toolkit class metadata.
    #[must_use]
    pub fn meta(&self) -> &Rc<MetaClass> {
        &self.meta
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.get(name)
    }

    /// All attribute names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.descriptors.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Values assigned when a widget is attached: dynamic-property defaults,
    /// then declared defaults. A later entry for the same name replaces the
    /// value but keeps the earlier position.
    #[must_use]
    pub fn initial_values(&self) -> Vec<(String, Value)> {
        let mut values = Vec::new();
        for (name, descriptor) in &self.descriptors {
            if let Descriptor::DynamicProperty { default, .. } = descriptor {
                upsert(&mut values, name.clone(), default.clone());
            }
        }
        for (name, value) in &self.defaults {
            upsert(&mut values, name.clone(), value.clone());
        }
        values
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("target", &self.meta.name())
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}

/// Insert or replace `name` in an ordered list of assignments.
pub(crate) fn upsert(values: &mut Vec<(String, Value)>, name: String, value: Value) {
    match values.iter_mut().find(|(n, _)| *n == name) {
        Some(slot) => slot.1 = value,
        None => values.push((name, value)),
    }
}

thread_local! {
    static REGISTRY: RefCell<AHashMap<TypeId, Rc<ClassInfo>>> = RefCell::new(AHashMap::new());
    static INITIALIZATIONS: RefCell<AHashMap<TypeId, usize>> = RefCell::new(AHashMap::new());
}

/// The descriptor table for `C`, reflecting over the toolkit class on first
/// use.
pub fn class_info<C: BinderClass>() -> Result<Rc<ClassInfo>> {
    let key = TypeId::of::<C>();
    if let Some(info) = REGISTRY.with(|r| r.borrow().get(&key).cloned()) {
        return Ok(info);
    }

    let meta = toolkit::current()?.meta_class(C::TARGET)?;
    let mut decl = ClassDecl::default();
    C::declare(&mut decl);
    let info = Rc::new(ClassInfo::reflect(C::NAME, meta, decl));
    tracing::debug!(
        class = C::NAME,
        target = C::TARGET,
        descriptors = info.len(),
        "initialized proxy class"
    );

    REGISTRY.with(|r| r.borrow_mut().insert(key, Rc::clone(&info)));
    INITIALIZATIONS.with(|c| *c.borrow_mut().entry(key).or_insert(0) += 1);
    Ok(info)
}

/// How many times reflection has run for `C` on this thread.
#[must_use]
pub fn initialization_count<C: BinderClass>() -> usize {
    INITIALIZATIONS.with(|c| c.borrow().get(&TypeId::of::<C>()).copied().unwrap_or(0))
}
