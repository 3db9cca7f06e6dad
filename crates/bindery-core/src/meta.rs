#![forbid(unsafe_code)]

//! Toolkit class metadata.
//!
//! A [`MetaClass`] describes what a toolkit class exposes for reflection:
//! static properties (with an optional change-notification signal), signals,
//! slots and plain methods (each with parameter type names), and the names of
//! all plain callable members. Classes form a single-inheritance chain through
//! [`MetaClass::parent`].
//!
//! Lookups that say `all_*` walk the chain ancestors-first, matching the order
//! a toolkit's own meta-object reports inherited members.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// Kind of a callable member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Emits notifications; can be connected to.
    Signal,
    /// Invokable target for signals.
    Slot,
    /// Invokable but neither signal nor slot.
    Method,
}

/// A signal, slot or method of a toolkit class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaMethod {
    name: String,
    kind: MethodKind,
    parameter_types: Vec<String>,
}

impl MetaMethod {
    /// Describe a callable member.
    pub fn new(name: impl Into<String>, kind: MethodKind, parameter_types: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            parameter_types: parameter_types.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    /// Shorthand for a signal.
    pub fn signal(name: impl Into<String>, parameter_types: &[&str]) -> Self {
        Self::new(name, MethodKind::Signal, parameter_types)
    }

    /// Shorthand for a slot.
    pub fn slot(name: impl Into<String>, parameter_types: &[&str]) -> Self {
        Self::new(name, MethodKind::Slot, parameter_types)
    }

    /// Native name without the parameter list.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Parameter type names as declared, e.g. `["QString", "QObject*"]`.
    #[must_use]
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Full signature, e.g. `textChanged(QString)`.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameter_types.join(","))
    }
}

impl fmt::Display for MetaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// A static property of a toolkit class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaProperty {
    name: String,
    type_name: String,
    notify: Option<MetaMethod>,
}

impl MetaProperty {
    /// Describe a property without a change-notification signal.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            notify: None,
        }
    }

    /// Attach the signal emitted when the property changes.
    #[must_use]
    pub fn with_notify(mut self, signal: MetaMethod) -> Self {
        self.notify = Some(signal);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Toolkit type name, e.g. `"QString"` or `"int"`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Change-notification signal, if the property has one.
    #[must_use]
    pub fn notify_signal(&self) -> Option<&MetaMethod> {
        self.notify.as_ref()
    }

    /// Name of the conventional setter, `setFoo` for `foo`.
    #[must_use]
    pub fn setter_name(&self) -> String {
        setter_name(&self.name)
    }
}

/// Convert a getter name to the conventional setter name.
///
/// ```
/// assert_eq!(bindery_core::meta::setter_name("text"), "setText");
/// ```
#[must_use]
pub fn setter_name(getter: &str) -> String {
    let mut chars = getter.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_owned(),
    }
}

/// Reflection metadata for one toolkit class.
#[derive(Debug, PartialEq, Eq)]
pub struct MetaClass {
    name: String,
    parent: Option<Rc<MetaClass>>,
    properties: Vec<MetaProperty>,
    methods: Vec<MetaMethod>,
    members: Vec<String>,
}

impl MetaClass {
    /// Start describing a class.
    pub fn builder(name: impl Into<String>) -> MetaClassBuilder {
        MetaClassBuilder {
            class: MetaClass {
                name: name.into(),
                parent: None,
                properties: Vec::new(),
                methods: Vec::new(),
                members: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Rc<MetaClass>> {
        self.parent.as_ref()
    }

    /// Properties declared directly on this class.
    #[must_use]
    pub fn own_properties(&self) -> &[MetaProperty] {
        &self.properties
    }

    /// Methods declared directly on this class.
    #[must_use]
    pub fn own_methods(&self) -> &[MetaMethod] {
        &self.methods
    }

    /// This class followed by its ancestors, most derived first.
    pub fn lineage(&self) -> impl Iterator<Item = &MetaClass> {
        std::iter::successors(Some(self), |c| c.parent.as_deref())
    }

    /// All properties, ancestors first.
    #[must_use]
    pub fn all_properties(&self) -> Vec<&MetaProperty> {
        let chain: Vec<&MetaClass> = self.lineage().collect();
        chain.iter().rev().flat_map(|c| c.properties.iter()).collect()
    }

    /// All signals, slots and methods, ancestors first.
    #[must_use]
    pub fn all_methods(&self) -> Vec<&MetaMethod> {
        let chain: Vec<&MetaClass> = self.lineage().collect();
        chain.iter().rev().flat_map(|c| c.methods.iter()).collect()
    }

    /// Names of every callable member across the whole chain: plain members
    /// plus signal/slot/method names.
    #[must_use]
    pub fn all_members(&self) -> BTreeSet<&str> {
        self.lineage()
            .flat_map(|c| {
                c.members
                    .iter()
                    .map(String::as_str)
                    .chain(c.methods.iter().map(MetaMethod::name))
            })
            .collect()
    }

    /// Find a property by name anywhere in the chain.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&MetaProperty> {
        self.lineage()
            .flat_map(|c| c.properties.iter())
            .find(|p| p.name == name)
    }

    /// Find the first method with this name anywhere in the chain, most
    /// derived class first.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MetaMethod> {
        self.lineage()
            .flat_map(|c| c.methods.iter())
            .find(|m| m.name == name)
    }

    /// Whether the class has a callable member with this name.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.lineage().any(|c| {
            c.members.iter().any(|m| m == name) || c.methods.iter().any(|m| m.name == name)
        })
    }

    /// Whether this class is `name` or derives from it.
    #[must_use]
    pub fn inherits(&self, name: &str) -> bool {
        self.lineage().any(|c| c.name == name)
    }
}

/// Builder for [`MetaClass`].
#[derive(Debug)]
pub struct MetaClassBuilder {
    class: MetaClass,
}

impl MetaClassBuilder {
    /// Set the base class.
    #[must_use]
    pub fn parent(mut self, parent: &Rc<MetaClass>) -> Self {
        self.class.parent = Some(Rc::clone(parent));
        self
    }

    #[must_use]
    pub fn property(mut self, property: MetaProperty) -> Self {
        self.class.properties.push(property);
        self
    }

    #[must_use]
    pub fn signal(mut self, name: &str, parameter_types: &[&str]) -> Self {
        self.class.methods.push(MetaMethod::signal(name, parameter_types));
        self
    }

    #[must_use]
    pub fn slot(mut self, name: &str, parameter_types: &[&str]) -> Self {
        self.class.methods.push(MetaMethod::slot(name, parameter_types));
        self
    }

    /// Invokable method that is neither a signal nor a slot.
    #[must_use]
    pub fn method(mut self, name: &str, parameter_types: &[&str]) -> Self {
        self.class
            .methods
            .push(MetaMethod::new(name, MethodKind::Method, parameter_types));
        self
    }

    /// Plain callable members that carry no meta-method information.
    #[must_use]
    pub fn members(mut self, names: &[&str]) -> Self {
        self.class
            .members
            .extend(names.iter().map(|n| (*n).to_owned()));
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<MetaClass> {
        Rc::new(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> (Rc<MetaClass>, Rc<MetaClass>) {
        let object = MetaClass::builder("QObject")
            .property(MetaProperty::new("objectName", "QString").with_notify(
                MetaMethod::signal("objectNameChanged", &["QString"]),
            ))
            .signal("destroyed", &[])
            .signal("destroyed", &["QObject*"])
            .slot("deleteLater", &[])
            .members(&["parent", "setParent"])
            .build();
        let widget = MetaClass::builder("QWidget")
            .parent(&object)
            .property(MetaProperty::new("enabled", "bool"))
            .slot("setEnabled", &["bool"])
            .members(&["isEnabled"])
            .build();
        (object, widget)
    }

    #[test]
    fn setter_name_capitalizes() {
        assert_eq!(setter_name("text"), "setText");
        assert_eq!(setter_name("objectName"), "setObjectName");
        assert_eq!(setter_name("x"), "setX");
    }

    #[test]
    fn inherited_members_come_ancestors_first() {
        let (_, widget) = classes();
        let props: Vec<_> = widget.all_properties().iter().map(|p| p.name()).collect();
        assert_eq!(props, ["objectName", "enabled"]);
        let methods: Vec<_> = widget.all_methods().iter().map(|m| m.signature()).collect();
        assert_eq!(
            methods,
            [
                "destroyed()",
                "destroyed(QObject*)",
                "deleteLater()",
                "setEnabled(bool)"
            ]
        );
    }

    #[test]
    fn member_lookup_walks_chain() {
        let (_, widget) = classes();
        assert!(widget.has_member("setParent"));
        assert!(widget.has_member("deleteLater"));
        assert!(!widget.has_member("nope"));
        assert!(widget.inherits("QObject"));
        assert!(widget.property("objectName").is_some());
        let members = widget.all_members();
        assert!(members.contains("isEnabled"));
        assert!(members.contains("destroyed"));
    }

    #[test]
    fn notify_signal_is_exposed() {
        let (object, _) = classes();
        let prop = object.property("objectName").unwrap();
        assert_eq!(
            prop.notify_signal().map(MetaMethod::signature).as_deref(),
            Some("objectNameChanged(QString)")
        );
    }
}
