#![forbid(unsafe_code)]

//! Declarative bindings between proxy attributes and model attributes.
//!
//! A binding is written `left OP right`:
//!
//! | Operator | Kind | Effect |
//! |----------|------|--------|
//! | `=` | [`BindingKind::SetOnce`] | evaluate `right` once and assign it to `left` |
//! | `<<` | [`BindingKind::Pull`] | assign `right` to `left` now and whenever a referenced attribute changes |
//! | `>>` | [`BindingKind::Push`] | assign `left` to the `right` attribute whenever `left` changes |
//! | `:=` | [`BindingKind::Sync`] | pull, then push, on the same pair |
//!
//! `left` is a dotted path. When its first segment is the id of a proxy in
//! the context, the binding targets that proxy's attribute; otherwise the
//! whole path is resolved from the root object.
//!
//! # Re-entrancy
//!
//! Every registered handler carries its own in-handler flag. A handler that
//! is re-entered through the change it is making returns without acting, so
//! a pull that writes a proxy attribute never recurses into itself through
//! the widget's notification, even when nothing else guards the pair.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Malformed string | no operator, bad left side, empty right side | `Error::MalformedBinding` at parse time |
//! | Non-path push target | `>>`/`:=` with a compound right side | `Error::MalformedBinding` at parse time |
//! | Pull without references | `<<` right side names no object attribute | `Error::NoReferences` at bind time |
//! | Seeding an event | pulled attribute has no stored value | tolerated, `left` stays unset |
//! | Any other evaluation error | raised while seeding or handling | propagated; listeners registered so far are removed |

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;

use bindery_core::{
    Change, Error, Listener, ObjectRef, PathListener, Result, Value, get_path, listener,
    observe_path, set_path,
};

use crate::context::Context;
use crate::expr::Expression;

/// Direction and lifetime of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `=`
    SetOnce,
    /// `<<`
    Pull,
    /// `>>`
    Push,
    /// `:=`
    Sync,
    /// A closure evaluated once at bind time.
    Factory,
}

impl BindingKind {
    /// Operators in match priority: at any position the longest wins.
    const OPERATORS: [(&'static str, Self); 4] = [
        (":=", Self::Sync),
        ("<<", Self::Pull),
        (">>", Self::Push),
        ("=", Self::SetOnce),
    ];

    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::SetOnce | Self::Factory => "=",
            Self::Pull => "<<",
            Self::Push => ">>",
            Self::Sync => ":=",
        }
    }

    /// Whether bindings of this kind register listeners.
    #[must_use]
    pub const fn is_reactive(self) -> bool {
        matches!(self, Self::Pull | Self::Push | Self::Sync)
    }
}

/// Closure behind a [`BindingKind::Factory`] binding.
pub type FactoryFn = Rc<dyn Fn() -> Result<Value>>;

/// One `left OP right` rule.
#[derive(Clone)]
pub struct Binding {
    kind: BindingKind,
    left: String,
    right: String,
    factory: Option<FactoryFn>,
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn is_dotted_path(path: &str) -> bool {
    path.split('.').all(is_identifier)
}

/// Byte offset and kind of the first binding operator outside string
/// literals.
fn find_operator(source: &str) -> Option<(usize, BindingKind)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in source.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
            continue;
        }
        let rest = &source[i..];
        if let Some((_, kind)) = BindingKind::OPERATORS
            .iter()
            .find(|(op, _)| rest.starts_with(*op))
        {
            return Some((i, *kind));
        }
    }
    None
}

impl Binding {
    fn new(kind: BindingKind, left: &str, right: &str) -> Result<Self> {
        let source = format!("{left} {} {right}", kind.operator());
        let (left, right) = (left.trim(), right.trim());
        if !is_dotted_path(left) || right.is_empty() {
            return Err(Error::MalformedBinding(source));
        }
        let expression = Expression::parse(right)?;
        if matches!(kind, BindingKind::Push | BindingKind::Sync)
            && expression.as_reference().is_none()
        {
            return Err(Error::MalformedBinding(source));
        }
        Ok(Self {
            kind,
            left: left.to_owned(),
            right: right.to_owned(),
            factory: None,
        })
    }

    /// `left = right`
    pub fn set_once(left: &str, right: &str) -> Result<Self> {
        Self::new(BindingKind::SetOnce, left, right)
    }

    /// `left << right`
    pub fn pull(left: &str, right: &str) -> Result<Self> {
        Self::new(BindingKind::Pull, left, right)
    }

    /// `left >> right`
    pub fn push(left: &str, right: &str) -> Result<Self> {
        Self::new(BindingKind::Push, left, right)
    }

    /// `left := right`
    pub fn sync(left: &str, right: &str) -> Result<Self> {
        Self::new(BindingKind::Sync, left, right)
    }

    /// Assign the result of `factory` to `left` at bind time. `label`
    /// stands in for the right side when the binding is displayed.
    pub fn factory(
        left: &str,
        label: &str,
        factory: impl Fn() -> Result<Value> + 'static,
    ) -> Result<Self> {
        let left = left.trim();
        if !is_dotted_path(left) {
            return Err(Error::MalformedBinding(format!("{left} = {label}")));
        }
        Ok(Self {
            kind: BindingKind::Factory,
            left: left.to_owned(),
            right: label.to_owned(),
            factory: Some(Rc::new(factory)),
        })
    }

    #[must_use]
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    #[must_use]
    pub fn left(&self) -> &str {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &str {
        &self.right
    }

    /// The object and attribute path `left` designates.
    fn target(&self, root: &ObjectRef, ctx: &Context) -> (ObjectRef, String) {
        if let Some((head, tail)) = self.left.split_once('.')
            && let Some(object) = ctx.object(head)
            && object.is_proxy()
        {
            return (object, tail.to_owned());
        }
        (Rc::clone(root), self.left.clone())
    }

    /// Wire the binding up. `root` is the object undotted left sides are
    /// resolved against.
    pub fn bind(&self, root: &ObjectRef, ctx: &Context) -> Result<BindingHandle> {
        let (target, attr) = self.target(root, ctx);
        let mut handle = BindingHandle {
            description: self.to_string(),
            listeners: Vec::new(),
        };

        let result = match self.kind {
            BindingKind::SetOnce => Expression::parse(&self.right)
                .and_then(|expression| expression.eval(ctx))
                .and_then(|value| set_path(&target, &attr, value)),
            BindingKind::Factory => match &self.factory {
                Some(factory) => factory().and_then(|value| set_path(&target, &attr, value)),
                None => Err(Error::MalformedBinding(self.to_string())),
            },
            BindingKind::Pull => self.bind_pull(&target, &attr, ctx, &mut handle),
            BindingKind::Push => self.bind_push(&target, &attr, ctx, &mut handle),
            BindingKind::Sync => self
                .bind_pull(&target, &attr, ctx, &mut handle)
                .and_then(|()| self.bind_push(&target, &attr, ctx, &mut handle)),
        };

        match result {
            Ok(()) => {
                tracing::debug!(
                    op = self.kind.operator(),
                    left = %self.left,
                    right = %self.right,
                    listeners = handle.listeners.len(),
                    "bound"
                );
                Ok(handle)
            }
            Err(err) => {
                // Leave nothing half-registered behind.
                if let Err(cleanup) = handle.remove_listeners() {
                    tracing::warn!(
                        binding = %handle.description,
                        error = %cleanup,
                        "removing listeners after a failed bind"
                    );
                }
                Err(err)
            }
        }
    }

    fn bind_pull(
        &self,
        target: &ObjectRef,
        attr: &str,
        ctx: &Context,
        handle: &mut BindingHandle,
    ) -> Result<()> {
        let expression = Expression::parse(&self.right)?;

        if let Some(path) = expression.as_reference() {
            let (source, source_attr) = match context_path(ctx, &path) {
                Ok(found) => found,
                // A plain value has nothing to observe.
                Err(Error::Type(_)) => return Err(Error::NoReferences(self.right.clone())),
                Err(err) => return Err(err),
            };
            let weak = Rc::downgrade(target);
            let attr_owned = attr.to_owned();
            let pull = guarded(move |change: &Change| {
                let Some(target) = weak.upgrade() else {
                    return Ok(());
                };
                set_path(&target, &attr_owned, change.new.clone())
            });
            handle
                .listeners
                .push(observe_path(&source, &source_attr, pull)?);
            return seed(target, attr, get_path(&source, &source_attr));
        }

        let expression = Rc::new(expression);
        // Every reference shares one guarded handler.
        let pull = {
            let weak = Rc::downgrade(target);
            let attr_owned = attr.to_owned();
            let expression = Rc::clone(&expression);
            let ctx = ctx.clone();
            guarded(move |_: &Change| {
                let Some(target) = weak.upgrade() else {
                    return Ok(());
                };
                let value = expression.eval(&ctx)?;
                set_path(&target, &attr_owned, value)
            })
        };
        for reference in &expression.references() {
            let Some((head, tail)) = reference.split_once('.') else {
                continue;
            };
            let Some(source) = ctx.object(head) else {
                continue;
            };
            handle
                .listeners
                .push(observe_path(&source, tail, Rc::clone(&pull))?);
        }
        if handle.listeners.is_empty() {
            return Err(Error::NoReferences(self.right.clone()));
        }
        seed(target, attr, expression.eval(ctx))
    }

    fn bind_push(
        &self,
        target: &ObjectRef,
        attr: &str,
        ctx: &Context,
        handle: &mut BindingHandle,
    ) -> Result<()> {
        let (destination, destination_attr) = context_path(ctx, &self.right)?;
        let push = guarded(move |change: &Change| {
            set_path(&destination, &destination_attr, change.new.clone())
        });
        handle.listeners.push(observe_path(target, attr, push)?);
        Ok(())
    }
}

/// Split `path` into the context object its head names and the remaining
/// attribute path.
fn context_path(ctx: &Context, path: &str) -> Result<(ObjectRef, String)> {
    let (head, tail) = path
        .split_once('.')
        .ok_or_else(|| Error::MalformedBinding(path.to_owned()))?;
    match ctx.get(head) {
        Some(Value::Object(object)) => Ok((object, tail.to_owned())),
        Some(other) => Err(Error::type_error(format!(
            "{head:?} is {} rather than an object",
            other.type_name()
        ))),
        None => Err(Error::UndefinedName(head.to_owned())),
    }
}

/// Assign the initial pulled value; an event attribute has none to give.
fn seed(target: &ObjectRef, attr: &str, value: Result<Value>) -> Result<()> {
    match value {
        Ok(value) => set_path(target, attr, value),
        Err(Error::EventRead { name }) => {
            tracing::debug!(event = %name, target = %attr, "pulled attribute is an event; not seeded");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Marks a handler as running for the lifetime of the scope.
struct HandlerScope<'a>(&'a Cell<bool>);

impl<'a> HandlerScope<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for HandlerScope<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Wrap `f` as a listener that ignores calls made while it is running.
fn guarded(f: impl Fn(&Change) -> Result<()> + 'static) -> Listener {
    let in_handler = Cell::new(false);
    listener(move |change| match HandlerScope::enter(&in_handler) {
        Some(_scope) => f(change),
        None => {
            tracing::trace!(attr = %change.name, "re-entrant binding handler skipped");
            Ok(())
        }
    })
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("kind", &self.kind)
            .field("left", &self.left)
            .field("right", &self.right)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.kind.operator(), self.right)
    }
}

impl FromStr for Binding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (at, kind) = find_operator(s).ok_or_else(|| Error::MalformedBinding(s.to_owned()))?;
        let left = &s[..at];
        let right = &s[at + kind.operator().len()..];
        Self::new(kind, left, right).map_err(|err| match err {
            Error::MalformedBinding(_) => Error::MalformedBinding(s.to_owned()),
            other => other,
        })
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        let same_factory = match (&self.factory, &other.factory) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.kind == other.kind
            && self.left == other.left
            && self.right == other.right
            && same_factory
    }
}

impl Eq for Binding {}

impl Hash for Binding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.left.hash(state);
        self.right.hash(state);
    }
}

/// Listeners registered by one [`Binding::bind`] call.
#[must_use = "dropping the handle leaves the binding active with no way to unbind it"]
pub struct BindingHandle {
    description: String,
    listeners: Vec<PathListener>,
}

impl BindingHandle {
    /// Number of change listeners this binding holds.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remove every listener, most recently registered first.
    pub fn unbind(mut self) -> Result<()> {
        self.remove_listeners()?;
        tracing::debug!(binding = %self.description, "unbound");
        Ok(())
    }

    fn remove_listeners(&mut self) -> Result<()> {
        while let Some(path_listener) = self.listeners.pop() {
            path_listener.remove()?;
        }
        Ok(())
    }
}

impl fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingHandle")
            .field("binding", &self.description)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
