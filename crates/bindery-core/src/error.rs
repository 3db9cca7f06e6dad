#![forbid(unsafe_code)]

//! Error type shared by every Bindery crate.
//!
//! Variants fall into four categories (see [`ErrorKind`]):
//!
//! | Kind | Examples | Handling |
//! |------|----------|----------|
//! | Configuration | malformed binding, ragged grid, no references | propagated |
//! | Precondition | target reassigned, unlocked key released, unavailable attribute | propagated |
//! | Toolkit | rejected property write, disconnect failure | some recovered locally |
//! | Evaluation | type errors, event read, unknown names | event read tolerated when seeding pulls |

use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for Bindery.
pub type Result<T> = StdResult<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Raised at parse or bind time for malformed declarations.
    Configuration,
    /// Programmer error: an API contract was violated.
    Precondition,
    /// The toolkit refused or failed an operation.
    Toolkit,
    /// Evaluating an expression or reading a value failed.
    Evaluation,
}

/// Unified error type.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An attribute was read before the widget was attached and nothing was buffered.
    #[error("{kind} {name:?} not available until the binder is given its widget")]
    Unavailable {
        /// What kind of member was read (`"property"`, `"getter"`, `"slot"`).
        kind: &'static str,
        /// Attribute name.
        name: String,
    },

    /// A binder's widget was assigned a second time.
    #[error("a binder is attached to one widget per lifetime ({class})")]
    TargetReassigned {
        /// Proxy class name.
        class: String,
    },

    /// A loopback guard key was released without being held.
    #[error("loopback guard key {key:?} released without being acquired")]
    NotLocked {
        /// Debug rendering of the key.
        key: String,
    },

    /// The object does not declare the attribute.
    #[error("{object} has no attribute {name:?}")]
    UnknownAttribute {
        /// Type name of the object.
        object: String,
        /// Attribute name.
        name: String,
    },

    /// The attribute exists but cannot be assigned.
    #[error("attribute {name:?} is read-only")]
    ReadOnly {
        /// Attribute name.
        name: String,
    },

    /// An event attribute has no stored value to read.
    #[error("attribute {name:?} is an event and has no value")]
    EventRead {
        /// Attribute name.
        name: String,
    },

    /// The toolkit has no class with this name.
    #[error("toolkit class {0:?} is unknown")]
    UnknownClass(String),

    /// No toolkit has been installed on this thread.
    #[error("no toolkit installed on this thread")]
    NoToolkit,

    /// The generic property write path rejected the value.
    #[error("toolkit rejected write to property {property:?}")]
    PropertyWriteRejected {
        /// Native property name.
        property: String,
    },

    /// Disconnecting a signal handler failed.
    #[error("failed to disconnect {signal}: {reason}")]
    Disconnect {
        /// Signal signature.
        signal: String,
        /// Backend message.
        reason: String,
    },

    /// Generic toolkit failure.
    #[error("toolkit error: {0}")]
    Toolkit(String),

    /// A slot or signal received the wrong number of arguments.
    #[error("{name} takes {expected} arguments, got {got}")]
    Arity {
        /// Slot or signal name.
        name: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },

    /// A value had the wrong type for an operation.
    #[error("type error: {0}")]
    Type(String),

    /// A name was not found in the evaluation context.
    #[error("name {0:?} is not defined")]
    UndefinedName(String),

    /// Expression text could not be parsed.
    #[error("parse error at offset {offset}: {message}")]
    Parse {
        /// Byte offset into the source text.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// A binding string did not have the `left op right` shape.
    #[error("malformed binding {0:?}")]
    MalformedBinding(String),

    /// A pull binding's expression references no context attributes.
    #[error("no attributes referenced in expression {0:?}")]
    NoReferences(String),

    /// Layout composite rows or items do not have a consistent shape.
    #[error("invalid layout: {0}")]
    Layout(String),
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedBinding(_) | Self::NoReferences(_) | Self::Layout(_) | Self::Parse { .. } => {
                ErrorKind::Configuration
            }
            Self::Unavailable { .. }
            | Self::TargetReassigned { .. }
            | Self::NotLocked { .. }
            | Self::UnknownAttribute { .. }
            | Self::ReadOnly { .. }
            | Self::NoToolkit => ErrorKind::Precondition,
            Self::UnknownClass(_)
            | Self::PropertyWriteRejected { .. }
            | Self::Disconnect { .. }
            | Self::Toolkit(_) => ErrorKind::Toolkit,
            Self::EventRead { .. } | Self::Arity { .. } | Self::Type(_) | Self::UndefinedName(_) => {
                ErrorKind::Evaluation
            }
        }
    }

    /// Build an [`Error::UnknownAttribute`].
    pub fn unknown_attribute(object: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            object: object.into(),
            name: name.into(),
        }
    }

    /// Build an [`Error::Type`].
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }
}
