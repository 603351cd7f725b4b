use crate::{error::panic_message, types::ElementId};
use std::any::Any;
use thiserror::Error as ThisError;

///
/// ChangeError
///
/// Structured failures raised while a change set is applied.
/// The outermost `Context` names the action that failed; nested contexts
/// name the partial scopes the failure travelled through.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ChangeError {
    #[error("selector '{scope}' matched nothing")]
    SelectorMissed { scope: String },

    #[error("element {id} not found in '{scope}'")]
    ElementMissing { scope: String, id: ElementId },

    #[error("change rejected: {message}")]
    Rejected { message: String },

    #[error("change panicked: {message}")]
    Panicked { message: String },

    #[error("change '{path}' failed: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<Self>,
    },
}

impl ChangeError {
    /// Construct a rejection raised from inside a fallible mutator.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Attach the path of the action that surfaced this failure.
    #[must_use]
    pub fn at(self, path: impl Into<String>) -> Self {
        Self::Context {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Return the path of the failing action, if available.
    #[must_use]
    pub const fn path(&self) -> Option<&str> {
        match self {
            Self::Context { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Return the innermost, non-context variant.
    #[must_use]
    pub fn leaf(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.leaf(),
            _ => self,
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked {
            message: panic_message(payload),
        }
    }
}

///
/// TESTS
///
