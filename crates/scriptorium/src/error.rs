use derive_more::Display;
use scriptorium_core::{
    error::{EditError, ErrorClass, ErrorOrigin as CoreErrorOrigin},
    runtime::RuntimeError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// HTTP-style status for outer layers.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.kind.status()
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }
}

impl From<EditError> for Error {
    fn from(err: EditError) -> Self {
        let kind = match err.class() {
            ErrorClass::NotFound => ErrorKind::NotFound,
            ErrorClass::Conflict => ErrorKind::Conflict,
            ErrorClass::InvalidChange => ErrorKind::InvalidChange,
            ErrorClass::InvariantViolation => ErrorKind::InvariantViolation,
            ErrorClass::Internal => ErrorKind::Internal,
        };

        Self::new(kind, err.origin().into(), err.to_string())
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Runtime, err.to_string())
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[display("not_found")]
    NotFound,
    #[display("conflict")]
    Conflict,
    #[display("invalid_change")]
    InvalidChange,
    #[display("invariant_violation")]
    InvariantViolation,
    #[display("internal")]
    Internal,
    #[display("config")]
    Config,
}

impl ErrorKind {
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict | Self::InvariantViolation => 409,
            Self::InvalidChange => 422,
            Self::Internal | Self::Config => 500,
        }
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    Storage,
    Change,
    Command,
    Runtime,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Storage => Self::Storage,
            CoreErrorOrigin::Change => Self::Change,
            CoreErrorOrigin::Command => Self::Command,
        }
    }
}

///
/// TESTS
///
