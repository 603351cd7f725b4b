use crate::{change::ChangeError, types::EntryId};
use std::{any::Any, fmt};
use thiserror::Error as ThisError;

///
/// EditError
///
/// Everything an `execute()` call can fail with. Callers see exactly one of
/// these per call; listener failures never surface here.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EditError {
    #[error("entry not found: {entry_id}")]
    NotFound { entry_id: EntryId },

    #[error("edit of {entry_id} was already executed")]
    AlreadyExecuted { entry_id: EntryId },

    #[error("changes to {entry_id} could not be applied: {source}")]
    Apply {
        entry_id: EntryId,
        #[source]
        source: ChangeError,
    },

    #[error("write conflict on {entry_id}: {message}")]
    Conflict { entry_id: EntryId, message: String },

    #[error("storage failure on {entry_id}: {message}")]
    Io { entry_id: EntryId, message: String },
}

impl EditError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::AlreadyExecuted { .. } => ErrorClass::InvariantViolation,
            Self::Apply { .. } => ErrorClass::InvalidChange,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::Io { .. } => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::NotFound { .. } | Self::Conflict { .. } | Self::Io { .. } => {
                ErrorOrigin::Storage
            }
            Self::AlreadyExecuted { .. } => ErrorOrigin::Command,
            Self::Apply { .. } => ErrorOrigin::Change,
        }
    }

    #[must_use]
    pub const fn entry_id(&self) -> &EntryId {
        match self {
            Self::NotFound { entry_id }
            | Self::AlreadyExecuted { entry_id }
            | Self::Apply { entry_id, .. }
            | Self::Conflict { entry_id, .. }
            | Self::Io { entry_id, .. } => entry_id,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {self}", self.origin(), self.class())
    }
}

///
/// ErrorClass
/// Stable classification for mapping failures onto outer protocols
/// (404 for `not_found`, 409 for `conflict`, ...).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    InvalidChange,
    InvariantViolation,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidChange => "invalid_change",
            Self::InvariantViolation => "invariant_violation",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Storage,
    Change,
    Command,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Storage => "storage",
            Self::Change => "change",
            Self::Command => "command",
        };
        write!(f, "{label}")
    }
}

/// Render a caught panic payload for logs and error values.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_separate_not_found_from_io() {
        let id = EntryId::from("w1");
        let missing = EditError::NotFound {
            entry_id: id.clone(),
        };
        let io = EditError::Io {
            entry_id: id,
            message: "socket closed".to_string(),
        };

        assert!(missing.is_not_found());
        assert!(!io.is_not_found());
        assert_eq!(missing.class(), ErrorClass::NotFound);
        assert_eq!(io.class(), ErrorClass::Internal);
        assert_eq!(
            io.display_with_class(),
            "storage:internal: storage failure on w1: socket closed"
        );
    }
}
