use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for evaluation steps that can raise or abort.
pub(crate) type RunResult<T> = Result<T, RunError>;

/// Host error categories reported to the embedder.
///
/// These are unrecoverable from within the language: once one is produced the
/// run terminates. The rendered form matches the category names programs are
/// graded against (`NAME_ERROR`, `TYPE_ERROR`, `FAULT_ERROR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Undefined or redefined variable, unknown function or arity, missing `main`.
    NameError,
    /// Operator or assignment applied to incompatible types, void misuse,
    /// `raise` of a non-string.
    TypeError,
    /// Field access through nil, uncaught raise, exhausted input.
    FaultError,
}

/// A host error: an [`ErrorKind`] plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    pub kind: ErrorKind,
    pub message: String,
}

impl Exception {
    pub(crate) fn name_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NameError,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    pub(crate) fn fault_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::FaultError,
            message: message.into(),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Exception {}

/// Internal error channel threaded through every evaluation step.
///
/// Two tiers: `Raise` carries a language-level exception tag that `try`/`catch`
/// can intercept; `Host` carries an [`Exception`] that aborts the run. Both
/// propagate with `?`, which is what makes a raise surface from arbitrarily
/// deep forcing of a thunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunError {
    /// A raised exception tag, live until a matching `catch` handles it.
    Raise(String),
    /// An unrecoverable host error.
    Host(Exception),
}

impl From<Exception> for RunError {
    fn from(exception: Exception) -> Self {
        Self::Host(exception)
    }
}
