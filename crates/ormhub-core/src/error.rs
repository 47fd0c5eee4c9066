//! Error types for configuration normalization and merging

use std::fmt;
use thiserror::Error;

/// Kind of keyed entry held by the global collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Adapter,
    Connection,
    Model,
    Default,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Adapter => "adapter",
            EntryKind::Connection => "connection",
            EntryKind::Model => "model",
            EntryKind::Default => "default",
        };
        f.write_str(name)
    }
}

/// Errors raised while normalizing or merging a registration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectorError {
    #[error("Invalid registration options: {0}")]
    Validation(String),
    #[error("Could not resolve {kind} reference `{reference}`")]
    Resolution { kind: EntryKind, reference: String },
    #[error("Duplicate {kind} registered: `{key}`")]
    DuplicateRegistration { kind: EntryKind, key: String },
    #[error("teardownOnStop has already been set")]
    AlreadySet,
    #[error("Unknown scope: {0}")]
    UnknownScope(String),
}

/// Result type for collector operations
pub type CollectorResult<T> = Result<T, CollectorError>;

impl CollectorError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn duplicate(kind: EntryKind, key: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            kind,
            key: key.into(),
        }
    }
}
