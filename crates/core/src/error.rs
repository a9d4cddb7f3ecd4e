use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::types::CustomerId;

/// A required field was missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("customer name must not be empty")]
    EmptyName,
    #[error("visit date must not be empty")]
    EmptyDate,
    #[error("visit date must be a calendar date in YYYY-MM-DD form (got {0})")]
    InvalidDate(String),
    #[error("visit count is already at its maximum ({0})")]
    VisitCountOverflow(u32),
}

/// Errors produced by [`crate::ledger::VisitLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors produced by [`crate::directory::Directory`].
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("customer not found: {0}")]
    NotFound(CustomerId),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl From<LedgerError> for DirectoryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(inner) => Self::Validation(inner),
        }
    }
}

/// Which export was requested when there was nothing to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    History,
    Directory,
}

impl ExportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::History => "visit history",
            Self::Directory => "customer directory",
        }
    }
}

/// Errors produced by [`crate::export::CsvExporter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("nothing to export: {} is empty", .0.as_str())]
    EmptyData(ExportKind),
}

/// Failure reported by the persistence collaborator, carried through untouched.
pub struct BackendError(Box<dyn StdError + Send + Sync>);

impl BackendError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self(err.into())
    }

    /// Returns the wrapped error for callers that want to downcast it.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}
