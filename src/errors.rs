use thiserror::Error;
use uuid::Uuid;

use crate::types::{InstallmentKey, InstallmentState};

/// broad error category, used by callers to decide between skipping and surfacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InvalidState,
    StorageFailure,
}

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid input: {field}: {reason}")]
    InvalidInput {
        field: String,
        reason: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: Uuid,
    },

    #[error("installment not found: {key}")]
    InstallmentNotFound {
        key: InstallmentKey,
    },

    #[error("worker not found: {code}")]
    WorkerNotFound {
        code: String,
    },

    #[error("invalid state for {key}: currently {state:?}, {reason}")]
    InvalidState {
        key: InstallmentKey,
        state: InstallmentState,
        reason: String,
    },

    #[error("storage failure: {message}")]
    StorageFailure {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoanError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        LoanError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::InvalidInput { .. } | LoanError::Serialization(_) => ErrorKind::InvalidInput,
            LoanError::LoanNotFound { .. }
            | LoanError::InstallmentNotFound { .. }
            | LoanError::WorkerNotFound { .. } => ErrorKind::NotFound,
            LoanError::InvalidState { .. } => ErrorKind::InvalidState,
            LoanError::StorageFailure { .. } => ErrorKind::StorageFailure,
        }
    }

    /// conflicts the end user can be told about without aborting anything else
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidState | ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
