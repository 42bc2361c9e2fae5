use std::time::Duration;

use thiserror::Error;

use crate::decimal::Money;
use crate::store::Table;
use crate::types::RecordId;

/// failure reported by a record or blob backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("malformed row: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("invalid term: {label:?}")]
    InvalidTerm {
        label: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("payment exceeds remaining balance: remaining {remaining}, provided {provided}")]
    Overpayment {
        remaining: Money,
        provided: Money,
    },

    #[error("{table} record not found: {id}")]
    NotFound {
        table: Table,
        id: RecordId,
    },

    #[error("inconsistent state: {message}")]
    InconsistentState {
        message: String,
    },

    #[error("{operation} on {table} failed: {source}")]
    Store {
        operation: &'static str,
        table: Table,
        #[source]
        source: StoreError,
    },

    #[error("{operation} of {bucket}/{path} failed: {source}")]
    Blob {
        operation: &'static str,
        bucket: String,
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: String,
        after: Duration,
    },

    #[error("session storage failed: {source}")]
    Session {
        #[source]
        source: StoreError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },
}

impl LoanError {
    /// network or backend failure that a retry may fix
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LoanError::Store { .. } | LoanError::Blob { .. } | LoanError::Timeout { .. }
        )
    }

    /// client-side rejection raised before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LoanError::Validation { .. }
                | LoanError::InvalidTerm { .. }
                | LoanError::InvalidPaymentAmount { .. }
                | LoanError::Overpayment { .. }
        )
    }

    /// message for the collector's screen
    pub fn user_message(&self) -> String {
        if self.is_transient() {
            format!("the operation could not be completed: {}. you may retry", self)
        } else {
            format!("the operation could not be completed: {}", self)
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
