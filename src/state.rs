use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LoanError, Result};

/// progress of a client form save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveState {
    Idle,
    Saving,
    Success,
    /// failure message shown to the collector
    Error(String),
}

impl SaveState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SaveState::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SaveState::Success | SaveState::Error(_))
    }

    /// Idle -> Saving
    pub fn begin(&self) -> Result<SaveState> {
        match self {
            SaveState::Idle => Ok(SaveState::Saving),
            other => Err(LoanError::InvalidState {
                current: other.to_string(),
                expected: "idle".to_string(),
            }),
        }
    }

    /// Saving -> Success | Error
    pub fn finish(&self, outcome: std::result::Result<(), String>) -> Result<SaveState> {
        match self {
            SaveState::Saving => Ok(match outcome {
                Ok(()) => SaveState::Success,
                Err(message) => SaveState::Error(message),
            }),
            other => Err(LoanError::InvalidState {
                current: other.to_string(),
                expected: "saving".to_string(),
            }),
        }
    }

    /// Success | Error -> Idle; idle stays idle
    pub fn reset(&self) -> Result<SaveState> {
        match self {
            SaveState::Idle | SaveState::Success | SaveState::Error(_) => Ok(SaveState::Idle),
            SaveState::Saving => Err(LoanError::InvalidState {
                current: self.to_string(),
                expected: "success or error".to_string(),
            }),
        }
    }
}

impl Default for SaveState {
    fn default() -> Self {
        SaveState::Idle
    }
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveState::Idle => f.write_str("idle"),
            SaveState::Saving => f.write_str("saving"),
            SaveState::Success => f.write_str("success"),
            SaveState::Error(message) => write!(f, "error: {}", message),
        }
    }
}
