use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LoanError, Result};
use crate::store::{Record, Table};
use crate::types::RecordId;

/// a borrower registered by a collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// collector who registered the client
    pub user_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub identification_number: String,
    pub registration_timestamp: DateTime<Utc>,
}

impl Client {
    pub fn new(
        user_id: RecordId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_number: String::new(),
            address: String::new(),
            identification_number: String::new(),
            registration_timestamp: registered_at,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = phone.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_identification(mut self, number: impl Into<String>) -> Self {
        self.identification_number = number.into();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// names are the only mandatory personal fields
    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(LoanError::Validation {
                field: "first_name",
                message: "must not be blank".to_string(),
            });
        }
        if self.last_name.trim().is_empty() {
            return Err(LoanError::Validation {
                field: "last_name",
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

impl Record for Client {
    const TABLE: Table = Table::Clients;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}
