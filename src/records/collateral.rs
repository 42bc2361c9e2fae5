use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::store::{Record, Table};
use crate::types::RecordId;

/// business evaluation attached to a client
///
/// drafts built for a client form carry no client id; it is filled in when
/// the form is saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub client_id: Option<RecordId>,
    pub business_type: String,
    pub business_address: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    pub fn new(business_type: impl Into<String>, business_address: impl Into<String>) -> Self {
        Self {
            id: None,
            client_id: None,
            business_type: business_type.into(),
            business_address: business_address.into(),
            notes: None,
            created_at: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// copy bound to a saved client
    pub fn for_client(&self, client_id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            client_id: Some(client_id),
            created_at: Some(now),
            ..self.clone()
        }
    }
}

impl Record for Evaluation {
    const TABLE: Table = Table::Evaluations;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}

/// pledged item with its estimated price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub client_id: Option<RecordId>,
    pub description: String,
    pub estimated_price: Money,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Guarantee {
    pub fn new(description: impl Into<String>, estimated_price: Money) -> Self {
        Self {
            id: None,
            client_id: None,
            description: description.into(),
            estimated_price,
            created_at: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(LoanError::Validation {
                field: "guarantee_description",
                message: "must not be blank".to_string(),
            });
        }
        if self.estimated_price.is_negative() {
            return Err(LoanError::Validation {
                field: "estimated_price",
                message: format!("must not be negative, got {}", self.estimated_price),
            });
        }
        Ok(())
    }

    /// copy bound to a saved client
    pub fn for_client(&self, client_id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            client_id: Some(client_id),
            created_at: Some(now),
            ..self.clone()
        }
    }
}

impl Record for Guarantee {
    const TABLE: Table = Table::Guarantees;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}
