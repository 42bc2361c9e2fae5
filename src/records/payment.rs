use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::store::{Record, Table};
use crate::types::RecordId;

/// money collected against a loan; never edited after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub loan_id: RecordId,
    pub payment_date: NaiveDate,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(loan_id: RecordId, amount: Money, payment_date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            loan_id,
            payment_date,
            amount,
            created_at,
        }
    }
}

impl Record for Payment {
    const TABLE: Table = Table::Payments;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}
