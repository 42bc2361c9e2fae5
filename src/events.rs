use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::SaveState;
use crate::store::Table;
use crate::types::{DocumentType, Modality, RecordId};

/// all events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // loan events
    LoanOriginated {
        loan_id: RecordId,
        client_id: RecordId,
        capital: Money,
        total_debt: Money,
        modality: Modality,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentRecorded {
        payment_id: RecordId,
        loan_id: RecordId,
        amount: Money,
        paid_amount: Money,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRolledBack {
        payment_id: RecordId,
        loan_id: RecordId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // client form events
    ClientFormSaved {
        client_id: RecordId,
        loan_id: RecordId,
        guarantees: usize,
        documents: usize,
        timestamp: DateTime<Utc>,
    },
    FormRolledBack {
        reason: String,
        undone: Vec<(Table, RecordId)>,
        orphaned_blobs: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    CompensationFailed {
        table: Table,
        record_id: RecordId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    SaveStateChanged {
        from: SaveState,
        to: SaveState,
        timestamp: DateTime<Utc>,
    },

    // document events
    DocumentStored {
        document_id: RecordId,
        document_type: DocumentType,
        storage_path: String,
        size_bytes: u64,
        timestamp: DateTime<Utc>,
    },
    DocumentDeleted {
        document_id: RecordId,
        storage_path: String,
        timestamp: DateTime<Utc>,
    },

    // session events
    UserAuthenticated {
        user_id: RecordId,
        username: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
