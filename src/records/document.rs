use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Record, Table};
use crate::types::{DocumentType, RecordId};

/// who a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOwner {
    Client(RecordId),
    User(RecordId),
}

impl DocumentOwner {
    /// column holding the owner's id
    pub fn column(&self) -> &'static str {
        match self {
            DocumentOwner::Client(_) => "client_id",
            DocumentOwner::User(_) => "user_id",
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            DocumentOwner::Client(id) | DocumentOwner::User(id) => *id,
        }
    }
}

/// metadata of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub client_id: Option<RecordId>,
    #[serde(default)]
    pub user_id: Option<RecordId>,
    pub filename: String,
    pub bucket: String,
    pub storage_path: String,
    pub storage_url: String,
    pub size_bytes: u64,
    pub document_type: DocumentType,
    pub upload_date: DateTime<Utc>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: DocumentOwner,
        filename: impl Into<String>,
        bucket: impl Into<String>,
        storage_path: impl Into<String>,
        storage_url: impl Into<String>,
        size_bytes: u64,
        document_type: DocumentType,
        upload_date: DateTime<Utc>,
    ) -> Self {
        let (client_id, user_id) = match owner {
            DocumentOwner::Client(id) => (Some(id), None),
            DocumentOwner::User(id) => (None, Some(id)),
        };
        Self {
            id: None,
            client_id,
            user_id,
            filename: filename.into(),
            bucket: bucket.into(),
            storage_path: storage_path.into(),
            storage_url: storage_url.into(),
            size_bytes,
            document_type,
            upload_date,
        }
    }

    /// owner, if exactly one of the owner columns is set
    pub fn owner(&self) -> Option<DocumentOwner> {
        match (self.client_id, self.user_id) {
            (Some(id), None) => Some(DocumentOwner::Client(id)),
            (None, Some(id)) => Some(DocumentOwner::User(id)),
            _ => None,
        }
    }
}

impl Record for Document {
    const TABLE: Table = Table::Documents;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}
