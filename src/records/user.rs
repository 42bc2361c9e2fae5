use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Record, Table};
use crate::types::{RecordId, UserRole, UserState};

/// an application account, usually a collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub state: UserState,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_enabled(&self) -> bool {
        self.state == UserState::Enabled
    }

    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name.trim(), last),
            _ => self.first_name.trim().to_string(),
        }
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}
