pub mod memory;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{LoanError, Result, StoreError};
use crate::types::RecordId;

pub use memory::{InMemoryBlobStore, InMemoryRecordStore, StoreOp};

/// a persisted row as the backend sees it
pub type Row = Map<String, Value>;

/// tables of the hosted backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Clients,
    Loans,
    Payments,
    Evaluations,
    Guarantees,
    Documents,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Clients => "clients",
            Table::Loans => "loans",
            Table::Payments => "payments",
            Table::Evaluations => "evaluations",
            Table::Guarantees => "guarantees",
            Table::Documents => "documents",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// remote record store; rows are json objects keyed by "id"
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// insert a row, assigning "id" when absent; returns the stored row
    async fn insert(&self, table: Table, row: Row) -> std::result::Result<Row, StoreError>;

    async fn fetch(&self, table: Table, id: RecordId) -> std::result::Result<Option<Row>, StoreError>;

    /// rows whose `column` equals `value`, in insertion order
    async fn fetch_by(
        &self,
        table: Table,
        column: &str,
        value: &Value,
    ) -> std::result::Result<Vec<Row>, StoreError>;

    /// merge `fields` into an existing row; returns the updated row
    async fn patch(&self, table: Table, id: RecordId, fields: Row) -> std::result::Result<Row, StoreError>;

    /// returns whether a row was removed
    async fn remove(&self, table: Table, id: RecordId) -> std::result::Result<bool, StoreError>;
}

/// remote file storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// store bytes and return the public url
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> std::result::Result<String, StoreError>;

    async fn remove(&self, bucket: &str, path: &str) -> std::result::Result<(), StoreError>;
}

/// a typed record stored in one table
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    const TABLE: Table;

    fn id(&self) -> Option<RecordId>;
}

/// typed access to a record store, every call bounded by a timeout
pub struct Records<'a> {
    store: &'a dyn RecordStore,
    timeout: Duration,
}

impl<'a> Records<'a> {
    pub fn new(store: &'a dyn RecordStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// insert a new record; the returned copy carries the store-assigned id
    pub async fn create<T: Record>(&self, record: &T) -> Result<T> {
        let row = to_row(record)?;
        let stored = self
            .bounded(format!("insert into {}", T::TABLE), self.store.insert(T::TABLE, row))
            .await?
            .map_err(|source| store_error("insert", T::TABLE, source))?;
        let created: T = from_row(stored)?;
        if created.id().is_none() {
            return Err(LoanError::Store {
                operation: "insert",
                table: T::TABLE,
                source: StoreError::Malformed("stored row has no id".to_string()),
            });
        }
        debug!(table = %T::TABLE, id = ?created.id(), "record created");
        Ok(created)
    }

    /// fetch by id; absence is not an error
    pub async fn get<T: Record>(&self, id: RecordId) -> Result<Option<T>> {
        let row = self
            .bounded(format!("fetch from {}", T::TABLE), self.store.fetch(T::TABLE, id))
            .await?
            .map_err(|source| store_error("fetch", T::TABLE, source))?;
        row.map(from_row).transpose()
    }

    /// fetch by id; absence is `NotFound`
    pub async fn require<T: Record>(&self, id: RecordId) -> Result<T> {
        self.get(id).await?.ok_or(LoanError::NotFound { table: T::TABLE, id })
    }

    /// records whose `column` equals `value`
    pub async fn list_by<T: Record>(&self, column: &str, value: impl Serialize) -> Result<Vec<T>> {
        let value = serde_json::to_value(value)?;
        let rows = self
            .bounded(
                format!("query {} by {}", T::TABLE, column),
                self.store.fetch_by(T::TABLE, column, &value),
            )
            .await?
            .map_err(|source| store_error("query", T::TABLE, source))?;
        rows.into_iter().map(from_row).collect()
    }

    /// update only the given fields
    pub async fn update_fields<T: Record>(&self, id: RecordId, fields: Row) -> Result<T> {
        let row = self
            .bounded(format!("update {}", T::TABLE), self.store.patch(T::TABLE, id, fields))
            .await?
            .map_err(|source| store_error("update", T::TABLE, source))?;
        from_row(row)
    }

    pub async fn delete(&self, table: Table, id: RecordId) -> Result<bool> {
        self.bounded(format!("delete from {}", table), self.store.remove(table, id))
            .await?
            .map_err(|source| store_error("delete", table, source))
    }

    async fn bounded<F, T>(&self, operation: String, call: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LoanError::Timeout {
                operation,
                after: self.timeout,
            })
    }
}

/// blob store access bounded by a timeout
pub struct Blobs<'a> {
    store: &'a dyn BlobStore,
    timeout: Duration,
}

impl<'a> Blobs<'a> {
    pub fn new(store: &'a dyn BlobStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String> {
        tokio::time::timeout(self.timeout, self.store.upload(bucket, path, bytes))
            .await
            .map_err(|_| LoanError::Timeout {
                operation: format!("upload {}/{}", bucket, path),
                after: self.timeout,
            })?
            .map_err(|source| LoanError::Blob {
                operation: "upload",
                bucket: bucket.to_string(),
                path: path.to_string(),
                source,
            })
    }

    pub async fn remove(&self, bucket: &str, path: &str) -> Result<()> {
        tokio::time::timeout(self.timeout, self.store.remove(bucket, path))
            .await
            .map_err(|_| LoanError::Timeout {
                operation: format!("remove {}/{}", bucket, path),
                after: self.timeout,
            })?
            .map_err(|source| LoanError::Blob {
                operation: "remove",
                bucket: bucket.to_string(),
                path: path.to_string(),
                source,
            })
    }
}

/// build a partial-update row from field/value pairs
pub fn fields<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

fn to_row<T: Serialize>(record: &T) -> Result<Row> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(LoanError::InconsistentState {
            message: format!("record serialized to a non-object value: {}", other),
        }),
    }
}

fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn store_error(operation: &'static str, table: Table, source: StoreError) -> LoanError {
    LoanError::Store {
        operation,
        table,
        source,
    }
}
