use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BlobStore, RecordStore, Row, Table};
use crate::errors::StoreError;
use crate::types::RecordId;

/// record store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Insert,
    Fetch,
    FetchBy,
    Patch,
    Remove,
}

/// process-local record store with one-shot failure injection
pub struct InMemoryRecordStore {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    failures: Mutex<Vec<(StoreOp, Table)>>,
    calls: AtomicU64,
    latency: Duration,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            failures: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
            latency: Duration::ZERO,
        }
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// every call sleeps for `latency` first
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// make the next `op` on `table` fail with `Unavailable`
    pub async fn fail_next(&self, op: StoreOp, table: Table) {
        self.failures.lock().await.push((op, table));
    }

    /// snapshot of a table in insertion order
    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.tables.lock().await.get(&table).cloned().unwrap_or_default()
    }

    pub async fn count(&self, table: Table) -> usize {
        self.tables.lock().await.get(&table).map_or(0, Vec::len)
    }

    /// total calls served, failed ones included
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn enter(&self, op: StoreOp, table: Table) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut failures = self.failures.lock().await;
        if let Some(pos) = failures.iter().position(|f| *f == (op, table)) {
            failures.remove(pos);
            return Err(StoreError::Unavailable(format!("injected {:?} failure on {}", op, table)));
        }
        Ok(())
    }
}

fn row_id(row: &Row) -> Option<RecordId> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        self.enter(StoreOp::Insert, table).await?;
        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table).or_default();

        match row_id(&row) {
            Some(id) if rows.iter().any(|r| row_id(r) == Some(id)) => {
                return Err(StoreError::Rejected(format!("duplicate id {} in {}", id, table)));
            }
            Some(_) => {}
            None => {
                row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn fetch(&self, table: Table, id: RecordId) -> Result<Option<Row>, StoreError> {
        self.enter(StoreOp::Fetch, table).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| row_id(r) == Some(id)))
            .cloned())
    }

    async fn fetch_by(&self, table: Table, column: &str, value: &Value) -> Result<Vec<Row>, StoreError> {
        self.enter(StoreOp::FetchBy, table).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.get(column) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn patch(&self, table: Table, id: RecordId, fields: Row) -> Result<Row, StoreError> {
        self.enter(StoreOp::Patch, table).await?;
        if fields.contains_key("id") {
            return Err(StoreError::Rejected("id is immutable".to_string()));
        }
        let mut tables = self.tables.lock().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| StoreError::Rejected(format!("no row {} in {}", id, table)))?;
        row.extend(fields);
        Ok(row.clone())
    }

    async fn remove(&self, table: Table, id: RecordId) -> Result<bool, StoreError> {
        self.enter(StoreOp::Remove, table).await?;
        let mut tables = self.tables.lock().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        Ok(rows.len() < before)
    }
}

/// process-local blob store
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
    fail_next_upload: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// make the next upload fail with `Unavailable`
    pub fn fail_next_upload(&self) {
        self.fail_next_upload.store(true, Ordering::SeqCst);
    }

    pub async fn contains(&self, bucket: &str, path: &str) -> bool {
        self.blobs
            .lock()
            .await
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        if self.fail_next_upload.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected upload failure for {}/{}", bucket, path)));
        }
        self.blobs
            .lock()
            .await
            .insert((bucket.to_string(), path.to_string()), bytes);
        Ok(format!("memory://{}/{}", bucket, path))
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .await
            .remove(&(bucket.to_string(), path.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::Rejected(format!("no object at {}/{}", bucket, path)))
    }
}
