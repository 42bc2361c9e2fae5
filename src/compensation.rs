use tracing::{info, warn};

use crate::context::AppContext;
use crate::events::Event;
use crate::store::Table;
use crate::types::RecordId;

/// creations completed so far in a multi-step save, undone newest first
#[derive(Debug, Default)]
pub struct Compensation {
    completed: Vec<(Table, RecordId)>,
    orphaned_blobs: Vec<String>,
}

/// outcome of a rollback; failures are reported, never raised
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// rows actually deleted
    pub undone: Vec<(Table, RecordId)>,
    /// rows already gone when the delete ran
    pub missing: Vec<(Table, RecordId)>,
    pub failed: Vec<(Table, RecordId, String)>,
    /// uploaded objects left in storage
    pub orphaned_blobs: Vec<String>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.orphaned_blobs.is_empty()
    }
}

impl Compensation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, table: Table, id: RecordId) {
        self.completed.push((table, id));
    }

    /// uploads are not deleted on rollback, only reported
    pub fn record_blob(&mut self, bucket: &str, path: &str) {
        self.orphaned_blobs.push(format!("{}/{}", bucket, path));
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.orphaned_blobs.is_empty()
    }

    /// delete every recorded creation in reverse order
    pub async fn rollback(self, ctx: &AppContext, reason: &str) -> RollbackReport {
        info!(steps = self.completed.len(), reason, "rolling back");
        let mut report = RollbackReport {
            orphaned_blobs: self.orphaned_blobs,
            ..RollbackReport::default()
        };

        for (table, id) in self.completed.into_iter().rev() {
            match ctx.repository().delete(table, id).await {
                Ok(true) => {
                    info!(%table, %id, "compensating delete done");
                    report.undone.push((table, id));
                }
                Ok(false) => {
                    warn!(%table, %id, "compensating delete found nothing");
                    report.missing.push((table, id));
                }
                Err(err) => {
                    warn!(%table, %id, error = %err, "compensating delete failed");
                    ctx.emit(Event::CompensationFailed {
                        table,
                        record_id: id,
                        error: err.to_string(),
                        timestamp: ctx.now(),
                    })
                    .await;
                    report.failed.push((table, id, err.to_string()));
                }
            }
        }

        for path in &report.orphaned_blobs {
            warn!(path = %path, "uploaded object left in storage after rollback");
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::fixture;
    use crate::store::{RecordStore, Row, StoreOp};

    #[tokio::test]
    async fn test_rollback_deletes_newest_first() {
        let f = fixture();
        let mut compensation = Compensation::new();
        let mut ids = Vec::new();
        for table in [Table::Clients, Table::Loans, Table::Guarantees] {
            let row = f.records.insert(table, Row::new()).await.unwrap();
            let id = row["id"].as_str().unwrap().parse().unwrap();
            compensation.record(table, id);
            ids.push((table, id));
        }

        let report = compensation.rollback(&f.ctx, "test").await;
        ids.reverse();
        assert_eq!(report.undone, ids);
        assert!(report.is_clean());
        assert_eq!(f.records.count(Table::Clients).await, 0);
        assert_eq!(f.records.count(Table::Guarantees).await, 0);
    }

    #[tokio::test]
    async fn test_failed_step_is_reported_and_rest_continues() {
        let f = fixture();
        let mut compensation = Compensation::new();
        let client = f.records.insert(Table::Clients, Row::new()).await.unwrap();
        let loan = f.records.insert(Table::Loans, Row::new()).await.unwrap();
        let client_id = client["id"].as_str().unwrap().parse().unwrap();
        let loan_id = loan["id"].as_str().unwrap().parse().unwrap();
        compensation.record(Table::Clients, client_id);
        compensation.record(Table::Loans, loan_id);
        compensation.record_blob("dni-pictures", "clients/x/dni_frontal_x.jpg");

        f.records.fail_next(StoreOp::Remove, Table::Loans).await;
        let report = compensation.rollback(&f.ctx, "test").await;

        assert_eq!(report.undone, vec![(Table::Clients, client_id)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.orphaned_blobs, vec!["dni-pictures/clients/x/dni_frontal_x.jpg".to_string()]);
        assert_eq!(f.records.count(Table::Loans).await, 1);

        let events = f.ctx.take_events().await;
        assert!(matches!(
            events.as_slice(),
            [Event::CompensationFailed { table: Table::Loans, .. }]
        ));
    }

    #[tokio::test]
    async fn test_already_deleted_row_is_not_counted_as_undone() {
        let f = fixture();
        let mut compensation = Compensation::new();
        let client = f.records.insert(Table::Clients, Row::new()).await.unwrap();
        let loan = f.records.insert(Table::Loans, Row::new()).await.unwrap();
        let client_id = client["id"].as_str().unwrap().parse().unwrap();
        let loan_id = loan["id"].as_str().unwrap().parse().unwrap();
        compensation.record(Table::Clients, client_id);
        compensation.record(Table::Loans, loan_id);

        assert!(f.records.remove(Table::Loans, loan_id).await.unwrap());
        let report = compensation.rollback(&f.ctx, "test").await;

        assert_eq!(report.undone, vec![(Table::Clients, client_id)]);
        assert_eq!(report.missing, vec![(Table::Loans, loan_id)]);
        assert!(report.is_clean());
    }
}
