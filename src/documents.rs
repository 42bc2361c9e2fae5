use tracing::{info, warn};

use crate::context::AppContext;
use crate::errors::{LoanError, Result};
use crate::events::Event;
use crate::records::{Document, DocumentOwner};
use crate::store::Table;
use crate::types::{DocumentType, RecordId};

/// object path of a client's DNI image
pub fn dni_path(client_id: RecordId, document_type: DocumentType) -> Option<(String, String)> {
    let side = match document_type {
        DocumentType::DniFront => "frontal",
        DocumentType::DniBack => "reverso",
        DocumentType::Profile => return None,
    };
    let filename = format!("dni_{}_{}.jpg", side, client_id);
    let path = format!("clients/{}/{}", client_id, filename);
    Some((filename, path))
}

/// uploads files and keeps their metadata records
pub struct DocumentService<'a> {
    ctx: &'a AppContext,
}

impl<'a> DocumentService<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// upload the bytes, then record the document
    pub async fn store(
        &self,
        bucket: &str,
        path: &str,
        filename: &str,
        bytes: Vec<u8>,
        document_type: DocumentType,
        owner: DocumentOwner,
    ) -> Result<Document> {
        let size_bytes = bytes.len() as u64;
        let url = self.upload(bucket, path, bytes).await?;
        self.record(bucket, path, filename, &url, size_bytes, document_type, owner)
            .await
            .inspect_err(|err| {
                warn!(bucket, path, error = %err, "document record failed, uploaded object left in storage");
            })
    }

    /// upload only; returns the public url
    pub async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let url = self.ctx.blobs().upload(bucket, path, bytes).await?;
        info!(bucket, path, size, "object uploaded");
        Ok(url)
    }

    /// create the metadata record of an uploaded object
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        bucket: &str,
        path: &str,
        filename: &str,
        url: &str,
        size_bytes: u64,
        document_type: DocumentType,
        owner: DocumentOwner,
    ) -> Result<Document> {
        let document = Document::new(
            owner,
            filename,
            bucket,
            path,
            url,
            size_bytes,
            document_type,
            self.ctx.now(),
        );
        let document = self.ctx.repository().create(&document).await?;
        let document_id = document.id.ok_or_else(|| LoanError::InconsistentState {
            message: "created document has no id".to_string(),
        })?;

        self.ctx
            .emit(Event::DocumentStored {
                document_id,
                document_type,
                storage_path: path.to_string(),
                size_bytes,
                timestamp: self.ctx.now(),
            })
            .await;
        Ok(document)
    }

    /// remove the object, then the record
    pub async fn delete(&self, document: &Document) -> Result<()> {
        let document_id = document.id.ok_or_else(|| LoanError::InconsistentState {
            message: "cannot delete a document that was never saved".to_string(),
        })?;

        self.ctx
            .blobs()
            .remove(&document.bucket, &document.storage_path)
            .await?;
        self.ctx.repository().delete(Table::Documents, document_id).await?;
        info!(%document_id, path = %document.storage_path, "document deleted");

        self.ctx
            .emit(Event::DocumentDeleted {
                document_id,
                storage_path: document.storage_path.clone(),
                timestamp: self.ctx.now(),
            })
            .await;
        Ok(())
    }

    /// most recently uploaded document of a type
    pub async fn latest(&self, owner: DocumentOwner, document_type: DocumentType) -> Result<Option<Document>> {
        let documents = self
            .ctx
            .repository()
            .list_by::<Document>(owner.column(), owner.id())
            .await?;

        Ok(documents
            .into_iter()
            .filter(|d| d.document_type == document_type)
            .max_by_key(|d| d.upload_date))
    }

    /// upload a new profile photo, then drop the previous one
    ///
    /// failing to delete the old photo is logged and does not fail the call
    pub async fn replace_profile_photo(&self, user_id: RecordId, bytes: Vec<u8>) -> Result<Document> {
        let owner = DocumentOwner::User(user_id);
        let previous = self.latest(owner, DocumentType::Profile).await?;

        let bucket = self.ctx.config().storage.profile_bucket.clone();
        let filename = format!("profile_pic_{}_{}.jpg", user_id, self.ctx.now().timestamp_millis());
        let path = format!("profiles/{}/{}", user_id, filename);
        let document = self
            .store(&bucket, &path, &filename, bytes, DocumentType::Profile, owner)
            .await?;

        if let Some(old) = previous {
            if let Err(err) = self.delete(&old).await {
                warn!(%user_id, path = %old.storage_path, error = %err, "previous profile photo not removed");
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::fixture;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_dni_paths() {
        let id = Uuid::new_v4();
        let (name, path) = dni_path(id, DocumentType::DniFront).unwrap();
        assert_eq!(name, format!("dni_frontal_{}.jpg", id));
        assert_eq!(path, format!("clients/{}/dni_frontal_{}.jpg", id, id));

        let (_, back) = dni_path(id, DocumentType::DniBack).unwrap();
        assert!(back.ends_with(&format!("dni_reverso_{}.jpg", id)));
        assert!(dni_path(id, DocumentType::Profile).is_none());
    }

    #[tokio::test]
    async fn test_store_and_delete() {
        let f = fixture();
        let service = DocumentService::new(&f.ctx);
        let client = Uuid::new_v4();

        let doc = service
            .store(
                "dni-pictures",
                "clients/c/front.jpg",
                "front.jpg",
                vec![0xff, 0xd8, 0xff],
                DocumentType::DniFront,
                DocumentOwner::Client(client),
            )
            .await
            .unwrap();
        assert_eq!(doc.size_bytes, 3);
        assert_eq!(doc.storage_url, "memory://dni-pictures/clients/c/front.jpg");
        assert!(f.blobs.contains("dni-pictures", "clients/c/front.jpg").await);

        service.delete(&doc).await.unwrap();
        assert!(!f.blobs.contains("dni-pictures", "clients/c/front.jpg").await);
        assert_eq!(f.records.count(Table::Documents).await, 0);
    }

    #[tokio::test]
    async fn test_failed_upload_writes_no_record() {
        let f = fixture();
        f.blobs.fail_next_upload();

        let result = DocumentService::new(&f.ctx)
            .store("b", "p.jpg", "p.jpg", vec![1], DocumentType::DniBack, DocumentOwner::Client(Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(LoanError::Blob { operation: "upload", .. })));
        assert_eq!(f.records.count(Table::Documents).await, 0);
    }

    #[tokio::test]
    async fn test_replace_profile_photo() {
        let f = fixture();
        let service = DocumentService::new(&f.ctx);
        let user = Uuid::new_v4();

        let first = service.replace_profile_photo(user, vec![1]).await.unwrap();
        assert_eq!(first.bucket, "profile-pictures");
        assert!(first.storage_path.starts_with(&format!("profiles/{}/", user)));

        f.ctx.time().test_control().unwrap().advance(Duration::seconds(5));
        let second = service.replace_profile_photo(user, vec![2, 2]).await.unwrap();

        let latest = service.latest(DocumentOwner::User(user), DocumentType::Profile).await.unwrap();
        assert_eq!(latest.map(|d| d.id), Some(second.id));
        assert_eq!(f.records.count(Table::Documents).await, 1);
        assert!(!f.blobs.contains(&first.bucket, &first.storage_path).await);
        assert!(f.blobs.contains(&second.bucket, &second.storage_path).await);
    }
}
