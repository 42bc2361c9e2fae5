pub mod reloan;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::compensation::Compensation;
use crate::context::AppContext;
use crate::documents::{dni_path, DocumentService};
use crate::errors::{LoanError, Result};
use crate::events::Event;
use crate::records::{Client, Document, DocumentOwner, Evaluation, Guarantee, Loan};
use crate::schedule::LoanRequest;
use crate::state::SaveState;
use crate::store::{Record, Table};
use crate::types::{DocumentType, RecordId};

pub use reloan::originate_reloan;

/// everything captured by the new-client form
#[derive(Debug, Clone)]
pub struct ClientForm {
    pub client: Client,
    pub loan: LoanRequest,
    pub evaluation: Option<Evaluation>,
    pub guarantees: Vec<Guarantee>,
    /// jpeg bytes
    pub dni_front: Option<Vec<u8>>,
    pub dni_back: Option<Vec<u8>>,
}

impl ClientForm {
    pub fn new(client: Client, loan: LoanRequest) -> Self {
        Self {
            client,
            loan,
            evaluation: None,
            guarantees: Vec::new(),
            dni_front: None,
            dni_back: None,
        }
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluation = Some(evaluation);
        self
    }

    pub fn with_guarantee(mut self, guarantee: Guarantee) -> Self {
        self.guarantees.push(guarantee);
        self
    }

    pub fn with_dni(mut self, front: Option<Vec<u8>>, back: Option<Vec<u8>>) -> Self {
        self.dni_front = front;
        self.dni_back = back;
        self
    }

    /// checks that need no I/O
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        self.loan.validate()?;
        for guarantee in &self.guarantees {
            guarantee.validate()?;
        }
        Ok(())
    }
}

/// records created by a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SavedClientForm {
    pub client: Client,
    pub loan: Loan,
    pub evaluation: Option<Evaluation>,
    pub guarantees: Vec<Guarantee>,
    pub documents: Vec<Document>,
}

/// saves a client form as one unit, undoing completed steps on failure
#[derive(Debug, Default)]
pub struct FormOrchestrator {
    state: Arc<Mutex<SaveState>>,
}

impl FormOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self) -> SaveState {
        self.state.lock().await.clone()
    }

    /// back to idle after success or error; required before another save
    pub async fn reset(&self, ctx: &AppContext) -> Result<()> {
        let mut state = self.state.lock().await;
        let next = state.reset()?;
        Self::transition(ctx, &mut state, next).await;
        Ok(())
    }

    /// create client, loan, evaluation, guarantees and dni documents in order
    ///
    /// validation errors are returned before any write and leave the state
    /// idle. a failure after the client exists deletes every created record,
    /// newest first, and returns the original error.
    ///
    /// the save runs on its own task: dropping this future stops waiting for
    /// it, while the steps, the final state and any rollback still complete
    pub async fn save_full_client_form(&self, ctx: &Arc<AppContext>, form: ClientForm) -> Result<SavedClientForm> {
        let task = tokio::spawn(Self::save_owned(self.state.clone(), ctx.clone(), form));
        task.await.map_err(|err| LoanError::InconsistentState {
            message: format!("client form save task ended abnormally: {}", err),
        })?
    }

    async fn save_owned(
        state: Arc<Mutex<SaveState>>,
        ctx: Arc<AppContext>,
        form: ClientForm,
    ) -> Result<SavedClientForm> {
        let ctx = ctx.as_ref();
        {
            let mut state = state.lock().await;
            // busy check first, then validation
            let next = state.begin()?;
            form.validate()?;
            Self::transition(ctx, &mut state, next).await;
        }

        let mut compensation = Compensation::new();
        let result = Self::run_steps(ctx, form, &mut compensation).await;

        let outcome = match &result {
            Ok(saved) => {
                info!(client_id = ?saved.client.id, loan_id = ?saved.loan.id, "client form saved");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "client form save failed");
                if !compensation.is_empty() {
                    let report = compensation.rollback(ctx, &err.to_string()).await;
                    ctx.emit(Event::FormRolledBack {
                        reason: err.to_string(),
                        undone: report.undone.clone(),
                        orphaned_blobs: report.orphaned_blobs.clone(),
                        timestamp: ctx.now(),
                    })
                    .await;
                    if !report.failed.is_empty() {
                        error!(failed = report.failed.len(), "rollback incomplete, records left behind");
                    }
                }
                Err(err.user_message())
            }
        };

        let mut state = state.lock().await;
        let next = state.finish(outcome)?;
        Self::transition(ctx, &mut state, next).await;
        result
    }

    async fn run_steps(
        ctx: &AppContext,
        form: ClientForm,
        compensation: &mut Compensation,
    ) -> Result<SavedClientForm> {
        let repo = ctx.repository();
        let now = ctx.now();

        let client = repo.create(&form.client).await?;
        let client_id = saved_id(&client)?;
        compensation.record(Table::Clients, client_id);

        let loan = repo.create(&Loan::originate(client_id, &form.loan, now)?).await?;
        let loan_id = saved_id(&loan)?;
        compensation.record(Table::Loans, loan_id);

        let evaluation = match &form.evaluation {
            Some(draft) => {
                let evaluation = repo.create(&draft.for_client(client_id, now)).await?;
                compensation.record(Table::Evaluations, saved_id(&evaluation)?);
                Some(evaluation)
            }
            None => None,
        };

        let mut guarantees = Vec::with_capacity(form.guarantees.len());
        for draft in &form.guarantees {
            let guarantee = repo.create(&draft.for_client(client_id, now)).await?;
            compensation.record(Table::Guarantees, saved_id(&guarantee)?);
            guarantees.push(guarantee);
        }

        let documents = Self::upload_dni(ctx, client_id, form.dni_front, form.dni_back, compensation).await?;

        ctx.emit(Event::LoanOriginated {
            loan_id,
            client_id,
            capital: loan.capital,
            total_debt: loan.total_debt,
            modality: loan.modality,
            due_date: loan.due_date,
            timestamp: now,
        })
        .await;
        ctx.emit(Event::ClientFormSaved {
            client_id,
            loan_id,
            guarantees: guarantees.len(),
            documents: documents.len(),
            timestamp: ctx.now(),
        })
        .await;

        Ok(SavedClientForm {
            client,
            loan,
            evaluation,
            guarantees,
            documents,
        })
    }

    async fn upload_dni(
        ctx: &AppContext,
        client_id: RecordId,
        front: Option<Vec<u8>>,
        back: Option<Vec<u8>>,
        compensation: &mut Compensation,
    ) -> Result<Vec<Document>> {
        let service = DocumentService::new(ctx);
        let bucket = ctx.config().storage.dni_bucket.as_str();
        let mut documents = Vec::new();

        for (document_type, bytes) in [(DocumentType::DniFront, front), (DocumentType::DniBack, back)] {
            let (Some(bytes), Some((filename, path))) = (bytes, dni_path(client_id, document_type)) else {
                continue;
            };
            let size_bytes = bytes.len() as u64;
            let url = service.upload(bucket, &path, bytes).await?;
            // the object stays if a later step fails
            compensation.record_blob(bucket, &path);
            let document = service
                .record(
                    bucket,
                    &path,
                    &filename,
                    &url,
                    size_bytes,
                    document_type,
                    DocumentOwner::Client(client_id),
                )
                .await?;
            documents.push(document);
        }

        Ok(documents)
    }

    async fn transition(ctx: &AppContext, state: &mut SaveState, next: SaveState) {
        if *state == next {
            return;
        }
        ctx.emit(Event::SaveStateChanged {
            from: state.clone(),
            to: next.clone(),
            timestamp: ctx.now(),
        })
        .await;
        *state = next;
    }
}

/// start the save and hand back its task without waiting
pub fn save_detached(
    orchestrator: Arc<FormOrchestrator>,
    ctx: Arc<AppContext>,
    form: ClientForm,
) -> JoinHandle<Result<SavedClientForm>> {
    tokio::spawn(FormOrchestrator::save_owned(orchestrator.state.clone(), ctx, form))
}

fn saved_id<T: Record>(record: &T) -> Result<RecordId> {
    record.id().ok_or_else(|| LoanError::InconsistentState {
        message: format!("created {} record has no id", T::TABLE),
    })
}
