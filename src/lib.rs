pub mod auth;
pub mod compensation;
pub mod config;
pub mod context;
pub mod decimal;
pub mod documents;
pub mod errors;
pub mod events;
pub mod origination;
pub mod payments;
pub mod portfolio;
pub mod records;
pub mod schedule;
pub mod state;
pub mod store;
pub mod types;

// re-export key types
pub use auth::{Authenticator, InMemorySessionStore, PasswordVerifier, Session, SessionData, SessionStore};
pub use compensation::{Compensation, RollbackReport};
pub use config::{EngineConfig, LendingDefaults, PaymentPolicy, StorageConfig};
pub use context::AppContext;
pub use decimal::{Money, Rate};
pub use documents::DocumentService;
pub use errors::{LoanError, Result, StoreError};
pub use events::{Event, EventStore};
pub use origination::{originate_reloan, save_detached, ClientForm, FormOrchestrator, SavedClientForm};
pub use payments::{collected_on, PaymentInput, PaymentReceipt, PaymentReconciler};
pub use portfolio::{collection_rows, loan_overview, CollectionRow, CollectionStatus, LoanOverview};
pub use records::{Client, Document, DocumentOwner, Evaluation, Guarantee, Loan, Payment, User};
pub use schedule::{
    LoanFormInput, LoanRequest, LoanSchedule, ScheduleCalculator, ScheduledInstallment, TermCatalog, TermOption,
    TermSelection,
};
pub use state::SaveState;
pub use store::{BlobStore, InMemoryBlobStore, InMemoryRecordStore, Record, RecordStore, Records, Table};
pub use types::{CollectionDay, DocumentType, Modality, OverpaymentPolicy, RecordId, UserRole, UserState};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
