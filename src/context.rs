use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::store::{BlobStore, Blobs, RecordStore, Records};

/// collaborators shared by every operation, built once at startup
pub struct AppContext {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    config: EngineConfig,
    time: SafeTimeProvider,
    events: Mutex<EventStore>,
}

impl AppContext {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        config: EngineConfig,
        time: SafeTimeProvider,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            records,
            blobs,
            config,
            time,
            events: Mutex::new(EventStore::new()),
        })
    }

    /// typed record access bounded by the configured timeout
    pub fn repository(&self) -> Records<'_> {
        Records::new(self.records.as_ref(), self.config.storage.request_timeout())
    }

    pub fn blobs(&self) -> Blobs<'_> {
        Blobs::new(self.blobs.as_ref(), self.config.storage.request_timeout())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    /// calendar date of `now`, in utc
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub async fn emit(&self, event: Event) {
        self.events.lock().await.emit(event);
    }

    pub async fn take_events(&self) -> Vec<Event> {
        self.events.lock().await.take_events()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.events().to_vec()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::{InMemoryBlobStore, InMemoryRecordStore};
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;

    /// context over in-memory stores, pinned to wednesday 2025-01-15 10:00 utc
    pub(crate) struct Fixture {
        pub ctx: Arc<AppContext>,
        pub records: Arc<InMemoryRecordStore>,
        pub blobs: Arc<InMemoryBlobStore>,
    }

    pub(crate) fn fixture() -> Fixture {
        fixture_with(EngineConfig::default(), InMemoryRecordStore::new())
    }

    pub(crate) fn fixture_with(config: EngineConfig, store: InMemoryRecordStore) -> Fixture {
        let records = Arc::new(store);
        let blobs = Arc::new(InMemoryBlobStore::new());
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
        ));
        let ctx = Arc::new(AppContext::new(records.clone(), blobs.clone(), config, time).unwrap());
        Fixture { ctx, records, blobs }
    }
}
