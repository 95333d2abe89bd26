//! Ingestion handler - turns a telemetry body into one appended row

use crate::store::{RowStore, StoreError};
use chrono::{DateTime, Utc};
use labsense_shared::codec::{self, CodecError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while ingesting telemetry
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Parse error: {0}")]
    Parse(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Appends one row per accepted telemetry body
pub struct IngestHandler {
    store: Arc<dyn RowStore>,
    max_body_bytes: usize,
}

impl IngestHandler {
    pub fn new(store: Arc<dyn RowStore>, max_body_bytes: usize) -> Self {
        Self {
            store,
            max_body_bytes,
        }
    }

    /// Ingest a body stamped with the current time
    pub async fn ingest(&self, body: &[u8]) -> Result<usize, IngestError> {
        self.ingest_at(body, Utc::now()).await
    }

    /// Ingest a body stamped with `timestamp`, returning the new row count
    ///
    /// The body is fully parsed before the row is built, so a parse failure
    /// never reaches the store.
    pub async fn ingest_at(
        &self,
        body: &[u8],
        timestamp: DateTime<Utc>,
    ) -> Result<usize, IngestError> {
        let record = codec::decode_record_limited(body, self.max_body_bytes).map_err(|e| {
            warn!("Rejected telemetry body ({} bytes): {}", body.len(), e);
            e
        })?;

        let row = record.to_row(timestamp);
        let count = self.store.append_row(row).await?;

        info!("Appended telemetry row #{} to {} store", count, self.store.name());
        Ok(count)
    }
}
