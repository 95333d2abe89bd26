//! In-memory row store

use super::{RowStore, StoreError};
use async_trait::async_trait;
use labsense_shared::SensorRow;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every row in a vector for the process lifetime
#[derive(Clone, Default)]
pub struct MemoryRowStore {
    rows: Arc<RwLock<Vec<SensorRow>>>,
}

impl MemoryRowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows, oldest first
    pub async fn rows(&self) -> Vec<SensorRow> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn append_row(&self, row: SensorRow) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().await;
        rows.push(row);
        Ok(rows.len())
    }

    async fn last_row(&self) -> Result<Option<SensorRow>, StoreError> {
        Ok(self.rows.read().await.last().cloned())
    }

    async fn row_count(&self) -> Result<usize, StoreError> {
        Ok(self.rows.read().await.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
