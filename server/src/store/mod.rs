//! Row store port and its adapters
//!
//! This module handles:
//! - The `RowStore` trait both handlers are given
//! - An in-memory store for development and tests
//! - An append-only JSON-lines file store

mod jsonl;
mod memory;

pub use jsonl::JsonlRowStore;
pub use memory::MemoryRowStore;

use async_trait::async_trait;
use labsense_shared::{codec::CodecError, SensorRow};
use thiserror::Error;

/// Errors raised by a row store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt row at byte {offset}: {source}")]
    Corrupt { offset: u64, source: CodecError },

    #[error("Row encode error: {0}")]
    Encode(#[from] CodecError),
}

/// Tabular storage: the only state shared between requests
///
/// Implementations serialize concurrent appends themselves.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Append one row, returning the row count afterwards
    async fn append_row(&self, row: SensorRow) -> Result<usize, StoreError>;

    /// The most recently appended row, if any
    async fn last_row(&self) -> Result<Option<SensorRow>, StoreError>;

    /// Number of stored rows
    async fn row_count(&self) -> Result<usize, StoreError>;

    /// Human-readable name for this backend
    fn name(&self) -> &'static str;
}
