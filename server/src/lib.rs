//! LABSense webhook server
//!
//! Two handlers share one row store:
//! - ingestion appends a timestamped row per telemetry body
//! - the command endpoint answers chat commands from the latest row

pub mod command;
pub mod config;
pub mod http;
pub mod ingest;
pub mod store;

pub use command::{CommandDispatcher, DispatchError, ReplyFormat};
pub use config::{ServerConfig, StoreBackend};
pub use http::{build_router, AppState};
pub use ingest::{IngestError, IngestHandler};
pub use store::{JsonlRowStore, MemoryRowStore, RowStore, StoreError};
