//! Command dispatcher - resolves chat commands against the latest row

use crate::store::{RowStore, StoreError};
use labsense_shared::resolver::{self, Resolution};
use labsense_shared::{CommandTable, ResolveError, ResolverOptions};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while answering a command
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Answers chat commands from the most recent reading
pub struct CommandDispatcher {
    store: Arc<dyn RowStore>,
    table: CommandTable,
    options: ResolverOptions,
}

impl CommandDispatcher {
    /// Create a dispatcher with the LABSense vocabulary
    pub fn new(store: Arc<dyn RowStore>, options: ResolverOptions) -> Self {
        Self::with_table(store, CommandTable::labsense(), options)
    }

    /// Create a dispatcher over a custom command table
    pub fn with_table(
        store: Arc<dyn RowStore>,
        table: CommandTable,
        options: ResolverOptions,
    ) -> Self {
        Self {
            store,
            table,
            options,
        }
    }

    /// Resolve `command` and return the reply text with its branch
    pub async fn dispatch(&self, command: &str) -> Result<Resolution, DispatchError> {
        debug!("Dispatching command: {:?}", resolver::normalize(command));

        let last_row = self.store.last_row().await?;
        let resolution = resolver::resolve(&self.table, last_row.as_ref(), command, &self.options)?;

        if let Resolution::Help(_) = resolution {
            info!("Unknown command {:?}, replying with help", command.trim());
        }

        Ok(resolution)
    }
}
