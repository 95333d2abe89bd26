//! Chat command handling for the server
//!
//! This module handles:
//! - Resolving an incoming command against the latest stored row
//! - Rendering the reply in the format the chat gateway expects

mod dispatcher;
mod reply;

pub use dispatcher::{CommandDispatcher, DispatchError};
pub use reply::{ReplyFormat, REPLY_CONTENT_TYPE};
