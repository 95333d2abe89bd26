//! HTTP surface: routing, extraction and error mapping

use crate::command::{CommandDispatcher, DispatchError, ReplyFormat, REPLY_CONTENT_TYPE};
use crate::config::ServerConfig;
use crate::ingest::{IngestError, IngestHandler};
use crate::store::RowStore;
use axum::extract::{DefaultBodyLimit, Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use labsense_shared::codec::CodecError;
use labsense_shared::ResolveError;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

/// Shared handles given to every request
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestHandler>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub reply_format: ReplyFormat,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wire both handlers to the same store
    pub fn new(store: Arc<dyn RowStore>, config: &ServerConfig) -> Self {
        Self {
            ingest: Arc::new(IngestHandler::new(store.clone(), config.max_body_bytes)),
            dispatcher: Arc::new(CommandDispatcher::new(store, config.resolver_options())),
            reply_format: config.reply_format,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(command_query_handler).post(ingest_handler))
        .route("/command", post(command_form_handler))
        .route("/healthz", get(healthz_handler))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

/// Parameters sent by the chat gateway
#[derive(Debug, Default, Deserialize)]
pub struct CommandParams {
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Request failures and the status each maps to
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Ingest(IngestError::Parse(e @ CodecError::BodyTooLarge(..))) => {
                (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response()
            }
            ApiError::Ingest(IngestError::Parse(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            ApiError::Ingest(IngestError::Store(e)) => {
                error!("Failed to append telemetry row: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Dispatch(DispatchError::Resolve(ResolveError::EmptyStore)) => {
                warn!("Command received before any telemetry was stored");
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            }
            ApiError::Dispatch(DispatchError::Store(e)) => {
                error!("Failed to read latest row: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn ingest_handler(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    state.ingest.ingest(&body).await?;
    Ok(StatusCode::OK)
}

async fn command_query_handler(
    State(state): State<AppState>,
    Query(params): Query<CommandParams>,
) -> Result<Response, ApiError> {
    reply(&state, &params.body).await
}

async fn command_form_handler(
    State(state): State<AppState>,
    Form(params): Form<CommandParams>,
) -> Result<Response, ApiError> {
    reply(&state, &params.body).await
}

async fn reply(state: &AppState, command: &str) -> Result<Response, ApiError> {
    let resolution = state.dispatcher.dispatch(command).await?;
    let body = state.reply_format.render(resolution.text());
    Ok(([(header::CONTENT_TYPE, REPLY_CONTENT_TYPE)], body).into_response())
}

async fn healthz_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    fn status_of(error: impl Into<ApiError>) -> StatusCode {
        error.into().into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(IngestError::Parse(CodecError::BodyTooLarge(100, 10))),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(IngestError::Parse(CodecError::NotAnObject("array"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(IngestError::Store(StoreError::Io(std::io::ErrorKind::Other.into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DispatchError::Resolve(ResolveError::EmptyStore)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(DispatchError::Store(StoreError::Io(std::io::ErrorKind::Other.into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_message_is_the_source_message() {
        let error: ApiError = DispatchError::Resolve(ResolveError::EmptyStore).into();
        assert_eq!(error.to_string(), "No readings stored yet");

        let error: ApiError = IngestError::Parse(CodecError::BodyTooLarge(100, 10)).into();
        assert_eq!(error.to_string(), "Parse error: Body too large: 100 bytes (max: 10)");
    }
}
