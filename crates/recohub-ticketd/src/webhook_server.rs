//! HTTP surface that hands Slack webhook calls to the configured backend.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use recohub_ticket_core::{
    TicketBackend, TicketBackendError, WebhookRequest, WebhookResponse, WebhookResponseBody,
};
use serde_json::json;

pub const SLACK_WEBHOOK_ENDPOINT: &str = "/webhooks/slack";
pub const HEALTHZ_ENDPOINT: &str = "/healthz";

#[derive(Clone)]
struct WebhookServerState {
    backend: Arc<dyn TicketBackend>,
}

pub fn build_webhook_router(backend: Arc<dyn TicketBackend>) -> Router {
    Router::new()
        .route(SLACK_WEBHOOK_ENDPOINT, post(handle_slack_webhook))
        .route(HEALTHZ_ENDPOINT, get(handle_healthz))
        .with_state(WebhookServerState { backend })
}

async fn handle_slack_webhook(
    State(state): State<WebhookServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = WebhookRequest::new(body.to_vec());
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            request.insert_header(name.as_str(), value);
        }
    }

    match state.backend.handle_webhook_action(request).await {
        Ok(response) => {
            if !response.is_success() {
                tracing::warn!(status = response.status, "webhook answered with non-success status");
            }
            webhook_response(response)
        }
        Err(error) => backend_error_response(&error),
    }
}

async fn handle_healthz(State(state): State<WebhookServerState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "backend": state.backend.kind().as_str(),
        })),
    )
        .into_response()
}

fn webhook_response(response: WebhookResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        WebhookResponseBody::Empty => status.into_response(),
        WebhookResponseBody::Json(value) => (status, Json(value)).into_response(),
        WebhookResponseBody::Text(text) => (status, text).into_response(),
    }
}

fn backend_error_response(error: &TicketBackendError) -> Response {
    let status = match error {
        TicketBackendError::SignatureRejected => StatusCode::UNAUTHORIZED,
        TicketBackendError::MalformedPayload(_) | TicketBackendError::InvalidIssueKey { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(code = error.code(), %error, "webhook handling failed");
    } else {
        tracing::warn!(code = error.code(), %error, "webhook request rejected");
    }
    (
        status,
        Json(json!({
            "error": {
                "code": error.code(),
                "message": error.to_string(),
            }
        })),
    )
        .into_response()
}
