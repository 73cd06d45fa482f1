//! Routes verified Slack Events API callbacks.

use recohub_ticket_core::{TicketBackendError, WebhookRequest, WebhookResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::slack_signature::SlackSignatureVerifier;

const URL_VERIFICATION_EVENT_TYPE: &str = "url_verification";
const EVENT_CALLBACK_EVENT_TYPE: &str = "event_callback";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Outer Events API payload.
///
/// Only `type` and `challenge` are read strictly. The inner event is kept
/// opaque because its field shapes vary per event type (`channel` and `user`
/// are objects on `channel_created` and `team_join`).
pub struct SlackEventEnvelope {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub api_app_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub authed_users: Option<Vec<String>>,
    #[serde(default)]
    pub event: Option<Value>,
}

impl SlackEventEnvelope {
    /// String view of an inner event field. Object-valued fields resolve to
    /// their `id`.
    pub fn event_field(&self, key: &str) -> Option<&str> {
        let value = self.event.as_ref()?.get(key)?;
        value
            .as_str()
            .or_else(|| value.get("id").and_then(Value::as_str))
    }
}

#[derive(Debug, Clone)]
pub struct SlackWebhookDispatcher {
    verifier: SlackSignatureVerifier,
}

impl SlackWebhookDispatcher {
    pub fn new(verifier: SlackSignatureVerifier) -> Self {
        Self { verifier }
    }

    pub fn handle(&self, request: &WebhookRequest) -> Result<WebhookResponse, TicketBackendError> {
        self.handle_at(request, chrono::Utc::now().timestamp())
    }

    pub fn handle_at(
        &self,
        request: &WebhookRequest,
        now_unix: i64,
    ) -> Result<WebhookResponse, TicketBackendError> {
        if !self.verifier.verify_at(request, now_unix) {
            tracing::warn!("slack webhook rejected: signature verification failed");
            return Err(TicketBackendError::SignatureRejected);
        }

        let envelope: SlackEventEnvelope = serde_json::from_slice(request.body())
            .map_err(|error| TicketBackendError::MalformedPayload(error.to_string()))?;

        match envelope.event_type.as_str() {
            URL_VERIFICATION_EVENT_TYPE => {
                let challenge = envelope
                    .challenge
                    .filter(|challenge| !challenge.is_empty())
                    .ok_or_else(|| {
                        TicketBackendError::MalformedPayload(
                            "url_verification payload has no challenge".to_string(),
                        )
                    })?;
                tracing::info!("answering slack url verification challenge");
                Ok(WebhookResponse::json(200, json!({ "challenge": challenge })))
            }
            EVENT_CALLBACK_EVENT_TYPE => {
                tracing::info!(
                    team_id = envelope.team_id.as_deref().unwrap_or(""),
                    api_app_id = envelope.api_app_id.as_deref().unwrap_or(""),
                    event_type = envelope.event_field("type").unwrap_or(""),
                    channel = envelope.event_field("channel").unwrap_or(""),
                    user = envelope.event_field("user").unwrap_or(""),
                    ts = envelope.event_field("ts").unwrap_or(""),
                    authed_users = envelope.authed_users.as_ref().map_or(0, Vec::len),
                    "received slack event callback"
                );
                Ok(WebhookResponse::ok())
            }
            other => {
                tracing::warn!(event_type = other, "unexpected slack webhook event type");
                Ok(WebhookResponse::text(
                    500,
                    format!("Unexpected event type: {other}"),
                ))
            }
        }
    }
}
