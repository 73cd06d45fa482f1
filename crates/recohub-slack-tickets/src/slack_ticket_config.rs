//! Resolved configuration for the Slack ticket backend.

use std::fmt;

use recohub_ticket_core::TicketBackendError;

use crate::slack_ticket_codec::TicketMode;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_SLACK_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone)]
/// Values read once at startup and held for the backend's lifetime.
pub struct SlackTicketConfig {
    pub api_base: String,
    pub api_token: String,
    pub signing_secret: Option<String>,
    pub channel_as_ticket: bool,
    pub request_timeout_ms: u64,
}

impl SlackTicketConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_SLACK_API_BASE.to_string(),
            api_token: api_token.into(),
            signing_secret: None,
            channel_as_ticket: true,
            request_timeout_ms: DEFAULT_SLACK_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn mode(&self) -> TicketMode {
        TicketMode::from_channel_as_ticket(self.channel_as_ticket)
    }

    /// Signing secret with surrounding whitespace removed; `None` when blank.
    pub fn signing_secret(&self) -> Option<&str> {
        self.signing_secret
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Rejects a missing API token. A missing signing secret only warns:
    /// webhook verification then fails closed.
    pub fn validate(&self) -> Result<(), TicketBackendError> {
        if self.api_token.trim().is_empty() {
            return Err(TicketBackendError::MissingApiToken { backend: "slack" });
        }
        if self.signing_secret().is_none() {
            tracing::warn!(
                "slack signing secret is not set; every webhook request will fail verification"
            );
        }
        Ok(())
    }
}

impl fmt::Debug for SlackTicketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackTicketConfig")
            .field("api_base", &self.api_base)
            .field("api_token", &"<redacted>")
            .field(
                "signing_secret",
                &self.signing_secret().map(|_| "<redacted>"),
            )
            .field("channel_as_ticket", &self.channel_as_ticket)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}
