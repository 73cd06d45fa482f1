use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{RecommendationQueryResult, Ticket, TicketBackendError, WebhookRequest, WebhookResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates the ticket backends the host can be configured with.
pub enum TicketBackendKind {
    Slack,
}

impl TicketBackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slack => "slack",
        }
    }
}

impl fmt::Display for TicketBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketBackendKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "slack" => Ok(Self::Slack),
            other => Err(format!("unsupported ticket backend '{other}'")),
        }
    }
}

#[async_trait]
/// Trait contract every ticket backend plugin implements.
///
/// Backends hold no ticket state of their own: the remote platform is the
/// source of truth and each call is self-contained.
pub trait TicketBackend: Send + Sync {
    fn kind(&self) -> TicketBackendKind;

    /// Verifies credentials against the platform. A failure here is fatal.
    async fn init(&self) -> Result<(), TicketBackendError>;

    /// Provisions the remote resource for `ticket` and returns its issue key.
    ///
    /// On [`TicketBackendError::PartialProvision`] the ticket may already carry
    /// an issue key: the resource exists but was not fully initialised.
    async fn create_ticket(
        &self,
        ticket: &mut Ticket,
        row: &RecommendationQueryResult,
    ) -> Result<String, TicketBackendError>;

    async fn update_ticket(
        &self,
        ticket: &Ticket,
        row: &RecommendationQueryResult,
    ) -> Result<(), TicketBackendError>;

    async fn close_ticket(&self, issue_key: &str) -> Result<(), TicketBackendError>;

    /// Best-effort existence check. Only `IssueKey` is populated.
    async fn get_ticket(&self, issue_key: &str) -> Result<Ticket, TicketBackendError>;

    async fn handle_webhook_action(
        &self,
        request: WebhookRequest,
    ) -> Result<WebhookResponse, TicketBackendError>;
}
