//! Idempotent name-to-channel resolution.

use std::sync::Arc;

use recohub_ticket_core::TicketBackendError;

use crate::slack_api_client::{SlackChannel, SlackConversationApi};

#[derive(Clone)]
/// Resolves a channel name to a live Slack channel, creating it if absent.
///
/// Every call re-lists the workspace; nothing is cached. The list-then-create
/// sequence is not atomic: callers must run at most one concurrent
/// [`ensure_channel`](Self::ensure_channel) per derived name, or accept that
/// the loser of a race gets Slack's `name_taken` error.
pub struct SlackChannelProvisioner {
    api: Arc<dyn SlackConversationApi>,
}

impl SlackChannelProvisioner {
    pub fn new(api: Arc<dyn SlackConversationApi>) -> Self {
        Self { api }
    }

    /// `name` must already satisfy Slack's naming rules (lower-case, no
    /// spaces, at most 80 characters); it is not validated here.
    pub async fn ensure_channel(&self, name: &str) -> Result<SlackChannel, TicketBackendError> {
        let channels = self.api.list_channels(true).await?;
        if let Some(existing) = channels.into_iter().find(|channel| channel.name == name) {
            tracing::info!(
                channel_id = %existing.id,
                channel_name = %existing.name,
                "slack channel already exists"
            );
            return Ok(existing);
        }

        let created = self.api.create_channel(name).await?;
        tracing::info!(
            channel_id = %created.id,
            channel_name = %created.name,
            "created slack channel"
        );
        Ok(created)
    }
}
