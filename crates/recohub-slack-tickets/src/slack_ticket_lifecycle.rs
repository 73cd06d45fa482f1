//! Slack implementation of the ticket backend plugin contract.

use std::sync::Arc;

use async_trait::async_trait;
use recohub_ticket_core::{
    RecommendationQueryResult, Ticket, TicketBackend, TicketBackendError, TicketBackendKind,
    WebhookRequest, WebhookResponse,
};
use serde::Serialize;

use crate::slack_api_client::{SlackApiClient, SlackConversationApi};
use crate::slack_channel_provisioner::SlackChannelProvisioner;
use crate::slack_signature::SlackSignatureVerifier;
use crate::slack_ticket_codec::{
    channel_name_for_ticket, ticket_subject, SlackIssueKey, TicketMode,
};
use crate::slack_ticket_config::SlackTicketConfig;
use crate::slack_webhook_dispatcher::SlackWebhookDispatcher;

const SLACK_ALREADY_IN_CHANNEL: &str = "already_in_channel";
const SLACK_ALREADY_ARCHIVED: &str = "already_archived";

/// Ticket backend that maps each ticket onto a Slack channel or thread.
///
/// Holds no ticket state; Slack is the source of truth.
pub struct SlackTicketBackend {
    api: Arc<dyn SlackConversationApi>,
    provisioner: SlackChannelProvisioner,
    dispatcher: SlackWebhookDispatcher,
    mode: TicketMode,
}

impl SlackTicketBackend {
    pub fn new(config: &SlackTicketConfig) -> Result<Self, TicketBackendError> {
        let client = SlackApiClient::new(
            &config.api_base,
            &config.api_token,
            config.request_timeout_ms,
        )?;
        Self::with_api(config, Arc::new(client))
    }

    /// Builds the backend over an already constructed conversation API.
    /// Configuration is validated here, once per construction path.
    pub fn with_api(
        config: &SlackTicketConfig,
        api: Arc<dyn SlackConversationApi>,
    ) -> Result<Self, TicketBackendError> {
        config.validate()?;
        Ok(Self {
            provisioner: SlackChannelProvisioner::new(api.clone()),
            dispatcher: SlackWebhookDispatcher::new(SlackSignatureVerifier::new(
                config.signing_secret(),
            )),
            mode: config.mode(),
            api,
        })
    }

    pub fn mode(&self) -> TicketMode {
        self.mode
    }

    async fn invite_assignees(
        &self,
        channel_id: &str,
        assignees: &[String],
    ) -> Result<(), TicketBackendError> {
        if assignees.is_empty() {
            return Ok(());
        }
        match self.api.invite_users(channel_id, assignees).await {
            Ok(()) => Ok(()),
            Err(error) if error.api_code() == Some(SLACK_ALREADY_IN_CHANNEL) => {
                tracing::info!(channel_id, "assignees already in slack channel");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl TicketBackend for SlackTicketBackend {
    fn kind(&self) -> TicketBackendKind {
        TicketBackendKind::Slack
    }

    async fn init(&self) -> Result<(), TicketBackendError> {
        let identity =
            self.api
                .auth_test()
                .await
                .map_err(|error| TicketBackendError::AuthFailed {
                    backend: "slack",
                    reason: error.to_string(),
                })?;
        tracing::info!(
            bot_user_id = %identity.user_id,
            team = identity.team.as_deref().unwrap_or(""),
            mode = self.mode.as_str(),
            "slack ticket backend initialised"
        );
        Ok(())
    }

    async fn create_ticket(
        &self,
        ticket: &mut Ticket,
        row: &RecommendationQueryResult,
    ) -> Result<String, TicketBackendError> {
        ticket.stamp_created(chrono::Utc::now());
        ticket.subject = ticket_subject(self.mode, row);
        ticket.recommender_id = row.recommender_name.clone();

        let channel_name = channel_name_for_ticket(self.mode, &ticket.target_contact, &ticket.subject);
        let channel = self.provisioner.ensure_channel(&channel_name).await?;
        if self.mode == TicketMode::Channel {
            ticket.issue_key = SlackIssueKey::channel(channel.id.as_str()).encode();
        }

        let assigned_key = |ticket: &Ticket| ticket.has_issue_key().then(|| ticket.issue_key.clone());

        self.invite_assignees(&channel.id, &ticket.assignee)
            .await
            .map_err(|error| TicketBackendError::partial(&channel.id, assigned_key(ticket), error))?;

        if self.mode == TicketMode::Thread {
            let root = self
                .api
                .post_message(&channel.id, &ticket.subject, None)
                .await
                .map_err(|error| TicketBackendError::partial(&channel.id, None, error))?;
            ticket.issue_key = SlackIssueKey::thread(root.channel, root.ts).encode();
        }

        self.update_ticket(ticket, row)
            .await
            .map_err(|error| TicketBackendError::partial(&channel.id, assigned_key(ticket), error))?;

        tracing::info!(
            issue_key = %ticket.issue_key,
            channel_id = %channel.id,
            subject = %ticket.subject,
            mode = self.mode.as_str(),
            "created slack ticket"
        );
        Ok(ticket.issue_key.clone())
    }

    async fn update_ticket(
        &self,
        ticket: &Ticket,
        row: &RecommendationQueryResult,
    ) -> Result<(), TicketBackendError> {
        let key = SlackIssueKey::decode(&ticket.issue_key, self.mode)?;
        let text = render_ticket_update(ticket, row)?;

        if let Some(thread_ts) = key.thread_ts() {
            self.api
                .post_message(key.channel_id(), &text, Some(thread_ts))
                .await?;
        }
        self.api.post_message(key.channel_id(), &text, None).await?;
        tracing::debug!(issue_key = %key, "posted slack ticket update");
        Ok(())
    }

    async fn close_ticket(&self, issue_key: &str) -> Result<(), TicketBackendError> {
        let key = SlackIssueKey::decode(issue_key, self.mode)?;
        match self.api.archive_channel(key.channel_id()).await {
            Ok(()) => {
                tracing::info!(
                    issue_key = %key,
                    mode = key.mode().as_str(),
                    "archived slack ticket channel"
                );
                Ok(())
            }
            Err(error) if error.api_code() == Some(SLACK_ALREADY_ARCHIVED) => {
                tracing::info!(issue_key = %key, "slack ticket channel already archived");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn get_ticket(&self, issue_key: &str) -> Result<Ticket, TicketBackendError> {
        let key = SlackIssueKey::decode(issue_key, self.mode)?;
        let channel = self.api.conversation_info(key.channel_id()).await?;
        tracing::debug!(
            issue_key = %key,
            mode = key.mode().as_str(),
            channel_name = %channel.name,
            is_archived = channel.is_archived,
            "resolved slack ticket"
        );
        Ok(Ticket::with_issue_key(key.encode()))
    }

    async fn handle_webhook_action(
        &self,
        request: WebhookRequest,
    ) -> Result<WebhookResponse, TicketBackendError> {
        self.dispatcher.handle(&request)
    }
}

/// Message body posted for every ticket update: a fenced JSON dump of the
/// ticket followed by the cost and description summary.
pub fn render_ticket_update(
    ticket: &Ticket,
    row: &RecommendationQueryResult,
) -> Result<String, TicketBackendError> {
    let mut dump = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut dump, formatter);
    ticket.serialize(&mut serializer)?;
    let dump = String::from_utf8_lossy(&dump);
    Ok(format!(
        "```{dump}```\n Cost Savings:{} in {} \n Description: {}",
        row.impact_cost_unit, row.impact_currency_code, row.description
    ))
}
