//! Slack ticket backend for the recommendations hub.
//!
//! Realises a ticket either as a dedicated Slack channel (channel-as-ticket)
//! or as a root message and its reply thread inside a shared channel
//! (thread-as-ticket), and authenticates inbound Events API callbacks.

mod slack_api_client;
mod slack_channel_provisioner;
mod slack_signature;
mod slack_ticket_codec;
mod slack_ticket_config;
mod slack_ticket_lifecycle;
mod slack_webhook_dispatcher;

pub use slack_api_client::{
    SlackApiClient, SlackAuthIdentity, SlackChannel, SlackConversationApi, SlackPostedMessage,
};
pub use slack_channel_provisioner::SlackChannelProvisioner;
pub use slack_signature::{
    canonical_form_encoding, compute_slack_signature, SlackSignatureVerifier,
    SLACK_REPLAY_WINDOW_SECONDS, SLACK_REQUEST_TIMESTAMP_HEADER, SLACK_SIGNATURE_HEADER,
};
pub use slack_ticket_codec::{
    channel_name_for_ticket, leaf_resource_segment, sanitize_resource_name, ticket_subject,
    SlackIssueKey, TicketMode, SLACK_CHANNEL_NAME_MAX_CHARS,
};
pub use slack_ticket_config::{
    SlackTicketConfig, DEFAULT_SLACK_API_BASE, DEFAULT_SLACK_REQUEST_TIMEOUT_MS,
};
pub use slack_ticket_lifecycle::{render_ticket_update, SlackTicketBackend};
pub use slack_webhook_dispatcher::{SlackEventEnvelope, SlackWebhookDispatcher};
