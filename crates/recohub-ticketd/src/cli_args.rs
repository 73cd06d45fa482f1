use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use recohub_slack_tickets::{
    SlackTicketConfig, DEFAULT_SLACK_API_BASE, DEFAULT_SLACK_REQUEST_TIMEOUT_MS,
};
use recohub_ticket_core::TicketBackendKind;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliTicketBackend {
    Slack,
}

impl From<CliTicketBackend> for TicketBackendKind {
    fn from(value: CliTicketBackend) -> Self {
        match value {
            CliTicketBackend::Slack => TicketBackendKind::Slack,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "recohub-ticketd",
    about = "Ticket backend service for the recommendations hub",
    version
)]
pub struct TicketdCli {
    #[arg(
        long = "ticket-backend",
        env = "RECOHUB_TICKET_BACKEND",
        value_enum,
        default_value = "slack",
        help = "Ticket backend implementation selected at startup"
    )]
    pub ticket_backend: CliTicketBackend,

    #[arg(
        long,
        env = "RECOHUB_BIND",
        default_value = DEFAULT_BIND,
        help = "Socket address the webhook server listens on"
    )]
    pub bind: String,

    #[arg(
        long = "slack-api-token",
        env = "SLACK_API_TOKEN",
        hide_env_values = true,
        default_value = "",
        help = "Slack bot token; startup fails when empty"
    )]
    pub slack_api_token: String,

    #[arg(
        long = "slack-signing-secret",
        env = "SLACK_SIGNING_SECRET",
        hide_env_values = true,
        help = "Slack signing secret; without it every webhook call is rejected"
    )]
    pub slack_signing_secret: Option<String>,

    #[arg(
        long = "slack-channel-as-ticket",
        env = "SLACK_CHANNEL_AS_TICKET",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        help = "Create one channel per ticket; false posts tickets as threads in a per-contact channel"
    )]
    pub slack_channel_as_ticket: bool,

    #[arg(
        long = "slack-api-base",
        env = "SLACK_API_BASE",
        default_value = DEFAULT_SLACK_API_BASE,
        help = "Base URL for the Slack Web API"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "slack-request-timeout-ms",
        env = "SLACK_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_SLACK_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout for each Slack Web API request in milliseconds"
    )]
    pub slack_request_timeout_ms: u64,
}

impl TicketdCli {
    pub fn backend_kind(&self) -> TicketBackendKind {
        self.ticket_backend.into()
    }

    pub fn slack_ticket_config(&self) -> SlackTicketConfig {
        SlackTicketConfig {
            api_base: self.slack_api_base.clone(),
            api_token: self.slack_api_token.clone(),
            signing_secret: self.slack_signing_secret.clone(),
            channel_as_ticket: self.slack_channel_as_ticket,
            request_timeout_ms: self.slack_request_timeout_ms,
        }
    }
}
