//! Issue-key encoding, subject and channel-name derivation for Slack tickets.

use std::fmt;
use std::sync::OnceLock;

use recohub_ticket_core::{RecommendationQueryResult, TicketBackendError};
use regex::Regex;

/// Maximum length of a Slack channel name (`conversations.create`).
pub const SLACK_CHANNEL_NAME_MAX_CHARS: usize = 80;
const CHANNEL_TICKET_PREFIX: &str = "rec";
const THREAD_KEY_SEPARATOR: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How one ticket maps onto Slack.
pub enum TicketMode {
    /// One dedicated channel per ticket.
    Channel,
    /// One root message and its reply thread inside a per-contact channel.
    Thread,
}

impl TicketMode {
    pub fn from_channel_as_ticket(channel_as_ticket: bool) -> Self {
        if channel_as_ticket {
            Self::Channel
        } else {
            Self::Thread
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel_as_ticket",
            Self::Thread => "thread_as_ticket",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded issue key, tagged with the mode it was produced under.
pub enum SlackIssueKey {
    Channel {
        channel_id: String,
    },
    Thread {
        channel_id: String,
        message_ts: String,
    },
}

impl SlackIssueKey {
    pub fn channel(channel_id: impl Into<String>) -> Self {
        Self::Channel {
            channel_id: channel_id.into(),
        }
    }

    pub fn thread(channel_id: impl Into<String>, message_ts: impl Into<String>) -> Self {
        Self::Thread {
            channel_id: channel_id.into(),
            message_ts: message_ts.into(),
        }
    }

    pub fn mode(&self) -> TicketMode {
        match self {
            Self::Channel { .. } => TicketMode::Channel,
            Self::Thread { .. } => TicketMode::Thread,
        }
    }

    pub fn channel_id(&self) -> &str {
        match self {
            Self::Channel { channel_id } | Self::Thread { channel_id, .. } => channel_id,
        }
    }

    pub fn thread_ts(&self) -> Option<&str> {
        match self {
            Self::Channel { .. } => None,
            Self::Thread { message_ts, .. } => Some(message_ts),
        }
    }

    /// Opaque string form stored on the ticket.
    pub fn encode(&self) -> String {
        match self {
            Self::Channel { channel_id } => channel_id.clone(),
            Self::Thread {
                channel_id,
                message_ts,
            } => format!("{channel_id}{THREAD_KEY_SEPARATOR}{message_ts}"),
        }
    }

    /// Parses `raw` under `mode`. Thread keys split on the first `-`, so a
    /// channel id containing `-` cannot be represented in thread mode.
    pub fn decode(raw: &str, mode: TicketMode) -> Result<Self, TicketBackendError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid_key(raw, "issue key is empty"));
        }
        match mode {
            TicketMode::Channel => Ok(Self::channel(trimmed)),
            TicketMode::Thread => {
                let Some((channel_id, message_ts)) = trimmed.split_once(THREAD_KEY_SEPARATOR)
                else {
                    return Err(invalid_key(
                        raw,
                        "thread issue key must be '<channel-id>-<message-ts>'",
                    ));
                };
                if channel_id.is_empty() || message_ts.is_empty() {
                    return Err(invalid_key(
                        raw,
                        "thread issue key has an empty channel id or timestamp",
                    ));
                }
                Ok(Self::thread(channel_id, message_ts))
            }
        }
    }
}

impl fmt::Display for SlackIssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn invalid_key(raw: &str, reason: &str) -> TicketBackendError {
    TicketBackendError::InvalidIssueKey {
        key: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Last segment of a slash-delimited resource path.
pub fn leaf_resource_segment(target_resource: &str) -> &str {
    target_resource
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Keeps only ASCII letters, digits and spaces.
pub fn sanitize_resource_name(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == ' ')
        .collect()
}

pub fn ticket_subject(mode: TicketMode, row: &RecommendationQueryResult) -> String {
    let resource = sanitize_resource_name(leaf_resource_segment(&row.target_resource));
    match mode {
        TicketMode::Channel => format!("{}-{}", row.recommender_subtype, resource),
        TicketMode::Thread => format!(
            "{}-{}-{}",
            row.project_name, resource, row.recommender_subtype
        ),
    }
}

/// Slack channel name that hosts the ticket, already within platform limits.
pub fn channel_name_for_ticket(mode: TicketMode, target_contact: &str, subject: &str) -> String {
    let name = match mode {
        TicketMode::Channel => format!("{CHANNEL_TICKET_PREFIX}-{target_contact}-{subject}")
            .replace(' ', "")
            .to_lowercase(),
        TicketMode::Thread => thread_channel_pattern()
            .replace_all(&target_contact.to_lowercase(), "-")
            .into_owned(),
    };
    name.chars().take(SLACK_CHANNEL_NAME_MAX_CHARS).collect()
}

fn thread_channel_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[\s@#._/:\\*?"<>|]+"#).expect("thread channel name pattern is valid")
    })
}
