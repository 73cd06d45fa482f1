//! Slack Web API client used by ticket provisioning flows.

use std::time::Duration;

use async_trait::async_trait;
use recohub_ticket_core::TicketBackendError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const CONVERSATIONS_LIST_PAGE_LIMIT: u32 = 200;
const MAX_CONVERSATIONS_LIST_PAGES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Slack conversation as returned by the `conversations.*` methods.
pub struct SlackChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackAuthIdentity {
    pub user_id: String,
    pub team: Option<String>,
}

#[async_trait]
/// Slack conversation capabilities the ticket backend depends on.
pub trait SlackConversationApi: Send + Sync {
    async fn auth_test(&self) -> Result<SlackAuthIdentity, TicketBackendError>;

    async fn list_channels(&self, exclude_archived: bool)
        -> Result<Vec<SlackChannel>, TicketBackendError>;

    async fn create_channel(&self, name: &str) -> Result<SlackChannel, TicketBackendError>;

    async fn invite_users(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<(), TicketBackendError>;

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<SlackPostedMessage, TicketBackendError>;

    async fn archive_channel(&self, channel_id: &str) -> Result<(), TicketBackendError>;

    async fn conversation_info(&self, channel_id: &str)
        -> Result<SlackChannel, TicketBackendError>;
}

#[derive(Debug, Deserialize)]
struct SlackAuthTestResponse {
    user_id: Option<String>,
    team: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct SlackConversationsListResponse {
    #[serde(default)]
    channels: Vec<SlackChannel>,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct SlackConversationResponse {
    channel: SlackChannel,
}

#[derive(Debug, Deserialize)]
struct SlackChatMessageResponse {
    ts: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackEmptyResponse {}

#[derive(Clone)]
/// `reqwest`-backed implementation of [`SlackConversationApi`].
///
/// Calls are made once; failures are returned to the caller unchanged.
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackApiClient {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        request_timeout_ms: u64,
    ) -> Result<Self, TicketBackendError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("recohub-ticket-service"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .map_err(|error| transport_error("client setup", &error))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    async fn post_json<T>(&self, method: &str, payload: &Value) -> Result<T, TicketBackendError>
    where
        T: DeserializeOwned,
    {
        let request = self
            .http
            .post(self.method_url(method))
            .bearer_auth(&self.bot_token)
            .json(payload);
        self.send(method, request).await
    }

    async fn get_query<T>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, TicketBackendError>
    where
        T: DeserializeOwned,
    {
        let request = self
            .http
            .get(self.method_url(method))
            .bearer_auth(&self.bot_token)
            .query(query);
        self.send(method, request).await
    }

    async fn send<T>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TicketBackendError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|error| transport_error(method, &error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TicketBackendError::Transport {
                operation: format!("slack api {method}"),
                message: format!(
                    "status {}: {}",
                    status.as_u16(),
                    truncate_for_error(&body, 320)
                ),
            });
        }
        let body: Value = response
            .json()
            .await
            .map_err(|error| transport_error(method, &error))?;
        decode_slack_response(method, body)
    }
}

#[async_trait]
impl SlackConversationApi for SlackApiClient {
    async fn auth_test(&self) -> Result<SlackAuthIdentity, TicketBackendError> {
        let response: SlackAuthTestResponse = self.post_json("auth.test", &json!({})).await?;
        let user_id = response
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| TicketBackendError::Api {
                method: "auth.test".to_string(),
                code: "missing_user_id".to_string(),
            })?;
        Ok(SlackAuthIdentity {
            user_id,
            team: response.team,
        })
    }

    async fn list_channels(
        &self,
        exclude_archived: bool,
    ) -> Result<Vec<SlackChannel>, TicketBackendError> {
        let mut channels = Vec::new();
        let mut cursor = String::new();
        for _ in 0..MAX_CONVERSATIONS_LIST_PAGES {
            let query = [
                ("exclude_archived", exclude_archived.to_string()),
                ("limit", CONVERSATIONS_LIST_PAGE_LIMIT.to_string()),
                ("cursor", cursor.clone()),
            ];
            let page: SlackConversationsListResponse =
                self.get_query("conversations.list", &query).await?;
            channels.extend(page.channels);
            cursor = page
                .response_metadata
                .map(|metadata| metadata.next_cursor)
                .unwrap_or_default();
            if cursor.trim().is_empty() {
                return Ok(channels);
            }
        }
        tracing::warn!(
            pages = MAX_CONVERSATIONS_LIST_PAGES,
            listed = channels.len(),
            "slack conversations.list page limit reached"
        );
        Err(TicketBackendError::Transport {
            operation: "slack api conversations.list".to_string(),
            message: format!(
                "pagination did not finish within {MAX_CONVERSATIONS_LIST_PAGES} pages"
            ),
        })
    }

    async fn create_channel(&self, name: &str) -> Result<SlackChannel, TicketBackendError> {
        let response: SlackConversationResponse = self
            .post_json("conversations.create", &json!({ "name": name }))
            .await?;
        Ok(response.channel)
    }

    async fn invite_users(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<(), TicketBackendError> {
        let _: SlackEmptyResponse = self
            .post_json(
                "conversations.invite",
                &json!({
                    "channel": channel_id,
                    "users": user_ids.join(","),
                }),
            )
            .await?;
        Ok(())
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<SlackPostedMessage, TicketBackendError> {
        let mut payload = json!({
            "channel": channel_id,
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }
        let response: SlackChatMessageResponse =
            self.post_json("chat.postMessage", &payload).await?;
        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel_id.to_string()),
            ts: response.ts.ok_or_else(|| TicketBackendError::Api {
                method: "chat.postMessage".to_string(),
                code: "missing_ts".to_string(),
            })?,
        })
    }

    async fn archive_channel(&self, channel_id: &str) -> Result<(), TicketBackendError> {
        let _: SlackEmptyResponse = self
            .post_json("conversations.archive", &json!({ "channel": channel_id }))
            .await?;
        Ok(())
    }

    async fn conversation_info(
        &self,
        channel_id: &str,
    ) -> Result<SlackChannel, TicketBackendError> {
        let response: SlackConversationResponse = self
            .get_query(
                "conversations.info",
                &[
                    ("channel", channel_id.to_string()),
                    ("include_locale", "false".to_string()),
                ],
            )
            .await?;
        Ok(response.channel)
    }
}

/// Splits Slack's `{"ok": bool, "error": code}` envelope from the payload.
fn decode_slack_response<T>(method: &str, body: Value) -> Result<T, TicketBackendError>
where
    T: DeserializeOwned,
{
    if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(TicketBackendError::Api {
            method: method.to_string(),
            code: code.to_string(),
        });
    }
    serde_json::from_value(body).map_err(|error| TicketBackendError::Transport {
        operation: format!("slack api {method}"),
        message: format!("failed to decode response: {error}"),
    })
}

fn transport_error(method: &str, error: &reqwest::Error) -> TicketBackendError {
    TicketBackendError::Transport {
        operation: format!("slack api {method}"),
        message: error.to_string(),
    }
}

fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
