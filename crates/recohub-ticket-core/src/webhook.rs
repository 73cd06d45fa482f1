use std::collections::BTreeMap;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Inbound webhook call as handed over by the host HTTP router.
///
/// Header names are stored lower-cased so lookups are case-insensitive. The
/// body is the complete raw payload; signature checks run over these bytes.
pub struct WebhookRequest {
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .insert(name.trim().to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name.trim().to_ascii_lowercase().as_str())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
/// Response a backend wants the host router to send back.
pub struct WebhookResponse {
    pub status: u16,
    pub body: WebhookResponseBody,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: WebhookResponseBody::Empty,
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: WebhookResponseBody::Json(body),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: WebhookResponseBody::Text(body.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
