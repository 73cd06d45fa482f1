use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates failures surfaced through the ticket backend plugin contract.
pub enum TicketBackendError {
    /// The platform API token is absent; the backend must not start.
    #[error("missing API token for the {backend} ticket backend")]
    MissingApiToken { backend: &'static str },
    /// The platform rejected the configured credentials at init.
    #[error("authentication with {backend} failed: {reason}")]
    AuthFailed {
        backend: &'static str,
        reason: String,
    },
    /// The platform answered but reported a failure code for `method`.
    #[error("{method} failed: {code}")]
    Api { method: String, code: String },
    #[error("{operation} request failed: {message}")]
    Transport { operation: String, message: String },
    #[error("invalid issue key '{key}': {reason}")]
    InvalidIssueKey { key: String, reason: String },
    /// The remote resource exists but a later provisioning step failed.
    ///
    /// `issue_key` holds whatever key was already assigned to the ticket; a
    /// caller seeing this error must treat the resource as existing.
    #[error("resource {resource_id} exists but ticket provisioning is incomplete: {source}")]
    PartialProvision {
        resource_id: String,
        issue_key: Option<String>,
        #[source]
        source: Box<TicketBackendError>,
    },
    #[error("webhook signature verification failed")]
    SignatureRejected,
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TicketBackendError {
    /// Stable machine-readable code for logs and HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiToken { .. } => "missing_api_token",
            Self::AuthFailed { .. } => "auth_failed",
            Self::Api { .. } => "platform_api_error",
            Self::Transport { .. } => "transport_error",
            Self::InvalidIssueKey { .. } => "invalid_issue_key",
            Self::PartialProvision { .. } => "partial_provision",
            Self::SignatureRejected => "invalid_signature",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::Serde(_) => "serialization_error",
        }
    }

    /// Platform error code when the failure came back from the remote API.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn partial(
        resource_id: impl Into<String>,
        issue_key: Option<String>,
        source: TicketBackendError,
    ) -> Self {
        Self::PartialProvision {
            resource_id: resource_id.into(),
            issue_key,
            source: Box::new(source),
        }
    }
}
