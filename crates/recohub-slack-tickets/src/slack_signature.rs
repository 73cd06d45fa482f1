//! Slack request-signature verification over a form-encoded canonical body.
//!
//! The platform posts JSON but signs a form-encoded rendering of it, so the
//! body is parsed and re-encoded before hashing:
//!
//! ```text
//! v0=hex(HMAC-SHA256(secret, "v0:" + timestamp + ":" + form(body)))
//! ```

use std::fmt;

use hmac::{Hmac, Mac};
use recohub_ticket_core::{TicketBackendError, WebhookRequest};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SLACK_REQUEST_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
/// Maximum age of a signed request. Not configurable.
pub const SLACK_REPLAY_WINDOW_SECONDS: i64 = 300;
const SLACK_SIGNATURE_VERSION: &str = "v0";

#[derive(Clone)]
/// Validates that a webhook call was signed with the shared signing secret.
///
/// A verifier built without a secret rejects every request.
pub struct SlackSignatureVerifier {
    signing_secret: Option<String>,
}

impl SlackSignatureVerifier {
    pub fn new(signing_secret: Option<&str>) -> Self {
        Self {
            signing_secret: signing_secret
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }

    pub fn verify(&self, request: &WebhookRequest) -> bool {
        self.verify_at(request, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify`](Self::verify) against an explicit clock.
    pub fn verify_at(&self, request: &WebhookRequest, now_unix: i64) -> bool {
        let Some(secret) = self.signing_secret.as_deref() else {
            tracing::warn!("rejecting slack webhook: no signing secret configured");
            return false;
        };
        let signature = request.header(SLACK_SIGNATURE_HEADER).unwrap_or("");
        let timestamp = request.header(SLACK_REQUEST_TIMESTAMP_HEADER).unwrap_or("");
        tracing::debug!(timestamp, "verifying slack request signature");

        let Ok(timestamp_secs) = timestamp.parse::<i64>() else {
            tracing::debug!(timestamp, "rejecting slack webhook: timestamp is not an integer");
            return false;
        };
        let age_secs = now_unix.saturating_sub(timestamp_secs);
        if age_secs > SLACK_REPLAY_WINDOW_SECONDS {
            tracing::debug!(age_secs, "rejecting slack webhook: timestamp outside replay window");
            return false;
        }

        let canonical = match canonical_form_encoding(request.body()) {
            Ok(canonical) => canonical,
            Err(error) => {
                tracing::warn!(%error, "rejecting slack webhook: body is not a json object");
                return false;
            }
        };
        tracing::debug!(canonical_len = canonical.len(), "built slack signature base");

        let Some(digest_hex) = signature.strip_prefix("v0=") else {
            return false;
        };
        let Some(signature_bytes) = decode_lower_hex(digest_hex) else {
            return false;
        };
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(signature_base(timestamp, &canonical).as_bytes());
        mac.verify_slice(&signature_bytes).is_ok()
    }
}

impl fmt::Debug for SlackSignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackSignatureVerifier")
            .field("has_signing_secret", &self.signing_secret.is_some())
            .finish()
    }
}

/// Re-encodes a JSON object body as sorted `key=value` form pairs.
///
/// String values are used verbatim. Other values use the loose text form
/// Slack's signer expects: numbers in shortest general form (`1.7e+09`),
/// `null` as `<nil>`, arrays as `[a b]` and objects as `map[k:v]` with
/// sorted keys. `*` is percent-escaped and `~` is left as is.
pub fn canonical_form_encoding(body: &[u8]) -> Result<String, TicketBackendError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|error| TicketBackendError::MalformedPayload(error.to_string()))?;
    let Value::Object(fields) = payload else {
        return Err(TicketBackendError::MalformedPayload(
            "expected a json object".to_string(),
        ));
    };

    let mut entries = fields.iter().collect::<Vec<_>>();
    entries.sort_by(|left, right| left.0.cmp(right.0));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in entries {
        let mut rendered = String::new();
        render_loose_value(value, &mut rendered);
        serializer.append_pair(key, &rendered);
    }
    Ok(serializer.finish().replace('*', "%2A").replace("%7E", "~"))
}

fn render_loose_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("<nil>"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => {
            out.push_str(&render_loose_float(number.as_f64().unwrap_or_default()));
        }
        Value::String(text) => out.push_str(text),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(' ');
                }
                render_loose_value(item, out);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            let mut entries = fields.iter().collect::<Vec<_>>();
            entries.sort_by(|left, right| left.0.cmp(right.0));
            out.push_str("map[");
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(' ');
                }
                out.push_str(key);
                out.push(':');
                render_loose_value(item, out);
            }
            out.push(']');
        }
    }
}

/// Shortest round-trip digits, switching to exponent form when the decimal
/// exponent is below -4 or at least 6.
fn render_loose_float(value: f64) -> String {
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    if exponent < -4 || exponent >= 6 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        value.to_string()
    }
}

/// `v0=<hex>` signature Slack would send for `timestamp` and `canonical`.
pub fn compute_slack_signature(secret: &str, timestamp: &str, canonical: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(signature_base(timestamp, canonical).as_bytes());
    let digest = mac.finalize().into_bytes();
    format!(
        "{SLACK_SIGNATURE_VERSION}={}",
        digest
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>()
    )
}

fn signature_base(timestamp: &str, canonical: &str) -> String {
    format!("{SLACK_SIGNATURE_VERSION}:{timestamp}:{canonical}")
}

/// Only lower-case digits are accepted so the check stays byte-exact with
/// the hex the platform emits.
fn decode_lower_hex(raw: &str) -> Option<Vec<u8>> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return None;
    }
    if !raw
        .bytes()
        .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
    {
        return None;
    }
    (0..raw.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(&raw[index..index + 2], 16).ok())
        .collect()
}
