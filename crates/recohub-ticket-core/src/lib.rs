//! Ticket domain shared by the recommendations hub ticket backends.
//!
//! Defines the plugin contract every messaging or tracker backend implements,
//! the ticket and recommendation row types that flow through it, and the
//! transport-neutral webhook request/response pair the host router hands in.

mod backend;
mod error;
mod ticket;
mod webhook;

pub use backend::{TicketBackend, TicketBackendKind};
pub use error::TicketBackendError;
pub use ticket::{RecommendationQueryResult, Ticket, SNOOZE_DAYS};
pub use webhook::{WebhookRequest, WebhookResponse, WebhookResponseBody};
