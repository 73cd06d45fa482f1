//! Composition root for the recommendations hub ticket service.

mod bootstrap_helpers;
mod cli_args;
mod webhook_server;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use recohub_slack_tickets::SlackTicketBackend;
use recohub_ticket_core::{TicketBackend, TicketBackendKind};
use tokio::net::TcpListener;

pub use bootstrap_helpers::init_tracing;
pub use cli_args::{CliTicketBackend, TicketdCli};
pub use webhook_server::{build_webhook_router, HEALTHZ_ENDPOINT, SLACK_WEBHOOK_ENDPOINT};

/// Builds the backend selected on the command line. Configuration errors are
/// reported before any network call is made.
pub fn build_ticket_backend(cli: &TicketdCli) -> Result<Arc<dyn TicketBackend>> {
    match cli.backend_kind() {
        TicketBackendKind::Slack => {
            let config = cli.slack_ticket_config();
            tracing::debug!(?config, "resolved slack ticket configuration");
            let backend = SlackTicketBackend::new(&config)
                .context("failed to configure slack ticket backend")?;
            Ok(Arc::new(backend))
        }
    }
}

pub async fn run(cli: TicketdCli) -> Result<()> {
    let bind_addr = cli
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{}'", cli.bind))?;

    let backend = build_ticket_backend(&cli)?;
    backend
        .init()
        .await
        .with_context(|| format!("failed to initialise {} ticket backend", backend.kind()))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind ticket webhook server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound webhook server address")?;
    tracing::info!(
        addr = %local_addr,
        backend = %backend.kind(),
        endpoint = SLACK_WEBHOOK_ENDPOINT,
        "ticket webhook server listening"
    );

    axum::serve(listener, build_webhook_router(backend))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("ticket webhook server exited unexpectedly")?;
    tracing::info!("ticket webhook server stopped");
    Ok(())
}
