use anyhow::Result;
use clap::Parser;
use recohub_ticketd::{init_tracing, run, TicketdCli};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    run(TicketdCli::parse()).await
}
