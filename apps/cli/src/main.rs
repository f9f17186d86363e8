//! paylink CLI: payment-link notification runner.
//!
//! Scans the worklist sheet, notifies every row whose payment link is ready,
//! writes the outcome back and posts the run log to the chat webhook.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
