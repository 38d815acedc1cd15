//! SiteKit CLI: render CMS-driven tenant sites from the terminal.
//!
//! Resolves a tenant by domain, fetches its site, theme and page from the
//! CMS, and writes a themed HTML document.

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
