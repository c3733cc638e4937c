//! MarketStack catalog maintenance tool.
//!
//! Usage:
//!   marketstack migrate
//!   marketstack --catalog data/Sellers.txt search --category ELECTRONICS
//!   marketstack --mirror catalog.db history "Air Max" NikeOutlet

use anyhow::Result;
use clap::Parser;
use marketstack_cli::Cli;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!("Running {:?}", cli.command);
    let output = marketstack_cli::execute(&cli)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
