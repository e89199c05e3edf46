//! Wordy CLI — compare your website's wording against search competitors.
//!
//! Fetches your site and the top results for a keyword, counts the words
//! they use, and turns the combined content into a compiled SEO report.

mod chart;
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
