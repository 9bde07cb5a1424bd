//! Reel commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::config::{build_client, Overrides};
use crate::handlers::reel as handlers;
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Subcommand)]
pub enum ReelAction {
    /// Show the newest reels
    Feed {
        /// Reels per page (10-50)
        #[arg(short, long, default_value = "20")]
        limit: u32,
        /// Number of pages to walk
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },
}

pub async fn handle(action: ReelAction, overrides: &Overrides, format: OutputFormat) -> Result<()> {
    match action {
        ReelAction::Feed { limit, pages } => feed(overrides, limit, pages, format).await,
    }
}

async fn feed(overrides: &Overrides, limit: u32, pages: u32, format: OutputFormat) -> Result<()> {
    let client = build_client(overrides)?;
    let result = handlers::fetch_feed(&client, limit, pages).await?;

    if matches!(format, OutputFormat::Json) {
        print_json(&result);
        return Ok(());
    }

    print_table(result.reels, format);
    if result.has_more {
        println!(
            "{}",
            format!("Showing {} page(s); more available with --pages", result.pages).dimmed()
        );
    }

    Ok(())
}
