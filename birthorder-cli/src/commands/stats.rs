//! Print aggregate statistics without starting the server

use anyhow::{Context, Result};
use birthorder_core::StatisticsOutcome;
use clap::Parser;

use super::{open_store, StoreArgs};

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub async fn run_stats(args: StatsArgs) -> Result<()> {
    let store = open_store(&args.store).await?;
    let outcome = store
        .statistics()
        .await
        .context("Failed to compute statistics")?;

    let stats = match outcome {
        StatisticsOutcome::NoData => {
            println!("No submissions yet");
            return Ok(());
        }
        StatisticsOutcome::Computed(stats) => stats,
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&stats)?
    } else {
        serde_json::to_string(&stats)?
    };
    println!("{rendered}");
    Ok(())
}
