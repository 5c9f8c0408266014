//! Write every stored submission as CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use birthorder_core::export_csv;
use clap::Parser;

use super::{open_store, StoreArgs};

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(long = "out", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub async fn run_export(args: ExportArgs) -> Result<()> {
    let store = open_store(&args.store).await?;
    let records = store.all().await.context("Failed to load submissions")?;
    let csv = export_csv(&records, store.export_layout())?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(rows = records.len(), path = %path.display(), "exported submissions");
        }
        None => println!("{csv}"),
    }
    Ok(())
}
