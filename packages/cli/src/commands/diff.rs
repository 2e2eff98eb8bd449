use super::load_document;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_differ::{DiffEngine, NodeClassifier};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Current document (Markdown, or a JSON node array)
    pub live: PathBuf,

    /// Desired document
    pub target: PathBuf,

    /// Rows a table may gain or lose before it is replaced whole (overrides config)
    #[arg(long)]
    pub table_threshold: Option<usize>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub fn diff(args: DiffArgs, cwd: &str) -> Result<()> {
    let mut config = Config::load(cwd)?.diff;
    if let Some(threshold) = args.table_threshold {
        config.table_row_replace_threshold = threshold;
    }

    let live = load_document(&args.live)?;
    let target = NodeClassifier::filter(&load_document(&args.target)?);

    let operations = DiffEngine::new(config).diff(&target, &live)?;
    tracing::debug!(operations = operations.len(), "Diff computed");

    let json = if args.compact {
        serde_json::to_string(&operations)?
    } else {
        serde_json::to_string_pretty(&operations)?
    };
    println!("{}", json);

    if operations.is_empty() {
        eprintln!("{}", "Documents already match".green());
    } else {
        eprintln!(
            "{} {} operation(s)",
            "→".bright_blue(),
            operations.len().to_string().cyan()
        );
    }
    Ok(())
}
