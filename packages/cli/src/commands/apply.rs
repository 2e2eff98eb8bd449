use super::load_document;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use quill_editor::{HostEditor, MemoryEditor, Reconciler};
use quill_ingest::{
    ChunkedIngestionScheduler, CommonMarkCodec, IngestMode, IngestOptions, MarkdownSerializer,
    ProgressCallback, TokioScheduler,
};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Current document (Markdown, or a JSON node array)
    pub live: PathBuf,

    /// Markdown to ingest into it
    pub target: PathBuf,

    /// Reconcile in batches, yielding between them
    #[arg(long)]
    pub cooperative: bool,

    /// Nodes per batch (overrides config)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Chunk size in bytes (overrides config)
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print the result as a JSON node array
    #[arg(long)]
    pub json: bool,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut host = MemoryEditor::new(load_document(&args.live)?);
    let source = std::fs::read_to_string(&args.target)
        .with_context(|| format!("Cannot read {}", args.target.display()))?;

    let scheduler = ChunkedIngestionScheduler::new(
        Box::new(CommonMarkCodec::default()),
        Box::new(TokioScheduler::default()),
    )
    .with_config(config.ingest)
    .with_serializer(Box::new(CommonMarkCodec::default()))
    .with_reconciler(Reconciler::new(config.diff));

    let progress: ProgressCallback = Box::new(|fraction: f64| -> anyhow::Result<()> {
        eprintln!(
            "  {} {:>3}%",
            "…".dimmed(),
            (fraction * 100.0).round() as u32
        );
        Ok(())
    });
    let options = IngestOptions {
        chunk_size: args.chunk_size,
        batch_size: args.batch_size,
        use_cooperative_yield: Some(args.cooperative),
        on_progress: Some(progress),
        ..IngestOptions::default()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(async {
        let ingestion = scheduler.ingest(&mut host, &source, options)?;
        ingestion.wait().await
    })?;

    let mode = match report.mode {
        IngestMode::Skipped => "skipped".yellow(),
        IngestMode::Direct => "direct".green(),
        IngestMode::Sync => "sync".green(),
        IngestMode::Cooperative => "cooperative".green(),
    };
    eprintln!(
        "{} {} · {} chunk(s) · {} node(s) · {} batch(es) · {} applied, {} skipped, {} failed",
        "✓".green(),
        mode,
        report.chunks,
        report.nodes,
        report.batches,
        report.apply.applied,
        report.apply.skipped,
        report.apply.failed
    );

    let output = if args.json {
        serde_json::to_string_pretty(host.children())?
    } else {
        CommonMarkCodec::default().serialize(host.children())?
    };

    match args.out {
        Some(path) => {
            std::fs::write(&path, output)?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}
