use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use quill_ingest::{split_markdown, Separator};
use regex::Regex;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Markdown file to split
    pub file: PathBuf,

    /// Maximum chunk size in bytes (overrides config)
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Separator to cut at (defaults to blank lines)
    #[arg(short, long)]
    pub separator: Option<String>,

    /// Treat the separator as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Print each chunk in full
    #[arg(long)]
    pub full: bool,
}

pub fn split(args: SplitArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?.ingest;
    let chunk_size = args.chunk_size.unwrap_or(config.chunk_size).max(1);

    let separator = match args.separator.or(config.separator) {
        Some(pattern) if args.regex => Separator::Pattern(
            Regex::new(&pattern).with_context(|| format!("Invalid separator pattern: {}", pattern))?,
        ),
        Some(literal) => Separator::Literal(literal),
        None => Separator::default(),
    };

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let chunks = split_markdown(&source, &separator, chunk_size);

    println!(
        "{} {} → {} chunk(s) of at most {} bytes",
        "✂".bright_blue(),
        args.file.display(),
        chunks.len().to_string().cyan(),
        chunk_size
    );

    for (index, chunk) in chunks.iter().enumerate() {
        println!();
        println!(
            "{} {}",
            format!("chunk {}", index).bold(),
            format!("({} bytes)", chunk.len()).dimmed()
        );
        if args.full {
            println!("{}", chunk);
        } else {
            let first = chunk.lines().next().unwrap_or("");
            println!("  {}", first);
            let rest = chunk.lines().count().saturating_sub(1);
            if rest > 0 {
                println!("  {}", format!("… {} more line(s)", rest).dimmed());
            }
        }
    }
    Ok(())
}
