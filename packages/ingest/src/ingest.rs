//! # Chunked Ingestion
//!
//! Turns Markdown source into live-document edits.
//!
//! ```text
//! source ─┬─ serialize(live) == source ──────────────→ Skipped
//!         ├─ len ≤ chunk_size → parse → reconcile ───→ Direct
//!         └─ split → parse chunks → filter
//!              ├─ sync, or nodes ≤ batch → reconcile ─→ Sync
//!              └─ batch 1 → yield → batch 2 → … → truncate
//!                                                   → Cooperative
//! ```
//!
//! Cooperative mode reconciles each batch against its window of live roots,
//! so the document grows (or shrinks) batch by batch without a full diff
//! per step. Cancelling stops the run before the next batch; batches already
//! applied stay applied.

use crate::{
    split_markdown, FrameScheduler, IngestConfig, IngestError, MarkdownParser, MarkdownSerializer,
    Separator,
};
use futures::future::LocalBoxFuture;
use quill_differ::NodeClassifier;
use quill_editor::{ApplyReport, HostEditor, Reconciler};
use quill_schema::Node;
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument, warn};

pub type ProgressCallback = Box<dyn FnMut(f64) -> anyhow::Result<()>>;

/// Per-call overrides. Unset fields fall back to [`IngestConfig`].
#[derive(Default)]
pub struct IngestOptions {
    pub chunk_size: Option<usize>,
    pub separator: Option<Separator>,
    pub use_cooperative_yield: Option<bool>,
    pub batch_size: Option<usize>,
    /// Receives the completed fraction; the last call always reports `1.0`
    pub on_progress: Option<ProgressCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestMode {
    /// Source already matched the live document
    Skipped,
    /// Parsed in one piece
    Direct,
    /// Chunked, reconciled in one call
    Sync,
    /// Chunked, reconciled batch by batch between frames
    Cooperative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub mode: IngestMode,
    pub chunks: usize,
    pub nodes: usize,
    pub batches: usize,
    pub apply: ApplyReport,
}

/// Result of [`ChunkedIngestionScheduler::ingest`]
pub enum Ingestion<'a> {
    Complete(IngestReport),
    Deferred(LocalBoxFuture<'a, Result<IngestReport, IngestError>>),
}

impl<'a> Ingestion<'a> {
    pub async fn wait(self) -> Result<IngestReport, IngestError> {
        match self {
            Ingestion::Complete(report) => Ok(report),
            Ingestion::Deferred(future) => future.await,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Ingestion::Deferred(_))
    }
}

pub struct ChunkedIngestionScheduler {
    config: IngestConfig,
    parser: Box<dyn MarkdownParser>,
    serializer: Option<Box<dyn MarkdownSerializer>>,
    frames: Box<dyn FrameScheduler>,
    reconciler: Reconciler,
    cancel: watch::Sender<u64>,
}

impl ChunkedIngestionScheduler {
    pub fn new(parser: Box<dyn MarkdownParser>, frames: Box<dyn FrameScheduler>) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            config: IngestConfig::default(),
            parser,
            serializer: None,
            frames,
            reconciler: Reconciler::default(),
            cancel,
        }
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables the identical-content skip
    pub fn with_serializer(mut self, serializer: Box<dyn MarkdownSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Stop every in-flight cooperative ingestion before its next batch
    pub fn cancel(&self) {
        self.cancel.send_modify(|generation| *generation += 1);
        debug!("Ingestion cancel requested");
    }

    /// Ingest `source` into `host`.
    ///
    /// Returns [`Ingestion::Complete`] when the work finished in this call and
    /// [`Ingestion::Deferred`] when batches still have to run between frames.
    #[instrument(skip_all, fields(bytes = source.len()))]
    pub fn ingest<'a, H>(
        &'a self,
        host: &'a mut H,
        source: &str,
        mut options: IngestOptions,
    ) -> Result<Ingestion<'a>, IngestError>
    where
        H: HostEditor + ?Sized + 'a,
    {
        let cancel = self.cancel.subscribe();
        let chunk_size = options.chunk_size.unwrap_or(self.config.chunk_size).max(1);
        let batch_size = options.batch_size.unwrap_or(self.config.batch_size).max(1);
        let cooperative = options
            .use_cooperative_yield
            .unwrap_or(self.config.use_cooperative_yield);
        let mut progress = options.on_progress.take();

        if self.matches_live(host, source) {
            info!("Source matches live document, skipping");
            report_progress(&mut progress, 1.0);
            return Ok(Ingestion::Complete(IngestReport {
                mode: IngestMode::Skipped,
                chunks: 0,
                nodes: 0,
                batches: 0,
                apply: ApplyReport::default(),
            }));
        }

        if source.len() <= chunk_size {
            let nodes = match self.parser.parse(source) {
                Ok(nodes) => self.seal(nodes),
                Err(source) => {
                    warn!(%source, "Source failed to parse");
                    return parse_failure(IngestError::Parse { chunk: 0, source }, cooperative);
                }
            };
            let report = self.reconciler.reconcile(host, &nodes);
            report_progress(&mut progress, 1.0);
            return Ok(Ingestion::Complete(IngestReport {
                mode: IngestMode::Direct,
                chunks: 1,
                nodes: nodes.len(),
                batches: 1,
                apply: report.apply,
            }));
        }

        let separator = options
            .separator
            .take()
            .or_else(|| self.config.separator.as_deref().map(Separator::from))
            .unwrap_or_default();
        let chunks = split_markdown(source, &separator, chunk_size);

        let mut parsed = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            match self.parser.parse(chunk) {
                Ok(nodes) => parsed.extend(nodes),
                Err(source) => {
                    warn!(chunk = index, %source, "Chunk failed to parse");
                    let err = IngestError::Parse {
                        chunk: index,
                        source,
                    };
                    return parse_failure(err, cooperative);
                }
            }
        }
        let nodes = NodeClassifier::filter(&self.seal(parsed));
        debug!(chunks = chunks.len(), nodes = nodes.len(), "Source parsed");

        if !cooperative || nodes.len() <= batch_size {
            let report = self.reconciler.reconcile(host, &nodes);
            report_progress(&mut progress, 1.0);
            return Ok(Ingestion::Complete(IngestReport {
                mode: IngestMode::Sync,
                chunks: chunks.len(),
                nodes: nodes.len(),
                batches: 1,
                apply: report.apply,
            }));
        }

        let chunk_count = chunks.len();
        Ok(Ingestion::Deferred(Box::pin(self.run_batches(
            host,
            nodes,
            batch_size,
            chunk_count,
            progress,
            cancel,
        ))))
    }

    async fn run_batches<H>(
        &self,
        host: &mut H,
        nodes: Vec<Node>,
        batch_size: usize,
        chunks: usize,
        mut progress: Option<ProgressCallback>,
        mut cancel: watch::Receiver<u64>,
    ) -> Result<IngestReport, IngestError>
    where
        H: HostEditor + ?Sized,
    {
        let batches: Vec<&[Node]> = nodes.chunks(batch_size).collect();
        let total = batches.len();
        let mut apply = ApplyReport::default();
        let mut offset = 0;

        for (index, batch) in batches.into_iter().enumerate() {
            if index > 0 {
                self.next_frame(&mut cancel).await?;
            }
            if cancel.has_changed().unwrap_or(false) {
                info!(batch = index, "Ingestion cancelled");
                return Err(IngestError::Cancelled);
            }

            let report = self.reconciler.reconcile_window(host, batch, offset);
            apply.merge(report.apply);
            offset += batch.len();

            if index + 1 == total {
                apply.merge(self.reconciler.truncate(host, offset));
            }
            debug!(batch = index, total, operations = report.operations, "Batch reconciled");
            report_progress(&mut progress, (index + 1) as f64 / total as f64);
        }

        info!(
            batches = total,
            applied = apply.applied,
            failed = apply.failed,
            "Cooperative ingestion complete"
        );
        Ok(IngestReport {
            mode: IngestMode::Cooperative,
            chunks,
            nodes: nodes.len(),
            batches: total,
            apply,
        })
    }

    /// Wait for the scheduler callback, or fail early on cancellation
    async fn next_frame(&self, cancel: &mut watch::Receiver<u64>) -> Result<(), IngestError> {
        let (tx, rx) = oneshot::channel();
        self.frames.schedule(Box::new(move || {
            let _ = tx.send(());
        }));

        tokio::select! {
            fired = rx => fired.map_err(|_| IngestError::SchedulerDropped),
            _ = cancel.changed() => Err(IngestError::Cancelled),
        }
    }

    fn matches_live<H: HostEditor + ?Sized>(&self, host: &H, source: &str) -> bool {
        let Some(serializer) = &self.serializer else {
            return false;
        };
        match serializer.serialize(host.children()) {
            Ok(live) => live == source,
            Err(err) => {
                debug!(%err, "Live document could not be serialized for comparison");
                false
            }
        }
    }

    fn seal(&self, nodes: Vec<Node>) -> Vec<Node> {
        if self.config.seal_nodes {
            nodes.into_iter().map(Node::sealed).collect()
        } else {
            nodes
        }
    }
}

/// Cooperative callers observe parse errors through the deferred future
fn parse_failure<'a>(err: IngestError, cooperative: bool) -> Result<Ingestion<'a>, IngestError> {
    if cooperative {
        Ok(Ingestion::Deferred(Box::pin(async move {
            Err::<IngestReport, _>(err)
        })))
    } else {
        Err(err)
    }
}

fn report_progress(progress: &mut Option<ProgressCallback>, fraction: f64) {
    if let Some(callback) = progress {
        if let Err(err) = callback(fraction) {
            warn!(fraction, %err, "Progress callback failed");
        }
    }
}
