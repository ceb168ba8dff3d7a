//! Run orchestration: bounded-concurrency extraction with ordered progress.
//!
//! One [`Run`] owns one batch from submission to final result. Extraction
//! happens on a semaphore-bounded worker pool; all bookkeeping (progress,
//! normalization, dedup, event emission) is serialized on the single
//! consumer loop, so outcomes are recorded atomically in completion order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use knowledgeharvest_extract::{
    Classifier, ExtractorRegistry, RawRecord, SourceDescriptor, SourceId, SourceInput,
    SourceKind, UploadedDocument, build_descriptors,
};
use knowledgeharvest_shared::{
    FailureReason, HarvestError, KnowledgeBase, KnowledgeItem, Result, RunConfig, RunId,
};

use crate::aggregate::aggregate;
use crate::events::{EventLevel, EventStream, ProgressEvent, RunProgress};
use crate::normalize;

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

/// Lifecycle of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Aborted,
}

/// Whether a source's extraction succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Outcome of one source's extraction. Produced exactly once per source,
/// never mutated afterwards.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub source_id: SourceId,
    pub status: OutcomeStatus,
    /// Raw records, empty on failure.
    pub records: Vec<RawRecord>,
    pub error: Option<FailureReason>,
    pub elapsed: Duration,
}

impl ExtractionOutcome {
    fn success(source_id: SourceId, records: Vec<RawRecord>, elapsed: Duration) -> Self {
        Self {
            source_id,
            status: OutcomeStatus::Success,
            records,
            error: None,
            elapsed,
        }
    }

    fn failure(source_id: SourceId, reason: FailureReason, elapsed: Duration) -> Self {
        Self {
            source_id,
            status: OutcomeStatus::Failure,
            records: Vec::new(),
            error: Some(reason),
            elapsed,
        }
    }
}

/// Per-source trace entry, surfaced alongside the final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source_id: SourceId,
    pub locator: String,
    pub kind: SourceKind,
    pub status: OutcomeStatus,
    /// Items that survived normalization and dedup.
    pub items_extracted: usize,
    /// Records dropped by normalization.
    pub records_dropped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReason>,
    pub elapsed_ms: u64,
}

/// What a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: RunId,
    /// Terminal state: `Completed`, or `Aborted` after cancellation.
    pub state: RunState,
    /// The tenant-scoped result document, partial when aborted.
    pub knowledge_base: KnowledgeBase,
    /// Per-source trace in completion order.
    pub sources: Vec<SourceReport>,
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A batch submission from the surrounding system: tenant, source URLs,
/// and uploaded documents.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub team_id: String,
    pub urls: Vec<String>,
    pub documents: Vec<UploadedDocument>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// One ingestion run: owns its progress state, event stream, and
/// cancellation handle. Runs are independent — nothing is shared across
/// instances.
#[derive(Debug)]
pub struct Run {
    id: RunId,
    team_id: String,
    descriptors: Vec<Arc<SourceDescriptor>>,
    config: RunConfig,
    registry: Arc<ExtractorRegistry>,
    state: RunState,
    cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<ProgressEvent>,
    events_rx: Option<EventStream>,
}

impl Run {
    /// Validate and construct a run with the built-in classification rules.
    ///
    /// Rejects a batch with no URLs and no documents before anything runs.
    pub fn submit(
        request: RunRequest,
        config: RunConfig,
        registry: Arc<ExtractorRegistry>,
    ) -> Result<Self> {
        Self::submit_with_classifier(request, config, registry, &Classifier::with_default_rules())
    }

    /// Like [`Run::submit`] with a caller-supplied classification table.
    pub fn submit_with_classifier(
        request: RunRequest,
        config: RunConfig,
        registry: Arc<ExtractorRegistry>,
        classifier: &Classifier,
    ) -> Result<Self> {
        let RunRequest {
            team_id,
            urls,
            documents,
        } = request;

        if urls.is_empty() && documents.is_empty() {
            return Err(HarvestError::invalid_batch(
                "batch has no sources and no uploaded documents",
            ));
        }

        // URLs first, uploads after, ids sequential across both.
        let inputs: Vec<SourceInput> = urls
            .into_iter()
            .map(SourceInput::Remote)
            .chain(documents.into_iter().map(SourceInput::Upload))
            .collect();

        let descriptors = build_descriptors(inputs, classifier)
            .into_iter()
            .map(Arc::new)
            .collect();

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            id: RunId::new(),
            team_id,
            descriptors,
            config,
            registry,
            state: RunState::Pending,
            cancel: CancellationToken::new(),
            events_tx,
            events_rx: Some(events_rx),
        })
    }

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn total_sources(&self) -> usize {
        self.descriptors.len()
    }

    /// Take the lazy event stream. Available exactly once; events buffer
    /// until consumed and the stream ends when the run does.
    pub fn events(&mut self) -> Option<EventStream> {
        self.events_rx.take()
    }

    /// Handle for cooperative cancellation of this run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn emit(&self, level: EventLevel, message: String, progress: &RunProgress) {
        let event = ProgressEvent {
            timestamp: Utc::now(),
            level,
            message,
            completed: progress.completed,
            total: progress.total,
        };
        // The caller may never take (or may drop) the receiver.
        let _ = self.events_tx.send(event);
    }

    /// Execute the run to its terminal state.
    ///
    /// Every source gets exactly one recorded outcome and one progress
    /// event, in completion order. Per-source failures never abort the
    /// batch; cancellation ends the run in `Aborted` with a partial result.
    #[instrument(skip_all, fields(run_id = %self.id, team_id = %self.team_id, sources = self.descriptors.len()))]
    pub async fn execute(mut self) -> Result<RunOutcome> {
        let started = Instant::now();
        self.state = RunState::Running;

        let total = self.descriptors.len();
        let mut progress = RunProgress::new(total);

        self.emit(
            EventLevel::Info,
            format!("Starting ingestion of {total} source(s)"),
            &progress,
        );
        info!(total, concurrency = self.config.concurrency, "run started");

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks: JoinSet<ExtractionOutcome> = JoinSet::new();
        let mut by_task: HashMap<tokio::task::Id, Arc<SourceDescriptor>> = HashMap::new();
        let mut by_source: HashMap<SourceId, Arc<SourceDescriptor>> = HashMap::new();

        for descriptor in &self.descriptors {
            by_source.insert(descriptor.id, Arc::clone(descriptor));

            let task_descriptor = Arc::clone(descriptor);
            let registry = Arc::clone(&self.registry);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let deadline = self.config.source_timeout;

            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                extract_one(&task_descriptor, &registry, &cancel, deadline).await
            });
            by_task.insert(handle.id(), Arc::clone(descriptor));
        }

        let mut items: Vec<KnowledgeItem> = Vec::new();
        let mut seen_fingerprints: HashSet<String> = HashSet::new();
        let mut reports: Vec<SourceReport> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    // A panicking extractor must not sink the batch.
                    let Some(descriptor) = by_task.get(&e.id()) else {
                        return Err(HarvestError::Aggregation(format!(
                            "orphan extraction task: {e}"
                        )));
                    };
                    warn!(source = %descriptor.id, error = %e, "extraction task failed");
                    ExtractionOutcome::failure(
                        descriptor.id,
                        FailureReason::Parse(format!("extraction task failed: {e}")),
                        Duration::ZERO,
                    )
                }
            };

            let Some(descriptor) = by_source.get(&outcome.source_id).cloned() else {
                return Err(HarvestError::Aggregation(format!(
                    "outcome for unknown source {}",
                    outcome.source_id
                )));
            };

            progress.record(descriptor.locator());

            let mut extracted = 0usize;
            let mut dropped = 0usize;

            for record in outcome.records {
                match normalize::normalize(&self.team_id, &descriptor, record) {
                    Ok(item) => {
                        // First completion wins; later duplicates are dropped.
                        if seen_fingerprints.insert(item.fingerprint.clone()) {
                            extracted += 1;
                            items.push(item);
                        } else {
                            debug!(source = %descriptor.id, title = %item.title, "duplicate item dropped");
                        }
                    }
                    Err(e) => {
                        dropped += 1;
                        debug!(source = %descriptor.id, error = %e, "record failed normalization, dropped");
                    }
                }
            }

            let (level, message) = match &outcome.error {
                None => (
                    EventLevel::Success,
                    format!("Extracted {extracted} item(s) from {}", descriptor.locator()),
                ),
                Some(reason) => (
                    EventLevel::Error,
                    format!("Failed to process {}: {reason}", descriptor.locator()),
                ),
            };

            info!(
                source = %descriptor.id,
                locator = descriptor.locator(),
                status = ?outcome.status,
                items = extracted,
                dropped,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                completed = progress.completed,
                total,
                "source finished"
            );

            reports.push(SourceReport {
                source_id: descriptor.id,
                locator: descriptor.locator().to_string(),
                kind: descriptor.kind,
                status: outcome.status,
                items_extracted: extracted,
                records_dropped: dropped,
                error: outcome.error,
                elapsed_ms: outcome.elapsed.as_millis() as u64,
            });

            // Exactly one event per source, after its outcome is known.
            self.emit(level, message, &progress);
        }

        if reports.len() != total {
            return Err(HarvestError::Aggregation(format!(
                "expected {total} outcomes, recorded {}",
                reports.len()
            )));
        }

        let state = if self.cancel.is_cancelled() {
            RunState::Aborted
        } else {
            RunState::Completed
        };
        self.state = state;

        // The aggregator runs even on an aborted run: partial beats nothing.
        let knowledge_base = aggregate(&self.team_id, items, &reports, started.elapsed());

        let (level, message) = match state {
            RunState::Aborted => (
                EventLevel::Error,
                format!(
                    "Run cancelled: partial result with {} item(s)",
                    knowledge_base.summary.total_items
                ),
            ),
            _ => (
                EventLevel::Success,
                format!(
                    "Ingestion complete: {} item(s) from {} source(s)",
                    knowledge_base.summary.total_items,
                    knowledge_base.summary.sources_processed
                ),
            ),
        };
        self.emit(level, message, &progress);

        info!(
            state = ?state,
            items = knowledge_base.summary.total_items,
            sources_processed = knowledge_base.summary.sources_processed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );

        Ok(RunOutcome {
            run_id: self.id.clone(),
            state,
            knowledge_base,
            sources: reports,
        })
    }
}

/// Resolve and invoke the extractor for one source, mapping timeout and
/// cancellation into failure outcomes. Total: always returns an outcome.
async fn extract_one(
    descriptor: &SourceDescriptor,
    registry: &ExtractorRegistry,
    cancel: &CancellationToken,
    deadline: Duration,
) -> ExtractionOutcome {
    let started = Instant::now();

    // Cancelled before dispatch: never invoke the extractor.
    if cancel.is_cancelled() {
        return ExtractionOutcome::failure(
            descriptor.id,
            FailureReason::Cancelled,
            started.elapsed(),
        );
    }

    let extractor = registry.resolve(descriptor);
    debug!(
        source = %descriptor.id,
        strategy = extractor.name(),
        locator = descriptor.locator(),
        "dispatching source"
    );

    let result = tokio::select! {
        _ = cancel.cancelled() => Err(FailureReason::Cancelled),
        res = tokio::time::timeout(deadline, extractor.extract(descriptor, cancel)) => {
            match res {
                Ok(inner) => inner,
                Err(_) => Err(FailureReason::Timeout(deadline.as_secs().max(1))),
            }
        }
    };

    let elapsed = started.elapsed();
    match result {
        Ok(records) => ExtractionOutcome::success(descriptor.id, records, elapsed),
        Err(reason) => ExtractionOutcome::failure(descriptor.id, reason, elapsed),
    }
}
