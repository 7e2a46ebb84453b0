//! Orchestration of a whole run: discover, extract, merge and write.
//!
//! Each artifact is processed on its own session thread and the driver waits
//! for it with a time limit, so one pathological file cannot stall the batch.
//! Failures of one artifact are recorded as a [`SkipReason`] and never affect
//! the others. Only configuration and output errors end a run early.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;

use crate::config::HarvestConfig;
use crate::dataset::{merge_tables, Dataset};
use crate::errors::{BatchError, ConfigError};
use crate::extract::StepExtractor;
use crate::nodal::{nodal_records, NodalDataset, NodalRecord};
use crate::provider::{ResultProvider, ResultSession};
use crate::record::{assemble_record, Artifact, ArtifactTable};
use crate::steps::StepEnumerator;
use crate::writer::write_table_to_path;

/// Why an artifact contributed no rows.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SkipReason {
    /// The provider could not open the file.
    #[error("unreadable: {0}")]
    Unreadable(String),
    /// The mesh could not be read.
    #[error("mesh unavailable: {0}")]
    MeshUnavailable(String),
    /// Processing exceeded the per-artifact time limit.
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    /// The session thread panicked.
    #[error("session thread panicked")]
    WorkerPanicked,
    /// No session thread could be started.
    #[error("session thread could not be started: {0}")]
    WorkerUnavailable(String),
}

/// An artifact that was skipped, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedArtifact {
    /// The skipped artifact.
    pub artifact: Artifact,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Terminal state of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// At least one row was produced.
    Completed(usize),
    /// The run finished without producing rows.
    CompletedEmpty,
}

/// Counts reported to the user at the end of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Root that was searched.
    pub root: PathBuf,
    /// Number of artifacts discovered.
    pub artifacts_found: usize,
    /// Number of artifacts that produced a table.
    pub processed: usize,
    /// Artifacts that were skipped, in discovery order.
    pub skipped: Vec<SkippedArtifact>,
    /// Number of dataset rows.
    pub rows: usize,
    /// Number of nodal rows, when the nodal export was enabled.
    pub nodal_rows: Option<usize>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// File the dataset was written to.
    pub output: Option<PathBuf>,
    /// File the nodal rows were written to.
    pub nodal_output: Option<PathBuf>,
    /// Timed out session threads that had not finished when the run ended.
    pub lingering_sessions: usize,
}

impl RunSummary {
    /// Terminal state derived from the row count.
    #[must_use]
    pub fn state(&self) -> RunState {
        if self.rows == 0 {
            RunState::CompletedEmpty
        } else {
            RunState::Completed(self.rows)
        }
    }
}

/// Everything a run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome {
    /// Merged dataset.
    pub dataset: Dataset,
    /// Nodal rows, when the nodal export was enabled.
    pub nodal: Option<NodalDataset>,
    /// Counts for reporting.
    pub summary: RunSummary,
}

/// Rows extracted from one artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactResult {
    /// Aggregate rows in step order.
    pub table: ArtifactTable,
    /// Nodal rows in step then node order; empty unless requested.
    pub nodal: Vec<NodalRecord>,
}

/// How each artifact is walked.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionPlan {
    /// Step selection.
    pub enumerator: StepEnumerator,
    /// Quantity extraction.
    pub extractor: StepExtractor,
    /// Whether nodal displacement rows are kept.
    pub nodal: bool,
}

/// Extract every step of one artifact.
///
/// # Errors
///
/// Returns a [`SkipReason`] when the artifact or its mesh cannot be read.
/// Step and quantity failures degrade the rows instead.
pub fn process_artifact<P: ResultProvider + ?Sized>(
    provider: &P,
    artifact: &Artifact,
    plan: &ExtractionPlan,
) -> Result<ArtifactResult, SkipReason> {
    let _span = tracing::info_span!("artifact", project = %artifact.project).entered();
    tracing::info!(path = %artifact.path.display(), "Processing artifact");

    let session = provider
        .open(&artifact.path)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let mesh = session
        .mesh_info()
        .map_err(|e| SkipReason::MeshUnavailable(e.to_string()))?;
    tracing::info!(nodes = mesh.nodes, elements = mesh.elements, "Mesh loaded");

    let steps = plan.enumerator.enumerate(&session);
    let mut table = ArtifactTable::new(plan.extractor.quantities());
    let mut nodal = Vec::new();
    for step in steps {
        let extraction = plan.extractor.extract_detailed(&session, &step);
        if plan.nodal {
            match &extraction.displacement_field {
                Some(field) => nodal.extend(nodal_records(&artifact.project, step, field)),
                None => tracing::warn!(step = step.index, "No displacement field for nodal rows"),
            }
        }
        table.push(assemble_record(
            &artifact.project,
            step,
            extraction.quantities,
            &artifact.path,
        ));
    }
    tracing::info!(rows = table.len(), "Artifact done");
    Ok(ArtifactResult { table, nodal })
}

/// Runs the whole pipeline against one provider.
pub struct BatchDriver<P> {
    /// Provider shared with the session threads.
    provider: Arc<P>,
    /// Settings of every run.
    config: HarvestConfig,
    /// Whether nodal rows are kept.
    nodal: bool,
    /// Number of session threads that have not finished yet.
    running: Arc<AtomicUsize>,
}

/// Counts a session thread as running until it is dropped.
///
/// Dropped on unwind too, so a panicking session is not counted as lingering.
struct RunningSession(Arc<AtomicUsize>);

impl RunningSession {
    /// Register a new session on `counter`.
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for RunningSession {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<P: ResultProvider + 'static> BatchDriver<P> {
    /// Create a driver for `provider` with `config`.
    pub fn new(provider: P, config: HarvestConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config,
            nodal: false,
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Keep nodal displacement rows in addition to the aggregates.
    #[must_use]
    pub fn with_nodal_export(mut self, enabled: bool) -> Self {
        self.nodal = enabled;
        self
    }

    /// Configuration of this driver.
    #[must_use]
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Discover and process every artifact beneath `root`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Config`] when the configuration is invalid, the
    /// root cannot be read or the worker pool cannot start.
    pub fn run(&self, root: &Path) -> Result<BatchOutcome, BatchError> {
        let started = Instant::now();
        self.config.validate()?;
        check_root(root)?;

        let artifacts: Vec<Artifact> = self
            .config
            .locator()
            .locate(root)
            .into_iter()
            .map(|path| Artifact::discovered(path, &self.config.marker))
            .collect();
        if artifacts.is_empty() {
            tracing::warn!(
                root = %root.display(),
                marker = %self.config.marker,
                extension = %self.config.extension,
                "No artifacts found"
            );
        } else {
            tracing::info!(count = artifacts.len(), "Artifacts found");
        }
        let artifacts_found = artifacts.len();

        let outcomes = self.process_all(artifacts)?;

        let mut tables = Vec::new();
        let mut nodal_parts = Vec::new();
        let mut skipped = Vec::new();
        for (artifact, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    tables.push(result.table);
                    nodal_parts.push(result.nodal);
                }
                Err(reason) => {
                    tracing::warn!(
                        path = %artifact.path.display(),
                        reason = %reason,
                        "Skipping artifact"
                    );
                    skipped.push(SkippedArtifact { artifact, reason });
                }
            }
        }

        let processed = tables.len();
        let mut dataset = merge_tables(tables);
        if dataset.columns.is_empty() {
            dataset.columns = self.config.extractor().quantities().to_vec();
        }
        let nodal = self.nodal.then(|| NodalDataset::concat(nodal_parts));

        let summary = RunSummary {
            root: root.to_path_buf(),
            artifacts_found,
            processed,
            skipped,
            rows: dataset.len(),
            nodal_rows: nodal.as_ref().map(NodalDataset::len),
            elapsed: started.elapsed(),
            output: None,
            nodal_output: None,
            lingering_sessions: self.running.load(Ordering::SeqCst),
        };
        if summary.lingering_sessions > 0 {
            tracing::warn!(
                sessions = summary.lingering_sessions,
                "Timed out sessions are still running"
            );
        }
        tracing::info!(
            found = summary.artifacts_found,
            skipped = summary.skipped.len(),
            rows = summary.rows,
            "Run finished"
        );
        Ok(BatchOutcome {
            dataset,
            nodal,
            summary,
        })
    }

    /// Run and hand the dataset to the tabular writer.
    ///
    /// An empty dataset is written as a header-only file unless
    /// `write_empty` is disabled. Nodal rows are written to `nodal_output`
    /// when both a path is given and the nodal export is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Config`] as [`BatchDriver::run`] does, and
    /// [`BatchError::Output`] when a file cannot be written.
    pub fn run_to_file(
        &self,
        root: &Path,
        output: &Path,
        nodal_output: Option<&Path>,
    ) -> Result<RunSummary, BatchError> {
        let outcome = self.run(root)?;
        let mut summary = outcome.summary;
        let options = &self.config.csv;

        if outcome.dataset.is_empty() && !self.config.write_empty {
            tracing::info!("No rows produced; output file not written");
        } else {
            write_table_to_path(&outcome.dataset, output, options)?;
            summary.output = Some(output.to_path_buf());
        }

        if let (Some(path), Some(nodal)) = (nodal_output, &outcome.nodal) {
            if nodal.is_empty() && !self.config.write_empty {
                tracing::info!("No nodal rows produced; nodal file not written");
            } else {
                write_table_to_path(nodal, path, options)?;
                summary.nodal_output = Some(path.to_path_buf());
            }
        }
        Ok(summary)
    }

    /// Process artifacts sequentially or on the worker pool, keeping discovery order.
    fn process_all(
        &self,
        artifacts: Vec<Artifact>,
    ) -> Result<Vec<(Artifact, Result<ArtifactResult, SkipReason>)>, ConfigError> {
        let plan = Arc::new(ExtractionPlan {
            enumerator: self.config.step_enumerator(),
            extractor: self.config.extractor(),
            nodal: self.nodal,
        });
        let run_one = |artifact: Artifact| {
            let outcome = self.process_with_timeout(&artifact, &plan);
            (artifact, outcome)
        };

        if self.config.workers <= 1 || artifacts.len() <= 1 {
            return Ok(artifacts.into_iter().map(run_one).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|index| format!("feadataset-worker-{index}"))
            .build()
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;
        tracing::debug!(workers = self.config.workers, "Processing on worker pool");
        Ok(pool.install(|| artifacts.into_par_iter().map(run_one).collect()))
    }

    /// Process one artifact on a session thread, giving up after the time limit.
    ///
    /// A timed out session thread is left to finish on its own; its result is
    /// discarded.
    fn process_with_timeout(
        &self,
        artifact: &Artifact,
        plan: &Arc<ExtractionPlan>,
    ) -> Result<ArtifactResult, SkipReason> {
        let timeout = self.config.artifact_timeout();
        let (sender, receiver) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let plan = Arc::clone(plan);
        let job = artifact.clone();
        let session = RunningSession::start(&self.running);

        thread::Builder::new()
            .name(format!("session-{}", artifact.project))
            .spawn(move || {
                // Locals drop in reverse order, so on unwind the session is
                // released before the receiver sees the channel close.
                let sender = sender;
                let session = session;
                let result = process_artifact(provider.as_ref(), &job, &plan);
                drop(session);
                // The receiver is gone once the driver has stopped waiting.
                let _ = sender.send(result);
            })
            .map_err(|e| SkipReason::WorkerUnavailable(e.to_string()))?;

        match receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SkipReason::TimedOut(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(SkipReason::WorkerPanicked),
        }
    }
}

/// Fail unless `root` is a readable directory.
fn check_root(root: &Path) -> Result<(), ConfigError> {
    let unreadable = |source: Option<std::io::Error>| ConfigError::UnreadableRoot {
        path: root.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(root).map_err(|e| unreadable(Some(e)))?;
    if !metadata.is_dir() {
        return Err(unreadable(None));
    }
    fs::read_dir(root).map_err(|e| unreadable(Some(e)))?;
    Ok(())
}
