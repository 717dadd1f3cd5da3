//! Harvest stage driver.
//!
//! This module provides the [`HarvestPipeline`] coordinator that runs one
//! harvest source through its stages (Enumerate → Fetch → Normalize → Import)
//! with:
//! - Async execution via `tokio`
//! - A per-fetch timeout
//! - Per-identifier failure isolation
//! - Bounded concurrency and cancellation via [`HarvesterExecutor`]
//! - Structured logging via `tracing`

use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::HarvesterConfig;
use crate::executor::HarvesterExecutor;
use crate::harvest::normalize::PackageNormalizer;
use crate::harvest::traits::{HarvestStage, ItemFailure};
use crate::model::CatalogIdentifier;
use crate::traits::{CatalogClient, FetchError, HarvestSink, SourceFailure};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Outcome of one source run.
///
/// Every enumerated identifier appears in exactly one of `imported`,
/// `failures` or `skipped`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRunReport {
    /// Base URL of the harvested catalog
    pub source: String,

    /// Number of distinct identifiers returned by enumeration
    pub enumerated: usize,

    /// Identifiers whose package reached the sink
    pub imported: Vec<CatalogIdentifier>,

    /// Identifiers that failed at fetch, normalize or import
    pub failures: Vec<ItemFailure>,

    /// Identifiers never started because the run was cancelled
    pub skipped: Vec<CatalogIdentifier>,

    /// Whether cancellation was requested during the run
    pub cancelled: bool,

    pub stats: HarvestStats,
}

impl SourceRunReport {
    fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            enumerated: 0,
            imported: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            cancelled: false,
            stats: HarvestStats::default(),
        }
    }

    /// `(identifier, reason)` for every failed identifier.
    pub fn failure_reasons(&self) -> Vec<(&CatalogIdentifier, &str)> {
        self.failures
            .iter()
            .map(|f| (&f.identifier, f.reason.as_str()))
            .collect()
    }
}

/// Timing for one source run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct HarvestStats {
    /// Total time spent on the run (milliseconds)
    pub total_duration_ms: u64,

    /// Time spent enumerating identifiers (milliseconds)
    pub gather_duration_ms: u64,

    /// Time spent fetching, normalizing and importing (milliseconds)
    pub items_duration_ms: u64,
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Drives one harvest source from enumeration to import.
///
/// # Failure isolation
///
/// Enumeration failure aborts the run (there is nothing to iterate). Any
/// failure after that is recorded against its identifier through
/// [`HarvestSink::save_object_error`] and the run moves on. Each identifier is
/// fetched at most once per run.
///
/// # Example
///
/// ```ignore
/// use dkan_harvester::{DkanClient, HarvestPipeline, HttpContentSource, MemorySink};
///
/// let pipeline = HarvestPipeline::new(
///     DkanClient::new(HttpContentSource::new(&config)?),
///     PackageNormalizer::new(Arc::new(config.license_registry()?)),
///     MemorySink::new(),
/// )
/// .with_config(&config);
///
/// let report = pipeline.run_source("https://data.example.gov").await?;
/// println!("imported {} packages", report.imported.len());
/// ```
pub struct HarvestPipeline<C, S>
where
    C: CatalogClient,
    S: HarvestSink,
{
    client: C,
    normalizer: PackageNormalizer,
    sink: S,
    executor: HarvesterExecutor,

    /// Upper bound for one fetch (default: 30 seconds)
    fetch_timeout: Duration,
}

impl<C, S> HarvestPipeline<C, S>
where
    C: CatalogClient,
    S: HarvestSink,
{
    /// Creates a sequential pipeline with a 30 second fetch timeout.
    pub fn new(client: C, normalizer: PackageNormalizer, sink: S) -> Self {
        Self {
            client,
            normalizer,
            sink,
            executor: HarvesterExecutor::default(),
            fetch_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Number of identifiers processed at the same time.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.executor = HarvesterExecutor::new(limit);
        self
    }

    pub fn with_config(self, config: &HarvesterConfig) -> Self {
        self.with_timeout(config.request_timeout())
            .with_concurrency(config.concurrency)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Harvests every package of the source at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceFailure`] only when enumeration fails. Per-package
    /// failures are reported in [`SourceRunReport::failures`].
    pub async fn run_source(&self, base_url: &str) -> Result<SourceRunReport, SourceFailure> {
        self.run_source_cancellable(base_url, CancellationToken::new())
            .await
    }

    /// Same as [`run_source`](Self::run_source), but stops issuing new
    /// fetches once `cancel` fires. Items already in flight finish normally;
    /// the rest are reported as skipped.
    #[instrument(skip(self, cancel))]
    pub async fn run_source_cancellable(
        &self,
        base_url: &str,
        cancel: CancellationToken,
    ) -> Result<SourceRunReport, SourceFailure> {
        let start = Instant::now();
        let mut report = SourceRunReport::empty(base_url);

        if cancel.is_cancelled() {
            info!("Run cancelled before enumeration");
            report.cancelled = true;
            return Ok(report);
        }

        // ====================================================================
        // Stage 1: Enumerate
        // ====================================================================

        info!("Starting enumeration stage");
        let ids = match self.client.enumerate(base_url).await {
            Ok(ids) => dedupe(ids),
            Err(e) => {
                warn!(error = %e, "Enumeration failed, aborting source");
                self.sink.save_gather_error(base_url, &e.to_string()).await;
                return Err(e);
            }
        };

        report.enumerated = ids.len();
        report.stats.gather_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            count = report.enumerated,
            duration_ms = report.stats.gather_duration_ms,
            "Enumeration completed"
        );

        // ====================================================================
        // Stage 2: Fetch → Normalize → Import, per identifier
        // ====================================================================

        let items_start = Instant::now();
        let outcomes = futures::future::join_all(ids.iter().map(|id| {
            self.executor
                .execute(id, &cancel, self.harvest_one(base_url, id))
        }))
        .await;

        for (id, outcome) in ids.into_iter().zip(outcomes) {
            match outcome {
                Some(Ok(())) => report.imported.push(id),
                Some(Err(failure)) => report.failures.push(failure),
                None => report.skipped.push(id),
            }
        }

        report.cancelled = cancel.is_cancelled();
        report.stats.items_duration_ms = items_start.elapsed().as_millis() as u64;
        report.stats.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            imported = report.imported.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            duration_ms = report.stats.total_duration_ms,
            "Source run completed"
        );

        Ok(report)
    }

    /// Runs one identifier through fetch, normalize and import, recording
    /// any failure with the sink.
    async fn harvest_one(&self, base_url: &str, id: &CatalogIdentifier) -> Result<(), ItemFailure> {
        let result = self.try_harvest_one(base_url, id).await;
        if let Err(failure) = &result {
            warn!(identifier = %id, stage = %failure.stage, reason = %failure.reason, "Package failed");
            self.sink.save_object_error(id, &failure.reason).await;
        }
        result
    }

    async fn try_harvest_one(
        &self,
        base_url: &str,
        id: &CatalogIdentifier,
    ) -> Result<(), ItemFailure> {
        let record = timeout(self.fetch_timeout, self.client.fetch_one(base_url, id))
            .await
            .unwrap_or(Err(FetchError::Timeout {
                timeout: self.fetch_timeout,
            }))
            .map_err(|e| ItemFailure::fetch(id.clone(), &e))?;

        debug!(identifier = %id, stage = self.normalizer.stage_name(), "Fetched package");
        let package = self
            .normalizer
            .execute(record)
            .map_err(|e| ItemFailure::normalize(id.clone(), &e))?;

        self.sink
            .import_package(id, package)
            .await
            .map_err(|e| ItemFailure::import(id.clone(), &e))
    }
}

/// Drops repeated identifiers, keeping first occurrences in order.
fn dedupe(ids: Vec<CatalogIdentifier>) -> Vec<CatalogIdentifier> {
    let mut seen = HashSet::with_capacity(ids.len());
    let before = ids.len();
    let unique: Vec<_> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if unique.len() != before {
        warn!(
            duplicates = before - unique.len(),
            "Enumeration returned duplicate identifiers"
        );
    }
    unique
}

// ============================================================================
// Tests
// ============================================================================
