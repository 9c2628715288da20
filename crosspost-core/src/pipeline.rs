//! High-level pipeline: orchestrates discover → check → publish → file away.
//!
//! This module provides the top-level orchestration logic for one publishing
//! run over the input directory. It implements a coordinated pipeline that:
//!   - Discovers media items (and their sidecar captions) in the input directory
//!   - Checks each item against the content policy for every target platform
//!   - Publishes compliant items to each target via [`contract::Publisher`]
//!   - Files every item away exactly once (processed, quarantine or failed)
//!   - Aggregates and returns a report of what happened to each item.
//!
//! # Major Types
//! - [`Orchestrator`]: Owns the immutable config for a run; entrypoint [`Orchestrator::run`]
//! - [`RunReport`]: Output report with one [`ProcessingResult`] per item for downstream audit
//! - [`RunSummary`]: Counts derived from the report (total = published + quarantined + failed)
//!
//! # Responsibilities
//! - Per-item resilience: one rejected or failing item never stops the run;
//!   only an unreadable input directory or an empty target set is fatal
//! - Invokes logging throughout for traceability (see tracing events)
//! - Does not re-read config mid-run: all inputs are captured at construction
//!
//! # Callable From
//! - Used by both the CLI crate and integration tests
//! - Expects concrete (async) [`contract::Publisher`] implementations in the registry
//!
//! # Error Handling
//! Publish failures become per-platform [`PublishOutcome`] values, never early
//! returns. A failed file move is recorded on the item's result and logged;
//! the run continues with the next item.
//!
//! # Navigation
//! - Main entrypoint: [`Orchestrator::run`]
//! - Supporting types: [`ProcessingResult`], [`RunReport`], [`RunSummary`].

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::compliance::{ComplianceChecker, ComplianceResult};
use crate::config::{DirectoryConfig, PolicyConfig};
use crate::contract::{PublishError, PublishOutcome, PublishRequest, PublisherRegistry};
use crate::lifecycle::LifecycleManager;
use crate::media::{self, MediaItem};

/// Fatal pipeline failures. Everything else is recorded per item.
#[derive(Debug)]
pub enum PipelineError {
    InputDir { path: PathBuf, source: io::Error },
    NoTargets,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InputDir { path, source } => {
                write!(
                    f,
                    "IOError: cannot read input directory {}: {source}",
                    path.display()
                )
            }
            PipelineError::NoTargets => write!(
                f,
                "ConfigError: no target platforms configured and no publishers registered"
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Where an item ended up after its run through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    /// Published to at least one platform; moved to the processed directory.
    Processed,
    /// Rejected by the compliance gate; moved to quarantine.
    Quarantined,
    /// Compliant but rejected by every platform; moved to the failed directory.
    Failed,
}

/// Everything that happened to one media item during a run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub file_name: String,
    pub disposition: Disposition,
    /// Compliance reason when the item was quarantined.
    pub reason: Option<String>,
    /// Per-platform publish outcomes, keyed by platform name. Empty for
    /// quarantined items: nothing is ever published for them.
    pub outcomes: BTreeMap<String, PublishOutcome>,
    /// Set when the final file move itself failed; the file is still in the
    /// input directory and will be retried on the next run.
    pub lifecycle_error: Option<String>,
}

impl ProcessingResult {
    pub fn succeeded(&self) -> bool {
        self.disposition == Disposition::Processed
    }
}

/// Counts over a whole run. `total` always equals
/// `published + quarantined + failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub published: usize,
    pub quarantined: usize,
    pub failed: usize,
}

/// Output report for one run, one entry per discovered item in name order.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub results: Vec<ProcessingResult>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let published = self.results.iter().filter(|r| r.succeeded()).count();
        let quarantined = self
            .results
            .iter()
            .filter(|r| r.disposition == Disposition::Quarantined)
            .count();
        let failed = self
            .results
            .iter()
            .filter(|r| r.disposition == Disposition::Failed)
            .count();
        RunSummary {
            total: self.results.len(),
            published,
            quarantined,
            failed,
        }
    }

    /// True when anything in the run needs operator attention: a quarantined
    /// or failed item, or a file move that did not complete.
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| !r.succeeded() || r.lifecycle_error.is_some())
    }
}

/// Owns the immutable configuration for publishing runs.
///
/// Construction captures the policy, directory layout, target platforms and
/// the per-publish timeout; [`Orchestrator::run`] can then be called once per
/// batch without touching config again.
pub struct Orchestrator {
    checker: ComplianceChecker,
    lifecycle: LifecycleManager,
    input_dir: PathBuf,
    targets: Vec<String>,
    publish_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        policy: PolicyConfig,
        directories: &DirectoryConfig,
        targets: Vec<String>,
        publish_timeout: Duration,
    ) -> Orchestrator {
        Orchestrator {
            checker: ComplianceChecker::new(policy),
            lifecycle: LifecycleManager::new(directories),
            input_dir: directories.input.clone(),
            targets: targets.into_iter().map(|t| t.to_lowercase()).collect(),
            publish_timeout,
        }
    }

    /// Runs the pipeline once over the input directory.
    ///
    /// When no explicit targets were configured, every registered publisher is
    /// a target. Items are handled in file-name order, one at a time.
    pub async fn run(&self, registry: &PublisherRegistry) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();

        let targets: Vec<String> = if self.targets.is_empty() {
            registry.names()
        } else {
            self.targets.clone()
        };
        if targets.is_empty() {
            error!("[RUN][ERROR] No target platforms configured and no publishers registered");
            return Err(PipelineError::NoTargets);
        }

        info!(
            run_id = %run_id,
            input = %self.input_dir.display(),
            targets = ?targets,
            "[RUN] Starting publishing pipeline run"
        );

        let items = media::discover_media(&self.input_dir).map_err(|e| {
            error!(
                error = ?e,
                input = %self.input_dir.display(),
                "[RUN][ERROR] Cannot read input directory"
            );
            PipelineError::InputDir {
                path: self.input_dir.clone(),
                source: e,
            }
        })?;
        info!(count = items.len(), "[RUN] Discovered media items");

        let mut results: Vec<ProcessingResult> = Vec::new();
        for item in &items {
            let result = self.process_item(item, &targets, registry).await;
            match serde_json::to_string_pretty(&result) {
                Ok(json) => {
                    debug!(json = %json, file = %result.file_name, "[RUN][DEBUG] Item result as JSON")
                }
                Err(e) => {
                    error!(file = %result.file_name, error = ?e, "[RUN][DEBUG] Failed to serialize item result as JSON")
                }
            }
            results.push(result);
        }

        let report = RunReport { run_id, results };
        let summary = report.summary();
        info!(
            run_id = %run_id,
            total = summary.total,
            published = summary.published,
            quarantined = summary.quarantined,
            failed = summary.failed,
            "[RUN] Run complete"
        );
        Ok(report)
    }

    /// Handles one item end to end: gate, publish, file away.
    async fn process_item(
        &self,
        item: &MediaItem,
        targets: &[String],
        registry: &PublisherRegistry,
    ) -> ProcessingResult {
        let file_name = item.file_name();
        info!(file = %file_name, kind = ?item.kind, "[RUN] Processing media item");

        // --- Step 1: Compliance gate, per target platform ---
        if let Some(gate) = self.first_violation(item, targets) {
            info!(
                file = %file_name,
                reason = %gate.reason,
                "[RUN][GATE] Item rejected by compliance gate; quarantining"
            );
            let lifecycle_error = self
                .lifecycle
                .quarantine(item, &gate.reason)
                .err()
                .map(|e| {
                    error!(file = %file_name, error = %e, "[RUN][ERROR] Quarantine move failed");
                    e.to_string()
                });
            return ProcessingResult {
                file_name,
                disposition: Disposition::Quarantined,
                reason: Some(gate.reason),
                outcomes: BTreeMap::new(),
                lifecycle_error,
            };
        }

        // --- Step 2: Publish to each target ---
        let caption = item.effective_caption();
        let mut outcomes: BTreeMap<String, PublishOutcome> = BTreeMap::new();
        for platform in targets {
            let outcome = self.publish_one(item, &caption, platform, registry).await;
            outcomes.insert(platform.clone(), outcome);
        }

        // --- Step 3: File the item away by what the platforms said ---
        let any_success = outcomes.values().any(|o| o.success);
        let (disposition, moved) = if any_success {
            (Disposition::Processed, self.lifecycle.move_to_processed(item))
        } else {
            warn!(file = %file_name, "[RUN] No platform accepted the upload; filing as failed");
            (Disposition::Failed, self.lifecycle.move_to_failed(item, &outcomes))
        };
        let lifecycle_error = moved.err().map(|e| {
            error!(file = %file_name, error = %e, "[RUN][ERROR] File move failed after publishing");
            e.to_string()
        });

        ProcessingResult {
            file_name,
            disposition,
            reason: None,
            outcomes,
            lifecycle_error,
        }
    }

    /// Returns the first non-compliant result over `targets`, in target order.
    fn first_violation(&self, item: &MediaItem, targets: &[String]) -> Option<ComplianceResult> {
        for platform in targets {
            let result = self.checker.check_media_compliance(item, platform);
            if !result.compliant {
                return Some(result);
            }
        }
        None
    }

    /// One publish attempt against one platform, bounded by the configured
    /// timeout. Never returns an error: failures become outcomes.
    async fn publish_one(
        &self,
        item: &MediaItem,
        caption: &str,
        platform: &str,
        registry: &PublisherRegistry,
    ) -> PublishOutcome {
        let publisher = match registry.get(platform) {
            Some(publisher) => publisher,
            None => {
                let e = PublishError::UnknownPlatform(platform.to_string());
                warn!(platform = platform, "[RUN][PUBLISH] Configured target has no registered publisher");
                return PublishOutcome::failed(platform, e.to_string());
            }
        };

        info!(file = %item.file_name(), platform = platform, "[RUN][PUBLISH] Publishing media item");
        let request = PublishRequest {
            path: &item.path,
            kind: item.kind,
            caption,
        };
        match timeout(self.publish_timeout, publisher.publish(request)).await {
            Ok(Ok(receipt)) => {
                info!(
                    file = %item.file_name(),
                    platform = platform,
                    post_id = %receipt.post_id,
                    "[RUN][PUBLISH] Publish succeeded"
                );
                PublishOutcome::succeeded(platform, receipt.post_id)
            }
            Ok(Err(e)) => {
                error!(
                    file = %item.file_name(),
                    platform = platform,
                    error = %e,
                    "[RUN][ERROR] Publish failed"
                );
                PublishOutcome::failed(platform, e.to_string())
            }
            Err(_) => {
                let e = PublishError::Timeout(self.publish_timeout.as_secs());
                error!(
                    file = %item.file_name(),
                    platform = platform,
                    error = %e,
                    "[RUN][ERROR] Publish timed out"
                );
                PublishOutcome::failed(platform, e.to_string())
            }
        }
    }
}
