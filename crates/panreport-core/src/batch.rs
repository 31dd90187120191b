// ── Batch orchestrator ──
//
// Fetches and exports many report types concurrently. One task per type,
// admission gated by a semaphore whose permit is held for the whole
// fetch + export cycle. Tasks report through an mpsc channel to a single
// aggregator, so per-item failures become data instead of aborting the run.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use panreport_api::{DateRange, ReportPayload};
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::export::{ExportArtifact, ExportKind, Exporter};

/// Upper bound on report types in flight at once.
pub const MAX_CONCURRENT_REPORTS: usize = 3;

/// Anything that can produce a payload for a report type.
///
/// The session implements this against the live gateway; tests substitute
/// canned sources.
pub trait ReportSource: Clone + Send + Sync + 'static {
    fn fetch_report(
        &self,
        report_type: &str,
        range: Option<&DateRange>,
    ) -> impl Future<Output = Result<Arc<ReportPayload>, CoreError>> + Send;
}

// ── Request ──────────────────────────────────────────────────────────

/// A validated batch request.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    report_types: Vec<String>,
    format: ExportKind,
    date_range: Option<DateRange>,
}

impl BatchRequest {
    /// Validate inputs before any work starts.
    ///
    /// Duplicate report types collapse to their first occurrence.
    pub fn new<I, S>(
        report_types: I,
        format: &str,
        date_range: Option<DateRange>,
    ) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let report_types: IndexSet<String> = report_types.into_iter().map(Into::into).collect();
        if report_types.is_empty() {
            return Err(CoreError::validation("no report types provided"));
        }
        let format = match format {
            "csv" => ExportKind::Tabular,
            "pdf" => ExportKind::Document,
            other => {
                return Err(CoreError::validation(format!(
                    "invalid format {other:?}: must be 'csv' or 'pdf'"
                )));
            }
        };
        Ok(Self {
            report_types: report_types.into_iter().collect(),
            format,
            date_range,
        })
    }

    pub fn report_types(&self) -> &[String] {
        &self.report_types
    }

    pub fn format(&self) -> ExportKind {
        self.format
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }
}

// ── Outcome ──────────────────────────────────────────────────────────

/// Result for one report type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    fn exported(artifact: ExportArtifact) -> Self {
        Self {
            success: true,
            path: Some(artifact.path),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            path: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub format: ExportKind,
    pub date_range: Option<DateRange>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub results: BTreeMap<String, ItemOutcome>,
    #[serde(rename = "_summary")]
    pub summary: BatchSummary,
}

// ── Orchestration ────────────────────────────────────────────────────

/// Run a batch to completion. Never fails as a whole.
pub async fn run_batch<S: ReportSource>(
    source: S,
    exporter: Exporter,
    request: BatchRequest,
) -> BatchOutcome {
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_REPORTS));
    let (tx, mut rx) = mpsc::channel::<(String, ItemOutcome)>(request.report_types.len());
    let mut tasks = JoinSet::new();

    info!(
        count = request.report_types.len(),
        format = %request.format,
        "starting batch"
    );

    for report_type in &request.report_types {
        let source = source.clone();
        let exporter = exporter.clone();
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        let report_type = report_type.clone();
        let range = request.date_range.clone();
        let kind = request.format;

        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    match fetch_and_export(&source, &exporter, &report_type, range.as_ref(), kind)
                        .await
                    {
                        Ok(artifact) => ItemOutcome::exported(artifact),
                        Err(e) => {
                            warn!(report_type = %report_type, error = %e, "batch item failed");
                            ItemOutcome::failed(e.to_string())
                        }
                    }
                }
                Err(_) => ItemOutcome::failed("batch scheduler closed"),
            };
            let _ = tx.send((report_type, outcome)).await;
        });
    }
    drop(tx);

    let mut results = BTreeMap::new();
    while let Some((report_type, outcome)) = rx.recv().await {
        results.insert(report_type, outcome);
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "batch task ended abnormally");
        }
    }

    for report_type in &request.report_types {
        results
            .entry(report_type.clone())
            .or_insert_with(|| ItemOutcome::failed("task ended before reporting an outcome"));
    }

    let successful = results.values().filter(|o| o.success).count();
    let summary = BatchSummary {
        total: request.report_types.len(),
        successful,
        failed: results.len() - successful,
        format: request.format,
        date_range: request.date_range,
        timestamp: Utc::now(),
    };
    info!(
        total = summary.total,
        successful = summary.successful,
        failed = summary.failed,
        "batch complete"
    );

    BatchOutcome { results, summary }
}

async fn fetch_and_export<S: ReportSource>(
    source: &S,
    exporter: &Exporter,
    report_type: &str,
    range: Option<&DateRange>,
    kind: ExportKind,
) -> Result<ExportArtifact, CoreError> {
    let payload = source.fetch_report(report_type, range).await?;
    debug!(report_type, "fetched, exporting");
    exporter
        .export_blocking(report_type.to_owned(), payload, kind)
        .await
}
