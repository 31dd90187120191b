//! Report pipeline between `panreport-api` and its consumers.
//!
//! This crate owns everything between "which report?" and "file on disk":
//!
//! - **[`Session`]** — Explicit context object holding connection settings,
//!   the shared HTTP client, the [`ReportCache`] and the connectivity verdict.
//!   [`generate_report()`](Session::generate_report) resolves a report type
//!   through the [`EndpointRegistry`], fetches it and caches the payload.
//!
//! - **[`EndpointRegistry`]** — Static catalog of the 65 firewall report
//!   types, grouped into presentation [`Category`] values.
//!
//! - **[`Exporter`]** — Renders cached payloads as CSV tables or single-page
//!   PDF documents under the reports directory.
//!
//! - **Batch** ([`batch`]) — Fetches and exports many report types with at
//!   most [`MAX_CONCURRENT_REPORTS`] in flight, collecting per-item outcomes.
//!
//! - **Search / filter** ([`search`]) — Case-insensitive scans over cached
//!   payloads; filter results are kept as generation-tagged views.
//!
//! - **Artifacts** ([`artifacts`]) — Listing, history and deletion of
//!   exported files.

pub mod artifacts;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod registry;
pub mod search;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use artifacts::{HistoryEntry, ReportFile};
pub use batch::{
    BatchOutcome, BatchRequest, BatchSummary, ItemOutcome, MAX_CONCURRENT_REPORTS, ReportSource,
};
pub use cache::{FilteredView, ReportCache};
pub use config::{
    ConnectionSettings, DEFAULT_MAX_ROWS, ExportMode, SessionConfig, TlsVerification,
};
pub use error::CoreError;
pub use export::{ExportArtifact, ExportKind, Exporter};
pub use registry::{Category, EndpointDescriptor, EndpointRegistry, PROBE_REPORT_TYPE};
pub use search::{FilterResult, ReportMatches, SearchResult};
pub use session::{ConnectionStatus, PROBE_TTL, ProbeReport, Session, SettingsStore};

// Wire-level types callers need alongside the session.
pub use panreport_api::{DateRange, PayloadShape, ReportPayload};
