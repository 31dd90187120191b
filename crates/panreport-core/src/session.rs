// ── Session ──
//
// The explicit context object for one user of the pipeline: connection
// settings, the shared HTTP client, the report cache and the cached
// connectivity verdict. Cheaply cloneable; batch tasks each hold a clone.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use panreport_api::{DateRange, GatewayClient, ReportPayload, TlsMode, TransportConfig};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::batch::{self, BatchOutcome, BatchRequest, ReportSource};
use crate::cache::ReportCache;
use crate::config::{ConnectionSettings, ExportMode, SessionConfig, TlsVerification};
use crate::error::CoreError;
use crate::export::{ExportArtifact, ExportKind, Exporter};
use crate::registry::{EndpointRegistry, PROBE_REPORT_TYPE};
use crate::search::{self, FilterResult, SearchResult};

/// How long a connectivity verdict stays valid.
pub const PROBE_TTL: Duration = Duration::from_secs(5 * 60);

/// Persists connection settings on behalf of the session.
pub trait SettingsStore: Send + Sync {
    fn save(&self, settings: &ConnectionSettings) -> Result<(), CoreError>;
}

// ── ConnectionStatus ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    /// Not probed since the settings last changed.
    Unknown,
    Unconfigured,
    Connected,
    Error,
}

/// Answer to a connectivity probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub status: ConnectionStatus,
    pub message: String,
    /// The verdict came from the cache, not the network.
    pub cached: bool,
}

#[derive(Debug, Clone)]
struct ProbeVerdict {
    status: ConnectionStatus,
    message: String,
    checked_at: Instant,
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    settings: RwLock<ConnectionSettings>,
    http: reqwest::Client,
    timeout: Duration,
    reports_dir: PathBuf,
    registry: &'static EndpointRegistry,
    cache: ReportCache,
    probe: Mutex<Option<ProbeVerdict>>,
}

impl Session {
    /// Build a session. Does no I/O beyond reading a custom CA file.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let tls = match config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: config.timeout,
        };
        let http = transport.build_client()?;

        Ok(Self {
            inner: Arc::new(SessionInner {
                settings: RwLock::new(config.settings),
                http,
                timeout: config.timeout,
                reports_dir: config.reports_dir,
                registry: EndpointRegistry::builtin(),
                cache: ReportCache::new(),
                probe: Mutex::new(None),
            }),
        })
    }

    pub fn registry(&self) -> &'static EndpointRegistry {
        self.inner.registry
    }

    pub fn cache(&self) -> &ReportCache {
        &self.inner.cache
    }

    pub fn reports_dir(&self) -> &Path {
        &self.inner.reports_dir
    }

    /// Snapshot of the current settings.
    pub async fn settings(&self) -> ConnectionSettings {
        self.inner.settings.read().await.clone()
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Persist and adopt new settings; the connectivity verdict resets.
    pub async fn save_settings(
        &self,
        store: &dyn SettingsStore,
        settings: ConnectionSettings,
    ) -> Result<(), CoreError> {
        store.save(&settings)?;
        *self.inner.settings.write().await = settings;
        *self.inner.probe.lock().await = None;
        info!("settings saved, connection status reset");
        Ok(())
    }

    /// Update export preferences only.
    ///
    /// A `max_rows` of `None` or zero keeps the current cap.
    pub async fn set_report_config(
        &self,
        store: &dyn SettingsStore,
        max_rows: Option<usize>,
        format: Option<ExportMode>,
    ) -> Result<(), CoreError> {
        let mut settings = self.inner.settings.write().await;
        let mut updated = settings.clone();
        if let Some(rows) = max_rows.filter(|&rows| rows > 0) {
            updated.max_rows = rows;
        }
        if let Some(format) = format {
            updated.format = format;
        }
        store.save(&updated)?;
        *settings = updated;
        debug!(max_rows = settings.max_rows, format = %settings.format, "report config updated");
        Ok(())
    }

    // ── Connectivity ─────────────────────────────────────────────────

    pub async fn connection_status(&self) -> ConnectionStatus {
        if !self.inner.settings.read().await.is_configured() {
            return ConnectionStatus::Unconfigured;
        }
        self.inner
            .probe
            .lock()
            .await
            .as_ref()
            .map_or(ConnectionStatus::Unknown, |v| v.status)
    }

    /// Probe the firewall, reusing a verdict younger than [`PROBE_TTL`].
    ///
    /// Settings are read under the probe lock, so a concurrent
    /// [`save_settings`](Self::save_settings) either precedes the probe or
    /// clears its verdict afterwards.
    pub async fn test_connection(&self) -> ProbeReport {
        let mut probe = self.inner.probe.lock().await;
        let settings = self.settings().await;
        if !settings.is_configured() {
            return ProbeReport {
                status: ConnectionStatus::Unconfigured,
                message: CoreError::Unconfigured.to_string(),
                cached: false,
            };
        }

        if let Some(verdict) = probe.as_ref() {
            if verdict.checked_at.elapsed() < PROBE_TTL {
                debug!(status = %verdict.status, "using cached connection status");
                return ProbeReport {
                    status: verdict.status,
                    message: verdict.message.clone(),
                    cached: true,
                };
            }
        }

        let result = self.probe(&settings).await;
        let verdict = match result {
            Ok(()) => ProbeVerdict {
                status: ConnectionStatus::Connected,
                message: "API connection successful".into(),
                checked_at: Instant::now(),
            },
            Err(e) => {
                warn!(error = %e, "connection probe failed");
                ProbeVerdict {
                    status: ConnectionStatus::Error,
                    message: format!("API connection failed: {e}"),
                    checked_at: Instant::now(),
                }
            }
        };
        let report = ProbeReport {
            status: verdict.status,
            message: verdict.message.clone(),
            cached: false,
        };
        *probe = Some(verdict);
        report
    }

    // ── Reports ──────────────────────────────────────────────────────

    /// Fetch one report type and cache the payload.
    pub async fn generate_report(
        &self,
        report_type: &str,
        range: Option<&DateRange>,
    ) -> Result<Arc<ReportPayload>, CoreError> {
        let settings = self.settings().await;
        if !settings.is_configured() {
            return Err(CoreError::Unconfigured);
        }
        let path = self.inner.registry.resolve(report_type)?;
        let client = self.gateway(&settings)?;

        info!(report_type, ranged = range.is_some(), "generating report");
        let payload = client.fetch(path, range).await?;
        debug!(report_type, shape = %payload.shape(), "report fetched");

        let payload = Arc::new(payload);
        self.inner.cache.put(report_type, Arc::clone(&payload));
        Ok(payload)
    }

    /// Export the cached payload of `report_type`.
    pub async fn export(
        &self,
        report_type: &str,
        kind: ExportKind,
    ) -> Result<ExportArtifact, CoreError> {
        let payload = self.inner.cache.get(report_type)?;
        self.exporter()
            .await
            .export_blocking(report_type.to_owned(), payload, kind)
            .await
    }

    pub fn search(&self, term: &str) -> Result<SearchResult, CoreError> {
        search::search(&self.inner.cache, term)
    }

    pub fn filter(
        &self,
        report_type: &str,
        filters: &BTreeMap<String, String>,
    ) -> Result<FilterResult, CoreError> {
        search::filter(&self.inner.cache, report_type, filters)
    }

    /// Export the current filtered view of `report_type`.
    pub async fn export_filtered(
        &self,
        report_type: &str,
        kind: ExportKind,
    ) -> Result<ExportArtifact, CoreError> {
        let view = self.inner.cache.view(report_type)?;
        self.exporter()
            .await
            .export_blocking(view.name(), Arc::new(view.payload()), kind)
            .await
    }

    /// Fetch and export every report type in `request`.
    pub async fn run_batch(&self, request: BatchRequest) -> BatchOutcome {
        let exporter = self.exporter().await;
        batch::run_batch(self.clone(), exporter, request).await
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn probe(&self, settings: &ConnectionSettings) -> Result<(), CoreError> {
        let client = self.gateway(settings)?;
        let path = self.inner.registry.resolve(PROBE_REPORT_TYPE)?;
        client.fetch(path, None).await?;
        Ok(())
    }

    async fn exporter(&self) -> Exporter {
        let settings = self.inner.settings.read().await;
        Exporter::new(&self.inner.reports_dir, settings.max_rows, settings.format)
    }

    fn gateway(&self, settings: &ConnectionSettings) -> Result<GatewayClient, CoreError> {
        Ok(GatewayClient::with_client(
            self.inner.http.clone(),
            &settings.base_url,
            settings.api_key.clone(),
            self.inner.timeout,
        )?)
    }
}

impl ReportSource for Session {
    fn fetch_report(
        &self,
        report_type: &str,
        range: Option<&DateRange>,
    ) -> impl Future<Output = Result<Arc<ReportPayload>, CoreError>> + Send {
        self.generate_report(report_type, range)
    }
}
