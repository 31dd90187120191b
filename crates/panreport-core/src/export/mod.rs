// ── Export engine ──
//
// Turns a cached payload into a file under the reports directory. Rendering
// happens in memory first so a shape error never leaves an empty artifact
// behind; the file is then claimed with `create_new`, which makes
// same-second exports of one report type land in distinct files.

mod document;
mod tabular;
pub mod value;

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use panreport_api::{PayloadShape, ReportPayload};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ExportMode;
use crate::error::CoreError;

pub use value::{TIMESTAMP_FORMAT, render_value};

/// Value of the `Source` metadata row.
pub const SOURCE_TAG: &str = "panreport";

/// Timestamp embedded in artifact file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Give up after this many same-second name collisions.
const MAX_NAME_ATTEMPTS: u32 = 1000;

// ── ExportKind ───────────────────────────────────────────────────────

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    /// Spreadsheet-oriented CSV.
    #[serde(rename = "csv")]
    Tabular,
    /// Single-page PDF.
    #[serde(rename = "pdf")]
    Document,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tabular => "csv",
            Self::Document => "pdf",
        }
    }

    /// Kind implied by a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Tabular),
            "pdf" => Some(Self::Document),
            _ => None,
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(Self::Tabular),
            "pdf" | "document" => Ok(Self::Document),
            _ => Err(CoreError::validation(format!(
                "invalid format {s:?}: must be 'csv' or 'pdf'"
            ))),
        }
    }
}

// ── ExportArtifact ───────────────────────────────────────────────────

/// A file written by the exporter.
#[derive(Debug, Clone, Serialize)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub kind: ExportKind,
    pub created_at: DateTime<Local>,
}

// ── Rendering internals ──────────────────────────────────────────────

/// Per-export rendering parameters.
#[derive(Debug, Clone)]
pub(crate) struct Rendering {
    pub max_rows: usize,
    pub mode: ExportMode,
    /// Human-readable generation time.
    pub generated: String,
    pub source: &'static str,
}

#[derive(Debug)]
pub(crate) enum RenderError {
    Shape(PayloadShape),
    Io(io::Error),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RenderError {
    fn from(err: csv::Error) -> Self {
        Self::Io(err.into())
    }
}

// ── Exporter ─────────────────────────────────────────────────────────

/// Writes artifacts into one reports directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    reports_dir: PathBuf,
    max_rows: usize,
    mode: ExportMode,
}

impl Exporter {
    pub fn new(reports_dir: impl Into<PathBuf>, max_rows: usize, mode: ExportMode) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            max_rows,
            mode,
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Render `payload` and write it as `{name}_{YYYYMMDD_HHMMSS}.{ext}`.
    pub fn export(
        &self,
        name: &str,
        payload: &ReportPayload,
        kind: ExportKind,
    ) -> Result<ExportArtifact, CoreError> {
        let now = Local::now();
        let rendering = Rendering {
            max_rows: self.max_rows,
            mode: self.mode,
            generated: now.format(TIMESTAMP_FORMAT).to_string(),
            source: SOURCE_TAG,
        };

        let rendered = match kind {
            ExportKind::Tabular => {
                let mut buf = Vec::new();
                tabular::write_tabular(&mut buf, payload, &rendering).map(|()| buf)
            }
            ExportKind::Document => document::render_document(name, payload, &rendering),
        };
        let bytes = rendered.map_err(|err| match err {
            RenderError::Shape(shape) => CoreError::UnsupportedShape {
                operation: format!("{kind} export"),
                shape,
            },
            RenderError::Io(source) => CoreError::persistence(self.reports_dir.join(name), source),
        })?;

        let stem = format!("{name}_{}", now.format(FILE_TIMESTAMP_FORMAT));
        let (path, mut file) = reserve_path(&self.reports_dir, &stem, kind.extension())?;
        if let Err(source) = file.write_all(&bytes).and_then(|()| file.flush()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(CoreError::persistence(path, source));
        }

        info!(
            report_type = name,
            path = %path.display(),
            bytes = bytes.len(),
            "report exported"
        );
        Ok(ExportArtifact {
            path,
            kind,
            created_at: now,
        })
    }

    /// [`export`](Self::export) on the blocking pool.
    pub async fn export_blocking(
        &self,
        name: String,
        payload: Arc<ReportPayload>,
        kind: ExportKind,
    ) -> Result<ExportArtifact, CoreError> {
        let exporter = self.clone();
        tokio::task::spawn_blocking(move || exporter.export(&name, &payload, kind))
            .await
            .map_err(|e| CoreError::Internal(format!("export task failed: {e}")))?
    }
}

/// Create the directory if needed and claim the first free file name.
fn reserve_path(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File), CoreError> {
    fs::create_dir_all(dir).map_err(|e| CoreError::persistence(dir, e))?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let file_name = if attempt == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}_{attempt}.{ext}")
        };
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "artifact name taken, trying next suffix");
            }
            Err(e) => return Err(CoreError::persistence(path, e)),
        }
    }

    Err(CoreError::persistence(
        dir.join(format!("{stem}.{ext}")),
        io::Error::new(io::ErrorKind::AlreadyExists, "no free artifact name"),
    ))
}
