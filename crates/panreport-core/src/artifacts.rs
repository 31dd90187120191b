// ── Artifact catalog ──
//
// Read-side view of the reports directory: what has been exported, when,
// and for which report type. The file system is the only record; ordering
// uses modification time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::export::ExportKind;

/// An exported file.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub name: String,
    pub path: PathBuf,
    pub kind: ExportKind,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// A [`ReportFile`] annotated with the report type it was exported from.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// File stem, unique within the directory.
    pub id: String,
    pub report_type: String,
    pub format: ExportKind,
    pub file_name: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub created_at: DateTime<Local>,
}

/// Exported reports in `dir`, newest first. Creates `dir` if missing.
pub fn list_reports(dir: &Path) -> Result<Vec<ReportFile>, CoreError> {
    fs::create_dir_all(dir).map_err(|e| CoreError::persistence(dir, e))?;

    let mut reports = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CoreError::persistence(dir, e))? {
        let entry = entry.map_err(|e| CoreError::persistence(dir, e))?;
        let path = entry.path();
        let Some(kind) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ExportKind::from_extension)
        else {
            continue;
        };
        let metadata = entry
            .metadata()
            .map_err(|e| CoreError::persistence(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map_err(|e| CoreError::persistence(&path, e))?;

        reports.push(ReportFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            kind,
            size: metadata.len(),
            modified: modified.into(),
        });
    }

    reports.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
    debug!(dir = %dir.display(), count = reports.len(), "listed reports");
    Ok(reports)
}

/// Delete one exported report.
///
/// Only `.csv` / `.pdf` files directly inside `dir` are accepted.
pub fn delete_report(dir: &Path, path: &Path) -> Result<(), CoreError> {
    if ExportKind::from_extension(
        path.extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default(),
    )
    .is_none()
    {
        return Err(CoreError::validation(format!(
            "{} is not a report file",
            path.display()
        )));
    }

    let dir = dir
        .canonicalize()
        .map_err(|e| CoreError::persistence(dir, e))?;
    let target = path
        .canonicalize()
        .map_err(|e| CoreError::persistence(path, e))?;
    if target.parent() != Some(dir.as_path()) {
        return Err(CoreError::validation(format!(
            "{} is outside the reports directory",
            path.display()
        )));
    }

    fs::remove_file(&target).map_err(|e| CoreError::persistence(&target, e))?;
    info!(path = %target.display(), "report deleted");
    Ok(())
}

/// [`list_reports`] enriched with ids and report types.
pub fn report_history(dir: &Path) -> Result<Vec<HistoryEntry>, CoreError> {
    Ok(list_reports(dir)?
        .into_iter()
        .map(|report| {
            let id = Path::new(&report.name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| report.name.clone());
            HistoryEntry {
                report_type: parse_report_type(&id).to_owned(),
                id,
                format: report.kind,
                file_name: report.name,
                file_path: report.path,
                file_size: report.size,
                created_at: report.modified,
            }
        })
        .collect())
}

/// Recover the report type from a `{type}_{YYYYMMDD}_{HHMMSS}[_{n}]` stem.
///
/// Stems that don't follow the scheme yield their first `_` segment.
pub fn parse_report_type(stem: &str) -> &str {
    let parts: Vec<&str> = stem.split('_').collect();
    let is_digits = |s: &str, len: Option<usize>| {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && len.is_none_or(|l| s.len() == l)
    };

    for date_at in (1..parts.len().saturating_sub(1)).rev() {
        let rest = &parts[date_at..];
        let shaped = match rest {
            [date, time] => is_digits(date, Some(8)) && is_digits(time, Some(6)),
            [date, time, n] => {
                is_digits(date, Some(8)) && is_digits(time, Some(6)) && is_digits(n, None)
            }
            _ => false,
        };
        if shaped {
            let type_len = parts[..date_at].iter().map(|p| p.len() + 1).sum::<usize>() - 1;
            return &stem[..type_len];
        }
    }

    parts.first().copied().unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn parse_report_type_variants() {
        assert_eq!(parse_report_type("securityRules_20240601_120000"), "securityRules");
        assert_eq!(parse_report_type("securityRules_20240601_120000_2"), "securityRules");
        assert_eq!(
            parse_report_type("traffic_filtered_20240601_120000"),
            "traffic_filtered"
        );
        assert_eq!(parse_report_type("notes_draft"), "notes");
        assert_eq!(parse_report_type("plain"), "plain");
    }

    #[test]
    fn list_only_report_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zones_20240601_120000.csv"), b"a").unwrap();
        fs::write(dir.path().join("systemInfo_20240601_120001.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("readme.txt"), b"ignore").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let reports = list_reports(dir.path()).unwrap();
        let mut names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["systemInfo_20240601_120001.pdf", "zones_20240601_120000.csv"]
        );
    }

    #[test]
    fn list_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let reports_dir = dir.path().join("Reports");
        assert!(list_reports(&reports_dir).unwrap().is_empty());
        assert!(reports_dir.is_dir());
    }

    #[test]
    fn history_carries_ids_and_types() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("natRules_20240601_120000_1.csv"), b"x").unwrap();

        let history = report_history(dir.path()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "natRules_20240601_120000_1");
        assert_eq!(history[0].report_type, "natRules");
        assert_eq!(history[0].format, ExportKind::Tabular);
        assert_eq!(history[0].file_size, 1);
    }

    #[test]
    fn delete_removes_report() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("zones_20240601_120000.csv");
        fs::write(&file, b"a").unwrap();

        delete_report(dir.path(), &file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn delete_refuses_foreign_files() {
        let dir = TempDir::new().unwrap();
        let reports = dir.path().join("Reports");
        fs::create_dir(&reports).unwrap();

        let outside = dir.path().join("zones.csv");
        fs::write(&outside, b"a").unwrap();
        let err = delete_report(&reports, &outside).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(outside.exists());

        let not_report = reports.join("settings.json");
        fs::write(&not_report, b"{}").unwrap();
        let err = delete_report(&reports, &not_report).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }
}
