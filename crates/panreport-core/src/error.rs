// ── Core error types ──
//
// User-facing errors from panreport-core. Consumers never see reqwest or
// serde failures directly: the `From<panreport_api::Error>` impl translates
// wire-level errors into the report pipeline's taxonomy.

use std::io;
use std::path::PathBuf;

use panreport_api::PayloadShape;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("API URL and key must be configured first")]
    Unconfigured,

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Transport errors ─────────────────────────────────────────────
    #[error("Cannot reach API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API returned error status: {status}")]
    Status { status: u16, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Error parsing response: {message}")]
    Decode { message: String },

    #[error("Unknown report type: {report_type}")]
    UnknownReportType { report_type: String },

    #[error("No data available for report type: {report_type}")]
    NoData { report_type: String },

    #[error("Unsupported data shape for {operation}: {shape}")]
    UnsupportedShape {
        operation: String,
        shape: PayloadShape,
    },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("I/O error on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // ── Credential errors ────────────────────────────────────────────
    #[error("Credential error: {message}")]
    Crypto { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn no_data(report_type: impl Into<String>) -> Self {
        Self::NoData {
            report_type: report_type.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<panreport_api::Error> for CoreError {
    fn from(err: panreport_api::Error) -> Self {
        match err {
            panreport_api::Error::Unconfigured => CoreError::Unconfigured,
            panreport_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            // Timeouts arrive as `Error::Timeout` with the configured limit.
            panreport_api::Error::Transport(ref e) => {
                if let Some(status) = e.status() {
                    CoreError::Status {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.origin().ascii_serialization())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            panreport_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            panreport_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            panreport_api::Error::Status { status, body } => CoreError::Status {
                status,
                message: body,
            },
            panreport_api::Error::Decode { message } => CoreError::Decode { message },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_keeps_code_and_body() {
        let err: CoreError = panreport_api::Error::Status {
            status: 401,
            body: "bad key".into(),
        }
        .into();
        match err {
            CoreError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unconfigured_maps_through() {
        let err: CoreError = panreport_api::Error::Unconfigured.into();
        assert!(matches!(err, CoreError::Unconfigured));
        assert_eq!(err.to_string(), "API URL and key must be configured first");
    }

    #[test]
    fn persistence_message_names_path() {
        let err = CoreError::persistence(
            "/tmp/Reports/x.csv",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/Reports/x.csv"));
    }
}
