//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use panreport_config::ConfigError;
use panreport_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to firewall at {url}")]
    #[diagnostic(
        code(panreport::connection_failed),
        help(
            "Check that the management interface is reachable.\n\
             URL: {url}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(panreport::timeout),
        help("Increase `timeout` in config.toml or check firewall responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("Firewall API returned status {status}")]
    #[diagnostic(code(panreport::api_status), help("{hint}"))]
    ApiStatus {
        status: u16,
        hint: String,
    },

    // ── Settings ─────────────────────────────────────────────────────
    #[error("API URL and key are not configured")]
    #[diagnostic(
        code(panreport::unconfigured),
        help("Run: panreport config set --url https://<firewall>")
    )]
    Unconfigured,

    #[error("Stored API key could not be decrypted")]
    #[diagnostic(
        code(panreport::credentials),
        help(
            "{message}\n\
             Re-enter the key with: panreport config set --url <url>"
        )
    )]
    Credentials { message: String },

    #[error("Configuration error")]
    #[diagnostic(code(panreport::config))]
    Config(#[source] ConfigError),

    // ── Reports ──────────────────────────────────────────────────────
    #[error("Unknown report type '{report_type}'")]
    #[diagnostic(
        code(panreport::unknown_report),
        help("Run: panreport types to see available report types")
    )]
    UnknownReportType { report_type: String },

    #[error("No data for '{report_type}'")]
    #[diagnostic(code(panreport::no_data))]
    NoData { report_type: String },

    #[error("{message}")]
    #[diagnostic(code(panreport::report))]
    Report { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(panreport::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(panreport::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::ApiStatus { status, .. } if matches!(status, 401 | 403) => exit_code::AUTH,
            Self::Unconfigured | Self::Credentials { .. } => exit_code::AUTH,
            Self::UnknownReportType { .. } | Self::NoData { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unconfigured => CliError::Unconfigured,

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Status { status, message } => {
                let hint = match status {
                    401 | 403 => format!("Check the API key. Firewall said: {message}"),
                    404 => format!("Endpoint not available on this PAN-OS version: {message}"),
                    _ => message,
                };
                CliError::ApiStatus { status, hint }
            }

            CoreError::UnknownReportType { report_type } => {
                CliError::UnknownReportType { report_type }
            }

            CoreError::NoData { report_type } => CliError::NoData { report_type },

            CoreError::Crypto { message } => CliError::Credentials { message },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            other => CliError::Report {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Vault(e) => CliError::Credentials {
                message: e.to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
