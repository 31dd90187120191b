// ── Runtime session configuration ──
//
// These types describe *how* the session talks to the firewall and where it
// writes artifacts. They carry credential data but never touch disk: the
// CLI loads settings through panreport-config and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Default cap on exported table rows.
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Column selection for tabular exports.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportMode {
    /// Columns come from the first entry only.
    #[default]
    Standard,
    /// Columns are the union over all entries.
    Complete,
}

/// Firewall connection settings plus export preferences.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Management API base URL (e.g. `https://fw01.example.net`).
    pub base_url: String,
    pub api_key: SecretString,
    /// Row cap for tabular exports. 0 disables the cap.
    pub max_rows: usize,
    pub format: ExportMode,
}

impl ConnectionSettings {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            ..Self::default()
        }
    }

    /// Both a base URL and an API key are present.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.api_key.expose_secret().is_empty()
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: SecretString::from(String::new()),
            max_rows: DEFAULT_MAX_ROWS,
            format: ExportMode::default(),
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Firewalls usually ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Everything a [`Session`](crate::Session) needs at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub settings: ConnectionSettings,
    /// Directory that receives exported artifacts.
    pub reports_dir: PathBuf,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(settings: ConnectionSettings, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            reports_dir: reports_dir.into(),
            tls: TlsVerification::default(),
            timeout: panreport_api::REQUEST_TIMEOUT,
        }
    }
}
