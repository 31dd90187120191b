//! Configuration for panreport front-ends.
//!
//! TOML app config layered with figment, the credential vault that seals the
//! API key, and the JSON settings file. Translates everything into
//! `panreport_core::SessionConfig`; core itself never reads from disk.

pub mod settings;
pub mod vault;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use panreport_core::{ConnectionSettings, CoreError, SessionConfig, TlsVerification};

pub use settings::{FileSettingsStore, SettingsFile};
pub use vault::{KeySource, Vault, VaultError};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("settings file not found: {}", path.display())]
    SettingsNotFound { path: PathBuf },

    #[error("credential vault: {0}")]
    Vault(#[from] VaultError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Vault(e) => Self::Crypto {
                message: e.to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation {
                message: format!("invalid {field}: {reason}"),
            },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Export directory. Relative paths resolve against the working directory.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Settings JSON path. Defaults to `settings.json` beside `config.toml`.
    #[serde(default)]
    pub settings_file: Option<PathBuf>,

    /// Skip TLS verification (firewalls usually present self-signed certs).
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// Custom CA certificate (PEM). Takes precedence over `insecure`.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub vault_key: KeySource,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            settings_file: None,
            insecure: default_insecure(),
            ca_cert: None,
            timeout: default_timeout(),
            vault_key: KeySource::default(),
        }
    }
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("Reports")
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

impl AppConfig {
    pub fn settings_path(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(|| config_dir().join("settings.json"))
    }

    pub fn tls(&self) -> TlsVerification {
        match (&self.ca_cert, self.insecure) {
            (Some(ca), _) => TlsVerification::CustomCa(ca.clone()),
            (None, true) => TlsVerification::DangerAcceptInvalid,
            (None, false) => TlsVerification::SystemDefaults,
        }
    }

    /// Settings store for this config's settings path and vault key source.
    pub fn settings_store(&self) -> Result<FileSettingsStore, ConfigError> {
        FileSettingsStore::open(self.settings_path(), self.vault_key)
    }

    /// Build the session config from already-loaded connection settings.
    pub fn session_config(&self, settings: ConnectionSettings) -> SessionConfig {
        let mut config = SessionConfig::new(settings, self.reports_dir.clone());
        config.tls = self.tls();
        config.timeout = Duration::from_secs(self.timeout);
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.reports_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "reports_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Directory holding `config.toml` and, by default, `settings.json`.
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("com", "panreport", "panreport").map_or_else(dirs_fallback, |dirs| {
        dirs.config_dir().to_path_buf()
    })
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("panreport");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from the canonical path plus `PANREPORT_*` env vars.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        // PANREPORT_VAULT_KEY is vault key material, not the `vault_key` option.
        .merge(Env::prefixed("PANREPORT_").only(&[
            "reports_dir",
            "settings_file",
            "insecure",
            "ca_cert",
            "timeout",
        ]));

    let config: AppConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
