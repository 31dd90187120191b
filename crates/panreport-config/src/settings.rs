// ── Persisted connection settings ──
//
// JSON document holding the firewall URL, the vault-sealed API key and the
// export preferences. Cosmetic fields written by other front-ends (theme,
// date format, default folder) are carried through untouched.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use panreport_core::config::DEFAULT_MAX_ROWS;
use panreport_core::{ConnectionSettings, CoreError, ExportMode, SettingsStore};

use crate::ConfigError;
use crate::vault::{KeySource, Vault};

/// On-disk shape of `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub encrypted_key: String,
    #[serde(default)]
    pub max_rows: usize,
    #[serde(default)]
    pub report_format: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_folder")]
    pub default_folder: String,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            encrypted_key: String::new(),
            max_rows: DEFAULT_MAX_ROWS,
            report_format: ExportMode::default().to_string(),
            theme: default_theme(),
            date_format: default_date_format(),
            default_folder: default_folder(),
        }
    }
}

fn default_theme() -> String {
    "dark".into()
}
fn default_date_format() -> String {
    "YYYY-MM-DD".into()
}
fn default_folder() -> String {
    "Reports".into()
}

impl SettingsFile {
    /// Read and parse the file. A missing file is [`ConfigError::SettingsNotFound`].
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::SettingsNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Decrypt and translate into runtime settings.
    ///
    /// Zero `max_rows` and empty `report_format` keep the defaults.
    pub fn to_settings(&self, vault: &Vault) -> Result<ConnectionSettings, ConfigError> {
        Ok(self.with_key(vault.decrypt(&self.encrypted_key)?))
    }

    fn with_key(&self, api_key: SecretString) -> ConnectionSettings {
        let mut settings = ConnectionSettings::new(self.api_url.clone(), api_key);
        if self.max_rows > 0 {
            settings.max_rows = self.max_rows;
        }
        if !self.report_format.is_empty() {
            match self.report_format.parse::<ExportMode>() {
                Ok(mode) => settings.format = mode,
                Err(_) => warn!(
                    report_format = %self.report_format,
                    "unknown report format in settings, using default"
                ),
            }
        }
        settings
    }

    /// Overwrite the connection fields from `settings`, keeping cosmetic ones.
    pub fn apply(&mut self, settings: &ConnectionSettings, vault: &Vault) -> Result<(), ConfigError> {
        self.api_url.clone_from(&settings.base_url);
        self.encrypted_key = vault.encrypt(settings.api_key.expose_secret())?;
        self.max_rows = settings.max_rows;
        self.report_format = settings.format.to_string();
        Ok(())
    }
}

// ── Load / save ─────────────────────────────────────────────────────

/// Load settings from `path`, failing on a missing file.
pub fn load(path: &Path, vault: &Vault) -> Result<ConnectionSettings, ConfigError> {
    let settings = SettingsFile::read(path)?.to_settings(vault)?;
    debug!(path = %path.display(), configured = settings.is_configured(), "settings loaded");
    Ok(settings)
}

/// Load settings, substituting defaults only when the file does not exist.
/// Corrupt files and vault failures are still errors.
pub fn load_or_default(path: &Path, vault: &Vault) -> Result<ConnectionSettings, ConfigError> {
    match load(path, vault) {
        Err(ConfigError::SettingsNotFound { .. }) => {
            debug!(path = %path.display(), "no settings file, using defaults");
            Ok(ConnectionSettings::default())
        }
        other => other,
    }
}

/// Like [`load_or_default`], but a key the vault cannot open is dropped
/// instead of failing, so the remaining fields can be re-saved with a new key.
pub fn load_for_repair(path: &Path, vault: &Vault) -> Result<ConnectionSettings, ConfigError> {
    let file = match SettingsFile::read(path) {
        Ok(file) => file,
        Err(ConfigError::SettingsNotFound { .. }) => return Ok(ConnectionSettings::default()),
        Err(e) => return Err(e),
    };
    match file.to_settings(vault) {
        Err(ConfigError::Vault(e)) => {
            warn!(path = %path.display(), error = %e, "stored API key unreadable, continuing without it");
            Ok(file.with_key(SecretString::from(String::new())))
        }
        other => other,
    }
}

/// Persist `settings` to `path`, preserving cosmetic fields already on disk.
pub fn save(path: &Path, vault: &Vault, settings: &ConnectionSettings) -> Result<(), ConfigError> {
    let mut file = match SettingsFile::read(path) {
        Ok(file) => file,
        Err(ConfigError::SettingsNotFound { .. }) => SettingsFile::default(),
        Err(e) => {
            warn!(error = %e, "existing settings unreadable, rewriting from defaults");
            SettingsFile::default()
        }
    };
    file.apply(settings, vault)?;
    file.write(path)?;
    info!(path = %path.display(), "settings saved");
    Ok(())
}

// ── SettingsStore adapter ───────────────────────────────────────────

/// File-backed [`SettingsStore`] handed to `Session::save_settings`.
pub struct FileSettingsStore {
    path: PathBuf,
    vault: Vault,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, vault: Vault) -> Self {
        Self {
            path: path.into(),
            vault,
        }
    }

    pub fn open(path: impl Into<PathBuf>, source: KeySource) -> Result<Self, ConfigError> {
        Ok(Self::new(path, Vault::open(source)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ConnectionSettings, ConfigError> {
        load(&self.path, &self.vault)
    }

    pub fn load_or_default(&self) -> Result<ConnectionSettings, ConfigError> {
        load_or_default(&self.path, &self.vault)
    }

    pub fn load_for_repair(&self) -> Result<ConnectionSettings, ConfigError> {
        load_for_repair(&self.path, &self.vault)
    }
}

impl SettingsStore for FileSettingsStore {
    fn save(&self, settings: &ConnectionSettings) -> Result<(), CoreError> {
        save(&self.path, &self.vault, settings).map_err(CoreError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use tempfile::TempDir;

    use super::*;
    use crate::vault::VaultError;

    fn sample() -> ConnectionSettings {
        ConnectionSettings {
            base_url: "https://fw01.example.net".into(),
            api_key: SecretString::from("LUFRPT1secret".to_string()),
            max_rows: 250,
            format: ExportMode::Complete,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let vault = Vault::builtin();

        save(&path, &vault, &sample()).unwrap();
        let loaded = load(&path, &vault).unwrap();

        assert_eq!(loaded.base_url, "https://fw01.example.net");
        assert_eq!(loaded.api_key.expose_secret(), "LUFRPT1secret");
        assert_eq!(loaded.max_rows, 250);
        assert_eq!(loaded.format, ExportMode::Complete);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("LUFRPT1secret"));
        assert!(raw.contains("\"theme\": \"dark\""));
    }

    #[test]
    fn missing_file_is_not_found_but_defaults_available() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let vault = Vault::builtin();

        assert!(matches!(
            load(&path, &vault),
            Err(ConfigError::SettingsNotFound { .. })
        ));
        let settings = load_or_default(&path, &vault).unwrap();
        assert!(!settings.is_configured());
        assert_eq!(settings.max_rows, DEFAULT_MAX_ROWS);
    }

    #[test]
    fn corrupt_json_is_not_defaulted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_or_default(&path, &Vault::builtin()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn tampered_key_is_a_vault_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let vault = Vault::builtin();
        save(&path, &vault, &sample()).unwrap();

        let mut file = SettingsFile::read(&path).unwrap();
        file.encrypted_key = "AAAA".into();
        file.write(&path).unwrap();

        let err = load_or_default(&path, &vault).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Vault(VaultError::Truncated { .. })
        ));
    }

    #[test]
    fn repair_load_keeps_fields_without_the_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let vault = Vault::builtin();
        save(&path, &vault, &sample()).unwrap();

        let mut file = SettingsFile::read(&path).unwrap();
        file.encrypted_key = "AAAA".into();
        file.write(&path).unwrap();

        let settings = load_for_repair(&path, &vault).unwrap();
        assert_eq!(settings.base_url, "https://fw01.example.net");
        assert_eq!(settings.api_key.expose_secret(), "");
        assert_eq!(settings.max_rows, 250);
        assert!(!settings.is_configured());
    }

    #[test]
    fn repair_load_still_rejects_corrupt_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_for_repair(&path, &Vault::builtin()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn zero_rows_and_blank_format_keep_defaults() {
        let file = SettingsFile {
            api_url: "https://fw".into(),
            max_rows: 0,
            report_format: String::new(),
            ..SettingsFile::default()
        };
        let settings = file.to_settings(&Vault::builtin()).unwrap();
        assert_eq!(settings.max_rows, DEFAULT_MAX_ROWS);
        assert_eq!(settings.format, ExportMode::Standard);
    }

    #[test]
    fn cosmetic_fields_survive_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let file = SettingsFile {
            theme: "light".into(),
            date_format: "DD/MM/YYYY".into(),
            ..SettingsFile::default()
        };
        file.write(&path).unwrap();

        let store = FileSettingsStore::new(&path, Vault::builtin());
        SettingsStore::save(&store, &sample()).unwrap();

        let reread = SettingsFile::read(&path).unwrap();
        assert_eq!(reread.theme, "light");
        assert_eq!(reread.date_format, "DD/MM/YYYY");
        assert_eq!(reread.api_url, "https://fw01.example.net");
        assert_eq!(store.load().unwrap().max_rows, 250);
    }

    #[test]
    fn empty_key_is_stored_empty() {
        let mut file = SettingsFile::default();
        let settings = ConnectionSettings::new("https://fw", SecretString::from(String::new()));
        file.apply(&settings, &Vault::builtin()).unwrap();
        assert_eq!(file.encrypted_key, "");
    }
}
