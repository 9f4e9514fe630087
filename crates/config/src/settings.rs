use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown setting '{0}' (known: {known})", known = known_keys())]
    UnknownKey(String),
}

fn known_keys() -> String {
    SETTING_KEYS.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
}

/// Setting names and what they point to.
pub const SETTING_KEYS: &[(&str, &str)] = &[
    ("exofile", "Merged table produced by `exofile merge`"),
    ("custom_file", "Local CSV of manual corrections, applied last"),
    ("ref_file", "Provenance table written next to the merged table"),
    ("sheet_file", "Downloaded export of the shared corrections sheet"),
    ("sheet_key", "Key of the shared corrections sheet"),
    ("url", "Published location of the merged table"),
    ("url_ref", "Published location of the provenance table"),
    ("merge_config", "Merge configuration (TOML) used when --config is not given"),
];

/// Persisted user settings. Every field is optional; unset means "ask on the
/// command line".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exofile: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_config: Option<PathBuf>,
}

impl Settings {
    /// Get the settings file path
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("exofile");
        config_dir.join("settings.toml")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "using default settings");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_err)
    }

    /// Set one setting by name. An empty value clears it.
    pub fn edit(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let text = (!value.trim().is_empty()).then(|| value.trim().to_string());
        let path = text.clone().map(PathBuf::from);
        match key {
            "exofile" => self.exofile = path,
            "custom_file" => self.custom_file = path,
            "ref_file" => self.ref_file = path,
            "sheet_file" => self.sheet_file = path,
            "sheet_key" => self.sheet_key = text,
            "url" => self.url = text,
            "url_ref" => self.url_ref = text,
            "merge_config" => self.merge_config = path,
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Current value of a setting as text; `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        Ok(match key {
            "exofile" => path(&self.exofile),
            "custom_file" => path(&self.custom_file),
            "ref_file" => path(&self.ref_file),
            "sheet_file" => path(&self.sheet_file),
            "sheet_key" => self.sheet_key.clone(),
            "url" => self.url.clone(),
            "url_ref" => self.url_ref.clone(),
            "merge_config" => path(&self.merge_config),
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        })
    }

    /// Delete the settings file at `path`. Missing file is not an error.
    pub fn reset(path: &Path) -> Result<(), SettingsError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
