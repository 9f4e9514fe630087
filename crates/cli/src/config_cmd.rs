//! `exofile config`: persisted settings.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use exofile_config::{Settings, SETTING_KEYS};

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// List every setting and its current value
    #[command(after_help = "\
Examples:
  exofile config show
  exofile config show --json")]
    Show {
        /// Output JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Print the settings file location
    Path,

    /// Print one setting (empty output when unset)
    Get {
        key: String,
    },

    /// Change one setting; an empty value clears it
    #[command(after_help = "\
Examples:
  exofile config set custom_file ~/exofile/custom.csv
  exofile config set merge_config merge.toml
  exofile config set sheet_file ''")]
    Set {
        key: String,
        value: String,
    },

    /// Delete the settings file
    Reset,
}

pub fn cmd_config(cmd: ConfigCommands, settings_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = settings_path.clone().unwrap_or_else(Settings::default_path);
    match cmd {
        ConfigCommands::Show { json } => {
            let settings = load_settings(settings_path.as_deref())?;
            if json {
                let json_str = serde_json::to_string_pretty(&settings)
                    .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
                println!("{json_str}");
                return Ok(());
            }
            for (key, description) in SETTING_KEYS {
                let value = settings.get(key).map_err(CliError::settings)?;
                println!("{key} = {}", value.as_deref().unwrap_or("(unset)"));
                println!("    {description}");
            }
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let settings = load_settings(settings_path.as_deref())?;
            if let Some(value) = settings.get(&key).map_err(CliError::settings)? {
                println!("{value}");
            }
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut settings = load_settings(settings_path.as_deref())?;
            settings.edit(&key, &value).map_err(CliError::settings)?;
            settings.save_to(&path).map_err(CliError::settings)?;
            eprintln!("{key} updated in {}", path.display());
            Ok(())
        }
        ConfigCommands::Reset => {
            Settings::reset(&path).map_err(CliError::settings)?;
            eprintln!("removed {}", path.display());
            Ok(())
        }
    }
}

/// Settings from `path`, or the per-user file when `None`.
///
/// A missing file yields defaults. An explicit file that exists but does not
/// parse is an error; the per-user file falls back to defaults with a warning.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) if path.exists() => Settings::load_from(path).map_err(CliError::settings),
        Some(_) => Ok(Settings::default()),
        None => Ok(Settings::load()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_explicit_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings(Some(&dir.path().join("none.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn broken_explicit_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "exofile = [").unwrap();
        let err = load_settings(Some(&path)).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INVALID_CONFIG);
    }

    #[test]
    fn set_then_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        cmd_config(
            ConfigCommands::Set { key: "ref_file".into(), value: "refs.csv".into() },
            Some(path.clone()),
        )
        .unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.ref_file, Some(PathBuf::from("refs.csv")));

        cmd_config(ConfigCommands::Reset, Some(path.clone())).unwrap();
        assert!(!path.exists());
    }
}
