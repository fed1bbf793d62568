use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const APP_DIR: &str = "disaster-overview";
const PREFERENCES_FILE: &str = "preferences.json";
const LOG_FILE: &str = "disaster-overview.log";

/// Command-line options
#[derive(Debug, Clone, Parser)]
#[command(name = "disaster-overview", version, about = "Global disaster overview dashboard")]
pub struct Cli {
    /// Directory holding Natural Earth GeoJSON files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Preferences file (defaults to the user config directory)
    #[arg(long)]
    pub preferences: Option<PathBuf>,

    /// Override the preferred language and save it
    #[arg(long)]
    pub language: Option<String>,

    /// Log file (defaults to the system temp directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start in globe projection
    #[arg(long)]
    pub globe: bool,
}

impl Cli {
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences.clone().unwrap_or_else(default_preferences_path)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE))
    }
}

/// `<config dir>/disaster-overview/preferences.json`, or the working directory
/// when the platform has no config dir
pub fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_default()
        .join(PREFERENCES_FILE)
}

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid language code `{0}`")]
    InvalidLanguage(String),
}

/// The one persisted user preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_language: default_language(),
        }
    }
}

impl Preferences {
    /// Read preferences; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, PreferencesError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PreferencesError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let prefs: Preferences = serde_json::from_str(&content).map_err(|source| PreferencesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        validate_language(&prefs.preferred_language)?;
        Ok(prefs)
    }

    /// Like `load`, but any failure is logged and replaced by the defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(prefs) => {
                info!(path = %path.display(), language = %prefs.preferred_language, "preferences loaded");
                prefs
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        let io_err = |source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| PreferencesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn set_language(&mut self, code: &str) -> Result<(), PreferencesError> {
        validate_language(code)?;
        self.preferred_language = code.to_string();
        Ok(())
    }
}

/// Short locale code: 2-8 ASCII letters, optionally `-REGION` (e.g. "en", "pt-BR")
pub fn validate_language(code: &str) -> Result<(), PreferencesError> {
    let mut parts = code.splitn(2, '-');
    let lang = parts.next().unwrap_or("");
    let lang_ok = (2..=8).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_alphabetic());
    let region_ok = parts
        .next()
        .map(|r| (2..=8).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(true);
    if lang_ok && region_ok {
        Ok(())
    } else {
        Err(PreferencesError::InvalidLanguage(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_defaults_to_en() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(prefs.preferred_language, "en");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE);
        let mut prefs = Preferences::default();
        prefs.set_language("ar").unwrap();
        prefs.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"preferredLanguage\": \"ar\""));
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Preferences::load(&path), Err(PreferencesError::Parse { .. })));
        assert_eq!(Preferences::load_or_default(&path), Preferences::default());
    }

    #[test]
    fn test_missing_key_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "{}").unwrap();
        assert_eq!(Preferences::load(&path).unwrap().preferred_language, "en");
    }

    #[test]
    fn test_language_validation() {
        assert!(validate_language("en").is_ok());
        assert!(validate_language("pt-BR").is_ok());
        assert!(validate_language("e").is_err());
        assert!(validate_language("en_US").is_err());
        assert!(validate_language("").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["disaster-overview"]);
        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert!(!cli.globe);
        let cli = Cli::parse_from(["disaster-overview", "--globe", "--language", "fr"]);
        assert!(cli.globe);
        assert_eq!(cli.language.as_deref(), Some("fr"));
    }
}
