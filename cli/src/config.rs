//! Application configuration.
//!
//! Read from a JSON file (by default `<config dir>/bucketdrop/config.json`),
//! then overridden by command-line flags. Every field is optional in the
//! file; a missing default file reads as an empty one.
//!
//! ```json
//! {
//!   "project_id": "my-project",
//!   "client_id": "1234.apps.googleusercontent.com",
//!   "client_secret": "...",
//!   "upload_mode": "transfer"
//! }
//! ```

use bucketdrop_cloud::GoogleConfig;
use bucketdrop_flow::{FlowConfig, PreselectPolicy, UploadMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const APP_DIR: &str = "bucketdrop";
const CONFIG_FILE: &str = "config.json";
const PREFS_FILE: &str = "prefs.db";

/// Errors loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no data directory for the preference store; pass --prefs")]
    NoDataDir,
}

/// Everything the binary needs to wire up the flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub google: GoogleConfig,
    #[serde(flatten)]
    pub flow: FlowConfig,
    /// Preference database. Defaults to `<data dir>/bucketdrop/prefs.db`.
    pub prefs_path: Option<PathBuf>,
}

/// Values given on the command line; `None`/`false` leaves the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub prefs_path: Option<PathBuf>,
    pub transfer: bool,
    pub upload_on_restore: bool,
}

impl AppConfig {
    /// `<config dir>/bucketdrop/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads `path`, or the default file when `path` is `None`.
    ///
    /// An explicitly named file must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => {
                    debug!("No config file; using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(project_id) = overrides.project_id {
            self.flow.project_id = Some(project_id);
        }
        if let Some(client_id) = overrides.client_id {
            self.google.client_id = client_id;
        }
        if let Some(client_secret) = overrides.client_secret {
            self.google.client_secret = client_secret;
        }
        if let Some(prefs_path) = overrides.prefs_path {
            self.prefs_path = Some(prefs_path);
        }
        if overrides.transfer {
            self.flow.upload_mode = UploadMode::Transfer;
        }
        if overrides.upload_on_restore {
            self.flow.preselect_policy = PreselectPolicy::FireHandler;
        }
        self
    }

    /// Where the preference database lives.
    pub fn prefs_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.prefs_path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR).join(PREFS_FILE))
                .ok_or(ConfigError::NoDataDir),
        }
    }
}
