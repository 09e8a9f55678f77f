//! User configuration
//!
//! Settings that belong to the user rather than to a project live in
//! `config.toml` inside the platform's configuration directory (for example
//! `~/.config/devmon/config.toml` on Linux). The `DEVMON_CONFIG` environment
//! variable points at a different file.

use std::{
    env,
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, TomlError};

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "DEVMON_CONFIG";

/// Program launched when none is configured
pub const DEFAULT_ENGINE: &str = "pyserial-miniterm";

/// The external terminal engine
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Program to run
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before all others
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> String {
    DEFAULT_ENGINE.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

/// Where board manifests are searched for
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BoardsConfig {
    /// Additional directories holding `<board>.toml` manifests
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

/// User configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub boards: BoardsConfig,
}

impl Config {
    /// Load the user configuration, falling back to the defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, Error> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let raw_data = match read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No user config at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config =
            toml::from_str(&raw_data).map_err(|e| TomlError::new(e, path, raw_data.clone()))?;
        debug!("Config: {:#?}", &config);

        Ok(config)
    }

    /// Per-user configuration directory, if the platform has one
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("io", "devmon", "devmon").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn config_path() -> Option<PathBuf> {
        env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Self::config_dir().map(|dir| dir.join("config.toml")))
    }
}
