//! Project configuration
//!
//! A project keeps its monitor settings in a `devmon.toml` file at the root
//! of the project directory, grouped by build environment:
//!
//! ```toml
//! [devmon]
//! default_envs = ["uno"]
//!
//! [env]
//! monitor_speed = 115200
//!
//! [env.uno]
//! platform = "atmelavr"
//! board = "uno"
//! monitor_port = "/dev/ttyUSB*"
//! monitor_filters = ["time", "colorize"]
//! ```
//!
//! Scalar keys directly under `[env]` are shared by every environment.
//! Monitor options are spelled `monitor_<option>`, with `monitor_speed` and
//! `monitor_filters` accepted for `baud` and `filter`. `monitor_flags` holds
//! raw arguments passed to the terminal engine as they are.

use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

use log::{debug, warn};
use serde::Deserialize;

use crate::{
    error::{Error, TomlError},
    options::{OptionKey, OptionKind, OptionValue},
};

/// Name of the project configuration file
pub const PROJECT_FILE: &str = "devmon.toml";

#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    devmon: ProjectSection,
    #[serde(default)]
    env: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectSection {
    default_envs: Option<toml::Value>,
}

/// Monitor options of one project environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectOptions {
    environment: String,
    platform: Option<String>,
    board: Option<String>,
    options: BTreeMap<OptionKey, OptionValue>,
    extra_flags: Vec<String>,
}

impl ProjectOptions {
    pub fn new(environment: impl Into<String>) -> Self {
        ProjectOptions {
            environment: environment.into(),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key, value.into());
        self
    }

    pub fn with_board(mut self, platform: impl Into<String>, board: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self.board = Some(board.into());
        self
    }

    pub fn with_extra_flags(mut self, flags: Vec<String>) -> Self {
        self.extra_flags = flags;
        self
    }

    /// Load the options of `environment` from the project in `project_dir`.
    ///
    /// Returns `Ok(None)` when there is no project context: no project file,
    /// no environments, or no environment by that name.
    pub fn load(project_dir: &Path, environment: Option<&str>) -> Result<Option<Self>, Error> {
        let path = project_dir.join(PROJECT_FILE);

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No project file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let file: ProjectFile =
            toml::from_str(&source).map_err(|e| TomlError::new(e, &path, source.clone()))?;

        Self::from_file(file, environment)
    }

    fn from_file(file: ProjectFile, environment: Option<&str>) -> Result<Option<Self>, Error> {
        let (envs, shared): (Vec<_>, Vec<_>) =
            file.env.into_iter().partition(|(_, value)| value.is_table());

        let name = match environment {
            Some(name) => name.to_string(),
            None => {
                let default_envs = file
                    .devmon
                    .default_envs
                    .as_ref()
                    .map(|value| parse_list(value, "default_envs", "devmon"))
                    .transpose()?
                    .unwrap_or_default();

                match default_envs.into_iter().next() {
                    Some(name) => name,
                    None => match envs.first() {
                        Some((name, _)) => name.clone(),
                        None => {
                            warn!("The project file does not define any environment");
                            return Ok(None);
                        }
                    },
                }
            }
        };

        let Some(own) = envs
            .into_iter()
            .find_map(|(env, value)| (env == name).then_some(value))
            .and_then(|value| match value {
                toml::Value::Table(table) => Some(table),
                _ => None,
            })
        else {
            warn!("Unknown environment '{name}', ignoring the project file");
            return Ok(None);
        };

        debug!("Using project environment '{name}'");

        let mut project = ProjectOptions::new(&name);
        for (key, value) in shared.into_iter().chain(own) {
            project.apply(&key, value)?;
        }

        Ok(Some(project))
    }

    fn apply(&mut self, key: &str, value: toml::Value) -> Result<(), Error> {
        match key {
            "platform" => self.platform = Some(parse_string(&value, key, &self.environment)?),
            "board" => self.board = Some(parse_string(&value, key, &self.environment)?),
            "monitor_flags" => self.extra_flags = parse_list(&value, key, &self.environment)?,
            _ => {
                let Some(name) = key.strip_prefix("monitor_") else {
                    return Ok(());
                };

                match option_key(name) {
                    Some(option) => {
                        let value = convert(option, &value)
                            .map_err(|reason| self.invalid(key, reason))?;
                        self.options.insert(option, value);
                    }
                    None => warn!(
                        "Ignoring unknown option `{key}` in environment '{}'",
                        self.environment
                    ),
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, key: &str, reason: String) -> Error {
        Error::InvalidProjectOption {
            env: self.environment.clone(),
            key: key.to_string(),
            reason,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.options.get(&key)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.options.contains_key(&key)
    }

    /// Raw arguments for the terminal engine (`monitor_flags`)
    pub fn extra_flags(&self) -> &[String] {
        &self.extra_flags
    }
}

fn option_key(name: &str) -> Option<OptionKey> {
    match name {
        "speed" => Some(OptionKey::Baud),
        "filters" => Some(OptionKey::Filter),
        _ => name
            .parse()
            .ok()
            .filter(|key| !matches!(key, OptionKey::ProjectDir | OptionKey::Environment)),
    }
}

fn convert(key: OptionKey, value: &toml::Value) -> Result<OptionValue, String> {
    use toml::Value;

    let converted = match (key.spec().kind, value) {
        (OptionKind::Flag, Value::Boolean(flag)) => OptionValue::Flag(*flag),
        (OptionKind::Flag, Value::String(text)) => match text.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => OptionValue::Flag(true),
            "no" | "false" | "off" | "0" => OptionValue::Flag(false),
            _ => return Err(format!("expected a boolean, found '{text}'")),
        },
        (OptionKind::Integer, Value::Integer(int)) => OptionValue::Integer(*int),
        (OptionKind::Integer, Value::String(text)) => text
            .trim()
            .parse()
            .map(OptionValue::Integer)
            .map_err(|_| format!("expected an integer, found '{text}'"))?,
        (OptionKind::Text, Value::String(text)) => OptionValue::Text(text.clone()),
        (OptionKind::Text, Value::Integer(int)) => OptionValue::Text(int.to_string()),
        (OptionKind::Choice(choices), Value::String(_) | Value::Integer(_)) => {
            let text = match value {
                Value::String(text) => text.to_ascii_uppercase(),
                other => other.to_string(),
            };

            if !choices.contains(&text.as_str()) {
                return Err(format!(
                    "expected one of {}, found '{text}'",
                    choices.join(", ")
                ));
            }
            OptionValue::Text(text)
        }
        (OptionKind::List, Value::String(_) | Value::Array(_)) => {
            OptionValue::List(split_list(value).ok_or("expected a list of strings")?)
        }
        (kind, value) => {
            return Err(format!(
                "expected {}, found {}",
                describe(kind),
                value.type_str()
            ))
        }
    };

    Ok(converted)
}

fn describe(kind: OptionKind) -> &'static str {
    match kind {
        OptionKind::Flag => "a boolean",
        OptionKind::Integer => "an integer",
        OptionKind::Text | OptionKind::Choice(_) => "a string",
        OptionKind::List => "a list of strings",
    }
}

fn parse_string(value: &toml::Value, key: &str, env: &str) -> Result<String, Error> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidProjectOption {
            env: env.to_string(),
            key: key.to_string(),
            reason: format!("expected a string, found {}", value.type_str()),
        })
}

fn parse_list(value: &toml::Value, key: &str, env: &str) -> Result<Vec<String>, Error> {
    split_list(value).ok_or_else(|| Error::InvalidProjectOption {
        env: env.to_string(),
        key: key.to_string(),
        reason: "expected a list of strings".to_string(),
    })
}

/// An array of strings, or a single string separated by commas or newlines
fn split_list(value: &toml::Value) -> Option<Vec<String>> {
    match value {
        toml::Value::String(text) => Some(
            text.split([',', '\n'])
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}
