//! Board metadata
//!
//! A board manifest is a `<board>.toml` file describing a development board:
//!
//! ```toml
//! name = "Arduino Uno"
//! platform = "atmelavr"
//!
//! [build]
//! hwids = [["0x2341", "0x0043"], ["0x2A03", "0x0043"]]
//! ```
//!
//! Only the USB hardware IDs are of interest here; they are used to pick the
//! board's serial port when several devices are attached.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;

use crate::{
    config::Config,
    device::{BoardHardwareIds, HardwareId},
    error::{Error, TomlError},
};

/// Source of board metadata
pub trait BoardCatalog {
    /// Hardware IDs of `board` on `platform`, in the order the board lists
    /// them.
    fn hardware_ids(&self, platform: &str, board: &str) -> Result<BoardHardwareIds, Error>;
}

#[derive(Debug, Deserialize)]
struct BoardManifest {
    platform: Option<String>,
    #[serde(default)]
    build: BuildSection,
}

#[derive(Debug, Default, Deserialize)]
struct BuildSection {
    #[serde(default)]
    hwids: Vec<HardwareId>,
}

/// Looks up board manifests in a list of directories
///
/// For a given platform the directories searched are, in order:
///
/// - the project's `boards/` directory,
/// - any extra directory from the user configuration,
/// - `platforms/<platform>/boards/` in the user configuration directory.
#[derive(Debug, Clone)]
pub struct BoardDirectories {
    project_dir: PathBuf,
    extra: Vec<PathBuf>,
    platforms_dir: Option<PathBuf>,
}

impl BoardDirectories {
    pub fn new(project_dir: impl Into<PathBuf>, config: &Config) -> Self {
        BoardDirectories {
            project_dir: project_dir.into(),
            extra: config.boards.search_paths.clone(),
            platforms_dir: Config::config_dir().map(|dir| dir.join("platforms")),
        }
    }

    /// Replace the per-user platforms directory
    pub fn with_platforms_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.platforms_dir = dir;
        self
    }

    fn search_paths(&self, platform: &str) -> Vec<PathBuf> {
        let mut paths = vec![self.project_dir.join("boards")];
        paths.extend(self.extra.iter().cloned());
        if let Some(dir) = &self.platforms_dir {
            paths.push(dir.join(platform).join("boards"));
        }

        paths
    }
}

impl BoardCatalog for BoardDirectories {
    fn hardware_ids(&self, platform: &str, board: &str) -> Result<BoardHardwareIds, Error> {
        for dir in self.search_paths(platform) {
            let path = dir.join(format!("{board}.toml"));

            let Some(manifest) = read_manifest(&path)? else {
                continue;
            };

            match manifest.platform.as_deref() {
                Some(other) if other != platform => {
                    debug!("{} is a board for '{other}', skipping", path.display());
                    continue;
                }
                _ => {}
            }

            for hwid in &manifest.build.hwids {
                validate(hwid)?;
            }

            debug!("Board manifest: {}", path.display());
            return Ok(manifest.build.hwids.into());
        }

        Err(Error::BoardNotFound {
            platform: platform.to_string(),
            board: board.to_string(),
        })
    }
}

fn read_manifest(path: &Path) -> Result<Option<BoardManifest>, Error> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    toml::from_str(&source)
        .map(Some)
        .map_err(|e| TomlError::new(e, path, source).into())
}

fn validate(hwid: &HardwareId) -> Result<(), Error> {
    let is_hex = |half: &str| {
        let digits = half
            .strip_prefix("0x")
            .or_else(|| half.strip_prefix("0X"))
            .unwrap_or(half);
        u16::from_str_radix(digits, 16).is_ok()
    };

    if is_hex(&hwid.vendor) && is_hex(&hwid.product) {
        Ok(())
    } else {
        Err(Error::InvalidHardwareId(hwid.to_string()))
    }
}
