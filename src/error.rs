//! Library and application errors

use std::{
    fmt::{Display, Formatter},
    io,
    iter::once,
    path::PathBuf,
};

use miette::{Diagnostic, LabeledSpan, SourceCode};
use thiserror::Error;

/// All possible errors returned by devmon
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Board '{board}' could not be found for platform '{platform}'")]
    #[diagnostic(
        code(devmon::board_not_found),
        help("Add a `boards/{board}.toml` manifest to the project, or install the platform's board definitions")
    )]
    BoardNotFound { platform: String, board: String },

    #[error("Failed to launch the terminal engine '{0}'")]
    #[diagnostic(
        code(devmon::engine_not_found),
        help("Install pyserial (`pip install pyserial`) or point `--engine` at another miniterm-compatible program")
    )]
    EngineNotFound(String, #[source] io::Error),

    #[error("The terminal engine '{program}' exited with {}", .status.map_or_else(|| "a signal".to_string(), |code| format!("status {code}")))]
    #[diagnostic(code(devmon::engine_failed))]
    EngineFailed { program: String, status: Option<i32> },

    #[error("Invalid hardware ID '{0}'")]
    #[diagnostic(
        code(devmon::invalid_hardware_id),
        help("Hardware IDs are written as a [vendor, product] pair, e.g. [\"0x2341\", \"0x0043\"]")
    )]
    InvalidHardwareId(String),

    #[error("Invalid value for `{key}` in environment '{env}': {reason}")]
    #[diagnostic(code(devmon::invalid_project_option))]
    InvalidProjectOption {
        env: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    #[diagnostic(code(devmon::io_error))]
    IoError(#[from] io::Error),

    #[error("Multicast DNS discovery is not available")]
    #[diagnostic(
        code(devmon::mdns_unsupported),
        help("List serial ports (`--serial`) or logical devices (`--logical`) instead")
    )]
    MdnsUnsupported,

    #[error("The project directory '{}' does not exist", .0.display())]
    #[diagnostic(
        code(devmon::project_dir_not_found),
        help("Pass an existing directory to `--project-dir`")
    )]
    ProjectDirNotFound(PathBuf),

    #[cfg(feature = "serialport")]
    #[error("Failed to enumerate serial ports")]
    #[diagnostic(code(devmon::serial_enumeration))]
    SerialEnumeration(#[source] serialport::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Toml(#[from] TomlError),
}

/// A TOML document which failed to parse, along with its source text so the
/// failing location can be highlighted.
#[derive(Debug)]
pub struct TomlError {
    err: toml::de::Error,
    path: PathBuf,
    source: String,
}

impl TomlError {
    pub fn new(err: toml::de::Error, path: impl Into<PathBuf>, source: String) -> Self {
        TomlError {
            err,
            path: path.into(),
            source,
        }
    }
}

impl Display for TomlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}", self.path.display())
    }
}

// no `source` on purpose to prevent duplicating the message
impl std::error::Error for TomlError {}

impl Diagnostic for TomlError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new("devmon::invalid_toml"))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.err.span()?;

        Some(Box::new(once(LabeledSpan::new(
            Some(self.err.message().to_string()),
            span.start,
            span.len(),
        ))))
    }
}
