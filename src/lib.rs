//! Port resolution and option plumbing for a serial device monitor.
//!
//! `devmon` sits in front of an external terminal program. For every
//! invocation it:
//!
//! 1. merges command-line options with the options of the active project
//!    environment ([merge()]),
//! 2. works out which serial port to attach to ([resolve()]),
//! 3. flattens the merged options into the argument vector the external
//!    engine understands ([to_tokens()]),
//!
//! and finally hands the result to a [SessionLauncher].
//!
//! The library can be used without the `cli` feature; in that case only the
//! core types and the file-backed project/board loaders are available.

pub use self::{
    argv::to_tokens,
    board::{BoardCatalog, BoardDirectories},
    device::{
        BoardHardwareIds, DeviceEnumerator, HardwareId, LogicalDevice, MdnsService,
        PortDescriptor,
    },
    error::Error,
    launcher::{ExternalEngine, Session, SessionLauncher},
    merge::merge,
    options::{MergedOptionSet, OptionKey, OptionValue, Origin, RawOptionSet},
    project::ProjectOptions,
    resolve::resolve,
};

pub mod argv;
pub mod board;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod launcher;
#[cfg(feature = "cli")]
pub mod logging;
pub mod merge;
pub mod options;
pub mod project;
pub mod resolve;

pub use config::Config;
