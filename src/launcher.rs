//! Handing the session over to the terminal engine

use std::process::Command;

use log::{debug, info};

use crate::{config::EngineConfig, error::Error, options::MergedOptionSet};

/// Port argument that makes the engine ask the user for a port
pub const ASK_FOR_PORT: &str = "-";

/// Everything the terminal engine needs to open a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Resolved port; `None` leaves the choice to the engine
    pub port: Option<String>,
    pub baud: u32,
    /// Initial RTS line state
    pub rts: Option<u8>,
    /// Initial DTR line state
    pub dtr: Option<u8>,
    /// Suppress the session banner
    pub quiet: bool,
    /// Generic options, see [to_tokens](crate::to_tokens)
    pub tokens: Vec<String>,
}

impl Session {
    pub fn new(port: Option<String>, merged: &MergedOptionSet, tokens: Vec<String>) -> Self {
        Session {
            port,
            baud: merged.baud(),
            rts: merged.rts(),
            dtr: merged.dtr(),
            quiet: merged.quiet(),
            tokens,
        }
    }
}

/// Starts monitor sessions
pub trait SessionLauncher {
    /// Run the session to completion.
    fn launch(&self, session: &Session) -> Result<(), Error>;
}

/// A miniterm-compatible program run as a child process
///
/// The command line is
/// `<program> <args…> <tokens…> [--rts N] [--dtr N] <port> <baud>`, where an
/// unresolved port is passed as [ASK_FOR_PORT].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEngine {
    program: String,
    args: Vec<String>,
}

impl ExternalEngine {
    pub fn new(program: impl Into<String>) -> Self {
        ExternalEngine {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program for `session`
    pub fn command_line(&self, session: &Session) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.extend(session.tokens.iter().cloned());

        if let Some(rts) = session.rts {
            argv.extend(["--rts".to_string(), rts.to_string()]);
        }
        if let Some(dtr) = session.dtr {
            argv.extend(["--dtr".to_string(), dtr.to_string()]);
        }

        argv.push(
            session
                .port
                .clone()
                .unwrap_or_else(|| ASK_FOR_PORT.to_string()),
        );
        argv.push(session.baud.to_string());

        argv
    }
}

impl From<&EngineConfig> for ExternalEngine {
    fn from(config: &EngineConfig) -> Self {
        ExternalEngine::new(&config.program).with_args(config.args.clone())
    }
}

impl SessionLauncher for ExternalEngine {
    fn launch(&self, session: &Session) -> Result<(), Error> {
        let argv = self.command_line(session);
        debug!("Running {} {}", self.program, argv.join(" "));

        let status = Command::new(&self.program)
            .args(&argv)
            .status()
            .map_err(|e| Error::EngineNotFound(self.program.clone(), e))?;

        if status.success() {
            info!("Session closed");
            Ok(())
        } else {
            Err(Error::EngineFailed {
                program: self.program.clone(),
                status: status.code(),
            })
        }
    }
}
