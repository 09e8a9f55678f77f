//! Command-line interface
//!
//! No stability guaranties apply

use std::{
    env,
    io::{stdout, IsTerminal, Write},
    path::{Path, PathBuf},
};

use clap::Args;
use log::{debug, info, warn};
use miette::{IntoDiagnostic, Result};
use sysinfo::Disks;

use crate::{
    argv::to_tokens,
    board::{BoardCatalog, BoardDirectories},
    config::Config,
    device::{BoardHardwareIds, DeviceEnumerator, LogicalDevice, MdnsService, PortDescriptor},
    error::Error,
    launcher::{ExternalEngine, Session, SessionLauncher},
    merge::merge,
    options::{Eol, OptionKey, Parity, RawOptionSet},
    project::ProjectOptions,
    resolve::resolve,
};

pub mod list;

mod serial;

/// List devices attached to the host
#[derive(Debug, Args)]
#[non_exhaustive]
pub struct ListArgs {
    /// List serial ports (default)
    #[arg(long)]
    pub serial: bool,
    /// List logical devices
    #[arg(long)]
    pub logical: bool,
    /// List multicast DNS services
    #[arg(long)]
    pub mdns: bool,
    /// Print the listing as JSON
    #[arg(long)]
    pub json_output: bool,
}

/// Open a serial monitor session
#[derive(Debug, Default, Args)]
#[non_exhaustive]
pub struct MonitorArgs {
    /// Port: a device name, or a glob pattern such as `/dev/ttyUSB*`
    #[arg(short = 'p', long)]
    pub port: Option<String>,
    /// Baud rate [default: 9600]
    #[arg(short = 'b', long)]
    pub baud: Option<u32>,
    /// Parity [default: N]
    #[arg(long, value_enum)]
    pub parity: Option<Parity>,
    /// Enable RTS/CTS flow control
    #[arg(long)]
    pub rtscts: bool,
    /// Enable software flow control
    #[arg(long)]
    pub xonxoff: bool,
    /// Initial RTS line state
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub rts: Option<u8>,
    /// Initial DTR line state
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub dtr: Option<u8>,
    /// Enable local echo
    #[arg(long)]
    pub echo: bool,
    /// Encoding of the serial data, e.g. hexlify, Latin1, UTF-8 [default: UTF-8]
    #[arg(long)]
    pub encoding: Option<String>,
    /// Add a filter or text transformation (repeatable)
    #[arg(short = 'f', long)]
    pub filter: Vec<String>,
    /// End of line mode [default: CRLF]
    #[arg(long, value_enum)]
    pub eol: Option<Eol>,
    /// Do not apply any encodings or transformations
    #[arg(long)]
    pub raw: bool,
    /// ASCII code of the character that exits the session [default: 3 (Ctrl+C)]
    #[arg(long)]
    pub exit_char: Option<u8>,
    /// ASCII code of the character that opens the menu [default: 20 (Ctrl+T)]
    #[arg(long)]
    pub menu_char: Option<u8>,
    /// Suppress non-error messages
    #[arg(long)]
    pub quiet: bool,
    /// Project directory [default: current directory]
    #[arg(short = 'd', long)]
    pub project_dir: Option<PathBuf>,
    /// Load configuration from this environment of the project file
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    /// Terminal engine to launch
    #[arg(long, env = "DEVMON_ENGINE")]
    pub engine: Option<String>,
    /// Print the session instead of launching it
    #[arg(long)]
    pub dry_run: bool,
}

impl MonitorArgs {
    /// The options the user supplied explicitly
    pub fn raw_options(&self) -> RawOptionSet {
        let mut raw = RawOptionSet::new();

        if let Some(port) = &self.port {
            raw.set(OptionKey::Port, port.as_str());
        }
        if let Some(baud) = self.baud {
            raw.set(OptionKey::Baud, baud);
        }
        if let Some(parity) = self.parity {
            raw.set(OptionKey::Parity, parity.to_string());
        }
        if let Some(rts) = self.rts {
            raw.set(OptionKey::Rts, rts.to_string());
        }
        if let Some(dtr) = self.dtr {
            raw.set(OptionKey::Dtr, dtr.to_string());
        }
        if let Some(encoding) = &self.encoding {
            raw.set(OptionKey::Encoding, encoding.as_str());
        }
        if !self.filter.is_empty() {
            raw.set(OptionKey::Filter, self.filter.clone());
        }
        if let Some(eol) = self.eol {
            raw.set(OptionKey::Eol, eol.to_string());
        }
        if let Some(exit_char) = self.exit_char {
            raw.set(OptionKey::ExitChar, exit_char);
        }
        if let Some(menu_char) = self.menu_char {
            raw.set(OptionKey::MenuChar, menu_char);
        }
        if let Some(project_dir) = &self.project_dir {
            raw.set(OptionKey::ProjectDir, project_dir.to_string_lossy().into_owned());
        }
        if let Some(environment) = &self.environment {
            raw.set(OptionKey::Environment, environment.as_str());
        }

        for (key, set) in [
            (OptionKey::Rtscts, self.rtscts),
            (OptionKey::Xonxoff, self.xonxoff),
            (OptionKey::Echo, self.echo),
            (OptionKey::Raw, self.raw),
            (OptionKey::Quiet, self.quiet),
        ] {
            if set {
                raw.set(key, true);
            }
        }

        raw
    }

    /// The project directory, which must exist
    pub fn project_dir(&self) -> Result<PathBuf, Error> {
        let dir = match &self.project_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::ProjectDirNotFound(dir))
        }
    }
}

/// Operating system device listings
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDevices;

impl DeviceEnumerator for SystemDevices {
    fn serial_ports(&self) -> Result<Vec<PortDescriptor>, Error> {
        serial::detect_serial_ports()
    }

    fn logical_devices(&self) -> Result<Vec<LogicalDevice>, Error> {
        let disks = Disks::new_with_refreshed_list();

        Ok(disks
            .list()
            .iter()
            .map(|disk| LogicalDevice {
                path: disk.mount_point().to_string_lossy().into_owned(),
                name: disk.name().to_string_lossy().into_owned(),
            })
            .collect())
    }

    fn mdns_services(&self) -> Result<Vec<MdnsService>, Error> {
        Err(Error::MdnsUnsupported)
    }
}

/// Print the devices attached to the host
pub fn list(args: ListArgs, devices: &dyn DeviceEnumerator) -> Result<()> {
    let listing = list::Listing::collect(devices, args.serial, args.logical, args.mdns)?;

    let mut stdout = stdout().lock();
    if args.json_output {
        writeln!(stdout, "{}", listing.to_json()?).into_diagnostic()?;
    } else {
        let color = stdout.is_terminal();
        listing.render(&mut stdout, color).into_diagnostic()?;
    }

    Ok(())
}

/// Resolve the options and port of a monitor session.
pub fn prepare_session(
    args: &MonitorArgs,
    project_dir: &Path,
    devices: &dyn DeviceEnumerator,
    boards: &dyn BoardCatalog,
) -> Result<Session> {
    let project = ProjectOptions::load(project_dir, args.environment.as_deref())?;
    if project.is_none() {
        debug!("No project context, using command-line options only");
    }

    let merged = merge(&args.raw_options(), project.as_ref());

    let ports = devices.serial_ports().unwrap_or_else(|e| {
        warn!("Failed to list serial ports: {e}");
        Vec::new()
    });
    debug!("Detected ports: {ports:#?}");

    // Automatic selection only considers USB devices
    let ports = if merged.port().is_some() {
        ports
    } else {
        ports
            .into_iter()
            .filter(|port| port.hardware_id.contains("VID:PID"))
            .collect()
    };

    let board_hwids = project
        .as_ref()
        .and_then(|project| board_hardware_ids(project, boards));

    let port = resolve(&merged, &ports, board_hwids.as_ref());
    if port.is_none() {
        warn!("Could not determine the serial port to use");
    }

    let tokens = to_tokens(&merged, project.as_ref(), &OptionKey::side_channel_keys());

    Ok(Session::new(port, &merged, tokens))
}

fn board_hardware_ids(
    project: &ProjectOptions,
    boards: &dyn BoardCatalog,
) -> Option<BoardHardwareIds> {
    let (Some(platform), Some(board)) = (project.platform(), project.board()) else {
        return None;
    };

    match boards.hardware_ids(platform, board) {
        Ok(hwids) => Some(hwids),
        Err(e) => {
            warn!("{e}, not matching ports by hardware ID");
            None
        }
    }
}

/// Open a serial monitor session with the configured terminal engine
pub fn serial_monitor(args: MonitorArgs, config: &Config) -> Result<()> {
    let project_dir = args.project_dir()?;
    let boards = BoardDirectories::new(&project_dir, config);

    let session = prepare_session(&args, &project_dir, &SystemDevices, &boards)?;

    let mut engine = ExternalEngine::from(&config.engine);
    if let Some(program) = &args.engine {
        engine = ExternalEngine::new(program);
    }

    if args.dry_run {
        println!("Port: {}", session.port.as_deref().unwrap_or("(unresolved)"));
        println!(
            "Command: {} {}",
            engine.program(),
            engine.command_line(&session).join(" ")
        );
        return Ok(());
    }

    if !session.quiet {
        info!(
            "Starting {} on {} at {} baud",
            engine.program(),
            session.port.as_deref().unwrap_or("a port of your choice"),
            session.baud
        );
    }

    engine.launch(&session)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    struct FakeDevices(Vec<PortDescriptor>);

    impl DeviceEnumerator for FakeDevices {
        fn serial_ports(&self) -> Result<Vec<PortDescriptor>, Error> {
            Ok(self.0.clone())
        }

        fn logical_devices(&self) -> Result<Vec<LogicalDevice>, Error> {
            Ok(Vec::new())
        }

        fn mdns_services(&self) -> Result<Vec<MdnsService>, Error> {
            Err(Error::MdnsUnsupported)
        }
    }

    struct FailingDevices;

    impl DeviceEnumerator for FailingDevices {
        fn serial_ports(&self) -> Result<Vec<PortDescriptor>, Error> {
            Err(Error::IoError(std::io::ErrorKind::PermissionDenied.into()))
        }

        fn logical_devices(&self) -> Result<Vec<LogicalDevice>, Error> {
            Ok(Vec::new())
        }

        fn mdns_services(&self) -> Result<Vec<MdnsService>, Error> {
            Ok(Vec::new())
        }
    }

    struct FakeBoards;

    impl BoardCatalog for FakeBoards {
        fn hardware_ids(&self, platform: &str, board: &str) -> Result<BoardHardwareIds, Error> {
            match (platform, board) {
                ("atmelavr", "uno") => Ok([("0x2341", "0x0043")].into_iter().collect()),
                _ => Err(Error::BoardNotFound {
                    platform: platform.into(),
                    board: board.into(),
                }),
            }
        }
    }

    fn usb_ports() -> FakeDevices {
        FakeDevices(vec![
            PortDescriptor::new("COM4", "USB VID:PID=1A86:7523", "USB-SERIAL CH340"),
            PortDescriptor::new("COM3", "USB VID:PID=2341:0043", "Arduino Uno"),
        ])
    }

    fn project(contents: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("devmon.toml"), contents).unwrap();
        dir
    }

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn raw_options_only_hold_supplied_values() {
        let args = MonitorArgs {
            baud: Some(115_200),
            echo: true,
            rts: Some(0),
            parity: Some(Parity::Even),
            ..Default::default()
        };
        let raw = args.raw_options();

        assert_eq!(
            raw,
            RawOptionSet::new()
                .with(OptionKey::Baud, 115_200u32)
                .with(OptionKey::Echo, true)
                .with(OptionKey::Rts, "0")
                .with(OptionKey::Parity, "E")
        );
        assert_eq!(raw.get(OptionKey::Raw), None);
    }

    #[test]
    fn missing_project_dir() {
        let dir = TempDir::new().unwrap();
        let args = MonitorArgs {
            project_dir: Some(dir.path().join("missing")),
            ..Default::default()
        };

        assert!(matches!(args.project_dir(), Err(Error::ProjectDirNotFound(_))));
    }

    #[test]
    fn session_from_project_board() {
        let dir = project(
            r#"
[env.uno]
platform = "atmelavr"
board = "uno"
monitor_speed = 115200
monitor_filters = ["time"]
monitor_rts = 0
"#,
        );

        let args = MonitorArgs::default();

        let session = prepare_session(&args, dir.path(), &usb_ports(), &FakeBoards).unwrap();

        assert_eq!(
            session,
            Session {
                port: Some("COM3".into()),
                baud: 115_200,
                rts: Some(0),
                dtr: None,
                quiet: false,
                tokens: strings(&["--filter", "time"]),
            }
        );
    }

    #[test]
    fn cli_overrides_project() {
        let dir = project("[env.uno]\nmonitor_speed = 115200\nmonitor_port = \"COM*\"\n");
        let args = MonitorArgs {
            baud: Some(74_880),
            port: Some("COM3".into()),
            echo: true,
            ..Default::default()
        };

        let session = prepare_session(&args, dir.path(), &usb_ports(), &FakeBoards).unwrap();

        assert_eq!(session.port.as_deref(), Some("COM3"));
        assert_eq!(session.baud, 74_880);
        assert_eq!(session.tokens, strings(&["--echo"]));
    }

    #[test]
    fn project_glob() {
        let dir = project("[env.uno]\nmonitor_port = \"COM*\"\n");

        let args = MonitorArgs::default();

        let session = prepare_session(&args, dir.path(), &usb_ports(), &FakeBoards).unwrap();

        assert_eq!(session.port.as_deref(), Some("COM4"));
    }

    #[test]
    fn unknown_board_disables_correlation() {
        let dir = project("[env.zero]\nplatform = \"atmelsam\"\nboard = \"zero\"\n");

        let args = MonitorArgs::default();

        let session = prepare_session(&args, dir.path(), &usb_ports(), &FakeBoards).unwrap();

        assert_eq!(session.port, None);
    }

    #[test]
    fn without_project_context() {
        let dir = TempDir::new().unwrap();
        let args = MonitorArgs {
            quiet: true,
            ..Default::default()
        };

        let single = FakeDevices(vec![PortDescriptor::new(
            "/dev/ttyACM0",
            "USB VID:PID=2341:0043",
            "Arduino Uno",
        )]);
        let session = prepare_session(&args, dir.path(), &single, &FakeBoards).unwrap();

        assert_eq!(session.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(session.baud, 9600);
        assert!(session.quiet);
        assert_eq!(session.tokens, strings(&["--quiet"]));
    }

    #[test]
    fn only_usb_ports_are_selected_automatically() {
        let dir = TempDir::new().unwrap();
        let devices = FakeDevices(vec![
            PortDescriptor::new("/dev/ttyS0", "PCI", "n/a"),
            PortDescriptor::new("/dev/ttyACM0", "USB VID:PID=2341:0043", "Arduino Uno"),
        ]);

        let args = MonitorArgs::default();
        let session = prepare_session(&args, dir.path(), &devices, &FakeBoards).unwrap();
        assert_eq!(session.port.as_deref(), Some("/dev/ttyACM0"));

        let args = MonitorArgs {
            port: Some("/dev/ttyS*".into()),
            ..Default::default()
        };
        let session = prepare_session(&args, dir.path(), &devices, &FakeBoards).unwrap();
        assert_eq!(session.port.as_deref(), Some("/dev/ttyS0"));
    }

    #[test]
    fn enumeration_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let args = MonitorArgs {
            port: Some("/dev/ttyUSB*".into()),
            ..Default::default()
        };

        let session = prepare_session(&args, dir.path(), &FailingDevices, &FakeBoards).unwrap();

        assert_eq!(session.port, None);
    }

    #[test]
    fn invalid_project_is_an_error() {
        let dir = project("[env.uno]\nmonitor_rts = 2\n");

        let args = MonitorArgs::default();
        let session = prepare_session(&args, dir.path(), &usb_ports(), &FakeBoards);

        assert!(session.is_err());
    }
}
