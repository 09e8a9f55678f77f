//! Selecting the serial port to attach to

use glob::Pattern;
use log::debug;

use crate::{
    device::{BoardHardwareIds, PortDescriptor},
    options::MergedOptionSet,
};

const GLOB_CHARS: &[char] = &['*', '?', '[', ']'];

/// Determine the port a monitor session should use.
///
/// The first of these rules to apply decides the outcome:
///
/// 1. A requested port without glob characters is returned verbatim; it is
///    not checked against `ports`.
/// 2. A requested glob pattern selects the first port in `ports` whose name
///    matches it, or nothing.
/// 3. With no port requested and exactly one port attached, that port is
///    used.
/// 4. With no port requested and board hardware IDs available, each ID is
///    tried in order against every port in order; the first port whose
///    hardware ID contains the `vendor:product` token is used.
///
/// `None` means the port is unresolved and the caller decides what to do.
pub fn resolve(
    merged: &MergedOptionSet,
    ports: &[PortDescriptor],
    board_hwids: Option<&BoardHardwareIds>,
) -> Option<String> {
    if let Some(requested) = merged.port() {
        if !requested.contains(GLOB_CHARS) {
            debug!("Using requested port '{requested}'");
            return Some(requested.to_string());
        }

        return match_glob(requested, ports);
    }

    if let [port] = ports {
        debug!("Using the only detected port '{}'", port.port);
        return Some(port.port.clone());
    }

    match board_hwids {
        Some(hwids) => match_hardware_id(hwids, ports),
        None => {
            debug!("No board hardware IDs available, port left unresolved");
            None
        }
    }
}

fn match_glob(pattern: &str, ports: &[PortDescriptor]) -> Option<String> {
    // `**` is only valid as a whole path component; any run of `*` means the same
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if !(c == '*' && collapsed.ends_with('*')) {
            collapsed.push(c);
        }
    }

    let Ok(glob) = Pattern::new(&collapsed) else {
        debug!("Malformed port pattern '{pattern}', nothing matches");
        return None;
    };

    let found = ports.iter().find(|port| glob.matches(&port.port));
    match found {
        Some(port) => debug!("Port '{}' matches '{pattern}'", port.port),
        None => debug!("No detected port matches '{pattern}'"),
    }

    found.map(|port| port.port.clone())
}

fn match_hardware_id(hwids: &BoardHardwareIds, ports: &[PortDescriptor]) -> Option<String> {
    for hwid in hwids.iter() {
        let token = hwid.token();

        if let Some(port) = ports.iter().find(|port| port.hardware_id.contains(&token)) {
            debug!("Port '{}' matches board hardware ID {hwid}", port.port);
            return Some(port.port.clone());
        }
    }

    debug!("No detected port matches the board hardware IDs");
    None
}
