use serialport::{available_ports, SerialPortInfo, SerialPortType};

use crate::{device::PortDescriptor, error::Error};

/// List the serial ports of the host, in the order the system reports them.
#[cfg(not(all(target_os = "linux", target_env = "musl")))]
pub(super) fn detect_serial_ports() -> Result<Vec<PortDescriptor>, Error> {
    let ports = available_ports().map_err(Error::SerialEnumeration)?;

    Ok(ports.iter().map(describe_port).collect())
}

/// serialport's autodetect doesn't provide any port information when using musl
/// linux we can do some manual parsing of sysfs to get the relevant bits
/// without udev
#[cfg(all(target_os = "linux", target_env = "musl"))]
pub(super) fn detect_serial_ports() -> Result<Vec<PortDescriptor>, Error> {
    use std::{
        fs::{read_link, read_to_string},
        path::PathBuf,
    };

    let ports = available_ports().map_err(Error::SerialEnumeration)?;
    let ports = ports
        .into_iter()
        .map(|port_info| {
            // with musl, the paths we get are `/sys/class/tty/*`
            let path = PathBuf::from(&port_info.port_name);
            let name = path
                .file_name()
                .map(|name| format!("/dev/{}", name.to_string_lossy()))
                .unwrap_or_else(|| port_info.port_name.clone());

            let usb = || -> Option<(String, String, Option<String>)> {
                // `/sys/devices/.../usb5/5-3/5-3.1/5-3.1:1.0/ttyUSB0/tty/ttyUSB0`
                let mut parent_dev = path.canonicalize().ok()?;

                // walk up 3 dirs to get to the interface hosting the tty
                parent_dev.pop();
                parent_dev.pop();
                parent_dev.pop();

                read_link(parent_dev.join("subsystem"))
                    .ok()
                    .filter(|subsystem| subsystem.ends_with("usb"))?;

                let interface = read_to_string(parent_dev.join("interface"))
                    .ok()
                    .map(|s| s.trim().to_string());

                // and one more to the USB device itself
                parent_dev.pop();

                let vid = read_to_string(parent_dev.join("idVendor")).ok()?;
                let pid = read_to_string(parent_dev.join("idProduct")).ok()?;

                Some((vid.trim().to_uppercase(), pid.trim().to_uppercase(), interface))
            };

            match usb() {
                Some((vid, pid, interface)) => PortDescriptor::new(
                    name,
                    format!("USB VID:PID={vid}:{pid}"),
                    interface.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                ),
                None => PortDescriptor::new(name, NOT_AVAILABLE, NOT_AVAILABLE),
            }
        })
        .collect();

    Ok(ports)
}

const NOT_AVAILABLE: &str = "n/a";

#[cfg_attr(all(target_os = "linux", target_env = "musl"), allow(dead_code))]
fn describe_port(info: &SerialPortInfo) -> PortDescriptor {
    let (hardware_id, description) = match &info.port_type {
        SerialPortType::UsbPort(usb) => (
            usb_hardware_id(usb.vid, usb.pid, usb.serial_number.as_deref()),
            usb.product
                .as_ref()
                .or(usb.manufacturer.as_ref())
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
        SerialPortType::PciPort => ("PCI".to_string(), NOT_AVAILABLE.to_string()),
        SerialPortType::BluetoothPort => ("BLUETOOTH".to_string(), NOT_AVAILABLE.to_string()),
        SerialPortType::Unknown => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    PortDescriptor::new(&info.port_name, hardware_id, description)
}

/// Hardware ID in the usual `USB VID:PID=2341:0043 SER=…` layout
fn usb_hardware_id(vid: u16, pid: u16, serial_number: Option<&str>) -> String {
    match serial_number {
        Some(serial) if !serial.is_empty() => {
            format!("USB VID:PID={vid:04X}:{pid:04X} SER={serial}")
        }
        _ => format!("USB VID:PID={vid:04X}:{pid:04X}"),
    }
}
