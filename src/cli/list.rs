//! Rendering device listings

use std::io::Write;

use crossterm::style::Stylize;
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};

use crate::device::{DeviceEnumerator, LogicalDevice, MdnsService, PortDescriptor};

/// The device kinds requested by `devmon list`, with their devices
#[derive(Debug, Default)]
pub struct Listing {
    pub serial: Option<Vec<PortDescriptor>>,
    pub logical: Option<Vec<LogicalDevice>>,
    pub mdns: Option<Vec<MdnsService>>,
}

impl Listing {
    /// Query `devices` for every requested kind. Serial ports are listed when
    /// neither of the other kinds is requested.
    pub fn collect(
        devices: &dyn DeviceEnumerator,
        serial: bool,
        logical: bool,
        mdns: bool,
    ) -> Result<Self> {
        let serial = serial || (!logical && !mdns);

        Ok(Listing {
            serial: serial.then(|| devices.serial_ports()).transpose()?,
            logical: logical.then(|| devices.logical_devices()).transpose()?,
            mdns: mdns.then(|| devices.mdns_services()).transpose()?,
        })
    }

    fn kinds(&self) -> usize {
        [
            self.serial.is_some(),
            self.logical.is_some(),
            self.mdns.is_some(),
        ]
        .into_iter()
        .filter(|&requested| requested)
        .count()
    }

    /// JSON form: the bare array for a single kind, otherwise an object keyed
    /// by kind.
    pub fn to_json(&self) -> Result<Value> {
        let mut map = Map::new();
        if let Some(serial) = &self.serial {
            map.insert("serial".into(), serde_json::to_value(serial).into_diagnostic()?);
        }
        if let Some(logical) = &self.logical {
            map.insert("logical".into(), serde_json::to_value(logical).into_diagnostic()?);
        }
        if let Some(mdns) = &self.mdns {
            map.insert("mdns".into(), serde_json::to_value(mdns).into_diagnostic()?);
        }

        if map.len() == 1 {
            Ok(map.into_iter().map(|(_, value)| value).next().unwrap_or_default())
        } else {
            Ok(Value::Object(map))
        }
    }

    /// Human readable form
    pub fn render(&self, out: &mut dyn Write, color: bool) -> std::io::Result<()> {
        let single = self.kinds() == 1;

        if let Some(ports) = &self.serial {
            if !single {
                title(out, "Serial Ports", color)?;
            }
            for port in ports {
                heading(out, &port.port, color)?;
                writeln!(out, "Hardware ID: {}", port.hardware_id)?;
                writeln!(out, "Description: {}", port.description)?;
                writeln!(out)?;
            }
            if single {
                writeln!(out)?;
            }
        }

        if let Some(devices) = &self.logical {
            if !single {
                title(out, "Logical Devices", color)?;
            }
            for device in devices {
                heading(out, &device.path, color)?;
                writeln!(out, "Name: {}", device.name)?;
                writeln!(out)?;
            }
            if single {
                writeln!(out)?;
            }
        }

        if let Some(services) = &self.mdns {
            if !single {
                title(out, "Multicast DNS Services", color)?;
            }
            for service in services {
                heading(out, &service.name, color)?;
                writeln!(out, "Type: {}", service.service_type)?;
                writeln!(out, "IP: {}", service.ip)?;
                writeln!(out, "Port: {}", service.port)?;
                if !service.properties.is_empty() {
                    let properties = service
                        .properties
                        .iter()
                        .map(|(key, value)| format!("{key}={value}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    writeln!(out, "Properties: {properties}")?;
                }
                writeln!(out)?;
            }
            if single {
                writeln!(out)?;
            }
        }

        Ok(())
    }
}

fn title(out: &mut dyn Write, title: &str, color: bool) -> std::io::Result<()> {
    if color {
        writeln!(out, "{}", title.bold())?;
    } else {
        writeln!(out, "{title}")?;
    }
    writeln!(out, "{}", "=".repeat(title.len()))
}

fn heading(out: &mut dyn Write, name: &str, color: bool) -> std::io::Result<()> {
    if color {
        writeln!(out, "{}", name.cyan())?;
    } else {
        writeln!(out, "{name}")?;
    }
    writeln!(out, "{}", "-".repeat(name.chars().count()))
}
