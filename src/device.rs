//! Descriptors of the devices attached to the host
//!
//! These are plain values produced by a [DeviceEnumerator]; every call
//! returns a fresh snapshot and nothing here is ever written back.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A serial port endpoint as reported by the operating system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// System name of the port, e.g. `/dev/ttyUSB0` or `COM3`
    pub port: String,
    /// Opaque vendor metadata, e.g. `USB VID:PID=2341:0043 SER=7523`
    #[serde(rename = "hwid")]
    pub hardware_id: String,
    /// Human readable description of the device
    pub description: String,
}

impl PortDescriptor {
    pub fn new(
        port: impl Into<String>,
        hardware_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        PortDescriptor {
            port: port.into(),
            hardware_id: hardware_id.into(),
            description: description.into(),
        }
    }
}

/// A mounted logical device (disk, volume)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalDevice {
    pub path: String,
    pub name: String,
}

/// A service announced over multicast DNS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdnsService {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A USB vendor/product identifier pair, as written in board metadata
///
/// Both halves are kept verbatim (`"0x2341"`); the `0x` prefix is only
/// stripped when building the token matched against a port's hardware ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct HardwareId {
    pub vendor: String,
    pub product: String,
}

impl HardwareId {
    pub fn new(vendor: impl Into<String>, product: impl Into<String>) -> Self {
        HardwareId {
            vendor: vendor.into(),
            product: product.into(),
        }
    }

    /// The `vendor:product` token searched for in a port's hardware ID
    pub fn token(&self) -> String {
        fn strip(half: &str) -> &str {
            half.strip_prefix("0x")
                .or_else(|| half.strip_prefix("0X"))
                .unwrap_or(half)
        }

        format!("{}:{}", strip(&self.vendor), strip(&self.product))
    }
}

impl From<(String, String)> for HardwareId {
    fn from((vendor, product): (String, String)) -> Self {
        HardwareId { vendor, product }
    }
}

impl From<HardwareId> for (String, String) {
    fn from(id: HardwareId) -> Self {
        (id.vendor, id.product)
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vendor, self.product)
    }
}

/// The ordered hardware IDs of a board profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardHardwareIds(Vec<HardwareId>);

impl BoardHardwareIds {
    pub fn new(ids: Vec<HardwareId>) -> Self {
        BoardHardwareIds(ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HardwareId> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<HardwareId>> for BoardHardwareIds {
    fn from(ids: Vec<HardwareId>) -> Self {
        BoardHardwareIds(ids)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for BoardHardwareIds {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        BoardHardwareIds(
            iter.into_iter()
                .map(|(vendor, product)| HardwareId::new(vendor, product))
                .collect(),
        )
    }
}

/// Source of device listings
///
/// Implementations wrap operating system APIs; each call takes a new
/// snapshot.
pub trait DeviceEnumerator {
    /// Serial ports, in the order the operating system reports them
    fn serial_ports(&self) -> Result<Vec<PortDescriptor>, Error>;

    /// Mounted logical devices
    fn logical_devices(&self) -> Result<Vec<LogicalDevice>, Error>;

    /// Services announced over multicast DNS
    fn mdns_services(&self) -> Result<Vec<MdnsService>, Error>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn token_strips_hex_prefix() {
        assert_eq!(HardwareId::new("0x2341", "0x0043").token(), "2341:0043");
        assert_eq!(HardwareId::new("1A86", "0X7523").token(), "1A86:7523");
    }

    #[test]
    fn hardware_ids_from_pairs() {
        let ids: BoardHardwareIds = toml::from_str::<toml::Table>(
            r#"hwids = [["0x2341", "0x0043"], ["0x2A03", "0x0043"]]"#,
        )
        .unwrap()["hwids"]
            .clone()
            .try_into()
            .unwrap();

        assert_eq!(
            ids,
            [("0x2341", "0x0043"), ("0x2A03", "0x0043")]
                .into_iter()
                .collect::<BoardHardwareIds>()
        );
    }

    #[test]
    fn port_descriptor_serializes_hwid() {
        let port = PortDescriptor::new("COM3", "USB VID:PID=2341:0043", "Arduino Uno");
        let value = toml::Value::try_from(&port).unwrap();

        assert_eq!(value["hwid"].as_str(), Some("USB VID:PID=2341:0043"));
    }
}
