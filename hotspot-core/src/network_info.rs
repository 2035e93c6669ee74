/*!
 * Current network info snapshot and its reporter
 */

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::platform::CaptiveNetwork;

pub const SSID_KEY: &str = "SSID";
pub const BSSID_KEY: &str = "BSSID";
pub const SSID_DATA_KEY: &str = "SSIDDATA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InfoValue {
    Text(String),
    Bytes(Vec<u8>),
    Number(i64),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Text(text) => f.write_str(text),
            InfoValue::Bytes(bytes) => {
                f.write_str("<")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 && i % 4 == 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                f.write_str(">")
            }
            InfoValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Text(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Text(value)
    }
}

impl From<Vec<u8>> for InfoValue {
    fn from(value: Vec<u8>) -> Self {
        InfoValue::Bytes(value)
    }
}

impl From<i64> for InfoValue {
    fn from(value: i64) -> Self {
        InfoValue::Number(value)
    }
}

/// Point-in-time description of the network an interface is associated with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NetworkInfo {
    entries: BTreeMap<String, InfoValue>,
}

impl NetworkInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<InfoValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<InfoValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(InfoValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InfoValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two-line label text, or `None` when the name or hardware address is
    /// missing or not text.
    pub fn label_text(&self) -> Option<String> {
        let ssid = printable(self.text(SSID_KEY)?);
        let bssid = printable(self.text(BSSID_KEY)?);
        Some(format!("SSID {}\nBSSID {}", ssid, bssid))
    }
}

/// SSIDs are arbitrary bytes; keep control characters from breaking the
/// two-line label.
fn printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// Queries the snapshot for the first interface the platform reports.
/// Any failure along the way is treated as "no snapshot".
pub async fn fetch_connected_wifi_info(network: &dyn CaptiveNetwork) -> Option<NetworkInfo> {
    let interfaces = match network.supported_interfaces().await {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Failed to list wireless interfaces: {}", e);
            return None;
        }
    };

    let Some(interface) = interfaces.first() else {
        debug!("No wireless interface reported");
        return None;
    };

    match network.current_network_info(interface).await {
        Ok(info) => info,
        Err(e) => {
            warn!("Failed to read network info for {}: {}", interface, e);
            None
        }
    }
}

/// Logs the snapshot and returns the label text for it.
pub fn report(info: &NetworkInfo) -> Option<String> {
    if let Some(ssid) = info.get(SSID_KEY) {
        info!("we are currently connected with {}", ssid);
    }
    info!("further info:");
    for (key, value) in info.iter() {
        info!(".  {} {}", key, value);
    }

    let label = info.label_text();
    if label.is_none() {
        warn!("Network info lacks a text SSID or BSSID, leaving label unchanged");
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_has_name_then_hardware_address() {
        let info = NetworkInfo::new()
            .with(SSID_KEY, "HomeNet")
            .with(BSSID_KEY, "aa:bb:cc:dd:ee:ff")
            .with(SSID_DATA_KEY, b"HomeNet".to_vec())
            .with("Strength", 80i64);
        assert_eq!(
            info.label_text().as_deref(),
            Some("SSID HomeNet\nBSSID aa:bb:cc:dd:ee:ff")
        );
        assert_eq!(report(&info), info.label_text());
    }

    #[test]
    fn missing_or_non_text_keys_produce_no_label() {
        let no_bssid = NetworkInfo::new().with(SSID_KEY, "HomeNet");
        assert_eq!(report(&no_bssid), None);

        let bytes_ssid = NetworkInfo::new()
            .with(SSID_KEY, b"HomeNet".to_vec())
            .with(BSSID_KEY, "aa:bb:cc:dd:ee:ff");
        assert_eq!(report(&bytes_ssid), None);

        assert_eq!(report(&NetworkInfo::new()), None);
    }

    #[test]
    fn values_display_like_the_platform_dump() {
        assert_eq!(InfoValue::from("x").to_string(), "x");
        assert_eq!(InfoValue::from(42i64).to_string(), "42");
        assert_eq!(
            InfoValue::from(vec![0x48u8, 0x6f, 0x6d, 0x65, 0x4e]).to_string(),
            "<486f6d65 4e>"
        );
    }

    #[test]
    fn serializes_as_a_flat_object() {
        let info = NetworkInfo::new()
            .with(SSID_KEY, "HomeNet")
            .with("Strength", 80i64)
            .with(SSID_DATA_KEY, vec![1u8, 2]);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "SSID": "HomeNet", "Strength": 80, "SSIDDATA": [1, 2] })
        );
    }

    #[test]
    fn control_characters_in_the_name_stay_on_one_line() {
        let info = NetworkInfo::new()
            .with(SSID_KEY, "Home\nNet\t\u{1b}")
            .with(BSSID_KEY, "aa:bb:cc:dd:ee:ff");
        let label = info.label_text().unwrap();

        assert_eq!(label, "SSID Home\\nNet\\t\\u{1b}\nBSSID aa:bb:cc:dd:ee:ff");
        assert_eq!(label.lines().count(), 2);
    }
}
