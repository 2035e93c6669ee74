use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_file: PathBuf,
    pub network_manager: NetworkManagerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkManagerConfig {
    /// Wireless interface to prefer when several exist.
    pub interface: Option<String>,
    pub dbus_timeout_secs: u64,
    pub activation_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/tmp/hotspot-connector.log"),
            network_manager: NetworkManagerConfig::default(),
        }
    }
}

impl Default for NetworkManagerConfig {
    fn default() -> Self {
        Self {
            interface: None,
            dbus_timeout_secs: 5,
            activation_timeout_secs: 30,
            poll_interval_ms: 250,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            Err(_) => {
                // Create default config if not found
                let config = Self::default();
                if let Some(parent) = path.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(path, toml::to_string_pretty(&config)?);
                Ok(config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [network_manager]
            interface = "wlp3s0"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_file, AppConfig::default().log_file);
        assert_eq!(config.network_manager.interface.as_deref(), Some("wlp3s0"));
        assert_eq!(config.network_manager.activation_timeout_secs, 30);
        assert_eq!(config.network_manager.poll_interval_ms, 250);
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = std::env::temp_dir().join(format!("hotspot-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("hotspot.toml");

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("hotspot-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hotspot.toml");
        fs::write(&path, "log_file = [").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(crate::Error::ConfigParse(_))));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unreadable_file_is_not_replaced_by_defaults() {
        let dir = std::env::temp_dir().join(format!("hotspot-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        // A directory where the file should be cannot be read as text
        assert!(matches!(AppConfig::load(&dir), Err(crate::Error::Io(_))));

        let _ = fs::remove_dir_all(dir);
    }
}
