/*!
 * Hotspot Connector core
 * Join a Wi-Fi network by name and passphrase, classify the outcome,
 * and report what the platform says about the network we ended up on.
 */

pub mod classifier;
pub mod config;
pub mod configuration;
pub mod network_info;
pub mod platform;
pub mod screen;

pub use classifier::{classify, JoinOutcome};
pub use configuration::{
    ConfigurationError, HotspotConfiguration, PlatformError, HOTSPOT_CONFIGURATION_ERROR_DOMAIN,
};
pub use network_info::{InfoValue, NetworkInfo};
pub use screen::ConnectScreen;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("D-Bus error: {0}")]
    Dbus(#[from] dbus::Error),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("No wireless device found")]
    NoWirelessDevice,
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;
