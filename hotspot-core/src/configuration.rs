/*!
 * Join request and the configuration error taxonomy
 */

use std::fmt;
use thiserror::Error;

/// Error domain for join-configuration failures. Errors from any other
/// domain are generic platform failures.
pub const HOTSPOT_CONFIGURATION_ERROR_DOMAIN: &str = "hotspot.configuration";

const MAX_SSID_BYTES: usize = 32;

/// A single join attempt: network name, passphrase and security policy.
#[derive(Clone, PartialEq, Eq)]
pub struct HotspotConfiguration {
    pub ssid: String,
    pub passphrase: String,
    pub is_wep: bool,
    /// Use the credential for this attempt only, never save it.
    pub join_once: bool,
}

impl HotspotConfiguration {
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>, is_wep: bool) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
            is_wep,
            join_once: false,
        }
    }

    pub fn join_once(mut self, join_once: bool) -> Self {
        self.join_once = join_once;
        self
    }

    /// Checks the credential shape the way the join API does before any
    /// radio work happens.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_BYTES {
            return Err(ConfigurationError::InvalidSsid);
        }

        if self.is_wep {
            if !is_valid_wep_key(&self.passphrase) {
                return Err(ConfigurationError::InvalidWepPassphrase);
            }
        } else if !is_valid_wpa_passphrase(&self.passphrase) {
            return Err(ConfigurationError::InvalidWpaPassphrase);
        }

        Ok(())
    }
}

impl fmt::Debug for HotspotConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotspotConfiguration")
            .field("ssid", &self.ssid)
            .field("passphrase", &"********")
            .field("is_wep", &self.is_wep)
            .field("join_once", &self.join_once)
            .finish()
    }
}

fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_valid_wpa_passphrase(passphrase: &str) -> bool {
    let len = passphrase.len();
    if len == 64 {
        return is_hex(passphrase);
    }
    passphrase.is_ascii() && (8..=63).contains(&len)
}

fn is_valid_wep_key(key: &str) -> bool {
    match key.len() {
        5 | 13 => key.is_ascii(),
        10 | 26 => is_hex(key),
        _ => false,
    }
}

/// Closed set of join-configuration failures. Codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigurationError {
    #[error("the configuration is invalid")]
    Invalid,
    #[error("the SSID is invalid")]
    InvalidSsid,
    #[error("the WPA/WPA2 passphrase is invalid")]
    InvalidWpaPassphrase,
    #[error("the WEP passphrase is invalid")]
    InvalidWepPassphrase,
    #[error("the EAP settings are invalid")]
    InvalidEapSettings,
    #[error("the Hotspot 2.0 settings are invalid")]
    InvalidHs20Settings,
    #[error("the Hotspot 2.0 domain name is invalid")]
    InvalidHs20DomainName,
    #[error("the user denied the join request")]
    UserDenied,
    #[error("an internal error occurred")]
    Internal,
    #[error("a previous join request is still pending")]
    Pending,
    #[error("the system configuration is invalid")]
    SystemConfiguration,
    #[error("an unknown error occurred")]
    Unknown,
    #[error("join-once is not supported")]
    JoinOnceNotSupported,
    #[error("the device is already associated with this network")]
    AlreadyAssociated,
    #[error("the application is not in the foreground")]
    ApplicationIsNotInForeground,
    #[error("the SSID prefix is invalid")]
    InvalidSsidPrefix,
}

impl ConfigurationError {
    pub const ALL: [ConfigurationError; 16] = [
        ConfigurationError::Invalid,
        ConfigurationError::InvalidSsid,
        ConfigurationError::InvalidWpaPassphrase,
        ConfigurationError::InvalidWepPassphrase,
        ConfigurationError::InvalidEapSettings,
        ConfigurationError::InvalidHs20Settings,
        ConfigurationError::InvalidHs20DomainName,
        ConfigurationError::UserDenied,
        ConfigurationError::Internal,
        ConfigurationError::Pending,
        ConfigurationError::SystemConfiguration,
        ConfigurationError::Unknown,
        ConfigurationError::JoinOnceNotSupported,
        ConfigurationError::AlreadyAssociated,
        ConfigurationError::ApplicationIsNotInForeground,
        ConfigurationError::InvalidSsidPrefix,
    ];

    pub fn code(self) -> i64 {
        match self {
            ConfigurationError::Invalid => 0,
            ConfigurationError::InvalidSsid => 1,
            ConfigurationError::InvalidWpaPassphrase => 2,
            ConfigurationError::InvalidWepPassphrase => 3,
            ConfigurationError::InvalidEapSettings => 4,
            ConfigurationError::InvalidHs20Settings => 5,
            ConfigurationError::InvalidHs20DomainName => 6,
            ConfigurationError::UserDenied => 7,
            ConfigurationError::Internal => 8,
            ConfigurationError::Pending => 9,
            ConfigurationError::SystemConfiguration => 10,
            ConfigurationError::Unknown => 11,
            ConfigurationError::JoinOnceNotSupported => 12,
            ConfigurationError::AlreadyAssociated => 13,
            ConfigurationError::ApplicationIsNotInForeground => 14,
            ConfigurationError::InvalidSsidPrefix => 15,
        }
    }

    /// Returns `None` for codes added after this enumeration was written.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|case| case.code() == code)
    }
}

/// An error reported by a platform collaborator: a domain, a code within
/// that domain, and a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PlatformError {
    pub domain: String,
    pub code: i64,
    pub message: String,
}

impl PlatformError {
    pub fn new(domain: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            message: message.into(),
        }
    }

    /// A configuration-domain error described by the case's own text.
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::new(HOTSPOT_CONFIGURATION_ERROR_DOMAIN, error.code(), error.to_string())
    }

    pub fn configuration_with_message(error: ConfigurationError, message: impl Into<String>) -> Self {
        Self::new(HOTSPOT_CONFIGURATION_ERROR_DOMAIN, error.code(), message)
    }

    pub fn is_configuration_error(&self) -> bool {
        self.domain == HOTSPOT_CONFIGURATION_ERROR_DOMAIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_the_enumeration() {
        for (expected, case) in ConfigurationError::ALL.iter().enumerate() {
            assert_eq!(case.code(), expected as i64);
            assert_eq!(ConfigurationError::from_code(expected as i64), Some(*case));
        }
    }

    #[test]
    fn later_added_codes_are_not_classified() {
        assert_eq!(ConfigurationError::from_code(16), None);
        assert_eq!(ConfigurationError::from_code(-1), None);
        assert_eq!(ConfigurationError::from_code(1_000), None);
    }

    #[test]
    fn wpa_passphrase_rules() {
        let ok = HotspotConfiguration::new("home", "password1", false);
        assert_eq!(ok.validate(), Ok(()));

        let short = HotspotConfiguration::new("home", "short", false);
        assert_eq!(short.validate(), Err(ConfigurationError::InvalidWpaPassphrase));

        let long = HotspotConfiguration::new("home", "x".repeat(64), false);
        assert_eq!(long.validate(), Err(ConfigurationError::InvalidWpaPassphrase));

        let raw_psk = HotspotConfiguration::new("home", "ab".repeat(32), false);
        assert_eq!(raw_psk.validate(), Ok(()));
    }

    #[test]
    fn wep_key_rules() {
        assert_eq!(HotspotConfiguration::new("cafe", "abcde", true).validate(), Ok(()));
        assert_eq!(HotspotConfiguration::new("cafe", "0123456789", true).validate(), Ok(()));
        assert_eq!(
            HotspotConfiguration::new("cafe", "012345678g", true).validate(),
            Err(ConfigurationError::InvalidWepPassphrase)
        );
        assert_eq!(
            HotspotConfiguration::new("cafe", "password1", true).validate(),
            Err(ConfigurationError::InvalidWepPassphrase)
        );
    }

    #[test]
    fn ssid_rules() {
        assert_eq!(
            HotspotConfiguration::new("", "password1", false).validate(),
            Err(ConfigurationError::InvalidSsid)
        );
        assert_eq!(
            HotspotConfiguration::new("s".repeat(33), "password1", false).validate(),
            Err(ConfigurationError::InvalidSsid)
        );
        assert_eq!(
            HotspotConfiguration::new("s".repeat(32), "password1", false).validate(),
            Ok(())
        );
    }

    #[test]
    fn debug_output_hides_the_passphrase() {
        let configuration = HotspotConfiguration::new("home", "hunter22", false).join_once(true);
        let debug = format!("{:?}", configuration);
        assert!(debug.contains("home"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn platform_error_domains() {
        let configured = PlatformError::configuration(ConfigurationError::UserDenied);
        assert!(configured.is_configuration_error());
        assert_eq!(configured.code, 7);
        assert_eq!(configured.to_string(), "the user denied the join request");

        let other = PlatformError::new("org.freedesktop.DBus.Error.ServiceUnknown", 0, "no NM");
        assert!(!other.is_configuration_error());
    }
}
