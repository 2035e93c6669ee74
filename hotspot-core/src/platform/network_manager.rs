/*!
 * NetworkManager platform
 * Joins and network info over the system D-Bus
 */

use async_trait::async_trait;
use dbus::arg::{PropMap, RefArg, Variant};
use dbus::nonblock::stdintf::org_freedesktop_dbus::Properties;
use dbus::nonblock::{Proxy, SyncConnection};
use dbus::Path;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::{debug, error, info};

use super::{CaptiveNetwork, HotspotConfigurationManager};
use crate::config::NetworkManagerConfig;
use crate::configuration::{ConfigurationError, HotspotConfiguration, PlatformError};
use crate::network_info::{NetworkInfo, BSSID_KEY, SSID_DATA_KEY, SSID_KEY};
use crate::Error;

const NM_SERVICE: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_IFACE: &str = "org.freedesktop.NetworkManager";
const DEVICE_IFACE: &str = "org.freedesktop.NetworkManager.Device";
const WIRELESS_IFACE: &str = "org.freedesktop.NetworkManager.Device.Wireless";
const ACCESS_POINT_IFACE: &str = "org.freedesktop.NetworkManager.AccessPoint";
const ACTIVE_IFACE: &str = "org.freedesktop.NetworkManager.Connection.Active";

const NM_ERROR_PREFIX: &str = "org.freedesktop.NetworkManager";
const NM_SETTING_ERROR_PREFIX: &str = "org.freedesktop.NetworkManager.Settings.Connection.";

const DEVICE_TYPE_WIFI: u32 = 2;

// Longer configured activation timeouts are clamped to this.
const MAX_ACTIVATION_TIMEOUT_SECS: u64 = 24 * 60 * 60;

// NMActiveConnectionState
const ACTIVE_STATE_ACTIVATED: u32 = 2;
const ACTIVE_STATE_DEACTIVATED: u32 = 4;

// NMDeviceStateReason
const REASON_NO_SECRETS: u32 = 7;
const REASON_SUPPLICANT_DISCONNECT: u32 = 8;
const REASON_SUPPLICANT_CONFIG_FAILED: u32 = 9;
const REASON_SUPPLICANT_FAILED: u32 = 10;
const REASON_SUPPLICANT_TIMEOUT: u32 = 11;
const REASON_SSID_NOT_FOUND: u32 = 53;

pub struct NetworkManagerPlatform {
    conn: Arc<SyncConnection>,
    config: NetworkManagerConfig,
}

impl NetworkManagerPlatform {
    pub async fn new(config: NetworkManagerConfig) -> crate::Result<Self> {
        let (resource, conn) = dbus_tokio::connection::new_system_sync()?;
        tokio::spawn(async move {
            let err = resource.await;
            error!("Lost connection to the system bus: {}", err);
        });

        info!("Connected to NetworkManager on the system bus");
        Ok(Self { conn, config })
    }

    fn proxy<'a>(&self, path: impl Into<Path<'a>>) -> Proxy<'a, Arc<SyncConnection>> {
        Proxy::new(
            NM_SERVICE,
            path,
            Duration::from_secs(self.config.dbus_timeout_secs),
            self.conn.clone(),
        )
    }

    /// Wireless devices as (object path, interface name), configured
    /// interface first.
    async fn wireless_devices(&self) -> crate::Result<Vec<(Path<'static>, String)>> {
        let nm = self.proxy(NM_PATH);
        let (devices,): (Vec<Path<'static>>,) = nm.method_call(NM_IFACE, "GetDevices", ()).await?;

        let mut wireless = Vec::new();
        for path in devices {
            let device = self.proxy(path.clone());
            let device_type: u32 = device.get(DEVICE_IFACE, "DeviceType").await?;
            if device_type != DEVICE_TYPE_WIFI {
                continue;
            }
            let interface: String = device.get(DEVICE_IFACE, "Interface").await?;
            wireless.push((path, interface));
        }

        prefer_interface(&mut wireless, self.config.interface.as_deref());
        Ok(wireless)
    }

    async fn wireless_device(&self) -> crate::Result<Path<'static>> {
        self.wireless_devices()
            .await?
            .into_iter()
            .next()
            .map(|(path, _)| path)
            .ok_or(Error::NoWirelessDevice)
    }

    async fn active_access_point(&self, device: &Path<'static>) -> crate::Result<Option<Path<'static>>> {
        let wireless = self.proxy(device.clone());
        let ap: Path<'static> = wireless.get(WIRELESS_IFACE, "ActiveAccessPoint").await?;
        if &*ap == "/" {
            Ok(None)
        } else {
            Ok(Some(ap))
        }
    }

    async fn access_point_info(&self, ap: Path<'static>) -> crate::Result<NetworkInfo> {
        let proxy = self.proxy(ap);
        let ssid: Vec<u8> = proxy.get(ACCESS_POINT_IFACE, "Ssid").await?;
        let bssid: String = proxy.get(ACCESS_POINT_IFACE, "HwAddress").await?;
        let strength: u8 = proxy.get(ACCESS_POINT_IFACE, "Strength").await?;
        let frequency: u32 = proxy.get(ACCESS_POINT_IFACE, "Frequency").await?;
        let max_bitrate: u32 = proxy.get(ACCESS_POINT_IFACE, "MaxBitrate").await?;

        Ok(NetworkInfo::new()
            .with(SSID_KEY, String::from_utf8_lossy(&ssid).into_owned())
            .with(SSID_DATA_KEY, ssid)
            .with(BSSID_KEY, bssid)
            .with("Strength", i64::from(strength))
            .with("Frequency", i64::from(frequency))
            .with("MaxBitrate", i64::from(max_bitrate)))
    }

    async fn is_associated_with(&self, device: &Path<'static>, ssid: &str) -> crate::Result<bool> {
        let Some(ap) = self.active_access_point(device).await? else {
            return Ok(false);
        };
        let current: Vec<u8> = self.proxy(ap).get(ACCESS_POINT_IFACE, "Ssid").await?;
        Ok(current == ssid.as_bytes())
    }

    async fn join(&self, configuration: HotspotConfiguration) -> Result<(), PlatformError> {
        configuration.validate().map_err(PlatformError::configuration)?;

        let device = self.wireless_device().await.map_err(platform_error)?;
        if self
            .is_associated_with(&device, &configuration.ssid)
            .await
            .map_err(platform_error)?
        {
            return Err(PlatformError::configuration(ConfigurationError::AlreadyAssociated));
        }

        let settings = connection_settings(&configuration);
        let options = activation_options(configuration.join_once);
        let nm = self.proxy(NM_PATH);
        let (_, active, _): (Path<'static>, Path<'static>, PropMap) = nm
            .method_call(
                NM_IFACE,
                "AddAndActivateConnection2",
                (settings, device.clone(), Path::from("/"), options),
            )
            .await
            .map_err(|e| map_dbus_error(&e))?;

        debug!("Activation started at {}", &*active);
        self.wait_for_activation(&device, active).await
    }

    async fn wait_for_activation(
        &self,
        device: &Path<'static>,
        active: Path<'static>,
    ) -> Result<(), PlatformError> {
        let timeout = activation_timeout(self.config.activation_timeout_secs);
        let deadline = activation_deadline(Instant::now(), timeout);
        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms.max(1)));

        loop {
            ticker.tick().await;
            let state: Result<u32, dbus::Error> =
                self.proxy(active.clone()).get(ACTIVE_IFACE, "State").await;
            let failed = match state {
                Ok(ACTIVE_STATE_ACTIVATED) => return Ok(()),
                Ok(ACTIVE_STATE_DEACTIVATED) => true,
                Ok(state) => {
                    debug!(state, "Activation in progress");
                    false
                }
                Err(e) if is_gone(&e) => true,
                Err(e) => return Err(map_dbus_error(&e)),
            };
            if failed {
                return Err(self.failure_reason(device).await);
            }

            if Instant::now() >= deadline {
                return Err(PlatformError::configuration_with_message(
                    ConfigurationError::Pending,
                    format!("activation did not finish within {}s", timeout.as_secs()),
                ));
            }
        }
    }

    async fn failure_reason(&self, device: &Path<'static>) -> PlatformError {
        let reason: Result<(u32, u32), dbus::Error> =
            self.proxy(device.clone()).get(DEVICE_IFACE, "StateReason").await;
        match reason {
            Ok((_state, reason)) => PlatformError::configuration_with_message(
                map_state_reason(reason),
                format!("activation failed (device state reason {})", reason),
            ),
            Err(e) => PlatformError::configuration_with_message(
                ConfigurationError::Unknown,
                format!("activation failed: {}", e),
            ),
        }
    }
}

#[async_trait]
impl HotspotConfigurationManager for NetworkManagerPlatform {
    async fn apply(&self, configuration: HotspotConfiguration) -> Result<(), PlatformError> {
        info!(
            ssid = %configuration.ssid,
            join_once = configuration.join_once,
            "Requesting join"
        );
        self.join(configuration).await
    }
}

#[async_trait]
impl CaptiveNetwork for NetworkManagerPlatform {
    async fn supported_interfaces(&self) -> crate::Result<Vec<String>> {
        Ok(self
            .wireless_devices()
            .await?
            .into_iter()
            .map(|(_, interface)| interface)
            .collect())
    }

    async fn current_network_info(&self, interface: &str) -> crate::Result<Option<NetworkInfo>> {
        let devices = self.wireless_devices().await?;
        let Some((device, _)) = devices.into_iter().find(|(_, name)| name == interface) else {
            return Ok(None);
        };
        match self.active_access_point(&device).await? {
            Some(ap) => Ok(Some(self.access_point_info(ap).await?)),
            None => Ok(None),
        }
    }
}

fn variant<T: RefArg + 'static>(value: T) -> Variant<Box<dyn RefArg>> {
    Variant(Box::new(value))
}

fn activation_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_ACTIVATION_TIMEOUT_SECS))
}

fn activation_deadline(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(MAX_ACTIVATION_TIMEOUT_SECS))
}

fn prefer_interface<T>(devices: &mut [(T, String)], preferred: Option<&str>) {
    if let Some(preferred) = preferred {
        devices.sort_by_key(|(_, name)| name != preferred);
    }
}

/// Settings dictionary for `AddAndActivateConnection2`.
fn connection_settings(configuration: &HotspotConfiguration) -> HashMap<String, PropMap> {
    let mut connection = PropMap::new();
    connection.insert("id".into(), variant(configuration.ssid.clone()));
    connection.insert("type".into(), variant("802-11-wireless".to_string()));
    connection.insert("autoconnect".into(), variant(false));

    let mut wireless = PropMap::new();
    wireless.insert("ssid".into(), variant(configuration.ssid.as_bytes().to_vec()));
    wireless.insert("mode".into(), variant("infrastructure".to_string()));

    let mut security = PropMap::new();
    if configuration.is_wep {
        security.insert("key-mgmt".into(), variant("none".to_string()));
        security.insert("wep-key0".into(), variant(configuration.passphrase.clone()));
        // NM_WEP_KEY_TYPE_KEY: hex or ASCII key, not a hashed passphrase.
        security.insert("wep-key-type".into(), variant(1u32));
    } else {
        security.insert("key-mgmt".into(), variant("wpa-psk".to_string()));
        security.insert("psk".into(), variant(configuration.passphrase.clone()));
    }

    let mut ipv4 = PropMap::new();
    ipv4.insert("method".into(), variant("auto".to_string()));
    let mut ipv6 = PropMap::new();
    ipv6.insert("method".into(), variant("auto".to_string()));

    let mut settings = HashMap::new();
    settings.insert("connection".to_string(), connection);
    settings.insert("802-11-wireless".to_string(), wireless);
    settings.insert("802-11-wireless-security".to_string(), security);
    settings.insert("ipv4".to_string(), ipv4);
    settings.insert("ipv6".to_string(), ipv6);
    settings
}

/// A join-once profile lives only until it is deactivated.
fn activation_options(join_once: bool) -> PropMap {
    let persist = if join_once { "volatile" } else { "disk" };
    let mut options = PropMap::new();
    options.insert("persist".into(), variant(persist.to_string()));
    options
}

fn is_gone(e: &dbus::Error) -> bool {
    matches!(
        e.name(),
        Some("org.freedesktop.DBus.Error.UnknownObject")
            | Some("org.freedesktop.DBus.Error.UnknownMethod")
    )
}

fn platform_error(e: Error) -> PlatformError {
    match e {
        Error::Dbus(e) => map_dbus_error(&e),
        Error::NoWirelessDevice => PlatformError::configuration_with_message(
            ConfigurationError::SystemConfiguration,
            "no wireless device found",
        ),
        Error::Platform(e) => e,
        other => PlatformError::configuration_with_message(
            ConfigurationError::Internal,
            other.to_string(),
        ),
    }
}

fn map_dbus_error(e: &dbus::Error) -> PlatformError {
    classify_dbus_error(
        e.name().unwrap_or("org.freedesktop.DBus.Error.Failed"),
        e.message().unwrap_or_default(),
    )
}

/// Translates a D-Bus error name into a configuration error. Names outside
/// NetworkManager's namespace keep their own domain.
fn classify_dbus_error(name: &str, message: &str) -> PlatformError {
    let case = match name {
        n if n.starts_with(NM_ERROR_PREFIX) && n.ends_with(".PermissionDenied") => {
            ConfigurationError::UserDenied
        }
        "org.freedesktop.NetworkManager.ConnectionAlreadyActive" => {
            ConfigurationError::AlreadyAssociated
        }
        "org.freedesktop.NetworkManager.UnknownDevice"
        | "org.freedesktop.NetworkManager.ConnectionNotAvailable"
        | "org.freedesktop.NetworkManager.DependencyFailed" => {
            ConfigurationError::SystemConfiguration
        }
        n if n.starts_with(NM_SETTING_ERROR_PREFIX) => setting_error(message),
        "org.freedesktop.NetworkManager.Settings.NotSupported"
        | "org.freedesktop.DBus.Error.UnknownMethod" => ConfigurationError::JoinOnceNotSupported,
        "org.freedesktop.NetworkManager.Failed" | "org.freedesktop.NetworkManager.Settings.Failed" => {
            ConfigurationError::Internal
        }
        "org.freedesktop.NetworkManager.InvalidArguments"
        | "org.freedesktop.NetworkManager.Settings.InvalidArguments"
        | "org.freedesktop.NetworkManager.Settings.InvalidConnection" => {
            ConfigurationError::Invalid
        }
        n if n.starts_with(NM_ERROR_PREFIX) => ConfigurationError::Unknown,
        _ => return PlatformError::new(name, 0, message),
    };
    PlatformError::configuration_with_message(case, message)
}

fn setting_error(message: &str) -> ConfigurationError {
    let message = message.to_lowercase();
    if message.contains("wep-key") {
        ConfigurationError::InvalidWepPassphrase
    } else if message.contains("psk") {
        ConfigurationError::InvalidWpaPassphrase
    } else if message.contains("ssid") {
        ConfigurationError::InvalidSsid
    } else {
        ConfigurationError::Invalid
    }
}

fn map_state_reason(reason: u32) -> ConfigurationError {
    match reason {
        REASON_NO_SECRETS | REASON_SUPPLICANT_DISCONNECT | REASON_SUPPLICANT_TIMEOUT => {
            ConfigurationError::InvalidWpaPassphrase
        }
        REASON_SUPPLICANT_CONFIG_FAILED => ConfigurationError::Invalid,
        REASON_SUPPLICANT_FAILED => ConfigurationError::Internal,
        REASON_SSID_NOT_FOUND => ConfigurationError::InvalidSsid,
        _ => ConfigurationError::Unknown,
    }
}
