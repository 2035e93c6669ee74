/*!
 * Mock platform
 * Scripted join results and network info, no hardware involved
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;

use super::{CaptiveNetwork, HotspotConfigurationManager};
use crate::configuration::{HotspotConfiguration, PlatformError};
use crate::network_info::{NetworkInfo, BSSID_KEY, SSID_DATA_KEY, SSID_KEY};

const MOCK_INTERFACE: &str = "wlan0";
const MOCK_BSSID: &str = "02:00:00:00:00:01";

#[derive(Debug)]
pub struct MockPlatform {
    outcome: Result<(), PlatformError>,
    interfaces: Vec<String>,
    network_info: Mutex<Option<NetworkInfo>>,
    delay: Duration,
    gate: Option<Arc<Notify>>,
    validate: bool,
    echo_joined_network: bool,
    applied: Mutex<Vec<HotspotConfiguration>>,
    interface_queries: AtomicUsize,
    snapshot_queries: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Joins succeed immediately and `wlan0` reports a fixed network.
    pub fn new() -> Self {
        Self {
            outcome: Ok(()),
            interfaces: vec![MOCK_INTERFACE.to_string()],
            network_info: Mutex::new(Some(
                NetworkInfo::new()
                    .with(SSID_KEY, "MyHomeWiFi")
                    .with(BSSID_KEY, MOCK_BSSID)
                    .with(SSID_DATA_KEY, b"MyHomeWiFi".to_vec()),
            )),
            delay: Duration::ZERO,
            gate: None,
            validate: false,
            echo_joined_network: false,
            applied: Mutex::new(Vec::new()),
            interface_queries: AtomicUsize::new(0),
            snapshot_queries: AtomicUsize::new(0),
        }
    }

    /// Behaves like a small real platform: validates credentials, takes a
    /// moment, and reports back the network that was joined.
    pub fn demo() -> Self {
        Self {
            delay: Duration::from_secs(2),
            validate: true,
            echo_joined_network: true,
            ..Self::new()
        }
    }

    pub fn with_outcome(mut self, outcome: Result<(), PlatformError>) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<String>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_network_info(self, info: Option<NetworkInfo>) -> Self {
        *lock(&self.network_info) = info;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `apply` will not complete until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn applied(&self) -> Vec<HotspotConfiguration> {
        lock(&self.applied).clone()
    }

    pub fn interface_queries(&self) -> usize {
        self.interface_queries.load(Ordering::SeqCst)
    }

    pub fn snapshot_queries(&self) -> usize {
        self.snapshot_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HotspotConfigurationManager for MockPlatform {
    async fn apply(&self, configuration: HotspotConfiguration) -> Result<(), PlatformError> {
        tracing::info!("[MockPlatform] Joining '{}'", configuration.ssid);
        lock(&self.applied).push(configuration.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if self.validate {
            configuration.validate().map_err(PlatformError::configuration)?;
        }
        self.outcome.clone()?;

        if self.echo_joined_network {
            *lock(&self.network_info) = Some(
                NetworkInfo::new()
                    .with(SSID_KEY, configuration.ssid.as_str())
                    .with(BSSID_KEY, MOCK_BSSID)
                    .with(SSID_DATA_KEY, configuration.ssid.as_bytes().to_vec()),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl CaptiveNetwork for MockPlatform {
    async fn supported_interfaces(&self) -> crate::Result<Vec<String>> {
        self.interface_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.interfaces.clone())
    }

    async fn current_network_info(&self, interface: &str) -> crate::Result<Option<NetworkInfo>> {
        self.snapshot_queries.fetch_add(1, Ordering::SeqCst);
        if !self.interfaces.iter().any(|i| i == interface) {
            return Ok(None);
        }
        Ok(lock(&self.network_info).clone())
    }
}
