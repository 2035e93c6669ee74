pub mod mock;
pub mod network_manager;

use async_trait::async_trait;

use crate::configuration::{HotspotConfiguration, PlatformError};
use crate::network_info::NetworkInfo;

pub use mock::MockPlatform;
pub use network_manager::NetworkManagerPlatform;

/// The system service that associates the device with a network.
#[async_trait]
pub trait HotspotConfigurationManager: Send + Sync {
    /// Resolves once the platform has finished the join attempt.
    async fn apply(&self, configuration: HotspotConfiguration) -> Result<(), PlatformError>;
}

/// Read-only view of the network the device is currently associated with.
#[async_trait]
pub trait CaptiveNetwork: Send + Sync {
    /// Names of the interfaces that can report network info.
    async fn supported_interfaces(&self) -> crate::Result<Vec<String>>;

    /// Fresh snapshot for `interface`, or `None` when it is not associated.
    async fn current_network_info(&self, interface: &str) -> crate::Result<Option<NetworkInfo>>;
}
