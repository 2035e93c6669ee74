/*!
 * Connect screen controller
 * Owns the busy indicator and info label, issues join requests and
 * applies their completions while the screen is still alive.
 */

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::classifier::{classify, JoinOutcome};
use crate::configuration::HotspotConfiguration;
use crate::network_info::{fetch_connected_wifi_info, report};
use crate::platform::{CaptiveNetwork, HotspotConfigurationManager};

/// Busy indicator. Animates while any join request is outstanding.
#[derive(Debug, Default)]
pub struct ActivityIndicator {
    outstanding: usize,
}

impl ActivityIndicator {
    pub fn start_animating(&mut self) {
        self.outstanding += 1;
    }

    pub fn stop_animating(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    pub fn is_animating(&self) -> bool {
        self.outstanding > 0
    }
}

#[derive(Debug, Default)]
pub struct InfoLabel {
    text: Option<String>,
}

impl InfoLabel {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }
}

#[derive(Debug, Default)]
pub struct ScreenState {
    pub activity_indicator: ActivityIndicator,
    pub info_label: InfoLabel,
}

pub struct ConnectScreen {
    manager: Arc<dyn HotspotConfigurationManager>,
    network: Arc<dyn CaptiveNetwork>,
    state: Arc<Mutex<ScreenState>>,
}

fn lock(state: &Mutex<ScreenState>) -> MutexGuard<'_, ScreenState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One count on the busy indicator, released when dropped. The join task
/// owns it, so the count is released even if the task unwinds.
struct Busy {
    screen: Weak<Mutex<ScreenState>>,
}

impl Busy {
    fn start(state: &Arc<Mutex<ScreenState>>) -> Self {
        lock(state).activity_indicator.start_animating();
        Self {
            screen: Arc::downgrade(state),
        }
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        if let Some(state) = self.screen.upgrade() {
            lock(&state).activity_indicator.stop_animating();
        }
    }
}

impl ConnectScreen {
    pub fn new(
        manager: Arc<dyn HotspotConfigurationManager>,
        network: Arc<dyn CaptiveNetwork>,
    ) -> Self {
        Self {
            manager,
            network,
            state: Arc::new(Mutex::new(ScreenState::default())),
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).activity_indicator.is_animating()
    }

    pub fn info_label(&self) -> Option<String> {
        lock(&self.state).info_label.text().map(str::to_string)
    }

    /// Issues one join-once WPA request for the given credentials. Empty
    /// input is ignored. The returned handle resolves once the completion
    /// has been applied to the screen.
    pub fn connect_button_tapped(&self, ssid: &str, password: &str) -> Option<JoinHandle<()>> {
        if ssid.is_empty() || password.is_empty() {
            debug!("Connect tapped with empty credentials, ignoring");
            return None;
        }

        let busy = Busy::start(&self.state);

        let configuration = HotspotConfiguration::new(ssid, password, false).join_once(true);
        let manager = self.manager.clone();
        let network = self.network.clone();
        let span = info_span!("join", attempt = %Uuid::new_v4(), ssid = %ssid);

        Some(tokio::spawn(
            async move {
                let result = manager.apply(configuration).await;
                debug!("error is {:?}", result.as_ref().err());
                complete(busy, network, result.err()).await;
            }
            .instrument(span),
        ))
    }
}

async fn complete(
    busy: Busy,
    network: Arc<dyn CaptiveNetwork>,
    error: Option<crate::PlatformError>,
) {
    let screen = busy.screen.clone();
    drop(busy);
    if screen.strong_count() == 0 {
        info!("Screen closed before the join finished");
        return;
    }

    let outcome = classify(error.as_ref());
    outcome.log(error.as_ref());
    if outcome != JoinOutcome::Joined {
        return;
    }

    info!("Reading current network info");
    let Some(wifi) = fetch_connected_wifi_info(network.as_ref()).await else {
        return;
    };
    let Some(label) = report(&wifi) else {
        return;
    };

    match screen.upgrade() {
        Some(state) => lock(&state).info_label.set_text(label),
        None => info!("Screen closed before network info arrived"),
    }
}
