//! Output-device policy
//!
//! Watches a stream of device-route observations and applies the
//! interruption policy: losing the headphone-like route pauses playback,
//! getting it back resumes only if the interruption itself paused us.
//!
//! Route changes arrive bursty on some platforms (a dock reconnect can flap
//! several times in a few milliseconds), so observations are debounced and
//! only the settled state is applied.

use crate::controller::SessionController;
use aria_core::DeviceState;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Drives device interruption handling for one session.
pub struct DeviceWatcher {
    controller: SessionController,
    debounce: Duration,
}

impl DeviceWatcher {
    /// Watch for a session with the default debounce window.
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Override the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Consume route observations until the sender side closes.
    ///
    /// The first observation only establishes the baseline; a watcher started
    /// while the speakers are active must not pause anything.
    pub async fn run(self, mut states: mpsc::Receiver<DeviceState>) {
        let mut applied: Option<bool> = None;

        while let Some(first) = states.recv().await {
            let mut settled = first;
            // Collapse a burst of flaps into whatever it settles on.
            loop {
                match tokio::time::timeout(self.debounce, states.recv()).await {
                    Ok(Some(next)) => settled = next,
                    Ok(None) => {
                        self.apply(&mut applied, settled).await;
                        return;
                    }
                    Err(_) => break,
                }
            }
            self.apply(&mut applied, settled).await;
        }
    }

    async fn apply(&self, applied: &mut Option<bool>, state: DeviceState) {
        let headphone = state.is_headphone_like;
        let previous = applied.replace(headphone);

        let Some(previous) = previous else {
            debug!(headphone, "device baseline observed");
            return;
        };
        if previous == headphone {
            return;
        }

        let result = if headphone {
            self.controller.resume_for_device().await
        } else {
            self.controller.suspend_for_device().await
        };
        if let Err(err) = result {
            warn!(%err, headphone, "device policy action failed");
        }
    }
}
