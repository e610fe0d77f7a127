//! Capability probe for the managed mock channel
//!
//! The managed channel can take a moment to accept mock mode after the
//! app is granted the privilege, so enabling is retried with a short
//! backoff. All platform failures are converted to `false`; the probe
//! itself never raises.

use crate::platform::LocationPlatform;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{error, warn};

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

/// Toggle the managed mock channel, bridging the platform callback into
/// a single-resume future. A backend that drops the completion without
/// calling it resolves as failure.
pub async fn set_mock_mode(platform: &dyn LocationPlatform, enable: bool) -> bool {
    let (tx, rx) = oneshot::channel();
    platform.set_mock_mode(
        enable,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    match rx.await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("set_mock_mode({}) failed: {}", enable, e);
            false
        }
        Err(_) => {
            error!("platform dropped mock-mode completion callback");
            false
        }
    }
}

/// Attempt to enable the managed mock channel, retrying with backoff.
/// Returns whether the channel is now enabled.
pub async fn try_enable_managed_mock(
    platform: &dyn LocationPlatform,
    retries: u32,
    backoff: Duration,
) -> bool {
    for attempt in 1..=retries {
        if set_mock_mode(platform, true).await {
            return true;
        }
        warn!(
            "enable managed mock attempt {}/{} failed, retrying in {:?}",
            attempt, retries, backoff
        );
        sleep(backoff).await;
    }
    error!(
        "failed to enable managed mock mode after {} attempts; \
         check that the app is allowed to mock locations",
        retries
    );
    false
}

/// Non-blocking authorization hint: does the platform consider this app
/// allowed to publish mock locations right now? Query errors degrade to
/// `false` without aborting the caller.
pub fn is_mock_authorized(platform: &dyn LocationPlatform) -> bool {
    match platform.mock_authorization() {
        Ok(allowed) => allowed,
        Err(e) => {
            warn!("mock authorization check failed: {}", e);
            false
        }
    }
}
