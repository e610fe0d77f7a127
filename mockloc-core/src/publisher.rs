//! Dual-mode mock publisher
//!
//! The two platform mechanisms have different authorization models
//! (managed app-ops privilege vs. developer-settings mock-app
//! selection), so a run probes once, commits to one mode, and keeps it
//! until teardown. Per-fix failures are logged and swallowed: GPS
//! consumers tolerate missed updates, and a single rejection must not
//! kill a multi-minute route simulation.

use crate::error::StartError;
use crate::fix::Fix;
use crate::model::PublisherMode;
use crate::platform::LocationPlatform;
use crate::probe;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

pub struct MockPublisher {
    platform: Arc<dyn LocationPlatform>,
}

impl MockPublisher {
    pub fn new(platform: Arc<dyn LocationPlatform>) -> Self {
        Self { platform }
    }

    /// Resolve which mock channel this run will use.
    ///
    /// Prefers the managed channel; falls back to registering the raw
    /// test provider (remove-then-add, so a stale registration from a
    /// crashed run cannot wedge us). If both are refused the run is
    /// unstartable.
    pub async fn select_mode(&self) -> Result<PublisherMode, StartError> {
        if probe::try_enable_managed_mock(
            self.platform.as_ref(),
            probe::DEFAULT_RETRIES,
            probe::DEFAULT_BACKOFF,
        )
        .await
        {
            info!("using managed mock channel");
            return Ok(PublisherMode::Managed);
        }

        warn!("managed mock channel unavailable, falling back to test provider");
        if let Err(e) = self.platform.remove_test_provider() {
            debug!("no stale test provider to remove: {}", e);
        }
        match self.platform.add_test_provider() {
            Ok(()) => {
                info!("using test-provider mock channel");
                Ok(PublisherMode::TestProvider)
            }
            Err(e) => {
                error!("test provider registration failed: {}", e);
                Err(StartError::NoMockCapability)
            }
        }
    }

    /// Best-effort injection of one fix. Failures are logged only.
    pub async fn publish(&self, mode: PublisherMode, fix: Fix) {
        match mode {
            PublisherMode::Managed => {
                let (tx, rx) = oneshot::channel();
                self.platform.push_managed_fix(
                    fix,
                    Box::new(move |result| {
                        let _ = tx.send(result);
                    }),
                );
                match rx.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("managed fix rejected: {}", e),
                    Err(_) => warn!("platform dropped fix completion callback"),
                }
            }
            PublisherMode::TestProvider => {
                if let Err(e) = self.platform.push_test_provider_fix(fix) {
                    warn!("test-provider fix rejected: {}", e);
                }
            }
        }
    }

    /// Release whatever the selected mode holds. Idempotent: safe to
    /// call again after a partial setup or a late cancellation.
    pub async fn teardown(&self, mode: PublisherMode) {
        match mode {
            PublisherMode::Managed => {
                if !probe::set_mock_mode(self.platform.as_ref(), false).await {
                    warn!("failed to disable managed mock mode during teardown");
                }
            }
            PublisherMode::TestProvider => {
                if let Err(e) = self.platform.remove_test_provider() {
                    debug!("test provider already removed: {}", e);
                }
            }
        }
    }
}
