//! Simulated location platform
//!
//! An in-process stand-in for the OS location subsystem. It enforces
//! the same rules a real platform does (mock mode must be on before the
//! managed channel accepts fixes, the test provider must be registered
//! before it accepts fixes) and records every injected fix so tests and
//! the demo server can observe what reached the "OS". Denial behavior
//! is scriptable per channel.

use mockloc_core::fix::Fix;
use mockloc_core::model::PublisherMode;
use mockloc_core::platform::{Completion, LocationPlatform, PlatformError};
use std::sync::Mutex;
use tracing::debug;

/// A fix that reached the simulated subsystem, tagged with the channel
/// it arrived through.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectedFix {
    pub channel: PublisherMode,
    pub fix: Fix,
}

#[derive(Debug)]
struct Inner {
    authorized: bool,
    authorization_unavailable: bool,
    managed_denials_remaining: u32,
    deny_managed_push: bool,
    allow_test_provider: bool,
    mock_mode: bool,
    test_provider_registered: bool,
    injected: Vec<InjectedFix>,
}

pub struct SimulatedPlatform {
    inner: Mutex<Inner>,
}

impl SimulatedPlatform {
    /// Permissive platform: managed channel accepts immediately and the
    /// test provider can be registered.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                authorized: true,
                authorization_unavailable: false,
                managed_denials_remaining: 0,
                deny_managed_push: false,
                allow_test_provider: true,
                mock_mode: false,
                test_provider_registered: false,
                injected: Vec::new(),
            }),
        }
    }

    /// Deny the next `n` managed mock-mode toggles before accepting.
    pub fn deny_managed_attempts(self, n: u32) -> Self {
        self.inner.lock().unwrap().managed_denials_remaining = n;
        self
    }

    /// Reject every fix pushed through the managed channel.
    pub fn deny_managed_push(self) -> Self {
        self.inner.lock().unwrap().deny_managed_push = true;
        self
    }

    /// Refuse test-provider registration (the mock-app selection is
    /// missing in developer settings).
    pub fn deny_test_provider(self) -> Self {
        self.inner.lock().unwrap().allow_test_provider = false;
        self
    }

    /// Report the app as not authorized to mock locations.
    pub fn deny_authorization(self) -> Self {
        self.inner.lock().unwrap().authorized = false;
        self
    }

    /// Make the authorization query itself fail, as on platform
    /// versions that cannot answer it.
    pub fn authorization_unavailable(self) -> Self {
        self.inner.lock().unwrap().authorization_unavailable = true;
        self
    }

    pub fn mock_mode_enabled(&self) -> bool {
        self.inner.lock().unwrap().mock_mode
    }

    pub fn test_provider_registered(&self) -> bool {
        self.inner.lock().unwrap().test_provider_registered
    }

    /// Every fix that reached the subsystem, in injection order.
    pub fn injected_fixes(&self) -> Vec<InjectedFix> {
        self.inner.lock().unwrap().injected.clone()
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationPlatform for SimulatedPlatform {
    fn set_mock_mode(&self, enable: bool, done: Completion) {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            if enable && inner.managed_denials_remaining > 0 {
                inner.managed_denials_remaining -= 1;
                Err(PlatformError::PermissionDenied(
                    "mock location app-op not granted".into(),
                ))
            } else {
                inner.mock_mode = enable;
                Ok(())
            }
        };
        done(result);
    }

    fn push_managed_fix(&self, fix: Fix, done: Completion) {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            if !inner.mock_mode {
                Err(PlatformError::Rejected("mock mode is not enabled".into()))
            } else if inner.deny_managed_push {
                Err(PlatformError::Rejected("managed channel refused fix".into()))
            } else {
                debug!("managed fix injected: {}, {}", fix.lat, fix.lng);
                inner.injected.push(InjectedFix {
                    channel: PublisherMode::Managed,
                    fix,
                });
                Ok(())
            }
        };
        done(result);
    }

    fn add_test_provider(&self) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.allow_test_provider {
            return Err(PlatformError::PermissionDenied(
                "app is not the selected mock location app".into(),
            ));
        }
        if inner.test_provider_registered {
            return Err(PlatformError::Rejected("test provider already exists".into()));
        }
        inner.test_provider_registered = true;
        Ok(())
    }

    fn remove_test_provider(&self) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.test_provider_registered {
            return Err(PlatformError::Rejected("no test provider registered".into()));
        }
        inner.test_provider_registered = false;
        Ok(())
    }

    fn push_test_provider_fix(&self, fix: Fix) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.test_provider_registered {
            return Err(PlatformError::Rejected("test provider not registered".into()));
        }
        debug!("test-provider fix injected: {}, {}", fix.lat, fix.lng);
        inner.injected.push(InjectedFix {
            channel: PublisherMode::TestProvider,
            fix,
        });
        Ok(())
    }

    fn mock_authorization(&self) -> Result<bool, PlatformError> {
        let inner = self.inner.lock().unwrap();
        if inner.authorization_unavailable {
            return Err(PlatformError::Unsupported(
                "app-ops query not available on this platform version".into(),
            ));
        }
        Ok(inner.authorized)
    }
}
