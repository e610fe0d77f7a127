//! Platform location-subsystem seam
//!
//! The OS exposes two mutually exclusive mock mechanisms: a managed
//! location-services channel (asynchronous, callback based) and a raw
//! test-provider channel (synchronous). This trait mirrors that shape
//! so backends stay thin; the callback calls are bridged into futures
//! by [`crate::probe`] and [`crate::publisher`].

use crate::fix::Fix;
use thiserror::Error;

/// Completion callback for the asynchronous platform calls. Invoked
/// exactly once; a backend that drops it without calling is treated as
/// a failure by the bridging side.
pub type Completion = Box<dyn FnOnce(Result<(), PlatformError>) + Send + 'static>;

/// Errors raised by a platform backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("mock location permission denied: {0}")]
    PermissionDenied(String),

    #[error("rejected by location subsystem: {0}")]
    Rejected(String),

    #[error("unsupported on this platform: {0}")]
    Unsupported(String),
}

/// Access to a platform's mock-location subsystem.
///
/// Implementations must be cheap to call from an async task: the
/// synchronous methods may not block, and the callback methods must
/// invoke their completion promptly (immediately or from another
/// thread).
pub trait LocationPlatform: Send + Sync {
    /// Toggle the managed mock channel on or off.
    fn set_mock_mode(&self, enable: bool, done: Completion);

    /// Submit a fix through the managed channel.
    fn push_managed_fix(&self, fix: Fix, done: Completion);

    /// Register the raw test provider.
    fn add_test_provider(&self) -> Result<(), PlatformError>;

    /// Remove the raw test provider registration.
    fn remove_test_provider(&self) -> Result<(), PlatformError>;

    /// Submit a fix through the test provider.
    fn push_test_provider_fix(&self, fix: Fix) -> Result<(), PlatformError>;

    /// App-ops style query: is this app currently authorized to publish
    /// mock locations? Advisory only; some platform versions cannot
    /// answer and return an error instead.
    fn mock_authorization(&self) -> Result<bool, PlatformError>;
}
