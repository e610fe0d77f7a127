//! Error taxonomy for the simulation engine
//!
//! Configuration problems are rejected synchronously at start; the
//! capability failure is the only fatal condition surfaced from the
//! platform side. Per-tick publish and persistence failures are logged
//! and swallowed, so they never appear here.

use thiserror::Error;

/// A start request that could not be accepted.
#[derive(Debug, Error, PartialEq)]
pub enum StartError {
    #[error("route must contain at least one waypoint")]
    EmptyRoute,

    #[error("speed must be positive, got {0} km/h")]
    NonPositiveSpeed(f64),

    /// Both mock channels were refused: the managed channel denied the
    /// probe's retries and test-provider registration failed (commonly
    /// because the app is not selected as the mock-location app).
    #[error("no mock-location capability available")]
    NoMockCapability,
}
