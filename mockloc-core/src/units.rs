//! Type-safe wrappers for the physical units used by the simulation
//!
//! Newtypes around f64 so that km/h and m/s cannot be confused at a
//! call site. Coordinates stay raw f64 degrees on [`crate::model::Waypoint`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Meters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

impl MetersPerSecond {
    /// Ground distance covered at this speed over the given interval.
    pub fn distance_over(self, interval: Duration) -> Meters {
        Meters(self.0 * interval.as_secs_f64())
    }
}

/// Kilometers per hour (the unit callers supply speed in)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KilometersPerHour(pub f64);

impl KilometersPerHour {
    pub fn as_mps(self) -> MetersPerSecond {
        MetersPerSecond(self.0 / 3.6)
    }
}
