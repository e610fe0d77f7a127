//! Synthetic location fix construction
//!
//! A fix is built fresh every tick and handed to the platform; it is
//! never reused. Construction is pure apart from the two clock reads.

use crate::model::Waypoint;
use crate::units::MetersPerSecond;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Instant;

/// Horizontal accuracy reported when the caller does not override it.
pub const DEFAULT_ACCURACY_M: f64 = 5.0;

const BEARING_ACCURACY_DEG: f64 = 10.0;
const VERTICAL_ACCURACY_M: f64 = 1.0;
const SPEED_ACCURACY_MPS: f64 = 1.0;

/// One synthetic location sample delivered to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lng: f64,
    pub altitude_m: f64,
    pub horizontal_accuracy_m: f64,
    pub speed_mps: f64,
    /// Wall-clock capture time.
    pub timestamp: DateTime<Utc>,
    /// Monotonic capture time, nanoseconds since process start.
    pub monotonic_ns: u64,
    pub bearing_accuracy_deg: Option<f64>,
    pub vertical_accuracy_m: Option<f64>,
    pub speed_accuracy_mps: Option<f64>,
}

fn monotonic_ns() -> u64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    ANCHOR.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Build a fix at `position` with the given ground speed.
pub fn build_fix(position: Waypoint, speed: MetersPerSecond, accuracy_m: f64) -> Fix {
    Fix {
        lat: position.lat,
        lng: position.lng,
        altitude_m: 0.0,
        horizontal_accuracy_m: accuracy_m,
        speed_mps: speed.0,
        timestamp: Utc::now(),
        monotonic_ns: monotonic_ns(),
        bearing_accuracy_deg: Some(BEARING_ACCURACY_DEG),
        vertical_accuracy_m: Some(VERTICAL_ACCURACY_M),
        speed_accuracy_mps: Some(SPEED_ACCURACY_MPS),
    }
}
