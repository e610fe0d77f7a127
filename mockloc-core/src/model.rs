//! Route and run-state data model
//!
//! Coordinates are WGS84 degrees. The core performs no range validation
//! on waypoints; out-of-range values are handed to the platform as-is.

use crate::geo;
use crate::units::KilometersPerHour;
use serde::{Deserialize, Serialize};

/// Default period of the simulation tick loop.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// A single route control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Ordered list of waypoints; insertion order is traversal order.
/// Immutable once a simulation run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Vec<Waypoint>);

impl Route {
    pub fn new(points: Vec<Waypoint>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Waypoint] {
        &self.0
    }
}

/// Everything needed to start one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub route: Route,
    pub speed_kmh: KilometersPerHour,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl SimulationConfig {
    pub fn new(route: Route, speed_kmh: f64) -> Self {
        Self {
            route,
            speed_kmh: KilometersPerHour(speed_kmh),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }

    /// Ground distance covered per tick, in meters.
    pub fn step_m(&self) -> f64 {
        self.speed_kmh.as_mps().0 * (self.tick_interval_ms as f64 / 1000.0)
    }
}

/// Which mock channel a run committed to. Selected once per run, never
/// switched mid-route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherMode {
    Managed,
    TestProvider,
}

/// Mutable state of one in-flight run.
///
/// Invariant: `1 <= target_index <= route.len()`; `target_index ==
/// route.len()` signals completion.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub mode: Option<PublisherMode>,
    pub current_position: Waypoint,
    pub target_index: usize,
    pub running: bool,
}

impl RunState {
    /// Fresh run starting at the head of the route. The route must be
    /// non-empty (the controller rejects empty routes before this).
    pub fn new(route: &Route) -> Self {
        Self {
            mode: None,
            current_position: route.points()[0],
            target_index: 1,
            running: true,
        }
    }

    /// Rebuild state from a persisted target index. The position snaps
    /// to the last completed waypoint; sub-tick progress is not
    /// persisted.
    pub fn resumed(route: &Route, persisted_index: usize) -> Self {
        let target_index = persisted_index.clamp(1, route.len());
        Self {
            mode: None,
            current_position: route.points()[target_index - 1],
            target_index,
            running: true,
        }
    }

    pub fn complete(&self, route: &Route) -> bool {
        self.target_index >= route.len()
    }

    /// One interpolation tick toward the current target waypoint.
    ///
    /// Moves `step_m` meters along the straight lat/lng line toward the
    /// target, or snaps onto the target (and advances `target_index`)
    /// when it is within reach. Returns whether a waypoint was reached.
    /// Must not be called on a completed run.
    pub fn advance(&mut self, route: &Route, step_m: f64) -> bool {
        debug_assert!(!self.complete(route));
        let target = route.points()[self.target_index];
        let distance = geo::haversine_distance_m(self.current_position, target);
        if distance > step_m {
            self.current_position = geo::lerp(self.current_position, target, step_m / distance);
            false
        } else {
            self.current_position = target;
            self.target_index += 1;
            true
        }
    }
}

/// Fire-and-forget status notification broadcast to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    Started { point_count: usize },
    Stopped,
}

/// The three-field snapshot persisted so a restarted process can resume
/// an interrupted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRun {
    pub route: Route,
    pub speed_kmh: KilometersPerHour,
    pub target_index: usize,
}
