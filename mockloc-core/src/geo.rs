//! Great-circle distance and segment interpolation
//!
//! Distance is haversine on a spherical Earth. Interpolation between
//! waypoints is a straight lat/lng lerp, not a geodesic; over the short
//! segments a tick covers the difference is negligible, and the snap
//! branch in [`crate::model::RunState::advance`] guarantees exact
//! arrival at each waypoint regardless.

use crate::model::Waypoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance between two waypoints in meters.
pub fn haversine_distance_m(from: Waypoint, to: Waypoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Linear lat/lng interpolation by `fraction` (0.0 = `from`, 1.0 = `to`).
pub fn lerp(from: Waypoint, to: Waypoint, fraction: f64) -> Waypoint {
    Waypoint {
        lat: from.lat + (to.lat - from.lat) * fraction,
        lng: from.lng + (to.lng - from.lng) * fraction,
    }
}
