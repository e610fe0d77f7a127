//! MockLoc Core Library
//!
//! This crate provides the route/fix data model, the great-circle
//! interpolation used to simulate movement along a route, and the
//! dual-mode publisher that injects synthetic fixes into a platform
//! location subsystem.

pub mod error;
pub mod fix;
pub mod geo;
pub mod model;
pub mod platform;
pub mod probe;
pub mod publisher;
pub mod units;

pub use error::StartError;
pub use fix::Fix;
pub use model::{PublisherMode, Route, RunState, SimulationConfig, SimulationEvent, Waypoint};
pub use platform::LocationPlatform;
pub use publisher::MockPublisher;
