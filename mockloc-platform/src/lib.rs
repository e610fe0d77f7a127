//! Platform backends for MockLoc

pub mod sim;

pub use sim::SimulatedPlatform;
