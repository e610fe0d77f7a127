//! MockLoc Server Library
//!
//! Exposes server components for integration testing.

pub mod api;
pub mod controller;
pub mod persist;
pub mod sinks;
pub mod state;
