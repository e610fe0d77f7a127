//! Application state management

use crate::controller::SimulationController;
use crate::persist::StateStore;
use mockloc_core::platform::LocationPlatform;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The simulation controller owning the current run
    pub controller: SimulationController,

    /// The platform backend, exposed for the advisory capability query
    pub platform: Arc<dyn LocationPlatform>,

    /// Configured fix sinks
    pub sinks: Arc<RwLock<Vec<SinkConfig>>>,
}

/// Configuration for an output sink
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub id: String,
    pub sink_type: SinkType,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkType {
    Udp { host: String, port: u16 },
    File { path: String },
}

impl AppState {
    pub fn new(platform: Arc<dyn LocationPlatform>, store: Arc<dyn StateStore>) -> Self {
        Self {
            controller: SimulationController::new(platform.clone(), store),
            platform,
            sinks: Arc::new(RwLock::new(Vec::new())),
        }
    }
}
