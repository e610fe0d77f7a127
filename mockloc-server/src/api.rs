//! REST API and SSE routes

use crate::controller::StartOutcome;
use crate::state::{AppState, SinkConfig};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use mockloc_core::model::{Route, SimulationConfig, Waypoint, DEFAULT_TICK_INTERVAL_MS};
use mockloc_core::probe;
use mockloc_core::units::KilometersPerHour;
use mockloc_core::StartError;
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/simulation", post(simulation_control))
        .route("/api/simulation/status", get(simulation_status))
        .route("/api/events/stream", get(event_stream))
        .route("/api/capability", get(capability))
        .route("/api/sinks", get(list_sinks).post(create_sink))
        .route("/api/sinks/:id", delete(delete_sink))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Simulation Endpoints ===

#[derive(Deserialize)]
struct SimulationRequest {
    action: String,
    route: Option<Vec<Waypoint>>,
    speed_kmh: Option<f64>,
    tick_interval_ms: Option<u64>,
}

async fn simulation_control(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match request.action.as_str() {
        "start" => {
            let config = SimulationConfig {
                route: Route::new(request.route.unwrap_or_default()),
                speed_kmh: KilometersPerHour(request.speed_kmh.unwrap_or(0.0)),
                tick_interval_ms: request.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS),
            };
            match state.controller.start(config).await {
                Ok(StartOutcome::Started { point_count }) => Ok(Json(serde_json::json!({
                    "status": "started",
                    "point_count": point_count
                }))),
                Ok(StartOutcome::AlreadyRunning(status)) => Ok(Json(serde_json::json!({
                    "status": "already_running",
                    "simulation": status
                }))),
                Err(e @ StartError::NoMockCapability) => {
                    Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
                }
                Err(e) => Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
            }
        }
        "stop" => {
            let stopped = state.controller.stop().await;
            Ok(Json(serde_json::json!({
                "status": if stopped { "stopping" } else { "idle" }
            })))
        }
        _ => Err((
            StatusCode::BAD_REQUEST,
            format!("Unknown action: {}", request.action),
        )),
    }
}

async fn simulation_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.controller.status().await;
    Json(serde_json::to_value(status).unwrap_or_default())
}

// === Capability Endpoint ===

/// Advisory pre-flight check; purely a hint for the UI layer.
async fn capability(State(state): State<AppState>) -> Json<serde_json::Value> {
    let authorized = probe::is_mock_authorized(state.platform.as_ref());
    Json(serde_json::json!({ "authorized": authorized }))
}

// === Event Stream Endpoint ===

async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.controller.subscribe_events();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().data(json))),
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Broadcast stream error: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// === Sink Management Endpoints ===

async fn list_sinks(State(state): State<AppState>) -> Json<Vec<SinkConfig>> {
    let sinks = state.sinks.read().await;
    Json(sinks.clone())
}

#[derive(Deserialize)]
struct CreateSinkRequest {
    #[serde(flatten)]
    config: SinkConfig,
}

async fn create_sink(
    State(state): State<AppState>,
    Json(request): Json<CreateSinkRequest>,
) -> impl IntoResponse {
    let mut sinks = state.sinks.write().await;

    // Generate ID if not provided
    let mut config = request.config;
    if config.id.is_empty() {
        config.id = format!("sink-{}", sinks.len() + 1);
    }

    sinks.push(config.clone());

    (StatusCode::CREATED, Json(config))
}

async fn delete_sink(
    State(state): State<AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> impl IntoResponse {
    let mut sinks = state.sinks.write().await;

    if let Some(pos) = sinks.iter().position(|s| s.id == id) {
        sinks.remove(pos);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
