//! Simulation controller
//!
//! Owns one run at a time: selects the publisher mode, drives the
//! interpolator on a fixed-period tick task, persists progress, and
//! broadcasts status events. The run lives in a spawned task cancelled
//! cooperatively via a CancellationToken; mode teardown and snapshot
//! cleanup happen on every exit path, including cancellation.

use crate::persist::StateStore;
use mockloc_core::fix::{build_fix, DEFAULT_ACCURACY_M};
use mockloc_core::model::{
    PersistedRun, PublisherMode, RunState, SimulationConfig, SimulationEvent, Waypoint,
    DEFAULT_TICK_INTERVAL_MS,
};
use mockloc_core::platform::LocationPlatform;
use mockloc_core::publisher::MockPublisher;
use mockloc_core::{Fix, StartError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// Accepted start request, or the live status when one was already
/// in flight (re-issued starts are a silent no-op; the old route keeps
/// going).
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started { point_count: usize },
    AlreadyRunning(SimulationStatus),
}

/// Pull-style status snapshot for observers that attached late.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStatus {
    pub state: Phase,
    pub point_count: Option<usize>,
    pub target_index: Option<usize>,
    pub current_position: Option<Waypoint>,
    pub speed_kmh: Option<f64>,
}

impl SimulationStatus {
    fn idle(phase: Phase) -> Self {
        Self {
            state: phase,
            point_count: None,
            target_index: None,
            current_position: None,
            speed_kmh: None,
        }
    }
}

struct ActiveRun {
    config: SimulationConfig,
    run: Arc<RwLock<RunState>>,
    cancel: CancellationToken,
}

struct Inner {
    phase: Phase,
    active: Option<ActiveRun>,
}

#[derive(Clone)]
pub struct SimulationController {
    platform: Arc<dyn LocationPlatform>,
    store: Arc<dyn StateStore>,
    events_tx: broadcast::Sender<SimulationEvent>,
    fixes_tx: broadcast::Sender<Fix>,
    inner: Arc<Mutex<Inner>>,
}

impl SimulationController {
    pub fn new(platform: Arc<dyn LocationPlatform>, store: Arc<dyn StateStore>) -> Self {
        let (events_tx, _) = broadcast::channel(32);
        let (fixes_tx, _) = broadcast::channel(256);
        Self {
            platform,
            store,
            events_tx,
            fixes_tx,
            inner: Arc::new(Mutex::new(Inner {
                phase: Phase::Idle,
                active: None,
            })),
        }
    }

    /// Subscribe to simulation started/stopped notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SimulationEvent> {
        self.events_tx.subscribe()
    }

    /// Subscribe to every fix as it is injected.
    pub fn subscribe_fixes(&self) -> broadcast::Receiver<Fix> {
        self.fixes_tx.subscribe()
    }

    /// Accept a start request.
    ///
    /// Configuration problems are rejected synchronously; failure to
    /// acquire either mock channel is surfaced as
    /// [`StartError::NoMockCapability`] before any tick runs. The
    /// snapshot is persisted before the first platform interaction so
    /// a crash during startup is still resumable.
    pub async fn start(&self, config: SimulationConfig) -> Result<StartOutcome, StartError> {
        if config.route.is_empty() {
            return Err(StartError::EmptyRoute);
        }
        if config.speed_kmh.0 <= 0.0 {
            return Err(StartError::NonPositiveSpeed(config.speed_kmh.0));
        }

        let mut inner = self.inner.lock().await;
        if inner.phase != Phase::Idle {
            return Ok(StartOutcome::AlreadyRunning(Self::status_of(&inner).await));
        }
        inner.phase = Phase::Starting;

        if let Err(e) = self.store.save(&PersistedRun {
            route: config.route.clone(),
            speed_kmh: config.speed_kmh,
            target_index: 0,
        }) {
            warn!("failed to persist run snapshot: {e:#}");
        }

        let publisher = MockPublisher::new(self.platform.clone());
        let mode = match publisher.select_mode().await {
            Ok(mode) => mode,
            Err(e) => {
                error!("cannot start simulation: {e}");
                inner.phase = Phase::Idle;
                if let Err(pe) = self.store.clear() {
                    warn!("failed to clear run snapshot: {pe:#}");
                }
                return Err(e);
            }
        };

        let mut state = RunState::new(&config.route);
        state.mode = Some(mode);
        let point_count = config.route.len();
        self.spawn_run(&mut inner, publisher, mode, config, state);
        info!("simulation started with {point_count} points");
        Ok(StartOutcome::Started { point_count })
    }

    /// Request a cooperative stop. Returns whether a run was stopping
    /// as a result; teardown and cleanup happen in the tick task.
    pub async fn stop(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.phase != Phase::Running {
            return false;
        }
        if let Some(active) = &inner.active {
            active.cancel.cancel();
        }
        inner.phase = Phase::Stopping;
        info!("simulation stop requested");
        true
    }

    pub async fn status(&self) -> SimulationStatus {
        let inner = self.inner.lock().await;
        Self::status_of(&inner).await
    }

    /// Resume a run persisted by a previous process, if one exists.
    /// The position snaps to the last completed waypoint. Returns
    /// whether a run was resumed.
    pub async fn resume_persisted(&self) -> bool {
        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(e) => {
                warn!("failed to load run snapshot: {e:#}");
                return false;
            }
        };
        if snapshot.route.is_empty() {
            if let Err(e) = self.store.clear() {
                warn!("failed to clear empty run snapshot: {e:#}");
            }
            return false;
        }

        let mut inner = self.inner.lock().await;
        if inner.phase != Phase::Idle {
            return false;
        }
        inner.phase = Phase::Starting;

        let config = SimulationConfig {
            route: snapshot.route,
            speed_kmh: snapshot.speed_kmh,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        };
        let publisher = MockPublisher::new(self.platform.clone());
        let mode = match publisher.select_mode().await {
            Ok(mode) => mode,
            Err(e) => {
                error!("cannot resume simulation: {e}");
                inner.phase = Phase::Idle;
                if let Err(pe) = self.store.clear() {
                    warn!("failed to clear run snapshot: {pe:#}");
                }
                return false;
            }
        };

        let mut state = RunState::resumed(&config.route, snapshot.target_index);
        state.mode = Some(mode);
        info!(
            "resuming simulation at target index {} of {}",
            state.target_index,
            config.route.len()
        );
        self.spawn_run(&mut inner, publisher, mode, config, state);
        true
    }

    fn spawn_run(
        &self,
        inner: &mut Inner,
        publisher: MockPublisher,
        mode: PublisherMode,
        config: SimulationConfig,
        state: RunState,
    ) {
        let run = Arc::new(RwLock::new(state));
        let cancel = CancellationToken::new();
        inner.active = Some(ActiveRun {
            config: config.clone(),
            run: run.clone(),
            cancel: cancel.clone(),
        });
        inner.phase = Phase::Running;
        tokio::spawn(run_loop(self.clone(), publisher, mode, config, run, cancel));
    }

    async fn status_of(inner: &Inner) -> SimulationStatus {
        match &inner.active {
            Some(active) => {
                let state = active.run.read().await;
                SimulationStatus {
                    state: inner.phase,
                    point_count: Some(active.config.route.len()),
                    target_index: Some(state.target_index),
                    current_position: Some(state.current_position),
                    speed_kmh: Some(active.config.speed_kmh.0),
                }
            }
            None => SimulationStatus::idle(inner.phase),
        }
    }
}

/// The tick loop. Ticks are strictly sequential: tick N+1 never begins
/// before tick N's publish call has returned.
async fn run_loop(
    ctrl: SimulationController,
    publisher: MockPublisher,
    mode: PublisherMode,
    config: SimulationConfig,
    run: Arc<RwLock<RunState>>,
    cancel: CancellationToken,
) {
    info!("simulation tick loop started");
    let speed = config.speed_kmh.as_mps();
    let step_m = config.step_m();
    let tick = Duration::from_millis(config.tick_interval_ms);

    // Initial fix at the current position (route head, or the resume
    // handoff point).
    let position = run.read().await.current_position;
    let fix = build_fix(position, speed, DEFAULT_ACCURACY_M);
    publisher.publish(mode, fix.clone()).await;
    let _ = ctrl.fixes_tx.send(fix);
    let _ = ctrl.events_tx.send(SimulationEvent::Started {
        point_count: config.route.len(),
    });

    loop {
        if cancel.is_cancelled() || run.read().await.complete(&config.route) {
            break;
        }

        let (fix, reached, new_index) = {
            let mut state = run.write().await;
            let reached = state.advance(&config.route, step_m);
            let fix = build_fix(state.current_position, speed, DEFAULT_ACCURACY_M);
            (fix, reached, state.target_index)
        };

        publisher.publish(mode, fix.clone()).await;
        let _ = ctrl.fixes_tx.send(fix);

        // Persist only after the waypoint-reached fix was published,
        // so a resumed run never skips a waypoint it hadn't reached.
        if reached {
            if let Err(e) = ctrl.store.save_target_index(new_index) {
                warn!("failed to persist progress: {e:#}");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(tick) => {}
        }
    }

    run.write().await.running = false;
    let _ = ctrl.events_tx.send(SimulationEvent::Stopped);
    publisher.teardown(mode).await;
    if let Err(e) = ctrl.store.clear() {
        warn!("failed to clear run snapshot: {e:#}");
    }

    let mut inner = ctrl.inner.lock().await;
    inner.phase = Phase::Idle;
    inner.active = None;
    info!("simulation tick loop ended");
}
