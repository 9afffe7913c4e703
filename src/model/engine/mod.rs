//! The simulation engine.
//!
//! `Engine` owns the grid and everything a tick touches. All mutation goes
//! through `&mut Engine`, driven by a single runner task; genetics results
//! arrive on a channel and are applied through the same entry point, keyed
//! by request id and engine epoch.

use meadow_core::delta::DeltaTracker;
use meadow_core::error::{Result, SimError};
use meadow_core::genetics::{
    GeneticsCapability, GeneticsQueue, GeneticsResponse, ProceduralGenetics, RequestId,
};
use meadow_core::grid::Grid;
use meadow_core::image_cache::ImageCache;
use meadow_core::{Metrics, SimulationParams};
use meadow_data::{
    ActorDelta, ActorId, AppEvent, CumulativeTotals, EnvironmentState, EventLevel, TickSummary,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub mod genetics;
pub mod init;
pub mod state;
pub mod update;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Paused,
    Disposed,
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub tick: u64,
    pub deltas: Vec<ActorDelta>,
    pub events: Vec<AppEvent>,
    pub summary: TickSummary,
}

/// A flower waiting on the genetics capability. Its cell is reserved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingSpawn {
    pub x: u16,
    pub y: u16,
    pub origin: Option<ActorId>,
}

pub struct Engine {
    params: SimulationParams,
    state: EngineState,
    tick: u64,
    /// Bumped on every reset; responses from an older epoch are stale.
    epoch: u64,
    grid: Grid,
    env: EnvironmentState,
    totals: CumulativeTotals,
    rng: ChaCha8Rng,
    capability: Arc<dyn GeneticsCapability>,
    queue: GeneticsQueue,
    responses: mpsc::UnboundedReceiver<GeneticsResponse>,
    genetics_available: bool,
    next_request_id: RequestId,
    pending: BTreeMap<RequestId, PendingSpawn>,
    images: ImageCache,
    deltas: DeltaTracker,
    /// Events raised between ticks, handed out with the next tick or flush.
    events: Vec<AppEvent>,
    grid_stale: bool,
    needs_reset: bool,
    metrics: Metrics,
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

impl Engine {
    /// Creates an idle engine with an empty grid. Must be called inside a
    /// tokio runtime; the genetics worker is spawned immediately.
    pub fn new(params: SimulationParams, capability: Arc<dyn GeneticsCapability>) -> Result<Self> {
        params
            .validate()
            .map_err(|e| SimError::invalid_params(e.to_string()))?;
        let timeout = Duration::from_millis(params.genetics.timeout_ms);
        let (queue, responses) = GeneticsQueue::spawn(Arc::clone(&capability), timeout);
        tracing::info!(fingerprint = %params.fingerprint(), "Engine created");

        Ok(Self {
            grid: Grid::new(params.world.width, params.world.height),
            rng: seeded_rng(params.world.seed),
            params,
            state: EngineState::Idle,
            tick: 0,
            epoch: 0,
            env: EnvironmentState::default(),
            totals: CumulativeTotals::default(),
            capability,
            queue,
            responses,
            genetics_available: true,
            next_request_id: 1,
            pending: BTreeMap::new(),
            images: ImageCache::new(),
            deltas: DeltaTracker::new(),
            events: Vec::new(),
            grid_stale: false,
            needs_reset: true,
            metrics: Metrics::new(),
        })
    }

    /// Engine backed by the built-in procedural genetics.
    pub fn with_procedural_genetics(params: SimulationParams) -> Result<Self> {
        let seed = params.world.seed.unwrap_or(0);
        Self::new(params, Arc::new(ProceduralGenetics::new(seed)))
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state == EngineState::Disposed {
            Err(SimError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.state == EngineState::Idle {
            self.state = EngineState::Running;
            tracing::info!(tick = self.tick, "Simulation started");
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.state == EngineState::Running {
            self.state = EngineState::Paused;
            tracing::info!(tick = self.tick, "Simulation paused");
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_live()?;
        if self.state == EngineState::Paused {
            self.state = EngineState::Running;
            tracing::info!(tick = self.tick, "Simulation resumed");
        }
        Ok(())
    }

    /// Back to idle. In-flight genetics requests are left alone.
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.state = EngineState::Idle;
        Ok(())
    }

    /// Terminal. Pending genetics work is cancelled and the grid dropped.
    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.queue.cancel_all();
        self.pending.clear();
        self.grid.clear();
        self.images.clear();
        self.state = EngineState::Disposed;
        tracing::info!(
            ticks = self.metrics.ticks(),
            average_tick_us = self.metrics.average_tick().as_micros() as u64,
            "Engine disposed"
        );
    }

    /// Replaces the parameters and rewinds the tick counter. The grid is kept;
    /// if dimensions or population counts changed it is marked stale and
    /// ticking is refused until the next `initialize_grid` or `load_state`.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<()> {
        self.ensure_live()?;
        params
            .validate()
            .map_err(|e| SimError::invalid_params(e.to_string()))?;
        let invalidates = self.params.invalidates_grid(&params);
        self.params = params;
        self.tick = 0;
        if invalidates {
            self.grid_stale = true;
            self.cancel_pending();
        }
        tracing::info!(
            fingerprint = %self.params.fingerprint(),
            grid_stale = self.grid_stale,
            "Parameters updated"
        );
        Ok(())
    }

    /// Drops every outstanding genetics request and starts a new epoch.
    pub(crate) fn cancel_pending(&mut self) {
        self.epoch += 1;
        self.queue.cancel_all();
        self.pending.clear();
        self.grid.clear_reservations();
    }

    pub(crate) fn push_event(&mut self, level: EventLevel, message: String, actor_id: Option<ActorId>) {
        match level {
            EventLevel::Info => tracing::info!(tick = self.tick, "{}", message),
            EventLevel::Warning => tracing::warn!(tick = self.tick, "{}", message),
            EventLevel::Error => tracing::error!(tick = self.tick, "{}", message),
        }
        self.events.push(AppEvent {
            tick: self.tick,
            level,
            message,
            actor_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// Events raised outside a tick since the last tick or call.
    pub fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn environment(&self) -> &EnvironmentState {
        &self.env
    }

    #[must_use]
    pub fn totals(&self) -> &CumulativeTotals {
        &self.totals
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn is_grid_stale(&self) -> bool {
        self.grid_stale
    }

    #[must_use]
    pub fn genetics_available(&self) -> bool {
        self.genetics_available
    }

    #[must_use]
    pub fn pending_flower_requests(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn images(&self) -> &ImageCache {
        &self.images
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.queue.cancel_all();
    }
}
