//! The simulation context.
//!
//! `SimulationRunner` owns an [`Engine`] on a single task and is the only
//! thing that mutates it. Everything else talks to it through a
//! [`SimulationHandle`]: control messages go in on one channel, tick output
//! comes back on another. Tick scheduling, control messages and genetics
//! completions are multiplexed with `tokio::select!`, so they never overlap.

use crate::model::engine::{Engine, EngineState, TickOutput};
use meadow_core::error::{Result, SimError};
use meadow_core::snapshot::SavedState;
use meadow_core::SimulationParams;
use meadow_data::{ActorDelta, AppEvent, TickSummary};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

pub enum ControlMessage {
    Start,
    Pause,
    Resume,
    UpdateParams(SimulationParams, oneshot::Sender<Result<()>>),
    Initialize(oneshot::Sender<Result<()>>),
    Load(Box<SavedState>, oneshot::Sender<Result<()>>),
    Save(oneshot::Sender<SavedState>),
    Summary(oneshot::Sender<TickSummary>),
    Shutdown,
}

/// What the runner reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerUpdate {
    Tick(TickOutput),
    /// Changes made between ticks: a fresh grid, a loaded snapshot, or
    /// flowers that arrived while paused.
    Flush {
        deltas: Vec<ActorDelta>,
        events: Vec<AppEvent>,
    },
}

/// Cloneable front door to a running [`SimulationRunner`].
#[derive(Clone)]
pub struct SimulationHandle {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl SimulationHandle {
    fn send(&self, msg: ControlMessage) -> Result<()> {
        self.tx.send(msg).map_err(|_| SimError::Disposed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ControlMessage,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await.map_err(|_| SimError::Disposed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(ControlMessage::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(ControlMessage::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(ControlMessage::Resume)
    }

    pub async fn initialize(&self) -> Result<()> {
        self.request(ControlMessage::Initialize).await?
    }

    pub async fn update_params(&self, params: SimulationParams) -> Result<()> {
        self.request(|reply| ControlMessage::UpdateParams(params, reply))
            .await?
    }

    pub async fn load(&self, saved: SavedState) -> Result<()> {
        self.request(|reply| ControlMessage::Load(Box::new(saved), reply))
            .await?
    }

    pub async fn save(&self) -> Result<SavedState> {
        self.request(ControlMessage::Save).await
    }

    pub async fn summary(&self) -> Result<TickSummary> {
        self.request(ControlMessage::Summary).await
    }

    /// Asks the runner to dispose its engine and exit. A runner that is
    /// already gone is not an error.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ControlMessage::Shutdown);
    }
}

type RenderHook = Box<dyn FnMut(Duration) + Send>;

pub struct SimulationRunner {
    engine: Engine,
    control: mpsc::UnboundedReceiver<ControlMessage>,
    updates: mpsc::UnboundedSender<RunnerUpdate>,
    tick_interval: Duration,
    render_hook: Option<RenderHook>,
}

impl SimulationRunner {
    /// Wraps `engine`. Ticks are scheduled every `tick_interval` while the
    /// engine is running; a zero interval is raised to one millisecond.
    pub fn new(
        engine: Engine,
        tick_interval: Duration,
    ) -> (Self, SimulationHandle, mpsc::UnboundedReceiver<RunnerUpdate>) {
        let (tx, control) = mpsc::unbounded_channel();
        let (updates, rx) = mpsc::unbounded_channel();
        let runner = Self {
            engine,
            control,
            updates,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            render_hook: None,
        };
        (runner, SimulationHandle { tx }, rx)
    }

    /// Called after every tick with the time the tick took.
    #[must_use]
    pub fn with_render_hook(mut self, hook: impl FnMut(Duration) + Send + 'static) -> Self {
        self.render_hook = Some(Box::new(hook));
        self
    }

    /// Runs until `Shutdown` arrives or every handle is dropped, then
    /// disposes the engine and hands it back.
    pub async fn run(mut self) -> Engine {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_ms = self.tick_interval.as_millis() as u64, "Runner started");

        loop {
            let running = self.engine.state() == EngineState::Running;
            tokio::select! {
                msg = self.control.recv() => match msg {
                    None | Some(ControlMessage::Shutdown) => break,
                    Some(msg) => self.handle(msg).await,
                },
                _ = ticker.tick(), if running => self.step(),
                Some(response) = self.engine.next_genetics_response() => {
                    self.engine.apply_genetics(response);
                    if self.engine.state() != EngineState::Running {
                        self.flush();
                    }
                }
            }
        }

        self.engine.dispose();
        tracing::info!("Runner stopped");
        self.engine
    }

    async fn handle(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::Start => log_rejected("start", self.engine.start()),
            ControlMessage::Pause => log_rejected("pause", self.engine.pause()),
            ControlMessage::Resume => log_rejected("resume", self.engine.resume()),
            ControlMessage::UpdateParams(params, reply) => {
                let _ = reply.send(self.engine.set_params(params));
            }
            ControlMessage::Initialize(reply) => {
                let result = self.engine.initialize_grid().await;
                if result.is_ok() {
                    self.flush();
                }
                let _ = reply.send(result);
            }
            ControlMessage::Load(saved, reply) => {
                let result = self.engine.load_state(*saved).await;
                if result.is_ok() {
                    self.flush();
                }
                let _ = reply.send(result);
            }
            ControlMessage::Save(reply) => {
                let _ = reply.send(self.engine.get_state_for_save());
            }
            ControlMessage::Summary(reply) => {
                let _ = reply.send(self.engine.summary());
            }
            ControlMessage::Shutdown => {}
        }
    }

    fn step(&mut self) {
        let started = Instant::now();
        match self.engine.calculate_next_tick() {
            Ok(output) => {
                if let Some(hook) = self.render_hook.as_mut() {
                    hook(started.elapsed());
                }
                let _ = self.updates.send(RunnerUpdate::Tick(output));
            }
            Err(SimError::GridInvalidated) => {
                tracing::warn!("Grid needs initializing, pausing");
                log_rejected("pause", self.engine.pause());
            }
            Err(e) => tracing::error!(error = %e, "Tick failed"),
        }
    }

    fn flush(&mut self) {
        let deltas = self.engine.flush_deltas();
        let events = self.engine.take_events();
        if deltas.is_empty() && events.is_empty() {
            return;
        }
        let _ = self.updates.send(RunnerUpdate::Flush { deltas, events });
    }
}

fn log_rejected(action: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!(action, error = %e, "Control message rejected");
    }
}
