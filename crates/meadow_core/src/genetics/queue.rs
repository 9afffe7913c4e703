//! Single-flight, FIFO request queue in front of a [`GeneticsCapability`].
//!
//! The worker task owns the pending queue and the suppression set. Commands
//! that arrive while a request is in flight are applied in one batch before
//! the next request starts:
//!
//! - cancelling a request that has not started removes it; no response is
//!   ever sent for it,
//! - cancelling the in-flight request suppresses its response when it lands,
//! - cancelling everything clears the queue and suppresses the in-flight one.

use super::{FlowerImage, GeneticsCapability, GeneticsOp, GenomeOutput};
use crate::error::{Result, SimError};
use meadow_data::FlowerStats;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowerRequest {
    pub request_id: RequestId,
    /// Engine generation the request was issued in.
    pub epoch: u64,
    pub x: u16,
    pub y: u16,
    pub op: GeneticsOp,
    pub humidity: f32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneticsResponse {
    FlowerCreated {
        request_id: RequestId,
        epoch: u64,
        x: u16,
        y: u16,
        genome: String,
        image: FlowerImage,
        stats: FlowerStats,
    },
    FlowerCreationFailed {
        request_id: RequestId,
        epoch: u64,
        x: u16,
        y: u16,
        error: SimError,
    },
    /// Sent once, before any request is answered, when initialization fails.
    CapabilityUnavailable { reason: String },
}

impl GeneticsResponse {
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            GeneticsResponse::FlowerCreated { request_id, .. }
            | GeneticsResponse::FlowerCreationFailed { request_id, .. } => Some(*request_id),
            GeneticsResponse::CapabilityUnavailable { .. } => None,
        }
    }
}

enum Command {
    Submit(FlowerRequest),
    Cancel(RequestId),
    CancelAll,
}

/// Handle to the worker task. Dropping it stops the worker.
pub struct GeneticsQueue {
    tx: mpsc::UnboundedSender<Command>,
}

impl GeneticsQueue {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(
        capability: Arc<dyn GeneticsCapability>,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<GeneticsResponse>) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (responses, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            capability,
            timeout,
            commands,
            responses,
            pending: VecDeque::new(),
            cancelled: HashSet::new(),
            in_flight: None,
            available: false,
        };
        tokio::spawn(worker.run());
        (Self { tx }, rx)
    }

    /// Returns `false` once the worker has stopped.
    pub fn submit(&self, request: FlowerRequest) -> bool {
        self.tx.send(Command::Submit(request)).is_ok()
    }

    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.tx.send(Command::Cancel(request_id));
    }

    pub fn cancel_all(&self) {
        let _ = self.tx.send(Command::CancelAll);
    }
}

struct Worker {
    capability: Arc<dyn GeneticsCapability>,
    timeout: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    responses: mpsc::UnboundedSender<GeneticsResponse>,
    pending: VecDeque<FlowerRequest>,
    cancelled: HashSet<RequestId>,
    in_flight: Option<RequestId>,
    available: bool,
}

impl Worker {
    async fn run(mut self) {
        let init = tokio::time::timeout(self.timeout, self.capability.initialize()).await;
        self.available = match init {
            Ok(Ok(())) => true,
            Ok(Err(e)) => self.unavailable(e),
            Err(_) => self.unavailable(SimError::genetics_timeout(
                "initialize",
                self.timeout_ms(),
            )),
        };
        if self.available {
            tracing::info!("Genetics capability ready");
        }

        loop {
            if !self.drain_commands() {
                return;
            }
            let Some(request) = self.pending.pop_front() else {
                match self.commands.recv().await {
                    Some(command) => {
                        self.apply(command);
                        continue;
                    }
                    None => return,
                }
            };

            let request_id = request.request_id;
            self.in_flight = Some(request_id);
            tracing::debug!(request_id, op = request.op.name(), "Genetics request started");
            let result = if self.available {
                self.process(&request).await
            } else {
                Err(SimError::genetics_failure("genetics capability unavailable"))
            };

            let open = self.drain_commands();
            self.in_flight = None;
            if self.cancelled.remove(&request_id) {
                tracing::debug!(request_id, "Genetics response suppressed");
            } else if self.responses.send(respond(request, result)).is_err() {
                return;
            }
            if !open {
                return;
            }
        }
    }

    fn unavailable(&self, error: SimError) -> bool {
        tracing::error!(%error, "Genetics capability failed to initialize");
        let _ = self.responses.send(GeneticsResponse::CapabilityUnavailable {
            reason: error.to_string(),
        });
        false
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Applies every queued command. Returns `false` once the handle is gone.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Submit(request) => self.pending.push_back(request),
            Command::Cancel(request_id) => {
                let before = self.pending.len();
                self.pending.retain(|r| r.request_id != request_id);
                if self.pending.len() == before && self.in_flight == Some(request_id) {
                    self.cancelled.insert(request_id);
                }
            }
            Command::CancelAll => {
                self.pending.clear();
                if let Some(request_id) = self.in_flight {
                    self.cancelled.insert(request_id);
                }
            }
        }
    }

    async fn call<T>(&self, operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(SimError::genetics_timeout(operation, self.timeout_ms())),
        }
    }

    async fn process(&self, request: &FlowerRequest) -> Result<(GenomeOutput, FlowerStats)> {
        let capability = &self.capability;
        let output = match &request.op {
            GeneticsOp::Create => self.call("create", capability.create_flower()).await?,
            GeneticsOp::Reproduce { parent1, parent2 } => {
                self.call("reproduce", capability.reproduce(parent1, parent2))
                    .await?
            }
            GeneticsOp::Mutate { genome } => self.call("mutate", capability.mutate(genome)).await?,
        };
        let stats = self
            .call(
                "get_stats",
                capability.get_stats(&output.genome, request.humidity, request.temperature),
            )
            .await?;
        Ok((output, stats))
    }
}

fn respond(request: FlowerRequest, result: Result<(GenomeOutput, FlowerStats)>) -> GeneticsResponse {
    match result {
        Ok((output, stats)) => GeneticsResponse::FlowerCreated {
            request_id: request.request_id,
            epoch: request.epoch,
            x: request.x,
            y: request.y,
            genome: output.genome,
            image: output.image,
            stats,
        },
        Err(error) => GeneticsResponse::FlowerCreationFailed {
            request_id: request.request_id,
            epoch: request.epoch,
            x: request.x,
            y: request.y,
            error,
        },
    }
}
