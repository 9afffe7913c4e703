//! Issuing flower requests and applying what comes back.

use super::{Engine, PendingSpawn};
use meadow_core::genetics::{FlowerRequest, GeneticsOp, GeneticsResponse};
use meadow_core::lifecycle;
use meadow_data::{ActorId, EventLevel};
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;

impl Engine {
    /// Queues a flower for a cell that is already reserved. When the
    /// capability is known to be down the cell is released straight away.
    pub(crate) fn submit_flower(&mut self, op: GeneticsOp, x: u16, y: u16, origin: Option<ActorId>) {
        if !self.genetics_available {
            self.grid.release(x, y);
            tracing::debug!(x, y, op = op.name(), "Genetics unavailable, flower skipped");
            return;
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let request = FlowerRequest {
            request_id,
            epoch: self.epoch,
            x,
            y,
            op,
            humidity: self.env.humidity,
            temperature: self.env.temperature,
        };
        tracing::debug!(request_id, x, y, op = request.op.name(), "Flower requested");
        if self.queue.submit(request) {
            self.pending.insert(request_id, PendingSpawn { x, y, origin });
        } else {
            self.grid.release(x, y);
            tracing::error!("Genetics worker has stopped");
        }
    }

    /// Applies one genetics response. Returns `true` if it belonged to the
    /// current epoch and an outstanding request.
    pub fn apply_genetics(&mut self, response: GeneticsResponse) -> bool {
        match response {
            GeneticsResponse::CapabilityUnavailable { reason } => {
                self.genetics_available = false;
                self.push_event(
                    EventLevel::Error,
                    format!("Flower genetics unavailable: {}", reason),
                    None,
                );
                false
            }
            GeneticsResponse::FlowerCreated {
                request_id,
                epoch,
                x,
                y,
                genome,
                image,
                stats,
            } => {
                let Some(spawn) = self.claim(request_id, epoch) else {
                    return false;
                };
                self.grid.release(x, y);
                let flower =
                    lifecycle::new_flower(x, y, genome.clone(), stats, &self.params, &mut self.rng);
                let flower_id = flower.id().clone();
                if let Err(e) = self.grid.insert(flower) {
                    self.push_event(
                        EventLevel::Warning,
                        format!("Flower at ({}, {}) could not be placed: {}", x, y, e),
                        spawn.origin,
                    );
                    return true;
                }
                self.images.insert(genome, image);
                self.totals.flowers_created += 1;
                let message = match &spawn.origin {
                    Some(origin) => {
                        format!("{} bloomed at ({}, {}) from {}", flower_id, x, y, origin)
                    }
                    None => format!("{} bloomed at ({}, {})", flower_id, x, y),
                };
                self.push_event(EventLevel::Info, message, Some(flower_id));
                true
            }
            GeneticsResponse::FlowerCreationFailed {
                request_id,
                epoch,
                x,
                y,
                error,
            } => {
                let Some(spawn) = self.claim(request_id, epoch) else {
                    return false;
                };
                self.grid.release(x, y);
                self.totals.genetics_failures += 1;
                self.push_event(
                    EventLevel::Error,
                    format!("Flower at ({}, {}) failed: {}", x, y, error),
                    spawn.origin,
                );
                true
            }
        }
    }

    /// Removes a request from the pending set if it is still current.
    fn claim(&mut self, request_id: u64, epoch: u64) -> Option<PendingSpawn> {
        if epoch != self.epoch {
            tracing::debug!(request_id, epoch, current = self.epoch, "Stale genetics response");
            return None;
        }
        let spawn = self.pending.remove(&request_id);
        if spawn.is_none() {
            tracing::debug!(request_id, "Unknown genetics response");
        }
        spawn
    }

    /// Applies every response that has already arrived. Returns how many
    /// were applied.
    pub fn drain_genetics(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.responses.try_recv() {
                Ok(response) => {
                    if self.apply_genetics(response) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Waits for the next response. `None` once the worker is gone.
    pub async fn next_genetics_response(&mut self) -> Option<GeneticsResponse> {
        self.responses.recv().await
    }

    /// Applies responses until nothing is pending. Gives up on the rest when
    /// a single wait exceeds `patience`.
    pub(crate) async fn await_pending(&mut self, patience: Duration) {
        while !self.pending.is_empty() {
            match tokio::time::timeout(patience, self.responses.recv()).await {
                Ok(Some(response)) => {
                    self.apply_genetics(response);
                }
                Ok(None) => break,
                Err(_) => {
                    let waiting = self.pending.len();
                    self.push_event(
                        EventLevel::Error,
                        format!("Gave up waiting on {} flower requests", waiting),
                        None,
                    );
                    self.cancel_pending();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_core::genetics::FlowerImage;
    use meadow_core::SimulationParams;
    use meadow_data::{ActorKind, FlowerStats, Sex};

    fn params() -> SimulationParams {
        let mut params = SimulationParams::default();
        params.world.width = 6;
        params.world.height = 6;
        params.world.seed = Some(4);
        params
    }

    fn created(request_id: u64, epoch: u64) -> GeneticsResponse {
        GeneticsResponse::FlowerCreated {
            request_id,
            epoch,
            x: 2,
            y: 3,
            genome: "ACGTTGCA".into(),
            image: FlowerImage {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            },
            stats: FlowerStats {
                max_health: 30.0,
                max_stamina: 30.0,
                maturation_period: 10,
                sex: Sex::Male,
                toxicity_rate: 0.0,
                effects: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_unknown_request_is_ignored() {
        let mut engine = Engine::with_procedural_genetics(params()).unwrap();
        assert!(!engine.apply_genetics(created(99, engine.epoch)));
        assert_eq!(engine.grid().count(ActorKind::Flower), 0);
    }

    #[tokio::test]
    async fn test_created_flower_lands_on_reserved_cell() {
        let mut engine = Engine::with_procedural_genetics(params()).unwrap();
        engine.pending.insert(
            7,
            PendingSpawn {
                x: 2,
                y: 3,
                origin: None,
            },
        );
        engine.grid.reserve(2, 3);

        assert!(engine.apply_genetics(created(7, engine.epoch)));
        assert!(engine.grid().has_kind_at(2, 3, ActorKind::Flower));
        assert!(!engine.grid().is_reserved(2, 3));
        assert!(engine.images().contains("ACGTTGCA"));
        assert_eq!(engine.totals().flowers_created, 1);
    }

    #[tokio::test]
    async fn test_response_from_old_epoch_is_stale() {
        let mut engine = Engine::with_procedural_genetics(params()).unwrap();
        engine.pending.insert(
            7,
            PendingSpawn {
                x: 2,
                y: 3,
                origin: None,
            },
        );
        let old = engine.epoch;
        engine.epoch += 1;
        assert!(!engine.apply_genetics(created(7, old)));
        assert_eq!(engine.grid().count(ActorKind::Flower), 0);
    }

    #[tokio::test]
    async fn test_unavailable_capability_disables_spawning() {
        let mut engine = Engine::with_procedural_genetics(params()).unwrap();
        engine.apply_genetics(GeneticsResponse::CapabilityUnavailable {
            reason: "no model".into(),
        });
        assert!(!engine.genetics_available());
        engine.grid.reserve(1, 1);
        engine.submit_flower(GeneticsOp::Create, 1, 1, None);
        assert_eq!(engine.pending_flower_requests(), 0);
        assert!(!engine.grid().is_reserved(1, 1));
        assert_eq!(engine.take_events()[0].level, EventLevel::Error);
    }
}
