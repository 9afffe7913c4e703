//! Producer side of the actor delta protocol.
//!
//! The tracker remembers the JSON form of every actor the consumer has been
//! told about and diffs the grid against it. A batch holds removes, then
//! adds, then updates, each in ascending id order.

use crate::grid::Grid;
use meadow_data::{Actor, ActorDelta, ActorId};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct DeltaTracker {
    seen: BTreeMap<ActorId, Map<String, Value>>,
}

fn fields(actor: &Actor) -> Option<Map<String, Value>> {
    match serde_json::to_value(actor) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(id = %actor.id(), error = %e, "Actor not serializable");
            None
        }
    }
}

impl DeltaTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything and describes the whole grid from scratch.
    pub fn reset(&mut self, grid: &Grid) -> Vec<ActorDelta> {
        self.seen.clear();
        let mut deltas = Vec::with_capacity(grid.len() + 1);
        deltas.push(ActorDelta::Reset);
        for actor in grid.actors() {
            if let Some(map) = fields(actor) {
                self.seen.insert(actor.id().clone(), map);
                deltas.push(ActorDelta::Add {
                    actor: actor.clone(),
                });
            }
        }
        deltas
    }

    /// Changes since the previous call.
    pub fn diff(&mut self, grid: &Grid) -> Vec<ActorDelta> {
        let removed: Vec<ActorId> = self
            .seen
            .keys()
            .filter(|id| !grid.contains(id))
            .cloned()
            .collect();

        let mut deltas: Vec<ActorDelta> = Vec::with_capacity(removed.len());
        for id in removed {
            self.seen.remove(&id);
            deltas.push(ActorDelta::Remove { id });
        }

        let mut updates = Vec::new();
        for actor in grid.actors() {
            let Some(current) = fields(actor) else {
                continue;
            };
            match self.seen.get_mut(actor.id()) {
                None => {
                    deltas.push(ActorDelta::Add {
                        actor: actor.clone(),
                    });
                    self.seen.insert(actor.id().clone(), current);
                }
                Some(previous) => {
                    let changes: Map<String, Value> = current
                        .iter()
                        .filter(|(key, value)| previous.get(*key) != Some(*value))
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect();
                    if !changes.is_empty() {
                        *previous = current;
                        updates.push(ActorDelta::Update {
                            id: actor.id().clone(),
                            changes,
                        });
                    }
                }
            }
        }
        deltas.extend(updates);
        deltas
    }

    /// Number of actors the consumer currently knows about.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
