use super::actor::{Actor, ActorId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One change to the consumer's actor map.
///
/// Deltas must be applied in emission order. `Remove` of an unknown id and
/// `Update` of an unknown id are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActorDelta {
    /// Drop everything; the adds that follow describe the new world.
    Reset,
    Add {
        actor: Actor,
    },
    /// Top-level fields to shallow-merge into the existing record.
    Update {
        id: ActorId,
        changes: Map<String, Value>,
    },
    Remove {
        id: ActorId,
    },
}

/// Reference consumer: an id-keyed map kept current by applying deltas.
#[derive(Debug, Clone, Default)]
pub struct ActorMirror {
    records: BTreeMap<ActorId, Value>,
}

impl ActorMirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: &ActorDelta) {
        match delta {
            ActorDelta::Reset => self.records.clear(),
            ActorDelta::Add { actor } => {
                if let Ok(value) = serde_json::to_value(actor) {
                    self.records.insert(actor.id().clone(), value);
                }
            }
            ActorDelta::Update { id, changes } => {
                if let Some(Value::Object(record)) = self.records.get_mut(id) {
                    for (key, value) in changes {
                        record.insert(key.clone(), value.clone());
                    }
                }
            }
            ActorDelta::Remove { id } => {
                self.records.remove(id);
            }
        }
    }

    pub fn apply_all<'a>(&mut self, deltas: impl IntoIterator<Item = &'a ActorDelta>) {
        for delta in deltas {
            self.apply(delta);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ActorId) -> Option<&Value> {
        self.records.get(id)
    }

    /// Decodes a record back into a typed actor.
    #[must_use]
    pub fn actor(&self, id: &ActorId) -> Option<Actor> {
        self.records
            .get(id)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn ids(&self) -> impl Iterator<Item = &ActorId> {
        self.records.keys()
    }
}
