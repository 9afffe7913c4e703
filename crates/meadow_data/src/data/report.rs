use super::actor::{ActorId, ActorKind};
use super::environment::EnvironmentState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

/// Human-readable notice produced while simulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEvent {
    pub tick: u64,
    pub level: EventLevel,
    pub message: String,
    pub actor_id: Option<ActorId>,
    pub timestamp: String,
}

/// Counters that only ever grow, persisted with snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeTotals {
    pub bird_kills: u64,
    pub eagle_kills: u64,
    pub hatchings: u64,
    pub deaths: u64,
    pub eggs_laid: u64,
    pub flowers_created: u64,
    pub pollinations: u64,
    pub genetics_failures: u64,
    pub spawns_rejected: u64,
}

impl CumulativeTotals {
    #[must_use]
    pub fn kills(&self) -> u64 {
        self.bird_kills + self.eagle_kills
    }
}

/// Aggregated per-tick report consumed by analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: u64,
    pub counts: BTreeMap<ActorKind, usize>,
    pub totals: CumulativeTotals,
    pub environment: EnvironmentState,
    pub pending_flower_requests: usize,
}

impl TickSummary {
    #[must_use]
    pub fn count(&self, kind: ActorKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.counts.values().sum()
    }
}
