//! Per-tick behaviour rules.
//!
//! A tick runs six phases in a fixed order, each mutating the grid in place:
//! flora, insects (and cockroaches), predators, colonies, weather, expiry.
//! Later phases see what earlier phases did; nothing looks ahead. Inside a
//! phase actors are visited by ascending id and an actor removed earlier in
//! the tick is skipped. Randomness always comes from the engine's seeded rng.

pub mod colonies;
pub mod environment;
pub mod expiry;
pub mod flora;
pub mod insects;
pub mod movement;
pub mod predators;
pub mod weather;

use crate::config::SimulationParams;
use crate::genetics::GeneticsOp;
use crate::grid::Grid;
use crate::lifecycle;
use meadow_data::{
    Actor, ActorId, ActorKind, AppEvent, CumulativeTotals, EnvironmentState, EventLevel,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// A flower that should exist once the genetics capability answers. The
/// target cell is already reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub op: GeneticsOp,
    pub x: u16,
    pub y: u16,
    /// Actor that caused the request, for event text.
    pub origin: Option<ActorId>,
}

/// Everything a phase may touch.
pub struct TickContext<'a> {
    pub tick: u64,
    pub params: &'a SimulationParams,
    pub grid: &'a mut Grid,
    pub env: &'a mut EnvironmentState,
    pub rng: &'a mut ChaCha8Rng,
    pub totals: &'a mut CumulativeTotals,
    pub events: Vec<AppEvent>,
    pub spawn_requests: Vec<SpawnRequest>,
}

pub type Phase = fn(&mut TickContext<'_>);

/// Resolver order within one tick.
pub const PHASES: [(&str, Phase); 6] = [
    ("flora", flora::run),
    ("insects", insects::run),
    ("predators", predators::run),
    ("colonies", colonies::run),
    ("weather", weather::run),
    ("expiry", expiry::run),
];

pub fn run_tick(ctx: &mut TickContext<'_>) {
    for (name, phase) in PHASES {
        let _span = tracing::trace_span!("tick_phase", phase = name).entered();
        phase(ctx);
    }
}

impl<'a> TickContext<'a> {
    pub fn new(
        tick: u64,
        params: &'a SimulationParams,
        grid: &'a mut Grid,
        env: &'a mut EnvironmentState,
        rng: &'a mut ChaCha8Rng,
        totals: &'a mut CumulativeTotals,
    ) -> Self {
        Self {
            tick,
            params,
            grid,
            env,
            rng,
            totals,
            events: Vec::new(),
            spawn_requests: Vec::new(),
        }
    }

    pub fn event(&mut self, level: EventLevel, message: String, actor_id: Option<ActorId>) {
        match level {
            EventLevel::Info => tracing::debug!(tick = self.tick, "{}", message),
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

    pub fn info(&mut self, message: String, actor_id: Option<&ActorId>) {
        self.event(EventLevel::Info, message, actor_id.cloned());
    }

    /// Writes back a modified actor.
    pub fn store(&mut self, actor: Actor) {
        if let Err(e) = self.grid.update(actor) {
            tracing::warn!(error = %e, "Dropped actor update");
        }
    }

    pub fn spawn(&mut self, actor: Actor) -> bool {
        match self.grid.insert(actor) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Spawn failed");
                false
            }
        }
    }

    /// Adds `value` to the nutrient on a cell, creating one if needed.
    pub fn deposit_nutrient(&mut self, x: u16, y: u16, value: f32) {
        let existing = self.grid.first_at(x, y, ActorKind::Nutrient).cloned();
        match existing {
            Some(Actor::Nutrient(mut nutrient)) => {
                nutrient.value += value;
                nutrient.decay_timer = self.params.thresholds.nutrient_decay;
                self.store(Actor::Nutrient(nutrient));
            }
            _ => {
                let nutrient = lifecycle::new_nutrient(x, y, value, self.params, self.rng);
                self.spawn(nutrient);
            }
        }
    }

    /// Removes a dying actor, leaving a Nutrient on its cell and, when
    /// `corpse` is set, a Corpse with probability `corpse_chance`.
    pub fn kill(&mut self, id: &ActorId, corpse: bool) -> Option<Actor> {
        let actor = self.grid.remove(id)?;
        let (x, y) = actor.position();
        self.deposit_nutrient(x, y, self.params.thresholds.nutrient_value);
        if corpse && self.rng.gen::<f32>() < self.params.thresholds.corpse_chance {
            let remains = lifecycle::new_corpse(x, y, actor.kind(), self.params, self.rng);
            self.spawn(remains);
        }
        self.totals.deaths += 1;
        Some(actor)
    }

    /// A random empty, unreserved neighbour.
    pub fn random_free_adjacent(&mut self, x: u16, y: u16) -> Option<(u16, u16)> {
        self.grid.free_adjacent(x, y).choose(self.rng).copied()
    }

    pub fn reject_spawn(&mut self, x: u16, y: u16, actor_id: &ActorId) {
        self.totals.spawns_rejected += 1;
        let error = crate::error::SimError::SpawnRejected { x, y };
        self.event(
            EventLevel::Warning,
            format!("{} could not spawn: {}", actor_id, error),
            Some(actor_id.clone()),
        );
    }

    /// Reserves the cell and queues a genetics request for it.
    pub fn request_flower(&mut self, op: GeneticsOp, x: u16, y: u16, origin: Option<ActorId>) {
        self.grid.reserve(x, y);
        self.spawn_requests.push(SpawnRequest { op, x, y, origin });
    }
}
