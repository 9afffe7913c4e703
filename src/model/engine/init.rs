use super::{seeded_rng, Engine};
use meadow_core::error::Result;
use meadow_core::genetics::GeneticsOp;
use meadow_core::grid::Grid;
use meadow_core::lifecycle;
use meadow_core::systems::environment;
use meadow_data::{Actor, EnvironmentState, EventLevel};
use rand::seq::SliceRandom;
use std::time::Duration;

impl Engine {
    /// Clears everything and seeds a fresh meadow from the current params.
    ///
    /// Resolves once every initial flower request has been answered (or has
    /// timed out). A failed flower leaves its slot empty and raises an error
    /// event; it never fails the call.
    pub async fn initialize_grid(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.reset_world();

        let (width, height) = (self.params.world.width, self.params.world.height);
        let mut cells: Vec<(u16, u16)> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .collect();
        cells.shuffle(&mut self.rng);

        let pop = self.params.population.clone();
        for _ in 0..pop.hives {
            if let Some((x, y)) = cells.pop() {
                let hive = lifecycle::new_hive(x, y, &mut self.rng);
                self.seed_actor(hive);
            }
        }
        for _ in 0..pop.ant_colonies {
            if let Some((x, y)) = cells.pop() {
                let colony = lifecycle::new_colony(x, y, &mut self.rng);
                self.seed_actor(colony);
            }
        }
        let mut skipped = 0;
        for _ in 0..pop.flowers {
            if let Some((x, y)) = cells.pop() {
                if !self.genetics_available {
                    skipped += 1;
                    continue;
                }
                self.grid.reserve(x, y);
                self.submit_flower(GeneticsOp::Create, x, y, None);
            }
        }
        if skipped > 0 {
            self.push_event(
                EventLevel::Error,
                format!("{} flower slots skipped: genetics unavailable", skipped),
                None,
            );
        }
        for _ in 0..pop.insects {
            let (x, y) = self.pick_cell(&mut cells);
            let genome = lifecycle::random_insect_genome(&mut self.rng);
            let species = lifecycle::random_species(&mut self.rng);
            let insect = lifecycle::new_insect(x, y, species, genome, &self.params, &mut self.rng);
            self.seed_actor(insect);
        }
        for _ in 0..pop.cockroaches {
            let (x, y) = self.pick_cell(&mut cells);
            let roach = lifecycle::new_cockroach(x, y, &self.params, &mut self.rng);
            self.seed_actor(roach);
        }
        for _ in 0..pop.birds {
            let (x, y) = self.pick_cell(&mut cells);
            let bird = lifecycle::new_bird(x, y, &self.params, &mut self.rng);
            self.seed_actor(bird);
        }
        for _ in 0..pop.eagles {
            let (x, y) = self.pick_cell(&mut cells);
            let eagle = lifecycle::new_eagle(x, y, &self.params, &mut self.rng);
            self.seed_actor(eagle);
        }

        // Each request makes two capability calls, each bounded by the timeout.
        let wait = Duration::from_millis(self.params.genetics.timeout_ms.saturating_mul(2))
            + Duration::from_millis(100);
        self.await_pending(wait).await;

        let flowers = self.grid.count(meadow_data::ActorKind::Flower);
        self.push_event(
            EventLevel::Info,
            format!(
                "Meadow initialized: {}x{} with {} actors ({} flowers)",
                width,
                height,
                self.grid.len(),
                flowers
            ),
            None,
        );
        Ok(())
    }

    /// Drops the current world and starts a new epoch.
    pub(crate) fn reset_world(&mut self) {
        self.cancel_pending();
        self.grid = Grid::new(self.params.world.width, self.params.world.height);
        self.rng = seeded_rng(self.params.world.seed);
        self.env = initial_environment(&self.params);
        self.totals = Default::default();
        self.tick = 0;
        self.images.clear();
        self.grid_stale = false;
        self.needs_reset = true;
    }

    /// Next unused cell, or any cell once the grid is full.
    fn pick_cell(&mut self, cells: &mut Vec<(u16, u16)>) -> (u16, u16) {
        use rand::Rng;
        cells.pop().unwrap_or_else(|| {
            (
                self.rng.gen_range(0..self.params.world.width),
                self.rng.gen_range(0..self.params.world.height),
            )
        })
    }

    fn seed_actor(&mut self, actor: Actor) {
        if let Err(e) = self.grid.insert(actor) {
            tracing::warn!(error = %e, "Failed to seed actor");
        }
    }
}

fn initial_environment(params: &meadow_core::SimulationParams) -> EnvironmentState {
    let mut env = EnvironmentState {
        temperature: params.environment.base_temperature,
        humidity: params.environment.base_humidity,
        ..EnvironmentState::default()
    };
    environment::apply_climate(&mut env, &params.environment, 0, 0.0);
    env
}

#[cfg(test)]
mod tests {
    use super::super::EngineState;
    use super::*;
    use meadow_core::SimulationParams;
    use meadow_data::ActorKind;

    fn params() -> SimulationParams {
        let mut params = SimulationParams::default();
        params.world.width = 12;
        params.world.height = 10;
        params.world.seed = Some(9);
        params.population.flowers = 6;
        params.population.insects = 4;
        params.population.birds = 2;
        params
    }

    #[tokio::test]
    async fn test_initialize_populates_every_kind() {
        let mut engine = Engine::with_procedural_genetics(params()).unwrap();
        engine.initialize_grid().await.unwrap();

        let grid = engine.grid();
        assert_eq!(grid.count(ActorKind::Flower), 6);
        assert_eq!(grid.count(ActorKind::Insect), 4);
        assert_eq!(grid.count(ActorKind::Bird), 2);
        assert_eq!(grid.count(ActorKind::Hive), 1);
        assert_eq!(grid.count(ActorKind::AntColony), 1);
        assert_eq!(engine.pending_flower_requests(), 0);
        assert_eq!(engine.images().len(), 6);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine
            .take_events()
            .iter()
            .any(|e| e.message.starts_with("Meadow initialized")));
    }

    #[tokio::test]
    async fn test_skipped_flower_slots_are_reported() {
        let mut engine = Engine::with_procedural_genetics(params()).unwrap();
        engine.apply_genetics(meadow_core::genetics::GeneticsResponse::CapabilityUnavailable {
            reason: "offline".into(),
        });
        engine.take_events();

        engine.initialize_grid().await.unwrap();

        assert_eq!(engine.grid().count(ActorKind::Flower), 0);
        assert_eq!(engine.grid().count(ActorKind::Insect), 4);
        let events = engine.take_events();
        assert!(events
            .iter()
            .any(|e| e.level == EventLevel::Error && e.message.starts_with("6 flower slots skipped")));
    }

    #[tokio::test]
    async fn test_same_seed_same_layout() {
        let mut a = Engine::with_procedural_genetics(params()).unwrap();
        let mut b = Engine::with_procedural_genetics(params()).unwrap();
        a.initialize_grid().await.unwrap();
        b.initialize_grid().await.unwrap();
        let ids_a: Vec<_> = a.grid().actors().map(|x| x.id().clone()).collect();
        let ids_b: Vec<_> = b.grid().actors().map(|x| x.id().clone()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
