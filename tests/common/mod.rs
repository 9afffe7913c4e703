pub mod macros;

use meadow_core::lifecycle;
use meadow_core::SimulationParams;
use meadow_data::{Actor, ActorId, InsectSpecies};
use meadow_lib::model::Engine;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Builds an engine with an empty, hand-placed meadow.
#[allow(dead_code)]
pub struct SceneBuilder {
    params: SimulationParams,
    actors: Vec<Actor>,
    rng: ChaCha8Rng,
}

#[allow(dead_code)]
impl SceneBuilder {
    pub fn new() -> Self {
        let mut params = SimulationParams::default();
        params.world.width = 15;
        params.world.height = 15;
        params.world.seed = Some(42);
        params.population.flowers = 0;
        params.population.insects = 0;
        params.population.cockroaches = 0;
        params.population.birds = 0;
        params.population.eagles = 0;
        params.population.hives = 0;
        params.population.ant_colonies = 0;
        params.environment.weather_event_chance = 0.0;
        params.environment.noise = 0.0;
        Self {
            params,
            actors: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(42),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.world.seed = Some(seed);
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.params.world.width = width;
        self.params.world.height = height;
        self
    }

    pub fn with_params<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimulationParams),
    {
        modifier(&mut self.params);
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn with_bird(mut self, x: u16, y: u16) -> Self {
        let bird = lifecycle::new_bird(x, y, &self.params, &mut self.rng);
        self.actors.push(bird);
        self
    }

    pub fn with_insect(self, x: u16, y: u16, species: InsectSpecies) -> Self {
        self.with_insect_where(x, y, species, |_| {})
    }

    /// Insect ready to breed immediately.
    pub fn with_ready_insect(self, x: u16, y: u16, species: InsectSpecies) -> Self {
        self.with_insect_where(x, y, species, |insect| {
            if let Actor::Insect(i) = insect {
                i.reproduction_cooldown = 0;
            }
        })
    }

    pub fn with_insect_where<F>(mut self, x: u16, y: u16, species: InsectSpecies, edit: F) -> Self
    where
        F: FnOnce(&mut Actor),
    {
        let mut insect =
            lifecycle::new_insect(x, y, species, vec![1.0; 3], &self.params, &mut self.rng);
        edit(&mut insect);
        self.actors.push(insect);
        self
    }

    pub fn with_seed_actor(mut self, x: u16, y: u16, genome: &str) -> Self {
        let seed = lifecycle::new_seed(x, y, genome.to_string(), &self.params, &mut self.rng);
        self.actors.push(seed);
        self
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Ids of the placed actors, in placement order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.iter().map(|a| a.id().clone()).collect()
    }

    /// Must run inside a tokio runtime.
    pub fn build(self) -> Engine {
        let mut engine = Engine::with_procedural_genetics(self.params)
            .expect("Failed to create engine in test builder");
        for actor in self.actors {
            engine
                .place_actor(actor)
                .expect("Failed to place actor in test builder");
        }
        engine
    }
}
