//! Simulation parameters.
//!
//! Strongly-typed configuration that maps to a `meadow.toml` file. Every
//! section falls back to its defaults, so a file only needs the values it
//! overrides.
//!
//! ```toml
//! [world]
//! width = 40
//! height = 30
//! seed = 7
//!
//! [population]
//! flowers = 30
//! insects = 20
//!
//! [thresholds]
//! hive_spawn_cost = 60.0
//! herbicide_trigger_density = 0.35
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid dimensions and RNG seed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldParams {
    pub width: u16,
    pub height: u16,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            seed: None,
        }
    }
}

/// Initial actor counts used by `initialize_grid`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationParams {
    pub flowers: usize,
    pub insects: usize,
    pub cockroaches: usize,
    pub birds: usize,
    pub eagles: usize,
    pub hives: usize,
    pub ant_colonies: usize,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            flowers: 30,
            insects: 20,
            cockroaches: 3,
            birds: 3,
            eagles: 1,
            hives: 1,
            ant_colonies: 1,
        }
    }
}

/// Climate baselines, seasonal amplitudes and weather event odds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnvironmentParams {
    pub base_temperature: f32,
    pub temperature_amplitude: f32,
    pub base_humidity: f32,
    pub humidity_amplitude: f32,
    /// Ticks per full seasonal cycle.
    pub season_length: u64,
    /// Uniform jitter added to temperature each tick; humidity gets 1/50th.
    pub noise: f32,
    pub weather_event_chance: f32,
    pub weather_min_duration: u32,
    pub weather_max_duration: u32,
}

impl Default for EnvironmentParams {
    fn default() -> Self {
        Self {
            base_temperature: 18.0,
            temperature_amplitude: 8.0,
            base_humidity: 0.55,
            humidity_amplitude: 0.2,
            season_length: 400,
            noise: 0.5,
            weather_event_chance: 0.01,
            weather_min_duration: 10,
            weather_max_duration: 40,
        }
    }
}

/// Cooldowns, incubation times and heritable variation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReproductionParams {
    pub insect_cooldown: u32,
    pub bird_cooldown: u32,
    pub flower_cooldown: u32,
    /// Per-gene chance of perturbing an inherited insect gene.
    pub mutation_rate: f32,
    pub mutation_amount: f32,
    pub egg_hatch_ticks: u32,
    pub cocoon_ticks: u32,
    pub seed_germination_ticks: u32,
}

impl Default for ReproductionParams {
    fn default() -> Self {
        Self {
            insect_cooldown: 30,
            bird_cooldown: 80,
            flower_cooldown: 25,
            mutation_rate: 0.1,
            mutation_amount: 0.2,
            egg_hatch_ticks: 15,
            cocoon_ticks: 12,
            seed_germination_ticks: 20,
        }
    }
}

/// Flower metabolism.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FloraParams {
    pub comfortable_temperature: f32,
    pub comfortable_humidity: f32,
    pub metabolic_cost: f32,
    pub stamina_regen: f32,
    pub starvation_damage: f32,
    pub max_nectar: f32,
    pub nectar_regen: f32,
    /// Flowers die of old age after this many maturation periods.
    pub lifespan_periods: u32,
}

impl Default for FloraParams {
    fn default() -> Self {
        Self {
            comfortable_temperature: 20.0,
            comfortable_humidity: 0.6,
            metabolic_cost: 0.6,
            stamina_regen: 1.0,
            starvation_damage: 2.0,
            max_nectar: 10.0,
            nectar_regen: 0.5,
            lifespan_periods: 4,
        }
    }
}

/// Insect, cockroach and predator tuning.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FaunaParams {
    pub insect_vision: f32,
    pub insect_max_health: f32,
    pub insect_max_stamina: f32,
    pub insect_max_age: u32,
    pub insect_move_cost: f32,
    /// Below this fraction of max stamina an insect rests instead of moving.
    pub insect_rest_fraction: f32,
    pub insect_rest_regen: f32,
    pub insect_starvation_damage: f32,
    pub nectar_sip: f32,
    pub toxicity_scale: f32,
    pub cockroach_vision: f32,
    pub cockroach_max_age: u32,
    pub bird_vision: f32,
    pub eagle_vision: f32,
    pub predator_max_health: f32,
    pub predator_max_stamina: f32,
    pub predator_hunger: f32,
    pub predator_starvation_damage: f32,
    pub frost_damage: f32,
    pub storm_push_chance: f32,
}

impl Default for FaunaParams {
    fn default() -> Self {
        Self {
            insect_vision: 6.0,
            insect_max_health: 20.0,
            insect_max_stamina: 30.0,
            insect_max_age: 300,
            insect_move_cost: 0.5,
            insect_rest_fraction: 0.2,
            insect_rest_regen: 3.0,
            insect_starvation_damage: 1.0,
            nectar_sip: 3.0,
            toxicity_scale: 2.0,
            cockroach_vision: 8.0,
            cockroach_max_age: 400,
            bird_vision: 12.0,
            eagle_vision: 16.0,
            predator_max_health: 40.0,
            predator_max_stamina: 120.0,
            predator_hunger: 0.5,
            predator_starvation_damage: 1.0,
            frost_damage: 0.5,
            storm_push_chance: 0.3,
        }
    }
}

/// Per-species thresholds for structures, herbicide and remains.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ThresholdParams {
    pub hive_spawn_cost: f32,
    pub hive_radius: f32,
    pub honey_per_flower: f32,
    pub colony_spawn_cost: f32,
    pub colony_radius: f32,
    /// Flowers per cell above which herbicide planes may be dispatched.
    pub herbicide_trigger_density: f32,
    pub herbicide_chance: f32,
    pub smoke_duration: u32,
    pub smoke_potency: f32,
    pub corpse_chance: f32,
    pub nutrient_value: f32,
    pub nutrient_decay: u32,
    pub corpse_decay: u32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            hive_spawn_cost: 60.0,
            hive_radius: 5.0,
            honey_per_flower: 0.2,
            colony_spawn_cost: 40.0,
            colony_radius: 6.0,
            herbicide_trigger_density: 0.35,
            herbicide_chance: 0.05,
            smoke_duration: 6,
            smoke_potency: 8.0,
            corpse_chance: 0.3,
            nutrient_value: 10.0,
            nutrient_decay: 40,
            corpse_decay: 30,
        }
    }
}

/// Bounds on the external genetics capability.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneticsParams {
    /// Upper bound for initialization and for each capability call.
    pub timeout_ms: u64,
}

impl Default for GeneticsParams {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Full parameter set of one simulation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimulationParams {
    pub world: WorldParams,
    pub population: PopulationParams,
    pub environment: EnvironmentParams,
    pub reproduction: ReproductionParams,
    pub flora: FloraParams,
    pub fauna: FaunaParams,
    pub thresholds: ThresholdParams,
    pub genetics: GeneticsParams,
}

fn ensure_probability(value: f32, name: &str) -> anyhow::Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&value),
        "{} must be in [0.0, 1.0]",
        name
    );
    Ok(())
}

impl SimulationParams {
    /// Validates all parameters, reporting the first failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.world.width > 0, "World width must be positive");
        anyhow::ensure!(self.world.width <= 1000, "World width too large (max 1000)");
        anyhow::ensure!(self.world.height > 0, "World height must be positive");
        anyhow::ensure!(
            self.world.height <= 1000,
            "World height too large (max 1000)"
        );

        let cells = self.world.width as usize * self.world.height as usize;
        let structures = self.population.hives + self.population.ant_colonies;
        anyhow::ensure!(
            self.population.flowers + structures <= cells,
            "Flowers and structures do not fit on the grid"
        );

        anyhow::ensure!(
            self.environment.season_length > 0,
            "Season length must be positive"
        );
        anyhow::ensure!(self.environment.noise >= 0.0, "Noise must be non-negative");
        ensure_probability(self.environment.base_humidity, "Base humidity")?;
        ensure_probability(
            self.environment.weather_event_chance,
            "Weather event chance",
        )?;
        anyhow::ensure!(
            self.environment.weather_min_duration > 0
                && self.environment.weather_min_duration <= self.environment.weather_max_duration,
            "Weather durations must satisfy 0 < min <= max"
        );

        ensure_probability(self.reproduction.mutation_rate, "Mutation rate")?;
        anyhow::ensure!(
            self.reproduction.mutation_amount >= 0.0,
            "Mutation amount must be non-negative"
        );
        anyhow::ensure!(
            self.reproduction.egg_hatch_ticks > 0 && self.reproduction.cocoon_ticks > 0,
            "Incubation times must be positive"
        );

        anyhow::ensure!(
            self.flora.metabolic_cost >= 0.0 && self.flora.stamina_regen >= 0.0,
            "Flower metabolism rates must be non-negative"
        );
        anyhow::ensure!(
            self.flora.lifespan_periods > 0,
            "Flower lifespan must be positive"
        );

        anyhow::ensure!(
            self.fauna.insect_max_health > 0.0 && self.fauna.predator_max_health > 0.0,
            "Max health must be positive"
        );
        ensure_probability(self.fauna.insect_rest_fraction, "Insect rest fraction")?;
        ensure_probability(self.fauna.storm_push_chance, "Storm push chance")?;

        anyhow::ensure!(
            self.thresholds.hive_spawn_cost > 0.0 && self.thresholds.colony_spawn_cost > 0.0,
            "Spawn costs must be positive"
        );
        ensure_probability(self.thresholds.corpse_chance, "Corpse chance")?;
        ensure_probability(self.thresholds.herbicide_chance, "Herbicide chance")?;
        anyhow::ensure!(
            self.thresholds.herbicide_trigger_density >= 0.0,
            "Herbicide trigger density must be non-negative"
        );

        anyhow::ensure!(
            self.genetics.timeout_ms > 0,
            "Genetics timeout must be positive"
        );
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let params = toml::from_str::<Self>(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Loads `path`, falling back to defaults when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No params file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid params in {}", path.display()))
    }

    /// True when switching to `other` invalidates the current grid.
    #[must_use]
    pub fn invalidates_grid(&self, other: &SimulationParams) -> bool {
        self.world.width != other.world.width
            || self.world.height != other.world.height
            || self.population != other.population
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}
