//! Actor construction: ids, initial stats and inherited insect genomes.

use crate::config::SimulationParams;
use meadow_data::{
    Actor, ActorId, ActorKind, AntColony, Cockroach, Cocoon, Corpse, Egg, EggContents, Flower,
    FlowerSeed, FlowerStats, HerbicidePlane, HerbicideSmoke, Hive, Insect, InsectSpecies,
    Nutrient, Predator,
};
use rand::Rng;

/// Number of genes in an insect genome.
pub const INSECT_GENES: usize = 3;

pub fn next_id<R: Rng>(kind: ActorKind, rng: &mut R) -> ActorId {
    ActorId::new(kind, rng.gen::<u128>())
}

pub fn random_insect_genome<R: Rng>(rng: &mut R) -> Vec<f32> {
    (0..INSECT_GENES).map(|_| rng.gen_range(0.8..1.2)).collect()
}

/// Uniform crossover of two parent genomes followed by per-gene mutation.
pub fn inherit_insect_genome<R: Rng>(
    a: &[f32],
    b: &[f32],
    params: &SimulationParams,
    rng: &mut R,
) -> Vec<f32> {
    let rate = params.reproduction.mutation_rate;
    let amount = params.reproduction.mutation_amount;
    (0..INSECT_GENES)
        .map(|i| {
            let pa = a.get(i).copied().unwrap_or(1.0);
            let pb = b.get(i).copied().unwrap_or(1.0);
            let mut gene = if rng.gen_bool(0.5) { pa } else { pb };
            if amount > 0.0 && rng.gen::<f32>() < rate {
                gene += rng.gen_range(-amount..=amount);
            }
            gene.clamp(0.25, 4.0)
        })
        .collect()
}

pub fn random_species<R: Rng>(rng: &mut R) -> InsectSpecies {
    InsectSpecies::ALL[rng.gen_range(0..InsectSpecies::ALL.len())]
}

pub fn new_flower<R: Rng>(
    x: u16,
    y: u16,
    genome: String,
    stats: FlowerStats,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    Actor::Flower(Flower {
        id: next_id(ActorKind::Flower, rng),
        x,
        y,
        genome,
        health: stats.max_health,
        stamina: stats.max_stamina,
        stats,
        age: 0,
        nectar: params.flora.max_nectar / 2.0,
        reproduction_cooldown: params.reproduction.flower_cooldown,
    })
}

pub fn new_seed<R: Rng>(
    x: u16,
    y: u16,
    genome: String,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    Actor::FlowerSeed(FlowerSeed {
        id: next_id(ActorKind::FlowerSeed, rng),
        x,
        y,
        genome,
        germination_timer: params.reproduction.seed_germination_ticks,
    })
}

pub fn new_insect<R: Rng>(
    x: u16,
    y: u16,
    species: InsectSpecies,
    genome: Vec<f32>,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    let mut insect = Insect {
        id: next_id(ActorKind::Insect, rng),
        x,
        y,
        species,
        genome,
        health: 0.0,
        max_health: 0.0,
        stamina: 0.0,
        max_stamina: params.fauna.insect_max_stamina,
        age: 0,
        max_age: params.fauna.insect_max_age,
        reproduction_cooldown: params.reproduction.insect_cooldown,
        pollen: None,
    };
    insect.max_health = params.fauna.insect_max_health * insect.hardiness();
    insect.health = insect.max_health;
    insect.stamina = insect.max_stamina;
    Actor::Insect(insect)
}

pub fn new_cockroach<R: Rng>(x: u16, y: u16, params: &SimulationParams, rng: &mut R) -> Actor {
    Actor::Cockroach(Cockroach {
        id: next_id(ActorKind::Cockroach, rng),
        x,
        y,
        health: params.fauna.insect_max_health,
        max_health: params.fauna.insect_max_health,
        age: 0,
        max_age: params.fauna.cockroach_max_age,
    })
}

fn predator<R: Rng>(kind: ActorKind, x: u16, y: u16, params: &SimulationParams, rng: &mut R) -> Predator {
    Predator {
        id: next_id(kind, rng),
        x,
        y,
        health: params.fauna.predator_max_health,
        max_health: params.fauna.predator_max_health,
        stamina: params.fauna.predator_max_stamina,
        max_stamina: params.fauna.predator_max_stamina,
        reproduction_cooldown: params.reproduction.bird_cooldown,
        kills: 0,
    }
}

pub fn new_bird<R: Rng>(x: u16, y: u16, params: &SimulationParams, rng: &mut R) -> Actor {
    Actor::Bird(predator(ActorKind::Bird, x, y, params, rng))
}

pub fn new_eagle<R: Rng>(x: u16, y: u16, params: &SimulationParams, rng: &mut R) -> Actor {
    Actor::Eagle(predator(ActorKind::Eagle, x, y, params, rng))
}

pub fn new_egg<R: Rng>(
    x: u16,
    y: u16,
    contents: EggContents,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    Actor::Egg(Egg {
        id: next_id(ActorKind::Egg, rng),
        x,
        y,
        hatch_timer: params.reproduction.egg_hatch_ticks,
        contents,
    })
}

pub fn new_cocoon<R: Rng>(
    x: u16,
    y: u16,
    species: InsectSpecies,
    genome: Vec<f32>,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    Actor::Cocoon(Cocoon {
        id: next_id(ActorKind::Cocoon, rng),
        x,
        y,
        timer: params.reproduction.cocoon_ticks,
        species,
        genome,
    })
}

pub fn new_nutrient<R: Rng>(
    x: u16,
    y: u16,
    value: f32,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    Actor::Nutrient(Nutrient {
        id: next_id(ActorKind::Nutrient, rng),
        x,
        y,
        value,
        decay_timer: params.thresholds.nutrient_decay,
    })
}

pub fn new_corpse<R: Rng>(
    x: u16,
    y: u16,
    source: ActorKind,
    params: &SimulationParams,
    rng: &mut R,
) -> Actor {
    Actor::Corpse(Corpse {
        id: next_id(ActorKind::Corpse, rng),
        x,
        y,
        decay_timer: params.thresholds.corpse_decay,
        source,
    })
}

pub fn new_plane<R: Rng>(x: u16, y: u16, rng: &mut R) -> Actor {
    Actor::HerbicidePlane(HerbicidePlane {
        id: next_id(ActorKind::HerbicidePlane, rng),
        x,
        y,
    })
}

pub fn new_smoke<R: Rng>(x: u16, y: u16, params: &SimulationParams, rng: &mut R) -> Actor {
    Actor::HerbicideSmoke(HerbicideSmoke {
        id: next_id(ActorKind::HerbicideSmoke, rng),
        x,
        y,
        timer: params.thresholds.smoke_duration,
        potency: params.thresholds.smoke_potency,
    })
}

pub fn new_hive<R: Rng>(x: u16, y: u16, rng: &mut R) -> Actor {
    Actor::Hive(Hive {
        id: next_id(ActorKind::Hive, rng),
        x,
        y,
        honey: 0.0,
        spawned: 0,
        blocked: false,
    })
}

pub fn new_colony<R: Rng>(x: u16, y: u16, rng: &mut R) -> Actor {
    Actor::AntColony(AntColony {
        id: next_id(ActorKind::AntColony, rng),
        x,
        y,
        food_reserves: 0.0,
        spawned: 0,
        blocked: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_ids_are_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(
            next_id(ActorKind::Bird, &mut a),
            next_id(ActorKind::Bird, &mut b)
        );
        assert_ne!(
            next_id(ActorKind::Bird, &mut a),
            next_id(ActorKind::Bird, &mut a)
        );
    }

    #[test]
    fn test_inherited_genes_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut params = SimulationParams::default();
        params.reproduction.mutation_rate = 1.0;
        params.reproduction.mutation_amount = 10.0;
        for _ in 0..100 {
            let child = inherit_insect_genome(&[0.3, 1.0, 3.9], &[1.0, 1.0, 1.0], &params, &mut rng);
            assert_eq!(child.len(), INSECT_GENES);
            assert!(child.iter().all(|g| (0.25..=4.0).contains(g)));
        }
    }

    #[test]
    fn test_without_mutation_genes_come_from_a_parent() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut params = SimulationParams::default();
        params.reproduction.mutation_rate = 0.0;
        let child = inherit_insect_genome(&[0.5, 0.5, 0.5], &[2.0, 2.0, 2.0], &params, &mut rng);
        assert!(child.iter().all(|g| *g == 0.5 || *g == 2.0));
    }

    #[test]
    fn test_new_insect_scales_health_by_hardiness() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let params = SimulationParams::default();
        let actor = new_insect(1, 2, InsectSpecies::Bee, vec![1.0, 1.0, 2.0], &params, &mut rng);
        let insect = actor.as_insect().unwrap();
        assert_eq!(insect.max_health, params.fauna.insect_max_health * 2.0);
        assert_eq!(insect.health, insect.max_health);
        assert_eq!(actor.position(), (1, 2));
    }
}
