//! Hives turn nearby flowers into honey and bees; ant colonies turn
//! nutrients into ants.

use super::TickContext;
use crate::lifecycle;
use meadow_data::{Actor, ActorKind, InsectSpecies};

pub fn run(ctx: &mut TickContext<'_>) {
    hives(ctx);
    ant_colonies(ctx);
}

fn hives(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    let t = &params.thresholds;
    let flowers = ctx.grid.spatial_index(|a| a.kind() == ActorKind::Flower);

    for id in ctx.grid.ids_of(ActorKind::Hive) {
        let Some(Actor::Hive(mut hive)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        let nearby = flowers
            .query_radius(f64::from(hive.x), f64::from(hive.y), f64::from(t.hive_radius))
            .len();
        hive.honey += nearby as f32 * t.honey_per_flower;

        if hive.honey >= t.hive_spawn_cost {
            match ctx.random_free_adjacent(hive.x, hive.y) {
                Some((x, y)) => {
                    let genome = lifecycle::random_insect_genome(ctx.rng);
                    let bee =
                        lifecycle::new_insect(x, y, InsectSpecies::Bee, genome, params, ctx.rng);
                    if ctx.spawn(bee) {
                        hive.honey -= t.hive_spawn_cost;
                        hive.spawned += 1;
                        hive.blocked = false;
                        ctx.info(format!("{} produced a bee", hive.id), Some(&hive.id));
                    }
                }
                None => {
                    if !hive.blocked {
                        ctx.reject_spawn(hive.x, hive.y, &hive.id);
                    }
                    hive.blocked = true;
                }
            }
        }
        ctx.store(Actor::Hive(hive));
    }
}

fn ant_colonies(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    let t = &params.thresholds;
    let nutrients = ctx
        .grid
        .spatial_index(|a| a.kind() == ActorKind::Nutrient);

    for id in ctx.grid.ids_of(ActorKind::AntColony) {
        let Some(Actor::AntColony(mut colony)) = ctx.grid.get(&id).cloned() else {
            continue;
        };

        let grid = &*ctx.grid;
        let harvest = nutrients
            .nearest(
                f64::from(colony.x),
                f64::from(colony.y),
                f64::from(t.colony_radius),
                |nid| grid.contains(nid),
            )
            .map(|p| p.data.clone());
        if let Some(nutrient_id) = harvest {
            if let Some(Actor::Nutrient(nutrient)) = ctx.grid.remove(&nutrient_id) {
                colony.food_reserves += nutrient.value;
            }
        }

        if colony.food_reserves >= t.colony_spawn_cost {
            match ctx.random_free_adjacent(colony.x, colony.y) {
                Some((x, y)) => {
                    let genome = lifecycle::random_insect_genome(ctx.rng);
                    let ant =
                        lifecycle::new_insect(x, y, InsectSpecies::Ant, genome, params, ctx.rng);
                    if ctx.spawn(ant) {
                        colony.food_reserves -= t.colony_spawn_cost;
                        colony.spawned += 1;
                        colony.blocked = false;
                        ctx.info(format!("{} produced an ant", colony.id), Some(&colony.id));
                    }
                }
                None => {
                    if !colony.blocked {
                        ctx.reject_spawn(colony.x, colony.y, &colony.id);
                    }
                    colony.blocked = true;
                }
            }
        }
        ctx.store(Actor::AntColony(colony));
    }
}

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use super::*;
    use meadow_data::{FlowerStats, Sex};

    #[test]
    fn test_hive_spawns_bee_when_honey_reaches_cost() {
        let mut h = Harness::new(9, 9);
        h.params.thresholds.hive_spawn_cost = 1.0;
        h.params.thresholds.honey_per_flower = 1.0;
        let hive = lifecycle::new_hive(4, 4, &mut h.rng);
        let hive = h.add(hive);
        let stats = FlowerStats {
            max_health: 10.0,
            max_stamina: 10.0,
            maturation_period: 5,
            sex: Sex::Male,
            toxicity_rate: 0.0,
            effects: Vec::new(),
        };
        let flower = lifecycle::new_flower(6, 4, "ACGT".into(), stats, &h.params, &mut h.rng);
        h.add(flower);

        h.run(1, run);
        let bees: Vec<_> = h
            .grid
            .actors()
            .filter_map(Actor::as_insect)
            .filter(|i| i.species == InsectSpecies::Bee)
            .collect();
        assert_eq!(bees.len(), 1);
        match h.grid.get(&hive) {
            Some(Actor::Hive(hv)) => {
                assert_eq!(hv.spawned, 1);
                assert_eq!(hv.honey, 0.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_colony_harvests_nearest_nutrient() {
        let mut h = Harness::new(9, 9);
        h.params.thresholds.colony_spawn_cost = 1000.0;
        let colony = lifecycle::new_colony(0, 0, &mut h.rng);
        let colony = h.add(colony);
        let near = lifecycle::new_nutrient(1, 1, 4.0, &h.params, &mut h.rng);
        let near = h.add(near);
        let far = lifecycle::new_nutrient(3, 3, 9.0, &h.params, &mut h.rng);
        let far = h.add(far);

        h.run(1, run);
        assert!(!h.grid.contains(&near));
        assert!(h.grid.contains(&far));
        match h.grid.get(&colony) {
            Some(Actor::AntColony(c)) => assert_eq!(c.food_reserves, 4.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_colony_spawns_ant() {
        let mut h = Harness::new(9, 9);
        h.params.thresholds.colony_spawn_cost = 5.0;
        let colony = lifecycle::new_colony(4, 4, &mut h.rng);
        h.add(colony);
        let food = lifecycle::new_nutrient(4, 5, 6.0, &h.params, &mut h.rng);
        h.add(food);

        let (events, _) = h.run(1, run);
        let ants = h
            .grid
            .actors()
            .filter_map(Actor::as_insect)
            .filter(|i| i.species == InsectSpecies::Ant)
            .count();
        assert_eq!(ants, 1);
        assert!(events[0].message.ends_with("produced an ant"));
    }

    #[test]
    fn test_boxed_in_hive_warns_once() {
        let mut h = Harness::new(1, 1);
        h.params.thresholds.hive_spawn_cost = 1.0;
        let mut hive = lifecycle::new_hive(0, 0, &mut h.rng);
        if let Actor::Hive(hv) = &mut hive {
            hv.honey = 10.0;
        }
        let hive = h.add(hive);

        let mut warnings = 0;
        for tick in 1..=5 {
            let (events, _) = h.run(tick, run);
            warnings += events.len();
        }
        assert_eq!(warnings, 1);
        assert_eq!(h.totals.spawns_rejected, 1);
        match h.grid.get(&hive) {
            Some(Actor::Hive(hv)) => {
                assert!(hv.blocked);
                assert_eq!(hv.spawned, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
