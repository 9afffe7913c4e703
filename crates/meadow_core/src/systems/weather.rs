//! Climate drift, weather effects and herbicide planes.

use super::environment::drift;
use super::flora::wilt;
use super::TickContext;
use crate::lifecycle;
use meadow_data::{Actor, ActorKind, EventLevel, FlowerEffect, WeatherKind};
use rand::seq::SliceRandom;
use rand::Rng;

pub fn run(ctx: &mut TickContext<'_>) {
    drift(ctx);
    match ctx.env.weather.map(|w| w.kind) {
        Some(WeatherKind::Frost) => frost(ctx),
        Some(WeatherKind::HeatWave) => heat_wave(ctx),
        Some(WeatherKind::Storm) => storm(ctx),
        _ => {}
    }
    planes(ctx);
    smoke(ctx);
}

fn frost(ctx: &mut TickContext<'_>) {
    let damage = ctx.params.fauna.frost_damage;
    for id in ctx.grid.ids_of(ActorKind::Insect) {
        let Some(Actor::Insect(mut insect)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        insect.health -= damage / insect.hardiness();
        let dead = insect.health <= 0.0;
        ctx.store(Actor::Insect(insect));
        if dead {
            ctx.kill(&id, true);
            ctx.info(format!("{} froze", id), Some(&id));
        }
    }
}

fn heat_wave(ctx: &mut TickContext<'_>) {
    let drain = ctx.params.flora.metabolic_cost;
    for id in ctx.grid.ids_of(ActorKind::Flower) {
        if let Some(Actor::Flower(mut flower)) = ctx.grid.get(&id).cloned() {
            flower.stamina = (flower.stamina - drain).max(0.0);
            ctx.store(Actor::Flower(flower));
        }
    }
}

/// Gusts push flying insects onto a random neighbouring cell.
fn storm(ctx: &mut TickContext<'_>) {
    let chance = ctx.params.fauna.storm_push_chance;
    for id in ctx.grid.ids_of(ActorKind::Insect) {
        let Some(Actor::Insect(insect)) = ctx.grid.get(&id) else {
            continue;
        };
        if !insect.species.flies() {
            continue;
        }
        let (x, y) = (insect.x, insect.y);
        if ctx.rng.gen::<f32>() >= chance {
            continue;
        }
        let cells = ctx.grid.neighbors(x, y);
        if let Some(&(nx, ny)) = cells.choose(ctx.rng) {
            if let Err(e) = ctx.grid.move_actor(&id, nx, ny) {
                tracing::warn!(error = %e, "Storm push failed");
            }
        }
    }
}

/// Planes drop smoke on their cell and fly one cell toward +x; a plane whose
/// next step leaves the grid is removed. A new plane may enter when flowers
/// are too dense and none is flying.
fn planes(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    let width = ctx.grid.width();
    let flying = ctx.grid.ids_of(ActorKind::HerbicidePlane);

    for id in &flying {
        let Some((x, y)) = ctx.grid.get(id).map(Actor::position) else {
            continue;
        };
        let smoke = lifecycle::new_smoke(x, y, params, ctx.rng);
        ctx.spawn(smoke);
        if x + 1 >= width {
            ctx.grid.remove(id);
            ctx.info(format!("{} left the meadow", id), Some(id));
        } else if let Err(e) = ctx.grid.move_actor(id, x + 1, y) {
            tracing::warn!(error = %e, "Plane move failed");
        }
    }

    if !flying.is_empty() {
        return;
    }
    let cells = f32::from(width) * f32::from(ctx.grid.height());
    let density = ctx.grid.count(ActorKind::Flower) as f32 / cells;
    if density > params.thresholds.herbicide_trigger_density
        && ctx.rng.gen::<f32>() < params.thresholds.herbicide_chance
    {
        let row = ctx.rng.gen_range(0..ctx.grid.height());
        let plane = lifecycle::new_plane(0, row, ctx.rng);
        let plane_id = plane.id().clone();
        if ctx.spawn(plane) {
            ctx.event(
                EventLevel::Warning,
                format!("Herbicide plane {} entered row {}", plane_id, row),
                Some(plane_id),
            );
        }
    }
}

/// Smoke poisons flowers and insects sharing its cell.
fn smoke(ctx: &mut TickContext<'_>) {
    for smoke_id in ctx.grid.ids_of(ActorKind::HerbicideSmoke) {
        let Some(Actor::HerbicideSmoke(cloud)) = ctx.grid.get(&smoke_id).cloned() else {
            continue;
        };
        let victims: Vec<Actor> = ctx
            .grid
            .actors_at(cloud.x, cloud.y)
            .filter(|a| matches!(a.kind(), ActorKind::Flower | ActorKind::Insect))
            .cloned()
            .collect();

        for victim in victims {
            match victim {
                Actor::Flower(mut flower) => {
                    let damage = if flower.stats.has_effect(FlowerEffect::Hardy) {
                        cloud.potency / 2.0
                    } else {
                        cloud.potency
                    };
                    flower.health -= damage;
                    let id = flower.id.clone();
                    let dead = flower.health <= 0.0;
                    ctx.store(Actor::Flower(flower));
                    if dead {
                        wilt(ctx, &id);
                    }
                }
                Actor::Insect(mut insect) => {
                    insect.health -= cloud.potency / insect.hardiness();
                    let id = insect.id.clone();
                    let dead = insect.health <= 0.0;
                    ctx.store(Actor::Insect(insect));
                    if dead {
                        ctx.kill(&id, true);
                        ctx.info(format!("{} was poisoned", id), Some(&id));
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use super::*;
    use meadow_data::{FlowerStats, InsectSpecies, Sex, WeatherEvent};

    fn flower(h: &mut Harness, x: u16, y: u16, effects: Vec<FlowerEffect>) -> meadow_data::ActorId {
        let stats = FlowerStats {
            max_health: 10.0,
            max_stamina: 10.0,
            maturation_period: 50,
            sex: Sex::Male,
            toxicity_rate: 0.0,
            effects,
        };
        let actor = lifecycle::new_flower(x, y, "ACGT".into(), stats, &h.params, &mut h.rng);
        h.add(actor)
    }

    #[test]
    fn test_plane_enters_when_flowers_are_dense() {
        let mut h = Harness::new(2, 2);
        h.params.thresholds.herbicide_chance = 1.0;
        h.params.thresholds.herbicide_trigger_density = 0.5;
        for (x, y) in [(0, 0), (1, 0), (0, 1)] {
            flower(&mut h, x, y, Vec::new());
        }
        let (events, _) = h.run(1, run);
        assert_eq!(h.grid.count(ActorKind::HerbicidePlane), 1);
        assert!(events.iter().any(|e| e.level == EventLevel::Warning));

        // A second plane never joins one already flying.
        h.run(2, run);
        assert!(h.grid.count(ActorKind::HerbicidePlane) <= 1);
    }

    #[test]
    fn test_plane_crosses_and_leaves() {
        let mut h = Harness::new(3, 3);
        let plane = lifecycle::new_plane(0, 1, &mut h.rng);
        let plane = h.add(plane);

        h.run(1, run);
        assert_eq!(h.grid.get(&plane).unwrap().position(), (1, 1));
        assert!(h.grid.has_kind_at(0, 1, ActorKind::HerbicideSmoke));

        h.run(2, run);
        h.run(3, run);
        assert!(!h.grid.contains(&plane));
        assert!(h.grid.has_kind_at(2, 1, ActorKind::HerbicideSmoke));
    }

    #[test]
    fn test_smoke_is_gentler_on_hardy_flowers() {
        let mut h = Harness::new(3, 3);
        h.params.thresholds.smoke_potency = 4.0;
        let plain = flower(&mut h, 0, 0, Vec::new());
        let hardy = flower(&mut h, 1, 0, vec![FlowerEffect::Hardy]);
        for x in 0..2 {
            let cloud = lifecycle::new_smoke(x, 0, &h.params, &mut h.rng);
            h.add(cloud);
        }
        h.run(1, run);
        let health = |id| h.grid.get(id).and_then(Actor::as_flower).unwrap().health;
        assert_eq!(health(&plain), 6.0);
        assert_eq!(health(&hardy), 8.0);
    }

    #[test]
    fn test_frost_hurts_insects() {
        let mut h = Harness::new(3, 3);
        h.env.weather = Some(WeatherEvent {
            kind: WeatherKind::Frost,
            remaining: 5,
        });
        let bug = lifecycle::new_insect(1, 1, InsectSpecies::Ant, vec![1.0; 3], &h.params, &mut h.rng);
        let bug = h.add(bug);
        h.run(1, run);
        let insect = h.grid.get(&bug).and_then(Actor::as_insect).unwrap();
        assert!(insect.health < insect.max_health);
    }
}
