//! Birds hunt insects and eagles hunt birds.

use super::movement::{chebyshev, step_toward};
use super::TickContext;
use crate::lifecycle;
use meadow_data::{Actor, ActorId, ActorKind, EggContents, Predator};

/// Kill range: any cell within Chebyshev distance 1.
const STRIKE_RADIUS: f64 = std::f64::consts::SQRT_2;

#[derive(Debug, Clone, Copy)]
struct Hunter {
    kind: ActorKind,
    prey: ActorKind,
    breeds: bool,
}

const HUNTERS: [Hunter; 2] = [
    Hunter {
        kind: ActorKind::Bird,
        prey: ActorKind::Insect,
        breeds: true,
    },
    Hunter {
        kind: ActorKind::Eagle,
        prey: ActorKind::Bird,
        breeds: false,
    },
];

pub fn run(ctx: &mut TickContext<'_>) {
    for hunter in HUNTERS {
        hunt(ctx, hunter);
    }
}

fn unwrap_predator(actor: Actor) -> Option<Predator> {
    match actor {
        Actor::Bird(p) | Actor::Eagle(p) => Some(p),
        _ => None,
    }
}

fn wrap_predator(kind: ActorKind, predator: Predator) -> Actor {
    if kind == ActorKind::Eagle {
        Actor::Eagle(predator)
    } else {
        Actor::Bird(predator)
    }
}

fn hunt(ctx: &mut TickContext<'_>, hunter: Hunter) {
    let params = ctx.params;
    let fauna = &params.fauna;
    let vision = f64::from(match hunter.kind {
        ActorKind::Eagle => fauna.eagle_vision,
        _ => fauna.bird_vision,
    });
    let prey_index = ctx.grid.spatial_index(|a| a.kind() == hunter.prey);

    for id in ctx.grid.ids_of(hunter.kind) {
        let Some(mut predator) = ctx.grid.get(&id).cloned().and_then(unwrap_predator) else {
            continue;
        };
        predator.reproduction_cooldown = predator.reproduction_cooldown.saturating_sub(1);
        predator.stamina -= fauna.predator_hunger;

        let here = (predator.x, predator.y);
        let (px, py) = (f64::from(predator.x), f64::from(predator.y));
        let grid = &*ctx.grid;
        let adjacent = prey_index
            .nearest(px, py, STRIKE_RADIUS, |pid| {
                grid.get(pid)
                    .is_some_and(|prey| chebyshev(here, prey.position()) <= 1)
            })
            .map(|p| p.data.clone());

        if let Some(prey_id) = adjacent {
            strike(ctx, hunter, &mut predator, &prey_id);
        } else {
            let target = prey_index
                .nearest(px, py, vision, |pid| grid.contains(pid))
                .map(|p| (p.x as u16, p.y as u16));
            if let Some(target) = target {
                let (nx, ny) = step_toward(here, target);
                predator.x = nx;
                predator.y = ny;
            }
        }

        if hunter.breeds && predator.reproduction_cooldown == 0 {
            breed(ctx, hunter, &mut predator);
        }

        if predator.stamina <= 0.0 {
            predator.stamina = 0.0;
            predator.health -= fauna.predator_starvation_damage;
        }

        let starved = predator.health <= 0.0;
        ctx.store(wrap_predator(hunter.kind, predator));
        if starved {
            ctx.kill(&id, true);
            ctx.info(format!("{} starved", id), Some(&id));
        }
    }
}

fn strike(ctx: &mut TickContext<'_>, hunter: Hunter, predator: &mut Predator, prey_id: &ActorId) {
    if ctx.kill(prey_id, true).is_none() {
        return;
    }
    predator.stamina = predator.max_stamina;
    predator.kills += 1;
    match hunter.kind {
        ActorKind::Eagle => ctx.totals.eagle_kills += 1,
        _ => ctx.totals.bird_kills += 1,
    }
    ctx.info(format!("{} caught {}", predator.id, prey_id), Some(&predator.id));
}

fn breed(ctx: &mut TickContext<'_>, hunter: Hunter, predator: &mut Predator) {
    let partner = ctx
        .grid
        .actors_at(predator.x, predator.y)
        .filter(|a| a.kind() == hunter.kind && a.id() != &predator.id)
        .cloned()
        .filter_map(unwrap_predator)
        .find(|p| p.reproduction_cooldown == 0);
    let Some(mut partner) = partner else {
        return;
    };

    let Some((ex, ey)) = ctx.random_free_adjacent(predator.x, predator.y) else {
        ctx.reject_spawn(predator.x, predator.y, &predator.id);
        return;
    };
    let egg = lifecycle::new_egg(ex, ey, EggContents::Bird, ctx.params, ctx.rng);
    if !ctx.spawn(egg) {
        return;
    }

    let cooldown = ctx.params.reproduction.bird_cooldown;
    predator.reproduction_cooldown = cooldown;
    partner.reproduction_cooldown = cooldown;
    ctx.store(wrap_predator(hunter.kind, partner));
    ctx.totals.eggs_laid += 1;
    ctx.info(format!("{} laid an egg", predator.id), Some(&predator.id));
}

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use super::*;
    use meadow_data::InsectSpecies;

    fn insect(h: &mut Harness, x: u16, y: u16) -> ActorId {
        let actor =
            lifecycle::new_insect(x, y, InsectSpecies::Beetle, vec![1.0; 3], &h.params, &mut h.rng);
        h.add(actor)
    }

    fn bird(h: &mut Harness, x: u16, y: u16) -> ActorId {
        let actor = lifecycle::new_bird(x, y, &h.params, &mut h.rng);
        h.add(actor)
    }

    #[test]
    fn test_bird_steps_toward_nearest_insect() {
        let mut h = Harness::new(15, 15);
        let b = bird(&mut h, 5, 5);
        insect(&mut h, 14, 9);
        insect(&mut h, 7, 7);
        h.run(1, run);
        assert_eq!(h.grid.get(&b).unwrap().position(), (6, 6));
        assert_eq!(h.grid.count(ActorKind::Insect), 2);
    }

    #[test]
    fn test_bird_kills_adjacent_insect() {
        let mut h = Harness::new(15, 15);
        h.params.thresholds.corpse_chance = 0.0;
        let b = bird(&mut h, 5, 5);
        let prey = insect(&mut h, 6, 6);

        let (events, _) = h.run(1, run);
        assert!(!h.grid.contains(&prey));
        assert!(h.grid.has_kind_at(6, 6, ActorKind::Nutrient));
        assert_eq!(h.grid.get(&b).unwrap().position(), (5, 5));
        assert_eq!(h.totals.bird_kills, 1);
        assert_eq!(h.totals.kills(), 1);
        assert!(events.iter().any(|e| e.message.contains("caught")));
    }

    #[test]
    fn test_eagle_hunts_bird_moved_this_tick() {
        let mut h = Harness::new(15, 15);
        let b = bird(&mut h, 3, 3);
        insect(&mut h, 5, 5);
        let eagle = lifecycle::new_eagle(0, 0, &h.params, &mut h.rng);
        h.add(eagle);

        h.run(1, run);
        // The bird moved to (4,4) first; the eagle at (0,0) is not adjacent.
        assert!(h.grid.contains(&b));
        assert_eq!(h.totals.eagle_kills, 0);

        h.run(2, run);
        // Bird kills the insect from (4,4); eagle closes in.
        assert_eq!(h.totals.bird_kills, 1);
    }

    #[test]
    fn test_starving_bird_dies() {
        let mut h = Harness::new(6, 6);
        let b = bird(&mut h, 2, 2);
        if let Some(Actor::Bird(mut p)) = h.grid.get(&b).cloned() {
            p.stamina = 0.0;
            p.health = 0.5;
            h.grid.update(Actor::Bird(p)).unwrap();
        }
        h.run(1, run);
        assert!(!h.grid.contains(&b));
        assert_eq!(h.totals.deaths, 1);
    }

    #[test]
    fn test_colocated_birds_lay_egg() {
        let mut h = Harness::new(6, 6);
        let a = bird(&mut h, 2, 2);
        let b = bird(&mut h, 2, 2);
        for id in [&a, &b] {
            if let Some(Actor::Bird(mut p)) = h.grid.get(id).cloned() {
                p.reproduction_cooldown = 0;
                h.grid.update(Actor::Bird(p)).unwrap();
            }
        }
        h.run(1, run);
        assert_eq!(h.grid.count(ActorKind::Egg), 1);
    }
}
