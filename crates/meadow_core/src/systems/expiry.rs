//! Timers: hatching, pupation, decay and germination.

use super::TickContext;
use crate::genetics::GeneticsOp;
use crate::lifecycle;
use meadow_data::{Actor, ActorKind, EggContents};

pub fn run(ctx: &mut TickContext<'_>) {
    eggs(ctx);
    cocoons(ctx);
    corpses(ctx);
    decay(ctx);
    seeds(ctx);
}

fn eggs(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    for id in ctx.grid.ids_of(ActorKind::Egg) {
        let Some(Actor::Egg(mut egg)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        egg.hatch_timer = egg.hatch_timer.saturating_sub(1);
        if egg.hatch_timer > 0 {
            ctx.store(Actor::Egg(egg));
            continue;
        }

        ctx.grid.remove(&id);
        let young = match egg.contents {
            EggContents::Insect { species, genome } if species.metamorphoses() => {
                lifecycle::new_cocoon(egg.x, egg.y, species, genome, params, ctx.rng)
            }
            EggContents::Insect { species, genome } => {
                lifecycle::new_insect(egg.x, egg.y, species, genome, params, ctx.rng)
            }
            EggContents::Bird => lifecycle::new_bird(egg.x, egg.y, params, ctx.rng),
        };
        let young_id = young.id().clone();
        if ctx.spawn(young) {
            ctx.totals.hatchings += 1;
            ctx.info(format!("{} hatched into {}", id, young_id), Some(&young_id));
        }
    }
}

fn cocoons(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    for id in ctx.grid.ids_of(ActorKind::Cocoon) {
        let Some(Actor::Cocoon(mut cocoon)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        cocoon.timer = cocoon.timer.saturating_sub(1);
        if cocoon.timer > 0 {
            ctx.store(Actor::Cocoon(cocoon));
            continue;
        }
        ctx.grid.remove(&id);
        let adult = lifecycle::new_insect(
            cocoon.x,
            cocoon.y,
            cocoon.species,
            cocoon.genome,
            params,
            ctx.rng,
        );
        let adult_id = adult.id().clone();
        if ctx.spawn(adult) {
            ctx.info(format!("{} emerged from {}", adult_id, id), Some(&adult_id));
        }
    }
}

fn corpses(ctx: &mut TickContext<'_>) {
    let value = ctx.params.thresholds.nutrient_value;
    for id in ctx.grid.ids_of(ActorKind::Corpse) {
        let Some(Actor::Corpse(mut corpse)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        corpse.decay_timer = corpse.decay_timer.saturating_sub(1);
        if corpse.decay_timer > 0 {
            ctx.store(Actor::Corpse(corpse));
            continue;
        }
        ctx.grid.remove(&id);
        ctx.deposit_nutrient(corpse.x, corpse.y, value);
    }
}

/// Nutrients and smoke simply disappear when their timer runs out.
fn decay(ctx: &mut TickContext<'_>) {
    for id in ctx.grid.ids_of(ActorKind::Nutrient) {
        if let Some(Actor::Nutrient(mut nutrient)) = ctx.grid.get(&id).cloned() {
            nutrient.decay_timer = nutrient.decay_timer.saturating_sub(1);
            if nutrient.decay_timer == 0 {
                ctx.grid.remove(&id);
            } else {
                ctx.store(Actor::Nutrient(nutrient));
            }
        }
    }
    for id in ctx.grid.ids_of(ActorKind::HerbicideSmoke) {
        if let Some(Actor::HerbicideSmoke(mut smoke)) = ctx.grid.get(&id).cloned() {
            smoke.timer = smoke.timer.saturating_sub(1);
            if smoke.timer == 0 {
                ctx.grid.remove(&id);
            } else {
                ctx.store(Actor::HerbicideSmoke(smoke));
            }
        }
    }
}

/// A ripe seed becomes a flower request once its cell has no flower and no
/// pending spawn. Otherwise it waits.
fn seeds(ctx: &mut TickContext<'_>) {
    for id in ctx.grid.ids_of(ActorKind::FlowerSeed) {
        let Some(Actor::FlowerSeed(mut seed)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        seed.germination_timer = seed.germination_timer.saturating_sub(1);
        let blocked = ctx.grid.has_kind_at(seed.x, seed.y, ActorKind::Flower)
            || ctx.grid.is_reserved(seed.x, seed.y);
        if seed.germination_timer > 0 || blocked {
            ctx.store(Actor::FlowerSeed(seed));
            continue;
        }
        ctx.grid.remove(&id);
        ctx.request_flower(
            GeneticsOp::Mutate {
                genome: seed.genome,
            },
            seed.x,
            seed.y,
            Some(id),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::harness::Harness;
    use super::*;
    use meadow_data::{FlowerStats, InsectSpecies, Sex};

    fn egg(h: &mut Harness, contents: EggContents, timer: u32) {
        let mut actor = lifecycle::new_egg(2, 2, contents, &h.params, &mut h.rng);
        if let Actor::Egg(e) = &mut actor {
            e.hatch_timer = timer;
        }
        h.add(actor);
    }

    #[test]
    fn test_egg_hatches_when_timer_runs_out() {
        let mut h = Harness::new(5, 5);
        egg(
            &mut h,
            EggContents::Insect {
                species: InsectSpecies::Bee,
                genome: vec![1.0; 3],
            },
            2,
        );
        h.run(1, run);
        assert_eq!(h.grid.count(ActorKind::Egg), 1);

        let (events, _) = h.run(2, run);
        assert_eq!(h.grid.count(ActorKind::Egg), 0);
        assert!(h.grid.has_kind_at(2, 2, ActorKind::Insect));
        assert_eq!(h.totals.hatchings, 1);
        assert!(events[0].message.contains("hatched"));
    }

    #[test]
    fn test_butterfly_egg_becomes_cocoon_then_insect() {
        let mut h = Harness::new(5, 5);
        h.params.reproduction.cocoon_ticks = 1;
        egg(
            &mut h,
            EggContents::Insect {
                species: InsectSpecies::Butterfly,
                genome: vec![1.0; 3],
            },
            1,
        );
        h.run(1, run);
        assert!(h.grid.has_kind_at(2, 2, ActorKind::Cocoon));
        h.run(2, run);
        let butterfly = h.grid.first_at(2, 2, ActorKind::Insect).and_then(Actor::as_insect);
        assert_eq!(butterfly.map(|b| b.species), Some(InsectSpecies::Butterfly));
    }

    #[test]
    fn test_bird_egg_hatches_bird() {
        let mut h = Harness::new(5, 5);
        egg(&mut h, EggContents::Bird, 1);
        h.run(1, run);
        assert_eq!(h.grid.count(ActorKind::Bird), 1);
    }

    #[test]
    fn test_corpse_decays_into_nutrient() {
        let mut h = Harness::new(5, 5);
        h.params.thresholds.corpse_decay = 1;
        let corpse = lifecycle::new_corpse(1, 1, ActorKind::Bird, &h.params, &mut h.rng);
        h.add(corpse);
        h.run(1, run);
        assert_eq!(h.grid.count(ActorKind::Corpse), 0);
        assert!(h.grid.has_kind_at(1, 1, ActorKind::Nutrient));
    }

    #[test]
    fn test_smoke_and_nutrient_expire() {
        let mut h = Harness::new(5, 5);
        h.params.thresholds.smoke_duration = 1;
        h.params.thresholds.nutrient_decay = 2;
        let smoke = lifecycle::new_smoke(0, 0, &h.params, &mut h.rng);
        h.add(smoke);
        let nutrient = lifecycle::new_nutrient(3, 3, 1.0, &h.params, &mut h.rng);
        h.add(nutrient);

        h.run(1, run);
        assert_eq!(h.grid.count(ActorKind::HerbicideSmoke), 0);
        assert_eq!(h.grid.count(ActorKind::Nutrient), 1);
        h.run(2, run);
        assert_eq!(h.grid.count(ActorKind::Nutrient), 0);
    }

    #[test]
    fn test_seed_requests_flower_on_empty_cell() {
        let mut h = Harness::new(5, 5);
        h.params.reproduction.seed_germination_ticks = 1;
        let seed = lifecycle::new_seed(3, 1, "GATTACA".into(), &h.params, &mut h.rng);
        let seed = h.add(seed);

        let (_, requests) = h.run(1, run);
        assert!(!h.grid.contains(&seed));
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].op,
            GeneticsOp::Mutate {
                genome: "GATTACA".into()
            }
        );
        assert!(h.grid.is_reserved(3, 1));
    }

    #[test]
    fn test_seed_waits_under_a_flower() {
        let mut h = Harness::new(5, 5);
        h.params.reproduction.seed_germination_ticks = 1;
        let stats = FlowerStats {
            max_health: 10.0,
            max_stamina: 10.0,
            maturation_period: 5,
            sex: Sex::Female,
            toxicity_rate: 0.0,
            effects: Vec::new(),
        };
        let flower = lifecycle::new_flower(3, 1, "ACGT".into(), stats, &h.params, &mut h.rng);
        h.add(flower);
        let seed = lifecycle::new_seed(3, 1, "ACGT".into(), &h.params, &mut h.rng);
        let seed = h.add(seed);

        let (_, requests) = h.run(1, run);
        assert!(requests.is_empty());
        assert!(h.grid.contains(&seed));
    }
}
