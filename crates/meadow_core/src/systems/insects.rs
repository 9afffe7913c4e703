//! Insects breed, forage, drink nectar and carry pollen. Cockroaches clean up
//! corpses.

use super::movement::{distance, step_toward};
use super::TickContext;
use crate::genetics::GeneticsOp;
use crate::lifecycle;
use meadow_data::{
    Actor, ActorId, ActorKind, EggContents, Flower, FlowerEffect, Insect, Pollen,
};

/// Fragrant flowers are visible this much further away.
const FRAGRANCE_RANGE: f32 = 1.5;
/// Health a cockroach regains per corpse.
const CORPSE_MEAL: f32 = 5.0;

pub fn run(ctx: &mut TickContext<'_>) {
    let flowers = ctx
        .grid
        .spatial_index(|a| a.kind() == ActorKind::Flower);

    for id in ctx.grid.ids_of(ActorKind::Insect) {
        let Some(Actor::Insect(mut insect)) = ctx.grid.get(&id).cloned() else {
            continue;
        };

        insect.age += 1;
        insect.reproduction_cooldown = insect.reproduction_cooldown.saturating_sub(1);

        if insect.reproduction_cooldown == 0 {
            breed(ctx, &mut insect);
        }

        forage(ctx, &mut insect, &flowers);

        if let Some(Actor::Flower(flower)) = ctx
            .grid
            .first_at(insect.x, insect.y, ActorKind::Flower)
            .cloned()
        {
            visit_flower(ctx, &mut insect, flower);
        }

        let fauna = &ctx.params.fauna;
        if insect.stamina <= 0.0 {
            insect.stamina = 0.0;
            insect.health -= fauna.insect_starvation_damage;
        }

        let starved = insect.health <= 0.0;
        let aged = insect.age > insect.max_age;
        ctx.store(Actor::Insect(insect));
        if starved || aged {
            ctx.kill(&id, true);
            let cause = if aged { "old age" } else { "exhaustion" };
            ctx.info(format!("{} died of {}", id, cause), Some(&id));
        }
    }

    cockroaches(ctx);
}

fn breed(ctx: &mut TickContext<'_>, insect: &mut Insect) {
    let partner = ctx
        .grid
        .actors_at(insect.x, insect.y)
        .filter_map(Actor::as_insect)
        .find(|other| {
            other.id != insect.id
                && other.species == insect.species
                && other.reproduction_cooldown == 0
        })
        .cloned();
    let Some(mut partner) = partner else {
        return;
    };

    let Some((ex, ey)) = ctx.random_free_adjacent(insect.x, insect.y) else {
        ctx.reject_spawn(insect.x, insect.y, &insect.id);
        return;
    };

    let genome = lifecycle::inherit_insect_genome(&insect.genome, &partner.genome, ctx.params, ctx.rng);
    let contents = EggContents::Insect {
        species: insect.species,
        genome,
    };
    let egg = lifecycle::new_egg(ex, ey, contents, ctx.params, ctx.rng);
    if !ctx.spawn(egg) {
        return;
    }

    let cooldown = ctx.params.reproduction.insect_cooldown;
    insect.reproduction_cooldown = cooldown;
    partner.reproduction_cooldown = cooldown;
    ctx.store(Actor::Insect(partner));
    ctx.totals.eggs_laid += 1;
    ctx.info(format!("{} laid an egg", insect.id), Some(&insect.id));
}

/// Rests when tired, otherwise takes one step toward the nearest visible
/// flower. With nothing in sight the insect stays put.
fn forage(
    ctx: &mut TickContext<'_>,
    insect: &mut Insect,
    flowers: &crate::quadtree::QuadTree<ActorId>,
) {
    let fauna = &ctx.params.fauna;
    if insect.stamina < insect.max_stamina * fauna.insect_rest_fraction {
        insect.stamina = (insect.stamina + fauna.insect_rest_regen).min(insect.max_stamina);
        return;
    }

    let vision = insect.vision(fauna.insect_vision);
    let here = (insect.x, insect.y);
    let grid = &*ctx.grid;
    let target = flowers
        .nearest(
            f64::from(insect.x),
            f64::from(insect.y),
            f64::from(vision * FRAGRANCE_RANGE),
            |fid| match grid.get(fid) {
                Some(Actor::Flower(f)) => {
                    distance(here, (f.x, f.y)) <= f64::from(vision)
                        || f.stats.has_effect(FlowerEffect::Fragrant)
                }
                _ => false,
            },
        )
        .map(|p| (p.x as u16, p.y as u16));

    if let Some(target) = target {
        let next = step_toward(here, target);
        if next != here {
            insect.x = next.0;
            insect.y = next.1;
            insect.stamina -= fauna.insect_move_cost * insect.metabolism();
        }
    }
}

/// Drinks nectar and, for pollinators, cross-pollinates with carried pollen
/// before picking up this flower's.
fn visit_flower(ctx: &mut TickContext<'_>, insect: &mut Insect, mut flower: Flower) {
    let fauna = &ctx.params.fauna;
    let sip = fauna.nectar_sip.min(flower.nectar);
    if sip > 0.0 {
        flower.nectar -= sip;
        insect.stamina = (insect.stamina + sip * 2.0).min(insect.max_stamina);
        if flower.stats.has_effect(FlowerEffect::Healing) {
            insect.health = (insect.health + sip).min(insect.max_health);
        }
        let mut toxicity = flower.stats.toxicity_rate * fauna.toxicity_scale / insect.hardiness();
        if flower.stats.has_effect(FlowerEffect::Repellent) {
            toxicity *= 2.0;
        }
        insect.health -= toxicity;
    }

    if insect.species.pollinates() {
        if let Some(pollen) = insect.pollen.take() {
            if pollen.source != flower.id {
                pollinate(ctx, insect, &pollen, &mut flower);
            }
        }
        insect.pollen = Some(Pollen {
            source: flower.id.clone(),
            genome: flower.genome.clone(),
        });
    }

    ctx.store(Actor::Flower(flower));
}

fn pollinate(ctx: &mut TickContext<'_>, insect: &Insect, pollen: &Pollen, flower: &mut Flower) {
    let source = match ctx.grid.get(&pollen.source) {
        Some(Actor::Flower(source)) if source.reproduction_cooldown == 0 => source.clone(),
        _ => return,
    };
    if flower.reproduction_cooldown != 0 || source.stats.sex == flower.stats.sex {
        return;
    }

    let Some((x, y)) = ctx.random_free_adjacent(flower.x, flower.y) else {
        ctx.reject_spawn(flower.x, flower.y, &flower.id);
        return;
    };

    let op = GeneticsOp::Reproduce {
        parent1: pollen.genome.clone(),
        parent2: flower.genome.clone(),
    };
    ctx.request_flower(op, x, y, Some(flower.id.clone()));

    let cooldown = ctx.params.reproduction.flower_cooldown;
    flower.reproduction_cooldown = cooldown;
    let mut source = source;
    source.reproduction_cooldown = cooldown;
    ctx.store(Actor::Flower(source));
    ctx.totals.pollinations += 1;
    ctx.info(
        format!("{} pollinated {} with {}", insect.id, flower.id, pollen.source),
        Some(&insect.id),
    );
}

fn cockroaches(ctx: &mut TickContext<'_>) {
    let corpses = ctx
        .grid
        .spatial_index(|a| a.kind() == ActorKind::Corpse);
    let vision = f64::from(ctx.params.fauna.cockroach_vision);

    for id in ctx.grid.ids_of(ActorKind::Cockroach) {
        let Some(Actor::Cockroach(mut roach)) = ctx.grid.get(&id).cloned() else {
            continue;
        };
        roach.age += 1;

        let here = (roach.x, roach.y);
        let grid = &*ctx.grid;
        let target = corpses
            .nearest(f64::from(roach.x), f64::from(roach.y), vision, |cid| {
                grid.contains(cid)
            })
            .map(|p| (p.x as u16, p.y as u16));
        if let Some(target) = target {
            let (nx, ny) = step_toward(here, target);
            roach.x = nx;
            roach.y = ny;
        }

        if let Some(corpse) = ctx.grid.first_at(roach.x, roach.y, ActorKind::Corpse) {
            let corpse_id = corpse.id().clone();
            ctx.grid.remove(&corpse_id);
            ctx.deposit_nutrient(roach.x, roach.y, ctx.params.thresholds.nutrient_value);
            roach.health = (roach.health + CORPSE_MEAL).min(roach.max_health);
        }

        let aged = roach.age > roach.max_age;
        ctx.store(Actor::Cockroach(roach));
        if aged {
            ctx.kill(&id, false);
            ctx.info(format!("{} died of old age", id), Some(&id));
        }
    }
}
