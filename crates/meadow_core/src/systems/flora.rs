//! Flowers age, metabolise against the climate, feed on nutrients and wilt.

use super::TickContext;
use crate::lifecycle;
use meadow_data::{Actor, ActorId, ActorKind, Flower};

pub fn run(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    let flora = &params.flora;

    for id in ctx.grid.ids_of(ActorKind::Flower) {
        let Some(Actor::Flower(mut flower)) = ctx.grid.get(&id).cloned() else {
            continue;
        };

        flower.age += 1;
        flower.reproduction_cooldown = flower.reproduction_cooldown.saturating_sub(1);

        let temperature_stress =
            (ctx.env.temperature - flora.comfortable_temperature).abs() / 10.0;
        let humidity_stress = (ctx.env.humidity - flora.comfortable_humidity).abs() * 2.0;
        let cost = flora.metabolic_cost * (1.0 + temperature_stress + humidity_stress);
        flower.stamina = (flower.stamina - cost + flora.stamina_regen * ctx.env.humidity)
            .clamp(0.0, flower.stats.max_stamina);
        flower.nectar = (flower.nectar + flora.nectar_regen).min(flora.max_nectar);

        if let Some(Actor::Nutrient(nutrient)) = ctx
            .grid
            .first_at(flower.x, flower.y, ActorKind::Nutrient)
            .cloned()
        {
            ctx.grid.remove(&nutrient.id);
            flower.health = (flower.health + nutrient.value).min(flower.stats.max_health);
        }

        if flower.stamina <= 0.0 {
            flower.health -= flora.starvation_damage;
        }

        let lifespan = flora.lifespan_periods * flower.stats.maturation_period.max(1);
        if flower.health <= 0.0 || flower.age > lifespan {
            ctx.store(Actor::Flower(flower));
            wilt(ctx, &id);
            continue;
        }
        ctx.store(Actor::Flower(flower));
    }
}

/// Removes a dead flower. Mature flowers leave a seed carrying their genome.
pub(crate) fn wilt(ctx: &mut TickContext<'_>, id: &ActorId) {
    let Some(Actor::Flower(flower)) = ctx.kill(id, false) else {
        return;
    };
    if flower.is_mature() {
        drop_seed(ctx, &flower);
    }
    ctx.info(format!("{} wilted", flower.id), Some(&flower.id));
}

fn drop_seed(ctx: &mut TickContext<'_>, flower: &Flower) {
    let seed = lifecycle::new_seed(flower.x, flower.y, flower.genome.clone(), ctx.params, ctx.rng);
    ctx.spawn(seed);
}
