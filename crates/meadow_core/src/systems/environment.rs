//! Climate drift: a seasonal sinusoid plus occasional weather events.

use super::TickContext;
use crate::config::EnvironmentParams;
use meadow_data::{EnvironmentState, EventLevel, Season, WeatherEvent, WeatherKind};
use rand::Rng;
use std::f64::consts::TAU;

/// Advances the weather event, then recomputes temperature, humidity and
/// season for the current tick.
pub fn drift(ctx: &mut TickContext<'_>) {
    let params = ctx.params;
    let p = &params.environment;

    match ctx.env.weather {
        Some(mut event) => {
            event.remaining = event.remaining.saturating_sub(1);
            if event.remaining == 0 {
                ctx.env.weather = None;
                ctx.event(
                    EventLevel::Info,
                    format!("The {} has ended", event.kind.label()),
                    None,
                );
            } else {
                ctx.env.weather = Some(event);
            }
        }
        None => {
            if ctx.rng.gen::<f32>() < p.weather_event_chance {
                let kind = WeatherKind::ALL[ctx.rng.gen_range(0..WeatherKind::ALL.len())];
                let remaining = ctx
                    .rng
                    .gen_range(p.weather_min_duration..=p.weather_max_duration);
                ctx.env.weather = Some(WeatherEvent { kind, remaining });
                let level = match kind {
                    WeatherKind::Frost | WeatherKind::Storm | WeatherKind::HeatWave => {
                        EventLevel::Warning
                    }
                    WeatherKind::Rain | WeatherKind::Drought => EventLevel::Info,
                };
                ctx.event(
                    level,
                    format!("A {} has begun ({} ticks)", kind.label(), remaining),
                    None,
                );
            }
        }
    }

    let noise = if p.noise > 0.0 {
        ctx.rng.gen_range(-p.noise..=p.noise)
    } else {
        0.0
    };
    apply_climate(ctx.env, p, ctx.tick, noise);
}

/// Sets temperature, humidity and season from the seasonal curve, the active
/// weather event and a noise sample.
pub fn apply_climate(env: &mut EnvironmentState, p: &EnvironmentParams, tick: u64, noise: f32) {
    let phase = (tick % p.season_length) as f64 / p.season_length as f64;
    let angle = phase * TAU;
    let (t_offset, h_offset) = env.weather.map_or((0.0, 0.0), |w| {
        (w.kind.temperature_offset(), w.kind.humidity_offset())
    });

    env.temperature =
        p.base_temperature + p.temperature_amplitude * angle.sin() as f32 + t_offset + noise;
    env.humidity = (p.base_humidity
        + p.humidity_amplitude * angle.cos() as f32
        + h_offset
        + noise / 50.0)
        .clamp(0.0, 1.0);
    env.season = Season::from_phase(phase);
}
