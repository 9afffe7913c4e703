//! Tick timing and structured logging setup.

use std::time::{Duration, Instant};

/// How often `record_tick` emits an info line.
const LOG_EVERY: u64 = 100;

/// Per-engine tick statistics.
pub struct Metrics {
    ticks: u64,
    population: usize,
    slowest: Duration,
    total: Duration,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticks: 0,
            population: 0,
            slowest: Duration::ZERO,
            total: Duration::ZERO,
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick with its duration.
    pub fn record_tick(&mut self, tick: u64, duration: Duration, population: usize) {
        self.ticks += 1;
        self.population = population;
        self.total += duration;
        self.slowest = self.slowest.max(duration);

        if tick % LOG_EVERY == 0 {
            tracing::info!(
                tick,
                population,
                duration_us = duration.as_micros() as u64,
                slowest_us = self.slowest.as_micros() as u64,
                "Simulation tick"
            );
        }
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.population
    }

    #[must_use]
    pub fn average_tick(&self) -> Duration {
        if self.ticks == 0 {
            Duration::ZERO
        } else {
            self.total / self.ticks as u32
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
