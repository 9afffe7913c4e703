use super::{Engine, TickOutput};
use meadow_core::error::{Result, SimError};
use meadow_core::systems::{run_tick, TickContext};
use meadow_data::{ActorDelta, ActorKind, TickSummary};
use std::time::Instant;

impl Engine {
    /// Advances the simulation by exactly one tick.
    ///
    /// Genetics responses that arrived since the last tick are applied first,
    /// then the six resolver phases run in their fixed order. Flower requests
    /// raised by the phases are queued at the end, tagged with the current
    /// climate.
    ///
    /// # Errors
    /// `Disposed` after disposal, `GridInvalidated` after a params change
    /// that needs a fresh grid.
    pub fn calculate_next_tick(&mut self) -> Result<TickOutput> {
        self.ensure_live()?;
        if self.grid_stale {
            return Err(SimError::GridInvalidated);
        }
        let started = Instant::now();
        self.drain_genetics();
        self.tick += 1;

        let (tick_events, requests) = {
            let mut ctx = TickContext::new(
                self.tick,
                &self.params,
                &mut self.grid,
                &mut self.env,
                &mut self.rng,
                &mut self.totals,
            );
            run_tick(&mut ctx);
            (ctx.events, ctx.spawn_requests)
        };

        for request in requests {
            self.submit_flower(request.op, request.x, request.y, request.origin);
        }

        let deltas = self.collect_deltas();
        let live = self
            .grid
            .actors()
            .filter(|a| a.kind() == ActorKind::Flower)
            .filter_map(|a| a.heavy_genome());
        let dropped = self.images.collect_garbage(live);
        if dropped > 0 {
            tracing::trace!(dropped, "Image cache trimmed");
        }

        let mut events = self.take_events();
        events.extend(tick_events);
        let summary = self.summary();
        self.metrics
            .record_tick(self.tick, started.elapsed(), self.grid.len());

        Ok(TickOutput {
            tick: self.tick,
            deltas,
            events,
            summary,
        })
    }

    /// Deltas for changes made outside a tick, such as flowers created from
    /// late genetics responses while paused.
    pub fn flush_deltas(&mut self) -> Vec<ActorDelta> {
        self.collect_deltas()
    }

    fn collect_deltas(&mut self) -> Vec<ActorDelta> {
        if self.needs_reset {
            self.needs_reset = false;
            self.deltas.reset(&self.grid)
        } else {
            self.deltas.diff(&self.grid)
        }
    }

    #[must_use]
    pub fn summary(&self) -> TickSummary {
        TickSummary {
            tick: self.tick,
            counts: self.grid.counts(),
            totals: self.totals.clone(),
            environment: self.env.clone(),
            pending_flower_requests: self.pending.len(),
        }
    }
}
