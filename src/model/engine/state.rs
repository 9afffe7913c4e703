use super::{seeded_rng, Engine};
use meadow_core::error::{Result, SimError};
use meadow_core::grid::Grid;
use meadow_core::snapshot::SavedState;
use meadow_data::{Actor, ActorId, EventLevel};
use std::collections::BTreeSet;
use std::time::Duration;

impl Engine {
    /// Serializable copy of the current world. Genomes travel beside the
    /// actors; images are left out.
    #[must_use]
    pub fn get_state_for_save(&self) -> SavedState {
        SavedState::capture(&self.params, self.tick, &self.grid, &self.totals, &self.env)
    }

    /// Replaces the world with a snapshot and redraws flower images through
    /// the genetics capability. Outstanding requests are dropped.
    ///
    /// # Errors
    /// `UnsupportedVersion`, `LoadStateMismatch` when the saved grid does not
    /// match the configured dimensions, `InvalidParams` when the saved params
    /// fail validation.
    pub async fn load_state(&mut self, saved: SavedState) -> Result<()> {
        self.ensure_live()?;
        saved.check_version()?;
        let (width, height) = (self.params.world.width, self.params.world.height);
        if saved.width != width || saved.height != height {
            return Err(SimError::LoadStateMismatch {
                expected_width: width,
                expected_height: height,
                found_width: saved.width,
                found_height: saved.height,
            });
        }
        saved
            .params
            .validate()
            .map_err(|e| SimError::invalid_params(e.to_string()))?;
        if saved.params_fingerprint != saved.params.fingerprint() {
            tracing::warn!("Snapshot params fingerprint does not match its params");
        }

        let mut grid = Grid::new(width, height);
        for actor in saved.restored_actors() {
            grid.insert(actor)?;
        }

        self.cancel_pending();
        self.params = saved.params;
        self.grid = grid;
        self.tick = saved.tick;
        self.totals = saved.totals;
        self.env = saved.environment;
        self.rng = seeded_rng(self.params.world.seed.map(|s| s.wrapping_add(saved.tick)));
        self.images.clear();
        self.grid_stale = false;
        self.needs_reset = true;

        self.redraw_images().await;
        tracing::info!(
            tick = self.tick,
            actors = self.grid.len(),
            fingerprint = %self.params.fingerprint(),
            "Snapshot loaded"
        );
        self.push_event(
            EventLevel::Info,
            format!("Loaded snapshot at tick {}", self.tick),
            None,
        );
        Ok(())
    }

    async fn redraw_images(&mut self) {
        let genomes: BTreeSet<String> = self
            .grid
            .actors()
            .filter_map(Actor::as_flower)
            .map(|f| f.genome.clone())
            .collect();
        let timeout = Duration::from_millis(self.params.genetics.timeout_ms);
        for genome in genomes {
            match tokio::time::timeout(timeout, self.capability.draw(&genome)).await {
                Ok(Ok(image)) => self.images.insert(genome, image),
                Ok(Err(e)) => tracing::warn!(error = %e, "Flower redraw failed"),
                Err(_) => tracing::warn!("Flower redraw timed out"),
            }
        }
    }

    /// Places a scripted actor on the grid.
    pub fn place_actor(&mut self, actor: Actor) -> Result<ActorId> {
        self.ensure_live()?;
        let id = actor.id().clone();
        self.grid.insert(actor)?;
        Ok(id)
    }

    /// Ids starting with `prefix`, lexicographically ordered. Empty for an
    /// empty prefix.
    #[must_use]
    pub fn search_actors(&self, prefix: &str) -> Vec<ActorId> {
        self.grid.search(prefix)
    }

    #[must_use]
    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.grid.get(id)
    }
}
