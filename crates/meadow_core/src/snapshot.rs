//! Serializable engine state.
//!
//! Heavy genomes are lifted out of the actor list into `genomes`, keyed by
//! actor id, and the actors keep an empty placeholder. Images are never
//! stored; they are redrawn from the genomes on load.

use crate::config::SimulationParams;
use crate::error::{Result, SimError};
use crate::grid::Grid;
use meadow_data::{Actor, ActorId, ActorKind, CumulativeTotals, EnvironmentState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub version: u32,
    /// RFC 3339.
    pub saved_at: String,
    pub params_fingerprint: String,
    pub params: SimulationParams,
    pub tick: u64,
    pub width: u16,
    pub height: u16,
    pub actors: Vec<Actor>,
    pub genomes: BTreeMap<ActorId, String>,
    pub totals: CumulativeTotals,
    pub environment: EnvironmentState,
}

impl SavedState {
    #[must_use]
    pub fn capture(
        params: &SimulationParams,
        tick: u64,
        grid: &Grid,
        totals: &CumulativeTotals,
        environment: &EnvironmentState,
    ) -> Self {
        let mut genomes = BTreeMap::new();
        let actors = grid
            .actors()
            .map(|actor| {
                let mut stripped = actor.clone();
                if let Some(genome) = stripped.heavy_genome_mut() {
                    genomes.insert(actor.id().clone(), std::mem::take(genome));
                }
                stripped
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            params_fingerprint: params.fingerprint(),
            params: params.clone(),
            tick,
            width: grid.width(),
            height: grid.height(),
            actors,
            genomes,
            totals: totals.clone(),
            environment: environment.clone(),
        }
    }

    pub fn check_version(&self) -> Result<()> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(SimError::UnsupportedVersion(self.version))
        }
    }

    /// Actors with their genomes put back.
    #[must_use]
    pub fn restored_actors(&self) -> Vec<Actor> {
        self.actors
            .iter()
            .cloned()
            .map(|mut actor| {
                if let Some(stored) = self.genomes.get(actor.id()) {
                    if let Some(genome) = actor.heavy_genome_mut() {
                        genome.clone_from(stored);
                    }
                }
                actor
            })
            .collect()
    }

    #[must_use]
    pub fn counts(&self) -> BTreeMap<ActorKind, usize> {
        let mut counts: BTreeMap<ActorKind, usize> =
            ActorKind::ALL.iter().map(|k| (*k, 0)).collect();
        for actor in &self.actors {
            *counts.entry(actor.kind()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_data::FlowerSeed;

    #[test]
    fn test_capture_strips_and_restore_returns_genomes() {
        let mut grid = Grid::new(3, 3);
        let seed = Actor::FlowerSeed(FlowerSeed {
            id: ActorId::new(ActorKind::FlowerSeed, 1),
            x: 1,
            y: 1,
            genome: "ACGTACGT".to_string(),
            germination_timer: 4,
        });
        grid.insert(seed.clone()).unwrap();

        let saved = SavedState::capture(
            &SimulationParams::default(),
            12,
            &grid,
            &CumulativeTotals::default(),
            &EnvironmentState::default(),
        );
        assert_eq!(saved.actors[0].heavy_genome(), Some(""));
        assert_eq!(saved.genomes[seed.id()], "ACGTACGT");
        assert_eq!(saved.restored_actors(), vec![seed]);
        assert_eq!(saved.counts()[&ActorKind::FlowerSeed], 1);
        assert!(saved.check_version().is_ok());
    }

    #[test]
    fn test_future_version_rejected() {
        let mut saved = SavedState::capture(
            &SimulationParams::default(),
            0,
            &Grid::new(2, 2),
            &CumulativeTotals::default(),
            &EnvironmentState::default(),
        );
        saved.version = SNAPSHOT_VERSION + 1;
        assert_eq!(
            saved.check_version(),
            Err(SimError::UnsupportedVersion(SNAPSHOT_VERSION + 1))
        );
    }
}
