//! Snapshot files: versioned JSON, gzip-compressed.
//!
//! Loading also accepts uncompressed JSON so hand-edited snapshots work.

use crate::error::{IoError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use meadow_core::snapshot::SavedState;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

pub fn save_snapshot<P: AsRef<Path>>(state: &SavedState, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .map_err(|e| IoError::FileSystem(e).with_context(format!("creating {:?}", path)))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, state)?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .map_err(|e| IoError::compression(e.to_string()))?;
    Ok(())
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<SavedState> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::not_found(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;

    let mut decoded = Vec::new();
    let state: SavedState = if GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut decoded)
        .is_ok()
    {
        serde_json::from_slice(&decoded)?
    } else {
        serde_json::from_slice(&bytes)?
    };

    state
        .check_version()
        .map_err(|e| IoError::validation(e.to_string()))?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_core::grid::Grid;
    use meadow_core::lifecycle;
    use meadow_core::snapshot::SNAPSHOT_VERSION;
    use meadow_core::SimulationParams;
    use meadow_data::{ActorKind, CumulativeTotals, EnvironmentState, FlowerStats, Sex};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn state() -> SavedState {
        let params = SimulationParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut grid = Grid::new(params.world.width, params.world.height);
        let stats = FlowerStats {
            max_health: 50.0,
            max_stamina: 50.0,
            maturation_period: 30,
            sex: Sex::Female,
            toxicity_rate: 0.1,
            effects: Vec::new(),
        };
        grid.insert(lifecycle::new_flower(1, 2, "ACGTACGT".into(), stats, &params, &mut rng))
            .unwrap();
        grid.insert(lifecycle::new_bird(4, 4, &params, &mut rng))
            .unwrap();
        SavedState::capture(
            &params,
            57,
            &grid,
            &CumulativeTotals::default(),
            &EnvironmentState::default(),
        )
    }

    #[test]
    fn test_snapshot_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saves").join("meadow.sav");
        let saved = state();
        save_snapshot(&saved, &path).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.tick, 57);
        assert_eq!(loaded.counts()[&ActorKind::Flower], 1);
        assert_eq!(loaded.genomes.values().next().map(String::as_str), Some("ACGTACGT"));
    }

    #[test]
    fn test_plain_json_snapshot_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meadow.json");
        std::fs::write(&path, serde_json::to_string(&state()).unwrap()).unwrap();
        assert_eq!(load_snapshot(&path).unwrap().tick, 57);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meadow.sav");
        let mut saved = state();
        saved.version = SNAPSHOT_VERSION + 1;
        save_snapshot(&saved, &path).unwrap();
        assert!(matches!(load_snapshot(&path), Err(IoError::Validation(_))));
    }

    #[test]
    fn test_missing_snapshot() {
        assert!(matches!(
            load_snapshot("/nonexistent/meadow.sav"),
            Err(IoError::NotFound(_))
        ));
    }
}
