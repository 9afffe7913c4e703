mod common;

use common::SceneBuilder;
use meadow_core::error::SimError;
use meadow_core::snapshot::SNAPSHOT_VERSION;
use meadow_data::{ActorDelta, ActorMirror};
use meadow_io::{load_snapshot, save_snapshot, IoError};
use meadow_lib::model::Engine;

fn populated() -> SceneBuilder {
    SceneBuilder::new().with_size(20, 16).with_params(|p| {
        p.population.flowers = 10;
        p.population.insects = 8;
        p.population.birds = 2;
        p.population.hives = 1;
        p.environment.weather_event_chance = 0.05;
    })
}

#[tokio::test]
async fn test_snapshot_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saves").join("meadow.json.gz");
    let params = populated().params().clone();

    let mut engine = populated().build();
    engine.initialize_grid().await.unwrap();
    for _ in 0..15 {
        engine.calculate_next_tick().unwrap();
    }
    save_snapshot(&engine.get_state_for_save(), &path).unwrap();

    let saved = load_snapshot(&path).unwrap();
    assert_eq!(saved.version, SNAPSHOT_VERSION);
    let mut restored = Engine::with_procedural_genetics(params).unwrap();
    restored.load_state(saved).await.unwrap();

    assert_eq!(restored.tick(), 15);
    assert_eq!(restored.grid().counts(), engine.grid().counts());
    assert_eq!(restored.environment(), engine.environment());

    let out = restored.calculate_next_tick().unwrap();
    assert_eq!(out.tick, 16);
    assert_eq!(out.deltas.first(), Some(&ActorDelta::Reset));
}

#[tokio::test]
async fn test_loaded_flowers_keep_their_genomes() {
    let mut engine = populated().build();
    engine.initialize_grid().await.unwrap();
    let saved = engine.get_state_for_save();

    let mut restored = Engine::with_procedural_genetics(populated().params().clone()).unwrap();
    restored.load_state(saved).await.unwrap();

    for actor in engine.grid().actors() {
        let twin = restored.actor(actor.id()).expect("actor survives the trip");
        assert_eq!(twin, actor);
    }
}

#[tokio::test]
async fn test_load_into_other_dimensions_is_rejected() {
    let mut engine = populated().build();
    engine.initialize_grid().await.unwrap();
    let saved = engine.get_state_for_save();

    let mut other = SceneBuilder::new().with_size(10, 10).build();
    let err = other.load_state(saved).await.unwrap_err();
    assert_eq!(
        err,
        SimError::LoadStateMismatch {
            expected_width: 10,
            expected_height: 10,
            found_width: 20,
            found_height: 16,
        }
    );
}

#[tokio::test]
async fn test_missing_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_snapshot(dir.path().join("nope.json.gz")).unwrap_err();
    assert!(matches!(err, IoError::NotFound(_)));
}

#[tokio::test]
async fn test_mirror_follows_reload() {
    let mut engine = populated().build();
    engine.initialize_grid().await.unwrap();
    let mut mirror = ActorMirror::new();
    for _ in 0..10 {
        mirror.apply_all(&engine.calculate_next_tick().unwrap().deltas);
    }
    let saved = engine.get_state_for_save();
    for _ in 0..10 {
        mirror.apply_all(&engine.calculate_next_tick().unwrap().deltas);
    }

    engine.load_state(saved).await.unwrap();
    mirror.apply_all(&engine.flush_deltas());

    assert_eq!(mirror.len(), engine.grid().len());
    for actor in engine.grid().actors() {
        assert_eq!(mirror.actor(actor.id()).as_ref(), Some(actor));
    }
}
