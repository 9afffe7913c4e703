//! # Meadow Core
//!
//! The simulation engine for Meadow, a grid ecosystem of flowers, insects,
//! birds and the weather that pushes them around.
//!
//! This crate contains the deterministic tick logic, including:
//! - Actor placement with a cell index, an id trie and quadtree queries
//! - Per-tick resolvers for every actor family
//! - The asynchronous flower genetics capability and its request queue
//! - Delta tracking for consumers mirroring the actor map
//! - Snapshots, configuration and structured logging
//!
//! ## Example
//!
//! ```
//! use meadow_core::grid::Grid;
//! use meadow_core::lifecycle;
//! use meadow_core::SimulationParams;
//! use meadow_data::ActorKind;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let params = SimulationParams::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let mut grid = Grid::new(10, 10);
//! grid.insert(lifecycle::new_bird(2, 3, &params, &mut rng)).unwrap();
//!
//! assert_eq!(grid.count(ActorKind::Bird), 1);
//! assert_eq!(grid.search("bird-").len(), 1);
//! ```

/// Simulation parameters, validation and fingerprinting
pub mod config;
/// Field-level change tracking between ticks
pub mod delta;
pub mod error;
/// Flower genetics capability and the single-flight request queue
pub mod genetics;
/// Actor placement and spatial lookups
pub mod grid;
/// Genome-keyed cache of rendered flower images
pub mod image_cache;
/// Actor construction
pub mod lifecycle;
/// Tick timing and structured logging
pub mod metrics;
/// Region quadtree for proximity queries
pub mod quadtree;
/// Serializable engine state
pub mod snapshot;
/// Per-tick resolvers
pub mod systems;
/// Prefix trie over actor ids
pub mod trie;

pub use config::SimulationParams;
pub use error::SimError;
pub use grid::Grid;
pub use metrics::{init_logging, Metrics};
