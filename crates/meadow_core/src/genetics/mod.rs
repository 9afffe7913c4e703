//! Flower genetics: the opaque capability, a procedural reference
//! implementation, and the single-flight request queue in front of it.

pub mod procedural;
pub mod queue;

use crate::error::Result;
use async_trait::async_trait;
use meadow_data::FlowerStats;
use serde::{Deserialize, Serialize};

pub use procedural::ProceduralGenetics;
pub use queue::{FlowerRequest, GeneticsQueue, GeneticsResponse, RequestId};

/// Rendered flower sprite. Heavy, so it never travels with the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowerImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenomeOutput {
    pub genome: String,
    pub image: FlowerImage,
}

/// What a request asks the capability to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneticsOp {
    Create,
    Reproduce { parent1: String, parent2: String },
    Mutate { genome: String },
}

impl GeneticsOp {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GeneticsOp::Create => "create",
            GeneticsOp::Reproduce { .. } => "reproduce",
            GeneticsOp::Mutate { .. } => "mutate",
        }
    }
}

/// Genome generation, crossover, mutation, stat derivation and drawing.
///
/// Implementations may be slow; the engine only calls them through
/// [`GeneticsQueue`] (and `draw` on load), never from inside a tick.
#[async_trait]
pub trait GeneticsCapability: Send + Sync {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn create_flower(&self) -> Result<GenomeOutput>;

    async fn reproduce(&self, parent1: &str, parent2: &str) -> Result<GenomeOutput>;

    async fn mutate(&self, genome: &str) -> Result<GenomeOutput>;

    async fn get_stats(&self, genome: &str, humidity: f32, temperature: f32)
        -> Result<FlowerStats>;

    async fn draw(&self, genome: &str) -> Result<FlowerImage>;
}
