use super::{FlowerImage, GeneticsCapability, GenomeOutput};
use crate::error::{Result, SimError};
use async_trait::async_trait;
use meadow_data::{FlowerEffect, FlowerStats, Sex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
pub const GENOME_LENGTH: usize = 24;
const SPRITE_SIZE: u32 = 8;

/// Base motifs and the effect they express.
const MOTIFS: [(&str, FlowerEffect); 4] = [
    ("GAT", FlowerEffect::Healing),
    ("CCC", FlowerEffect::Hardy),
    ("TAG", FlowerEffect::Fragrant),
    ("TTT", FlowerEffect::Repellent),
];

/// Deterministic in-process genetics over `ACGT` strings.
///
/// Stats come from base composition: adenine builds health, cytosine stamina,
/// guanine slows maturation and thymine adds toxicity. The final base picks
/// the sex. Humidity and temperature scale health and stamina.
pub struct ProceduralGenetics {
    rng: Mutex<ChaCha8Rng>,
    mutation_rate: f64,
}

impl ProceduralGenetics {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            mutation_rate: 0.05,
        }
    }

    #[must_use]
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> T) -> Result<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| SimError::genetics_failure("genetics rng poisoned"))?;
        Ok(f(&mut rng))
    }

    fn validate(genome: &str) -> Result<()> {
        if genome.is_empty() || !genome.chars().all(|c| BASES.contains(&c)) {
            return Err(SimError::genetics_failure(format!(
                "malformed genome {:?}",
                genome
            )));
        }
        Ok(())
    }

    fn point_mutations(genome: &mut [char], rate: f64, rng: &mut ChaCha8Rng) {
        for base in genome.iter_mut() {
            if rng.gen_bool(rate) {
                *base = BASES[rng.gen_range(0..BASES.len())];
            }
        }
    }

    fn output(&self, genome: String) -> GenomeOutput {
        let image = render(&genome);
        GenomeOutput { genome, image }
    }
}

impl Default for ProceduralGenetics {
    fn default() -> Self {
        Self::new(0)
    }
}

fn render(genome: &str) -> FlowerImage {
    let digest = Sha256::digest(genome.as_bytes());
    let petal = [digest[0], digest[1], digest[2], 255];
    let center = [digest[3], digest[4], digest[5], 255];
    let mut rgba = Vec::with_capacity((SPRITE_SIZE * SPRITE_SIZE * 4) as usize);
    let mid = (SPRITE_SIZE as f32 - 1.0) / 2.0;
    for py in 0..SPRITE_SIZE {
        for px in 0..SPRITE_SIZE {
            let dx = px as f32 - mid;
            let dy = py as f32 - mid;
            let d = (dx * dx + dy * dy).sqrt();
            let pixel = if d <= 1.0 {
                center
            } else if d <= 3.5 {
                petal
            } else {
                [0, 0, 0, 0]
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    FlowerImage {
        width: SPRITE_SIZE,
        height: SPRITE_SIZE,
        rgba,
    }
}

#[async_trait]
impl GeneticsCapability for ProceduralGenetics {
    async fn create_flower(&self) -> Result<GenomeOutput> {
        let genome = self.with_rng(|rng| {
            (0..GENOME_LENGTH)
                .map(|_| BASES[rng.gen_range(0..BASES.len())])
                .collect::<String>()
        })?;
        Ok(self.output(genome))
    }

    async fn reproduce(&self, parent1: &str, parent2: &str) -> Result<GenomeOutput> {
        Self::validate(parent1)?;
        Self::validate(parent2)?;
        let a: Vec<char> = parent1.chars().collect();
        let b: Vec<char> = parent2.chars().collect();
        let rate = self.mutation_rate;
        let genome = self.with_rng(|rng| {
            let len = a.len().min(b.len());
            let cut = rng.gen_range(0..=len);
            let mut child: Vec<char> = a[..cut].iter().chain(b[cut..].iter()).copied().collect();
            Self::point_mutations(&mut child, rate, rng);
            child.into_iter().collect::<String>()
        })?;
        Ok(self.output(genome))
    }

    async fn mutate(&self, genome: &str) -> Result<GenomeOutput> {
        Self::validate(genome)?;
        let mut bases: Vec<char> = genome.chars().collect();
        let rate = (self.mutation_rate * 2.0).min(1.0);
        let genome = self.with_rng(|rng| {
            Self::point_mutations(&mut bases, rate, rng);
            bases.into_iter().collect::<String>()
        })?;
        Ok(self.output(genome))
    }

    async fn get_stats(
        &self,
        genome: &str,
        humidity: f32,
        temperature: f32,
    ) -> Result<FlowerStats> {
        Self::validate(genome)?;
        let count = |base: char| genome.chars().filter(|c| *c == base).count() as f32;
        let humidity_factor = 0.8 + 0.4 * humidity.clamp(0.0, 1.0);
        let temperature_factor = 1.0 - ((temperature - 20.0).abs() / 40.0).min(0.5);

        let sex = match genome.chars().last() {
            Some('A') | Some('G') => Sex::Female,
            _ => Sex::Male,
        };
        let effects = MOTIFS
            .iter()
            .filter(|(motif, _)| genome.contains(motif))
            .map(|(_, effect)| *effect)
            .collect();

        Ok(FlowerStats {
            max_health: (40.0 + 2.5 * count('A')) * humidity_factor,
            max_stamina: (40.0 + 2.5 * count('C')) * temperature_factor,
            maturation_period: 20 + 2 * count('G') as u32,
            sex,
            toxicity_rate: 2.0 * count('T') / genome.len() as f32,
            effects,
        })
    }

    async fn draw(&self, genome: &str) -> Result<FlowerImage> {
        Self::validate(genome)?;
        Ok(render(genome))
    }
}
