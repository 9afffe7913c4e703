use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique, lifetime-stable actor identifier.
///
/// Ids look like `insect-<32 hex digits>`, so a kind prefix is enough to
/// find every actor of that kind through a prefix search.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    #[must_use]
    pub fn new(kind: ActorKind, bits: u128) -> Self {
        Self(format!("{}-{:032x}", kind.slug(), bits))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Discriminant of [`Actor`], used for counts and id prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Flower,
    FlowerSeed,
    Insect,
    Cockroach,
    Bird,
    Eagle,
    Egg,
    Cocoon,
    Nutrient,
    Corpse,
    HerbicidePlane,
    HerbicideSmoke,
    Hive,
    AntColony,
}

impl ActorKind {
    pub const ALL: [ActorKind; 14] = [
        ActorKind::Flower,
        ActorKind::FlowerSeed,
        ActorKind::Insect,
        ActorKind::Cockroach,
        ActorKind::Bird,
        ActorKind::Eagle,
        ActorKind::Egg,
        ActorKind::Cocoon,
        ActorKind::Nutrient,
        ActorKind::Corpse,
        ActorKind::HerbicidePlane,
        ActorKind::HerbicideSmoke,
        ActorKind::Hive,
        ActorKind::AntColony,
    ];

    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            ActorKind::Flower => "flower",
            ActorKind::FlowerSeed => "seed",
            ActorKind::Insect => "insect",
            ActorKind::Cockroach => "cockroach",
            ActorKind::Bird => "bird",
            ActorKind::Eagle => "eagle",
            ActorKind::Egg => "egg",
            ActorKind::Cocoon => "cocoon",
            ActorKind::Nutrient => "nutrient",
            ActorKind::Corpse => "corpse",
            ActorKind::HerbicidePlane => "plane",
            ActorKind::HerbicideSmoke => "smoke",
            ActorKind::Hive => "hive",
            ActorKind::AntColony => "colony",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Traits a flower genome can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowerEffect {
    /// Nectar heals the insect drinking it.
    Healing,
    /// Herbicide smoke does half damage.
    Hardy,
    /// Insects see the flower from further away.
    Fragrant,
    /// Drinking insects take double toxicity damage.
    Repellent,
}

/// Statistics the genetics capability derives from a genome and the climate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowerStats {
    pub max_health: f32,
    pub max_stamina: f32,
    pub maturation_period: u32,
    pub sex: Sex,
    pub toxicity_rate: f32,
    pub effects: Vec<FlowerEffect>,
}

impl FlowerStats {
    #[must_use]
    pub fn has_effect(&self, effect: FlowerEffect) -> bool {
        self.effects.contains(&effect)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flower {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    /// Opaque payload owned by the genetics capability.
    pub genome: String,
    pub stats: FlowerStats,
    pub health: f32,
    pub stamina: f32,
    pub age: u32,
    pub nectar: f32,
    pub reproduction_cooldown: u32,
}

impl Flower {
    #[must_use]
    pub fn is_mature(&self) -> bool {
        self.age >= self.stats.maturation_period
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowerSeed {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub genome: String,
    pub germination_timer: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsectSpecies {
    Bee,
    Butterfly,
    Beetle,
    Ant,
}

impl InsectSpecies {
    pub const ALL: [InsectSpecies; 4] = [
        InsectSpecies::Bee,
        InsectSpecies::Butterfly,
        InsectSpecies::Beetle,
        InsectSpecies::Ant,
    ];

    /// Butterflies hatch into a cocoon first.
    #[must_use]
    pub fn metamorphoses(&self) -> bool {
        matches!(self, InsectSpecies::Butterfly)
    }

    #[must_use]
    pub fn pollinates(&self) -> bool {
        matches!(self, InsectSpecies::Bee | InsectSpecies::Butterfly)
    }

    #[must_use]
    pub fn flies(&self) -> bool {
        !matches!(self, InsectSpecies::Ant | InsectSpecies::Beetle)
    }
}

/// Pollen picked up from a flower and carried to the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pollen {
    pub source: ActorId,
    pub genome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insect {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub species: InsectSpecies,
    /// `[vision, metabolism, hardiness]`, each around 1.0.
    pub genome: Vec<f32>,
    pub health: f32,
    pub max_health: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub age: u32,
    pub max_age: u32,
    pub reproduction_cooldown: u32,
    pub pollen: Option<Pollen>,
}

impl Insect {
    fn gene(&self, idx: usize) -> f32 {
        self.genome.get(idx).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn vision(&self, base: f32) -> f32 {
        base * self.gene(0).clamp(0.25, 4.0)
    }

    #[must_use]
    pub fn metabolism(&self) -> f32 {
        self.gene(1).clamp(0.25, 4.0)
    }

    #[must_use]
    pub fn hardiness(&self) -> f32 {
        self.gene(2).clamp(0.25, 4.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cockroach {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub health: f32,
    pub max_health: f32,
    pub age: u32,
    pub max_age: u32,
}

/// Shared shape of birds and eagles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predator {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub health: f32,
    pub max_health: f32,
    /// Hunger reserve; refilled by every kill.
    pub stamina: f32,
    pub max_stamina: f32,
    pub reproduction_cooldown: u32,
    pub kills: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EggContents {
    Insect {
        species: InsectSpecies,
        genome: Vec<f32>,
    },
    Bird,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Egg {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub hatch_timer: u32,
    pub contents: EggContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cocoon {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub timer: u32,
    pub species: InsectSpecies,
    pub genome: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub value: f32,
    pub decay_timer: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpse {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub decay_timer: u32,
    pub source: ActorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbicidePlane {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbicideSmoke {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub timer: u32,
    pub potency: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hive {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub honey: f32,
    pub spawned: u32,
    /// Set once a spawn was rejected for lack of room; cleared by the next spawn.
    #[serde(default)]
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntColony {
    pub id: ActorId,
    pub x: u16,
    pub y: u16,
    pub food_reserves: f32,
    pub spawned: u32,
    #[serde(default)]
    pub blocked: bool,
}

/// Every simulated entity. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Actor {
    Flower(Flower),
    FlowerSeed(FlowerSeed),
    Insect(Insect),
    Cockroach(Cockroach),
    Bird(Predator),
    Eagle(Predator),
    Egg(Egg),
    Cocoon(Cocoon),
    Nutrient(Nutrient),
    Corpse(Corpse),
    HerbicidePlane(HerbicidePlane),
    HerbicideSmoke(HerbicideSmoke),
    Hive(Hive),
    AntColony(AntColony),
}

macro_rules! with_inner {
    ($actor:expr, $inner:ident => $body:expr) => {
        match $actor {
            Actor::Flower($inner) => $body,
            Actor::FlowerSeed($inner) => $body,
            Actor::Insect($inner) => $body,
            Actor::Cockroach($inner) => $body,
            Actor::Bird($inner) => $body,
            Actor::Eagle($inner) => $body,
            Actor::Egg($inner) => $body,
            Actor::Cocoon($inner) => $body,
            Actor::Nutrient($inner) => $body,
            Actor::Corpse($inner) => $body,
            Actor::HerbicidePlane($inner) => $body,
            Actor::HerbicideSmoke($inner) => $body,
            Actor::Hive($inner) => $body,
            Actor::AntColony($inner) => $body,
        }
    };
}

impl Actor {
    #[must_use]
    pub fn id(&self) -> &ActorId {
        with_inner!(self, a => &a.id)
    }

    #[must_use]
    pub fn position(&self) -> (u16, u16) {
        with_inner!(self, a => (a.x, a.y))
    }

    /// Only the grid may call this; it keeps the cell index in sync.
    pub fn set_position(&mut self, x: u16, y: u16) {
        with_inner!(self, a => {
            a.x = x;
            a.y = y;
        })
    }

    #[must_use]
    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Flower(_) => ActorKind::Flower,
            Actor::FlowerSeed(_) => ActorKind::FlowerSeed,
            Actor::Insect(_) => ActorKind::Insect,
            Actor::Cockroach(_) => ActorKind::Cockroach,
            Actor::Bird(_) => ActorKind::Bird,
            Actor::Eagle(_) => ActorKind::Eagle,
            Actor::Egg(_) => ActorKind::Egg,
            Actor::Cocoon(_) => ActorKind::Cocoon,
            Actor::Nutrient(_) => ActorKind::Nutrient,
            Actor::Corpse(_) => ActorKind::Corpse,
            Actor::HerbicidePlane(_) => ActorKind::HerbicidePlane,
            Actor::HerbicideSmoke(_) => ActorKind::HerbicideSmoke,
            Actor::Hive(_) => ActorKind::Hive,
            Actor::AntColony(_) => ActorKind::AntColony,
        }
    }

    #[must_use]
    pub fn as_flower(&self) -> Option<&Flower> {
        match self {
            Actor::Flower(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_insect(&self) -> Option<&Insect> {
        match self {
            Actor::Insect(i) => Some(i),
            _ => None,
        }
    }

    /// Heavy heritable payload persisted outside the grid snapshot.
    #[must_use]
    pub fn heavy_genome(&self) -> Option<&str> {
        match self {
            Actor::Flower(f) => Some(&f.genome),
            Actor::FlowerSeed(s) => Some(&s.genome),
            _ => None,
        }
    }

    pub fn heavy_genome_mut(&mut self) -> Option<&mut String> {
        match self {
            Actor::Flower(f) => Some(&mut f.genome),
            Actor::FlowerSeed(s) => Some(&mut s.genome),
            _ => None,
        }
    }
}
