//! # Meadow Data
//!
//! Plain, serializable data shared by every Meadow crate: the actor sum type,
//! global environment state, the delta protocol and the per-tick reports.
//! Nothing in here knows how a tick is computed.

pub mod data;

pub use data::actor::*;
pub use data::delta::{ActorDelta, ActorMirror};
pub use data::environment::{EnvironmentState, Season, WeatherEvent, WeatherKind};
pub use data::report::{AppEvent, CumulativeTotals, EventLevel, TickSummary};
