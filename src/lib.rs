//! # Meadow
//!
//! A grid ecosystem simulation: flowers whose genomes come from an
//! asynchronous genetics capability, insects that pollinate them, birds and
//! eagles that hunt, and weather that spoils everyone's day.
//!
//! [`model::Engine`] advances the world one tick at a time and reports the
//! changes as actor deltas. [`app::SimulationRunner`] drives an engine from a
//! single task and takes control messages through a [`app::SimulationHandle`].

pub mod app;
pub mod model;
