//! Fireworks particle field: rockets rise, burst into shaped particle batches,
//! and fade under gravity and drag, painted with a translucent overlay so
//! motion leaves trails.

pub mod engine;
mod pool;
pub mod shape;

pub use engine::{EngineOptions, FireworksEngine};
pub use pool::{Particle, Rocket, RocketId};
pub use shape::{BurstProfile, BurstShape};
