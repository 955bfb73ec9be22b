//! Rocket and particle pools.
//!
//! Rockets live in one vec ordered by id, particles in another, each particle
//! pointing back at its rocket. Removal is deferred: the update pass marks,
//! `compact` sweeps, so indices stay valid while iterating.

use glam::Vec2;

use super::shape::{BurstShape, Spark};
use crate::surface::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RocketId(pub u64);

#[derive(Debug, Clone)]
pub struct Rocket {
    id: RocketId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    target_y: f32,
    color: Rgb,
    shape: BurstShape,
    exploded: bool,
    live_particles: usize,
}

impl Rocket {
    pub(crate) fn new(
        id: RocketId,
        position: Vec2,
        velocity: Vec2,
        target_y: f32,
        color: Rgb,
        shape: BurstShape,
    ) -> Self {
        Self {
            id,
            position,
            velocity,
            target_y,
            color,
            shape,
            exploded: false,
            live_particles: 0,
        }
    }

    pub fn id(&self) -> RocketId {
        self.id
    }
    pub fn position(&self) -> Vec2 {
        self.position
    }
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
    pub fn target_y(&self) -> f32 {
        self.target_y
    }
    pub fn color(&self) -> Rgb {
        self.color
    }
    pub fn shape(&self) -> BurstShape {
        self.shape
    }
    pub fn is_exploded(&self) -> bool {
        self.exploded
    }
    /// Particles of this rocket still alive; always 0 before it explodes.
    pub fn particle_count(&self) -> usize {
        self.live_particles
    }

    /// Apex reached or target altitude passed, whichever comes first.
    pub fn should_explode(&self) -> bool {
        self.velocity.y >= 0.0 || self.position.y <= self.target_y
    }

    /// Whether the rocket can be dropped from the pool.
    pub fn is_spent(&self) -> bool {
        self.exploded && self.live_particles == 0
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    rocket: RocketId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    alpha: f32,
    size: f32,
    color: Rgb,
    decay: f32,
    flicker: bool,
    dead: bool,
}

impl Particle {
    pub fn rocket(&self) -> RocketId {
        self.rocket
    }
    pub fn position(&self) -> Vec2 {
        self.position
    }
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
    pub fn size(&self) -> f32 {
        self.size
    }
    pub fn color(&self) -> Rgb {
        self.color
    }
    pub fn decay(&self) -> f32 {
        self.decay
    }
    pub fn can_flicker(&self) -> bool {
        self.flicker
    }

    /// Fade by one frame. Returns false once the particle has burnt out.
    pub(crate) fn fade(&mut self) -> bool {
        self.alpha -= self.decay;
        if self.alpha <= 0.0 {
            self.dead = true;
        }
        !self.dead
    }
}

#[derive(Default)]
pub(crate) struct FieldPool {
    rockets: Vec<Rocket>,
    particles: Vec<Particle>,
    next_id: u64,
}

impl FieldPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rockets(&self) -> &[Rocket] {
        &self.rockets
    }

    pub(crate) fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn rockets_mut(&mut self) -> &mut [Rocket] {
        &mut self.rockets
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub(crate) fn next_id(&mut self) -> RocketId {
        let id = RocketId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn launch(&mut self, rocket: Rocket) {
        debug_assert!(self.rockets.last().is_none_or(|r| r.id < rocket.id));
        self.rockets.push(rocket);
    }

    /// Flip the rocket at `index` to exploded and add its particle batch.
    /// A rocket explodes at most once; later calls are ignored.
    pub(crate) fn explode(&mut self, index: usize, sparks: Vec<Spark>) {
        let rocket = &mut self.rockets[index];
        if rocket.exploded {
            return;
        }
        rocket.exploded = true;
        rocket.live_particles = sparks.len();

        let (id, origin, color) = (rocket.id, rocket.position, rocket.color);
        self.particles.extend(sparks.into_iter().map(|spark| Particle {
            rocket: id,
            position: origin,
            velocity: spark.velocity,
            alpha: 1.0,
            size: spark.size,
            color,
            decay: spark.decay,
            flicker: spark.flicker,
            dead: false,
        }));
    }

    /// Sweep burnt-out particles, then drop rockets with nothing left.
    pub(crate) fn compact(&mut self) {
        let rockets = &mut self.rockets;
        self.particles.retain(|particle| {
            if !particle.dead {
                return true;
            }
            // Rockets stay sorted by id, so the owner is a binary search away
            if let Ok(i) = rockets.binary_search_by_key(&particle.rocket, |r| r.id) {
                rockets[i].live_particles -= 1;
            }
            false
        });
        self.rockets.retain(|rocket| !rocket.is_spent());
    }

    pub(crate) fn clear(&mut self) {
        self.rockets.clear();
        self.particles.clear();
    }
}
