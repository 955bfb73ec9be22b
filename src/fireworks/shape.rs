//! Burst shapes and the initial particle velocities they produce.

use glam::Vec2;
use std::f32::consts::TAU;

use fastrand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstShape {
    Sphere, // Random directions, wide speed range
    Heart,  // Parametric heart curve
    Ring,   // Even circular shell
    Star,   // Eight spikes
}

/// Fade rate and sparkle of a shape's particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstProfile {
    /// Alpha lost per frame
    pub decay: f32,
    /// Chance that a particle may flash white
    pub flicker_chance: f32,
}

/// One particle's launch parameters, relative to the burst point.
#[derive(Debug, Clone, Copy)]
pub struct Spark {
    pub velocity: Vec2,
    pub size: f32,
    pub decay: f32,
    pub flicker: bool,
}

pub const HEART_PARTICLES: usize = 60;
pub const HEART_SCALE: f32 = 0.15;
pub const RING_PARTICLES: usize = 80;
pub const STAR_PARTICLES: usize = 50;
pub const SPHERE_SPEED_MIN: f32 = 2.0;
pub const SPHERE_SPEED_MAX: f32 = 8.0;
pub const RING_SPEED_MIN: f32 = 6.0;
pub const RING_SPEED_MAX: f32 = 7.0;

impl BurstShape {
    pub fn profile(self) -> BurstProfile {
        match self {
            BurstShape::Sphere | BurstShape::Heart => BurstProfile {
                decay: 0.015,
                flicker_chance: 0.1,
            },
            BurstShape::Ring => BurstProfile {
                decay: 0.02,
                flicker_chance: 0.0,
            },
            BurstShape::Star => BurstProfile {
                decay: 0.03,
                flicker_chance: 1.0,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BurstShape::Sphere => "sphere",
            BurstShape::Heart => "heart",
            BurstShape::Ring => "ring",
            BurstShape::Star => "star",
        }
    }
}

/// Generate the full particle batch for one explosion.
pub fn burst(shape: BurstShape, rng: &mut Rng) -> Vec<Spark> {
    let velocities: Vec<Vec2> = match shape {
        BurstShape::Sphere => {
            let count = rng.usize(100..=150);
            (0..count).map(|_| sphere_velocity(rng)).collect()
        }
        BurstShape::Heart => (0..HEART_PARTICLES)
            .map(|i| heart_velocity(i, HEART_PARTICLES))
            .collect(),
        BurstShape::Ring => (0..RING_PARTICLES)
            .map(|i| {
                let speed = RING_SPEED_MIN + rng.f32() * (RING_SPEED_MAX - RING_SPEED_MIN);
                ring_velocity(i, RING_PARTICLES, speed)
            })
            .collect(),
        BurstShape::Star => (0..STAR_PARTICLES)
            .map(|i| star_velocity(i, STAR_PARTICLES))
            .collect(),
    };

    let profile = shape.profile();
    velocities
        .into_iter()
        .map(|velocity| Spark {
            velocity,
            size: 1.0 + rng.f32() * 3.0,
            decay: profile.decay,
            flicker: rng.f32() < profile.flicker_chance,
        })
        .collect()
}

pub fn sphere_velocity(rng: &mut Rng) -> Vec2 {
    let angle = rng.f32() * TAU;
    let speed = SPHERE_SPEED_MIN + rng.f32() * (SPHERE_SPEED_MAX - SPHERE_SPEED_MIN);
    Vec2::from_angle(angle) * speed
}

/// Point `i` of `n` on the classic heart curve, y flipped for a
/// downward-growing axis.
pub fn heart_velocity(i: usize, n: usize) -> Vec2 {
    let t = i as f32 / n as f32 * TAU;
    let x = 16.0 * t.sin().powi(3);
    let y = -(13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos());
    Vec2::new(x, y) * HEART_SCALE
}

pub fn ring_velocity(i: usize, n: usize, speed: f32) -> Vec2 {
    let angle = i as f32 / n as f32 * TAU;
    Vec2::from_angle(angle) * speed
}

pub fn star_velocity(i: usize, n: usize) -> Vec2 {
    let angle = i as f32 / n as f32 * TAU;
    let radius = 4.0 + 2.0 * (angle * 8.0).sin();
    Vec2::from_angle(angle) * radius
}
