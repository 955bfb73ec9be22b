use glam::Vec2;
use std::sync::mpsc::Receiver;

use fastrand::Rng;

use super::pool::{FieldPool, Particle, Rocket};
use super::shape::{self, BurstShape};
use crate::config::FireworksConfig;
use crate::error::Result;
use crate::random::WeightedTable;
use crate::sound::{SoundBackend, SoundPool};
use crate::surface::{Rgb, Surface};
use crate::viewport::{self, Viewport};

const ROCKET_RADIUS: f32 = 3.0;
/// Per-frame chance that a flicker-eligible particle flashes white
const FLICKER_FIRE_CHANCE: f32 = 0.3;
const LAUNCH_SPEED_MIN: f32 = 12.0;
const LAUNCH_SPEED_JITTER: f32 = 4.0;
/// Burst altitude band as fractions of the surface height, from the top
const TARGET_BAND: (f32, f32) = (0.1, 0.5);

/// Options for one run of the engine.
pub struct EngineOptions {
    pub muted: bool,
    /// Replaces the configured palette when given and non-empty
    pub palette: Option<Vec<Rgb>>,
    /// Explosion sound backend; the engine wraps it in a voice pool
    pub sound: Option<Box<dyn SoundBackend>>,
    pub voices: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            muted: false,
            palette: None,
            sound: None,
            voices: 5,
        }
    }
}

pub struct FireworksEngine<S: Surface> {
    spawn_probability: f32,
    trail_alpha: f32,
    rocket_gravity: f32,
    particle_gravity: f32,
    drag: f32,
    shapes: WeightedTable<BurstShape>,
    configured_palette: Vec<Rgb>,
    palette: Vec<Rgb>,
    background: Rgb,
    rng: Rng,
    pool: FieldPool,
    surface: Option<S>,
    resize: Option<Receiver<(u32, u32)>>,
    sound: Option<SoundPool>,
    muted: bool,
    armed: bool,
    frames: u64,
}

impl<S: Surface> FireworksEngine<S> {
    pub fn new(config: &FireworksConfig) -> Result<Self> {
        config.validate()?;
        let palette = config.parsed_palette()?;
        Ok(Self {
            spawn_probability: config.spawn_probability,
            trail_alpha: config.trail_alpha,
            rocket_gravity: config.rocket_gravity,
            particle_gravity: config.particle_gravity,
            drag: config.drag,
            shapes: config.shape_weights.table()?,
            configured_palette: palette.clone(),
            palette,
            background: Rgb::BLACK,
            rng: Rng::new(),
            pool: FieldPool::new(),
            surface: None,
            resize: None,
            sound: None,
            muted: false,
            armed: false,
            frames: 0,
        })
    }

    /// Reseed the engine's random stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    pub fn set_spawn_probability(&mut self, probability: f32) {
        self.spawn_probability = probability.clamp(0.0, 1.0);
    }

    /// Begin animating onto `surface`. Without a surface this does nothing and
    /// returns false. Restarting a running engine stops it first.
    pub fn start(&mut self, surface: Option<S>, viewport: &mut Viewport, options: EngineOptions) -> bool {
        let Some(mut surface) = surface else {
            log::warn!("Fireworks: no drawing surface, not starting");
            return false;
        };
        self.stop();

        let (width, height) = viewport.size();
        surface.resize(width, height);
        self.surface = Some(surface);
        self.resize = Some(viewport.subscribe());

        self.palette = match options.palette {
            Some(p) if !p.is_empty() => p,
            _ => self.configured_palette.clone(),
        };
        self.muted = options.muted;
        self.sound = options
            .sound
            .map(|backend| SoundPool::new(backend, options.voices));
        self.pool.clear();
        self.armed = true;

        log::info!("Fireworks started on {width}x{height} surface (muted: {})", self.muted);
        true
    }

    /// Stop scheduling frames, detach from resizes and release sound voices.
    /// Safe to call repeatedly.
    pub fn stop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        self.resize = None;
        self.sound = None;
        log::info!("Fireworks stopped after {} frames", self.frames);
    }

    pub fn is_running(&self) -> bool {
        self.armed
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn rockets(&self) -> &[Rocket] {
        self.pool.rockets()
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.particles()
    }

    /// Frames run since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one repaint. Returns false, doing nothing, when not running.
    pub fn frame(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        let Some(mut surface) = self.surface.take() else {
            return false;
        };

        if let Some((w, h)) = self.resize.as_ref().and_then(viewport::latest_size) {
            log::debug!("Fireworks surface resized to {w}x{h}");
            surface.resize(w, h);
        }
        let (width, height) = surface.size();
        let (width, height) = (width as f32, height as f32);

        // Fade the previous frame instead of clearing it
        surface.set_global_alpha(self.trail_alpha);
        surface.fill_rect(0.0, 0.0, width, height, self.background);
        surface.set_global_alpha(1.0);

        if self.rng.f32() < self.spawn_probability {
            self.launch(width, height);
        }

        // Sparks from this frame's bursts start moving on the next one
        let settled = self.pool.particles().len();
        self.update_rockets(&mut surface);
        self.update_particles(&mut surface, settled);
        self.pool.compact();

        self.surface = Some(surface);
        self.frames += 1;
        true
    }

    fn launch(&mut self, width: f32, height: f32) {
        let id = self.pool.next_id();
        let x = self.rng.f32() * width;
        let (top, bottom) = TARGET_BAND;
        let target_y = height * top + self.rng.f32() * height * (bottom - top);
        let color = self.palette[self.rng.usize(0..self.palette.len())];
        let velocity = Vec2::new(
            (self.rng.f32() - 0.5) * 2.0,
            -LAUNCH_SPEED_MIN - self.rng.f32() * LAUNCH_SPEED_JITTER,
        );
        let shape = self.shapes.pick(&mut self.rng);

        self.pool.launch(Rocket::new(
            id,
            Vec2::new(x, height),
            velocity,
            target_y,
            color,
            shape,
        ));
    }

    fn update_rockets(&mut self, surface: &mut S) {
        for i in 0..self.pool.rockets().len() {
            let rocket = &mut self.pool.rockets_mut()[i];
            if rocket.is_exploded() {
                continue;
            }

            rocket.position += rocket.velocity;
            rocket.velocity.y += self.rocket_gravity;
            surface.fill_circle(rocket.position, ROCKET_RADIUS, rocket.color());

            if rocket.should_explode() {
                let sparks = shape::burst(rocket.shape(), &mut self.rng);
                log::trace!(
                    "Rocket {} burst as {} ({} particles)",
                    rocket.id().0,
                    rocket.shape().as_str(),
                    sparks.len()
                );
                self.pool.explode(i, sparks);
                self.play_explosion();
            }
        }
    }

    fn update_particles(&mut self, surface: &mut S, settled: usize) {
        for particle in &mut self.pool.particles_mut()[..settled] {
            particle.position += particle.velocity;
            particle.velocity.y += self.particle_gravity;
            particle.velocity *= self.drag;

            if !particle.fade() {
                continue;
            }

            let color = if particle.can_flicker() && self.rng.f32() < FLICKER_FIRE_CHANCE {
                Rgb::WHITE
            } else {
                particle.color()
            };
            surface.set_global_alpha(particle.alpha());
            surface.fill_circle(particle.position, particle.size(), color);
        }
        surface.set_global_alpha(1.0);
    }

    fn play_explosion(&mut self) {
        if self.muted {
            return;
        }
        if let Some(sound) = self.sound.as_mut() {
            sound.fire(&mut self.rng);
        }
    }
}
