use std::cell::RefCell;
use std::rc::Rc;

use skyburst::config::FireworksConfig;
use skyburst::sound::SoundBackend;
use skyburst::{EngineOptions, FireworksEngine, Raster, Result, Rgb, Surface, Viewport};

/// Counts plays and releases through shared state.
#[derive(Clone, Default)]
struct Counter {
    plays: Rc<RefCell<Vec<usize>>>,
    released: Rc<RefCell<u32>>,
}

impl SoundBackend for Counter {
    fn clip_count(&self) -> usize {
        2
    }

    fn play(&mut self, voice: usize, _clip: usize, _volume: f64, _pitch: f64) -> Result<()> {
        self.plays.borrow_mut().push(voice);
        Ok(())
    }

    fn release(&mut self) {
        *self.released.borrow_mut() += 1;
    }
}

fn engine(spawn: f32, seed: u64) -> FireworksEngine<Raster> {
    let config = FireworksConfig {
        spawn_probability: spawn,
        ..Default::default()
    };
    FireworksEngine::new(&config).unwrap().with_seed(seed)
}

#[test]
fn first_frame_launches_one_climbing_rocket() {
    let mut viewport = Viewport::new(320, 240);
    let mut engine = engine(1.0, 7);
    assert!(engine.start(Some(Raster::new(1, 1)), &mut viewport, EngineOptions::default()));
    assert!(engine.frame());

    assert_eq!(engine.rockets().len(), 1);
    let rocket = &engine.rockets()[0];
    assert!(rocket.velocity().y < 0.0);
    assert!(!rocket.is_exploded());
    assert_eq!(rocket.particle_count(), 0);
    assert!(engine.particles().is_empty());
    assert!(rocket.position().y < 240.0);
    assert!(rocket.target_y() >= 24.0 && rocket.target_y() <= 120.0);
}

#[test]
fn rocket_is_drawn_onto_the_surface() {
    let mut viewport = Viewport::new(320, 240);
    let mut engine = engine(1.0, 11);
    engine.start(Some(Raster::new(1, 1)), &mut viewport, EngineOptions::default());
    engine.frame();

    let rocket = &engine.rockets()[0];
    let p = rocket.position();
    let raster = engine.surface().unwrap();
    let (x, y) = (p.x.clamp(0.0, 319.0) as u32, p.y.clamp(0.0, 239.0) as u32);
    assert_eq!(raster.pixel(x, y), Some(rocket.color()));
}

#[test]
fn full_show_cycles_and_plays_sounds() {
    let counter = Counter::default();
    let mut viewport = Viewport::new(640, 480);
    let mut engine = engine(0.2, 3);
    engine.start(
        Some(Raster::new(1, 1)),
        &mut viewport,
        EngineOptions {
            sound: Some(Box::new(counter.clone())),
            voices: 3,
            ..Default::default()
        },
    );

    for _ in 0..300 {
        engine.frame();
    }
    let plays = counter.plays.borrow().clone();
    assert!(!plays.is_empty());
    // Voices are handed out round-robin
    for (i, voice) in plays.iter().enumerate() {
        assert_eq!(*voice, i % 3);
    }

    engine.set_spawn_probability(0.0);
    for _ in 0..1000 {
        engine.frame();
    }
    assert!(engine.rockets().is_empty());
    assert!(engine.particles().is_empty());
}

#[test]
fn stop_twice_halts_frames_and_releases_voices() {
    let counter = Counter::default();
    let mut viewport = Viewport::new(320, 240);
    let mut engine = engine(1.0, 5);
    engine.start(
        Some(Raster::new(1, 1)),
        &mut viewport,
        EngineOptions {
            sound: Some(Box::new(counter.clone())),
            ..Default::default()
        },
    );
    engine.frame();
    let frames = engine.frames();

    engine.stop();
    engine.stop();
    assert!(!engine.is_running());
    assert_eq!(*counter.released.borrow(), 1);

    for _ in 0..10 {
        assert!(!engine.frame());
    }
    assert_eq!(engine.frames(), frames);
}

#[test]
fn start_without_surface_leaves_engine_idle() {
    let mut viewport = Viewport::new(320, 240);
    let mut engine = engine(1.0, 1);
    assert!(!engine.start(None, &mut viewport, EngineOptions::default()));
    assert!(!engine.frame());
    assert!(engine.surface().is_none());
    assert!(engine.rockets().is_empty());
    assert_eq!(viewport.listener_count(), 0);
}

#[test]
fn restart_clears_the_sky_and_follows_new_viewport() {
    let mut viewport = Viewport::new(320, 240);
    let mut engine = engine(1.0, 9);
    engine.start(Some(Raster::new(1, 1)), &mut viewport, EngineOptions::default());
    for _ in 0..20 {
        engine.frame();
    }
    assert!(!engine.rockets().is_empty());

    let mut other = Viewport::new(100, 80);
    engine.start(Some(Raster::new(1, 1)), &mut other, EngineOptions::default());
    assert!(engine.rockets().is_empty());
    assert_eq!(engine.surface().unwrap().size(), (100, 80));

    // The first viewport's listener went away with the restart
    viewport.resize(50, 50);
    assert_eq!(viewport.listener_count(), 0);
    engine.frame();
    assert_eq!(engine.surface().unwrap().size(), (100, 80));
}

#[test]
fn background_shows_through_the_trail_fade() {
    let mut viewport = Viewport::new(64, 64);
    let mut engine = engine(0.0, 2);
    let navy = Rgb(0, 0, 100);
    engine.set_background(navy);
    engine.start(Some(Raster::new(1, 1)), &mut viewport, EngineOptions::default());
    for _ in 0..200 {
        engine.frame();
    }
    let px = engine.surface().unwrap().pixel(10, 10).unwrap();
    assert_eq!(px, navy);
}
