//! Terminal host: owns the screen, the repaint cadence and the wiring between
//! the fireworks engine, the caption track and the presenter.

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{BufWriter, Stdout, Write, stdout};
use std::time::{Duration, Instant};

use fastrand::Rng;

use crate::captions::CaptionTrack;
use crate::clock::{LoopingClock, TimeSource, WallClock};
use crate::config::{AppConfig, FallingConfig, SoundConfig};
use crate::error::{Result, SkyburstError};
use crate::falling::FallingLayer;
use crate::fireworks::{EngineOptions, FireworksEngine};
use crate::sound::SoundBackend;
use crate::surface::{Raster, Rgb};
use crate::terminal::{self as screen, CaptionLine, Overlay, Presenter};
use crate::viewport::Viewport;

/// Per-run choices that do not live in the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub muted: bool,
    pub seed: Option<u64>,
}

/// Take over the terminal and run the show until the user quits.
pub fn run(config: &AppConfig, options: &RunOptions) -> Result<()> {
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout());

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let result = show(&mut stdout, config, options);

    // Restore the terminal even when the show failed
    let screen_restored = execute!(stdout, Show, LeaveAlternateScreen);
    let raw_restored = terminal::disable_raw_mode();
    first_failure(result, screen_restored, raw_restored)
}

/// The show's own error wins over either restore error.
fn first_failure(
    result: Result<()>,
    screen_restored: std::io::Result<()>,
    raw_restored: std::io::Result<()>,
) -> Result<()> {
    result?;
    screen_restored?;
    raw_restored?;
    Ok(())
}

fn show(stdout: &mut BufWriter<Stdout>, config: &AppConfig, options: &RunOptions) -> Result<()> {
    let scale = config.display.pixel_scale;
    let (mut cols, mut rows) = terminal::size()?;
    let (width, height) = surface_size(cols, rows, scale)?;
    let mut viewport = Viewport::new(width, height);

    let mut engine = FireworksEngine::<Raster>::new(&config.fireworks)?;
    if let Some(seed) = options.seed {
        engine = engine.with_seed(seed);
    }
    engine.set_background(Rgb::from_hex(&config.display.background)?);

    let audio = open_audio(&config.sound);
    engine.start(
        Some(Raster::new(1, 1)),
        &mut viewport,
        EngineOptions {
            muted: options.muted || config.sound.muted,
            palette: None,
            sound: audio.explosions,
            voices: config.sound.pool_size,
        },
    );

    let mut captions = CaptionTrack::with_lead_time(config.captions.lead_time);
    captions.attach(
        caption_clock(audio.music, config.captions.loop_after),
        config.captions.cues.clone(),
    );

    let mut caption_lines = screen::caption_layout(&captions, rows);
    let falling = falling_layer(&config.falling, options.seed);
    let mut wall = WallClock::new();

    let mut presenter = Presenter::new(scale);
    let fixed_dt = 1.0 / config.display.fps;
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char('m') => {
                        let muted = !engine.is_muted();
                        engine.set_muted(muted);
                        log::info!("Muted: {muted}");
                    }
                    _ => {}
                },
                Event::Resize(c, r) => {
                    let (width, height) = surface_size(c, r, scale)?;
                    cols = c;
                    rows = r;
                    viewport.resize(width, height);
                    caption_lines = screen::caption_layout(&captions, rows);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {}
            }
        }

        let now = Instant::now();
        accumulator += now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        if accumulator > fixed_dt * 3.0 {
            accumulator = fixed_dt * 3.0;
        }

        let mut repainted = false;
        while accumulator >= fixed_dt {
            repainted |= engine.frame();
            refresh_captions(&mut captions, &mut caption_lines, rows);
            accumulator -= fixed_dt;
        }

        if repainted {
            if let Some(raster) = engine.surface() {
                let glyphs = wall
                    .try_time()
                    .map(|t| falling.cells(t, cols, rows))
                    .unwrap_or_default();
                let overlay = Overlay {
                    captions: &caption_lines,
                    emphasis: screen::caption_emphasis(&captions, config.captions.fade),
                    glyphs: &glyphs,
                };
                presenter.render(stdout, raster, cols, rows, &overlay)?;
            }
        }
    }

    engine.stop();
    captions.detach();
    stdout.flush()?;
    Ok(())
}

/// Poll the track, rebuilding the caption lines only when the wish changed.
fn refresh_captions(captions: &mut CaptionTrack, lines: &mut Vec<CaptionLine>, rows: u16) -> bool {
    match captions.poll() {
        Some(change) => {
            log::debug!("Wish {:?} -> {:?}", change.previous, change.current);
            *lines = screen::caption_layout(captions, rows);
            true
        }
        None => false,
    }
}

/// Raster size for a terminal grid: `scale` pixels per half-block edge.
fn surface_size(cols: u16, rows: u16, scale: u32) -> Result<(u32, u32)> {
    let width = (cols as u32).checked_mul(scale);
    let height = (rows as u32).checked_mul(2).and_then(|h| h.checked_mul(scale));
    let area = width.zip(height).and_then(|(w, h)| (w as u64).checked_mul(h as u64));
    match (width, height, area) {
        (Some(w), Some(h), Some(area)) if area <= MAX_SURFACE_PIXELS => Ok((w, h)),
        _ => Err(SkyburstError::InvalidConfig(format!(
            "{cols}x{rows} terminal at pixel scale {scale} is too large to draw"
        ))),
    }
}

/// Raster memory stays in the hundreds of megabytes at worst
const MAX_SURFACE_PIXELS: u64 = 1 << 25;

/// Glyph layer on its own random stream, so it never shifts the fireworks.
fn falling_layer(config: &FallingConfig, seed: Option<u64>) -> FallingLayer {
    if !config.enabled {
        return FallingLayer::empty();
    }
    let mut rng = match seed {
        Some(seed) => Rng::with_seed(seed.wrapping_add(1)),
        None => Rng::new(),
    };
    FallingLayer::new(&config.glyphs, config.count, &mut rng)
}

struct AudioParts {
    explosions: Option<Box<dyn SoundBackend>>,
    music: Option<Box<dyn TimeSource>>,
}

#[cfg(feature = "audio")]
fn open_audio(sound: &SoundConfig) -> AudioParts {
    use crate::clock::FallbackClock;
    use crate::sound::device::AudioDevice;

    if sound.explosions.is_empty() && sound.music.is_none() {
        return AudioParts {
            explosions: None,
            music: None,
        };
    }

    let device = match AudioDevice::open() {
        Ok(device) => device,
        Err(e) => {
            log::warn!("{e}; running silent");
            return AudioParts {
                explosions: None,
                music: None,
            };
        }
    };

    let explosions: Box<dyn SoundBackend> = Box::new(device.explosions(&sound.explosions));
    let music = sound.music.as_deref().and_then(|path| match device.play_music(path) {
        Ok(track) => {
            let clock = FallbackClock::new(track, WallClock::new(), sound.fallback_after);
            Some(Box::new(clock) as Box<dyn TimeSource>)
        }
        Err(e) => {
            log::warn!("{e}; captions follow the wall clock");
            None
        }
    });

    AudioParts {
        explosions: Some(explosions),
        music,
    }
}

#[cfg(not(feature = "audio"))]
fn open_audio(sound: &SoundConfig) -> AudioParts {
    if !sound.explosions.is_empty() || sound.music.is_some() {
        log::warn!("Built without the `audio` feature; sound settings ignored");
    }
    AudioParts {
        explosions: None,
        music: None,
    }
}

/// Music position when available, wall time otherwise, optionally looped.
fn caption_clock(music: Option<Box<dyn TimeSource>>, loop_after: Option<f64>) -> Box<dyn TimeSource> {
    let base: Box<dyn TimeSource> = match music {
        Some(music) => music,
        None => Box::new(WallClock::new()),
    };
    match loop_after {
        Some(period) => {
            let mut base = base;
            Box::new(LoopingClock::new(move || base.try_time(), period))
        }
        None => base,
    }
}
