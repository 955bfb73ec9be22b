//! skyburst - a terminal new-year greeting
//!
//! Core modules:
//! - `fireworks`: rocket/particle simulation painted onto a `Surface`
//! - `captions`: cue tracking against an unreliable playback clock
//! - `clock`: time sources (wall, media with fallback, looping)
//! - `falling`: festive glyphs drifting down over the sky
//! - `sound`: fire-and-forget explosion sounds over a rotating voice pool
//! - `terminal` / `app`: the crossterm host that ties them together

pub mod app;
pub mod captions;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod falling;
pub mod fireworks;
pub mod random;
pub mod sound;
pub mod surface;
pub mod terminal;
pub mod viewport;

pub use captions::{CaptionTrack, Cue, CueState};
pub use config::AppConfig;
pub use error::{Result, SkyburstError};
pub use falling::FallingLayer;
pub use fireworks::{EngineOptions, FireworksEngine};
pub use surface::{Raster, Rgb, Surface};
pub use viewport::Viewport;
