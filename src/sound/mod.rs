//! Explosion sound side channel.
//!
//! Requests are fire-and-forget. A `SoundPool` owns a fixed number of voices
//! and hands them out round-robin, so a new burst reuses the oldest voice
//! instead of waiting for it. Backend failures never reach the caller.

#[cfg(feature = "audio")]
pub mod device;

use fastrand::Rng;

use crate::error::Result;

/// Something that can play short clips on numbered voices.
pub trait SoundBackend {
    /// Number of distinct clips loaded
    fn clip_count(&self) -> usize;

    /// Start `clip` on `voice`, cutting off whatever that voice was playing.
    fn play(&mut self, voice: usize, clip: usize, volume: f64, pitch: f64) -> Result<()>;

    /// Silence every voice.
    fn release(&mut self) {}
}

/// Parameters of one playback request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub voice: usize,
    pub clip: usize,
    pub volume: f64,
    pub pitch: f64,
}

pub struct SoundPool {
    backend: Box<dyn SoundBackend>,
    voices: usize,
    cursor: usize,
}

impl SoundPool {
    pub fn new(backend: Box<dyn SoundBackend>, voices: usize) -> Self {
        Self {
            backend,
            voices: voices.max(1),
            cursor: 0,
        }
    }

    /// Play a random clip with jittered volume and pitch on the next voice.
    /// Returns the request that was attempted, or `None` with no clips loaded.
    pub fn fire(&mut self, rng: &mut Rng) -> Option<SoundRequest> {
        let clips = self.backend.clip_count();
        if clips == 0 {
            return None;
        }

        let request = SoundRequest {
            voice: self.cursor,
            clip: rng.usize(0..clips),
            volume: 0.5 + rng.f64() * 0.3,
            pitch: 0.85 + rng.f64() * 0.3,
        };
        self.cursor = (self.cursor + 1) % self.voices;

        if let Err(e) = self
            .backend
            .play(request.voice, request.clip, request.volume, request.pitch)
        {
            log::debug!("Explosion sound skipped: {e}");
        }
        Some(request)
    }
}

impl Drop for SoundPool {
    fn drop(&mut self) {
        self.backend.release();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Backend that records what it was asked to do.
    #[derive(Default, Clone)]
    pub struct Recorder {
        pub played: Rc<RefCell<Vec<SoundRequest>>>,
        pub released: Rc<RefCell<bool>>,
        pub clips: usize,
        pub fail: bool,
    }

    impl SoundBackend for Recorder {
        fn clip_count(&self) -> usize {
            self.clips
        }

        fn play(&mut self, voice: usize, clip: usize, volume: f64, pitch: f64) -> Result<()> {
            if self.fail {
                return Err(crate::error::SkyburstError::Audio("autoplay blocked".into()));
            }
            self.played.borrow_mut().push(SoundRequest {
                voice,
                clip,
                volume,
                pitch,
            });
            Ok(())
        }

        fn release(&mut self) {
            *self.released.borrow_mut() = true;
        }
    }
}
