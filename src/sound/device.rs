//! Kira audio output: explosion voices and the music track whose playback
//! position drives the captions.
//!
//! Degrades gracefully: a missing clip is skipped, a missing device is an
//! error the host can turn into silent mode.

use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};
use std::cell::RefCell;
use std::rc::Rc;

use super::SoundBackend;
use crate::clock::TimeSource;
use crate::error::{Result, SkyburstError};

type Manager = Rc<RefCell<AudioManager<DefaultBackend>>>;

pub struct AudioDevice {
    manager: Manager,
}

impl AudioDevice {
    pub fn open() -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| SkyburstError::Audio(format!("no audio device available ({e})")))?;
        Ok(Self {
            manager: Rc::new(RefCell::new(manager)),
        })
    }

    /// Load explosion clips. Clips that fail to load are left out.
    pub fn explosions(&self, paths: &[String]) -> ExplosionVoices {
        let clips = paths
            .iter()
            .filter_map(|path| match StaticSoundData::from_file(path) {
                Ok(data) => Some(data),
                Err(e) => {
                    log::warn!("Audio: failed to load '{path}': {e}");
                    None
                }
            })
            .collect();

        ExplosionVoices {
            manager: Rc::clone(&self.manager),
            clips,
            voices: Vec::new(),
        }
    }

    /// Start the looping background track.
    pub fn play_music(&self, path: &str) -> Result<MusicClock> {
        let data = StaticSoundData::from_file(path)
            .map_err(|e| SkyburstError::Audio(format!("Failed to load '{path}': {e}")))?
            .loop_region(..);
        let handle = self
            .manager
            .borrow_mut()
            .play(data)
            .map_err(|e| SkyburstError::Audio(format!("Failed to play '{path}': {e}")))?;
        Ok(MusicClock {
            handle,
            _manager: Rc::clone(&self.manager),
        })
    }
}

pub struct ExplosionVoices {
    manager: Manager,
    clips: Vec<StaticSoundData>,
    voices: Vec<Option<StaticSoundHandle>>,
}

impl SoundBackend for ExplosionVoices {
    fn clip_count(&self) -> usize {
        self.clips.len()
    }

    fn play(&mut self, voice: usize, clip: usize, volume: f64, pitch: f64) -> Result<()> {
        let data = self
            .clips
            .get(clip)
            .ok_or_else(|| SkyburstError::Audio(format!("no clip {clip}")))?
            .clone()
            .volume(amplitude_to_db(volume))
            .playback_rate(kira::PlaybackRate(pitch));

        if voice >= self.voices.len() {
            self.voices.resize_with(voice + 1, || None);
        }
        if let Some(mut previous) = self.voices[voice].take() {
            previous.stop(Tween::default());
        }

        let handle = self
            .manager
            .borrow_mut()
            .play(data)
            .map_err(|e| SkyburstError::Audio(format!("Failed to play clip {clip}: {e}")))?;
        self.voices[voice] = Some(handle);
        Ok(())
    }

    fn release(&mut self) {
        for mut handle in self.voices.drain(..).flatten() {
            handle.stop(Tween::default());
        }
    }
}

/// Playback position of the music track, while it is actually playing.
pub struct MusicClock {
    handle: StaticSoundHandle,
    // Output stops when the last manager reference goes
    _manager: Manager,
}

impl TimeSource for MusicClock {
    fn try_time(&mut self) -> Option<f64> {
        match self.handle.state() {
            PlaybackState::Playing => Some(self.handle.position()),
            _ => None,
        }
    }
}

/// Convert linear amplitude (0.0–2.0) to decibels
fn amplitude_to_db(amplitude: f64) -> kira::Decibels {
    if amplitude <= 0.0 {
        kira::Decibels(-60.0) // silence
    } else {
        kira::Decibels((20.0 * (amplitude as f32).log10()).max(-60.0))
    }
}
