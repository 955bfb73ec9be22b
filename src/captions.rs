//! Time-synced captions.
//!
//! A `CaptionTrack` samples a `TimeSource` once per repaint and maps the time
//! to the latest cue that has started, counting `lead_time` seconds early.
//! Every poll recomputes the index from scratch, so a clock that restarts or
//! jumps backward moves the index back with it.

use serde::{Deserialize, Serialize};

use crate::clock::TimeSource;

pub const DEFAULT_LEAD_TIME: f64 = 0.2;

/// One line of text and the moment it becomes active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Seconds from the start of the track
    #[serde(alias = "start_time")]
    pub start: f64,
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
        }
    }
}

/// Where a cue sits relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueState {
    Past,
    Current,
    Future,
}

/// Index of the last cue with `time >= start - lead_time`.
///
/// `cues` must be sorted by `start`; the scan stops at the first cue that has
/// not started yet.
pub fn active_index(cues: &[Cue], time: f64, lead_time: f64) -> Option<usize> {
    let mut active = None;
    for (i, cue) in cues.iter().enumerate() {
        if time >= cue.start - lead_time {
            active = Some(i);
        } else {
            break;
        }
    }
    active
}

/// Index change reported by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

pub struct CaptionTrack {
    cues: Vec<Cue>,
    lead_time: f64,
    source: Option<Box<dyn TimeSource>>,
    active: Option<usize>,
    last_time: Option<f64>,
}

impl Default for CaptionTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptionTrack {
    pub fn new() -> Self {
        Self::with_lead_time(DEFAULT_LEAD_TIME)
    }

    pub fn with_lead_time(lead_time: f64) -> Self {
        Self {
            cues: Vec::new(),
            lead_time,
            source: None,
            active: None,
            last_time: None,
        }
    }

    /// Start following `source` over `cues` (sorted by start time).
    pub fn attach(&mut self, source: Box<dyn TimeSource>, cues: Vec<Cue>) {
        debug_assert!(cues.windows(2).all(|w| w[0].start <= w[1].start));
        log::debug!("Caption track attached with {} cues", cues.len());
        self.source = Some(source);
        self.cues = cues;
        self.active = None;
        self.last_time = None;
    }

    /// Stop polling. The last index stays readable.
    pub fn detach(&mut self) {
        if self.source.take().is_some() {
            log::debug!("Caption track detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    /// Sample the source once. Returns the change when the active index moved.
    ///
    /// A poll without a usable time (source gone, `None`, or non-finite)
    /// leaves the index as it was.
    pub fn poll(&mut self) -> Option<CaptionChange> {
        let source = self.source.as_mut()?;
        let time = source.try_time().filter(|t| t.is_finite())?;
        self.last_time = Some(time);

        let current = active_index(&self.cues, time, self.lead_time);
        if current == self.active {
            return None;
        }

        let change = CaptionChange {
            previous: self.active,
            current,
        };
        log::debug!("Caption {:?} -> {:?} at {time:.2}s", change.previous, current);
        self.active = current;
        Some(change)
    }

    /// Active cue index; `None` until the first cue starts.
    pub fn current_index(&self) -> Option<usize> {
        self.active
    }

    pub fn current(&self) -> Option<&Cue> {
        self.active.map(|i| &self.cues[i])
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Time seen by the last successful poll.
    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    pub fn lead_time(&self) -> f64 {
        self.lead_time
    }

    pub fn state_of(&self, index: usize) -> CueState {
        match self.active {
            Some(active) if index < active => CueState::Past,
            Some(active) if index == active => CueState::Current,
            _ => CueState::Future,
        }
    }
}
