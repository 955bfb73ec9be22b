//! Time sources for caption sync.
//!
//! A source answers "how many seconds in are we?" or `None` when it cannot
//! tell right now. Sources may stall, jump backward, or start late; the caption
//! track copes with all of that, and the wrappers here only decide which
//! clock to believe.

use std::time::Instant;

pub trait TimeSource {
    fn try_time(&mut self) -> Option<f64>;
}

impl<F> TimeSource for F
where
    F: FnMut() -> Option<f64>,
{
    fn try_time(&mut self) -> Option<f64> {
        self()
    }
}

/// Seconds elapsed since construction.
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn try_time(&mut self) -> Option<f64> {
        Some(self.origin.elapsed().as_secs_f64())
    }
}

/// Media clock with a wall-clock fallback.
///
/// Media time wins whenever it reports progress (a finite value above 0).
/// If it has never done so within `timeout` seconds of the first poll, the
/// wall clock, measured from that first poll, takes over until media time
/// shows up.
pub struct FallbackClock<M, W> {
    media: M,
    wall: W,
    timeout: f64,
    origin: Option<f64>,
    media_seen: bool,
    using_wall: bool,
}

impl<M: TimeSource, W: TimeSource> FallbackClock<M, W> {
    pub fn new(media: M, wall: W, timeout: f64) -> Self {
        Self {
            media,
            wall,
            timeout,
            origin: None,
            media_seen: false,
            using_wall: false,
        }
    }

    /// Whether the last answer came from the wall clock.
    pub fn on_fallback(&self) -> bool {
        self.using_wall
    }
}

impl<M: TimeSource, W: TimeSource> TimeSource for FallbackClock<M, W> {
    fn try_time(&mut self) -> Option<f64> {
        let media = self.media.try_time().filter(|t| t.is_finite());
        if let Some(t) = media.filter(|t| *t > 0.0) {
            if !self.media_seen {
                log::debug!("Media clock started at {t:.2}s");
            }
            self.media_seen = true;
            self.using_wall = false;
            return Some(t);
        }

        let now = self.wall.try_time().filter(|t| t.is_finite())?;
        let origin = *self.origin.get_or_insert(now);
        let waited = now - origin;
        if !self.media_seen && waited >= self.timeout {
            if !self.using_wall {
                log::info!("No media time after {:.1}s, using wall clock", self.timeout);
            }
            self.using_wall = true;
            return Some(waited);
        }
        self.using_wall = false;
        media
    }
}

/// Wraps a source so its time repeats with the given period.
pub struct LoopingClock<S> {
    inner: S,
    period: f64,
}

impl<S: TimeSource> LoopingClock<S> {
    pub fn new(inner: S, period: f64) -> Self {
        Self { inner, period }
    }
}

impl<S: TimeSource> TimeSource for LoopingClock<S> {
    fn try_time(&mut self) -> Option<f64> {
        let t = self.inner.try_time()?;
        if !(self.period > 0.0) {
            return Some(t);
        }
        Some(t.rem_euclid(self.period))
    }
}
