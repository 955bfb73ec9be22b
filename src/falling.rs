//! Festive glyphs drifting down the screen on a loop.
//!
//! Each glyph gets a fixed column, fall time and start delay when the layer is
//! built, so the layer itself is a pure function of elapsed seconds.

use fastrand::Rng;

pub const DEFAULT_GLYPHS: [char; 5] = ['🏮', '🌸', '🌼', '🧧', '✨'];

/// Seconds a glyph takes to cross the screen
const FALL_SECS_MIN: f64 = 4.0;
const FALL_SECS_JITTER: f64 = 6.0;
const MAX_DELAY: f64 = 5.0;
/// Path runs from 10% above the top to 10% below the bottom
const PATH_START: f64 = -0.1;
const PATH_SPAN: f64 = 1.2;
const START_OPACITY: f64 = 0.8;
/// Emoji cannot be drawn translucent; a glyph fainter than this is left out.
const VISIBLE_OPACITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Faller {
    glyph: char,
    /// Horizontal position as a fraction of the width
    column: f64,
    duration: f64,
    delay: f64,
}

impl Faller {
    /// Fraction of the current pass completed, or `None` before the first one.
    fn progress(&self, time: f64) -> Option<f64> {
        let since = time - self.delay;
        if !(since >= 0.0) {
            return None;
        }
        Some((since / self.duration).fract())
    }
}

/// One glyph placed on the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphCell {
    pub col: u16,
    pub row: u16,
    pub glyph: char,
    /// Terminal columns the glyph covers
    pub width: u16,
    pub opacity: f32,
}

pub struct FallingLayer {
    fallers: Vec<Faller>,
}

impl FallingLayer {
    /// `count` glyphs cycling through `glyphs`, placed with their own random stream.
    pub fn new(glyphs: &[char], count: usize, rng: &mut Rng) -> Self {
        if glyphs.is_empty() {
            return Self::empty();
        }
        let fallers = (0..count)
            .map(|i| Faller {
                glyph: glyphs[i % glyphs.len()],
                column: rng.f64(),
                duration: FALL_SECS_MIN + rng.f64() * FALL_SECS_JITTER,
                delay: rng.f64() * MAX_DELAY,
            })
            .collect();
        Self { fallers }
    }

    pub fn empty() -> Self {
        Self {
            fallers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fallers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fallers.is_empty()
    }

    /// Visible glyphs at `time` seconds on a `cols` x `rows` grid.
    pub fn cells(&self, time: f64, cols: u16, rows: u16) -> Vec<GlyphCell> {
        if cols == 0 || rows == 0 {
            return Vec::new();
        }
        self.fallers
            .iter()
            .filter_map(|f| {
                let progress = f.progress(time)?;
                let opacity = START_OPACITY * (1.0 - progress);
                if opacity < VISIBLE_OPACITY {
                    return None;
                }
                let y = (PATH_START + PATH_SPAN * progress) * rows as f64;
                if y < 0.0 || y >= rows as f64 {
                    return None;
                }
                let width = cell_width(f.glyph);
                if width > cols {
                    return None;
                }
                let col = ((f.column * cols as f64) as u16).min(cols - width);
                Some(GlyphCell {
                    col,
                    row: y as u16,
                    glyph: f.glyph,
                    width,
                    opacity: opacity as f32,
                })
            })
            .collect()
    }
}

/// Terminal columns taken by `ch`: pictographs and dingbats render double width.
pub fn cell_width(ch: char) -> u16 {
    match ch {
        '\u{1F000}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}' => 2,
        _ => 1,
    }
}
