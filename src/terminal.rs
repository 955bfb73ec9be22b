//! Terminal presenter: downsamples the raster into true-colour half-blocks and
//! overlays the caption lines and falling glyphs.

use std::io::{self, Write};

use crate::captions::{CaptionTrack, CueState};
use crate::falling::GlyphCell;
use crate::surface::{Raster, Rgb};

const CURRENT_COLOR: Rgb = Rgb(255, 215, 0);
const PAST_COLOR: Rgb = Rgb(150, 150, 150);
const FUTURE_COLOR: Rgb = Rgb(90, 90, 90);

/// A caption placed on a terminal row.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLine {
    pub row: u16,
    pub text: String,
    pub state: CueState,
}

/// Previous, current and next cue around the active one, centred on the row
/// three quarters down the screen.
pub fn caption_layout(track: &CaptionTrack, rows: u16) -> Vec<CaptionLine> {
    let cues = track.cues();
    if cues.is_empty() || rows < 3 {
        return Vec::new();
    }

    let anchor = (rows as usize * 3 / 4).clamp(1, rows as usize - 2);
    let (first, centre) = match track.current_index() {
        Some(active) => (active.saturating_sub(1), active),
        // Nothing started yet: preview the first cue
        None => (0, 0),
    };

    (first..=centre + 1)
        .filter(|&i| i < cues.len())
        .map(|i| CaptionLine {
            row: (anchor + i - centre) as u16,
            text: cues[i].text.clone(),
            state: track.state_of(i),
        })
        .collect()
}

/// How far the current wish has faded in, from 0 (dim) to 1 (full).
///
/// A wish fades in over `fade` seconds after it turns active and back out over
/// the `fade` seconds before the next one does. Derived from the last polled
/// time alone; a clock jump lands on the matching level.
pub fn caption_emphasis(track: &CaptionTrack, fade: f64) -> f32 {
    let (Some(active), Some(time)) = (track.current_index(), track.last_time()) else {
        return 1.0;
    };
    if !(fade > 0.0) {
        return 1.0;
    }
    let cues = track.cues();
    let lead = track.lead_time();
    let fade_in = (time - (cues[active].start - lead)) / fade;
    let fade_out = cues
        .get(active + 1)
        .map_or(f64::INFINITY, |next| (next.start - lead - time) / fade);
    fade_in.min(fade_out).clamp(0.0, 1.0) as f32
}

/// Everything drawn over the sky in one repaint.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub captions: &'a [CaptionLine],
    /// Fade level of the current caption, see [`caption_emphasis`]
    pub emphasis: f32,
    pub glyphs: &'a [GlyphCell],
}

impl Default for Overlay<'_> {
    fn default() -> Self {
        Self {
            captions: &[],
            emphasis: 1.0,
            glyphs: &[],
        }
    }
}

pub struct Presenter {
    scale: u32,
    output_buf: Vec<u8>,
}

impl Presenter {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            output_buf: Vec::new(),
        }
    }

    pub fn render<W: Write>(
        &mut self,
        out: &mut W,
        raster: &Raster,
        cols: u16,
        rows: u16,
        overlay: &Overlay,
    ) -> io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let s = self.scale;

        for y in 0..rows {
            let line = overlay.captions.iter().find(|l| l.row == y);
            let text: Vec<char> = line
                .map(|l| l.text.chars().take(cols as usize).collect())
                .unwrap_or_default();
            let text_start = (cols as usize).saturating_sub(text.len()) / 2;
            let text_span = text_start..text_start + text.len();
            let glyphs: Vec<&GlyphCell> = overlay
                .glyphs
                .iter()
                .filter(|g| g.row == y)
                // Captions stay legible; glyphs go behind them
                .filter(|g| !overlaps(&text_span, g))
                .collect();

            let mut prev_bg: Option<Rgb> = None;
            let mut prev_fg: Option<Rgb> = None;
            let mut x = 0u16;

            while x < cols {
                let top = raster.block_max(x as u32 * s, y as u32 * 2 * s, s, s);
                let bot = raster.block_max(x as u32 * s, (y as u32 * 2 + 1) * s, s, s);

                let col = x as usize;
                let caption = match line {
                    Some(l) if text_span.contains(&col) => Some((text[col - text_start], l.state)),
                    _ => None,
                };
                let glyph = glyphs.iter().find(|g| g.col == x && x + g.width <= cols);

                let (bg, fg, ch, advance) = match (caption, glyph) {
                    // Darken the sky behind text so it stays readable
                    (Some((ch, state)), _) => {
                        (dim(top, bot), style_color(state, overlay.emphasis), ch, 1)
                    }
                    (None, Some(g)) => (top, bot, g.glyph, g.width),
                    (None, None) => (top, bot, '▄', 1),
                };

                if prev_bg != Some(bg) {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2)?;
                    prev_bg = Some(bg);
                }
                if prev_fg != Some(fg) {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
                    prev_fg = Some(fg);
                }

                let bold = matches!(caption, Some((_, CueState::Current)));
                if bold {
                    self.output_buf.extend_from_slice(b"\x1b[1m");
                }
                let mut utf8 = [0u8; 4];
                self.output_buf.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                if bold {
                    self.output_buf.extend_from_slice(b"\x1b[22m");
                }
                x += advance.max(1);
            }

            self.output_buf.extend_from_slice(b"\x1b[0m");
            if y + 1 < rows {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()
    }
}

fn overlaps(span: &std::ops::Range<usize>, glyph: &GlyphCell) -> bool {
    let start = glyph.col as usize;
    start < span.end && span.start < start + glyph.width as usize
}

fn style_color(state: CueState, emphasis: f32) -> Rgb {
    match state {
        CueState::Past => PAST_COLOR,
        CueState::Current => mix(FUTURE_COLOR, CURRENT_COLOR, emphasis),
        CueState::Future => FUTURE_COLOR,
    }
}

fn mix(from: Rgb, to: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

fn dim(a: Rgb, b: Rgb) -> Rgb {
    let avg = |x: u8, y: u8| ((x as u16 + y as u16) / 6) as u8;
    Rgb(avg(a.0, b.0), avg(a.1, b.1), avg(a.2, b.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::Cue;
    use crate::surface::Surface;

    fn track_at(time: f64) -> CaptionTrack {
        let mut track = CaptionTrack::new();
        track.attach(
            Box::new(move || Some(time)),
            vec![Cue::new(0.0, "one"), Cue::new(4.0, "two"), Cue::new(9.0, "three")],
        );
        track.poll();
        track
    }

    #[test]
    fn layout_shows_neighbours_of_active_cue() {
        let lines = caption_layout(&track_at(5.0), 20);
        let texts: Vec<(&str, CueState)> = lines.iter().map(|l| (l.text.as_str(), l.state)).collect();
        assert_eq!(
            texts,
            vec![("one", CueState::Past), ("two", CueState::Current), ("three", CueState::Future)]
        );
        assert_eq!(lines[1].row, 15);
        assert_eq!(lines[0].row + 1, lines[1].row);
    }

    #[test]
    fn layout_before_start_previews_first_cue() {
        let mut track = CaptionTrack::new();
        track.attach(Box::new(|| Some(0.0)), vec![Cue::new(2.0, "soon"), Cue::new(5.0, "later")]);
        track.poll();
        let lines = caption_layout(&track, 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "soon");
        assert_eq!(lines[0].state, CueState::Future);
    }

    #[test]
    fn layout_at_last_cue_has_no_next_line() {
        let lines = caption_layout(&track_at(30.0), 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].state, CueState::Current);
    }

    #[test]
    fn render_paints_blocks() {
        let mut raster = Raster::new(8, 8);
        raster.fill_rect(0.0, 0.0, 2.0, 2.0, Rgb(255, 0, 0));
        let mut presenter = Presenter::new(2);
        let mut out = Vec::new();
        presenter.render(&mut out, &raster, 4, 2, &Overlay::default()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[H"));
        assert!(text.contains("\x1b[48;2;255;0;0m"));
        assert_eq!(text.matches('▄').count(), 8);
        assert_eq!(text.matches("\r\n").count(), 1);
    }

    fn render_track(track: &CaptionTrack, emphasis: f32) -> String {
        let raster = Raster::new(40, 40);
        let lines = caption_layout(track, 20);
        let overlay = Overlay {
            captions: &lines,
            emphasis,
            glyphs: &[],
        };
        let mut out = Vec::new();
        Presenter::new(1).render(&mut out, &raster, 40, 20, &overlay).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn render_writes_current_caption_in_bold_gold() {
        let text = render_track(&track_at(5.0), 1.0);
        assert!(text.contains("\x1b[38;2;255;215;0m"));
        assert!(text.contains("\x1b[1mt\x1b[22m"));
    }

    #[test]
    fn faded_out_caption_is_dim() {
        let text = render_track(&track_at(5.0), 0.0);
        assert!(!text.contains("\x1b[38;2;255;215;0m"));
        assert!(text.contains("\x1b[38;2;90;90;90m\x1b[1mt"));
    }

    fn emphasis_at(time: f64) -> f32 {
        caption_emphasis(&track_at(time), 1.0)
    }

    #[test]
    fn wish_fades_in_then_out_before_the_next() {
        // "two" turns active at 3.8 and "three" at 8.8
        assert!((emphasis_at(4.3) - 0.5).abs() < 1e-5);
        assert_eq!(emphasis_at(6.0), 1.0);
        assert!((emphasis_at(8.5) - 0.3).abs() < 1e-5);
        // Last wish never fades out
        assert_eq!(emphasis_at(30.0), 1.0);
        assert_eq!(caption_emphasis(&track_at(8.5), 0.0), 1.0);
    }

    #[test]
    fn emphasis_without_active_cue_is_full() {
        let mut track = CaptionTrack::new();
        track.attach(Box::new(|| Some(0.0)), vec![Cue::new(2.0, "soon")]);
        track.poll();
        assert_eq!(caption_emphasis(&track, 1.0), 1.0);
    }

    fn glyph(col: u16, ch: char) -> GlyphCell {
        GlyphCell {
            col,
            row: 0,
            glyph: ch,
            width: crate::falling::cell_width(ch),
            opacity: 0.8,
        }
    }

    #[test]
    fn wide_glyph_replaces_two_cells() {
        let raster = Raster::new(10, 4);
        let glyphs = [glyph(3, '🌸')];
        let overlay = Overlay {
            glyphs: &glyphs,
            ..Default::default()
        };
        let mut out = Vec::new();
        Presenter::new(1).render(&mut out, &raster, 10, 2, &overlay).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('🌸').count(), 1);
        assert_eq!(text.matches('▄').count(), 18);
    }

    #[test]
    fn captions_hide_glyphs_beneath_them() {
        let raster = Raster::new(10, 4);
        let lines = [CaptionLine {
            row: 0,
            text: "hello".into(),
            state: CueState::Current,
        }];
        // Caption covers columns 2..7
        let glyphs = [glyph(3, '🌸'), glyph(8, '🧧')];
        let overlay = Overlay {
            captions: &lines,
            emphasis: 1.0,
            glyphs: &glyphs,
        };
        let mut out = Vec::new();
        Presenter::new(1).render(&mut out, &raster, 10, 2, &overlay).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains('🌸'));
        assert!(text.contains('🧧'));
        assert!(text.contains("\x1b[1mh\x1b[22m"));
    }
}
