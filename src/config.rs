//! TOML configuration.
//!
//! Every field has a default so a partial file, or no file at all, works.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::captions::Cue;
use crate::error::{Result, SkyburstError};
use crate::fireworks::BurstShape;
use crate::random::WeightedTable;
use crate::surface::Rgb;

/// Upper bound on raster pixels per cell edge; the raster grows with its square.
pub const MAX_PIXEL_SCALE: u32 = 16;
/// Upper bound on falling glyphs
pub const MAX_FALLING: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fireworks: FireworksConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub captions: CaptionConfig,
    #[serde(default)]
    pub falling: FallingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireworksConfig {
    /// Per-frame chance of launching a rocket
    #[serde(default = "FireworksConfig::default_spawn_probability")]
    pub spawn_probability: f32,
    /// Opacity of the black overlay drawn each frame; higher = shorter trails
    #[serde(default = "FireworksConfig::default_trail_alpha")]
    pub trail_alpha: f32,
    #[serde(default = "FireworksConfig::default_rocket_gravity")]
    pub rocket_gravity: f32,
    #[serde(default = "FireworksConfig::default_particle_gravity")]
    pub particle_gravity: f32,
    /// Multiplicative air resistance per axis per frame
    #[serde(default = "FireworksConfig::default_drag")]
    pub drag: f32,
    #[serde(default = "FireworksConfig::default_palette")]
    pub palette: Vec<String>,
    #[serde(default)]
    pub shape_weights: ShapeWeights,
}

impl FireworksConfig {
    fn default_spawn_probability() -> f32 {
        0.05
    }
    fn default_trail_alpha() -> f32 {
        0.2
    }
    fn default_rocket_gravity() -> f32 {
        0.15
    }
    fn default_particle_gravity() -> f32 {
        0.05
    }
    fn default_drag() -> f32 {
        0.99
    }
    fn default_palette() -> Vec<String> {
        ["#FF0000", "#FFD700", "#FFA500", "#00FF00", "#00FFFF", "#FF00FF", "#FFFFFF"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn parsed_palette(&self) -> Result<Vec<Rgb>> {
        self.palette.iter().map(|hex| Rgb::from_hex(hex)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("fireworks.spawn_probability", self.spawn_probability)?;
        check_unit("fireworks.trail_alpha", self.trail_alpha)?;
        if !(self.drag > 0.0 && self.drag <= 1.0) {
            return Err(SkyburstError::InvalidConfig(format!(
                "fireworks.drag must be in (0, 1], got {}",
                self.drag
            )));
        }
        if !self.rocket_gravity.is_finite() || !self.particle_gravity.is_finite() {
            return Err(SkyburstError::InvalidConfig(
                "fireworks gravity must be finite".into(),
            ));
        }
        if self.palette.is_empty() {
            return Err(SkyburstError::InvalidConfig(
                "fireworks.palette must not be empty".into(),
            ));
        }
        self.parsed_palette()?;
        self.shape_weights.table()?;
        Ok(())
    }
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            spawn_probability: Self::default_spawn_probability(),
            trail_alpha: Self::default_trail_alpha(),
            rocket_gravity: Self::default_rocket_gravity(),
            particle_gravity: Self::default_particle_gravity(),
            drag: Self::default_drag(),
            palette: Self::default_palette(),
            shape_weights: ShapeWeights::default(),
        }
    }
}

/// Relative selection weights of the burst shapes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShapeWeights {
    #[serde(default = "ShapeWeights::default_sphere")]
    pub sphere: u32,
    #[serde(default = "ShapeWeights::default_other")]
    pub heart: u32,
    #[serde(default = "ShapeWeights::default_other")]
    pub ring: u32,
    #[serde(default = "ShapeWeights::default_other")]
    pub star: u32,
}

impl ShapeWeights {
    fn default_sphere() -> u32 {
        70
    }
    fn default_other() -> u32 {
        10
    }

    pub fn table(&self) -> Result<WeightedTable<BurstShape>> {
        WeightedTable::new(vec![
            (BurstShape::Sphere, self.sphere),
            (BurstShape::Heart, self.heart),
            (BurstShape::Ring, self.ring),
            (BurstShape::Star, self.star),
        ])
        .ok_or_else(|| {
            SkyburstError::InvalidConfig("fireworks.shape_weights are all zero".into())
        })
    }
}

impl Default for ShapeWeights {
    fn default() -> Self {
        Self {
            sphere: Self::default_sphere(),
            heart: Self::default_other(),
            ring: Self::default_other(),
            star: Self::default_other(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Raster pixels per terminal half-block cell edge
    #[serde(default = "DisplayConfig::default_pixel_scale")]
    pub pixel_scale: u32,
    #[serde(default = "DisplayConfig::default_fps")]
    pub fps: f32,
    #[serde(default = "DisplayConfig::default_background")]
    pub background: String,
}

impl DisplayConfig {
    fn default_pixel_scale() -> u32 {
        8
    }
    fn default_fps() -> f32 {
        60.0
    }
    fn default_background() -> String {
        "#000000".to_string()
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            pixel_scale: Self::default_pixel_scale(),
            fps: Self::default_fps(),
            background: Self::default_background(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default)]
    pub muted: bool,
    /// Explosion clips; one is picked at random per burst
    #[serde(default)]
    pub explosions: Vec<String>,
    /// Background track whose playback position drives the captions
    #[serde(default)]
    pub music: Option<String>,
    /// Number of overlapping explosion voices
    #[serde(default = "SoundConfig::default_pool_size")]
    pub pool_size: usize,
    /// Seconds of silent media clock before falling back to wall time
    #[serde(default = "SoundConfig::default_fallback_after")]
    pub fallback_after: f64,
}

impl SoundConfig {
    fn default_pool_size() -> usize {
        5
    }
    fn default_fallback_after() -> f64 {
        3.0
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            muted: false,
            explosions: Vec::new(),
            music: None,
            pool_size: Self::default_pool_size(),
            fallback_after: Self::default_fallback_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Seconds a cue turns active ahead of its timestamp
    #[serde(default = "CaptionConfig::default_lead_time")]
    pub lead_time: f64,
    /// Wrap the clock with this period so the wishes repeat
    #[serde(default)]
    pub loop_after: Option<f64>,
    /// Seconds the current wish takes to fade in, and to fade out before the next
    #[serde(default = "CaptionConfig::default_fade")]
    pub fade: f64,
    #[serde(default = "CaptionConfig::default_cues")]
    pub cues: Vec<Cue>,
}

impl CaptionConfig {
    fn default_lead_time() -> f64 {
        0.2
    }
    fn default_fade() -> f64 {
        1.0
    }
    fn default_cues() -> Vec<Cue> {
        [
            (0.0, "Chúc Mừng Năm Mới · Happy New Year"),
            (4.0, "An Khang Thịnh Vượng · Peace and Prosperity"),
            (8.0, "Vạn Sự Như Ý · May All Go as You Wish"),
            (12.0, "Sức Khỏe Dồi Dào · Abundant Health"),
            (16.0, "Tấn Tài Tấn Lộc · Fortune and Luck"),
            (20.0, "Hạnh Phúc Bên Gia Đình · Happiness with Family"),
        ]
        .into_iter()
        .map(|(start, text)| Cue::new(start, text))
        .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lead_time.is_finite() && self.lead_time >= 0.0) {
            return Err(SkyburstError::InvalidConfig(format!(
                "captions.lead_time must be a non-negative number, got {}",
                self.lead_time
            )));
        }
        if !(self.fade.is_finite() && self.fade >= 0.0) {
            return Err(SkyburstError::InvalidConfig(format!(
                "captions.fade must be a non-negative number, got {}",
                self.fade
            )));
        }
        if let Some(period) = self.loop_after {
            if !(period.is_finite() && period > 0.0) {
                return Err(SkyburstError::InvalidConfig(format!(
                    "captions.loop_after must be positive, got {period}"
                )));
            }
        }
        for (i, cue) in self.cues.iter().enumerate() {
            if !cue.start.is_finite() {
                return Err(SkyburstError::InvalidConfig(format!(
                    "captions.cues[{i}].start is not finite"
                )));
            }
            if i > 0 && cue.start < self.cues[i - 1].start {
                return Err(SkyburstError::InvalidConfig(format!(
                    "captions.cues must be sorted by start; cue {i} ({}) precedes cue {} ({})",
                    cue.start,
                    i - 1,
                    self.cues[i - 1].start
                )));
            }
        }
        Ok(())
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            lead_time: Self::default_lead_time(),
            loop_after: None,
            fade: Self::default_fade(),
            cues: Self::default_cues(),
        }
    }
}

/// Festive glyphs drifting down behind the captions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingConfig {
    #[serde(default = "FallingConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "FallingConfig::default_count")]
    pub count: usize,
    /// Drawn in turn; each is a single character
    #[serde(default = "FallingConfig::default_glyphs")]
    pub glyphs: Vec<char>,
}

impl FallingConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_count() -> usize {
        25
    }
    fn default_glyphs() -> Vec<char> {
        crate::falling::DEFAULT_GLYPHS.to_vec()
    }

    pub fn validate(&self) -> Result<()> {
        if self.count > MAX_FALLING {
            return Err(SkyburstError::InvalidConfig(format!(
                "falling.count must be at most {MAX_FALLING}, got {}",
                self.count
            )));
        }
        if self.enabled && self.count > 0 && self.glyphs.is_empty() {
            return Err(SkyburstError::InvalidConfig(
                "falling.glyphs must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FallingConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            count: Self::default_count(),
            glyphs: Self::default_glyphs(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.fireworks.validate()?;
        self.captions.validate()?;
        if !(1..=MAX_PIXEL_SCALE).contains(&self.display.pixel_scale) {
            return Err(SkyburstError::InvalidConfig(format!(
                "display.pixel_scale must be in 1..={MAX_PIXEL_SCALE}, got {}",
                self.display.pixel_scale
            )));
        }
        if !(self.display.fps.is_finite() && self.display.fps > 0.0) {
            return Err(SkyburstError::InvalidConfig(format!(
                "display.fps must be positive, got {}",
                self.display.fps
            )));
        }
        Rgb::from_hex(&self.display.background)?;
        self.falling.validate()?;
        if self.sound.pool_size == 0 {
            return Err(SkyburstError::InvalidConfig(
                "sound.pool_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn check_unit(field: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SkyburstError::InvalidConfig(format!(
            "{field} must be in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.fireworks.parsed_palette().unwrap().len(), 7);
        assert!((config.captions.lead_time - 0.2).abs() < 1e-12);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert!((config.fireworks.spawn_probability - 0.05).abs() < 1e-6);
        assert_eq!(config.display.pixel_scale, 8);
        assert_eq!(config.sound.pool_size, 5);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let text = r#"
            [fireworks]
            trail_alpha = 0.5

            [fireworks.shape_weights]
            heart = 0

            [[captions.cues]]
            start = 0.0
            text = "a"

            [[captions.cues]]
            start = 4.0
            text = "b"
        "#;
        let config = AppConfig::from_toml_str(text).unwrap();
        assert!((config.fireworks.trail_alpha - 0.5).abs() < 1e-6);
        assert!((config.fireworks.drag - 0.99).abs() < 1e-6);
        assert_eq!(config.fireworks.shape_weights.heart, 0);
        assert_eq!(config.fireworks.shape_weights.sphere, 70);
        assert_eq!(config.captions.cues.len(), 2);
        assert_eq!(config.captions.cues[1].text, "b");
    }

    #[test]
    fn unsorted_cues_rejected() {
        let text = r#"
            [[captions.cues]]
            start = 5.0
            text = "late"

            [[captions.cues]]
            start = 1.0
            text = "early"
        "#;
        let err = AppConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, SkyburstError::InvalidConfig(_)));
    }

    #[test]
    fn bad_palette_rejected() {
        let text = r##"
            [fireworks]
            palette = ["#FF0000", "not-a-color"]
        "##;
        let err = AppConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, SkyburstError::InvalidColor(_)));
    }

    #[test]
    fn out_of_range_values_rejected() {
        assert!(AppConfig::from_toml_str("[fireworks]\nspawn_probability = 1.5").is_err());
        assert!(AppConfig::from_toml_str("[fireworks]\ndrag = 0.0").is_err());
        assert!(AppConfig::from_toml_str("[display]\npixel_scale = 0").is_err());
        assert!(
            AppConfig::from_toml_str(
                "[fireworks.shape_weights]\nsphere = 0\nheart = 0\nring = 0\nstar = 0"
            )
            .is_err()
        );
    }

    #[test]
    fn pixel_scale_is_bounded() {
        assert!(AppConfig::from_toml_str("[display]\npixel_scale = 16").is_ok());
        let err = AppConfig::from_toml_str("[display]\npixel_scale = 1000").unwrap_err();
        assert!(matches!(err, SkyburstError::InvalidConfig(_)));
    }

    #[test]
    fn falling_section() {
        let config = AppConfig::from_toml_str("[falling]\ncount = 3\nglyphs = [\"*\", \"🌸\"]").unwrap();
        assert!(config.falling.enabled);
        assert_eq!(config.falling.glyphs, vec!['*', '🌸']);
        assert_eq!(AppConfig::default().falling.count, 25);

        assert!(AppConfig::from_toml_str("[falling]\nglyphs = []").is_err());
        assert!(AppConfig::from_toml_str("[falling]\ncount = 100000").is_err());
        assert!(AppConfig::from_toml_str("[falling]\nenabled = false\nglyphs = []").is_ok());
        assert!(AppConfig::from_toml_str("[falling]\nglyphs = [\"ab\"]").is_err());
    }

    #[test]
    fn negative_fade_rejected() {
        assert!(AppConfig::from_toml_str("[captions]\nfade = -1.0").is_err());
        assert!((AppConfig::default().captions.fade - 1.0).abs() < 1e-12);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = AppConfig::from_toml_str("[fireworks\n").unwrap_err();
        assert!(matches!(err, SkyburstError::ConfigParse(_)));
    }
}
