//! Drawing surface abstraction and the in-memory raster behind it.

use glam::Vec2;

use crate::error::{Result, SkyburstError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Parse `RRGGBB` with an optional leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(SkyburstError::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| SkyburstError::InvalidColor(hex.to_string()))
        };

        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    fn to_linear(self) -> [f32; 3] {
        [self.0 as f32, self.1 as f32, self.2 as f32]
    }
}

/// A 2D raster the fireworks engine paints onto.
///
/// Fills are source-over blended using the current global alpha, like a
/// canvas 2D context.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn set_global_alpha(&mut self, alpha: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb);
}

/// Floating point RGB framebuffer.
pub struct Raster {
    width: u32,
    height: u32,
    alpha: f32,
    pixels: Vec<[f32; 3]>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: 1.0,
            pixels: vec![[0.0; 3]; width as usize * height as usize],
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let [r, g, b] = self.pixels[(y * self.width + x) as usize];
        Some(Rgb(r.round() as u8, g.round() as u8, b.round() as u8))
    }

    /// Per-channel maximum over a rectangular block, clipped to the raster.
    pub fn block_max(&self, x0: u32, y0: u32, w: u32, h: u32) -> Rgb {
        if x0 >= self.width || y0 >= self.height {
            return Rgb::BLACK;
        }
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        let mut out = [0.0f32; 3];
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for px in &self.pixels[row + x0 as usize..row + x1 as usize] {
                out[0] = out[0].max(px[0]);
                out[1] = out[1].max(px[1]);
                out[2] = out[2].max(px[2]);
            }
        }
        Rgb(out[0] as u8, out[1] as u8, out[2] as u8)
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, color: [f32; 3]) {
        let a = self.alpha;
        let px = &mut self.pixels[(y * self.width + x) as usize];
        for c in 0..3 {
            px[c] = px[c] * (1.0 - a) + color[c] * a;
        }
    }
}

impl Surface for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 3]; width as usize * height as usize];
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let x0 = x.max(0.0) as u32;
        let y0 = y.max(0.0) as u32;
        let x1 = ((x + w).max(0.0) as u32).min(self.width);
        let y1 = ((y + h).max(0.0) as u32).min(self.height);
        let color = color.to_linear();
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let r = radius.max(0.5);
        let x0 = (center.x - r).floor().max(0.0) as i64;
        let y0 = (center.y - r).floor().max(0.0) as i64;
        let x1 = ((center.x + r).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((center.y + r).ceil() as i64).min(self.height as i64 - 1);
        let color = color.to_linear();

        for py in y0..=y1 {
            for px in x0..=x1 {
                // Sample at pixel centres
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center;
                if d.length_squared() <= r * r {
                    self.blend(px as u32, py as u32, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_hash_and_bare() {
        assert_eq!(Rgb::from_hex("#FFD700").unwrap(), Rgb(255, 215, 0));
        assert_eq!(Rgb::from_hex("1a1b26").unwrap(), Rgb(0x1a, 0x1b, 0x26));
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert!(Rgb::from_hex("#FFF").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
        assert!(Rgb::from_hex("ééé").is_err());
    }

    #[test]
    fn translucent_overlay_fades_without_clearing() {
        let mut raster = Raster::new(4, 4);
        raster.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::WHITE);
        raster.set_global_alpha(0.5);
        raster.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::BLACK);
        let px = raster.pixel(1, 1).unwrap();
        assert!(px.0 > 100 && px.0 < 150);
    }

    #[test]
    fn circle_is_clipped_to_raster() {
        let mut raster = Raster::new(8, 8);
        raster.fill_circle(Vec2::new(-2.0, -2.0), 3.0, Rgb::WHITE);
        raster.fill_circle(Vec2::new(100.0, 100.0), 3.0, Rgb::WHITE);
        raster.fill_circle(Vec2::new(4.0, 4.0), 1.0, Rgb(255, 0, 0));
        assert_eq!(raster.pixel(4, 4), Some(Rgb(255, 0, 0)));
        assert_eq!(raster.pixel(7, 7), Some(Rgb::BLACK));
    }

    #[test]
    fn block_max_keeps_small_sparks_visible() {
        let mut raster = Raster::new(16, 16);
        raster.fill_circle(Vec2::new(3.5, 3.5), 0.5, Rgb(0, 255, 0));
        assert_eq!(raster.block_max(0, 0, 8, 8), Rgb(0, 255, 0));
        assert_eq!(raster.block_max(8, 8, 8, 8), Rgb::BLACK);
    }

    #[test]
    fn resize_reallocates() {
        let mut raster = Raster::new(2, 2);
        raster.resize(10, 5);
        assert_eq!(raster.size(), (10, 5));
        assert_eq!(raster.pixel(9, 4), Some(Rgb::BLACK));
        assert_eq!(raster.pixel(10, 4), None);
    }
}
