//! Perceptual color distance and background/border pixel classification.

use raster::{Rgb, Rgba};
use serde::{Deserialize, Serialize};

/// Redmean-weighted Euclidean distance between two colors.
///
/// The red and blue weights shift with the mean red value, which tracks
/// perceived difference better than plain RGB distance. Symmetric, never
/// negative, and zero exactly when the colors are equal.
#[inline]
pub fn redmean_distance(a: Rgb, b: Rgb) -> f32 {
    let r_mean = (a.r as f32 + b.r as f32) / 2.0;
    let dr = a.r as f32 - b.r as f32;
    let dg = a.g as f32 - b.g as f32;
    let db = a.b as f32 - b.b as f32;

    let wr = 2.0 + r_mean / 256.0;
    let wg = 4.0;
    let wb = 2.0 + (255.0 - r_mean) / 256.0;

    (wr * dr * dr + wg * dg * dg + wb * db * db).sqrt()
}

/// Thresholds that separate map background and linework from zone fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelFilter {
    /// All channels above this value is near-white (background, roads, labels).
    pub white_threshold: u8,
    /// All channels below this value is near-black (borders, text).
    pub black_threshold: u8,
    /// Pixels with lower alpha are ignored.
    pub min_alpha: u8,
}

impl Default for PixelFilter {
    fn default() -> Self {
        Self {
            white_threshold: 240,
            black_threshold: 40,
            min_alpha: 128,
        }
    }
}

impl PixelFilter {
    #[inline]
    pub fn is_near_white(&self, px: Rgba) -> bool {
        let t = self.white_threshold;
        px.r > t && px.g > t && px.b > t
    }

    #[inline]
    pub fn is_near_black(&self, px: Rgba) -> bool {
        let t = self.black_threshold;
        px.r < t && px.g < t && px.b < t
    }

    #[inline]
    pub fn is_visible(&self, px: Rgba) -> bool {
        px.a >= self.min_alpha
    }

    /// True for pixels that can never seed a zone block.
    #[inline]
    pub fn rejects_seed(&self, px: Rgba) -> bool {
        !self.is_visible(px) || self.is_near_white(px) || self.is_near_black(px)
    }

    /// Opaque near-black linework inside a block (outlines, labels).
    #[inline]
    pub fn is_border(&self, px: Rgba) -> bool {
        self.is_visible(px) && self.is_near_black(px)
    }
}
