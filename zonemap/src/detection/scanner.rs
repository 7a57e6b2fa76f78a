use raster::{PixelBuffer, Rgb};

use crate::color_match::PixelFilter;
use crate::palette::Palette;

/// A lattice pixel that matched a palette entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub x: u32,
    pub y: u32,
    /// Index into the palette's entries.
    pub entry: usize,
    pub reference: Rgb,
}

/// Classifies the pixel at (`x`, `y`), skipping background, linework and
/// translucent pixels.
pub fn find_seed(
    buffer: &PixelBuffer,
    x: u32,
    y: u32,
    palette: &Palette,
    filter: &PixelFilter,
) -> Option<Seed> {
    let px = buffer.get(x, y);
    if filter.rejects_seed(px) {
        return None;
    }

    palette.classify(px.rgb()).map(|m| Seed {
        x,
        y,
        entry: m.entry,
        reference: m.reference,
    })
}
