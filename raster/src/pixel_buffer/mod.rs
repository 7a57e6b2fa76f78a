#[cfg(test)]
mod tests;

use crate::{Error, Rect, Result, Rgba};

const CHANNELS: usize = 4;

/// Tightly packed, row-major RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    pub fn new_filled(width: u32, height: u32, color: Rgba) -> Self {
        let px: [u8; 4] = color.into();
        let data = px.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(Error::InvalidBuffer(format!(
                "bytes length {} does not match expected size {} for {}x{} RGBA",
                data.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba {
        let i = self.offset(x, y);
        Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        )
    }

    /// Bounds-checked variant of [`PixelBuffer::get`] taking signed coordinates.
    #[inline]
    pub fn get_checked(&self, x: i64, y: i64) -> Option<Rgba> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.get(x as u32, y as u32))
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&<[u8; 4]>::from(color));
    }

    #[inline]
    fn row_span(&self, rect: &Rect, y: u32) -> std::ops::Range<usize> {
        let start = self.offset(rect.x, y);
        start..start + rect.width as usize * CHANNELS
    }

    fn check_region(&self, region: &Rect) -> Result<()> {
        if region.fits_within(self.width, self.height) {
            Ok(())
        } else {
            Err(Error::RegionOutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Fills the part of `rect` that lies inside the buffer.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(rect) = rect.clamp_to(self.width, self.height) else {
            return;
        };

        let px: [u8; 4] = color.into();
        for y in rect.y..rect.bottom() {
            let span = self.row_span(&rect, y);
            for chunk in self.data[span].chunks_exact_mut(CHANNELS) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    /// Copies `region` out into a new buffer.
    pub fn crop(&self, region: Rect) -> Result<PixelBuffer> {
        self.check_region(&region)?;

        let mut data = Vec::with_capacity(region.area() as usize * CHANNELS);
        for y in region.y..region.bottom() {
            data.extend_from_slice(&self.data[self.row_span(&region, y)]);
        }

        PixelBuffer::from_raw(region.width, region.height, data)
    }

    /// Copies `region` from `source` into the same position of `self`.
    ///
    /// Both buffers must have identical dimensions.
    pub fn copy_region_from(&mut self, source: &PixelBuffer, region: Rect) -> Result<()> {
        if source.width != self.width || source.height != self.height {
            return Err(Error::InvalidBuffer(format!(
                "source is {}x{}, destination is {}x{}",
                source.width, source.height, self.width, self.height
            )));
        }
        let Some(region) = region.clamp_to(self.width, self.height) else {
            return Ok(());
        };

        for y in region.y..region.bottom() {
            let span = self.row_span(&region, y);
            self.data[span.clone()].copy_from_slice(&source.data[span]);
        }
        Ok(())
    }

    /// Overwrites pixels with `patch` placed at (`x`, `y`), clipping at the edges.
    pub fn blit(&mut self, patch: &PixelBuffer, x: u32, y: u32) {
        let target = Rect::new(x, y, patch.width, patch.height);
        let Some(visible) = target.clamp_to(self.width, self.height) else {
            return;
        };

        let src_rect = Rect::new(0, 0, visible.width, visible.height);
        for row in 0..visible.height {
            let dst = self.row_span(&visible, visible.y + row);
            let src = patch.row_span(&src_rect, row);
            self.data[dst].copy_from_slice(&patch.data[src]);
        }
    }

    /// Sets every alpha sample to 255.
    pub fn force_opaque(&mut self) {
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px[3] = 255;
        }
    }

    pub fn is_fully_opaque(&self) -> bool {
        self.data.chunks_exact(CHANNELS).all(|px| px[3] == 255)
    }

    /// Returns a nearest-neighbour copy whose longer side is at most
    /// `max_dimension`, together with the applied scale (`<= 1.0`).
    ///
    /// Nearest-neighbour sampling keeps every output pixel an exact input
    /// color, which palette matching relies on.
    pub fn downsampled(&self, max_dimension: u32) -> (PixelBuffer, f32) {
        let longer = self.width.max(self.height);
        if max_dimension == 0 || longer <= max_dimension {
            return (self.clone(), 1.0);
        }

        let scale = max_dimension as f32 / longer as f32;
        let out_w = ((self.width as f32 * scale).round() as u32).max(1);
        let out_h = ((self.height as f32 * scale).round() as u32).max(1);

        let mut data = Vec::with_capacity(out_w as usize * out_h as usize * CHANNELS);
        for oy in 0..out_h {
            let sy = (((oy as f32 + 0.5) / scale) as u32).min(self.height - 1);
            for ox in 0..out_w {
                let sx = (((ox as f32 + 0.5) / scale) as u32).min(self.width - 1);
                let i = self.offset(sx, sy);
                data.extend_from_slice(&self.data[i..i + CHANNELS]);
            }
        }

        let buffer = PixelBuffer {
            width: out_w,
            height: out_h,
            data,
        };
        (buffer, scale)
    }

    pub fn to_rgba_image(&self) -> image_lib::RgbaImage {
        image_lib::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| unreachable!("PixelBuffer length always matches its dimensions"))
    }
}

impl From<image_lib::RgbaImage> for PixelBuffer {
    fn from(img: image_lib::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}
