use glam::Vec2;
use raster::{PixelBuffer, Rect, Rgba, drawing};

use crate::config::{Brush, SessionConfig};
use crate::registry::BlockRegistry;

/// The editable surface plus the pristine base image it started from.
///
/// Every operation writes `surface` only and returns once the pixels are in
/// place. `base` is kept to restore areas a dragged block leaves behind.
#[derive(Debug, Clone)]
pub struct Canvas {
    base: PixelBuffer,
    surface: PixelBuffer,
}

impl Canvas {
    pub fn new(base: PixelBuffer) -> Self {
        Self {
            surface: base.clone(),
            base,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn base(&self) -> &PixelBuffer {
        &self.base
    }

    pub fn surface(&self) -> &PixelBuffer {
        &self.surface
    }

    /// Swaps in a surface recorded earlier, e.g. from history.
    pub fn replace_surface(&mut self, surface: PixelBuffer) -> raster::Result<()> {
        if surface.width() != self.width() || surface.height() != self.height() {
            return Err(raster::Error::InvalidBuffer(format!(
                "surface is {}x{}, canvas is {}x{}",
                surface.width(),
                surface.height(),
                self.width(),
                self.height()
            )));
        }
        self.surface = surface;
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.surface.fill_rect(rect, color);
    }

    /// Fills `rect` with the background and a dashed marker outline, the
    /// placeholder shown where a block was lifted.
    pub fn fill_with_marker(&mut self, rect: Rect, config: &SessionConfig) {
        self.surface.fill_rect(rect, config.background);
        drawing::draw_dashed_rect(
            &mut self.surface,
            rect,
            config.marker_color,
            config.outline_thickness,
            config.dash,
            config.gap,
        );
    }

    pub fn draw_drag_outline(&mut self, rect: Rect, config: &SessionConfig) {
        drawing::draw_dashed_rect(
            &mut self.surface,
            rect,
            config.drag_outline_color,
            config.outline_thickness,
            config.dash,
            config.gap,
        );
    }

    /// Copies base pixels back over `rect`.
    pub fn restore_from_base(&mut self, rect: Rect) -> raster::Result<()> {
        self.surface.copy_region_from(&self.base, rect)
    }

    /// Copies `rect` of `source`, a full-size snapshot of an earlier
    /// surface, back onto the surface.
    pub fn restore_from(&mut self, source: &PixelBuffer, rect: Rect) -> raster::Result<()> {
        self.surface.copy_region_from(source, rect)
    }

    pub fn paste(&mut self, patch: &PixelBuffer, x: u32, y: u32) {
        self.surface.blit(patch, x, y);
    }

    /// Copies `rect` out of the surface with every pixel forced opaque.
    pub fn capture_opaque(&self, rect: Rect) -> raster::Result<PixelBuffer> {
        let mut patch = self.surface.crop(rect)?;
        patch.force_opaque();
        Ok(patch)
    }

    pub fn stroke(&mut self, from: Vec2, to: Vec2, brush: &Brush) {
        if from == to {
            drawing::draw_dot(&mut self.surface, to, brush.width / 2.0, brush.color);
        } else {
            drawing::draw_line(&mut self.surface, from, to, brush.color, brush.width);
        }
    }

    pub fn erase(&mut self, from: Vec2, to: Vec2, width: f32) {
        if from == to {
            drawing::erase_dot(&mut self.surface, to, width / 2.0);
        } else {
            drawing::erase_line(&mut self.surface, from, to, width);
        }
    }
}

/// Canvas pixels and the blocks drawn on them, kept in step.
#[derive(Debug, Clone)]
pub struct Document {
    pub canvas: Canvas,
    pub registry: BlockRegistry,
}

impl Document {
    pub fn new(base: PixelBuffer) -> Self {
        let registry = BlockRegistry::new(base.width(), base.height());
        Self {
            canvas: Canvas::new(base),
            registry,
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgba = Rgba::new(59, 130, 246, 255);

    fn canvas() -> Canvas {
        let mut base = PixelBuffer::new_filled(60, 40, Rgba::WHITE);
        base.fill_rect(Rect::new(10, 10, 20, 10), BLUE);
        Canvas::new(base)
    }

    #[test]
    fn marker_fill_hides_block_and_restore_brings_it_back() {
        let mut canvas = canvas();
        let config = SessionConfig::default();
        let rect = Rect::new(10, 10, 20, 10);

        canvas.fill_with_marker(rect, &config);
        assert_eq!(canvas.surface().get(20, 15), config.background);
        assert_eq!(canvas.surface().get(10, 10), config.marker_color);
        assert_eq!(canvas.base().get(20, 15), BLUE);

        canvas.restore_from_base(rect).unwrap();
        assert_eq!(canvas.surface(), canvas.base());
    }

    #[test]
    fn restore_from_snapshot_keeps_surface_edits() {
        let mut canvas = canvas();
        let config = SessionConfig::default();
        canvas.fill_rect(Rect::new(40, 20, 10, 10), Rgba::BLACK);
        let snapshot = canvas.surface().clone();

        canvas.fill_with_marker(Rect::new(35, 15, 20, 20), &config);
        canvas
            .restore_from(&snapshot, Rect::new(35, 15, 20, 20))
            .unwrap();
        assert_eq!(canvas.surface().get(45, 25), Rgba::BLACK);
        assert_eq!(canvas.surface(), &snapshot);

        let small = PixelBuffer::new_filled(5, 5, Rgba::WHITE);
        assert!(canvas.restore_from(&small, Rect::new(0, 0, 2, 2)).is_err());
    }

    #[test]
    fn capture_forces_alpha() {
        let mut base = PixelBuffer::new_filled(10, 10, Rgba::new(59, 130, 246, 90));
        base.set(0, 0, Rgba::TRANSPARENT);
        let canvas = Canvas::new(base);

        let patch = canvas.capture_opaque(Rect::new(0, 0, 4, 4)).unwrap();
        assert!(patch.is_fully_opaque());
        assert_eq!(patch.get(1, 1), BLUE);
        assert!(canvas.capture_opaque(Rect::new(8, 8, 4, 4)).is_err());
    }

    #[test]
    fn erase_clears_to_transparent() {
        let mut canvas = canvas();
        canvas.erase(Vec2::new(12.0, 15.0), Vec2::new(28.0, 15.0), 4.0);
        assert_eq!(canvas.surface().get(20, 15), Rgba::TRANSPARENT);
        assert_eq!(canvas.base().get(20, 15), BLUE);
    }

    #[test]
    fn single_point_stroke_leaves_a_dot() {
        let mut canvas = canvas();
        let brush = Brush {
            color: Rgba::BLACK,
            width: 6.0,
        };
        canvas.stroke(Vec2::new(45.0, 30.0), Vec2::new(45.0, 30.0), &brush);
        assert_eq!(canvas.surface().get(45, 30), Rgba::BLACK);
    }

    #[test]
    fn replace_surface_checks_dimensions() {
        let mut canvas = canvas();
        assert!(
            canvas
                .replace_surface(PixelBuffer::new_filled(5, 5, Rgba::WHITE))
                .is_err()
        );
        canvas
            .replace_surface(PixelBuffer::new_filled(60, 40, Rgba::BLACK))
            .unwrap();
        assert_eq!(canvas.surface().get(0, 0), Rgba::BLACK);
    }
}
