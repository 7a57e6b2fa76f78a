use raster::{PixelBuffer, Rect, Rgb, Rgba};

use crate::color_match::{PixelFilter, redmean_distance};
use crate::config::BoundaryConfig;

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

struct Walker<'a> {
    buffer: &'a PixelBuffer,
    filter: &'a PixelFilter,
    reference: Rgb,
    walk_tolerance: f32,
    offsets: Vec<i64>,
}

impl Walker<'_> {
    fn is_inside(&self, px: Rgba) -> bool {
        if !self.filter.is_visible(px) || self.filter.is_near_white(px) {
            return false;
        }
        if self.filter.is_near_black(px) {
            return true;
        }
        let distance = redmean_distance(px.rgb(), self.reference);
        distance < self.walk_tolerance || distance == 0.0
    }

    /// Samples the strip perpendicular to `axis` at `position`, centred on
    /// `center`. Out-of-bounds samples are never inside.
    fn strip_has_inside(&self, axis: Axis, position: i64, center: i64) -> bool {
        self.offsets.iter().any(|&offset| {
            let (x, y) = match axis {
                Axis::Horizontal => (position, center + offset),
                Axis::Vertical => (center + offset, position),
            };
            self.buffer
                .get_checked(x, y)
                .is_some_and(|px| self.is_inside(px))
        })
    }

    /// Walks from `start` in `direction` until a strip has no inside sample.
    fn walk(&self, axis: Axis, start: i64, direction: i64, center: i64, limit: i64) -> i64 {
        let mut edge = start;
        loop {
            let next = edge + direction;
            if next < 0 || next >= limit || !self.strip_has_inside(axis, next, center) {
                return edge;
            }
            edge = next;
        }
    }
}

/// Infers the rectangle around a seed by walking outward in the four
/// directions.
///
/// Returns `None` when the seed itself is too far from `reference`. The
/// result is in `buffer` coordinates and always lies inside the buffer.
pub fn infer_rect(
    buffer: &PixelBuffer,
    seed: (u32, u32),
    reference: Rgb,
    tolerance: f32,
    filter: &PixelFilter,
    config: &BoundaryConfig,
) -> Option<Rect> {
    let (sx, sy) = seed;
    if sx >= buffer.width() || sy >= buffer.height() {
        return None;
    }

    let seed_distance = redmean_distance(buffer.get(sx, sy).rgb(), reference);
    if seed_distance > config.seed_tolerance_factor * tolerance {
        return None;
    }

    let samples = config.strip_samples.max(1) as i64;
    let spacing = config.strip_spacing.max(1) as i64;
    let offsets = (0..samples)
        .map(|k| (k - (samples - 1) / 2) * spacing)
        .collect();

    let walker = Walker {
        buffer,
        filter,
        reference,
        walk_tolerance: config.walk_tolerance_factor * tolerance,
        offsets,
    };

    let (sx, sy) = (sx as i64, sy as i64);
    let width = buffer.width() as i64;
    let height = buffer.height() as i64;

    let left = walker.walk(Axis::Horizontal, sx, -1, sy, width);
    let right = walker.walk(Axis::Horizontal, sx, 1, sy, width);
    let top = walker.walk(Axis::Vertical, sy, -1, sx, height);
    let bottom = walker.walk(Axis::Vertical, sy, 1, sx, height);

    Some(Rect::from_extents(
        left as u32,
        top as u32,
        right as u32,
        bottom as u32,
    ))
}
