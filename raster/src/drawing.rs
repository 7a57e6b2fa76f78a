//! Drawing primitives for RGBA buffers.
//!
//! Lines are drawn as a sequence of round stamps, which gives round caps and
//! joins like a canvas brush. Colors are composited source-over; the erase
//! variants clear pixels to fully transparent (destination-out with an opaque
//! brush).

use glam::Vec2;

use crate::{PixelBuffer, Rect, Rgba};

/// Applies `paint` to every pixel whose center lies within `radius` of `center`.
fn stamp_disc(buffer: &mut PixelBuffer, center: Vec2, radius: f32, paint: &impl Fn(Rgba) -> Rgba) {
    let radius = radius.max(0.5);
    let r_sq = radius * radius;

    let x_min = (center.x - radius).floor().max(0.0) as i64;
    let y_min = (center.y - radius).floor().max(0.0) as i64;
    let x_max = ((center.x + radius).ceil() as i64).min(buffer.width() as i64 - 1);
    let y_max = ((center.y + radius).ceil() as i64).min(buffer.height() as i64 - 1);

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= r_sq {
                let (x, y) = (x as u32, y as u32);
                let current = buffer.get(x, y);
                buffer.set(x, y, paint(current));
            }
        }
    }
}

/// Clips the segment `start`..`end` to the box `min`..`max` (Liang-Barsky).
/// Runs in f64 so far-off endpoints keep the clipped ends accurate.
fn clip_segment(start: Vec2, end: Vec2, min: Vec2, max: Vec2) -> Option<(Vec2, Vec2)> {
    let (x0, y0) = (start.x as f64, start.y as f64);
    let (dx, dy) = (end.x as f64 - x0, end.y as f64 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, x0 - min.x as f64),
        (dx, max.x as f64 - x0),
        (-dy, y0 - min.y as f64),
        (dy, max.y as f64 - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    if t0 > t1 {
        return None;
    }

    let at = |t: f64| Vec2::new((x0 + dx * t) as f32, (y0 + dy * t) as f32);
    Some((at(t0), at(t1)))
}

fn stamp_line(
    buffer: &mut PixelBuffer,
    start: Vec2,
    end: Vec2,
    thickness: f32,
    paint: &impl Fn(Rgba) -> Rgba,
) {
    if !start.is_finite() || !end.is_finite() {
        return;
    }
    let radius = thickness / 2.0;
    // Stamps farther out than one radius cannot touch the buffer.
    let margin = radius.max(0.5) + 1.0;
    let max = Vec2::new(buffer.width() as f32, buffer.height() as f32) + margin;
    let Some((start, end)) = clip_segment(start, end, Vec2::splat(-margin), max) else {
        return;
    };

    let length = start.distance(end);
    // Half-pixel spacing keeps the stroke gap-free at any thickness.
    let steps = ((length * 2.0).ceil() as usize).max(1);

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(buffer, start.lerp(end, t), radius, paint);
    }
}

/// Draw a filled circle (dot).
pub fn draw_dot(buffer: &mut PixelBuffer, center: Vec2, radius: f32, color: Rgba) {
    stamp_disc(buffer, center, radius, &|dst| color.over(dst));
}

/// Draw a line with round caps.
///
/// Overlapping stamps composite repeatedly, so translucent colors darken
/// along the stroke; the overlay code only draws opaque lines.
pub fn draw_line(buffer: &mut PixelBuffer, start: Vec2, end: Vec2, color: Rgba, thickness: f32) {
    stamp_line(buffer, start, end, thickness, &|dst| color.over(dst));
}

/// Draw a polyline through `points`.
pub fn draw_polyline(buffer: &mut PixelBuffer, points: &[Vec2], color: Rgba, thickness: f32) {
    match points {
        [] => {}
        [single] => draw_dot(buffer, *single, thickness / 2.0, color),
        _ => {
            for pair in points.windows(2) {
                draw_line(buffer, pair[0], pair[1], color, thickness);
            }
        }
    }
}

pub fn erase_dot(buffer: &mut PixelBuffer, center: Vec2, radius: f32) {
    stamp_disc(buffer, center, radius, &|_| Rgba::TRANSPARENT);
}

pub fn erase_line(buffer: &mut PixelBuffer, start: Vec2, end: Vec2, thickness: f32) {
    stamp_line(buffer, start, end, thickness, &|_| Rgba::TRANSPARENT);
}

/// Draw a solid outline along the inside edge of `rect`.
pub fn draw_rect_outline(buffer: &mut PixelBuffer, rect: Rect, color: Rgba, thickness: u32) {
    draw_dashed_rect(buffer, rect, color, thickness, u32::MAX, 0);
}

/// Draw a dashed outline along the inside edge of `rect`.
///
/// The dash pattern runs clockwise from the top-left corner. Every pixel
/// written lies inside `rect`.
pub fn draw_dashed_rect(
    buffer: &mut PixelBuffer,
    rect: Rect,
    color: Rgba,
    thickness: u32,
    dash: u32,
    gap: u32,
) {
    let Some(rect) = rect.clamp_to(buffer.width(), buffer.height()) else {
        return;
    };
    let thickness = thickness.clamp(1, rect.width.min(rect.height).div_ceil(2).max(1));
    let period = dash.saturating_add(gap).max(1) as u64;
    let on = |pos: u64| pos % period < dash as u64;

    let mut paint = |x: u32, y: u32| {
        let dst = buffer.get(x, y);
        buffer.set(x, y, color.over(dst));
    };

    let w = rect.width as u64;
    let h = rect.height as u64;
    for t in 0..thickness {
        for i in 0..rect.width {
            // Top edge runs left to right, bottom edge right to left.
            if on(i as u64) {
                paint(rect.x + i, rect.y + t);
            }
            if on(w + h + (w - 1 - i as u64)) {
                paint(rect.x + i, rect.bottom() - 1 - t);
            }
        }
        for j in 0..rect.height {
            if on(w + j as u64) {
                paint(rect.right() - 1 - t, rect.y + j);
            }
            if on(2 * w + h + (h - 1 - j as u64)) {
                paint(rect.x + t, rect.y + j);
            }
        }
    }
}
