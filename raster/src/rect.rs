//! Axis-aligned pixel rectangles.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
///
/// `x`/`y` is the top-left pixel; `right()`/`bottom()` are exclusive.
/// Both saturate at `u32::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from inclusive pixel extents.
    #[inline]
    pub fn from_extents(left: u32, top: u32, right_incl: u32, bottom_incl: u32) -> Self {
        debug_assert!(left <= right_incl && top <= bottom_incl);
        Self::new(left, top, right_incl - left + 1, bottom_incl - top + 1)
    }

    /// Smallest rectangle spanning two corner points, inclusive of both.
    pub fn spanning(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::from_extents(a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
    }

    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns true if the rectangle is non-empty and fits in a `width`x`height` buffer.
    #[inline]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.right() <= width && self.bottom() <= height
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    #[inline]
    pub fn overlap_area(&self, other: &Rect) -> u64 {
        self.intersection(other).map_or(0, |r| r.area())
    }

    /// Clips the rectangle to a `width`x`height` buffer.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersection(&Rect::new(0, 0, width, height))
    }

    #[inline]
    pub const fn moved_to(&self, x: u32, y: u32) -> Rect {
        Rect::new(x, y, self.width, self.height)
    }

    /// Maps the rectangle from a buffer scaled by `scale` back to the
    /// `width`x`height` source, keeping it inside the source.
    pub fn unscaled(&self, scale: f32, width: u32, height: u32) -> Rect {
        if (scale - 1.0).abs() < f32::EPSILON {
            return *self;
        }

        let map = |v: u32, limit: u32| ((v as f32 / scale).round() as u32).min(limit);
        let left = map(self.x, width.saturating_sub(1));
        let top = map(self.y, height.saturating_sub(1));
        let right = map(self.right(), width).max(left + 1);
        let bottom = map(self.bottom(), height).max(top + 1);

        Rect::new(left, top, right - left, bottom - top)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}
