use crate::{PixelBuffer, Rect, Rgba};

const BLUE: Rgba = Rgba::new(59, 130, 246, 255);

fn gradient(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new_filled(width, height, Rgba::WHITE);
    for y in 0..height {
        for x in 0..width {
            buf.set(x, y, Rgba::new(x as u8, y as u8, (x + y) as u8, 255));
        }
    }
    buf
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn new_filled_sets_every_pixel() {
    let buf = PixelBuffer::new_filled(3, 2, BLUE);
    assert_eq!(buf.bytes().len(), 3 * 2 * 4);
    assert!(buf.bytes().chunks_exact(4).all(|px| px == [59, 130, 246, 255]));
}

#[test]
fn from_raw_rejects_wrong_length() {
    assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_err());
    assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn get_checked_handles_negative_and_overflow() {
    let buf = PixelBuffer::new_filled(4, 4, BLUE);
    assert_eq!(buf.get_checked(0, 0), Some(BLUE));
    assert_eq!(buf.get_checked(-1, 0), None);
    assert_eq!(buf.get_checked(4, 0), None);
    assert_eq!(buf.get_checked(0, 4), None);
}

// =============================================================================
// Region operations
// =============================================================================

#[test]
fn fill_rect_clips_to_bounds() {
    let mut buf = PixelBuffer::new_filled(10, 10, Rgba::WHITE);
    buf.fill_rect(Rect::new(8, 8, 5, 5), BLUE);

    assert_eq!(buf.get(9, 9), BLUE);
    assert_eq!(buf.get(8, 8), BLUE);
    assert_eq!(buf.get(7, 8), Rgba::WHITE);
}

#[test]
fn crop_then_blit_restores_region() {
    let src = gradient(20, 20);
    let region = Rect::new(3, 4, 6, 5);
    let patch = src.crop(region).unwrap();
    assert_eq!(patch.width(), 6);
    assert_eq!(patch.get(0, 0), src.get(3, 4));

    let mut dst = PixelBuffer::new_filled(20, 20, Rgba::WHITE);
    dst.blit(&patch, 3, 4);
    assert_eq!(dst.crop(region).unwrap(), patch);
    assert_eq!(dst.get(2, 4), Rgba::WHITE);
}

#[test]
fn crop_out_of_bounds_is_an_error() {
    let buf = gradient(10, 10);
    assert!(buf.crop(Rect::new(5, 5, 6, 2)).is_err());
}

#[test]
fn blit_clips_at_edges() {
    let patch = PixelBuffer::new_filled(5, 5, BLUE);
    let mut dst = PixelBuffer::new_filled(8, 8, Rgba::WHITE);
    dst.blit(&patch, 6, 6);

    assert_eq!(dst.get(7, 7), BLUE);
    assert_eq!(dst.get(5, 7), Rgba::WHITE);
}

#[test]
fn copy_region_from_requires_matching_size() {
    let base = gradient(10, 10);
    let mut surface = PixelBuffer::new_filled(10, 10, Rgba::WHITE);
    surface
        .copy_region_from(&base, Rect::new(2, 2, 3, 3))
        .unwrap();
    assert_eq!(surface.get(3, 3), base.get(3, 3));
    assert_eq!(surface.get(5, 5), Rgba::WHITE);

    let mut small = PixelBuffer::new_filled(4, 4, Rgba::WHITE);
    assert!(small.copy_region_from(&base, Rect::new(0, 0, 2, 2)).is_err());
}

#[test]
fn force_opaque_sets_alpha_only() {
    let mut buf = PixelBuffer::new_filled(2, 2, Rgba::new(1, 2, 3, 40));
    assert!(!buf.is_fully_opaque());
    buf.force_opaque();
    assert!(buf.is_fully_opaque());
    assert_eq!(buf.get(1, 1), Rgba::new(1, 2, 3, 255));
}

// =============================================================================
// Downsampling
// =============================================================================

#[test]
fn downsample_is_noop_under_limit() {
    let buf = gradient(100, 50);
    let (out, scale) = buf.downsampled(1500);
    assert_eq!(scale, 1.0);
    assert_eq!(out, buf);
}

#[test]
fn downsample_caps_longer_side_and_keeps_exact_colors() {
    let mut buf = PixelBuffer::new_filled(3000, 1000, Rgba::WHITE);
    buf.fill_rect(Rect::new(1000, 200, 600, 400), BLUE);

    let (out, scale) = buf.downsampled(1500);
    assert_eq!(out.width(), 1500);
    assert_eq!(out.height(), 500);
    assert!((scale - 0.5).abs() < 1e-6);

    // Nearest sampling never invents intermediate colors.
    assert!(
        out.bytes()
            .chunks_exact(4)
            .all(|px| px == [255, 255, 255, 255] || px == [59, 130, 246, 255])
    );
    assert_eq!(out.get(650, 200), BLUE);
}
