//! RGBA8 raster primitives: pixel buffers, rectangles, codecs and drawing.
//!
//! Everything here works on tightly packed, row-major RGBA8 data. Decoded
//! images of any color type are expanded to RGBA8 on load.

mod color;
pub mod drawing;
mod error;
pub mod io;
mod pixel_buffer;
mod rect;
pub mod source;

pub use color::{Rgb, Rgba};
pub use error::{Error, Result};
pub use pixel_buffer::PixelBuffer;
pub use rect::Rect;
pub use source::{FetchOptions, ImageLocation, load_image};
