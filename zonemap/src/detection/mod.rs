//! Zone block detection.
//!
//! The pipeline runs on a nearest-neighbour analysis copy of the source:
//! a lattice scan classifies sample pixels against the palette, each match
//! seeds a boundary walk that infers a rectangle, and the dedup resolver
//! keeps one rectangle per physical block. Accepted rectangles are marked in
//! a coarse visited grid so their interiors are not scanned again.
//!
//! Scanning is chunked through [`ScanJob`] so a host can interleave it with
//! frame rendering and cancel it between chunks.

mod boundary;
mod dedup;
mod job;
mod scanner;
mod visited;


pub use boundary::infer_rect;
pub use dedup::{DedupResolver, Resolution};
pub use job::{ChunkReport, DetectionTask, ScanJob};
pub use scanner::{Seed, find_seed};
pub use visited::VisitedCells;

use raster::{PixelBuffer, Rect, Rgb};
use serde::Serialize;

use crate::config::{ConfigError, DetectionConfig};
use crate::palette::{Palette, ZoneKind};
use common::CancelToken;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot scan an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
    #[error("Detected rectangle {rect} does not fit the {width}x{height} source")]
    OutOfBounds { rect: Rect, width: u32, height: u32 },
    #[error("Detection was cancelled")]
    Cancelled,
    #[error("{0}")]
    Task(String),
}

/// A detected zone rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Rectangle in source image coordinates.
    pub rect: Rect,
    /// Rectangle in analysis buffer coordinates.
    #[serde(skip)]
    pub scan_rect: Rect,
    pub label: String,
    pub kind: ZoneKind,
    /// Palette reference color the seed matched.
    pub color: Rgb,
}

/// Runs a complete detection pass without chunking.
pub fn detect_blocks(
    image: &PixelBuffer,
    palette: &Palette,
    config: &DetectionConfig,
) -> Result<Vec<Candidate>, DetectionError> {
    let job = ScanJob::new(image, palette.clone(), config.clone(), CancelToken::new())?;
    job.run_to_end()
}
