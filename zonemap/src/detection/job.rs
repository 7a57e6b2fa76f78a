use common::CancelToken;
use raster::PixelBuffer;

use super::boundary::infer_rect;
use super::dedup::{DedupResolver, Resolution};
use super::scanner::{Seed, find_seed};
use super::visited::VisitedCells;
use super::{Candidate, DetectionError};
use crate::config::DetectionConfig;
use crate::palette::Palette;

/// Progress after one chunk of lattice rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkReport {
    /// First and one-past-last analysis rows covered by the chunk.
    pub rows: (u32, u32),
    pub seeds: usize,
    /// Accepted candidates after the chunk.
    pub accepted: usize,
    /// Fraction of the lattice scanned, in `[0, 1]`.
    pub progress: f32,
    pub finished: bool,
}

/// Incremental detection work driven one chunk at a time.
///
/// [`ScanJob`] is the built-in implementation; hosts can substitute their
/// own detector.
pub trait DetectionTask {
    fn run_chunk(&mut self) -> Result<ChunkReport, DetectionError>;

    /// Removes and returns everything accepted so far.
    fn take_accepted(&mut self) -> Vec<Candidate>;
}

/// Chunked lattice scan over an analysis copy of the source image.
pub struct ScanJob {
    analysis: PixelBuffer,
    scale: f32,
    source_width: u32,
    source_height: u32,
    palette: Palette,
    config: DetectionConfig,
    step: u32,
    visited: VisitedCells,
    resolver: DedupResolver,
    next_row: u32,
    finished: bool,
    cancel: CancelToken,
}

impl std::fmt::Debug for ScanJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanJob")
            .field("scale", &self.scale)
            .field("step", &self.step)
            .field("next_row", &self.next_row)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ScanJob {
    pub fn new(
        source: &PixelBuffer,
        palette: Palette,
        config: DetectionConfig,
        cancel: CancelToken,
    ) -> Result<Self, DetectionError> {
        config.validate()?;
        if source.is_empty() {
            return Err(DetectionError::EmptyImage {
                width: source.width(),
                height: source.height(),
            });
        }

        let (analysis, scale) = source.downsampled(config.max_analysis_dimension);
        let step = config.scan_step(analysis.width());
        let visited = VisitedCells::new(
            analysis.width(),
            analysis.height(),
            step * config.mark_stride_factor,
        );

        tracing::debug!(
            "Scan job: {}x{} source, {}x{} analysis (scale {:.3}), step {}",
            source.width(),
            source.height(),
            analysis.width(),
            analysis.height(),
            scale,
            step
        );

        Ok(Self {
            resolver: DedupResolver::new(config.dedup.clone()),
            analysis,
            scale,
            source_width: source.width(),
            source_height: source.height(),
            palette,
            config,
            step,
            visited,
            next_row: 0,
            finished: false,
            cancel,
        })
    }

    #[inline]
    pub fn step(&self) -> u32 {
        self.step
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn progress(&self) -> f32 {
        if self.finished {
            return 1.0;
        }
        (self.next_row as f32 / self.analysis.height() as f32).clamp(0.0, 1.0)
    }

    pub fn accepted(&self) -> &[Candidate] {
        self.resolver.accepted()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Rewinds to the first lattice row and forgets all accepted candidates.
    pub fn restart(&mut self) {
        self.next_row = 0;
        self.finished = false;
        self.visited.clear();
        self.resolver.clear();
    }

    /// Scans up to `rows_per_chunk` lattice rows.
    pub fn run_chunk(&mut self) -> Result<ChunkReport, DetectionError> {
        if self.cancel.is_cancelled() {
            return Err(DetectionError::Cancelled);
        }

        let start = self.next_row;
        let mut seeds = 0;
        for _ in 0..self.config.rows_per_chunk {
            if self.next_row >= self.analysis.height() {
                break;
            }
            seeds += self.scan_row(self.next_row)?;
            self.next_row += self.step;
        }

        if self.next_row >= self.analysis.height() && !self.finished {
            self.finished = true;
            tracing::info!(
                "Detection finished: {} blocks accepted",
                self.resolver.accepted().len()
            );
        }

        let report = ChunkReport {
            rows: (start, self.next_row.min(self.analysis.height())),
            seeds,
            accepted: self.resolver.accepted().len(),
            progress: self.progress(),
            finished: self.finished,
        };
        tracing::debug!(
            "Scanned rows {}..{}: {} seeds, {} accepted, {:.0}%",
            report.rows.0,
            report.rows.1,
            report.seeds,
            report.accepted,
            report.progress * 100.0
        );
        Ok(report)
    }

    /// Runs the remaining chunks and returns the accepted candidates.
    pub fn run_to_end(mut self) -> Result<Vec<Candidate>, DetectionError> {
        for report in &mut self {
            report?;
        }
        Ok(self.resolver.into_accepted())
    }

    fn scan_row(&mut self, y: u32) -> Result<usize, DetectionError> {
        let mut seeds = 0;
        let mut x = 0;
        while x < self.analysis.width() {
            if !self.visited.is_visited(x, y) {
                let seed = find_seed(
                    &self.analysis,
                    x,
                    y,
                    &self.palette,
                    &self.config.pixel_filter,
                );
                if let Some(seed) = seed {
                    seeds += 1;
                    self.grow_seed(seed)?;
                }
            }
            x += self.step;
        }
        Ok(seeds)
    }

    fn grow_seed(&mut self, seed: Seed) -> Result<(), DetectionError> {
        let entry = self.palette.entry(seed.entry);
        let Some(scan_rect) = infer_rect(
            &self.analysis,
            (seed.x, seed.y),
            seed.reference,
            entry.tolerance,
            &self.config.pixel_filter,
            &self.config.boundary,
        ) else {
            return Ok(());
        };

        let rect = scan_rect.unscaled(self.scale, self.source_width, self.source_height);
        if !rect.fits_within(self.source_width, self.source_height) {
            return Err(DetectionError::OutOfBounds {
                rect,
                width: self.source_width,
                height: self.source_height,
            });
        }

        let candidate = Candidate {
            rect,
            scan_rect,
            label: entry.label.clone(),
            kind: entry.kind,
            color: seed.reference,
        };
        if let Resolution::Accepted { replaced } = self.resolver.offer(candidate) {
            self.visited.mark(scan_rect);
            tracing::trace!(
                "Accepted {} at {} (replaced {})",
                entry.label,
                rect,
                replaced
            );
        }
        Ok(())
    }
}

impl DetectionTask for ScanJob {
    fn run_chunk(&mut self) -> Result<ChunkReport, DetectionError> {
        ScanJob::run_chunk(self)
    }

    fn take_accepted(&mut self) -> Vec<Candidate> {
        self.resolver.take_accepted()
    }
}

/// Yields one report per chunk until the scan finishes. An error or a
/// cancellation is yielded once and ends the iteration.
impl Iterator for ScanJob {
    type Item = Result<ChunkReport, DetectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let report = self.run_chunk();
        if report.is_err() {
            self.finished = true;
        }
        Some(report)
    }
}
