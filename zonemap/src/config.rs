//! Configuration for detection, editing and rendering.
//!
//! Every struct has a `Default` matching the calibrated thresholds and can be
//! loaded from YAML or JSON. The detection thresholds were tuned on a small
//! set of planning maps and are expected to need recalibration per source.

use std::path::Path;

use raster::Rgba;
use serde::{Deserialize, Serialize};

use crate::color_match::PixelFilter;
use crate::palette::{Palette, PaletteError};
use crate::render::RenderOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config file extension '{0}'")]
    UnsupportedExtension(String),
    #[error(transparent)]
    Palette(#[from] PaletteError),
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message()))
    }
}

fn ensure_positive(value: f32, name: &str) -> Result<(), ConfigError> {
    ensure(value.is_finite() && value > 0.0, || {
        format!("{} must be positive and finite, got {}", name, value)
    })
}

fn ensure_fraction(value: f32, name: &str) -> Result<(), ConfigError> {
    ensure(value.is_finite() && value > 0.0 && value <= 1.0, || {
        format!("{} must be in (0, 1], got {}", name, value)
    })
}

// =============================================================================
// Boundary walk
// =============================================================================

/// Parameters for growing a rectangle outward from a seed pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Seeds further than this multiple of the entry tolerance are rejected.
    pub seed_tolerance_factor: f32,
    /// Walk samples closer than this multiple of the tolerance count as inside.
    pub walk_tolerance_factor: f32,
    /// Samples per strip, perpendicular to the walk direction.
    pub strip_samples: u32,
    /// Pixel spacing between strip samples.
    pub strip_spacing: u32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            seed_tolerance_factor: 1.5,
            walk_tolerance_factor: 2.0,
            strip_samples: 5,
            strip_spacing: 2,
        }
    }
}

impl BoundaryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive(self.seed_tolerance_factor, "seed_tolerance_factor")?;
        ensure_positive(self.walk_tolerance_factor, "walk_tolerance_factor")?;
        ensure(self.strip_samples >= 1, || {
            "strip_samples must be at least 1".to_string()
        })?;
        ensure(self.strip_spacing >= 1, || {
            "strip_spacing must be at least 1".to_string()
        })
    }
}

// =============================================================================
// Deduplication
// =============================================================================

/// Thresholds for suppressing duplicate detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub min_area_side: u32,
    pub min_area_area: u64,
    pub min_overlay_side: u32,
    pub min_overlay_area: u64,
    /// Different-label candidates overlapping more than this fraction of
    /// either rectangle are duplicates.
    pub cross_label_overlap: f32,
    /// Same-label overlap fraction treated as the same block.
    pub same_label_overlap: f32,
    /// Same-label centres closer than this times the mean side are the same block.
    pub same_block_distance_factor: f32,
    /// A replacement must be this much larger than the block it replaces.
    pub replace_area_ratio: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_area_side: 12,
            min_area_area: 400,
            min_overlay_side: 4,
            min_overlay_area: 64,
            cross_label_overlap: 0.6,
            same_label_overlap: 0.5,
            same_block_distance_factor: 0.3,
            replace_area_ratio: 1.2,
        }
    }
}

impl DedupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_fraction(self.cross_label_overlap, "cross_label_overlap")?;
        ensure_fraction(self.same_label_overlap, "same_label_overlap")?;
        ensure_positive(self.same_block_distance_factor, "same_block_distance_factor")?;
        ensure(
            self.replace_area_ratio.is_finite() && self.replace_area_ratio >= 1.0,
            || {
                format!(
                    "replace_area_ratio must be at least 1.0, got {}",
                    self.replace_area_ratio
                )
            },
        )
    }
}

// =============================================================================
// Detection
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Longer side of the analysis copy; larger images are downsampled.
    pub max_analysis_dimension: u32,
    pub scan_step_divisor: u32,
    pub min_scan_step: u32,
    pub max_scan_step: u32,
    /// Visited cells are this many scan steps wide.
    pub mark_stride_factor: u32,
    /// Lattice rows processed per chunk.
    pub rows_per_chunk: u32,
    pub pixel_filter: PixelFilter,
    pub boundary: BoundaryConfig,
    pub dedup: DedupConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_analysis_dimension: 1500,
            scan_step_divisor: 150,
            min_scan_step: 2,
            max_scan_step: 10,
            mark_stride_factor: 2,
            rows_per_chunk: 8,
            pixel_filter: PixelFilter::default(),
            boundary: BoundaryConfig::default(),
            dedup: DedupConfig::default(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.max_analysis_dimension >= 16, || {
            format!(
                "max_analysis_dimension must be at least 16, got {}",
                self.max_analysis_dimension
            )
        })?;
        ensure(self.scan_step_divisor >= 1, || {
            "scan_step_divisor must be at least 1".to_string()
        })?;
        ensure(
            self.min_scan_step >= 1 && self.min_scan_step <= self.max_scan_step,
            || {
                format!(
                    "scan step range [{}, {}] is invalid",
                    self.min_scan_step, self.max_scan_step
                )
            },
        )?;
        ensure(self.mark_stride_factor >= 1, || {
            "mark_stride_factor must be at least 1".to_string()
        })?;
        ensure(self.rows_per_chunk >= 1, || {
            "rows_per_chunk must be at least 1".to_string()
        })?;
        self.boundary.validate()?;
        self.dedup.validate()
    }

    /// Lattice spacing for an analysis buffer `width` pixels wide.
    pub fn scan_step(&self, width: u32) -> u32 {
        (width / self.scan_step_divisor.max(1)).clamp(self.min_scan_step, self.max_scan_step)
    }
}

// =============================================================================
// Editing
// =============================================================================

/// Stroke color and width for the draw and erase tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Rgba,
    pub width: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            width: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fill left behind where a block was picked up.
    pub background: Rgba,
    /// Dashed marker drawn over the vacated rectangle while dragging.
    pub marker_color: Rgba,
    /// Dashed outline drawn around the block being dragged.
    pub drag_outline_color: Rgba,
    pub outline_thickness: u32,
    pub dash: u32,
    pub gap: u32,
    pub max_history: usize,
    pub brush: Brush,
    /// Canvas size used when the source image cannot be loaded.
    pub blank_canvas: (u32, u32),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            background: Rgba::WHITE,
            marker_color: Rgba::new(156, 163, 175, 255),
            drag_outline_color: Rgba::new(37, 99, 235, 255),
            outline_thickness: 2,
            dash: 6,
            gap: 4,
            max_history: 50,
            brush: Brush::default(),
            blank_canvas: (800, 600),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.max_history >= 1, || {
            "max_history must be at least 1".to_string()
        })?;
        ensure(self.dash >= 1, || "dash must be at least 1".to_string())?;
        ensure(self.outline_thickness >= 1, || {
            "outline_thickness must be at least 1".to_string()
        })?;
        ensure_positive(self.brush.width, "brush.width")?;
        ensure(self.blank_canvas.0 >= 1 && self.blank_canvas.1 >= 1, || {
            format!(
                "blank_canvas must be non-empty, got {}x{}",
                self.blank_canvas.0, self.blank_canvas.1
            )
        })
    }
}

// =============================================================================
// Editor
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub detection: DetectionConfig,
    pub session: SessionConfig,
    /// Replaces the built-in palette when present.
    pub palette: Option<Palette>,
    pub render: RenderOptions,
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.session.validate()?;
        self.render.validate()
    }

    pub fn palette(&self) -> Palette {
        self.palette.clone().unwrap_or_default()
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_yml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.yaml`/`.yml` or `.json` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path)?;

        let config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&text)?,
            "json" => Self::from_json(&text)?,
            _ => return Err(ConfigError::UnsupportedExtension(extension)),
        };
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }
}
