//! Display compositing, PNG export and the save payload.

use raster::{PixelBuffer, Rgba, drawing, io};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::overlay::RoadOverlay;
use crate::session::{Document, EditSession};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to encode export: {0}")]
    Encode(#[from] raster::Error),
    #[error("Failed to serialize save payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Cannot export while an edit is in progress")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub show_roads: bool,
    pub show_block_outlines: bool,
    /// Multiplier applied to road line widths.
    pub road_width_scale: f32,
    pub outline_thickness: u32,
    pub highlight_color: Rgba,
    pub framing_color: Rgba,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_roads: true,
            show_block_outlines: false,
            road_width_scale: 1.0,
            outline_thickness: 2,
            highlight_color: Rgba::new(250, 204, 21, 255),
            framing_color: Rgba::new(37, 99, 235, 255),
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.road_width_scale.is_finite() || self.road_width_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "road_width_scale must be positive, got {}",
                self.road_width_scale
            )));
        }
        if self.outline_thickness == 0 {
            return Err(ConfigError::Invalid(
                "outline_thickness must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds the displayed frame: surface, roads, block outlines, then the
/// session's hover highlight and rubber band. Never written back to the
/// document.
pub fn compose(
    document: &Document,
    overlay: Option<&RoadOverlay>,
    options: &RenderOptions,
    session: Option<&EditSession>,
) -> PixelBuffer {
    let mut frame = document.canvas.surface().clone();

    if options.show_roads {
        if let Some(overlay) = overlay {
            overlay.draw(&mut frame, options.road_width_scale);
        }
    }

    if options.show_block_outlines {
        for block in document.registry.iter() {
            drawing::draw_rect_outline(
                &mut frame,
                block.rect,
                block.color.opaque(),
                options.outline_thickness,
            );
        }
    }

    if let Some(session) = session {
        let hovered = session.hovered().and_then(|id| document.registry.get(&id));
        if let Some(block) = hovered {
            drawing::draw_dashed_rect(
                &mut frame,
                block.rect,
                options.highlight_color,
                options.outline_thickness,
                session.config().dash,
                session.config().gap,
            );
        }
        if let Some(rect) = session.framing_rect() {
            drawing::draw_dashed_rect(
                &mut frame,
                rect,
                options.framing_color,
                options.outline_thickness,
                session.config().dash,
                session.config().gap,
            );
        }
    }

    frame
}

/// Encoded export of the edited canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    /// `data:image/png;base64,...`
    pub data_uri: String,
}

/// Encodes the full canvas with every edit, plus roads when enabled.
pub fn export(
    document: &Document,
    overlay: Option<&RoadOverlay>,
    options: &RenderOptions,
) -> Result<ExportedImage, ExportError> {
    let mut frame = document.canvas.surface().clone();
    if options.show_roads {
        if let Some(overlay) = overlay {
            overlay.draw(&mut frame, options.road_width_scale);
        }
    }

    let png = io::encode_png(&frame)?;
    let data_uri = io::png_data_uri(&png);
    tracing::debug!(
        "Exported {}x{} canvas ({} bytes)",
        frame.width(),
        frame.height(),
        png.len()
    );

    Ok(ExportedImage {
        width: frame.width(),
        height: frame.height(),
        png,
        data_uri,
    })
}

/// What the host persists for an edited map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub target_id: String,
    /// PNG data URI.
    pub image_data: String,
    pub scale: f32,
    /// RFC 3339.
    pub timestamp: String,
}

impl SavePayload {
    pub fn new(target_id: impl Into<String>, image: &ExportedImage, scale: f32) -> Self {
        Self {
            target_id: target_id.into(),
            image_data: image.data_uri.clone(),
            scale,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
