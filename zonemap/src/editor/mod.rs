//! Host-facing facade tying the pipeline together.
//!
//! An [`Editor`] owns one document for as long as the map is open. Opening
//! an image starts chunked detection; the host drives it from its frame loop
//! through [`Editor::tick`] and forwards pointer and keyboard input as
//! [`EditEvent`]s. Pointer input is ignored until detection settles.


use common::CancelToken;
use raster::{FetchOptions, ImageLocation, PixelBuffer};
use serde_json::Value;

use crate::config::{ConfigError, EditorConfig};
use crate::detection::{Candidate, DetectionError, DetectionTask, ScanJob};
use crate::overlay::RoadOverlay;
use crate::palette::{Palette, PaletteError};
use crate::registry::{Block, BlockRegistry};
use crate::render::{self, ExportError, ExportedImage, SavePayload};
use crate::session::{Document, EditEvent, EditOutcome, EditSession, ZoneSelection};

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionStatus {
    NotStarted,
    Detecting { progress: f32 },
    Finished { blocks: usize },
    /// A chunk failed. Blocks accepted before the failure were kept.
    Aborted { reason: String },
    Cancelled,
}

/// Message the host should surface to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNotice {
    Alert(String),
    Info(String),
}

pub struct Editor {
    config: EditorConfig,
    palette: Palette,
    document: Document,
    session: EditSession,
    overlay: Option<RoadOverlay>,
    task: Option<Box<dyn DetectionTask>>,
    status: DetectionStatus,
    cancel: CancelToken,
    notices: Vec<UserNotice>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("width", &self.document.width())
            .field("height", &self.document.height())
            .field("blocks", &self.document.registry.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Loads the image at `location` and starts detection on it.
    ///
    /// A load failure is not an error: the editor opens on a blank canvas
    /// and queues an alert. Only an invalid `config` fails.
    pub fn open(
        location: &ImageLocation,
        config: EditorConfig,
        fetch: &FetchOptions,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        match raster::load_image(location, fetch) {
            Ok(image) => {
                tracing::info!(
                    "Loaded {}x{} image from {}",
                    image.width(),
                    image.height(),
                    location
                );
                let mut editor = Self::from_image(image, config)?;
                if let Err(err) = editor.start_detection() {
                    tracing::error!("Cannot start detection: {}", err);
                    editor.status = DetectionStatus::Aborted {
                        reason: err.to_string(),
                    };
                    editor.notices.push(UserNotice::Alert(err.to_string()));
                }
                Ok(editor)
            }
            Err(err) => {
                tracing::error!("Failed to load image from {}: {}", location, err);
                let (width, height) = config.session.blank_canvas;
                let blank = PixelBuffer::new_filled(width, height, config.session.background);
                let mut editor = Self::from_image(blank, config)?;
                editor.notices.push(UserNotice::Alert(err.to_string()));
                Ok(editor)
            }
        }
    }

    /// Wraps an already decoded image. Detection is not started.
    pub fn from_image(image: PixelBuffer, config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let palette = config.palette();
        let document = Document::new(image);
        let session = EditSession::new(config.session.clone(), &document);

        Ok(Self {
            config,
            palette,
            document,
            session,
            overlay: None,
            task: None,
            status: DetectionStatus::NotStarted,
            cancel: CancelToken::new(),
            notices: Vec::new(),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.document.registry
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn overlay(&self) -> Option<&RoadOverlay> {
        self.overlay.as_ref()
    }

    pub fn status(&self) -> &DetectionStatus {
        &self.status
    }

    pub fn is_detecting(&self) -> bool {
        self.task.is_some()
    }

    pub fn notices(&self) -> &[UserNotice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<UserNotice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Starts a lattice scan of the base image with the configured palette.
    pub fn start_detection(&mut self) -> Result<(), DetectionError> {
        self.cancel = CancelToken::new();
        let job = ScanJob::new(
            self.document.canvas.base(),
            self.palette.clone(),
            self.config.detection.clone(),
            self.cancel.clone(),
        )?;
        self.start_detection_with(Box::new(job));
        Ok(())
    }

    /// Runs `task` in place of the built-in scan. Existing blocks are
    /// cleared; detected ones are installed when the task finishes.
    pub fn start_detection_with(&mut self, task: Box<dyn DetectionTask>) {
        if self.cancel.is_cancelled() {
            self.cancel = CancelToken::new();
        }
        self.document.registry.clear();
        self.session.reset_history(&self.document);
        self.task = Some(task);
        self.status = DetectionStatus::Detecting { progress: 0.0 };
    }

    /// Runs at most one detection chunk. Call once per host frame.
    pub fn tick(&mut self) -> &DetectionStatus {
        let Some(task) = self.task.as_mut() else {
            return &self.status;
        };
        if self.cancel.is_cancelled() {
            self.task = None;
            self.status = DetectionStatus::Cancelled;
            return &self.status;
        }

        match task.run_chunk() {
            Ok(report) if report.finished => {
                let accepted = task.take_accepted();
                self.task = None;
                let blocks = self.install(accepted);
                self.status = DetectionStatus::Finished { blocks };
                self.notices
                    .push(UserNotice::Info(format!("Detected {} zone blocks", blocks)));
            }
            Ok(report) => {
                self.status = DetectionStatus::Detecting {
                    progress: report.progress,
                };
            }
            Err(DetectionError::Cancelled) => {
                tracing::info!("Detection cancelled");
                self.task = None;
                self.status = DetectionStatus::Cancelled;
            }
            Err(err) => {
                tracing::error!("Detection aborted: {}", err);
                let accepted = task.take_accepted();
                self.task = None;
                let kept = self.install(accepted);
                self.status = DetectionStatus::Aborted {
                    reason: err.to_string(),
                };
                self.notices.push(UserNotice::Alert(format!(
                    "Zone detection stopped early ({}); {} blocks were kept",
                    err, kept
                )));
            }
        }
        &self.status
    }

    /// Ticks until detection settles.
    pub fn run_detection(&mut self) -> &DetectionStatus {
        while self.is_detecting() {
            self.tick();
        }
        &self.status
    }

    fn install(&mut self, candidates: Vec<Candidate>) -> usize {
        let mut installed = 0;
        for candidate in &candidates {
            match self.document.registry.append(Block::from(candidate)) {
                Ok(_) => installed += 1,
                Err(err) => tracing::warn!("Skipping detected block: {}", err),
            }
        }
        self.session.reset_history(&self.document);
        installed
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn handle(&mut self, event: EditEvent) -> EditOutcome {
        let pointer = matches!(
            event,
            EditEvent::PointerDown(_) | EditEvent::PointerMove(_) | EditEvent::PointerUp(_)
        );
        if pointer && self.is_detecting() {
            return EditOutcome::Ignored;
        }
        self.session.handle(&mut self.document, event)
    }

    /// Selects the palette zone used by the add-block tool.
    pub fn select_zone(&mut self, label: &str) -> Result<EditOutcome, PaletteError> {
        let entry = self.palette.by_label(label)?;
        let zone = ZoneSelection {
            label: entry.label.clone(),
            color: entry.primary_color(),
        };
        Ok(self.handle(EditEvent::SelectZone(zone)))
    }

    /// Replaces the road overlay. Malformed parts are skipped.
    pub fn set_overlay(&mut self, roads: &Value, polygon: Option<&Value>) {
        let overlay = RoadOverlay::from_json(
            roads,
            polygon,
            self.document.width(),
            self.document.height(),
        );
        tracing::debug!(
            "Road overlay: {} features, {} skipped",
            overlay.network().feature_count(),
            overlay.network().skipped
        );
        self.overlay = Some(overlay);
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Frame to display, including interaction feedback.
    pub fn render(&self) -> PixelBuffer {
        render::compose(
            &self.document,
            self.overlay.as_ref(),
            &self.config.render,
            Some(&self.session),
        )
    }

    pub fn export(&self) -> Result<ExportedImage, ExportError> {
        if self.session.is_interacting() {
            return Err(ExportError::Busy);
        }
        render::export(&self.document, self.overlay.as_ref(), &self.config.render)
    }

    pub fn save_payload(
        &self,
        target_id: impl Into<String>,
        scale: f32,
    ) -> Result<SavePayload, ExportError> {
        let image = self.export()?;
        Ok(SavePayload::new(target_id, &image, scale))
    }

    /// Stops any running detection without touching the registry.
    pub fn close(&mut self) {
        self.cancel.cancel();
        if self.task.take().is_some() {
            self.status = DetectionStatus::Cancelled;
            tracing::info!("Editor closed during detection");
        }
    }
}
