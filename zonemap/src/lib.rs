//! Zone-block detection and hand editing for land-use raster maps.
//!
//! A map arrives as a raster with pre-colored rectangular zones. The
//! [`detection`] pipeline turns it into [`registry::Block`]s, the
//! [`session`] state machine lets an operator drag blocks, draw and erase,
//! and [`render`] composites the result with an optional road
//! [`overlay`]. [`Editor`] bundles all of it for a host.

pub mod color_match;
pub mod config;
pub mod detection;
pub mod editor;
pub mod overlay;
pub mod palette;
pub mod registry;
pub mod render;
pub mod session;

pub use config::{ConfigError, DetectionConfig, EditorConfig, SessionConfig};
pub use detection::{Candidate, DetectionError, ScanJob, detect_blocks};
pub use editor::{DetectionStatus, Editor, UserNotice};
pub use overlay::RoadOverlay;
pub use palette::{Palette, PaletteEntry, PaletteError, ZoneKind};
pub use registry::{Block, BlockId, BlockRegistry, RegistryError};
pub use render::{ExportError, ExportedImage, RenderOptions, SavePayload};
pub use session::{Document, EditEvent, EditOutcome, EditSession, Tool};
