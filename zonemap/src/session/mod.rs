//! Interactive editing: tools, block drag and drop, strokes and history.
//!
//! [`EditSession`] is an explicit state machine. Every change to the
//! document goes through [`EditSession::handle`], one [`EditEvent`] at a
//! time, and each completed action is committed to [`History`].

mod canvas;
mod history;

#[cfg(test)]
mod tests;

pub use canvas::{Canvas, Document};
pub use history::{History, HistoryEntry};

use glam::Vec2;
use raster::{PixelBuffer, Rect, Rgb};
use serde::{Deserialize, Serialize};

use crate::config::{Brush, SessionConfig};
use crate::registry::{Block, BlockId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Tool {
    Draw,
    Erase,
    #[default]
    Move,
    AddBlock,
}

/// Zone used by the add-block tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSelection {
    pub label: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    SelectTool(Tool),
    SetBrush(Brush),
    SelectZone(ZoneSelection),
    /// Pointer positions are in canvas pixel coordinates.
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
    Undo,
    Redo,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing changed.
    Ignored,
    /// Session state or the canvas changed; nothing was committed.
    Updated,
    /// An action finished and was pushed to history.
    Committed,
    /// The interaction in progress was abandoned.
    Aborted,
    Undone,
    Redone,
}

/// A block being dragged.
#[derive(Debug, Clone)]
pub struct Drag {
    pub block: BlockId,
    /// Pointer position relative to the block's top-left corner at pick-up.
    pub grab_offset: (i64, i64),
    pub original: Rect,
    /// Where the block was last drawn.
    pub preview: Rect,
    snapshot: PixelBuffer,
    /// Surface as it was before pick-up. Previews are erased from it so
    /// pixels that exist only on the surface survive the drag.
    backdrop: PixelBuffer,
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Hovering {
        block: BlockId,
    },
    Dragging(Drag),
    Stroking {
        last: Vec2,
        erase: bool,
    },
    Framing {
        anchor: (u32, u32),
        current: (u32, u32),
    },
}

/// Pixel under `p`, or `None` when `p` is off the canvas.
fn hit_pixel(p: Vec2, width: u32, height: u32) -> Option<(u32, u32)> {
    if !p.is_finite() {
        return None;
    }
    let (x, y) = (p.x.floor(), p.y.floor());
    if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
        return None;
    }
    Some((x as u32, y as u32))
}

/// Pixel nearest to `p` on the canvas.
fn clamp_pixel(p: Vec2, width: u32, height: u32) -> (u32, u32) {
    let clamp = |v: f32, limit: u32| (v.floor() as i64).clamp(0, limit as i64 - 1) as u32;
    (clamp(p.x, width), clamp(p.y, height))
}

fn drag_target(drag: &Drag, p: Vec2, width: u32, height: u32) -> Rect {
    let max_x = width.saturating_sub(drag.original.width) as i64;
    let max_y = height.saturating_sub(drag.original.height) as i64;
    let x = (p.x.floor() as i64 - drag.grab_offset.0).clamp(0, max_x);
    let y = (p.y.floor() as i64 - drag.grab_offset.1).clamp(0, max_y);
    drag.original.moved_to(x as u32, y as u32)
}

#[derive(Debug)]
pub struct EditSession {
    config: SessionConfig,
    tool: Tool,
    brush: Brush,
    zone: Option<ZoneSelection>,
    state: SessionState,
    history: History,
}

impl EditSession {
    /// Creates a session whose first history entry is the current document.
    pub fn new(config: SessionConfig, document: &Document) -> Self {
        let mut history = History::new(config.max_history);
        history.record(HistoryEntry::capture(document));
        Self {
            brush: config.brush,
            config,
            tool: Tool::default(),
            zone: None,
            state: SessionState::Idle,
            history,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn zone(&self) -> Option<&ZoneSelection> {
        self.zone.as_ref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True while a drag, stroke or framing gesture is in progress.
    pub fn is_interacting(&self) -> bool {
        matches!(
            self.state,
            SessionState::Dragging(_) | SessionState::Stroking { .. } | SessionState::Framing { .. }
        )
    }

    pub fn hovered(&self) -> Option<BlockId> {
        match self.state {
            SessionState::Hovering { block } => Some(block),
            _ => None,
        }
    }

    pub fn dragging(&self) -> Option<&Drag> {
        match &self.state {
            SessionState::Dragging(drag) => Some(drag),
            _ => None,
        }
    }

    /// Rubber-band rectangle of the add-block tool.
    pub fn framing_rect(&self) -> Option<Rect> {
        match self.state {
            SessionState::Framing { anchor, current } => Some(Rect::spanning(anchor, current)),
            _ => None,
        }
    }

    /// Drops any interaction and restarts history from the document as it is.
    pub fn reset_history(&mut self, document: &Document) {
        self.state = SessionState::Idle;
        self.history.reset(HistoryEntry::capture(document));
    }

    pub fn handle(&mut self, document: &mut Document, event: EditEvent) -> EditOutcome {
        match event {
            EditEvent::SelectTool(tool) => {
                if self.is_interacting() {
                    return EditOutcome::Ignored;
                }
                tracing::debug!("Tool: {}", tool);
                self.tool = tool;
                self.state = SessionState::Idle;
                EditOutcome::Updated
            }
            EditEvent::SetBrush(brush) => {
                if self.is_interacting() {
                    return EditOutcome::Ignored;
                }
                self.brush = brush;
                EditOutcome::Updated
            }
            EditEvent::SelectZone(zone) => {
                if self.is_interacting() {
                    return EditOutcome::Ignored;
                }
                self.zone = Some(zone);
                EditOutcome::Updated
            }
            EditEvent::PointerDown(p) => self.pointer_down(document, p),
            EditEvent::PointerMove(p) => self.pointer_move(document, p),
            EditEvent::PointerUp(p) => self.pointer_up(document, p),
            EditEvent::Undo => {
                if self.is_interacting() {
                    return EditOutcome::Ignored;
                }
                match self.history.undo().cloned() {
                    Some(entry) => {
                        self.restore(document, entry);
                        EditOutcome::Undone
                    }
                    None => EditOutcome::Ignored,
                }
            }
            EditEvent::Redo => {
                if self.is_interacting() {
                    return EditOutcome::Ignored;
                }
                match self.history.redo().cloned() {
                    Some(entry) => {
                        self.restore(document, entry);
                        EditOutcome::Redone
                    }
                    None => EditOutcome::Ignored,
                }
            }
            EditEvent::Cancel => match self.state {
                SessionState::Dragging(_) | SessionState::Stroking { .. } => self.abort(document),
                SessionState::Framing { .. } => {
                    self.state = SessionState::Idle;
                    EditOutcome::Aborted
                }
                _ => EditOutcome::Ignored,
            },
        }
    }

    fn pointer_down(&mut self, document: &mut Document, p: Vec2) -> EditOutcome {
        if self.is_interacting() {
            return EditOutcome::Ignored;
        }

        match self.tool {
            Tool::Move => self.pick_up(document, p),
            Tool::Draw | Tool::Erase => {
                if !p.is_finite() {
                    return EditOutcome::Ignored;
                }
                let erase = self.tool == Tool::Erase;
                self.paint(document, p, p, erase);
                self.state = SessionState::Stroking { last: p, erase };
                EditOutcome::Updated
            }
            Tool::AddBlock => {
                if self.zone.is_none() {
                    return EditOutcome::Ignored;
                }
                let Some(anchor) = hit_pixel(p, document.width(), document.height()) else {
                    return EditOutcome::Ignored;
                };
                self.state = SessionState::Framing {
                    anchor,
                    current: anchor,
                };
                EditOutcome::Updated
            }
        }
    }

    fn pick_up(&mut self, document: &mut Document, p: Vec2) -> EditOutcome {
        let Some((x, y)) = hit_pixel(p, document.width(), document.height()) else {
            return EditOutcome::Ignored;
        };
        let Some((id, rect)) = document.registry.block_at(x, y).map(|b| (b.id, b.rect)) else {
            self.state = SessionState::Idle;
            return EditOutcome::Ignored;
        };

        let snapshot = match document.canvas.capture_opaque(rect) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("Cannot pick up block {}: {}", id, err);
                return EditOutcome::Ignored;
            }
        };
        if let Err(err) = document.registry.set_snapshot(&id, Some(snapshot.clone())) {
            tracing::warn!("Cannot pick up block {}: {}", id, err);
            return EditOutcome::Ignored;
        }
        let backdrop = document.canvas.surface().clone();
        document.canvas.fill_with_marker(rect, &self.config);

        tracing::debug!("Picked up block {} at {}", id, rect);
        self.state = SessionState::Dragging(Drag {
            block: id,
            grab_offset: (x as i64 - rect.x as i64, y as i64 - rect.y as i64),
            original: rect,
            preview: rect,
            snapshot,
            backdrop,
        });
        EditOutcome::Updated
    }

    fn pointer_move(&mut self, document: &mut Document, p: Vec2) -> EditOutcome {
        let previous_hover = self.hovered();
        match std::mem::take(&mut self.state) {
            SessionState::Idle | SessionState::Hovering { .. } => {
                if self.tool != Tool::Move {
                    return EditOutcome::Ignored;
                }
                let hovered = hit_pixel(p, document.width(), document.height())
                    .and_then(|(x, y)| document.registry.block_at(x, y))
                    .map(|b| b.id);
                if let Some(block) = hovered {
                    self.state = SessionState::Hovering { block };
                }
                if hovered == previous_hover {
                    EditOutcome::Ignored
                } else {
                    EditOutcome::Updated
                }
            }
            SessionState::Dragging(drag) => self.drag_to(document, drag, p),
            SessionState::Stroking { last, erase } => {
                if !p.is_finite() {
                    self.state = SessionState::Stroking { last, erase };
                    return EditOutcome::Ignored;
                }
                self.paint(document, last, p, erase);
                self.state = SessionState::Stroking { last: p, erase };
                EditOutcome::Updated
            }
            SessionState::Framing { anchor, .. } => {
                self.state = SessionState::Framing {
                    anchor,
                    current: clamp_pixel(p, document.width(), document.height()),
                };
                EditOutcome::Updated
            }
        }
    }

    fn drag_to(&mut self, document: &mut Document, mut drag: Drag, p: Vec2) -> EditOutcome {
        if !document.registry.contains(&drag.block) {
            return self.abort(document);
        }
        if !p.is_finite() {
            self.state = SessionState::Dragging(drag);
            return EditOutcome::Ignored;
        }

        let target = drag_target(&drag, p, document.width(), document.height());
        let canvas = &mut document.canvas;
        if drag.preview != drag.original {
            if let Err(err) = canvas.restore_from(&drag.backdrop, drag.preview) {
                tracing::warn!("Cannot clear drag preview of block {}: {}", drag.block, err);
                return self.abort(document);
            }
        }
        canvas.fill_with_marker(drag.original, &self.config);
        canvas.paste(&drag.snapshot, target.x, target.y);
        canvas.draw_drag_outline(target, &self.config);

        drag.preview = target;
        self.state = SessionState::Dragging(drag);
        EditOutcome::Updated
    }

    fn pointer_up(&mut self, document: &mut Document, p: Vec2) -> EditOutcome {
        match std::mem::take(&mut self.state) {
            SessionState::Dragging(drag) => self.drop_block(document, drag, p),
            SessionState::Stroking { last, erase } => {
                if p.is_finite() {
                    self.paint(document, last, p, erase);
                }
                self.commit(document);
                EditOutcome::Committed
            }
            SessionState::Framing { anchor, current } => {
                let end = if p.is_finite() {
                    clamp_pixel(p, document.width(), document.height())
                } else {
                    current
                };
                self.frame_block(document, Rect::spanning(anchor, end))
            }
            other => {
                self.state = other;
                EditOutcome::Ignored
            }
        }
    }

    fn drop_block(&mut self, document: &mut Document, drag: Drag, p: Vec2) -> EditOutcome {
        if !document.registry.contains(&drag.block) {
            return self.abort(document);
        }

        let target = if p.is_finite() {
            drag_target(&drag, p, document.width(), document.height())
        } else {
            drag.preview
        };

        let canvas = &mut document.canvas;
        let cleared = canvas
            .restore_from(&drag.backdrop, drag.preview)
            .and_then(|_| canvas.restore_from_base(drag.original));
        if let Err(err) = cleared {
            tracing::warn!("Drop of block {} failed: {}", drag.block, err);
            return self.abort(document);
        }
        canvas.paste(&drag.snapshot, target.x, target.y);

        let covered = document.registry.overlapping(target, Some(drag.block));
        document.registry.remove_all(&covered);

        if let Err(err) = document.registry.relocate(&drag.block, target) {
            tracing::warn!("Drop of block {} failed: {}", drag.block, err);
            return self.abort(document);
        }

        tracing::info!(
            "Dropped block {} at {} (from {}, {} covered blocks removed)",
            drag.block,
            target,
            drag.original,
            covered.len()
        );
        self.commit(document);
        EditOutcome::Committed
    }

    fn frame_block(&mut self, document: &mut Document, rect: Rect) -> EditOutcome {
        let Some(zone) = self.zone.clone() else {
            return EditOutcome::Aborted;
        };
        if rect.width < 2 || rect.height < 2 {
            return EditOutcome::Aborted;
        }

        document.canvas.fill_rect(rect, zone.color.opaque());
        let block = Block::new(rect, zone.label, zone.color);
        match document.registry.append(block) {
            Ok(id) => tracing::info!("Added block {} at {}", id, rect),
            Err(err) => {
                tracing::warn!("Cannot add block at {}: {}", rect, err);
                return self.abort(document);
            }
        }

        self.commit(document);
        EditOutcome::Committed
    }

    fn paint(&self, document: &mut Document, from: Vec2, to: Vec2, erase: bool) {
        if erase {
            document.canvas.erase(from, to, self.brush.width);
        } else {
            document.canvas.stroke(from, to, &self.brush);
        }
    }

    fn commit(&mut self, document: &Document) {
        self.state = SessionState::Idle;
        self.history.record(HistoryEntry::capture(document));
    }

    /// Repaints the surface from the current history entry and returns to idle.
    fn abort(&mut self, document: &mut Document) -> EditOutcome {
        self.state = SessionState::Idle;
        if let Some(entry) = self.history.current() {
            if let Err(err) = document.canvas.replace_surface(entry.surface.clone()) {
                tracing::warn!("Cannot repaint canvas: {}", err);
            }
        }
        tracing::debug!("Interaction aborted");
        EditOutcome::Aborted
    }

    fn restore(&mut self, document: &mut Document, entry: HistoryEntry) {
        self.state = SessionState::Idle;
        if let Err(err) = document.canvas.replace_surface(entry.surface) {
            tracing::warn!("Cannot restore history entry: {}", err);
            return;
        }
        document.registry = entry.registry;
    }
}
