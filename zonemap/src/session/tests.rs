use glam::Vec2;
use raster::{PixelBuffer, Rect, Rgb, Rgba};

use super::*;
use crate::config::{Brush, SessionConfig};
use crate::registry::{Block, BlockId};

const BLUE: Rgba = Rgba::new(59, 130, 246, 255);
const GREEN: Rgba = Rgba::new(34, 197, 94, 255);
const RECT_A: Rect = Rect::new(10, 10, 40, 30);
const RECT_B: Rect = Rect::new(120, 60, 50, 40);

struct Fixture {
    document: Document,
    session: EditSession,
    a: BlockId,
    b: BlockId,
}

fn fixture() -> Fixture {
    let mut base = PixelBuffer::new_filled(200, 120, Rgba::WHITE);
    base.fill_rect(RECT_A, BLUE);
    base.fill_rect(RECT_B, GREEN);

    let mut document = Document::new(base);
    let a = document
        .registry
        .append(Block::new(RECT_A, "Residential", Rgb::new(59, 130, 246)))
        .unwrap();
    let b = document
        .registry
        .append(Block::new(RECT_B, "Park", Rgb::new(34, 197, 94)))
        .unwrap();
    let session = EditSession::new(SessionConfig::default(), &document);

    Fixture {
        document,
        session,
        a,
        b,
    }
}

fn p(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

impl Fixture {
    fn send(&mut self, event: EditEvent) -> EditOutcome {
        self.session.handle(&mut self.document, event)
    }

    fn surface(&self) -> &PixelBuffer {
        self.document.canvas.surface()
    }

    fn stroke(&mut self, from: Vec2, to: Vec2) -> EditOutcome {
        self.send(EditEvent::PointerDown(from));
        self.send(EditEvent::PointerMove(from.lerp(to, 0.5)));
        self.send(EditEvent::PointerUp(to))
    }
}

// =============================================================================
// Drag and drop
// =============================================================================

#[test]
fn pick_up_fills_original_with_background_and_marker() {
    let mut f = fixture();
    assert_eq!(f.send(EditEvent::PointerDown(p(20.0, 20.0))), EditOutcome::Updated);

    let drag = f.session.dragging().unwrap();
    assert_eq!(drag.block, f.a);
    assert_eq!(drag.grab_offset, (10, 10));

    let config = SessionConfig::default();
    assert_eq!(f.surface().get(30, 25), config.background);
    assert_eq!(f.surface().get(10, 10), config.marker_color);

    let block = f.document.registry.get(&f.a).unwrap();
    let snapshot = block.snapshot.as_ref().unwrap();
    assert!(snapshot.is_fully_opaque());
    assert_eq!(snapshot.get(5, 5), BLUE);
}

#[test]
fn drag_preview_moves_snapshot_and_outline() {
    let mut f = fixture();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(80.0, 70.0)));

    let target = Rect::new(70, 60, 40, 30);
    assert_eq!(f.session.dragging().unwrap().preview, target);
    assert_eq!(f.surface().get(90, 75), BLUE);
    assert_eq!(
        f.surface().get(70, 60),
        SessionConfig::default().drag_outline_color
    );

    // Moving again restores the base under the previous preview.
    f.send(EditEvent::PointerMove(p(30.0, 90.0)));
    assert_eq!(f.surface().get(100, 85), Rgba::WHITE);
    assert_eq!(f.surface().get(30, 90), BLUE);
}

#[test]
fn drag_is_clamped_to_canvas() {
    let mut f = fixture();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(5000.0, -300.0)));
    assert_eq!(
        f.session.dragging().unwrap().preview,
        Rect::new(160, 0, 40, 30)
    );

    f.send(EditEvent::PointerUp(p(5000.0, -300.0)));
    let block = f.document.registry.get(&f.a).unwrap();
    assert_eq!(block.rect, Rect::new(160, 0, 40, 30));
    assert!(block.rect.fits_within(200, 120));
}

#[test]
fn drop_at_origin_reproduces_pixels_exactly() {
    let mut f = fixture();
    let before = f.surface().clone();

    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(100.0, 15.0)));
    f.send(EditEvent::PointerMove(p(20.0, 20.0)));
    assert_eq!(f.send(EditEvent::PointerUp(p(20.0, 20.0))), EditOutcome::Committed);

    assert_eq!(f.surface(), &before);
    let block = f.document.registry.get(&f.a).unwrap();
    assert_eq!(block.rect, RECT_A);
    assert!(!block.moved);
    assert_eq!(block.original_rect, Some(RECT_A));
    assert_eq!(f.document.registry.len(), 2);
}

#[test]
fn drop_moves_block_and_records_original() {
    let mut f = fixture();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(70.0, 80.0)));
    f.send(EditEvent::PointerUp(p(70.0, 80.0)));

    let moved_to = Rect::new(60, 70, 40, 30);
    let block = f.document.registry.get(&f.a).unwrap();
    assert_eq!(block.rect, moved_to);
    assert!(block.moved);
    assert_eq!(block.original_rect, Some(RECT_A));

    assert_eq!(f.surface().get(80, 85), BLUE);
    // The vacated rectangle shows the base image again, not the marker.
    assert_eq!(f.surface().crop(RECT_A).unwrap(), f.document.canvas.base().crop(RECT_A).unwrap());
    assert!(matches!(f.session.state(), SessionState::Idle));
    assert_eq!(f.session.history().len(), 2);
}

#[test]
fn dropping_onto_another_block_removes_it() {
    let mut f = fixture();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(140.0, 70.0)));
    f.send(EditEvent::PointerUp(p(140.0, 70.0)));

    let target = Rect::new(130, 60, 40, 30);
    assert!(!f.document.registry.contains(&f.b));
    assert_eq!(f.document.registry.len(), 1);
    assert_eq!(f.document.registry.get(&f.a).unwrap().rect, target);

    let patch = f.surface().crop(target).unwrap();
    assert!(patch.is_fully_opaque());
    assert!(patch.bytes().chunks_exact(4).all(|px| px == [59, 130, 246, 255]));
}

#[test]
fn second_move_keeps_first_original() {
    let mut f = fixture();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerUp(p(70.0, 20.0)));
    f.send(EditEvent::PointerDown(p(70.0, 20.0)));
    f.send(EditEvent::PointerUp(p(20.0, 80.0)));

    let block = f.document.registry.get(&f.a).unwrap();
    assert_eq!(block.rect, Rect::new(10, 70, 40, 30));
    assert_eq!(block.original_rect, Some(RECT_A));
}

#[test]
fn vanished_block_aborts_drag() {
    let mut f = fixture();
    let before = f.surface().clone();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(60.0, 60.0)));

    f.document.registry.remove(&f.a);
    assert_eq!(f.send(EditEvent::PointerMove(p(70.0, 60.0))), EditOutcome::Aborted);
    assert!(matches!(f.session.state(), SessionState::Idle));
    assert_eq!(f.surface(), &before);
    assert_eq!(f.session.history().len(), 1);
}

#[test]
fn cancel_restores_surface() {
    let mut f = fixture();
    let before = f.surface().clone();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerMove(p(60.0, 60.0)));

    assert_eq!(f.send(EditEvent::Cancel), EditOutcome::Aborted);
    assert_eq!(f.surface(), &before);
    assert_eq!(f.document.registry.get(&f.a).unwrap().rect, RECT_A);
    assert_eq!(f.send(EditEvent::Cancel), EditOutcome::Ignored);
}

#[test]
fn pointer_down_on_empty_canvas_does_nothing() {
    let mut f = fixture();
    assert_eq!(f.send(EditEvent::PointerDown(p(100.0, 5.0))), EditOutcome::Ignored);
    assert_eq!(f.send(EditEvent::PointerDown(p(-4.0, 20.0))), EditOutcome::Ignored);
    assert_eq!(
        f.send(EditEvent::PointerDown(p(f32::NAN, 20.0))),
        EditOutcome::Ignored
    );
    assert!(!f.session.is_interacting());
}

// =============================================================================
// Hover and tools
// =============================================================================

#[test]
fn hover_tracks_block_under_pointer() {
    let mut f = fixture();
    assert_eq!(f.send(EditEvent::PointerMove(p(15.0, 15.0))), EditOutcome::Updated);
    assert_eq!(f.session.hovered(), Some(f.a));
    assert_eq!(f.send(EditEvent::PointerMove(p(16.0, 15.0))), EditOutcome::Ignored);
    assert_eq!(f.send(EditEvent::PointerMove(p(130.0, 70.0))), EditOutcome::Updated);
    assert_eq!(f.session.hovered(), Some(f.b));
    assert_eq!(f.send(EditEvent::PointerMove(p(100.0, 5.0))), EditOutcome::Updated);
    assert_eq!(f.session.hovered(), None);
}

#[test]
fn tool_changes_and_history_are_ignored_mid_drag() {
    let mut f = fixture();
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    assert_eq!(f.send(EditEvent::SelectTool(Tool::Draw)), EditOutcome::Ignored);
    assert_eq!(f.send(EditEvent::Undo), EditOutcome::Ignored);
    assert_eq!(f.send(EditEvent::PointerDown(p(130.0, 70.0))), EditOutcome::Ignored);
    assert_eq!(f.session.tool(), Tool::Move);
    assert!(f.session.dragging().is_some());
}

#[test]
fn tool_names_parse() {
    assert_eq!("add_block".parse::<Tool>().unwrap(), Tool::AddBlock);
    assert_eq!("Erase".parse::<Tool>().unwrap(), Tool::Erase);
    assert_eq!(Tool::Draw.to_string(), "draw");
}

// =============================================================================
// Strokes
// =============================================================================

#[test]
fn draw_stroke_commits_to_history() {
    let mut f = fixture();
    f.send(EditEvent::SelectTool(Tool::Draw));
    f.send(EditEvent::SetBrush(Brush {
        color: Rgba::new(200, 0, 0, 255),
        width: 4.0,
    }));

    assert_eq!(f.stroke(p(60.0, 100.0), p(100.0, 100.0)), EditOutcome::Committed);
    assert_eq!(f.surface().get(80, 100), Rgba::new(200, 0, 0, 255));
    assert_eq!(f.session.history().len(), 2);
    assert!(matches!(f.session.state(), SessionState::Idle));
}

#[test]
fn erase_stroke_clears_alpha() {
    let mut f = fixture();
    f.send(EditEvent::SelectTool(Tool::Erase));
    f.stroke(p(15.0, 20.0), p(45.0, 20.0));
    assert_eq!(f.surface().get(30, 20), Rgba::TRANSPARENT);
    assert_eq!(f.surface().get(30, 35), BLUE);
}

#[test]
fn cancel_discards_partial_stroke() {
    let mut f = fixture();
    let before = f.surface().clone();
    f.send(EditEvent::SelectTool(Tool::Draw));
    f.send(EditEvent::PointerDown(p(60.0, 100.0)));
    f.send(EditEvent::PointerMove(p(90.0, 100.0)));
    assert_ne!(f.surface(), &before);

    f.send(EditEvent::Cancel);
    assert_eq!(f.surface(), &before);
}

// =============================================================================
// Undo / redo
// =============================================================================

#[test]
fn undo_all_commits_restores_loaded_canvas_and_redo_replays() {
    let mut f = fixture();
    let loaded = f.surface().clone();
    f.send(EditEvent::SelectTool(Tool::Draw));

    let mut after = Vec::new();
    for i in 0..3 {
        let y = 50.0 + i as f32 * 10.0;
        f.stroke(p(60.0, y), p(110.0, y));
        after.push(f.surface().clone());
    }
    f.send(EditEvent::SelectTool(Tool::Move));
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    f.send(EditEvent::PointerUp(p(20.0, 100.0)));
    after.push(f.surface().clone());

    for expected in after.iter().rev().skip(1) {
        assert_eq!(f.send(EditEvent::Undo), EditOutcome::Undone);
        assert_eq!(f.surface(), expected);
    }
    assert_eq!(f.send(EditEvent::Undo), EditOutcome::Undone);
    assert_eq!(f.surface(), &loaded);
    assert_eq!(f.document.registry.get(&f.a).unwrap().rect, RECT_A);
    assert_eq!(f.send(EditEvent::Undo), EditOutcome::Ignored);

    for expected in &after {
        assert_eq!(f.send(EditEvent::Redo), EditOutcome::Redone);
        assert_eq!(f.surface(), expected);
    }
    assert_eq!(f.send(EditEvent::Redo), EditOutcome::Ignored);
    assert_eq!(f.document.registry.get(&f.a).unwrap().rect, Rect::new(10, 90, 40, 30));
}

#[test]
fn new_commit_after_undo_drops_redo() {
    let mut f = fixture();
    f.send(EditEvent::SelectTool(Tool::Draw));
    f.stroke(p(60.0, 50.0), p(110.0, 50.0));
    f.stroke(p(60.0, 60.0), p(110.0, 60.0));
    f.send(EditEvent::Undo);
    f.stroke(p(60.0, 70.0), p(110.0, 70.0));

    assert!(!f.session.history().can_redo());
    assert_eq!(f.session.history().len(), 3);
    assert_eq!(f.surface().get(80, 60), Rgba::WHITE);
}

#[test]
fn history_is_capped() {
    let mut f = fixture();
    let config = SessionConfig {
        max_history: 3,
        ..SessionConfig::default()
    };
    f.session = EditSession::new(config, &f.document);
    f.send(EditEvent::SelectTool(Tool::Draw));
    for i in 0..5 {
        let y = 50.0 + i as f32 * 4.0;
        f.stroke(p(60.0, y), p(110.0, y));
    }
    assert_eq!(f.session.history().len(), 3);
    assert_eq!(f.session.history().index(), Some(2));
}

// =============================================================================
// Add block
// =============================================================================

fn select_school(f: &mut Fixture) {
    f.send(EditEvent::SelectTool(Tool::AddBlock));
    f.send(EditEvent::SelectZone(ZoneSelection {
        label: "School".to_string(),
        color: Rgb::new(234, 179, 8),
    }));
}

#[test]
fn framing_adds_a_filled_block() {
    let mut f = fixture();
    select_school(&mut f);

    f.send(EditEvent::PointerDown(p(90.0, 30.0)));
    f.send(EditEvent::PointerMove(p(70.0, 50.0)));
    assert_eq!(f.session.framing_rect(), Some(Rect::new(70, 30, 21, 21)));
    assert_eq!(f.send(EditEvent::PointerUp(p(70.0, 50.0))), EditOutcome::Committed);

    assert_eq!(f.document.registry.len(), 3);
    let block = f.document.registry.blocks().last().unwrap();
    assert_eq!(block.label, "School");
    assert_eq!(block.rect, Rect::new(70, 30, 21, 21));
    assert_eq!(f.surface().get(80, 40), Rgba::new(234, 179, 8, 255));

    f.send(EditEvent::Undo);
    assert_eq!(f.document.registry.len(), 2);
    assert_eq!(f.surface().get(80, 40), Rgba::WHITE);
}

#[test]
fn tiny_frames_are_discarded() {
    let mut f = fixture();
    select_school(&mut f);
    f.send(EditEvent::PointerDown(p(90.0, 30.0)));
    assert_eq!(f.send(EditEvent::PointerUp(p(90.0, 60.0))), EditOutcome::Aborted);
    assert_eq!(f.document.registry.len(), 2);
    assert_eq!(f.session.history().len(), 1);
}

#[test]
fn framing_requires_a_zone() {
    let mut f = fixture();
    f.send(EditEvent::SelectTool(Tool::AddBlock));
    assert_eq!(f.send(EditEvent::PointerDown(p(90.0, 30.0))), EditOutcome::Ignored);
}

#[test]
fn dragging_across_surface_edits_leaves_them_intact() {
    let mut f = fixture();
    select_school(&mut f);
    f.send(EditEvent::PointerDown(p(70.0, 30.0)));
    f.send(EditEvent::PointerUp(p(90.0, 50.0)));
    let school = f.document.registry.blocks().last().unwrap().id;
    f.send(EditEvent::SelectTool(Tool::Draw));
    f.stroke(p(70.0, 55.0), p(110.0, 55.0));

    f.send(EditEvent::SelectTool(Tool::Move));
    f.send(EditEvent::PointerDown(p(20.0, 20.0)));
    // Preview passes over the school block and the stroke.
    f.send(EditEvent::PointerMove(p(85.0, 40.0)));
    assert_eq!(f.surface().get(80, 40), BLUE);
    f.send(EditEvent::PointerMove(p(30.0, 85.0)));
    assert_eq!(f.surface().get(80, 40), Rgba::new(234, 179, 8, 255));
    assert_eq!(f.send(EditEvent::PointerUp(p(30.0, 85.0))), EditOutcome::Committed);

    assert_eq!(f.surface().get(80, 40), Rgba::new(234, 179, 8, 255));
    assert_eq!(f.surface().get(100, 55), Rgba::BLACK);
    assert_eq!(f.document.registry.block_at(80, 40).map(|b| b.id), Some(school));
    assert_eq!(f.document.registry.get(&f.a).unwrap().rect, Rect::new(20, 75, 40, 30));
    assert_eq!(f.surface().get(30, 80), BLUE);
}
