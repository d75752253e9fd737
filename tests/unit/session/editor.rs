use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::model::layers::LayerEvent;
use crate::model::overlay::OverlayKind;

fn editor() -> Editor {
    let mut ed = Editor::new(Size::new(300.0, 300.0), EditorConfig::default()).unwrap();
    ed.set_view(Some(CanvasView::identity(Size::new(300.0, 300.0))));
    ed
}

fn square(ed: &mut Editor) -> OverlayId {
    let bitmap = Bitmap::from_straight_rgba8(2, 2, vec![255u8; 16]).unwrap();
    let id = ed.add_image_bitmap(bitmap);
    ed.set_position(id, Point::new(150.0, 150.0)).unwrap();
    ed.set_image_width(id, 100.0).unwrap();
    id
}

#[test]
fn rejects_bad_logical_size_and_config() {
    assert!(Editor::new(Size::new(0.0, 10.0), EditorConfig::default()).is_err());
    let cfg = EditorConfig {
        handle_radius: -1.0,
        ..EditorConfig::default()
    };
    assert!(Editor::new(Size::new(10.0, 10.0), cfg).is_err());
}

#[test]
fn new_layers_are_centered_with_defaults() {
    let mut ed = editor();
    let t = ed.add_text("hello");
    let o = ed.layers().get(t).unwrap();
    assert_eq!(o.position(), Point::new(150.0, 150.0));
    assert_eq!(o.as_text().unwrap().font_size(), 32.0);

    let bitmap = Bitmap::from_straight_rgba8(4, 2, vec![255u8; 32]).unwrap();
    let i = ed.add_image_bitmap(bitmap);
    let img = ed.layers().get(i).unwrap().as_image().unwrap();
    assert!((img.width() - 90.0).abs() < 1e-9);
    assert!((img.height() - 45.0).abs() < 1e-9);
}

#[test]
fn decode_failure_leaves_layers_unchanged() {
    let mut ed = editor();
    let events = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&events);
    ed.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));
    assert!(matches!(
        ed.add_image(b"definitely not an image"),
        Err(CodelayerError::Decode(_))
    ));
    assert!(ed.layers().is_empty());
    assert_eq!(*events.borrow(), 0);
}

#[test]
fn pointer_down_selects_and_miss_clears() {
    let mut ed = editor();
    let o = square(&mut ed);
    let actions = ed.on_pointer_down(150.0, 150.0);
    let sel = Selection {
        id: o,
        kind: OverlayKind::Image,
    };
    assert!(actions.contains(&Action::SelectionChanged(Some(sel))));
    assert_eq!(ed.selection(), Some(sel));
    assert!(matches!(ed.drag_state(), DragState::Dragging(s) if s.mode == HitMode::Move));
    ed.on_pointer_up(150.0, 150.0);

    let actions = ed.on_pointer_down(400.0, 400.0);
    // outside the view box maps outside every layer
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert_eq!(ed.selection(), None);
    assert_eq!(ed.drag_state(), DragState::Idle);
}

#[test]
fn drag_moves_overlay_after_tick() {
    let mut ed = editor();
    let o = square(&mut ed);
    ed.on_pointer_down(150.0, 150.0);
    assert_eq!(ed.on_pointer_move(200.0, 160.0), vec![Action::RequestFrame]);
    assert!(ed.on_pointer_move(250.0, 180.0).is_empty());
    assert_eq!(ed.layers().get(o).unwrap().position(), Point::new(150.0, 150.0));
    assert_eq!(ed.tick(), vec![Action::Redraw]);
    assert_eq!(ed.layers().get(o).unwrap().position(), Point::new(250.0, 180.0));
    assert!(ed.tick().is_empty());
}

#[test]
fn release_before_frame_drops_the_update() {
    let mut ed = editor();
    let o = square(&mut ed);
    ed.on_pointer_down(150.0, 150.0);
    ed.on_pointer_move(250.0, 180.0);
    ed.on_pointer_cancel(250.0, 180.0);
    assert!(ed.tick().is_empty());
    assert_eq!(ed.layers().get(o).unwrap().position(), Point::new(150.0, 150.0));
}

#[test]
fn deleting_dragged_overlay_forces_idle() {
    let mut ed = editor();
    let o = square(&mut ed);
    ed.on_pointer_down(150.0, 150.0);
    ed.on_pointer_move(160.0, 150.0);
    let actions = ed.delete(o);
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert_eq!(ed.drag_state(), DragState::Idle);
    assert!(ed.tick().is_empty());
    assert!(ed.on_pointer_move(170.0, 150.0).is_empty());
}

#[test]
fn delete_other_keeps_selection() {
    let mut ed = editor();
    let a = square(&mut ed);
    let b = ed.add_text("other");
    ed.select(a);
    let actions = ed.delete(b);
    assert_eq!(actions, vec![Action::Redraw]);
    assert_eq!(ed.selection().map(|s| s.id), Some(a));
    assert!(ed.delete(b).is_empty());
}

#[test]
fn rotate_and_resize_through_handles() {
    let mut ed = editor();
    let o = square(&mut ed);
    assert_eq!(ed.hover(150.0, 80.0), Some(HitMode::Rotate));
    ed.on_pointer_down(150.0, 80.0);
    ed.on_pointer_move(250.0, 150.0);
    ed.tick();
    ed.on_pointer_up(250.0, 150.0);
    assert!((ed.layers().get(o).unwrap().rotation_deg() - 90.0).abs() < 1e-9);

    // bottom-right handle of a 90 degree rotated square sits at world (100, 200)
    assert_eq!(ed.hover(100.0, 200.0), Some(HitMode::Resize));
    ed.on_pointer_down(100.0, 200.0);
    ed.on_pointer_move(150.0, 210.0);
    ed.tick();
    ed.on_pointer_up(150.0, 210.0);
    let img = ed.layers().get(o).unwrap().as_image().unwrap();
    assert!((img.width() - 120.0).abs() < 1e-9);
    assert!((img.height() - 120.0).abs() < 1e-9);
}

#[test]
fn events_without_view_are_ignored() {
    let mut ed = editor();
    square(&mut ed);
    ed.set_view(None);
    assert!(ed.on_pointer_down(150.0, 150.0).is_empty());
    assert_eq!(ed.drag_state(), DragState::Idle);
    assert_eq!(ed.hover(150.0, 150.0), None);
}

#[test]
fn second_down_during_drag_is_ignored() {
    let mut ed = editor();
    let a = square(&mut ed);
    ed.on_pointer_down(150.0, 150.0);
    assert!(ed.handle(PointerEvent::new(PointerKind::Down, 10.0, 10.0)).is_empty());
    assert_eq!(ed.selection().map(|s| s.id), Some(a));
}

#[test]
fn preview_applies_pending_update_first() {
    let mut ed = editor();
    let o = square(&mut ed);
    ed.on_pointer_down(150.0, 150.0);
    ed.on_pointer_move(100.0, 100.0);
    let outcome = ed.render_preview(1.0).unwrap();
    assert!(!outcome.base_valid);
    assert_eq!(ed.layers().get(o).unwrap().position(), Point::new(100.0, 100.0));
}

#[test]
fn hover_sees_buffered_move() {
    let mut ed = editor();
    let o = square(&mut ed);
    ed.on_pointer_down(150.0, 150.0);
    ed.on_pointer_move(100.0, 100.0);
    // the square now spans 50..150, so its old interior is empty
    assert_eq!(ed.hover(190.0, 190.0), None);
    assert_eq!(ed.layers().get(o).unwrap().position(), Point::new(100.0, 100.0));
    assert_eq!(ed.hover(100.0, 100.0), Some(HitMode::Move));
}

#[test]
fn export_applies_buffered_move() {
    let mut ed = editor();
    let bitmap = Bitmap::from_straight_rgba8(1, 1, vec![255, 0, 0, 255]).unwrap();
    let o = ed.add_image_bitmap(bitmap);
    ed.set_image_width(o, 40.0).unwrap();
    ed.on_pointer_down(150.0, 150.0);
    ed.on_pointer_move(60.0, 60.0);

    let png = ed
        .render_export(ExportRequest {
            target_width: 300,
            format: crate::render::export::ExportFormat::Png,
        })
        .unwrap();
    assert_eq!(ed.layers().get(o).unwrap().position(), Point::new(60.0, 60.0));
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(60, 60).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(150, 150).0, [255, 255, 255, 255]);
}

#[test]
fn invalid_base_still_renders_and_reports() {
    let mut ed = editor();
    let base = Bitmap::from_straight_rgba8(1, 1, vec![0, 0, 0, 255]).unwrap();
    ed.set_base(BaseImage::Raster(base));
    assert!(ed.render_preview(0.5).unwrap().base_valid);
    ed.set_base_invalid();
    let outcome = ed.render_preview(0.5).unwrap();
    assert!(!outcome.base_valid);
    assert_eq!(outcome.frame.pixel(10, 10).unwrap(), [255, 255, 255, 255]);
}

#[test]
fn svg_export_rejected_once_overlays_exist() {
    let mut ed = editor();
    ed.load_base(
        br#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="30"><rect width="30" height="30"/></svg>"#,
    )
    .unwrap();
    let req = ExportRequest {
        target_width: 60,
        format: crate::render::export::ExportFormat::Svg,
    };
    assert!(ed.render_export(req).is_ok());
    ed.add_text("x");
    assert!(matches!(
        ed.render_export(req),
        Err(CodelayerError::ExportRejected(_))
    ));
}

#[test]
fn property_edits_notify_observers() {
    let mut ed = editor();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    ed.subscribe(Box::new(move |e| sink.borrow_mut().push(*e)));
    let t = ed.add_text("a");
    ed.set_text(t, "ab").unwrap();
    ed.set_font_size(t, 1.0).unwrap();
    assert_eq!(ed.layers().get(t).unwrap().as_text().unwrap().font_size(), 4.0);
    assert_eq!(
        *seen.borrow(),
        vec![
            LayerEvent::Added(t),
            LayerEvent::Changed(t),
            LayerEvent::Changed(t)
        ]
    );
}
