use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::assets::text::ApproxMetrics;

fn bitmap(w: u32, h: u32) -> Bitmap {
    Bitmap::from_straight_rgba8(w, h, vec![200u8; (w * h * 4) as usize]).unwrap()
}

fn list_with_three() -> (LayerList, [OverlayId; 3]) {
    let mut layers = LayerList::new();
    let a = layers.add_image(bitmap(4, 4), Point::new(10.0, 10.0), 20.0, 4.0);
    let b = layers.add_text(
        "b",
        Point::new(20.0, 20.0),
        16.0,
        4.0,
        TextStyle::default(),
        &mut ApproxMetrics,
    );
    let c = layers.add_image(bitmap(2, 4), Point::new(30.0, 30.0), 20.0, 4.0);
    (layers, [a, b, c])
}

#[test]
fn ids_are_unique_and_never_reused() {
    let (mut layers, [a, b, c]) = list_with_three();
    assert!(a < b && b < c);
    layers.remove(c).unwrap();
    let d = layers.add_image(bitmap(1, 1), Point::ZERO, 10.0, 4.0);
    assert!(d > c);
    assert_eq!(layers.ids(), vec![a, b, d]);
}

#[test]
fn new_image_uses_natural_aspect() {
    let (layers, [_, _, c]) = list_with_three();
    let img = layers.get(c).unwrap().as_image().unwrap();
    assert!((img.width() - 20.0).abs() < 1e-12);
    assert!((img.height() - 40.0).abs() < 1e-12);
}

#[test]
fn reorder_operations() {
    let (mut layers, [a, b, c]) = list_with_three();
    assert!(layers.bring_to_front(a));
    assert_eq!(layers.ids(), vec![b, c, a]);
    assert!(layers.send_to_back(c));
    assert_eq!(layers.ids(), vec![c, b, a]);
    assert!(layers.bring_forward(c));
    assert_eq!(layers.ids(), vec![b, c, a]);
    assert!(layers.send_backward(a));
    assert_eq!(layers.ids(), vec![b, a, c]);
    assert!(!layers.send_backward(b));
    assert!(!layers.bring_forward(c));
    assert!(!layers.move_to(OverlayId(99), 0));
    assert_eq!(
        layers.iter_topmost_first().map(|o| o.id()).collect::<Vec<_>>(),
        vec![c, a, b]
    );
}

#[test]
fn observers_see_every_mutation_in_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut layers = LayerList::new();
    let sink = Rc::clone(&seen);
    layers.subscribe(Box::new(move |e| sink.borrow_mut().push(*e)));

    let a = layers.add_image(bitmap(2, 2), Point::ZERO, 10.0, 4.0);
    let b = layers.add_image(bitmap(2, 2), Point::ZERO, 10.0, 4.0);
    layers.set_rotation(a, 45.0).unwrap();
    layers.bring_to_front(a);
    layers.remove(b);

    assert_eq!(
        *seen.borrow(),
        vec![
            LayerEvent::Added(a),
            LayerEvent::Added(b),
            LayerEvent::Changed(a),
            LayerEvent::Reordered,
            LayerEvent::Removed(b),
        ]
    );
}

#[test]
fn property_edits_validate_kind_and_id() {
    let (mut layers, [a, b, _]) = list_with_three();
    let mut m = ApproxMetrics;
    assert!(layers.set_text(a, "nope", &mut m).is_err());
    assert!(layers.set_image_width(b, 10.0, 4.0).is_err());
    assert!(layers.set_position(OverlayId(42), Point::ZERO).is_err());
    assert!(layers.set_rotation(a, f64::INFINITY).is_err());

    layers.set_text(b, "longer text", &mut m).unwrap();
    let t = layers.get(b).unwrap().as_text().unwrap();
    assert_eq!(t.text(), "longer text");
    assert!((t.extents().width - 11.0 * 0.6 * 16.0).abs() < 1e-9);

    layers.set_font_size(b, 0.5, 4.0, &mut m).unwrap();
    assert_eq!(layers.get(b).unwrap().as_text().unwrap().font_size(), 4.0);
}

#[test]
fn failed_edits_emit_nothing() {
    let (mut layers, [a, _, _]) = list_with_three();
    let count = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&count);
    layers.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));
    assert!(layers.set_text(a, "x", &mut ApproxMetrics).is_err());
    assert!(layers.remove(OverlayId(77)).is_none());
    assert_eq!(*count.borrow(), 0);
}

#[test]
fn selection_cleared_only_for_matching_id() {
    let mut sel = Some(Selection {
        id: OverlayId(3),
        kind: OverlayKind::Image,
    });
    assert!(!clear_selection_if(&mut sel, OverlayId(2)));
    assert!(sel.is_some());
    assert!(clear_selection_if(&mut sel, OverlayId(3)));
    assert!(sel.is_none());
}
