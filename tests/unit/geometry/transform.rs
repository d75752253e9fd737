use super::*;

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn to_logical_accounts_for_css_and_preview_scale() {
    let view = CanvasView {
        rect: Rect::new(100.0, 50.0, 300.0, 250.0),
        backing: Size::new(400.0, 400.0),
        preview_scale: 2.0,
    };
    // 2 backing px per css px, 2 backing px per logical unit
    let p = view.to_logical(Point::new(150.0, 100.0)).unwrap();
    assert!(close(p, Point::new(50.0, 50.0)));
}

#[test]
fn degenerate_view_yields_none() {
    let mut view = CanvasView::identity(Size::new(100.0, 100.0));
    view.rect = Rect::new(0.0, 0.0, 0.0, 100.0);
    assert!(view.to_logical(Point::new(1.0, 1.0)).is_none());

    let mut view = CanvasView::identity(Size::new(100.0, 100.0));
    view.preview_scale = 0.0;
    assert!(view.to_logical(Point::new(1.0, 1.0)).is_none());
    let view = CanvasView::identity(Size::new(100.0, 100.0));
    assert!(view.to_logical(Point::new(f64::NAN, 1.0)).is_none());
}

#[test]
fn to_local_undoes_rotation() {
    let center = Point::new(150.0, 150.0);
    // +90 degrees turns local +x into world +y on a y-down canvas
    let world = Point::new(150.0, 200.0);
    assert!(close(to_local(world, center, 90.0), Point::new(50.0, 0.0)));
    assert!(close(to_world(Point::new(50.0, 0.0), center, 90.0), world));
}

#[test]
fn local_world_round_trip_does_not_drift() {
    let center = Point::new(12.5, -7.0);
    let original = Point::new(3.0, 4.0);
    let mut p = original;
    for i in 0..1000 {
        let deg = i as f64 * 7.3;
        p = to_local(to_world(p, center, deg), center, deg);
    }
    assert!(close(p, original));
}
