use super::*;

fn image_overlay(w: u32, h: u32, width: f64) -> Overlay {
    let bitmap = Bitmap::from_straight_rgba8(w, h, vec![255u8; (w * h * 4) as usize]).unwrap();
    let mut layer = ImageLayer {
        bitmap,
        width: 1.0,
        height: 1.0,
    };
    layer.set_width_locked(width, 4.0);
    Overlay {
        id: OverlayId(1),
        position: Point::new(150.0, 150.0),
        rotation_deg: 0.0,
        content: OverlayContent::Image(layer),
    }
}

fn text_overlay(align: TextAlign) -> Overlay {
    Overlay {
        id: OverlayId(2),
        position: Point::new(0.0, 0.0),
        rotation_deg: 0.0,
        content: OverlayContent::Text(TextLayer {
            text: "hi".to_string(),
            font_size: 10.0,
            style: TextStyle {
                align,
                ..TextStyle::default()
            },
            extents: TextExtents {
                width: 40.0,
                ascent: 8.0,
                descent: 2.0,
            },
        }),
    }
}

#[test]
fn image_bounds_are_centered_on_the_anchor() {
    let o = image_overlay(10, 10, 100.0);
    assert_eq!(o.kind(), OverlayKind::Image);
    assert_eq!(o.local_bounds(), Rect::new(-50.0, -50.0, 50.0, 50.0));
    assert_eq!(o.resize_handle_local(), Point::new(50.0, 50.0));
    assert_eq!(o.rotate_handle_local(20.0), Point::new(0.0, -70.0));
}

#[test]
fn text_bounds_follow_alignment() {
    assert_eq!(
        text_overlay(TextAlign::Left).local_bounds(),
        Rect::new(0.0, -8.0, 40.0, 2.0)
    );
    assert_eq!(
        text_overlay(TextAlign::Center).local_bounds(),
        Rect::new(-20.0, -8.0, 20.0, 2.0)
    );
    assert_eq!(
        text_overlay(TextAlign::Right).local_bounds(),
        Rect::new(-40.0, -8.0, 0.0, 2.0)
    );
    let right = text_overlay(TextAlign::Right);
    assert_eq!(right.rotate_handle_local(20.0), Point::new(-20.0, -28.0));
}

#[test]
fn locked_width_keeps_natural_aspect_and_minimum() {
    let mut o = image_overlay(20, 10, 100.0);
    let OverlayContent::Image(img) = &mut o.content else {
        panic!("expected image");
    };
    assert!((img.height() - 50.0).abs() < 1e-12);

    img.set_width_locked(1.0, 4.0);
    // min height 4 forces width 8 at aspect 0.5
    assert!((img.width() - 8.0).abs() < 1e-12);
    assert!((img.height() - 4.0).abs() < 1e-12);

    img.set_width_locked(f64::NAN, 4.0);
    assert!((img.width() - 8.0).abs() < 1e-12);
}

#[test]
fn remeasure_uses_current_font_spec() {
    let mut o = text_overlay(TextAlign::Left);
    let OverlayContent::Text(t) = &mut o.content else {
        panic!("expected text");
    };
    t.remeasure(&mut crate::assets::text::ApproxMetrics);
    assert!((t.extents().width - 12.0).abs() < 1e-9);
    assert_eq!(t.font_spec().size, 10.0);
}
