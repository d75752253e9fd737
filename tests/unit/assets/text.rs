use super::*;

fn font(size: f64) -> FontSpec {
    FontSpec {
        family: "Inter".to_string(),
        size,
        weight: 400,
        italic: false,
    }
}

#[test]
fn approx_metrics_scale_linearly_with_size() {
    let small = ApproxMetrics.measure(&font(10.0), "abcd");
    let large = ApproxMetrics.measure(&font(20.0), "abcd");
    assert!((small.width - 24.0).abs() < 1e-9);
    assert!((large.width - 2.0 * small.width).abs() < 1e-9);
    assert!((large.ascent - 16.0).abs() < 1e-9);
    assert!((large.descent - 4.0).abs() < 1e-9);
}

#[test]
fn approx_metrics_use_widest_line_and_grow_downward() {
    let m = ApproxMetrics.measure(&font(10.0), "ab\nabcdef");
    assert!((m.width - 36.0).abs() < 1e-9);
    assert!((m.descent - (2.0 + 12.0)).abs() < 1e-9);
}

#[test]
fn engine_without_fonts_falls_back_to_approx_metrics() {
    let mut engine = TextEngine::new();
    assert!(!engine.has_fonts());
    let a = engine.measure(&font(12.0), "hello");
    let b = ApproxMetrics.measure(&font(12.0), "hello");
    assert_eq!(a, b);
    assert!(engine.shape(&font(12.0), "hello", Rgba8::BLACK).is_none());
}

#[test]
fn registering_garbage_font_bytes_fails() {
    let mut engine = TextEngine::new();
    assert!(engine.register_font(b"not a font".to_vec()).is_err());
    assert!(!engine.has_fonts());
}

fn tuffy() -> Vec<u8> {
    std::fs::read("tests/data/fonts/Tuffy.ttf").unwrap()
}

#[test]
fn registered_font_is_shaped_and_measured() {
    let mut engine = TextEngine::new();
    let family = engine.register_font(tuffy()).unwrap();
    assert!(!family.trim().is_empty());
    assert!(engine.has_fonts());

    let mut face = font(24.0);
    face.family = family;
    let m = engine.measure(&face, "Hello");
    assert!(m.width > 0.0 && m.ascent > 0.0 && m.descent >= 0.0, "{m:?}");
    assert_ne!(m, ApproxMetrics.measure(&face, "Hello"));

    let wider = engine.measure(&face, "Hello Hello");
    assert!(wider.width > m.width);
    let mut bigger = face.clone();
    bigger.size = 48.0;
    let doubled = engine.measure(&bigger, "Hello");
    assert!((doubled.width / m.width - 2.0).abs() < 0.05);

    let shaped = engine.shape(&face, "Hello", Rgba8::BLACK).unwrap();
    assert_eq!(layout_extents(&shaped.layout), m);
}

#[test]
fn unknown_family_falls_back_to_first_registered_font() {
    let mut engine = TextEngine::new();
    let family = engine.register_font(tuffy()).unwrap();
    let mut known = font(20.0);
    known.family = family;
    let mut unknown = font(20.0);
    unknown.family = "No Such Family".to_string();
    assert_eq!(engine.measure(&known, "abc"), engine.measure(&unknown, "abc"));
}
