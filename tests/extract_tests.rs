use cardsmith::crop::editor::CropRect;
use cardsmith::crop::extract::extract;
use cardsmith::geometry::FitTransform;
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source raster whose pixels encode their own coordinates, so any extracted
/// region can be traced back to where it came from.
fn coordinate_tagged(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 251) as u8, (y % 251) as u8, ((x + y) % 251) as u8, 255])
    })
}

#[test]
fn reference_scenario_extracts_expected_region() {
    // 800x600 photo, 400x300 canvas: scale 0.5, offsets (0, 0).
    // Rect (125, 75, 150) -> source origin (250, 150), size 300x300.
    let source = coordinate_tagged(800, 600);
    let rect = CropRect {
        x: 125.0,
        y: 75.0,
        width: 150.0,
        height: 150.0,
    };
    let out = extract(&source, &rect, 400.0, 300.0);
    assert_eq!(out.dimensions(), (300, 300));
    assert_eq!(out.get_pixel(0, 0), source.get_pixel(250, 150));
    assert_eq!(out.get_pixel(299, 299), source.get_pixel(549, 449));
}

#[test]
fn round_trip_reproduces_source_coordinates() {
    let mut rng = StdRng::seed_from_u64(41);
    let source = coordinate_tagged(1024, 768);

    for _ in 0..200 {
        let canvas_w = rng.random_range(100.0_f32..500.0).round();
        let canvas_h = (canvas_w * 0.75).round();
        let size = rng.random_range(50.0_f32..canvas_h.min(canvas_w)).round();
        let rect = CropRect {
            x: rng.random_range(0.0..=(canvas_w - size)).round(),
            y: rng.random_range(0.0..=(canvas_h - size)).round(),
            width: size,
            height: size,
        };

        let out = extract(&source, &rect, canvas_w, canvas_h);

        // Re-derive the source-space rectangle from the same transform.
        let fit = FitTransform::contain(canvas_w, canvas_h, 1024.0, 768.0);
        let (sx, sy) = fit.to_source_clamped(rect.x, rect.y, 1024.0, 768.0);
        let expected_w = (1024.0 - sx).min(rect.width / fit.scale);
        let expected_h = (768.0 - sy).min(rect.height / fit.scale);

        assert!(
            (out.width() as f32 - expected_w).abs() <= 1.0,
            "width {} vs expected {expected_w}",
            out.width()
        );
        assert!(
            (out.height() as f32 - expected_h).abs() <= 1.0,
            "height {} vs expected {expected_h}",
            out.height()
        );
        // The first pixel of the output is the pixel at the mapped origin.
        assert_eq!(
            out.get_pixel(0, 0),
            source.get_pixel(sx.round() as u32, sy.round() as u32)
        );
    }
}

#[test]
fn output_size_scales_with_zoom_level() {
    // The same on-canvas rect selects more source pixels when the photo is
    // larger, because extraction works in source resolution.
    let rect = CropRect {
        x: 100.0,
        y: 100.0,
        width: 100.0,
        height: 100.0,
    };
    let small = extract(&coordinate_tagged(400, 300), &rect, 400.0, 300.0);
    let large = extract(&coordinate_tagged(1600, 1200), &rect, 400.0, 300.0);
    assert_eq!(small.dimensions(), (100, 100));
    assert_eq!(large.dimensions(), (400, 400));
}
