//! Crop preview renderer: the fit-scaled photo, a dimmed surround, the
//! bright crop window with a rule-of-thirds grid, and the grab markers.

use anyhow::{Context, Result};
use image::RgbaImage;
use tiny_skia::{Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, StrokeDash, Transform};

use crate::config::EditorOptions;
use crate::crop::editor::{CropRect, Handle};
use crate::geometry::FitTransform;
use crate::raster;

const MATTE: [u8; 4] = [17, 24, 39, 255];
const ACCENT: [u8; 4] = [0x3B, 0x82, 0xF6, 255];
const DIM: [u8; 4] = [0, 0, 0, 128];
const MARKER_INSET: [u8; 4] = [255, 255, 255, 255];

/// Render the editor viewport. Pure function of its inputs: identical inputs
/// produce identical rasters.
pub fn render_preview(
    source: &RgbaImage,
    rect: &CropRect,
    canvas_w: u32,
    canvas_h: u32,
    options: &EditorOptions,
) -> Result<RgbaImage> {
    let mut pixmap =
        Pixmap::new(canvas_w, canvas_h).context("preview canvas must have positive dimensions")?;
    pixmap.fill(color(MATTE));

    draw_fitted_photo(&mut pixmap, source, canvas_w, canvas_h)?;
    dim_outside(&mut pixmap, rect, canvas_w as f32, canvas_h as f32);
    stroke_window(&mut pixmap, rect);
    draw_thirds_grid(&mut pixmap, rect);
    draw_markers(&mut pixmap, rect, options);

    Ok(raster::image_from_pixmap(&pixmap))
}

fn color(rgba: [u8; 4]) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn solid_paint<'a>(rgba: [u8; 4]) -> Paint<'a> {
    let mut paint = Paint::default();
    paint.set_color(color(rgba));
    paint.anti_alias = true;
    paint
}

fn draw_fitted_photo(
    pixmap: &mut Pixmap,
    source: &RgbaImage,
    canvas_w: u32,
    canvas_h: u32,
) -> Result<()> {
    let fit = FitTransform::contain(
        canvas_w as f32,
        canvas_h as f32,
        source.width() as f32,
        source.height() as f32,
    );
    let (sw, sh) = fit.scaled_size(source.width() as f32, source.height() as f32);
    let scaled = raster::resize_rgba(
        source,
        (sw.round() as u32).max(1),
        (sh.round() as u32).max(1),
    )?;
    let photo = raster::pixmap_from_image(&scaled)?;
    pixmap.draw_pixmap(
        fit.offset_x.round() as i32,
        fit.offset_y.round() as i32,
        photo.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(())
}

/// Darken everything outside the crop window; the window itself keeps the
/// photo at full brightness.
fn dim_outside(pixmap: &mut Pixmap, rect: &CropRect, canvas_w: f32, canvas_h: f32) {
    let paint = solid_paint(DIM);
    let strips = [
        (0.0, 0.0, canvas_w, rect.y),
        (0.0, rect.bottom(), canvas_w, canvas_h - rect.bottom()),
        (0.0, rect.y, rect.x, rect.height),
        (rect.right(), rect.y, canvas_w - rect.right(), rect.height),
    ];
    for (x, y, w, h) in strips {
        if let Some(r) = Rect::from_xywh(x, y, w, h) {
            pixmap.fill_rect(r, &paint, Transform::identity(), None);
        }
    }
}

fn stroke_window(pixmap: &mut Pixmap, rect: &CropRect) {
    if let Some(r) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
        let stroke = Stroke {
            width: 3.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &PathBuilder::from_rect(r),
            &solid_paint(ACCENT),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}

/// Two vertical and two horizontal dashed guides splitting the window into
/// thirds.
fn draw_thirds_grid(pixmap: &mut Pixmap, rect: &CropRect) {
    let mut pb = PathBuilder::new();
    for i in 1..=2 {
        let x = rect.x + rect.width * i as f32 / 3.0;
        pb.move_to(x, rect.y);
        pb.line_to(x, rect.bottom());
        let y = rect.y + rect.height * i as f32 / 3.0;
        pb.move_to(rect.x, y);
        pb.line_to(rect.right(), y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width: 1.0,
        dash: StrokeDash::new(vec![5.0, 5.0], 0.0),
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &path,
        &solid_paint(ACCENT),
        &stroke,
        Transform::identity(),
        None,
    );
}

/// Each active grab point: an accent square with a white inset, sized for
/// touch.
fn draw_markers(pixmap: &mut Pixmap, rect: &CropRect, options: &EditorOptions) {
    let size = options.marker_size;
    for handle in Handle::for_layout(options.layout) {
        let Some((cx, cy)) = handle.marker(rect) else {
            continue;
        };
        fill_centered_square(pixmap, cx, cy, size, ACCENT);
        fill_centered_square(pixmap, cx, cy, size - 4.0, MARKER_INSET);
    }
}

fn fill_centered_square(pixmap: &mut Pixmap, cx: f32, cy: f32, size: f32, rgba: [u8; 4]) {
    if let Some(r) = Rect::from_xywh(cx - size / 2.0, cy - size / 2.0, size, size) {
        pixmap.fill_rect(r, &solid_paint(rgba), Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample_inputs() -> (RgbaImage, CropRect, EditorOptions) {
        let source = RgbaImage::from_pixel(800, 600, Rgba([200, 200, 200, 255]));
        let rect = CropRect {
            x: 125.0,
            y: 75.0,
            width: 150.0,
            height: 150.0,
        };
        (source, rect, EditorOptions::default())
    }

    #[test]
    fn redraw_is_idempotent() {
        let (source, rect, options) = sample_inputs();
        let a = render_preview(&source, &rect, 400, 300, &options).unwrap();
        let b = render_preview(&source, &rect, 400, 300, &options).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn outside_is_dimmed_inside_stays_bright() {
        let (source, rect, options) = sample_inputs();
        let preview = render_preview(&source, &rect, 400, 300, &options).unwrap();
        // Center of the crop window keeps the photo at full brightness.
        let inside = preview.get_pixel(200, 150);
        assert_eq!(inside[0], 200);
        // Far corner of the photo is dimmed to roughly half.
        let outside = preview.get_pixel(10, 10);
        assert!(outside[0] < 120, "expected dimmed pixel, got {outside:?}");
    }

    #[test]
    fn marker_drawn_at_bottom_right_corner() {
        let (source, rect, options) = sample_inputs();
        let preview = render_preview(&source, &rect, 400, 300, &options).unwrap();
        // Marker inset is white; sample just inside the corner.
        let marker = preview.get_pixel(275, 225);
        assert_eq!(&marker.0[0..3], &[255, 255, 255]);
    }
}
