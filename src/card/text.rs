//! Card text: system font discovery and centered line rasterization.

use anyhow::{Context, Result};
use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use tiny_skia::Pixmap;

use crate::config::{FontOptions, Rgb};

/// Resolve the card font. An explicit file path wins; otherwise the
/// configured family is looked up among the system fonts, falling back to
/// any bold sans-serif.
pub fn load_font(options: &FontOptions) -> Result<FontArc> {
    if let Some(path) = &options.path {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        return FontArc::try_from_vec(bytes)
            .with_context(|| format!("failed to parse font file {}", path.display()));
    }

    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let mut families = Vec::new();
    if let Some(family) = &options.family {
        families.push(fontdb::Family::Name(family));
    }
    families.push(fontdb::Family::SansSerif);

    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::BOLD,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db
        .query(&query)
        .context("no usable font found on this system; set font.path in the config")?;
    let face = db
        .with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
        })
        .context("failed to read font face data")?
        .context("failed to parse font face")?;
    Ok(FontArc::from(face))
}

/// Substitute `{name}` in a line template. With no name the placeholder
/// collapses and surrounding whitespace is trimmed.
pub fn interpolate(template: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => template.replace("{name}", name),
        None => template.replace("{name}", "").trim().to_string(),
    }
}

/// Advance width of `text` at `scale`, kerning included.
pub fn measure_width(font: &FontArc, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    width
}

/// Draw one line centered on `center_x` with its baseline at `baseline_y`.
pub fn draw_line_centered(
    pixmap: &mut Pixmap,
    font: &FontArc,
    size: f32,
    color: Rgb,
    center_x: f32,
    baseline_y: f32,
    text: &str,
) {
    let scale = PxScale::from(size);
    let start_x = center_x - measure_width(font, scale, text) / 2.0;
    draw_line(pixmap, font, scale, start_x, baseline_y, color, text);
}

// Glyph coverage is blended straight into the pixmap bytes. The card canvas
// is opaque by the time text draws (the background layer fills it), so the
// premultiplied buffer can be treated as straight RGB here.
fn draw_line(
    pixmap: &mut Pixmap,
    font: &FontArc,
    scale: PxScale,
    x: f32,
    baseline_y: f32,
    color: Rgb,
    text: &str,
) {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut caret = point(x, baseline_y);
    let scaled_font = font.as_scaled(scale);
    let mut previous = None;

    for ch in text.chars() {
        let glyph_id = scaled_font.glyph_id(ch);
        if let Some(prev) = previous {
            caret.x += scaled_font.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, caret);
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let origin_x = bounds.min.x.floor() as i32;
            let origin_y = bounds.min.y.floor() as i32;
            let data = pixmap.data_mut();
            outlined.draw(|gx, gy, v| {
                let px = origin_x + gx as i32;
                let py = origin_y + gy as i32;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= width || py >= height {
                    return;
                }
                let alpha = (v * 255.0).round() as u16;
                let inv = 255 - alpha;
                let idx = ((py * width + px) * 4) as usize;
                let dst = &mut data[idx..idx + 4];
                dst[0] = ((dst[0] as u16 * inv + color.r() as u16 * alpha) / 255) as u8;
                dst[1] = ((dst[1] as u16 * inv + color.g() as u16 * alpha) / 255) as u8;
                dst[2] = ((dst[2] as u16 * inv + color.b() as u16 * alpha) / 255) as u8;
                dst[3] = 255;
            });
        }
        caret.x += scaled_font.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_substitutes_name() {
        assert_eq!(
            interpolate("Hello, I'm {name}", Some("Ada")),
            "Hello, I'm Ada"
        );
    }

    #[test]
    fn interpolate_without_name_collapses_placeholder() {
        assert_eq!(interpolate("Hello, I'm {name}", None), "Hello, I'm");
        assert_eq!(interpolate("no placeholder", None), "no placeholder");
    }

    #[test]
    fn centered_text_marks_pixels_around_center() {
        let Ok(font) = load_font(&FontOptions::default()) else {
            // Host has no fonts installed; nothing to rasterize against.
            return;
        };
        let mut pixmap = Pixmap::new(400, 100).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 255, 255, 255));
        draw_line_centered(
            &mut pixmap,
            &font,
            40.0,
            Rgb([0, 0, 0]),
            200.0,
            70.0,
            "HELLO",
        );
        let image = crate::raster::image_from_pixmap(&pixmap);
        let darkened = image.pixels().filter(|p| p[0] < 128).count();
        assert!(darkened > 0, "expected glyph coverage on the canvas");
        // Centering: no ink in the far left/right margins.
        for x in 0..40 {
            for y in 0..100 {
                assert_eq!(image.get_pixel(x, y)[0], 255);
                assert_eq!(image.get_pixel(399 - x, y)[0], 255);
            }
        }
    }
}
