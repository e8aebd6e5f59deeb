//! Card compositor: a strictly ordered layer pipeline over a fixed-size
//! pixmap. Stages that depend on art files await their decode before the
//! next stage draws, so the final layering never depends on load timing.

use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use anyhow::{Context, Result, bail};
use image::RgbaImage;
use rand::Rng;
use tiny_skia::{
    FillRule, GradientStop, LinearGradient, Mask, Paint, Path as SkiaPath, PathBuilder, Pixmap,
    PixmapPaint, Point, Rect, SpreadMode, Stroke, Transform,
};
use tracing::debug;

use crate::card::{decor, text};
use crate::config::{Background, CardTemplate, PhotoRegion, RegionShape, Rgb};
use crate::raster;

pub struct Compositor {
    template: CardTemplate,
    font: Option<FontArc>,
}

impl Compositor {
    /// A template with text lines needs a font up front; templates without
    /// text never touch one.
    pub fn new(template: CardTemplate, font: Option<FontArc>) -> Result<Self> {
        if !template.text.is_empty() && font.is_none() {
            bail!("template has text layers but no font was provided");
        }
        Ok(Self { template, font })
    }

    pub fn template(&self) -> &CardTemplate {
        &self.template
    }

    /// Run the layer pipeline and return the finished card. The stages run
    /// in a fixed order — background, stars, confetti, photo, border, text,
    /// overlay — and each asset-backed stage awaits its decode first.
    pub async fn compose(
        &self,
        photo: &RgbaImage,
        name: Option<&str>,
        rng: &mut impl Rng,
    ) -> Result<RgbaImage> {
        let width = self.template.width;
        let height = self.template.height;
        let mut pixmap = Pixmap::new(width, height).context("card dimensions must be positive")?;

        match &self.template.background {
            Background::LinearGradient { start, end } => {
                fill_gradient(&mut pixmap, *start, *end)?;
            }
            Background::Image { path } => {
                let art = load_art(path).await?;
                draw_cover_art(&mut pixmap, &art)?;
            }
        }
        debug!(width, height, "background layer done");

        if let Some(stars) = &self.template.stars {
            decor::draw_stars(&mut pixmap, stars);
        }
        if let Some(confetti) = &self.template.confetti {
            let pieces = decor::scatter_confetti(confetti, width as f32, height as f32, rng);
            decor::draw_confetti(&mut pixmap, &pieces);
        }

        if let Some(region) = &self.template.photo {
            draw_photo_layer(&mut pixmap, region, photo)?;
        }

        for line in &self.template.text {
            let font = self
                .font
                .as_ref()
                .context("template has text layers but no font was provided")?;
            let content = text::interpolate(&line.template, name);
            text::draw_line_centered(
                &mut pixmap,
                font,
                line.size,
                line.color,
                width as f32 / 2.0,
                line.baseline,
                &content,
            );
        }

        if let Some(path) = &self.template.overlay {
            let art = load_art(path).await?;
            draw_cover_art(&mut pixmap, &art)?;
            debug!(path = %path.display(), "overlay layer done");
        }

        Ok(raster::image_from_pixmap(&pixmap))
    }
}

/// Output filename: `<name>-<stem>.png` with the name sanitized for a
/// filesystem, or `<stem>.png` when no name was given.
pub fn card_file_name(template: &CardTemplate, name: Option<&str>) -> String {
    match name.and_then(sanitize_name) {
        Some(name) => format!("{name}-{}.png", template.file_stem),
        None => format!("{}.png", template.file_stem),
    }
}

fn sanitize_name(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Decode an art asset off the runtime threads. Callers await this before
/// drawing the next layer.
async fn load_art(path: &Path) -> Result<RgbaImage> {
    let owned: PathBuf = path.to_path_buf();
    let decoded = tokio::task::spawn_blocking(move || {
        image::ImageReader::open(&owned)
            .with_context(|| format!("failed to open art asset {}", owned.display()))?
            .with_guessed_format()
            .with_context(|| format!("failed to sniff art asset {}", owned.display()))?
            .decode()
            .with_context(|| format!("failed to decode art asset {}", owned.display()))
    })
    .await
    .context("art decode task failed")??;
    Ok(decoded.to_rgba8())
}

/// Diagonal two-stop gradient across the full canvas.
fn fill_gradient(pixmap: &mut Pixmap, start: Rgb, end: Rgb) -> Result<()> {
    let w = pixmap.width() as f32;
    let h = pixmap.height() as f32;
    let shader = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(w, h),
        vec![
            GradientStop::new(
                0.0,
                tiny_skia::Color::from_rgba8(start.r(), start.g(), start.b(), 255),
            ),
            GradientStop::new(
                1.0,
                tiny_skia::Color::from_rgba8(end.r(), end.g(), end.b(), 255),
            ),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
    .context("degenerate gradient")?;
    let paint = Paint {
        shader,
        ..Paint::default()
    };
    let rect = Rect::from_xywh(0.0, 0.0, w, h).context("degenerate canvas rect")?;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    Ok(())
}

/// Cover-fit a full-canvas art layer (background or foreground overlay).
fn draw_cover_art(pixmap: &mut Pixmap, art: &RgbaImage) -> Result<()> {
    let fitted = raster::cover_into(art, pixmap.width(), pixmap.height())?;
    let art_pixmap = raster::pixmap_from_image(&fitted)?;
    pixmap.draw_pixmap(
        0,
        0,
        art_pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(())
}

/// Photo layer: clip to the region shape, cover-fit the photo into the
/// region, draw, then stroke the optional border. The clip mask lives only
/// for the photo draw — later layers are unclipped.
fn draw_photo_layer(pixmap: &mut Pixmap, region: &PhotoRegion, photo: &RgbaImage) -> Result<()> {
    let path = region_path(region)?;

    let mut mask =
        Mask::new(pixmap.width(), pixmap.height()).context("mask dimensions must be positive")?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());

    let region_w = (region.width.round() as u32).max(1);
    let region_h = (region.height.round() as u32).max(1);
    let fitted = raster::cover_into(photo, region_w, region_h)?;
    let photo_pixmap = raster::pixmap_from_image(&fitted)?;
    pixmap.draw_pixmap(
        region.x.round() as i32,
        region.y.round() as i32,
        photo_pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        Some(&mask),
    );

    if let Some(border) = &region.border {
        let mut paint = Paint::default();
        paint.set_color_rgba8(border.color.r(), border.color.g(), border.color.b(), 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: border.width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
    Ok(())
}

fn region_path(region: &PhotoRegion) -> Result<SkiaPath> {
    match region.shape {
        RegionShape::Circle => {
            let radius = region.width.min(region.height) / 2.0;
            let cx = region.x + region.width / 2.0;
            let cy = region.y + region.height / 2.0;
            PathBuilder::from_circle(cx, cy, radius).context("degenerate circle region")
        }
        RegionShape::RoundedRect { radius } => {
            rounded_rect_path(region.x, region.y, region.width, region.height, radius)
                .context("degenerate rounded-rect region")
        }
    }
}

/// Rounded rectangle with uniform corner radius, corners as quadratic arcs.
fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<SkiaPath> {
    let r = radius.clamp(0.0, w.min(h) / 2.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}
