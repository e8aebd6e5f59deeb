//! Procedural card decorations: star polygons at fixed positions and
//! randomly scattered confetti.

use std::f32::consts::PI;

use rand::Rng;
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};

use crate::config::{ConfettiOptions, Rgb, StarField};

/// Closed n-pointed star: vertices alternate between the outer and inner
/// radius every half-step around the circle.
pub fn star_path(cx: f32, cy: f32, outer: f32, inner: f32, points: u32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for i in 0..points * 2 {
        let radius = if i % 2 == 0 { outer } else { inner };
        let angle = i as f32 * PI / points as f32;
        let px = cx + angle.cos() * radius;
        let py = cy + angle.sin() * radius;
        if i == 0 {
            pb.move_to(px, py);
        } else {
            pb.line_to(px, py);
        }
    }
    pb.close();
    pb.finish()
}

pub fn draw_stars(pixmap: &mut Pixmap, field: &StarField) {
    let paint = fill_paint(field.color);
    for &(x, y) in &field.positions {
        if let Some(path) = star_path(x, y, field.outer_radius, field.inner_radius, field.points) {
            pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

/// One confetti piece: a square rotated about its own center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confetto {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub angle_deg: f32,
    pub color: Rgb,
}

/// Sample confetti placements. The rng is injected so generation stays
/// seedable under test while production seeds from the OS per card.
pub fn scatter_confetti(
    options: &ConfettiOptions,
    width: f32,
    height: f32,
    rng: &mut impl Rng,
) -> Vec<Confetto> {
    (0..options.count)
        .map(|_| Confetto {
            x: rng.random_range(0.0..width),
            y: rng.random_range(0.0..height),
            size: rng.random_range(options.min_size..=options.max_size),
            angle_deg: rng.random_range(0.0..360.0),
            color: options.palette[rng.random_range(0..options.palette.len())],
        })
        .collect()
}

pub fn draw_confetti(pixmap: &mut Pixmap, pieces: &[Confetto]) {
    for piece in pieces {
        let Some(rect) = Rect::from_xywh(
            piece.x - piece.size / 2.0,
            piece.y - piece.size / 2.0,
            piece.size,
            piece.size,
        ) else {
            continue;
        };
        let paint = fill_paint(piece.color);
        pixmap.fill_rect(
            rect,
            &paint,
            Transform::from_rotate_at(piece.angle_deg, piece.x, piece.y),
            None,
        );
    }
}

fn fill_paint<'a>(color: Rgb) -> Paint<'a> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), 255);
    paint.anti_alias = true;
    paint
}
