//! Maps a committed crop rectangle back into source pixel space and copies
//! that region out of the original photo.

use image::{RgbaImage, imageops};

use crate::crop::editor::CropRect;
use crate::geometry::FitTransform;

/// Extract the source region selected by `rect`. The fit transform is
/// recomputed from the canvas size the rectangle lives in, so both sides of
/// the mapping agree. The output raster is exactly the mapped region — its
/// size varies with the zoom level and the true photo resolution.
///
/// Out-of-range geometry is clamped, never reported: the result is always at
/// least 1x1 and fully inside the source.
pub fn extract(source: &RgbaImage, rect: &CropRect, canvas_w: f32, canvas_h: f32) -> RgbaImage {
    let natural_w = source.width() as f32;
    let natural_h = source.height() as f32;
    let fit = FitTransform::contain(canvas_w, canvas_h, natural_w, natural_h);

    let (src_x, src_y) = fit.to_source_clamped(rect.x, rect.y, natural_w, natural_h);
    let src_w = (natural_w - src_x).min(rect.width / fit.scale);
    let src_h = (natural_h - src_y).min(rect.height / fit.scale);

    let x = (src_x.round() as u32).min(source.width() - 1);
    let y = (src_y.round() as u32).min(source.height() - 1);
    let w = (src_w.round() as u32).clamp(1, source.width() - x);
    let h = (src_h.round() as u32).clamp(1, source.height() - y);

    imageops::crop_imm(source, x, y, w, h).to_image()
}
