//! Shared raster plumbing: conversions between the `image` crate's straight
//! RGBA buffers and tiny-skia's premultiplied pixmaps, plus quality scaling.

use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::{Rgba, RgbaImage, imageops};
use tiny_skia::{ColorU8, Pixmap};

use crate::geometry::cover_scale;

pub fn pixmap_from_image(img: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())
        .context("pixmap dimensions must be positive")?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

pub fn image_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// High-quality resize via a CatmullRom convolution.
pub fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        anyhow::bail!("resize dimensions must be positive");
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("resize failed")?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .context("failed to construct resized RGBA image")
}

/// Cover-fit `source` into a `region_w x region_h` raster: scale by the
/// larger axis ratio, then center-crop the overflow. The result is exactly
/// the region size with no letterboxing.
pub fn cover_into(source: &RgbaImage, region_w: u32, region_h: u32) -> Result<RgbaImage> {
    if region_w == 0 || region_h == 0 {
        anyhow::bail!("cover region must be positive");
    }
    let scale = cover_scale(
        region_w as f32,
        region_h as f32,
        source.width() as f32,
        source.height() as f32,
    );
    let scaled_w = ((source.width() as f32 * scale).round() as u32).max(region_w);
    let scaled_h = ((source.height() as f32 * scale).round() as u32).max(region_h);
    let resized = resize_rgba(source, scaled_w, scaled_h)?;
    let crop_x = (scaled_w - region_w) / 2;
    let crop_y = (scaled_h - region_h) / 2;
    Ok(imageops::crop_imm(&resized, crop_x, crop_y, region_w, region_h).to_image())
}
