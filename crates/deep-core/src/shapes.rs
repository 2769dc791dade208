//! Procedural shapes for test scenes.
//!
//! The deep variants write one fully specified sample per covered pixel via
//! [`DeepImage::add_pixel_sample`]; the flat [`draw_circle`] splats through
//! the image's filter.

use crate::{DeepImage, Error, Image, Result};

fn check_len(image: &DeepImage, values: &[f32]) -> Result<()> {
    if values.len() != image.channels_in_order() {
        return Err(Error::sample_length(image.channels_in_order(), values.len()));
    }
    Ok(())
}

/// Adds one sample to every pixel in `[x1, x2) x [y1, y2)`.
///
/// The rectangle is clipped to the raster.
pub fn draw_deep_rect(image: &mut DeepImage, x1: u32, y1: u32, x2: u32, y2: u32, values: &[f32]) -> Result<()> {
    check_len(image, values)?;
    for y in y1..y2.min(image.height()) {
        for x in x1..x2.min(image.width()) {
            image.add_pixel_sample(y, x, values)?;
        }
    }
    Ok(())
}

/// Adds one sample to every pixel whose center offset from `(cx, cy)` is at
/// most `r` pixels.
pub fn draw_deep_circle(image: &mut DeepImage, cx: i32, cy: i32, r: u32, values: &[f32]) -> Result<()> {
    check_len(image, values)?;
    let r2 = r as i64 * r as i64;
    for y in 0..image.height() {
        let dy = y as i64 - cy as i64;
        for x in 0..image.width() {
            let dx = x as i64 - cx as i64;
            if dx * dx + dy * dy <= r2 {
                image.add_pixel_sample(y, x, values)?;
            }
        }
    }
    Ok(())
}

/// Splats a circle of normalized radius `r` centered at normalized `(cx, cy)`.
///
/// One sample is placed per raster position, at `(y / (h - 1), x / (w - 1))`.
/// The vertical distance is divided by the aspect ratio `w / h`.
pub fn draw_circle(image: &mut Image, cx: f32, cy: f32, r: f32, values: &[f32]) -> Result<()> {
    if values.len() != image.channels() {
        return Err(Error::sample_length(image.channels(), values.len()));
    }
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return Ok(());
    }
    let aspect = w as f32 / h as f32;
    let aspect2 = aspect * aspect;
    let norm = |i: u32, n: u32| if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };

    for y in 0..h {
        let fy = norm(y, h);
        for x in 0..w {
            let fx = norm(x, w);
            if r * r - (fx - cx).powi(2) - (fy - cy).powi(2) / aspect2 >= 0.0 {
                image.add_sample(fy, fx, values)?;
            }
        }
    }
    Ok(())
}
