//! Procedural scene generator.
//!
//! Scene layouts are authored at 640x480 and scaled to the requested size.

use crate::{GenArgs, Scene};
use anyhow::{bail, Result};
use deep_core::shapes::{draw_deep_circle, draw_deep_rect};
use deep_core::{DeepImage, RenderMode, ALPHA, DEPTH, DEPTH_BACK};
use tracing::info;

const CHANNELS: [&str; 6] = ["R", "G", "B", ALPHA, DEPTH, DEPTH_BACK];

const REF_WIDTH: f32 = 640.0;
const REF_HEIGHT: f32 = 480.0;

/// Maps reference coordinates onto the output raster.
struct Layout {
    sx: f32,
    sy: f32,
}

impl Layout {
    fn new(width: u32, height: u32) -> Self {
        Self {
            sx: width as f32 / REF_WIDTH,
            sy: height as f32 / REF_HEIGHT,
        }
    }

    fn x(&self, v: u32) -> u32 {
        (v as f32 * self.sx).round() as u32
    }

    fn y(&self, v: u32) -> u32 {
        (v as f32 * self.sy).round() as u32
    }

    fn r(&self, v: u32) -> u32 {
        (v as f32 * self.sx.min(self.sy)).round() as u32
    }

    fn circle(&self, img: &mut DeepImage, cx: u32, cy: u32, r: u32, values: &[f32]) -> Result<()> {
        draw_deep_circle(img, self.x(cx) as i32, self.y(cy) as i32, self.r(r), values)?;
        Ok(())
    }

    fn rect(&self, img: &mut DeepImage, x1: u32, y1: u32, x2: u32, y2: u32, values: &[f32]) -> Result<()> {
        draw_deep_rect(img, self.x(x1), self.y(y1), self.x(x2), self.y(y2), values)?;
        Ok(())
    }
}

fn build(scene: Scene, width: u32, height: u32) -> Result<DeepImage> {
    let layout = Layout::new(width, height);
    let img = match scene {
        Scene::Circles => {
            let mut img = DeepImage::new(width, height, &CHANNELS)?;
            layout.circle(&mut img, 275, 300, 100, &[0.0, 1.0, 0.0, 0.5, 3.0, 6.0])?;
            layout.circle(&mut img, 400, 300, 100, &[0.0, 0.0, 1.0, 0.5, 2.0, 4.0])?;
            layout.rect(&mut img, 100, 200, 250, 350, &[1.0, 1.0, 1.0, 1.0, 1.0, 8.0])?;
            img
        }
        Scene::Circle => {
            let mut img = DeepImage::new(width, height, &CHANNELS)?;
            layout.circle(&mut img, 300, 200, 100, &[1.0, 0.0, 0.0, 0.5, 5.0, 7.0])?;
            img
        }
        Scene::Pixel => {
            let mut img = DeepImage::new(1, 1, &CHANNELS)?;
            img.add_pixel_sample(0, 0, &[1.0, 1.0, 0.0, 0.5, 1.0, 1.0])?;
            img.add_pixel_sample(0, 0, &[0.0, 1.0, 1.0, 0.5, 4.0, 4.0])?;
            img
        }
        Scene::Holdout => {
            let mut img = DeepImage::new(width, height, &CHANNELS)?;
            draw_deep_rect(&mut img, 0, 0, width, height, &[1.0, 0.0, 0.0, 1.0, 10.0, 15.0])?;
            let mut matte = DeepImage::new(width, height, &CHANNELS)?;
            layout.circle(&mut matte, 400, 300, 100, &[0.0, 1.0, 0.0, 0.5, 5.0, 5.0])?;
            img.subtract_deep_image(&matte)?;
            img
        }
    };
    Ok(img)
}

pub fn run(args: GenArgs, verbose: u8) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("Invalid size {}x{}", args.width, args.height);
    }

    let img = build(args.scene, args.width, args.height)?;
    info!(scene = ?args.scene, samples = img.num_elements(), "generated");

    super::save_deep(&args.output, &img)?;
    if let Some(png) = &args.png {
        super::render_png(png, &img, RenderMode::Auto)?;
    }

    if verbose > 0 {
        println!("{}", deep_core::deep_stats(&img));
    }
    Ok(())
}
