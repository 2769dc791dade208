//! Merging and holding out images read back from disk.

use approx::assert_abs_diff_eq;
use deep_core::shapes::{draw_deep_circle, draw_deep_rect};
use deep_core::{render, DeepImage, RenderMode};

const CHANNELS: [&str; 6] = ["R", "G", "B", "A", "Z", "ZBack"];

fn write_read(img: &DeepImage, name: &str, dir: &tempfile::TempDir) -> DeepImage {
    let path = dir.path().join(name);
    deep_io::write(&path, img).unwrap();
    deep_io::read(&path).unwrap()
}

#[test]
fn add_then_render_matches_combined_scene() {
    let dir = tempfile::tempdir().unwrap();

    let mut a = DeepImage::new(32, 32, &CHANNELS).unwrap();
    draw_deep_rect(&mut a, 0, 0, 16, 32, &[1.0, 0.0, 0.0, 1.0, 5.0, 5.0]).unwrap();
    let mut b = DeepImage::new(32, 32, &CHANNELS).unwrap();
    draw_deep_circle(&mut b, 16, 16, 6, &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]).unwrap();

    let mut merged = write_read(&a, "a.sdf", &dir);
    merged.add_deep_image(&write_read(&b, "b.sdf", &dir)).unwrap();
    assert_eq!(merged.num_elements(), a.num_elements() + b.num_elements());

    let flat = render(&merged, RenderMode::Auto);
    // circle is in front of the rectangle
    assert_eq!(flat.pixel(16, 12).unwrap(), &[0.0, 0.0, 1.0, 1.0]);
    // rectangle alone
    assert_eq!(flat.pixel(2, 2).unwrap(), &[1.0, 0.0, 0.0, 1.0]);
    // nothing
    assert_eq!(flat.pixel(2, 30).unwrap(), &[0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn holdout_cuts_background() {
    let dir = tempfile::tempdir().unwrap();

    let mut background = DeepImage::new(32, 24, &CHANNELS).unwrap();
    draw_deep_rect(&mut background, 0, 0, 32, 24, &[1.0, 0.0, 0.0, 1.0, 10.0, 15.0]).unwrap();
    let mut matte = DeepImage::new(32, 24, &CHANNELS).unwrap();
    draw_deep_circle(&mut matte, 16, 12, 5, &[0.0, 1.0, 0.0, 1.0, 5.0, 5.0]).unwrap();

    let mut held = write_read(&background, "bg.sdf", &dir);
    held.subtract_deep_image(&matte).unwrap();
    let held = write_read(&held, "held.sdf", &dir);

    let flat = render(&held, RenderMode::Linear);
    assert_abs_diff_eq!(flat.data(12, 16, 3).unwrap(), 0.0);
    assert_abs_diff_eq!(flat.data(0, 0, 3).unwrap(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(flat.data(0, 0, 0).unwrap(), 1.0, epsilon = 1e-6);
}

#[test]
fn subtract_restores_original() {
    let dir = tempfile::tempdir().unwrap();

    let mut original = DeepImage::new(8, 8, &CHANNELS).unwrap();
    draw_deep_rect(&mut original, 0, 0, 8, 8, &[0.0, 0.0, 1.0, 1.0, 3.0, 3.0]).unwrap();
    draw_deep_rect(&mut original, 0, 0, 4, 8, &[0.2, 0.4, 0.6, 0.5, 2.0, 4.0]).unwrap();

    // Semi-transparent layers in front of and inside the original.
    let mut extra = DeepImage::new(8, 8, &CHANNELS).unwrap();
    draw_deep_rect(&mut extra, 2, 2, 6, 6, &[1.0, 0.0, 0.0, 0.5, 1.0, 1.0]).unwrap();
    draw_deep_circle(&mut extra, 4, 4, 3, &[0.0, 1.0, 0.0, 0.25, 1.5, 3.5]).unwrap();

    let mut img = write_read(&original, "original.sdf", &dir);
    img.add_deep_image(&extra).unwrap();
    assert_ne!(
        render(&img, RenderMode::Discrete).pixel(4, 4).unwrap(),
        render(&original, RenderMode::Discrete).pixel(4, 4).unwrap()
    );
    img.subtract_deep_image(&extra).unwrap();
    let img = write_read(&img, "restored.sdf", &dir);

    for mode in [RenderMode::Discrete, RenderMode::Linear] {
        let got = render(&img, mode);
        let want = render(&original, mode);
        for (g, w) in got.as_slice().iter().zip(want.as_slice()) {
            assert_abs_diff_eq!(*g, *w, epsilon = 1e-6);
        }
    }
    assert_eq!(
        render(&img, RenderMode::Discrete).pixel(4, 6).unwrap(),
        &[0.0, 0.0, 1.0, 1.0]
    );
}

#[test]
fn merge_rejects_mismatched_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = DeepImage::new(8, 8, &CHANNELS).unwrap();
    let b = DeepImage::new(8, 4, &CHANNELS).unwrap();

    let mut a = write_read(&a, "a.sdf", &dir);
    let b = write_read(&b, "b.sdf", &dir);
    let err = a.add_deep_image(&b).unwrap_err();
    assert!(err.is_merge_error());
}
