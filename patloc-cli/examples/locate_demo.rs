//! Self-contained demo: stamps a textured template into a synthetic scene
//! twice and runs the localizer over it. No image files needed.
//!
//! Run with: cargo run -p patloc-cli --example locate_demo

use image::GrayImage;
use patloc_cli::{LocateConfig, Localizer};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn textured_template(size: u32) -> GrayImage {
    // isolated bright blobs: corner-rich for the FAST segment test, with a
    // distinct neighborhood per blob for the descriptors
    let mut img = GrayImage::from_pixel(size, size, image::Luma([40]));
    let blobs = [
        (10u32, 10u32), (16, 12), (30, 10), (35, 16), (12, 30),
        (10, 36), (32, 34), (38, 30), (24, 22), (22, 38),
    ];
    for &(cx, cy) in blobs.iter().filter(|&&(cx, cy)| cx + 2 < size && cy + 2 < size) {
        for dy in 0..5u32 {
            for dx in 0..5u32 {
                img.put_pixel(cx + dx - 2, cy + dy - 2, image::Luma([250]));
            }
        }
    }
    img
}

fn stamp(canvas: &mut GrayImage, ox: u32, oy: u32, patch: &GrayImage) {
    for (x, y, px) in patch.enumerate_pixels() {
        if ox + x < canvas.width() && oy + y < canvas.height() {
            canvas.put_pixel(ox + x, oy + y, *px);
        }
    }
}

fn main() {
    env_logger::init();

    let template = textured_template(48);
    let mut scene = GrayImage::from_pixel(320, 240, image::Luma([128]));
    stamp(&mut scene, 40, 30, &template);
    stamp(&mut scene, 210, 150, &template);

    let localizer = Localizer::new(LocateConfig::default());
    let mut rng = StdRng::seed_from_u64(42);
    let (points, stats) = localizer.locate_gray(&scene, &template, &mut rng);

    println!(
        "matches {}/{} kept, {} clusters, {} verified, {} fallback",
        stats.filtered_matches, stats.raw_matches, stats.clusters, stats.verified, stats.fallbacks
    );
    for (i, p) in points.iter().enumerate() {
        println!("instance {}: ({:.1}, {:.1})", i, p.x, p.y);
    }
}
