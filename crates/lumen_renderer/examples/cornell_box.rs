//! Progressive Cornell box render.
//!
//! Usage: `cargo run --release --example cornell_box -- [frames] [config.json]`
//!
//! The optional JSON file overrides `RenderConfig` fields, e.g.
//! `{ "width": 640, "height": 480, "max_bounces": 5 }`.

use anyhow::{Context, Result};
use lumen_core::Scene;
use lumen_renderer::{Camera, PathTracer, RenderConfig};
use std::time::Instant;

const DEFAULT_FRAMES: u32 = 64;
const OUTPUT: &str = "cornell_box.png";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("Invalid frame count: {arg}"))?,
        None => DEFAULT_FRAMES,
    };
    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => RenderConfig::default().with_resolution(640, 480),
    };

    let scene = Scene::cornell_box()?;
    let camera = Camera::default().with_resolution(config.width, config.height);
    let mut tracer = PathTracer::new(&scene, camera, config)?;

    let start = Instant::now();
    for _ in 0..frames {
        tracer.advance();
    }
    log::info!(
        "Rendered {} frames at {}x{} in {:.2?}",
        tracer.sample_count(),
        config.width,
        config.height,
        start.elapsed()
    );

    let image = image::RgbaImage::from_raw(config.width, config.height, tracer.to_rgba8())
        .context("Pixel buffer does not match the image size")?;
    image
        .save(OUTPUT)
        .with_context(|| format!("Failed to save {OUTPUT}"))?;
    log::info!("Saved {OUTPUT}");

    Ok(())
}

fn load_config(path: &str) -> Result<RenderConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let config = serde_json::from_str(&text).with_context(|| format!("Failed to parse {path}"))?;
    Ok(config)
}
