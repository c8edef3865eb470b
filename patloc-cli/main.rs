use image::{ImageReader, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use patloc_cli::{LocateConfig, Localizer, init_thread_pool};
use std::env;
use std::process::ExitCode;
use std::time::Instant;

fn usage(program: &str) {
    eprintln!("Usage: {program} <scene> <template> [output.png] [--config <path.toml>] [--json]");
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut positional = Vec::new();
    let mut config_path: Option<String> = None;
    let mut json = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    usage(&args[0]);
                    return ExitCode::FAILURE;
                };
                config_path = Some(path.clone());
            }
            "--json" => json = true,
            other => positional.push(other.to_string()),
        }
        i += 1;
    }
    if positional.len() < 2 {
        usage(&args[0]);
        return ExitCode::FAILURE;
    }

    let config: LocateConfig = match &config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).expect("config file not readable");
            toml::from_str(&text).expect("config file is not valid TOML")
        }
        None => LocateConfig::default(),
    };

    if let Err(e) = init_thread_pool(config.n_threads) {
        log::warn!("thread pool init skipped: {e}");
    }

    let scene = ImageReader::open(&positional[0])
        .expect("scene image not found")
        .decode()
        .expect("scene decode failed");
    let template = ImageReader::open(&positional[1])
        .expect("template image not found")
        .decode()
        .expect("template decode failed");

    let localizer = Localizer::new(config);
    let t0 = Instant::now();
    let points = localizer.locate(&scene, &template);
    let elapsed = t0.elapsed();

    if json {
        println!("{}", serde_json::to_string(&points).expect("point list serializes"));
    } else {
        println!("Time taken: {:.2?}", elapsed);
        println!("Found {} instance(s)", points.len());
        for p in &points {
            println!("  ({:.1}, {:.1})", p.x, p.y);
        }
    }

    if let Some(out) = positional.get(2) {
        let mut annotated: RgbaImage = scene.into_rgba8();
        for p in &points {
            draw_filled_circle_mut(
                &mut annotated,
                (p.x as i32, p.y as i32),
                5,
                Rgba([255, 0, 0, 255]),
            );
        }
        annotated.save(out).expect("failed to save output image");
        if !json {
            println!("Saved annotated scene as {out}");
        }
    }

    ExitCode::SUCCESS
}
