// Copyright 2020 TwoCookingMice

use genoise::core::scene::Scene;
use genoise::integrators::path::PathIntegrator;
use genoise::io::exr_utils;
use genoise::math::constants::{Float, Vector3f};
use genoise::renderers::simple::{BlockRenderer, Renderer};
use genoise::sensors::perspective::PerspectiveCamera;

use std::env;

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <preset> <output.exr> [--width N] [--height N] [--spp N] [--max-bounces N] [--seed N]",
            args[0]
        );
        eprintln!("Presets: cornell, spheres, floor");
        std::process::exit(1);
    }

    let preset = &args[1];
    let output_path = &args[2];
    let mut width: usize = 512;
    let mut height: usize = 512;
    let mut spp: u32 = 16;
    let mut max_bounces: u32 = 8;
    let mut seed: u64 = 0;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                i += 1;
                width = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(width);
            }
            "--height" => {
                i += 1;
                height = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(height);
            }
            "--spp" => {
                i += 1;
                spp = args.get(i).and_then(|v| v.parse::<u32>().ok()).unwrap_or(spp);
            }
            "--max-bounces" => {
                i += 1;
                max_bounces = args.get(i).and_then(|v| v.parse::<u32>().ok()).unwrap_or(max_bounces);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(seed);
            }
            _ => {}
        }
        i += 1;
    }

    let (mut scene, camera_origin, camera_target) = match preset.as_str() {
        "cornell" => (
            Scene::cornell_box(),
            Vector3f::new(0.0, 0.0, 20.0),
            Vector3f::new(0.0, 0.0, 0.0),
        ),
        "spheres" => (
            Scene::sphere_grid(4),
            Vector3f::new(0.0, 15.0, 24.0),
            Vector3f::new(0.0, 0.0, 0.0),
        ),
        "floor" => (
            Scene::floor(),
            Vector3f::new(0.0, 2.0, 10.0),
            Vector3f::new(0.0, 0.0, 0.0),
        ),
        other => {
            eprintln!("Unknown preset: {}", other);
            std::process::exit(1);
        }
    };

    if let Err(e) = scene.build_bvh() {
        eprintln!("Failed to build the scene BVH: {}", e);
        std::process::exit(1);
    }

    let mut camera = PerspectiveCamera::new(
        camera_origin,
        camera_target,
        Vector3f::new(0.0, 1.0, 0.0),
        (45.0 as Float).to_radians(),
        width,
        height,
    );

    let integrator = Box::new(PathIntegrator::new(max_bounces, spp));
    let renderer = BlockRenderer::new(integrator, seed);
    let image = renderer.render(&scene, &mut camera);

    exr_utils::write_exr_to_file(&image.raw_copy(), image.width(), image.height(), output_path);
}
