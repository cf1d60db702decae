//! Headless rendering demo for vcanvas - renders a lit, textured sphere
//! through the virtual canvas and saves the result as a PNG.
//!
//! Usage:
//!   vcanvas_demo                          # procedural checkerboard texture
//!   vcanvas_demo <texture.png>            # diffuse texture from file
//!   vcanvas_demo <texture.png> -o out.png # choose the output path

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;

use vcanvas::scene::SceneRenderer;
use vcanvas::{
    create_canvas, load_texture, ContextAttributes, ContextKind, RenderingContext, TextureData,
};

const WIDTH: u32 = 512;
const HEIGHT: u32 = 512;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let texture_path = args.get(1).filter(|a| a.as_str() != "-o").cloned();
    let output_path = args
        .iter()
        .position(|a| a == "-o")
        .and_then(|i| args.get(i + 1))
        .map_or("image.png", String::as_str);

    log::info!("initializing canvas {}x{}", WIDTH, HEIGHT);
    let mut canvas = create_canvas(WIDTH, HEIGHT);

    log::info!("creating renderer");
    let attrs = ContextAttributes {
        alpha: true,
        antialias: true,
        depth: true,
    };
    let context = match canvas.get_context_with(ContextKind::WebGl, attrs) {
        Ok(Some(RenderingContext::Gl(gl))) => gl,
        Ok(_) => {
            eprintln!("Error: webgl context unavailable on this canvas");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error creating webgl context: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("loading texture");
    let texture = match texture_path {
        Some(path) => match load_texture(&path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error loading texture {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => TextureData::checkerboard(1024, 8),
    };

    log::info!("building scene");
    let renderer = match SceneRenderer::new(&context.borrow(), &texture) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error building scene: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("rendering");
    renderer.render(&context.borrow());

    log::info!("serializing canvas");
    let buffer = match canvas.to_png() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error encoding PNG: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = fs::write(output_path, &buffer) {
        eprintln!("Error writing {}: {}", output_path, e);
        std::process::exit(1);
    }
    log::info!("saved {}", output_path);
}
