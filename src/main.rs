#[macro_use]
extern crate approx;
#[macro_use]
extern crate bitflags;
extern crate clap;
extern crate env_logger;
extern crate image;
#[macro_use]
extern crate log;
extern crate num_cpus;
extern crate rand;
extern crate serde_json;

use std::fs::File;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

mod bbox;
mod camera;
mod color;
mod film;
mod kdtree;
mod material;
mod math;
mod montecarlo;
mod parse;
mod primitive;
mod ray;
mod scene;
mod scheduler;
mod spectrum;
mod tracer;
mod vec;

use clap::{App, Arg};
use color::CIE1931;
use film::Film;
use scheduler::TileScheduler;
use tracer::PathTracer;
use vec::Vec3;

/// CIE XYZ to sRGB under D65, with gamma and clamping. Display glue, not
/// part of the estimator: the film stays in XYZ.
fn xyz_to_rgb(c: Vec3) -> [u8; 3] {
    let r = 3.2406 * c.x - 1.5372 * c.y - 0.4986 * c.z;
    let g = -0.9689 * c.x + 1.8758 * c.y + 0.0415 * c.z;
    let b = 0.0557 * c.x - 0.2040 * c.y + 1.0570 * c.z;
    let encode = |v: f32| {
        let v = if v < 0.0 {
            0.0
        } else if v > 1.0 {
            1.0
        } else {
            v
        };
        (v.powf(1.0 / 2.2) * 255.0).round() as u8
    };
    [encode(r), encode(g), encode(b)]
}

fn main() {
    env_logger::init().unwrap();

    let matches = App::new("prism")
        .version("0.1")
        .about("spectral Monte-Carlo path tracer")
        .arg(Arg::with_name("SCENE")
            .help("Scene description file")
            .required(true)
            .index(1))
        .arg(Arg::with_name("WIDTH")
            .short("w")
            .long("width")
            .takes_value(true))
        .arg(Arg::with_name("HEIGHT")
            .long("height")
            .takes_value(true))
        .arg(Arg::with_name("THREADS")
            .short("t")
            .long("threads")
            .takes_value(true))
        .arg(Arg::with_name("SAMPLES")
            .short("s")
            .long("samples")
            .takes_value(true))
        .arg(Arg::with_name("SEED")
            .long("seed")
            .takes_value(true))
        .arg(Arg::with_name("OUTPUT")
            .short("o")
            .long("output")
            .takes_value(true))
        .get_matches();

    let width = matches.value_of("WIDTH").unwrap_or("512").parse::<u32>().ok()
        .expect("Value for width is not a valid unsigned integer");
    let height = matches.value_of("HEIGHT").unwrap_or("512").parse::<u32>().ok()
        .expect("Value for height is not a valid unsigned integer");
    let samples = matches.value_of("SAMPLES").unwrap_or("64").parse::<u32>().ok()
        .expect("Value for samples is not a valid unsigned integer");
    assert!(samples > 0);
    let threads = match matches.value_of("THREADS") {
        Some(value) => value.parse::<usize>().ok()
            .expect("Value for threads is not a valid unsigned integer"),
        None => num_cpus::get(),
    };
    assert!(threads > 0);
    let seed = matches.value_of("SEED").unwrap_or("42").parse::<usize>().ok()
        .expect("Value for seed is not a valid unsigned integer");

    let scene_path = matches.value_of("SCENE").unwrap();
    info!("loading scene from {}", scene_path);
    let (scene, spectrum) = match parse::load_scene(scene_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("failed to load scene {}: {}", scene_path, e);
            process::exit(1);
        }
    };

    let tracer = Arc::new(PathTracer::new(Arc::new(scene),
                                          Arc::new(spectrum),
                                          Arc::new(CIE1931),
                                          width,
                                          height));
    let film = Arc::new(Film::new(width, height));

    info!("rendering {}x{} with {} workers, {} samples per pixel",
          width,
          height,
          threads,
          samples);
    let scheduler = TileScheduler::start(tracer, film.clone(), threads, seed);
    while film.min_samples() < samples {
        thread::sleep(Duration::from_millis(200));
    }
    scheduler.stop();

    let (xyz, counts) = film.snapshot();
    let mut colours = Vec::with_capacity((width * height * 3) as usize);
    for (c, n) in xyz.iter().zip(counts.iter()) {
        let mean = *c / (*n).max(1) as f32;
        let rgb = xyz_to_rgb(mean);
        colours.push(rgb[0]);
        colours.push(rgb[1]);
        colours.push(rgb[2]);
    }

    let filename = matches.value_of("OUTPUT").unwrap_or("prism.png");
    let ref mut out = File::create(&Path::new(filename)).ok()
        .expect("Could not create image file");
    let img = image::ImageBuffer::from_raw(width, height, colours)
        .expect("Could not create image buffer");
    let _ = image::ImageRgb8(img).save(out, image::PNG);
    info!("wrote {}", filename);
}
