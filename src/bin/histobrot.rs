// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

#![warn(rust_2018_idioms)]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueHint};
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};

use histobrot::colorschemes::ImageSink;
use histobrot::config::RenderConfig;
use histobrot::render::{render, Engine};
use histobrot::session::Session;

// {{{ Command-line parser

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// JSON file with the render configuration (image size, viewport, etc.)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<String>,

    /// Width of the resulting image in pixels
    #[arg(long)]
    width: Option<usize>,

    /// Height of the resulting image in pixels
    #[arg(long)]
    height: Option<usize>,

    /// Number of column bands computed in parallel
    #[arg(short, long)]
    bands: Option<usize>,

    /// Maximum number of iterations before a point is considered in the set
    #[arg(short, long)]
    maxit: Option<u32>,

    /// Pixel to zoom into, given as `X,Y` (can be repeated)
    #[arg(long, value_parser = parse_click)]
    click: Vec<(i64, i64)>,

    /// Write one image per zoom step instead of only the last one
    #[arg(long)]
    frames: bool,

    /// Output file name
    #[arg(short, long, value_hint = ValueHint::FilePath, default_value = "histobrot.png")]
    outfile: PathBuf,
}

fn parse_click(s: &str) -> Result<(i64, i64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'X,Y', got '{}'", s))?;

    match (x.trim().parse(), y.trim().parse()) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(format!("could not parse pixel coordinates '{}'", s)),
    }
}

// }}}

fn load_config(args: &Cli) -> Result<RenderConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(filename) => RenderConfig::from_file(filename)?,
        None => RenderConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(bands) = args.bands {
        config.bands = Some(bands);
    }
    if let Some(maxit) = args.maxit {
        config.max_depth = maxit;
    }
    config.validate()?;

    Ok(config)
}

fn display(config: &RenderConfig, engine: &Engine, clicks: &[(i64, i64)]) {
    let viewport = config.viewport;

    println!("Resolution:    {}x{}", config.width, config.height);
    println!(
        "Viewport:      [{}, {}] x [{}, {}]",
        viewport.x_start,
        viewport.x_start + viewport.x_range,
        viewport.y_start,
        viewport.y_start + viewport.y_range,
    );
    println!("Bands:         {}", engine.nbands);
    println!("Iterations:    {}", engine.mandelbrot.maxit);
    println!("Zoom steps:    {}", clicks.len());
}

fn frame_filename(outfile: &Path, step: usize) -> PathBuf {
    let stem = outfile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "histobrot".to_string());
    let extension = outfile
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());

    outfile.with_file_name(format!("{}_{:03}.{}", stem, step, extension))
}

fn render_last(config: &RenderConfig, engine: &Engine, args: &Cli) -> Result<(), Box<dyn Error>> {
    let (width, height) = (config.width, config.height);
    let viewport = args
        .click
        .iter()
        .fold(config.viewport, |v, &(x, y)| v.zoom(width, height, x, y));
    log::info!("Final viewport: {:?}", viewport);

    let mut pixels = RgbImage::new(width as u32, height as u32);
    render(engine, &viewport, width, height, &mut ImageSink(&mut pixels))?;

    println!("Writing result to '{}'.", args.outfile.display());
    pixels.save(&args.outfile)?;

    Ok(())
}

fn render_frames(config: &RenderConfig, args: &Cli) -> Result<(), Box<dyn Error>> {
    let progress = ProgressBar::new(args.click.len() as u64 + 1);
    progress.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
    )?);

    let mut session = Session::new(config)?;
    session.request_render()?;

    for step in 0..=args.click.len() {
        let frame = session.wait()?;
        if let Some(&(x, y)) = args.click.get(step) {
            // next pass renders while this frame is written
            session.click(x, y)?;
        }

        let filename = frame_filename(&args.outfile, step);
        progress.set_message(filename.display().to_string());
        frame.to_image().save(&filename)?;
        progress.inc(1);
    }

    progress.finish_with_message("done");
    Ok(())
}

fn run(args: &Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(args)?;
    let engine = config.engine()?;
    display(&config, &engine, &args.click);

    println!("Executing...");
    let now = Instant::now();

    if args.frames {
        render_frames(&config, args)?;
    } else {
        render_last(&config, &engine, args)?;
    }

    let elapsed = now.elapsed().as_millis() as f32 / 1000.0;
    println!("Elapsed {}s!", elapsed);

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Cli::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
