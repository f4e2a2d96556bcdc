//! Renders a saved `/recognize` reply over a local image, without the service.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use image::GenericImageView;
use image::imageops::FilterType;
use tracing::{info, warn};

use threadfinder_client::render::{draw_overlays, OverlayStyle};
use threadfinder_client::{
    annotated_file_name, init_tracing, render, DisplayLayout, HoverTarget, ImageDimensions, RecognizeReply,
};

#[derive(Parser, Debug)]
#[command(about = "Draw annotations from a saved /recognize reply onto an image")]
struct Args {
    image: PathBuf,
    reply: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value_t = 1024)]
    display_width: u32,
    #[arg(long, default_value_t = 768)]
    display_height: u32,
    /// Highlight the face with this id
    #[arg(long)]
    highlight: Option<String>,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    let reply_text = std::fs::read_to_string(&args.reply)
        .with_context(|| format!("cannot read {}", args.reply.display()))?;
    let reply: RecognizeReply = serde_json::from_str(&reply_text).context("reply is not a /recognize body")?;
    let file_name = args.image.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();

    let success = match reply.into_outcome(&file_name) {
        Ok(success) => success,
        Err(err) => {
            println!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let image = image::open(&args.image).with_context(|| format!("cannot open {}", args.image.display()))?;
    let native = ImageDimensions::from(image.dimensions());
    let layout = DisplayLayout { max_width: args.display_width, max_height: args.display_height };
    let shown = layout.fit(native);
    info!("{} shown at {}x{}", success.original_filename, shown.width, shown.height);

    let mut annotations = match render(&success.annotations, native, shown) {
        Ok(annotations) => annotations,
        Err(err) => {
            println!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(id) = &args.highlight {
        match annotations.links().pair_for_id(id) {
            Some((overlay, _)) => annotations.hover_enter(HoverTarget::Overlay(overlay)),
            None => warn!("no face with id {}", id),
        }
    }

    println!("{}", success.message.unwrap_or_else(|| format!("Found {} face(s).", annotations.len())));
    for entry in &annotations.entries {
        println!("  {} [{}]", entry.text, entry.id);
    }

    let mut canvas = image.resize_exact(shown.width, shown.height, FilterType::Triangle).to_rgba8();
    draw_overlays(&mut canvas, &annotations, &OverlayStyle::default());
    let out = args.out.unwrap_or_else(|| PathBuf::from(annotated_file_name(&file_name)));
    canvas.save(&out).with_context(|| format!("cannot write {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(ExitCode::SUCCESS)
}
