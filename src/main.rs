//! Binary entrypoint for cardsmith.
//!
//! Thin driver around the library: decode the photo, place the crop on the
//! preview canvas, extract it, and run the card compositor.

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt};

use cardsmith::card::compose::{Compositor, card_file_name};
use cardsmith::card::text;
use cardsmith::config::Config;
use cardsmith::crop::editor::{CropEditor, CropRect};
use cardsmith::crop::render;
use cardsmith::geometry;
use cardsmith::session::Session;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "cardsmith", about = "Crop a photo and compose it into a card")]
struct Cli {
    /// Path to YAML config file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Photo to crop into the card
    #[arg(long, value_name = "FILE")]
    photo: PathBuf,

    /// Name interpolated into the card text and the output filename
    #[arg(long)]
    name: Option<String>,

    /// Card template to render
    #[arg(long, default_value = "participation")]
    template: String,

    /// Crop rectangle in canvas pixels, as X,Y,SIZE or X,Y,WIDTH,HEIGHT;
    /// defaults to the centered rectangle
    #[arg(long, value_name = "RECT")]
    crop: Option<String>,

    /// Skip cropping and use the full photo
    #[arg(long)]
    skip_crop: bool,

    /// Available on-screen width used to size the preview canvas
    #[arg(long, value_name = "PX", default_value_t = 440)]
    available_width: u32,

    /// Also write the crop-editor preview raster
    #[arg(long)]
    preview: bool,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());
    fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => Config::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    cfg.validate().context("validating configuration")?;

    let template = cfg
        .template(&cli.template)
        .with_context(|| format!("unknown template {:?}", cli.template))?
        .clone();

    let mut session = Session::new();
    session
        .load_photo(&cli.photo)
        .await
        .with_context(|| format!("loading photo from {}", cli.photo.display()))?;

    let (canvas_w, canvas_h) =
        geometry::viewport_size(cli.available_width, cfg.editor.max_canvas_width);
    let mut editor = CropEditor::new(cfg.editor.clone(), canvas_w as f32, canvas_h as f32);
    if let Some(spec) = &cli.crop {
        editor.set_rect(parse_crop_rect(spec)?);
    }
    info!(
        canvas_w,
        canvas_h,
        rect = ?editor.rect(),
        "crop canvas ready"
    );

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating output directory {}", cli.out.display()))?;

    if cli.preview {
        let source = session.source().context("no photo loaded")?;
        let preview = render::render_preview(
            &source.image,
            &editor.rect(),
            canvas_w,
            canvas_h,
            &cfg.editor,
        )?;
        let path = cli.out.join("crop-preview.png");
        preview
            .save(&path)
            .with_context(|| format!("writing crop preview to {}", path.display()))?;
        info!(path = %path.display(), "wrote crop preview");
    }

    let cropped = if cli.skip_crop {
        session.skip_crop()?
    } else {
        session.commit_crop(&editor.rect(), canvas_w as f32, canvas_h as f32)?
    };
    let cropped_path = cli.out.join("cropped-photo.png");
    cropped
        .save(&cropped_path)
        .with_context(|| format!("writing cropped photo to {}", cropped_path.display()))?;
    info!(
        path = %cropped_path.display(),
        width = cropped.width(),
        height = cropped.height(),
        "wrote cropped photo"
    );

    let font = if template.text.is_empty() {
        None
    } else {
        Some(text::load_font(&cfg.font).context("resolving card font")?)
    };
    let compositor = Compositor::new(template, font)?;
    let card = session
        .generate_card(&compositor, cli.name.as_deref())
        .await
        .context("generating card")?;

    let card_path = cli
        .out
        .join(card_file_name(compositor.template(), cli.name.as_deref()));
    card.save(&card_path)
        .with_context(|| format!("writing card to {}", card_path.display()))?;
    info!(path = %card_path.display(), "wrote card");

    Ok(())
}

/// Parse `X,Y,SIZE` or `X,Y,WIDTH,HEIGHT` into a crop rectangle. The editor
/// clamps it into the canvas afterwards.
fn parse_crop_rect(spec: &str) -> Result<CropRect> {
    let parts: Vec<f32> = spec
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .with_context(|| format!("bad crop component {part:?}"))
        })
        .collect::<Result<_>>()?;
    ensure!(
        parts.len() == 3 || parts.len() == 4,
        "--crop takes X,Y,SIZE or X,Y,WIDTH,HEIGHT"
    );
    let (width, height) = if parts.len() == 3 {
        (parts[2], parts[2])
    } else {
        (parts[2], parts[3])
    };
    Ok(CropRect {
        x: parts[0],
        y: parts[1],
        width,
        height,
    })
}
