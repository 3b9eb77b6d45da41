use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::{Vec2, Vec4};
use tracing::{info, warn};

use kryon_core::resolve_resource_path;
use kryon_layout::{FlowLayoutEngine, LayoutEngine};
use kryon_render::{CommandRecorder, ElementRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Tree,
    Json,
}

#[derive(Parser)]
#[command(name = "kryon-renderer")]
#[command(about = "Lays out a Kryon .krb file and prints its render commands")]
struct Args {
    /// Path to the .krb file to render
    krb_file: PathBuf,

    /// Viewport width. Overrides the root element's width.
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height. Overrides the root element's height.
    #[arg(long)]
    height: Option<f32>,

    /// Global scale applied to sizes, positions, borders and fonts
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Where diagnostics are written
    #[arg(long, default_value = "kryon-renderer.log")]
    log_file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

const DEFAULT_VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

fn main() -> Result<()> {
    let args = Args::parse();
    kryon::logging::init_file(&args.log_file, args.debug)?;

    if !args.krb_file.exists() {
        anyhow::bail!("KRB file not found: {}", args.krb_file.display());
    }
    if !(args.scale.is_finite() && args.scale > 0.0) {
        anyhow::bail!("Scale must be a positive number, got {}", args.scale);
    }

    let krb_file = kryon_core::load_krb_file(&args.krb_file).context("Failed to load KRB file")?;
    let roots = krb_file.roots();

    // Viewport: command line first, then the root element's declared size.
    let root_size = krb_file
        .root_element_id
        .and_then(|id| krb_file.elements.get(&id))
        .map(|root| root.size * args.scale)
        .unwrap_or(Vec2::ZERO);
    let viewport = Vec2::new(
        args.width.unwrap_or(if root_size.x > 0.0 { root_size.x } else { DEFAULT_VIEWPORT.x }),
        args.height.unwrap_or(if root_size.y > 0.0 { root_size.y } else { DEFAULT_VIEWPORT.y }),
    );
    info!("Viewport {}x{} at scale {}", viewport.x, viewport.y, args.scale);

    let document_path = krb_file.path.clone();
    let image_sizer = move |source: &str| image_size(document_path.as_deref(), source);
    let mut engine = FlowLayoutEngine::new().with_scale(args.scale).with_image_sizer(image_sizer);
    let layout = engine.compute_layout(&krb_file.elements, &roots, viewport);

    let mut renderer = ElementRenderer::new(CommandRecorder::new(viewport));
    renderer
        .render_frame(&krb_file.elements, &roots, &layout, Vec4::ZERO)
        .context("Failed to render frame")?;
    let recorder = renderer.into_backend();
    info!("Generated {} render commands", recorder.last_frame().len());

    match args.format {
        OutputFormat::Tree => {
            print!("{}", kryon::inspect::tree_output(&krb_file, Some(&layout)));
            println!();
            print!("{}", recorder.summary());
        }
        OutputFormat::Json => {
            print!("{}", kryon::inspect::json_output(&krb_file, Some(&layout), recorder.last_frame())?);
        }
    }
    Ok(())
}

fn image_size(document_path: Option<&Path>, source: &str) -> Option<Vec2> {
    let path = resolve_resource_path(document_path, source);
    match image::image_dimensions(&path) {
        Ok((width, height)) => Some(Vec2::new(width as f32, height as f32)),
        Err(err) => {
            warn!("Could not read image size for {}: {}", path.display(), err);
            None
        }
    }
}
