use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use kryon_compiler::{compile_file, Limits};

#[derive(Parser)]
#[command(name = "kryc")]
#[command(about = "Compiles Kryon .kry sources into .krb binaries")]
#[command(version)]
struct Args {
    /// Source file to compile
    input: PathBuf,

    /// Destination .krb file
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Override the string table capacity
    #[arg(long)]
    max_strings: Option<usize>,

    /// Override the element capacity
    #[arg(long)]
    max_elements: Option<usize>,

    /// Override the per-element child capacity
    #[arg(long)]
    max_children: Option<usize>,

    /// Override the maximum nesting depth
    #[arg(long)]
    max_depth: Option<usize>,
}

impl Args {
    fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_strings: self.max_strings.unwrap_or(defaults.max_strings),
            max_elements: self.max_elements.unwrap_or(defaults.max_elements),
            max_children: self.max_children.unwrap_or(defaults.max_children),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            ..defaults
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    kryon::logging::init_stderr(args.debug)?;

    let stats = compile_file(&args.input, &args.output, args.limits())
        .with_context(|| format!("Failed to compile {}", args.input.display()))?;

    for warning in &stats.warnings {
        warn!("line {}: {}", warning.line, warning.message);
    }
    info!(
        "Wrote {} ({} bytes): {} elements, {} styles, {} strings, {} resources in {} ms",
        args.output.display(),
        stats.total_size,
        stats.element_count,
        stats.style_count,
        stats.string_count,
        stats.resource_count,
        stats.compile_time_ms
    );
    if !stats.warnings.is_empty() {
        info!("{} warning(s)", stats.warnings.len());
    }
    Ok(())
}
