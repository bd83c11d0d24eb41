use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use facesplice::{
    layout, load_regions, recombine_panel, CanonicalFormat, ExtractConfig, ExtractionMode,
    Extractor, RecombineOutcome,
};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "facesplice",
    version,
    about = "Extract faces to a fixed square canvas and splice replacements back",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crop every face to a canonical square and write metadata for recombination.
    Extract {
        /// Source image
        image: PathBuf,

        /// Region source: "auto" (detector) or "manual" (operator-drawn boxes)
        #[arg(short, long, default_value = "auto", value_parser = parse_mode)]
        mode: ExtractionMode,

        /// JSON list of regions (required in manual mode)
        #[arg(long)]
        regions: Option<PathBuf>,

        /// SeetaFace model for auto mode
        #[arg(long)]
        model: Option<PathBuf>,

        /// TOML file with extraction settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root directory for per-image outputs (overrides config)
        #[arg(short, long)]
        output_root: Option<PathBuf>,

        /// Canonical side length in pixels (overrides config)
        #[arg(long)]
        resolution: Option<u32>,

        /// Landmark padding factor (overrides config)
        #[arg(long)]
        padding: Option<f64>,

        /// Canonical image format: png or webp (overrides config)
        #[arg(long, value_parser = parse_format)]
        format: Option<CanonicalFormat>,
    },

    /// Paste replacement faces back onto the original image.
    Recombine {
        /// Original source image
        #[arg(long)]
        original: PathBuf,

        /// Metadata document (default: <output-root>/<image stem>/metadata.json)
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Root the metadata default is resolved against
        #[arg(long, default_value = "prepared_faces")]
        output_root: PathBuf,

        /// Directory holding face_<id>.<ext> replacements
        #[arg(short, long)]
        replacements: PathBuf,

        /// Where to save the recombined image
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn parse_mode(s: &str) -> Result<ExtractionMode, String> {
    s.parse().map_err(|e: facesplice::FaceSpliceError| e.to_string())
}

fn parse_format(s: &str) -> Result<CanonicalFormat, String> {
    match s {
        "png" => Ok(CanonicalFormat::Png),
        "webp" => Ok(CanonicalFormat::Webp),
        _ => Err(format!("unknown format: {s}")),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Respect RUST_LOG; default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            image,
            mode,
            regions,
            model,
            config,
            output_root,
            resolution,
            padding,
            format,
        } => {
            let mut settings = match config {
                Some(path) => ExtractConfig::from_toml_file(&path)
                    .with_context(|| format!("failed to load config: {}", path.display()))?,
                None => ExtractConfig::default(),
            };
            if let Some(root) = output_root {
                settings.output_root = root;
            }
            if let Some(resolution) = resolution {
                settings.canonical_resolution = resolution;
            }
            if let Some(padding) = padding {
                settings.padding_factor = padding;
            }
            if let Some(format) = format {
                settings.format = format;
            }
            cmd_extract(&image, mode, regions.as_deref(), model.as_deref(), settings)
        }
        Commands::Recombine {
            original,
            metadata,
            output_root,
            replacements,
            output,
        } => {
            let metadata =
                metadata.unwrap_or_else(|| layout::metadata_path(&output_root, &original));
            cmd_recombine(&original, &metadata, &replacements, &output)
        }
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

fn cmd_extract(
    image: &Path,
    mode: ExtractionMode,
    regions: Option<&Path>,
    model: Option<&Path>,
    settings: ExtractConfig,
) -> Result<()> {
    settings.validate().context("invalid extraction settings")?;
    info!("Extraction");
    info!("  source      : {}", image.display());
    info!(
        "  output dir  : {}",
        layout::image_dir(&settings.output_root, image).display()
    );
    info!("  resolution  : {}", settings.canonical_resolution);

    let extractor = Extractor::with_config(settings);

    let records = match mode {
        ExtractionMode::Manual => {
            let Some(path) = regions else {
                bail!("manual mode needs --regions <file.json>");
            };
            let regions = load_regions(path)
                .with_context(|| format!("failed to read regions: {}", path.display()))?;
            info!("manual mode: {} boxes supplied", regions.len());
            extractor
                .extract(image, &regions)
                .context("extraction failed")?
        }
        ExtractionMode::Auto => {
            let Some(model) = model else {
                bail!("auto mode needs --model <seeta_fd_frontal.bin>");
            };
            detect_and_extract(&extractor, image, model)?
        }
    };

    if records.is_empty() {
        warn!("no faces were processed for this image");
    } else {
        info!("processed {} faces", records.len());
    }
    Ok(())
}

#[cfg(feature = "rustface")]
fn detect_and_extract(
    extractor: &Extractor,
    image: &Path,
    model: &Path,
) -> Result<facesplice::FaceRecordSet> {
    let detector = facesplice::RustfaceDetector::from_file(model)
        .with_context(|| format!("failed to load model: {}", model.display()))?;
    extractor
        .detect_and_extract(image, &detector)
        .context("extraction failed")
}

#[cfg(not(feature = "rustface"))]
fn detect_and_extract(
    _extractor: &Extractor,
    _image: &Path,
    _model: &Path,
) -> Result<facesplice::FaceRecordSet> {
    bail!("auto mode requires building with the `rustface` feature")
}

// ── Recombination ─────────────────────────────────────────────────────────────

fn cmd_recombine(
    original: &Path,
    metadata: &Path,
    replacements: &Path,
    output: &Path,
) -> Result<()> {
    info!("Recombination");
    info!("  original     : {}", original.display());
    info!("  metadata     : {}", metadata.display());
    info!("  replacements : {}", replacements.display());

    let outcome = recombine_panel(original, metadata, replacements, output)
        .context("recombination failed")?;

    match outcome {
        RecombineOutcome::Written {
            path,
            recombined,
            skipped,
        } => {
            info!("recombined {recombined} faces, skipped {}", skipped.len());
            if !skipped.is_empty() {
                warn!("missing replacements for face ids {skipped:?}");
            }
            info!("saved to {}", path.display());
        }
        RecombineOutcome::NothingRecombined { skipped } => {
            warn!(
                "no replacement faces found ({} expected); nothing written",
                skipped.len()
            );
        }
    }
    Ok(())
}
