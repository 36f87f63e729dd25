//! pixelsmith: turn an image into pixel art from the command line.
//!
//! Decodes an image file, pixelates it, optionally adds noise, and
//! writes the result as PNG and/or SVG. Per-stage diagnostics are
//! printed to stdout, as a report or as JSON.
//!
//! Output files are written through a temporary file in the destination
//! directory and only moved into place once fully written, so a failed
//! run never leaves a partial file behind.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pixelsmith -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use pixelsmith_export::{ExportFormat, SvgMetadata};
use pixelsmith_pipeline::{FilterParameters, ReduceFilter, WebClock};

/// Turn an image into pixel art.
///
/// Reduces the image to a coarse grid of solid blocks, optionally
/// perturbs it with random noise, and exports PNG or SVG.
#[derive(Parser)]
#[command(name = "pixelsmith", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Block edge length in source pixels (1-50).
    #[arg(long, default_value_t = FilterParameters::DEFAULT_PIXEL_SIZE)]
    pixel_size: u32,

    /// Noise intensity in percent (0-100).
    #[arg(long, default_value_t = FilterParameters::DEFAULT_NOISE_LEVEL)]
    noise_level: u32,

    /// How each block's color is chosen.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_REDUCER)]
    reduce_filter: Reducer,

    /// Seed for the noise generator (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Full filter parameters as a JSON string.
    ///
    /// When provided, the individual parameter flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    params_json: Option<String>,

    /// Write PNG output to file.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Block reduction filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Reducer {
    /// Average every pixel in the block.
    Box,
    /// Take the pixel at the block center.
    Nearest,
}

/// Maps a [`ReduceFilter`] to the local CLI [`Reducer`] enum.
const fn reducer_from_pipeline(f: ReduceFilter) -> Reducer {
    match f {
        ReduceFilter::Box => Reducer::Box,
        ReduceFilter::Nearest => Reducer::Nearest,
    }
}

/// The CLI default reducer, derived from
/// [`FilterParameters::DEFAULT_REDUCE_FILTER`] so the two cannot silently
/// diverge.
const CLI_DEFAULT_REDUCER: Reducer =
    reducer_from_pipeline(FilterParameters::DEFAULT_REDUCE_FILTER);

/// Build [`FilterParameters`] from CLI arguments.
///
/// If `--params-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn parameters_from_cli(cli: &Cli) -> Result<FilterParameters, String> {
    if let Some(ref json) = cli.params_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --params-json: {e}"));
    }

    Ok(FilterParameters {
        pixel_size: cli.pixel_size,
        noise_level: cli.noise_level,
        reduce_filter: match cli.reduce_filter {
            Reducer::Box => ReduceFilter::Box,
            Reducer::Nearest => ReduceFilter::Nearest,
        },
    })
}

/// The `(format, path)` pairs to write. Defaults to `pixel-art.png` in
/// the current directory when neither `--png` nor `--svg` is given.
fn outputs_from_cli(cli: &Cli) -> Vec<(ExportFormat, PathBuf)> {
    let mut outputs = Vec::new();
    if let Some(ref path) = cli.png {
        outputs.push((ExportFormat::Png, path.clone()));
    }
    if let Some(ref path) = cli.svg {
        outputs.push((ExportFormat::Svg, path.clone()));
    }
    if outputs.is_empty() {
        outputs.push((ExportFormat::Png, PathBuf::from(ExportFormat::Png.filename())));
    }
    outputs
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Write `bytes` to `path` via a temporary file in the same directory.
///
/// The temporary file is removed when anything fails before the final
/// rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let parameters = match parameters_from_cli(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "image {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );

    let mut rng = cli
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let (staged, diagnostics) = match pixelsmith_pipeline::diagnostics::process_bytes_with_diagnostics(
        &image_bytes,
        &parameters,
        &mut rng,
        &WebClock,
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    let used = staged.parameters;
    let title = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pixel-art");
    let desc = format!(
        "pixel_size={} noise_level={} reduce_filter={}",
        used.pixel_size, used.noise_level, used.reduce_filter,
    );
    let parameters_json = match serde_json::to_string(&used) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing parameters: {e}");
            return ExitCode::FAILURE;
        }
    };
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        parameters_json: Some(&parameters_json),
    };

    let mut status = ExitCode::SUCCESS;
    for (format, path) in outputs_from_cli(&cli) {
        let artifact =
            match pixelsmith_export::export_with_metadata(&staged.processed, format, &metadata) {
                Ok(artifact) => artifact,
                Err(e) => {
                    eprintln!("Error exporting {format}: {e}");
                    status = ExitCode::FAILURE;
                    continue;
                }
            };
        match write_atomic(&path, artifact.as_bytes()) {
            Ok(()) => {
                eprintln!(
                    "{} written to {} ({} bytes)",
                    format.extension().to_uppercase(),
                    path.display(),
                    artifact.as_bytes().len(),
                );
            }
            Err(e) => {
                eprintln!("Error writing {format} to {}: {e}", path.display());
                status = ExitCode::FAILURE;
            }
        }
    }

    status
}
