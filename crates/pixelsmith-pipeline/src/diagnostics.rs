//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps come
//! from a [`Clock`], so the same code runs natively and on WASM;
//! [`WebClock`] is backed by the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` elsewhere.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::pixelate::ReduceFilter;
use crate::types::{FilterParameters, PipelineError, PixelBuffer, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Image decoding (only when the run started from encoded bytes).
    pub decode: Option<StageDiagnostics>,
    /// Stage 1: pixelation.
    pub pixelate: StageDiagnostics,
    /// Stage 2: noise injection.
    pub noise: StageDiagnostics,
    /// Total wall-clock duration of the entire run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Pixelation metrics.
    Pixelate {
        /// Block size after clamping.
        pixel_size: u32,
        /// Reduction filter used.
        filter: ReduceFilter,
        /// Coarse grid width.
        reduced_width: u32,
        /// Coarse grid height.
        reduced_height: u32,
    },
    /// Noise metrics.
    Noise {
        /// Noise level after clamping.
        noise_level: u32,
        /// Pixels selected for perturbation.
        perturbed_pixels: u64,
        /// Total pixel count, for computing the perturbed share.
        total_pixel_count: u64,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of solid blocks in the pixelated output.
    pub block_count: u64,
    /// The clamped parameters used.
    pub parameters: FilterParameters,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages: Vec<(&str, &StageDiagnostics)> = Vec::with_capacity(3);
        if let Some(ref decode) = self.decode {
            stages.push(("Decode", decode));
        }
        stages.push(("Pixelate", &self.pixelate));
        stages.push(("Noise", &self.noise));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Blocks: {}  |  pixel_size={} noise_level={}",
            self.summary.block_count,
            self.summary.parameters.pixel_size,
            self.summary.parameters.noise_level,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => {
            format!("{input_bytes} bytes -> {width}x{height}")
        }
        StageMetrics::Pixelate {
            pixel_size,
            filter,
            reduced_width,
            reduced_height,
        } => {
            format!("block={pixel_size} filter={filter} grid={reduced_width}x{reduced_height}")
        }
        StageMetrics::Noise {
            noise_level,
            perturbed_pixels,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let share = if *total_pixel_count > 0 {
                *perturbed_pixels as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("level={noise_level} perturbed={perturbed_pixels} ({share:.1}%)")
        }
    }
}

/// Run the pipeline on an already-decoded buffer, timing each stage.
#[must_use]
pub fn process_with_diagnostics<R: Rng, C: Clock>(
    source: &PixelBuffer,
    parameters: &FilterParameters,
    rng: &mut R,
    clock: &C,
) -> (StagedResult, PipelineDiagnostics) {
    run_timed(source.clone(), parameters, rng, clock, None, clock.now())
}

/// Decode `image_bytes`, then run the pipeline, timing every stage
/// including decode.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// when decoding fails.
pub fn process_bytes_with_diagnostics<R: Rng, C: Clock>(
    image_bytes: &[u8],
    parameters: &FilterParameters,
    rng: &mut R,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let start = clock.now();
    let source = crate::decode::decode_rgba(image_bytes)?;
    let dimensions = source.dimensions();
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
        },
    };
    Ok(run_timed(source, parameters, rng, clock, Some(decode), start))
}

fn run_timed<R: Rng, C: Clock>(
    source: PixelBuffer,
    parameters: &FilterParameters,
    rng: &mut R,
    clock: &C,
    decode: Option<StageDiagnostics>,
    start: C::Instant,
) -> (StagedResult, PipelineDiagnostics) {
    let dimensions = source.dimensions();
    let pending = Pipeline::new(source, *parameters);
    let parameters = pending.parameters();

    let t = clock.now();
    let pixelated = pending.pixelate();
    let reduced = pixelated.reduced();
    let pixelate = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Pixelate {
            pixel_size: parameters.pixel_size,
            filter: parameters.reduce_filter,
            reduced_width: reduced.width,
            reduced_height: reduced.height,
        },
    };

    let t = clock.now();
    let noised = pixelated.add_noise(rng);
    let noise = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Noise {
            noise_level: parameters.noise_level,
            perturbed_pixels: noised.perturbed(),
            total_pixel_count: dimensions.pixel_count(),
        },
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        pixelate,
        noise,
        total_duration: clock.elapsed(&start),
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            block_count: reduced.pixel_count(),
            parameters,
        },
    };
    (noised.into_result(), diagnostics)
}
