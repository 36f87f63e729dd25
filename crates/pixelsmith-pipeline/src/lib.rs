//! pixelsmith-pipeline: Pure pixel-art filter pipeline (sans-IO).
//!
//! Turns an RGBA raster into a stylized pixel-art rendition through:
//! pixelate (block reduce + nearest upscale) -> additive noise.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! buffers and returns new ones. Encoding the result as PNG or SVG
//! lives in `pixelsmith-export`; reading and writing files lives in the
//! `pixelsmith` binary.

pub mod decode;
pub mod diagnostics;
pub mod noise;
pub mod pipeline;
pub mod pixelate;
pub mod session;
pub mod types;

use rand::Rng;

pub use decode::decode_rgba;
pub use diagnostics::{Clock, PipelineDiagnostics, WebClock};
pub use pipeline::{Advance, Noised, Pending, Pipeline, PipelineStage, Pixelated, Stage, StageOutput};
pub use pixelate::ReduceFilter;
pub use session::Session;
pub use types::{Channel, Dimensions, FilterParameters, PipelineError, PixelBuffer, StagedResult};

/// Run the full filter pipeline with fresh randomness.
///
/// Parameters are clamped first. Two calls with a nonzero noise level
/// generally produce different results; use [`process_with_rng`] with a
/// seeded generator for reproducible output.
///
/// # Pipeline steps
///
/// 1. Pixelate with block size `pixel_size`
/// 2. Add noise at `noise_level` percent
#[must_use = "returns the processed buffer"]
pub fn process(source: &PixelBuffer, parameters: &FilterParameters) -> PixelBuffer {
    process_with_rng(source, parameters, &mut rand::thread_rng())
}

/// Run the full filter pipeline, drawing noise from `rng`.
#[must_use = "returns the processed buffer"]
pub fn process_with_rng<R: Rng>(
    source: &PixelBuffer,
    parameters: &FilterParameters,
    rng: &mut R,
) -> PixelBuffer {
    Pipeline::new(source.clone(), *parameters)
        .pixelate()
        .add_noise(rng)
        .into_processed()
}

/// Run the full filter pipeline and keep every intermediate buffer.
#[must_use = "returns the staged result"]
pub fn process_staged<R: Rng>(
    source: &PixelBuffer,
    parameters: &FilterParameters,
    rng: &mut R,
) -> StagedResult {
    Pipeline::new(source.clone(), *parameters)
        .pixelate()
        .add_noise(rng)
        .into_result()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let samples = (0..height)
            .flat_map(|y| {
                (0..width).flat_map(move |x| {
                    [
                        (x * 255 / width) as u8,
                        (y * 255 / height) as u8,
                        ((x + y) % 256) as u8,
                        255,
                    ]
                })
            })
            .collect();
        PixelBuffer::from_raw(width, height, samples).unwrap()
    }

    #[test]
    fn minimal_parameters_are_identity() {
        let source = gradient(37, 23);
        let out = process(&source, &FilterParameters::new(1, 0));
        assert_eq!(out, source);
    }

    #[test]
    fn output_keeps_source_dimensions() {
        let source = gradient(33, 17);
        let out = process(&source, &FilterParameters::new(7, 30));
        assert_eq!(out.dimensions(), source.dimensions());
    }

    #[test]
    fn noiseless_output_is_deterministic() {
        let source = gradient(40, 40);
        let params = FilterParameters::new(6, 0);
        assert_eq!(process(&source, &params), process(&source, &params));
    }

    #[test]
    fn ten_pixel_blocks_on_hundred_square() {
        let source = gradient(100, 100);
        let out = process(&source, &FilterParameters::new(10, 0));
        for by in 0..10 {
            for bx in 0..10 {
                let expected = out.pixel(bx * 10, by * 10).unwrap();
                for y in by * 10..by * 10 + 10 {
                    for x in bx * 10..bx * 10 + 10 {
                        assert_eq!(out.pixel(x, y), Some(expected), "block ({bx}, {by})");
                    }
                }
            }
        }
    }

    #[test]
    fn staged_result_matches_process_with_rng() {
        let source = gradient(20, 12);
        let params = FilterParameters::new(4, 45);
        let staged = process_staged(&source, &params, &mut StdRng::seed_from_u64(8));
        let direct = process_with_rng(&source, &params, &mut StdRng::seed_from_u64(8));
        assert_eq!(staged.processed, direct);
        assert_eq!(staged.original, source);
        assert_eq!(staged.parameters, params);
    }

    #[test]
    fn out_of_range_parameters_are_clamped() {
        let source = gradient(12, 12);
        let staged = process_staged(
            &source,
            &FilterParameters {
                pixel_size: 0,
                noise_level: 0,
                reduce_filter: ReduceFilter::Box,
            },
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(staged.parameters.pixel_size, 1);
        assert_eq!(staged.processed, source);
    }
}
