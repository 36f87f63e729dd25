//! Bernoulli-gated additive noise.
//!
//! Each pixel is independently selected with probability `level / 100`.
//! A selected pixel gets one random delta,
//! `(u - 0.5) * 255 * (level / 50)` with `u` uniform in `[0, 1)`, added
//! to R, G and B alike; each channel is then rounded and clamped to
//! `[0, 255]`. Alpha is never touched. Unselected pixels are copied
//! unchanged.
//!
//! The random source is a parameter. [`crate::process`] passes an
//! unseeded thread-local RNG, so two runs at the same level differ;
//! tests and the CLI's `--seed` pass a seeded `StdRng` instead.

use rand::Rng;

use crate::types::{FilterParameters, PixelBuffer};

/// Add noise to `source` at `noise_level` percent.
///
/// A level of 0 returns an identical copy without consuming any
/// randomness. Levels above 100 behave like 100.
#[must_use = "returns the noisy buffer"]
pub fn add_noise<R: Rng>(source: &PixelBuffer, noise_level: u32, rng: &mut R) -> PixelBuffer {
    add_noise_counted(source, noise_level, rng).0
}

/// Like [`add_noise`] but also returns how many pixels were selected
/// for perturbation.
#[must_use = "returns the noisy buffer"]
pub fn add_noise_counted<R: Rng>(
    source: &PixelBuffer,
    noise_level: u32,
    rng: &mut R,
) -> (PixelBuffer, u64) {
    let level = noise_level.min(FilterParameters::MAX_NOISE_LEVEL);
    if level == 0 {
        return (source.clone(), 0);
    }

    let probability = f64::from(level) / 100.0;
    let amplitude = 255.0 * (f64::from(level) / 50.0);
    let image = source.as_image();
    let mut perturbed = 0_u64;

    let noisy = PixelBuffer::from_fn(source.dimensions(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        if rng.gen_range(0.0..1.0) >= probability {
            return [r, g, b, a];
        }
        perturbed += 1;
        let delta = (rng.gen_range(0.0..1.0) - 0.5) * amplitude;
        [shift(r, delta), shift(g, delta), shift(b, delta), a]
    });

    log::debug!(
        "noise level {level}: perturbed {perturbed} of {} pixels",
        source.dimensions().pixel_count(),
    );
    (noisy, perturbed)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shift(sample: u8, delta: f64) -> u8 {
    (f64::from(sample) + delta).round().clamp(0.0, 255.0) as u8
}
