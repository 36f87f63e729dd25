//! Editing session: the current source image, the filter parameters,
//! and the processed result derived from them.
//!
//! Every mutation produces a new [`version`](Session::version) and
//! recomputes the processed buffer eagerly, so the display output never
//! lags behind the inputs. Without a loaded image there is nothing to
//! process and [`Session::processed`] returns `None`.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::types::{FilterParameters, PipelineError, PixelBuffer};

/// Source image, parameters and processed output for one editing session.
#[derive(Debug, Clone)]
pub struct Session {
    source: Option<PixelBuffer>,
    processed: Option<PixelBuffer>,
    parameters: FilterParameters,
    version: u64,
    rng: StdRng,
}

impl Session {
    /// A session with no image and default parameters, drawing noise
    /// from OS entropy.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A session with no image whose noise is reproducible from `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            source: None,
            processed: None,
            parameters: FilterParameters::default(),
            version: 0,
            rng,
        }
    }

    /// Decode `bytes` and make the result the new source image.
    ///
    /// # Errors
    ///
    /// Returns the decode error. The session is left without an image in
    /// that case; the previous source is discarded either way.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        match crate::decode::decode_rgba(bytes) {
            Ok(source) => {
                self.set_source(source);
                Ok(())
            }
            Err(e) => {
                log::warn!("failed to load image: {e}");
                self.source = None;
                self.processed = None;
                self.version += 1;
                Err(e)
            }
        }
    }

    /// Replace the source image and reprocess.
    pub fn set_source(&mut self, source: PixelBuffer) {
        self.source = Some(source);
        self.refresh();
    }

    /// Replace all parameters (clamped) and reprocess.
    pub fn set_parameters(&mut self, parameters: FilterParameters) {
        self.parameters = parameters.clamped();
        self.refresh();
    }

    /// Change only the block size.
    pub fn set_pixel_size(&mut self, pixel_size: u32) {
        self.set_parameters(FilterParameters {
            pixel_size,
            ..self.parameters
        });
    }

    /// Change only the noise level.
    pub fn set_noise_level(&mut self, noise_level: u32) {
        self.set_parameters(FilterParameters {
            noise_level,
            ..self.parameters
        });
    }

    /// Restore the default parameters (block size 8, no noise).
    pub fn reset_parameters(&mut self) {
        self.set_parameters(FilterParameters::default());
    }

    /// Incremented on every change to the source or parameters.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The current source image, if one is loaded.
    #[must_use]
    pub const fn source(&self) -> Option<&PixelBuffer> {
        self.source.as_ref()
    }

    /// The filtered image for the current source and parameters.
    #[must_use]
    pub const fn processed(&self) -> Option<&PixelBuffer> {
        self.processed.as_ref()
    }

    /// The current (clamped) parameters.
    #[must_use]
    pub const fn parameters(&self) -> FilterParameters {
        self.parameters
    }

    /// Whether a source image is loaded.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.source.is_some()
    }

    fn refresh(&mut self) {
        self.version += 1;
        self.processed = self
            .source
            .as_ref()
            .map(|source| crate::process_with_rng(source, &self.parameters, &mut self.rng));
        log::debug!(
            "session version {} (pixel_size={}, noise_level={}, image={})",
            self.version,
            self.parameters.pixel_size,
            self.parameters.noise_level,
            self.source.is_some(),
        );
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::empty()
    }
}
