//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate buffer before continuing.
//!
//! Unlike [`crate::process`] which runs both filters in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use pixelsmith_pipeline::{FilterParameters, Pipeline, PixelBuffer};
//! # fn run(source: PixelBuffer) {
//! let mut rng = rand::thread_rng();
//! let staged = Pipeline::new(source, FilterParameters::new(8, 20))
//!     .pixelate()
//!     .add_noise(&mut rng)
//!     .into_result();
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state, carrying
//! every previously computed buffer. The order is fixed: noise added
//! before pixelation would be averaged away by the block reduction, so
//! the type system only offers `.add_noise()` on [`Pixelated`].

use rand::Rng;

use crate::types::{Dimensions, FilterParameters, PixelBuffer, StagedResult};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any filter has run.
#[must_use = "pipeline stages are consumed by advancing (call .pixelate() to continue)"]
pub struct Pending {
    parameters: FilterParameters,
    source: PixelBuffer,
}

impl Pending {
    /// The source buffer.
    #[must_use]
    pub const fn source(&self) -> &PixelBuffer {
        &self.source
    }

    /// The clamped parameters this run will use.
    #[must_use]
    pub const fn parameters(&self) -> FilterParameters {
        self.parameters
    }

    /// Run the pixelation filter and advance to [`Pixelated`].
    pub fn pixelate(self) -> Pixelated {
        let (pixelated, reduced) = crate::pixelate::pixelate_with_grid(
            &self.source,
            self.parameters.pixel_size,
            self.parameters.reduce_filter,
        );
        Pixelated {
            parameters: self.parameters,
            original: self.source,
            pixelated,
            reduced,
        }
    }
}

// ───────────────────────── Stage 1: Pixelated ────────────────────────

/// Pipeline state after pixelation.
#[must_use = "pipeline stages are consumed by advancing (call .add_noise() to continue)"]
pub struct Pixelated {
    parameters: FilterParameters,
    original: PixelBuffer,
    pixelated: PixelBuffer,
    reduced: Dimensions,
}

impl Pixelated {
    /// The untouched source buffer.
    #[must_use]
    pub const fn original(&self) -> &PixelBuffer {
        &self.original
    }

    /// The blocky buffer.
    #[must_use]
    pub const fn pixelated(&self) -> &PixelBuffer {
        &self.pixelated
    }

    /// Size of the coarse grid the image was reduced to.
    #[must_use]
    pub const fn reduced(&self) -> Dimensions {
        self.reduced
    }

    /// Run the noise filter with `rng` and advance to [`Noised`].
    pub fn add_noise<R: Rng>(self, rng: &mut R) -> Noised {
        let (processed, perturbed) =
            crate::noise::add_noise_counted(&self.pixelated, self.parameters.noise_level, rng);
        Noised {
            parameters: self.parameters,
            original: self.original,
            pixelated: self.pixelated,
            reduced: self.reduced,
            processed,
            perturbed,
        }
    }
}

// ───────────────────────── Stage 2: Noised ───────────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to take the processed buffers"]
pub struct Noised {
    parameters: FilterParameters,
    original: PixelBuffer,
    pixelated: PixelBuffer,
    reduced: Dimensions,
    processed: PixelBuffer,
    perturbed: u64,
}

impl Noised {
    /// The final buffer for display and export.
    #[must_use]
    pub const fn processed(&self) -> &PixelBuffer {
        &self.processed
    }

    /// Number of pixels the noise filter selected.
    #[must_use]
    pub const fn perturbed(&self) -> u64 {
        self.perturbed
    }

    /// Consume the pipeline and return every intermediate buffer.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            original: self.original,
            pixelated: self.pixelated,
            processed: self.processed,
            reduced: self.reduced,
            parameters: self.parameters,
        }
    }

    /// Consume the pipeline and return only the final buffer.
    #[must_use]
    pub fn into_processed(self) -> PixelBuffer {
        self.processed
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 3;

/// The output produced by a single pipeline stage.
#[must_use]
pub enum StageOutput<'a> {
    /// The source buffer, before any filter.
    Source {
        /// The source buffer.
        source: &'a PixelBuffer,
    },
    /// Pixelation result.
    Pixelated {
        /// The blocky buffer.
        pixelated: &'a PixelBuffer,
        /// Coarse grid size.
        reduced: Dimensions,
    },
    /// Noise result.
    Noised {
        /// The final buffer.
        processed: &'a PixelBuffer,
        /// Number of perturbed pixels.
        perturbed: u64,
    },
}

impl StageOutput<'_> {
    /// The buffer this stage produced.
    #[must_use]
    pub fn buffer(&self) -> &PixelBuffer {
        match *self {
            Self::Source { source } => source,
            Self::Pixelated { pixelated, .. } => pixelated,
            Self::Noised { processed, .. } => processed,
        }
    }
}

/// Implemented by every stage struct so [`Stage`] can inspect them
/// uniformly.
pub trait PipelineStage {
    /// Human-readable name of this stage.
    const NAME: &str;

    /// Zero-based index of this stage.
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            source: &self.source,
        }
    }
}

impl PipelineStage for Pixelated {
    const NAME: &str = "pixelate";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Pixelated {
            pixelated: &self.pixelated,
            reduced: self.reduced,
        }
    }
}

impl PipelineStage for Noised {
    const NAME: &str = "noise";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Noised {
            processed: &self.processed,
            perturbed: self.perturbed,
        }
    }
}

/// Type-erased pipeline stage, for callers that loop instead of chaining.
///
/// ```rust
/// # use pixelsmith_pipeline::{FilterParameters, Pipeline, PixelBuffer};
/// # use pixelsmith_pipeline::pipeline::{Advance, Stage};
/// # fn run(source: PixelBuffer) {
/// let mut rng = rand::thread_rng();
/// let mut stage: Stage = Pipeline::new(source, FilterParameters::default()).into();
/// loop {
///     match stage.advance(&mut rng) {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete(&mut rng);
/// # }
/// ```
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Pixelated`].
    Pixelated(Pixelated),
    /// See [`Noised`].
    Noised(Noised),
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage.
    Complete(Stage),
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pending(_) => Pending::NAME,
            Self::Pixelated(_) => Pixelated::NAME,
            Self::Noised(_) => Noised::NAME,
        }
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Pending(_) => Pending::INDEX,
            Self::Pixelated(_) => Pixelated::INDEX,
            Self::Noised(_) => Noised::INDEX,
        }
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        match self {
            Self::Pending(s) => s.output(),
            Self::Pixelated(s) => s.output(),
            Self::Noised(s) => s.output(),
        }
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Noised(_))
    }

    /// Advance one stage, or return the final stage unchanged.
    pub fn advance<R: Rng>(self, rng: &mut R) -> Advance {
        match self {
            Self::Pending(s) => Advance::Next(Self::Pixelated(s.pixelate())),
            Self::Pixelated(s) => Advance::Next(Self::Noised(s.add_noise(rng))),
            done @ Self::Noised(_) => Advance::Complete(done),
        }
    }

    /// Run all remaining stages and return the [`StagedResult`].
    #[must_use]
    pub fn complete<R: Rng>(self, rng: &mut R) -> StagedResult {
        match self {
            Self::Pending(s) => s.pixelate().add_noise(rng).into_result(),
            Self::Pixelated(s) => s.add_noise(rng).into_result(),
            Self::Noised(s) => s.into_result(),
        }
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Pixelated> for Stage {
    fn from(s: Pixelated) -> Self {
        Self::Pixelated(s)
    }
}

impl From<Noised> for Stage {
    fn from(s: Noised) -> Self {
        Self::Noised(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental pixel-art pipeline.
///
/// Created via [`Pipeline::new`], which stores the source buffer and
/// clamped parameters without doing any work.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a source buffer and parameters.
    ///
    /// Parameters are clamped into range here; nothing else is computed.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(source: PixelBuffer, parameters: FilterParameters) -> Pending {
        Pending {
            parameters: parameters.clamped(),
            source,
        }
    }
}
