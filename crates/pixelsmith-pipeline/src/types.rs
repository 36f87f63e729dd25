//! Shared types for the pixelsmith filter pipeline.

use serde::{Deserialize, Serialize};

use crate::pixelate::ReduceFilter;

/// Re-export `RgbaImage` so downstream crates can hand decoded images
/// to [`PixelBuffer::from_rgba`] without depending on `image` directly.
pub use image::RgbaImage;

/// Number of interleaved samples per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels (`width * height`).
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Number of RGBA samples a buffer of these dimensions holds.
    #[must_use]
    pub const fn sample_count(self) -> u64 {
        self.pixel_count() * CHANNELS as u64
    }
}

/// One of the four interleaved color channels of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Alpha (opacity).
    Alpha,
}

impl Channel {
    /// Offset of this channel within an RGBA sample group.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Alpha => 3,
        }
    }
}

/// An immutable RGBA image: `width * height * 4` interleaved samples,
/// row-major, top-to-bottom.
///
/// Both dimensions are always non-zero and the sample slice always has
/// exactly `width * height * 4` entries. Constructors that could break
/// this return [`PipelineError`] instead.
///
/// There is no in-place mutation API. Every filter borrows its input and
/// allocates a fresh buffer for its output, so pipeline stages never
/// alias each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Wrap an already-decoded RGBA image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ZeroDimensions`] if either dimension is 0.
    pub fn from_rgba(image: RgbaImage) -> Result<Self, PipelineError> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { image })
    }

    /// Build a buffer from raw interleaved RGBA samples.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ZeroDimensions`] if either dimension is 0.
    /// Returns [`PipelineError::SampleLength`] if `samples` does not hold
    /// exactly `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, PipelineError> {
        let dimensions = check_dimensions(width, height)?;
        let expected = dimensions.sample_count();
        let actual = samples.len();
        if u64::try_from(actual).ok() != Some(expected) {
            return Err(PipelineError::SampleLength { expected, actual });
        }
        let image = RgbaImage::from_raw(width, height, samples)
            .ok_or(PipelineError::SampleLength { expected, actual })?;
        Ok(Self { image })
    }

    /// Allocate a new fully transparent buffer of the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ZeroDimensions`] if either dimension is 0.
    pub fn blank(width: u32, height: u32) -> Result<Self, PipelineError> {
        check_dimensions(width, height)?;
        Ok(Self {
            image: RgbaImage::new(width, height),
        })
    }

    /// Allocate a buffer of the given dimensions, filling each pixel in
    /// row-major order from `f(x, y)`.
    ///
    /// Callers pass dimensions taken from an existing buffer, which are
    /// already known to be non-zero.
    pub(crate) fn from_fn(
        dimensions: Dimensions,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> Self {
        debug_assert!(dimensions.width > 0 && dimensions.height > 0);
        Self {
            image: RgbaImage::from_fn(dimensions.width, dimensions.height, |x, y| {
                image::Rgba(f(x, y))
            }),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width and height together.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    /// The raw interleaved RGBA samples.
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// The RGBA value at `(x, y)`, or `None` if out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// A single channel of the pixel at `(x, y)`, or `None` if out of bounds.
    #[must_use]
    pub fn channel(&self, x: u32, y: u32, channel: Channel) -> Option<u8> {
        self.pixel(x, y).map(|p| p[channel.index()])
    }

    /// Borrow the underlying `image` buffer (for encoders).
    #[must_use]
    pub const fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consume the buffer and return the underlying `image` buffer.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<Dimensions, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::ZeroDimensions { width, height });
    }
    Ok(Dimensions { width, height })
}

/// Serde proxy for [`PixelBuffer`]: `(width, height, samples)`.
///
/// `image::ImageBuffer` does not implement serde traits, and
/// deserialization must re-check the length invariant anyway.
#[derive(Serialize, Deserialize)]
struct PixelBufferProxy(u32, u32, Vec<u8>);

impl Serialize for PixelBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PixelBufferProxy(self.width(), self.height(), self.samples().to_vec()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PixelBuffer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let PixelBufferProxy(width, height, samples) = PixelBufferProxy::deserialize(deserializer)?;
        Self::from_raw(width, height, samples).map_err(serde::de::Error::custom)
    }
}

/// User-facing filter parameters.
///
/// Fields are public and unchecked; out-of-range values are never an
/// error. Every consumer calls [`clamped`](Self::clamped) before use, so
/// a `pixel_size` of 0 behaves like 1 and a `noise_level` of 250 behaves
/// like 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// Edge length of one output block in source pixels (1 to 50).
    pub pixel_size: u32,

    /// Noise intensity in percent (0 to 100). Controls both the share of
    /// pixels perturbed and the magnitude of each perturbation.
    pub noise_level: u32,

    /// How each coarse cell's color is chosen during reduction.
    pub reduce_filter: ReduceFilter,
}

impl FilterParameters {
    /// Smallest accepted block size (identity).
    pub const MIN_PIXEL_SIZE: u32 = 1;
    /// Largest accepted block size.
    pub const MAX_PIXEL_SIZE: u32 = 50;
    /// Smallest noise level (no noise).
    pub const MIN_NOISE_LEVEL: u32 = 0;
    /// Largest noise level (every pixel is a candidate).
    pub const MAX_NOISE_LEVEL: u32 = 100;
    /// Block size restored by [`Session::reset_parameters`](crate::Session::reset_parameters).
    pub const DEFAULT_PIXEL_SIZE: u32 = 8;
    /// Noise level restored by [`Session::reset_parameters`](crate::Session::reset_parameters).
    pub const DEFAULT_NOISE_LEVEL: u32 = 0;
    /// Reduction filter used when none is specified.
    pub const DEFAULT_REDUCE_FILTER: ReduceFilter = ReduceFilter::Box;

    /// Create parameters, clamping both values into range.
    #[must_use]
    pub fn new(pixel_size: u32, noise_level: u32) -> Self {
        Self {
            pixel_size,
            noise_level,
            ..Self::default()
        }
        .clamped()
    }

    /// Return a copy with `pixel_size` and `noise_level` clamped into
    /// their accepted ranges.
    #[must_use]
    pub fn clamped(self) -> Self {
        let clamped = Self {
            pixel_size: self
                .pixel_size
                .clamp(Self::MIN_PIXEL_SIZE, Self::MAX_PIXEL_SIZE),
            noise_level: self
                .noise_level
                .clamp(Self::MIN_NOISE_LEVEL, Self::MAX_NOISE_LEVEL),
            reduce_filter: self.reduce_filter,
        };
        if clamped != self {
            log::warn!(
                "filter parameters out of range (pixel_size={}, noise_level={}), clamped to ({}, {})",
                self.pixel_size,
                self.noise_level,
                clamped.pixel_size,
                clamped.noise_level,
            );
        }
        clamped
    }

    /// Whether both values already lie within their accepted ranges.
    #[must_use]
    pub const fn is_in_range(&self) -> bool {
        self.pixel_size >= Self::MIN_PIXEL_SIZE
            && self.pixel_size <= Self::MAX_PIXEL_SIZE
            && self.noise_level <= Self::MAX_NOISE_LEVEL
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            pixel_size: Self::DEFAULT_PIXEL_SIZE,
            noise_level: Self::DEFAULT_NOISE_LEVEL,
            reduce_filter: Self::DEFAULT_REDUCE_FILTER,
        }
    }
}

/// Result of running the pipeline with every intermediate buffer kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Stage 0: the source buffer as handed in by the caller.
    pub original: PixelBuffer,
    /// Stage 1: blocky buffer after pixelation.
    pub pixelated: PixelBuffer,
    /// Stage 2: final buffer after noise injection.
    pub processed: PixelBuffer,
    /// Size of the coarse grid pixelation reduced to.
    pub reduced: Dimensions,
    /// The clamped parameters actually used.
    pub parameters: FilterParameters,
}

/// Errors that can occur while building buffers or decoding input.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A buffer was requested with a zero width or height.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Raw samples did not match `width * height * 4`.
    #[error("expected {expected} RGBA samples, got {actual}")]
    SampleLength {
        /// Required number of samples.
        expected: u64,
        /// Number of samples supplied.
        actual: usize,
    },
}

/// Serde-compatible proxy for `PipelineError`.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    ZeroDimensions { width: u32, height: u32 },
    SampleLength { expected: u64, actual: usize },
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::ZeroDimensions { width, height } => PipelineErrorProxy::ZeroDimensions {
                width: *width,
                height: *height,
            },
            Self::SampleLength { expected, actual } => PipelineErrorProxy::SampleLength {
                expected: *expected,
                actual: *actual,
            },
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            PipelineErrorProxy::ImageDecode(msg) => {
                // The original typed error cannot be rebuilt; keep its message.
                Self::ImageDecode(image::ImageError::Decoding(
                    image::error::DecodingError::new(image::error::ImageFormatHint::Unknown, msg),
                ))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::ZeroDimensions { width, height } => {
                Self::ZeroDimensions { width, height }
            }
            PipelineErrorProxy::SampleLength { expected, actual } => {
                Self::SampleLength { expected, actual }
            }
        })
    }
}
