//! Pixelation: reduce to a coarse grid, then scale back up with
//! nearest-neighbor sampling.
//!
//! The coarse grid is `floor(w / pixel_size) x floor(h / pixel_size)`,
//! with each axis clamped to at least 1 so oversized blocks collapse to a
//! single solid color rather than an empty image. Each coarse cell covers
//! the source range `[i * w / rw, (i + 1) * w / rw)`, so cells tile the
//! source exactly with no gaps or overlap.
//!
//! Upscaling never interpolates: output pixel `(x, y)` copies the cell
//! whose source range contains it, so every block in the output lines up
//! exactly with the pixels it was computed from. This keeps block edges
//! hard and makes `pixel_size = 1` an exact identity.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, FilterParameters, PixelBuffer};

/// How the color of each coarse cell is chosen during reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceFilter {
    /// Average every channel over the cell (area resampling).
    #[default]
    Box,
    /// Take the single source pixel at the cell's center. Faster, and
    /// keeps original colors, but can alias on fine detail.
    Nearest,
}

impl fmt::Display for ReduceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box => f.write_str("box"),
            Self::Nearest => f.write_str("nearest"),
        }
    }
}

/// Size of the coarse grid for an image of `dimensions` and the given
/// block size.
///
/// A `pixel_size` of 0 is treated as 1. Each axis is at least 1.
#[must_use]
pub fn reduced_dimensions(dimensions: Dimensions, pixel_size: u32) -> Dimensions {
    let pixel_size = pixel_size.max(1);
    Dimensions {
        width: (dimensions.width / pixel_size).max(1),
        height: (dimensions.height / pixel_size).max(1),
    }
}

/// Pixelate `source` with blocks of roughly `pixel_size x pixel_size`.
///
/// Returns a new buffer with the same dimensions as `source`.
#[must_use = "returns the pixelated buffer"]
pub fn pixelate(source: &PixelBuffer, pixel_size: u32, filter: ReduceFilter) -> PixelBuffer {
    pixelate_with_grid(source, pixel_size, filter).0
}

/// Like [`pixelate`] but also returns the coarse grid size, which the
/// pipeline records for diagnostics.
///
/// `pixel_size` is clamped into
/// [`FilterParameters::MIN_PIXEL_SIZE`]..=[`FilterParameters::MAX_PIXEL_SIZE`].
#[must_use = "returns the pixelated buffer"]
pub fn pixelate_with_grid(
    source: &PixelBuffer,
    pixel_size: u32,
    filter: ReduceFilter,
) -> (PixelBuffer, Dimensions) {
    let pixel_size = pixel_size.clamp(
        FilterParameters::MIN_PIXEL_SIZE,
        FilterParameters::MAX_PIXEL_SIZE,
    );
    let dimensions = source.dimensions();
    let reduced = reduced_dimensions(dimensions, pixel_size);
    log::debug!(
        "pixelate {}x{} with block {pixel_size} -> grid {}x{} ({filter})",
        dimensions.width,
        dimensions.height,
        reduced.width,
        reduced.height,
    );

    let grid = reduce(source, reduced, filter);
    (upscale_nearest(&grid, reduced, dimensions), reduced)
}

/// Source coordinates covered by coarse cell `index` along one axis.
fn cell_span(index: u32, cells: u32, extent: u32) -> Range<u32> {
    let start = scale(index, extent, cells);
    let end = scale(index + 1, extent, cells);
    start..end
}

/// Coarse cell whose [`cell_span`] contains source coordinate `pos`.
///
/// Inverse of `start(i) = floor(i * extent / cells)`:
/// `ceil((pos + 1) * cells / extent) - 1`.
fn cell_of(pos: u32, cells: u32, extent: u32) -> usize {
    let cell = ((u64::from(pos) + 1) * u64::from(cells)).div_ceil(u64::from(extent)) - 1;
    usize::try_from(cell).unwrap_or(usize::MAX)
}

/// `value * numerator / denominator` without intermediate overflow.
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    // `value <= denominator` at every call site, so the result fits.
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Compute one color per coarse cell, row-major.
fn reduce(source: &PixelBuffer, reduced: Dimensions, filter: ReduceFilter) -> Vec<[u8; 4]> {
    let dimensions = source.dimensions();
    let image = source.as_image();
    let mut cells = Vec::with_capacity(
        usize::try_from(reduced.pixel_count()).unwrap_or_default(),
    );

    for j in 0..reduced.height {
        let rows = cell_span(j, reduced.height, dimensions.height);
        for i in 0..reduced.width {
            let cols = cell_span(i, reduced.width, dimensions.width);
            let color = match filter {
                ReduceFilter::Box => {
                    let mut sums = [0u64; 4];
                    for y in rows.clone() {
                        for x in cols.clone() {
                            for (sum, &sample) in sums.iter_mut().zip(&image.get_pixel(x, y).0) {
                                *sum += u64::from(sample);
                            }
                        }
                    }
                    let count = u64::from(cols.end - cols.start) * u64::from(rows.end - rows.start);
                    sums.map(|sum| u8::try_from((sum + count / 2) / count).unwrap_or(u8::MAX))
                }
                ReduceFilter::Nearest => {
                    let x = cols.start + (cols.end - cols.start) / 2;
                    let y = rows.start + (rows.end - rows.start) / 2;
                    image.get_pixel(x, y).0
                }
            };
            cells.push(color);
        }
    }

    cells
}

/// Nearest-neighbor upscale of a row-major coarse grid to `target`.
fn upscale_nearest(grid: &[[u8; 4]], reduced: Dimensions, target: Dimensions) -> PixelBuffer {
    let stride = reduced.width as usize;
    PixelBuffer::from_fn(target, |x, y| {
        let i = cell_of(x, reduced.width, target.width);
        let j = cell_of(y, reduced.height, target.height);
        grid.get(j * stride + i).copied().unwrap_or_default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Every pixel gets a distinct-ish color derived from its position.
    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let samples = (0..height)
            .flat_map(|y| {
                (0..width).flat_map(move |x| {
                    [
                        (x * 7 % 256) as u8,
                        (y * 11 % 256) as u8,
                        ((x + y) * 3 % 256) as u8,
                        255,
                    ]
                })
            })
            .collect();
        PixelBuffer::from_raw(width, height, samples).unwrap()
    }

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
        let samples = std::iter::repeat_n(rgba, (width * height) as usize)
            .flatten()
            .collect();
        PixelBuffer::from_raw(width, height, samples).unwrap()
    }

    #[test]
    fn default_filter_is_box() {
        assert_eq!(ReduceFilter::default(), ReduceFilter::Box);
    }

    #[test]
    fn reduced_dimensions_floor_divides() {
        let dims = Dimensions {
            width: 100,
            height: 75,
        };
        assert_eq!(
            reduced_dimensions(dims, 10),
            Dimensions {
                width: 10,
                height: 7
            }
        );
    }

    #[test]
    fn reduced_dimensions_clamp_to_one() {
        let dims = Dimensions {
            width: 4,
            height: 60,
        };
        assert_eq!(
            reduced_dimensions(dims, 50),
            Dimensions {
                width: 1,
                height: 1
            }
        );
        assert_eq!(reduced_dimensions(dims, 0), dims);
    }

    #[test]
    fn pixel_size_one_is_identity() {
        let source = gradient(23, 17);
        for filter in [ReduceFilter::Box, ReduceFilter::Nearest] {
            assert_eq!(pixelate(&source, 1, filter), source, "filter {filter}");
        }
    }

    #[test]
    fn pixel_size_zero_behaves_like_one() {
        let source = gradient(9, 9);
        assert_eq!(pixelate(&source, 0, ReduceFilter::Box), source);
    }

    #[test]
    fn output_keeps_source_dimensions() {
        let source = gradient(37, 21);
        let (out, grid) = pixelate_with_grid(&source, 6, ReduceFilter::Box);
        assert_eq!(out.dimensions(), source.dimensions());
        assert_eq!(
            grid,
            Dimensions {
                width: 6,
                height: 3
            }
        );
    }

    #[test]
    fn hundred_square_with_block_ten_is_ten_by_ten_blocks() {
        let source = gradient(100, 100);
        let out = pixelate(&source, 10, ReduceFilter::Box);
        for by in 0..10 {
            for bx in 0..10 {
                let expected = out.pixel(bx * 10, by * 10).unwrap();
                for y in by * 10..by * 10 + 10 {
                    for x in bx * 10..bx * 10 + 10 {
                        assert_eq!(out.pixel(x, y).unwrap(), expected, "({x}, {y})");
                    }
                }
            }
        }
    }

    #[test]
    fn oversized_block_yields_single_solid_color() {
        let source = gradient(4, 4);
        let out = pixelate(&source, 50, ReduceFilter::Box);
        let first = out.pixel(0, 0).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.pixel(x, y).unwrap(), first);
            }
        }
    }

    #[test]
    fn box_filter_averages_cell() {
        // 2x2 block: two black, two white pixels -> mid gray (rounded).
        let samples = vec![
            0, 0, 0, 255, 255, 255, 255, 255, //
            255, 255, 255, 255, 0, 0, 0, 255,
        ];
        let source = PixelBuffer::from_raw(2, 2, samples).unwrap();
        let out = pixelate(&source, 2, ReduceFilter::Box);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(out.pixel(x, y).unwrap(), [128, 128, 128, 255]);
            }
        }
    }

    #[test]
    fn box_filter_averages_alpha_too() {
        let samples = vec![10, 20, 30, 0, 10, 20, 30, 200];
        let source = PixelBuffer::from_raw(2, 1, samples).unwrap();
        let out = pixelate(&source, 2, ReduceFilter::Box);
        assert_eq!(out.pixel(0, 0).unwrap(), [10, 20, 30, 100]);
        assert_eq!(out.pixel(1, 0).unwrap(), [10, 20, 30, 100]);
    }

    #[test]
    fn nearest_filter_samples_cell_center() {
        let source = gradient(9, 9);
        let out = pixelate(&source, 3, ReduceFilter::Nearest);
        // Cell (1, 2) covers x 3..6, y 6..9; its center is (4, 7).
        let center = source.pixel(4, 7).unwrap();
        for y in 6..9 {
            for x in 3..6 {
                assert_eq!(out.pixel(x, y).unwrap(), center);
            }
        }
    }

    #[test]
    fn solid_image_is_unchanged_at_any_block_size() {
        let source = solid(31, 19, [12, 200, 99, 180]);
        for size in [1, 2, 5, 13, 50] {
            assert_eq!(pixelate(&source, size, ReduceFilter::Box), source);
        }
    }

    #[test]
    fn block_count_is_bounded_by_grid() {
        let (w, h, k) = (37_u32, 29_u32, 4_u32);
        let source = gradient(w, h);
        let out = pixelate(&source, k, ReduceFilter::Box);

        let mut colors = HashSet::new();
        for y in 0..h {
            for x in 0..w {
                colors.insert(out.pixel(x, y).unwrap());
            }
        }
        assert!(colors.len() <= (w.div_ceil(k) * h.div_ceil(k)) as usize);
    }

    #[test]
    fn cell_of_inverts_cell_span() {
        for (cells, extent) in [(3, 10), (1, 4), (7, 7), (6, 37), (2, 3)] {
            for i in 0..cells {
                for pos in cell_span(i, cells, extent) {
                    assert_eq!(cell_of(pos, cells, extent), i as usize);
                }
            }
        }
    }

    #[test]
    fn uneven_division_has_hard_edges_and_no_gaps() {
        // 10 / 3 -> 3 cells covering x 0..3, 3..6, 6..10.
        let source = gradient(10, 1);
        let out = pixelate(&source, 3, ReduceFilter::Nearest);
        let row: Vec<_> = (0..10).map(|x| out.pixel(x, 0).unwrap()).collect();
        assert_eq!(row[0], row[2]);
        assert_eq!(row[3], row[5]);
        assert_eq!(row[6], row[9]);
        assert_ne!(row[2], row[3]);
        assert_ne!(row[5], row[6]);
    }

    #[test]
    fn input_is_not_modified() {
        let source = gradient(12, 12);
        let copy = source.clone();
        let _ = pixelate(&source, 4, ReduceFilter::Box);
        assert_eq!(source, copy);
    }
}
