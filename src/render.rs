// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

use std::ops::Range;
use std::time::Instant;

use image::{Rgb, RgbImage};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::colorschemes::{colorize, to_rgb8, PixelSink};
use crate::error::{Error, Result};
use crate::iterate::Mandelbrot;
use crate::viewport::Viewport;

// {{{ bands

/// Split the columns `[0, width)` into *nbands* contiguous bands.
///
/// Every band has `width / nbands` columns and the last band also takes the
/// remainder, so the partition only depends on *width* and *nbands*.
pub fn band_partition(width: usize, nbands: usize) -> Result<Vec<Range<usize>>> {
    if nbands == 0 {
        return Err(Error::InvalidBands);
    }

    let size = width / nbands;
    let bands = (0..nbands)
        .map(|i| {
            let start = i * size;
            let end = if i + 1 == nbands { width } else { start + size };
            start..end
        })
        .collect();

    Ok(bands)
}

// }}}

// {{{ count grid

/// Escape counts for every pixel of an image.
///
/// The counts are stored as a `height x width` matrix in column-major order,
/// so the counts of a single pixel column are contiguous in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct CountGrid {
    counts: DMatrix<u32>,
    max_count: u32,
}

impl CountGrid {
    pub fn width(&self) -> usize {
        self.counts.ncols()
    }

    pub fn height(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of pixels in the grid.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Largest count observed in the grid.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts[(y, x)]
    }

    /// Counts of the pixel column *x*, ordered by row.
    pub fn column(&self, x: usize) -> &[u32] {
        let height = self.height();
        &self.counts.as_slice()[x * height..(x + 1) * height]
    }

    /// Iterate over `(x, y, count)` with *x* as the outer loop.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        let height = self.height();

        self.counts
            .as_slice()
            .iter()
            .enumerate()
            .map(move |(i, &count)| (i / height, i % height, count))
    }
}

// }}}

// {{{ engine

/// Computes escape counts over the pixel grid in parallel column bands.
#[derive(Copy, Clone, Debug)]
pub struct Engine {
    /// Iteration parameters for every pixel.
    pub mandelbrot: Mandelbrot,
    /// Number of column bands computed concurrently.
    pub nbands: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            mandelbrot: Mandelbrot::default(),
            nbands: rayon::current_num_threads().max(1),
        }
    }
}

impl Engine {
    pub fn new(mandelbrot: Mandelbrot, nbands: usize) -> Result<Self> {
        if nbands == 0 {
            return Err(Error::InvalidBands);
        }

        Ok(Engine { mandelbrot, nbands })
    }

    /// Engine with the default iteration parameters and *nbands* bands.
    pub fn with_bands(nbands: usize) -> Result<Self> {
        Engine::new(Mandelbrot::default(), nbands)
    }

    /// Compute the escape count of every pixel of a `width x height` image
    /// covering *viewport*.
    pub fn compute(&self, viewport: &Viewport, width: usize, height: usize) -> Result<CountGrid> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        viewport.validate()?;

        let bands = band_partition(width, self.nbands)?;
        log::debug!(
            "Computing {}x{} pixels in {} bands: {:?}",
            width,
            height,
            bands.len(),
            bands
        );

        let now = Instant::now();
        let mut counts = DMatrix::<u32>::zeros(height, width);

        // Scope of slicing up `counts` into column bands.
        let max_count = {
            let mut rest = counts.as_mut_slice();
            let mut jobs: Vec<(Range<usize>, &mut [u32])> = Vec::with_capacity(bands.len());
            for band in bands {
                let (slice, tail) = std::mem::take(&mut rest).split_at_mut(band.len() * height);
                jobs.push((band, slice));
                rest = tail;
            }

            jobs.into_par_iter()
                .map(|(band, slice)| self.compute_band(viewport, width, height, band, slice))
                .max()
                .unwrap_or(0)
        };

        log::debug!(
            "Computed counts in {:.3}s (max count {})",
            now.elapsed().as_secs_f32(),
            max_count
        );

        Ok(CountGrid { counts, max_count })
    }

    /// Fill the columns in *band* and return the largest count found.
    ///
    /// *slice* holds exactly the counts of the band's columns in column-major
    /// order.
    fn compute_band(
        &self,
        viewport: &Viewport,
        width: usize,
        height: usize,
        band: Range<usize>,
        slice: &mut [u32],
    ) -> u32 {
        debug_assert_eq!(slice.len(), band.len() * height);

        let mut max = 0;
        for (x, column) in band.zip(slice.chunks_mut(height)) {
            for (y, count) in column.iter_mut().enumerate() {
                let c = viewport.pixel_to_point((x, y), width, height);
                *count = self.mandelbrot.escape_count(c);
                max = max.max(*count);
            }
        }

        max
    }
}

/// Compute escape counts with the default [`Engine`].
pub fn compute(viewport: &Viewport, width: usize, height: usize) -> Result<CountGrid> {
    Engine::default().compute(viewport, width, height)
}

// }}}

// {{{ frames

/// Owned pixel buffer filled by a single render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// Colors in row-major order.
    pub pixels: Vec<Rgb<f32>>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Frame {
            width,
            height,
            pixels: vec![Rgb([0.0, 0.0, 0.0]); width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb<f32> {
        self.pixels[y * self.width + x]
    }

    /// Quantize the frame to an 8-bit image.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            to_rgb8(self.get(x as usize, y as usize))
        })
    }
}

impl PixelSink for Frame {
    fn put(&mut self, x: usize, y: usize, color: Rgb<f32>) {
        self.pixels[y * self.width + x] = color;
    }
}

// }}}

// {{{ render

/// Compute the escape counts for *viewport* and hand every colored pixel to
/// *sink*.
pub fn render<S: PixelSink + ?Sized>(
    engine: &Engine,
    viewport: &Viewport,
    width: usize,
    height: usize,
    sink: &mut S,
) -> Result<()> {
    let grid = engine.compute(viewport, width, height)?;
    colorize(&grid, grid.max_count(), sink);

    Ok(())
}

/// Render *viewport* into a new [`Frame`].
pub fn render_frame(
    engine: &Engine,
    viewport: &Viewport,
    width: usize,
    height: usize,
) -> Result<Frame> {
    let mut frame = Frame::new(width, height);
    render(engine, viewport, width, height, &mut frame)?;

    Ok(frame)
}

// }}}

// {{{ tests

#[cfg(test)]
mod tests {
    use super::*;

    use rand::Rng;

    use crate::iterate::MAX_DEPTH;

    #[test]
    fn test_band_partition_covers_width() {
        let mut rng = rand::rng();

        for _ in 0..256 {
            let width = rng.random_range(0..2048);
            let nbands = rng.random_range(1..64);
            let bands = band_partition(width, nbands).unwrap();

            assert_eq!(bands.len(), nbands);
            assert_eq!(bands.first().unwrap().start, 0);
            assert_eq!(bands.last().unwrap().end, width);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert_eq!(bands.iter().map(|b| b.len()).sum::<usize>(), width);
        }
    }

    #[test]
    fn test_band_partition_remainder() {
        let bands = band_partition(10, 4).unwrap();
        assert_eq!(bands, vec![0..2, 2..4, 4..6, 6..10]);

        let bands = band_partition(3, 4).unwrap();
        assert_eq!(bands, vec![0..0, 0..0, 0..0, 0..3]);

        assert!(band_partition(10, 0).is_err());
    }

    #[test]
    fn test_compute_small_grid() {
        let viewport = Viewport::new(-2.0, -2.0, 4.0, 4.0).unwrap();
        let engine = Engine::with_bands(4).unwrap();
        let grid = engine.compute(&viewport, 4, 4).unwrap();

        assert_eq!((grid.width(), grid.height()), (4, 4));
        // c = -2 - 2i
        assert!(grid.get(0, 0) <= 3);
        // c = 0
        assert_eq!(grid.get(2, 2), MAX_DEPTH);
        assert_eq!(grid.max_count(), MAX_DEPTH);
        assert!(grid.iter().all(|(_, _, n)| (1..=MAX_DEPTH).contains(&n)));
    }

    #[test]
    fn test_compute_cardioid_pixel() {
        // pixel (3, 4) maps to c = -0.5 + 0i
        let viewport = Viewport::new(-2.0, -2.0, 4.0, 4.0).unwrap();
        let grid = Engine::with_bands(4).unwrap().compute(&viewport, 8, 8).unwrap();

        assert_eq!(viewport.pixel_to_point((3, 4), 8, 8).re, -0.5);
        assert_eq!(grid.get(3, 4), MAX_DEPTH);
    }

    #[test]
    fn test_compute_independent_of_bands() {
        let viewport = Viewport::default();
        let reference = Engine::with_bands(1).unwrap().compute(&viewport, 67, 41).unwrap();

        for nbands in [2, 3, 4, 7, 67, 100] {
            let grid = Engine::with_bands(nbands)
                .unwrap()
                .compute(&viewport, 67, 41)
                .unwrap();
            assert_eq!(grid, reference, "mismatch with {} bands", nbands);
        }
    }

    #[test]
    fn test_compute_matches_single_point() {
        let viewport = Viewport::default();
        let (width, height) = (31, 17);
        let grid = compute(&viewport, width, height).unwrap();

        let brot = Mandelbrot::default();
        for (x, y, count) in grid.iter() {
            let c = viewport.pixel_to_point((x, y), width, height);
            assert_eq!(count, brot.escape_count(c));
            assert_eq!(grid.column(x)[y], count);
        }

        let max = grid.iter().map(|(_, _, n)| n).max().unwrap();
        assert_eq!(grid.max_count(), max);
    }

    #[test]
    fn test_compute_invalid_input() {
        let viewport = Viewport::default();
        assert!(matches!(
            compute(&viewport, 0, 10),
            Err(Error::InvalidDimensions { .. })
        ));

        let bad = Viewport {
            x_range: -1.0,
            ..viewport
        };
        assert!(matches!(
            compute(&bad, 10, 10),
            Err(Error::InvalidViewport(_))
        ));
        assert!(Engine::with_bands(0).is_err());
    }

    #[test]
    fn test_render_frame_is_deterministic() {
        let viewport = Viewport::default();
        let engine = Engine::with_bands(4).unwrap();

        let f0 = render_frame(&engine, &viewport, 40, 30).unwrap();
        let f1 = render_frame(&engine, &viewport, 40, 30).unwrap();
        assert_eq!(f0, f1);

        let image = f0.to_image();
        assert_eq!(image.dimensions(), (40, 30));
        assert_eq!(*image.get_pixel(5, 7), to_rgb8(f0.get(5, 7)));
    }
}

// }}}
