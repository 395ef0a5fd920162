// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

use colors_transform::{Color, Hsl};
use image::{Rgb, RgbImage};

use crate::render::CountGrid;

const FULL_SATURATION: f64 = 255.0;
const FULL_VALUE: f64 = 255.0;

// {{{ sinks

/// Receives the color of every pixel produced by [`colorize`].
pub trait PixelSink {
    fn put(&mut self, x: usize, y: usize, color: Rgb<f32>);
}

impl<F> PixelSink for F
where
    F: FnMut(usize, usize, Rgb<f32>),
{
    fn put(&mut self, x: usize, y: usize, color: Rgb<f32>) {
        self(x, y, color)
    }
}

/// Writes quantized colors directly into an `RgbImage`.
pub struct ImageSink<'a>(pub &'a mut RgbImage);

impl PixelSink for ImageSink<'_> {
    fn put(&mut self, x: usize, y: usize, color: Rgb<f32>) {
        self.0.put_pixel(x as u32, y as u32, to_rgb8(color));
    }
}

/// Quantize a normalized color to 8 bits per channel.
///
/// Channels are clamped to `[0, 1]` and truncated after scaling.
pub fn to_rgb8(color: Rgb<f32>) -> Rgb<u8> {
    let [r, g, b] = color.0;
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;

    Rgb([quantize(r), quantize(g), quantize(b)])
}

// }}}

// {{{ histogram

/// Number of pixels that reached each escape count.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// `bins[i]` is the number of pixels with a count of exactly `i`.
    pub bins: Vec<u64>,
    /// Sum of the raw counts of all pixels.
    ///
    /// NOTE: this is not the number of pixels, so the hues never quite reach
    /// a full turn.
    pub total: u64,

    // hues[i] = sum(bins[..i]) / total, accumulated in order
    hues: Vec<f64>,
}

impl Histogram {
    pub fn from_grid(grid: &CountGrid) -> Self {
        let mut bins = vec![0_u64; grid.max_count() as usize + 1];
        let mut total = 0_u64;
        for (_, _, count) in grid.iter() {
            bins[count as usize] += 1;
            total += count as u64;
        }

        let mut hues = Vec::with_capacity(bins.len() + 1);
        let mut hue = 0.0;
        hues.push(hue);
        if total > 0 {
            let totalf = total as f64;
            for &n in &bins {
                hue += (n as f64) / totalf;
                hues.push(hue);
            }
        } else {
            hues.resize(bins.len() + 1, 0.0);
        }

        Histogram { bins, total, hues }
    }

    /// Number of pixels accounted for in the histogram.
    pub fn pixels(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// Normalized histogram mass below *count*.
    ///
    /// This is `sum(bins[i] / total for i in 0..count)` and is `0` when the
    /// histogram is empty.
    pub fn hue(&self, count: u32) -> f64 {
        let index = (count as usize).min(self.hues.len() - 1);
        self.hues[index]
    }
}

// }}}

// {{{ hsv

/// Convert an HSV color to RGB.
///
/// The hue *h* is given as a fraction of a full turn, while the saturation
/// *s* and value *v* are in `[0, 1]`. The conversion goes through HSL.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb<f32> {
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let lightness = v * (1.0 - s / 2.0);
    let saturation = if lightness <= 0.0 || lightness >= 1.0 {
        0.0
    } else {
        (v - lightness) / lightness.min(1.0 - lightness)
    };

    // NOTE: in HSL, we have that H in [0, 360], S in [0, 100] and L in [0, 100]
    let hue = (h * 360.0).rem_euclid(360.0) as f32;
    let (r, g, b) = Hsl::from(hue, (saturation * 100.0) as f32, (lightness * 100.0) as f32)
        .to_rgb()
        .as_tuple();

    let normalize = |c: f32| (c / 255.0).clamp(0.0, 1.0);
    Rgb([normalize(r), normalize(g), normalize(b)])
}

// }}}

// {{{ colorize

/// Color every pixel of *grid* from the cumulative histogram of its counts.
///
/// Pixels that reached *max_count* are considered in the set and are black.
/// The *sink* is called exactly once per pixel, with *x* as the outer loop.
pub fn colorize<S: PixelSink + ?Sized>(grid: &CountGrid, max_count: u32, sink: &mut S) {
    let histogram = Histogram::from_grid(grid);
    log::debug!(
        "Histogram: {} bins over {} pixels (total {})",
        histogram.bins.len(),
        histogram.pixels(),
        histogram.total
    );

    let saturation = FULL_SATURATION / 255.0;
    for (x, y, count) in grid.iter() {
        let value = if count < max_count { FULL_VALUE } else { 0.0 };
        let color = hsv_to_rgb(histogram.hue(count), saturation, value / 255.0);
        sink.put(x, y, color);
    }
}

// }}}

// {{{ tests


// }}}
