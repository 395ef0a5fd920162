// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

use num::complex::{c64, Complex64};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ratio by which the ranges shrink on every zoom step.
pub const ZOOM_RATIO: f64 = 0.8;

// {{{ viewport

/// Region of the complex plane mapped onto the pixel grid.
///
/// The origin `(x_start, y_start)` is the minimum real and imaginary coordinate
/// and corresponds to pixel `(0, 0)`.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub x_start: f64,
    pub y_start: f64,
    pub x_range: f64,
    pub y_range: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x_start: -2.1,
            y_start: -1.2,
            x_range: 2.8,
            y_range: 2.4,
        }
    }
}

impl Viewport {
    pub fn new(x_start: f64, y_start: f64, x_range: f64, y_range: f64) -> Result<Self> {
        let viewport = Viewport {
            x_start,
            y_start,
            x_range,
            y_range,
        };
        viewport.validate()?;

        Ok(viewport)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.x_start, self.y_start, self.x_range, self.y_range];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidViewport(format!(
                "non-finite coordinates in {:?}",
                self
            )));
        }

        if self.x_range <= 0.0 || self.y_range <= 0.0 {
            return Err(Error::InvalidViewport(format!(
                "ranges must be positive: got {} x {}",
                self.x_range, self.y_range
            )));
        }

        Ok(())
    }

    /// Size of a single pixel in plane coordinates `(stepx, stepy)`.
    pub fn step(&self, width: usize, height: usize) -> (f64, f64) {
        (self.x_range / (width as f64), self.y_range / (height as f64))
    }

    /// Translate pixel coordinates to a point in the complex plane.
    pub fn pixel_to_point(&self, pixel: (usize, usize), width: usize, height: usize) -> Complex64 {
        let (stepx, stepy) = self.step(width, height);

        c64(
            self.x_start + (pixel.0 as f64) * stepx,
            self.y_start + (pixel.1 as f64) * stepy,
        )
    }

    /// Zoom towards the clicked pixel by [`ZOOM_RATIO`].
    pub fn zoom(&self, width: usize, height: usize, click_x: i64, click_y: i64) -> Self {
        self.zoom_by(ZOOM_RATIO, width, height, click_x, click_y)
    }

    /// Shrink both ranges by *ratio* and shift the origin so the clicked
    /// pixel moves towards the center of the image.
    ///
    /// The click offset is measured from `(width / 2, height / 2)` using
    /// integer division, so an odd-sized image has its center at the lower
    /// middle pixel.
    pub fn zoom_by(
        &self,
        ratio: f64,
        width: usize,
        height: usize,
        click_x: i64,
        click_y: i64,
    ) -> Self {
        let vx = click_x - (width / 2) as i64;
        let vy = click_y - (height / 2) as i64;

        let x_range = self.x_range * ratio;
        let y_range = self.y_range * ratio;

        let dx = x_range / (width as f64) * (vx as f64);
        let dy = y_range / (height as f64) * (vy as f64);

        Viewport {
            x_start: self.x_start + (self.x_range - x_range) / 2.0 + dx,
            y_start: self.y_start + (self.y_range - y_range) / 2.0 + dy,
            x_range,
            y_range,
        }
    }

    /// Center of the region in plane coordinates.
    pub fn center(&self) -> Complex64 {
        c64(
            self.x_start + self.x_range / 2.0,
            self.y_start + self.y_range / 2.0,
        )
    }
}

// }}}

// {{{ tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_point() {
        let viewport = Viewport::new(-2.0, -2.0, 4.0, 4.0).unwrap();

        assert_eq!(viewport.step(4, 4), (1.0, 1.0));
        assert_eq!(viewport.pixel_to_point((0, 0), 4, 4), c64(-2.0, -2.0));
        assert_eq!(viewport.pixel_to_point((2, 2), 4, 4), c64(0.0, 0.0));
        assert_eq!(viewport.pixel_to_point((3, 1), 4, 4), c64(1.0, -1.0));
    }

    #[test]
    fn test_invalid_viewport() {
        assert!(Viewport::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(Viewport::new(0.0, 0.0, 1.0, -1.0).is_err());
        assert!(Viewport::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(Viewport::new(0.0, 0.0, f64::INFINITY, 1.0).is_err());
        assert!(Viewport::default().validate().is_ok());
    }

    #[test]
    fn test_zoom_at_center_keeps_center() {
        let viewport = Viewport::default();
        let zoomed = viewport.zoom(800, 600, 400, 300);

        assert!((zoomed.x_range - 0.8 * viewport.x_range).abs() < 1.0e-14);
        assert!((zoomed.y_range - 0.8 * viewport.y_range).abs() < 1.0e-14);
        assert!((zoomed.center() - viewport.center()).norm() < 1.0e-14);

        // only the range shrinkage moves the origin
        let shift = (viewport.x_range - zoomed.x_range) / 2.0;
        assert!((zoomed.x_start - (viewport.x_start + shift)).abs() < 1.0e-15);
    }

    #[test]
    fn test_zoom_twice_from_center() {
        let viewport = Viewport::new(-2.0, -2.0, 4.0, 4.0).unwrap();
        let zoomed = viewport.zoom(4, 4, 2, 2).zoom(4, 4, 2, 2);

        assert!((zoomed.x_range - 0.64 * viewport.x_range).abs() < 1.0e-14);
        assert!((zoomed.y_range - 0.64 * viewport.y_range).abs() < 1.0e-14);
    }

    #[test]
    fn test_zoom_off_center_shifts_origin() {
        let viewport = Viewport::new(-2.0, -2.0, 4.0, 4.0).unwrap();
        let zoomed = viewport.zoom(4, 4, 3, 0);

        // range 3.2, pixel 0.8, shift by (4 - 3.2) / 2 + 0.8 * offset
        assert!((zoomed.x_start - (-2.0 + 0.4 + 0.8)).abs() < 1.0e-14);
        assert!((zoomed.y_start - (-2.0 + 0.4 - 1.6)).abs() < 1.0e-14);
        assert!((zoomed.x_range - 3.2).abs() < 1.0e-14);
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{"x_start": -2.1, "y_start": -1.2, "x_range": 2.8, "y_range": 2.4}"#;
        let parsed: Viewport = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Viewport::default());
    }
}

// }}}
