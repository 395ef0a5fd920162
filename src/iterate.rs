// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

use num::complex::Complex64;

/// Maximum number of iterations before a point is considered in the set.
pub const MAX_DEPTH: u32 = 2000;
/// Radius outside of which an orbit is considered escaped.
pub const ESCAPE_RADIUS: f64 = 2.0;

// {{{ types

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mandelbrot {
    /// Maximum number of iterations before the point is considered in the set.
    pub maxit: u32,
    /// Escape radius (squared).
    pub escape_radius_squared: f64,
}

impl Default for Mandelbrot {
    fn default() -> Self {
        Mandelbrot::new(MAX_DEPTH, ESCAPE_RADIUS)
    }
}

impl Mandelbrot {
    pub fn new(maxit: u32, escape_radius: f64) -> Self {
        Mandelbrot {
            maxit: maxit.max(1),
            escape_radius_squared: escape_radius * escape_radius,
        }
    }

    /// Compute the escape time for the quadratic map
    ///
    /// $$
    ///     z_{n + 1} = z_n^2 + c, \qquad z_0 = 0.
    /// $$
    ///
    /// The result is the 1-based index of the iteration that took the orbit
    /// outside the escape radius, or `maxit` if it never did. It is always
    /// in `[1, maxit]`.
    pub fn escape_count(&self, c: Complex64) -> u32 {
        let mut z = Complex64::new(0.0, 0.0);

        for i in 1..=self.maxit {
            z = z * z + c;
            if z.norm_sqr() > self.escape_radius_squared {
                return i;
            }
        }

        self.maxit
    }
}

// }}}

// {{{ escape

/// Escape count of a single point with the default depth and radius.
pub fn mandelbrot_pixel(c: Complex64) -> u32 {
    Mandelbrot::default().escape_count(c)
}

// }}}

// {{{ tests


// }}}
