// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::iterate::{Mandelbrot, ESCAPE_RADIUS, MAX_DEPTH};
use crate::render::Engine;
use crate::viewport::Viewport;

fn default_width() -> usize {
    800
}

fn default_height() -> usize {
    600
}

fn default_max_depth() -> u32 {
    MAX_DEPTH
}

/// Parameters of a render pass.
///
/// All fields are optional when read from JSON, e.g.
///
/// ```json
/// { "width": 1024, "viewport": { "x_start": -2.1, "y_start": -1.2, "x_range": 2.8, "y_range": 2.4 } }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: usize,
    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: usize,
    /// Number of column bands (defaults to the number of worker threads).
    #[serde(default)]
    pub bands: Option<usize>,
    /// Maximum number of iterations per pixel.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Initial region of the complex plane.
    #[serde(default)]
    pub viewport: Viewport,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: default_width(),
            height: default_height(),
            bands: None,
            max_depth: default_max_depth(),
            viewport: Viewport::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let file = File::open(filename)?;
        let reader = BufReader::new(file);

        let config: RenderConfig = serde_json::from_reader(reader)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        if self.bands == Some(0) {
            return Err(Error::InvalidBands);
        }

        if self.max_depth == 0 {
            return Err(Error::InvalidConfig(
                "max_depth must be positive".to_string(),
            ));
        }

        self.viewport.validate()
    }

    /// Build the engine described by this configuration.
    pub fn engine(&self) -> Result<Engine> {
        let mandelbrot = Mandelbrot::new(self.max_depth, ESCAPE_RADIUS);

        match self.bands {
            Some(nbands) => Engine::new(mandelbrot, nbands),
            None => Ok(Engine {
                mandelbrot,
                ..Engine::default()
            }),
        }
    }
}

// {{{ tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: RenderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RenderConfig::default());
        assert!(config.validate().is_ok());

        let engine = config.engine().unwrap();
        assert_eq!(engine.mandelbrot.maxit, MAX_DEPTH);
        assert!(engine.nbands >= 1);
    }

    #[test]
    fn test_partial_config() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"width": 320, "bands": 4, "max_depth": 100}"#).unwrap();
        assert_eq!((config.width, config.height), (320, 600));

        let engine = config.engine().unwrap();
        assert_eq!(engine.nbands, 4);
        assert_eq!(engine.mandelbrot.maxit, 100);
    }

    #[test]
    fn test_invalid_config() {
        assert!(serde_json::from_str::<RenderConfig>(r#"{"colour": 1}"#).is_err());

        let config = RenderConfig {
            bands: Some(0),
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidBands)));

        let config = RenderConfig {
            height: 0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RenderConfig {
            max_depth: 0,
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = RenderConfig::from_file("/nonexistent/histobrot.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

// }}}
