// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Image dimensions must be positive: got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Number of bands must be positive")]
    InvalidBands,

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Render worker panicked")]
    WorkerPanicked,

    #[error("No render pass is pending")]
    NoPendingRender,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
