// SPDX-FileCopyrightText: 2024 Alexandru Fikl <alexfikl@gmail.com>
// SPDX-License-Identifier: MIT

pub mod colorschemes;
pub mod config;
pub mod error;
pub mod iterate;
pub mod render;
pub mod session;
pub mod viewport;

pub use error::{Error, Result};
