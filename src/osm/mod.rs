// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod reader;

pub use error::ParseError;
pub use reader::{model_from_buffer, model_from_file, model_from_io, FileFormat, Options};
