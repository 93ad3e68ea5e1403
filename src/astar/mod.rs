// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod planner;
mod search;

pub use error::AStarError;
pub use planner::{RoutePlanner, SearchStatus};
pub use search::{find_route, Path};
