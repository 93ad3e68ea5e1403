// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Route planning over [OpenStreetMap](https://www.openstreetmap.org/) extracts.
//!
//! OSM data is first loaded into a [Model] - points normalized into a unit square,
//! ways, and their classification into roads, railways and areas. A [Graph] is then
//! built over the drivable roads, and A* finds the shortest routes between its nodes.
//!
//! # Example
//!
//! ```no_run
//! let model = routeplan::osm::model_from_file(
//!     &routeplan::osm::Options::default(),
//!     "path/to/map.osm",
//! ).expect("failed to load map.osm");
//! let g = routeplan::Graph::new(model);
//!
//! // Positions are percentages of the shorter side of the map
//! let mut planner = routeplan::RoutePlanner::new(&g, 10.0, 10.0, 90.0, 90.0)
//!     .expect("map has no drivable roads");
//! let route = planner.a_star_search().expect("failed to find route");
//!
//! println!("Route: {:?} ({:.0} m)", route.ids(), route.distance);
//! ```

#[cfg(test)]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr) => {
        assert_almost_eq!($a, $b, 1e-9)
    };
    ($a:expr, $b:expr, $eps:expr) => {
        assert!(
            (($a - $b).abs() < $eps),
            "assertion failed: {} ≈ {} (±{})",
            $a,
            $b,
            $eps
        )
    };
}

mod astar;
mod distance;
mod graph;
mod kd;
mod model;
pub mod osm;

pub use astar::{find_route, AStarError, Path, RoutePlanner, SearchStatus};
pub use distance::euclidean_distance;
pub use graph::Graph;
pub use kd::KDTree;
pub use model::{Area, AreaKind, Bounds, LanduseType, Model, Railway, Road, RoadType, Way};

/// Position in the normalized map space.
///
/// Both coordinates of points inside the map bounds are in the `[0, 1]` range,
/// with `x` growing eastwards and `y` growing northwards. Distances between points
/// can be converted into meters with [Model::metric_scale].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Represents an element of the [Graph] - a [Point] with its identity.
///
/// `id` is the index of the point in [Model::points].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GraphNode {
    pub id: usize,
    pub point: Point,
}
