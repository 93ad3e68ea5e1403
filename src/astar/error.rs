// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error conditions which may occur during [find_route](crate::find_route) or
/// when preparing a [RoutePlanner](crate::RoutePlanner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AStarError {
    /// The start or end nodes don't exist in a graph.
    InvalidReference(usize),

    /// The graph has no drivable roads, so no position can be snapped to a node.
    NoDrivableRoads,

    /// The whole part of the graph reachable from `from` was searched,
    /// and `to` was not found there.
    NoRouteFound { from: usize, to: usize },
}

impl std::fmt::Display for AStarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReference(node_id) => write!(f, "invalid node: {}", node_id),
            Self::NoDrivableRoads => write!(f, "graph has no drivable roads"),
            Self::NoRouteFound { from, to } => write!(f, "no route from {} to {}", from, to),
        }
    }
}

impl std::error::Error for AStarError {}
