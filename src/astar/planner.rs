// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::search::{find_route, Path};
use crate::{AStarError, Graph, GraphNode};

/// Outcome of the last [RoutePlanner::a_star_search] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    /// No search was run yet.
    #[default]
    Ready,

    /// A route was found and is available through [RoutePlanner::path].
    Found,

    /// The search exhausted all reachable nodes without finding the end.
    Exhausted,
}

/// Plans a route between two positions on the map.
///
/// Start and end positions are given as percentages of the shorter side of the map,
/// as when picking points on a rendered map, and are snapped to the closest nodes
/// on drivable roads. On non-square maps, positions along the longer side may thus
/// exceed 100. The result of the last search is kept in the planner.
#[derive(Debug, Clone)]
pub struct RoutePlanner<'g> {
    graph: &'g Graph,
    start: GraphNode,
    end: GraphNode,
    path: Option<Path>,
    status: SearchStatus,
}

impl<'g> RoutePlanner<'g> {
    /// Creates a planner between two positions, expressed in percentages
    /// of the shorter side of the map.
    ///
    /// Returns [AStarError::NoDrivableRoads] if the graph has no nodes to snap to.
    pub fn new(
        graph: &'g Graph,
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
    ) -> Result<Self, AStarError> {
        let snap = |x: f64, y: f64| {
            graph
                .find_closest_node(x * 0.01, y * 0.01)
                .ok_or(AStarError::NoDrivableRoads)
        };

        let start = snap(start_x, start_y)?;
        let end = snap(end_x, end_y)?;
        log::debug!("planning route from node {} to node {}", start.id, end.id);

        Ok(Self::with_nodes(graph, start, end))
    }

    /// Creates a planner between two nodes of the graph.
    pub fn from_nodes(graph: &'g Graph, start: usize, end: usize) -> Result<Self, AStarError> {
        let start = graph.node(start).ok_or(AStarError::InvalidReference(start))?;
        let end = graph.node(end).ok_or(AStarError::InvalidReference(end))?;
        Ok(Self::with_nodes(graph, start, end))
    }

    fn with_nodes(graph: &'g Graph, start: GraphNode, end: GraphNode) -> Self {
        Self {
            graph,
            start,
            end,
            path: None,
            status: SearchStatus::Ready,
        }
    }

    pub fn start_node(&self) -> GraphNode {
        self.start
    }

    pub fn end_node(&self) -> GraphNode {
        self.end
    }

    /// Runs [find_route] between the start and end nodes, storing the result in the planner.
    /// Any previous result is discarded.
    pub fn a_star_search(&mut self) -> Result<&Path, AStarError> {
        self.path = None;
        match find_route(self.graph, self.start.id, self.end.id) {
            Ok(path) => {
                self.status = SearchStatus::Found;
                Ok(&*self.path.insert(path))
            }
            Err(e) => {
                self.status = SearchStatus::Exhausted;
                Err(e)
            }
        }
    }

    /// Returns the route found by the last [RoutePlanner::a_star_search].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Returns the length of the found route in meters, or zero if no route was found.
    pub fn distance(&self) -> f64 {
        self.path.as_ref().map(|p| p.distance).unwrap_or_default()
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }
}
