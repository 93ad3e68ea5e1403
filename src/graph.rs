// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::{euclidean_distance, GraphNode, Model};

/// Represents the drivable part of a [Model] as a set of [GraphNodes](GraphNode)
/// and an index from every node to the roads passing through it.
///
/// A [Graph] is immutable once built; all route search state
/// is kept outside of it, so one [Graph] can serve any number of searches.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    model: Model,
    nodes: Vec<GraphNode>,
    node_to_road: HashMap<usize, Vec<usize>>,
}

impl Graph {
    /// Creates one [GraphNode] for every [Point](crate::Point) of the model,
    /// and indexes all non-footway roads by their points.
    pub fn new(model: Model) -> Self {
        let nodes = model
            .points()
            .iter()
            .enumerate()
            .map(|(id, &point)| GraphNode { id, point })
            .collect();

        let mut node_to_road: HashMap<usize, Vec<usize>> = HashMap::default();
        for (road_idx, road) in model.roads().iter().enumerate() {
            if !road.type_.is_drivable() {
                continue;
            }

            for &node_id in &model.ways()[road.way].nodes {
                let roads = node_to_road.entry(node_id).or_default();
                // A way may pass through the same node more than once
                if roads.last() != Some(&road_idx) {
                    roads.push(road_idx);
                }
            }
        }

        log::info!(
            "built graph with {} nodes, {} of which are on drivable roads",
            model.points().len(),
            node_to_road.len(),
        );

        Self {
            model,
            nodes,
            node_to_road,
        }
    }

    /// Returns the underlying [Model].
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns all [GraphNodes](GraphNode), ordered by their id.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Retrieves a [GraphNode] with the provided id.
    pub fn node(&self, id: usize) -> Option<GraphNode> {
        self.nodes.get(id).copied()
    }

    /// Returns indices of all drivable [Roads](crate::Road) passing through a node.
    /// Nodes outside of drivable roads have no roads.
    pub fn roads_at(&self, id: usize) -> &[usize] {
        self.node_to_road
            .get(&id)
            .map(|r| r.as_slice())
            .unwrap_or_default()
    }

    /// Straight-line distance between two nodes, in the normalized map space.
    ///
    /// Panics if either of the ids is out of bounds.
    #[inline]
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        euclidean_distance(self.nodes[a].point, self.nodes[b].point)
    }

    /// Iterates over all nodes of all drivable roads, in road order, then way order.
    /// Nodes shared by multiple roads are returned multiple times.
    pub(crate) fn road_nodes(&self) -> impl Iterator<Item = GraphNode> + '_ {
        self.model
            .roads()
            .iter()
            .filter(|r| r.type_.is_drivable())
            .flat_map(|r| self.model.ways()[r.way].nodes.iter())
            .map(|&id| self.nodes[id])
    }

    /// Finds the node on a drivable road closest to the given position (in the normalized
    /// map space). If multiple nodes are equally close, the first one encountered
    /// (in road order, then way order) is returned.
    ///
    /// Returns `None` if there are no drivable roads.
    ///
    /// This function requires computing the distance to every road node in the graph,
    /// and is not suitable for large graphs - see [KDTree](crate::KDTree).
    pub fn find_closest_node(&self, x: f64, y: f64) -> Option<GraphNode> {
        let target = crate::Point { x, y };
        let mut best: Option<(f64, GraphNode)> = None;

        for node in self.road_nodes() {
            let dist = euclidean_distance(target, node.point);
            match best {
                Some((best_dist, _)) if best_dist <= dist => {}
                _ => best = Some((dist, node)),
            }
        }

        best.map(|(_, node)| node)
    }

    /// Finds neighbors of a node: for every drivable road passing through it,
    /// the closest other node of that road which is not `visited`.
    ///
    /// Nodes at the same position as `id` are never considered neighbors.
    /// Roads without any candidate don't contribute a neighbor, and a node reachable
    /// through multiple roads is only returned once.
    pub fn find_neighbors<F: Fn(usize) -> bool>(&self, id: usize, visited: F) -> Vec<usize> {
        let mut neighbors: Vec<usize> = Vec::default();

        for &road_idx in self.roads_at(id) {
            let way = &self.model.ways()[self.model.roads()[road_idx].way];
            if let Some(neighbor) = self.find_neighbor(id, &way.nodes, &visited) {
                if !neighbors.contains(&neighbor) {
                    neighbors.push(neighbor);
                }
            }
        }

        neighbors
    }

    fn find_neighbor<F: Fn(usize) -> bool>(
        &self,
        id: usize,
        candidates: &[usize],
        visited: &F,
    ) -> Option<usize> {
        let mut closest: Option<(f64, usize)> = None;

        for &candidate in candidates {
            let dist = self.distance(id, candidate);
            if dist == 0.0 || visited(candidate) {
                continue;
            }

            match closest {
                Some((closest_dist, _)) if closest_dist <= dist => {}
                _ => closest = Some((dist, candidate)),
            }
        }

        closest.map(|(_, candidate)| candidate)
    }
}
