// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BinaryHeap;

use crate::{AStarError, Graph, GraphNode};

/// Result of a successful route search.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Snapshots of all nodes along the route, from the start to the end (inclusive).
    pub nodes: Vec<GraphNode>,

    /// Length of the route in meters.
    pub distance: f64,
}

impl Path {
    /// Returns ids of all nodes along the route.
    pub fn ids(&self) -> Vec<usize> {
        self.nodes.iter().map(|n| n.id).collect()
    }
}

/// Search state of a single node.
#[derive(Debug, Clone)]
struct NodeState {
    parent: Option<usize>,
    g: f64,
    h: f64,
    visited: bool,
    neighbors: Option<Vec<usize>>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            parent: None,
            g: 0.0,
            h: f64::INFINITY,
            visited: false,
            neighbors: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FrontierItem {
    at: usize,
    score: f64,
    seq: usize,
}

impl PartialEq for FrontierItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for FrontierItem {}

impl PartialOrd for FrontierItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores (and earlier insertions) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// State of a single run of [find_route].
struct Search<'g> {
    graph: &'g Graph,
    end: usize,
    state: Vec<NodeState>,
    frontier: BinaryHeap<FrontierItem>,
    pushed: usize,
}

impl<'g> Search<'g> {
    fn new(graph: &'g Graph, end: usize) -> Self {
        Self {
            graph,
            end,
            state: vec![NodeState::default(); graph.len()],
            frontier: BinaryHeap::default(),
            pushed: 0,
        }
    }

    fn calculate_h_value(&self, id: usize) -> f64 {
        self.graph.distance(id, self.end)
    }

    fn push(&mut self, id: usize) {
        let s = &self.state[id];
        self.frontier.push(FrontierItem {
            at: id,
            score: s.g + s.h,
            seq: self.pushed,
        });
        self.pushed += 1;
    }

    /// Removes the frontier node with the lowest `g + h`. Equal scores are
    /// resolved in favor of the node added to the frontier first.
    fn next_node(&mut self) -> Option<usize> {
        self.frontier.pop().map(|item| item.at)
    }

    /// Returns the neighbors of a node, discovering them on first use.
    fn neighbors(&mut self, id: usize) -> Vec<usize> {
        if self.state[id].neighbors.is_none() {
            let state = &self.state;
            let found = self.graph.find_neighbors(id, |n| state[n].visited);
            self.state[id].neighbors = Some(found);
        }
        self.state[id].neighbors.clone().unwrap_or_default()
    }

    fn add_neighbors(&mut self, current: usize) {
        let current_g = self.state[current].g;

        for neighbor in self.neighbors(current) {
            let g = current_g + self.graph.distance(current, neighbor);
            let h = self.calculate_h_value(neighbor);

            let s = &mut self.state[neighbor];
            s.parent = Some(current);
            s.g = g;
            s.h = h;
            s.visited = true;

            self.push(neighbor);
        }
    }

    fn construct_final_path(&self, mut current: usize) -> Path {
        let mut nodes = vec![self.graph.nodes()[current]];
        let mut distance = 0.0;

        while let Some(parent) = self.state[current].parent {
            distance += self.graph.distance(current, parent);
            current = parent;
            nodes.push(self.graph.nodes()[current]);
        }

        nodes.reverse();
        Path {
            nodes,
            distance: distance * self.graph.model().metric_scale(),
        }
    }
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route between two nodes in the provided graph.
///
/// Both the cost of moving between nodes and the heuristic are the straight-line
/// distance. Neighbors are discovered with [Graph::find_neighbors], and a node's
/// cost is fixed when it's first discovered.
///
/// Returns [AStarError::NoRouteFound] if `to_id` is not reachable from `from_id`.
/// Every call uses fresh search state, so multiple searches may share one [Graph].
pub fn find_route(g: &Graph, from_id: usize, to_id: usize) -> Result<Path, AStarError> {
    g.node(from_id).ok_or(AStarError::InvalidReference(from_id))?;
    g.node(to_id).ok_or(AStarError::InvalidReference(to_id))?;

    let mut search = Search::new(g, to_id);

    {
        let h = search.calculate_h_value(from_id);
        let s = &mut search.state[from_id];
        s.visited = true;
        s.g = 0.0;
        s.h = h;
        search.push(from_id);
    }

    while let Some(current) = search.next_node() {
        if current == to_id {
            let path = search.construct_final_path(current);
            log::debug!(
                "found route from {} to {}: {} nodes, {:.1} m",
                from_id,
                to_id,
                path.nodes.len(),
                path.distance
            );
            return Ok(path);
        }

        search.add_neighbors(current);
    }

    log::debug!(
        "no route from {} to {} after expanding {} nodes",
        from_id,
        to_id,
        search.pushed
    );
    Err(AStarError::NoRouteFound {
        from: from_id,
        to: to_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euclidean_distance;
    use crate::graph::fixtures;
    use crate::model::{fixtures::model, RoadType};

    fn path_length(g: &Graph, p: &Path) -> f64 {
        p.nodes
            .windows(2)
            .map(|pair| euclidean_distance(pair[0].point, pair[1].point))
            .sum::<f64>()
            * g.model().metric_scale()
    }

    #[test]
    fn takes_the_short_detour() {
        let g = fixtures::diamond();
        let path = find_route(&g, 0, 3).unwrap();

        assert_eq!(path.ids(), [0, 2, 3]);
        let expected = 2.0 * 0.26_f64.sqrt() * g.model().metric_scale();
        assert_almost_eq!(path.distance, expected);
    }

    #[test]
    fn distance_is_the_sum_of_segments() {
        let g = fixtures::diamond();
        for &(from, to) in &[(0, 3), (4, 3), (1, 2), (3, 4)] {
            let path = find_route(&g, from, to).unwrap();
            assert_eq!(path.nodes.first().map(|n| n.id), Some(from));
            assert_eq!(path.nodes.last().map(|n| n.id), Some(to));
            assert_almost_eq!(path.distance, path_length(&g, &path));
        }
    }

    #[test]
    fn path_contains_snapshots() {
        let g = fixtures::diamond();
        let path = find_route(&g, 4, 0).unwrap();
        assert_eq!(path.nodes, [g.nodes()[4], g.nodes()[0]]);
    }

    #[test]
    fn start_is_end() {
        let g = fixtures::diamond();
        let path = find_route(&g, 2, 2).unwrap();
        assert_eq!(path.ids(), [2]);
        assert_eq!(path.distance, 0.0);
    }

    #[test]
    fn disconnected() {
        let g = Graph::new(model(
            &[(0.0, 0.0), (0.1, 0.0), (0.9, 0.0), (1.0, 0.0)],
            &[
                (&[0, 1], RoadType::Residential),
                (&[2, 3], RoadType::Residential),
            ],
        ));
        assert_eq!(
            find_route(&g, 0, 3),
            Err(AStarError::NoRouteFound { from: 0, to: 3 })
        );
        assert_eq!(find_route(&g, 3, 2).map(|p| p.ids()), Ok(vec![3, 2]));
    }

    #[test]
    fn footways_are_not_edges() {
        let g = fixtures::footway_bridge();
        assert_eq!(
            find_route(&g, 0, 3),
            Err(AStarError::NoRouteFound { from: 0, to: 3 })
        );
        assert_eq!(
            find_route(&g, 1, 2),
            Err(AStarError::NoRouteFound { from: 1, to: 2 })
        );
    }

    #[test]
    fn invalid_reference() {
        let g = fixtures::diamond();
        assert_eq!(find_route(&g, 0, 5), Err(AStarError::InvalidReference(5)));
        assert_eq!(find_route(&g, 9, 0), Err(AStarError::InvalidReference(9)));
    }

    #[test]
    fn repeated_searches_are_independent() {
        let g = fixtures::diamond();
        let first = find_route(&g, 0, 3).unwrap();
        let second = find_route(&g, 0, 3).unwrap();
        assert_eq!(first, second);

        // A search in the opposite direction is not affected by the previous ones
        assert_eq!(find_route(&g, 3, 0).unwrap().ids(), [3, 2, 0]);
    }

    #[test]
    fn deterministic_across_graphs() {
        let a = find_route(&fixtures::diamond(), 4, 3).unwrap();
        let b = find_route(&fixtures::diamond(), 4, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ids(), [4, 0, 2, 3]);
    }

    #[test]
    fn equal_scores_prefer_earlier_insertion() {
        let g = fixtures::diamond();
        let mut search = Search::new(&g, 3);
        for id in [4, 1, 2] {
            search.state[id].g = 1.0;
            search.state[id].h = 0.5;
            search.push(id);
        }

        assert_eq!(search.next_node(), Some(4));
        assert_eq!(search.next_node(), Some(1));
        assert_eq!(search.next_node(), Some(2));
        assert_eq!(search.next_node(), None);
    }

    #[test]
    fn symmetric_detours() {
        // Two mirrored routes of equal length from 0 to 3; the first discovered one wins.
        let g = Graph::new(model(
            &[(0.0, 0.0), (0.5, 0.5), (0.5, -0.5), (1.0, 0.0)],
            &[
                (&[0, 1], RoadType::Residential),
                (&[0, 2], RoadType::Residential),
                (&[1, 3], RoadType::Residential),
                (&[2, 3], RoadType::Residential),
            ],
        ));
        assert_eq!(find_route(&g, 0, 3).unwrap().ids(), [0, 1, 3]);
        assert_eq!(find_route(&g, 0, 3).unwrap().ids(), [0, 1, 3]);
    }

    #[test]
    fn neighbors_are_memoized() {
        let g = fixtures::diamond();
        let mut search = Search::new(&g, 3);
        search.state[0].visited = true;

        assert_eq!(search.neighbors(0), [1, 2, 4]);
        // Visiting a neighbor afterwards doesn't change the cached list
        search.state[1].visited = true;
        assert_eq!(search.neighbors(0), [1, 2, 4]);
    }

    #[test]
    fn frontier_pops_lowest_score() {
        let g = fixtures::diamond();
        let mut search = Search::new(&g, 3);
        for (id, g_value) in [(0, 3.0), (1, 1.0), (2, 2.0)] {
            search.state[id].g = g_value;
            search.state[id].h = 0.0;
            search.push(id);
        }

        assert_eq!(search.next_node(), Some(1));
        assert_eq!(search.next_node(), Some(2));
        assert_eq!(search.next_node(), Some(0));
    }
}
