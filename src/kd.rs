// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::{euclidean_distance, Graph, GraphNode, Point};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree),
/// which can be used to speed up nearest-neighbor search for large maps.
/// [Graph::find_closest_node] computes the distance to every road node,
/// which quickly dominates the runtime when planning multiple routes on one map.
/// A k-d tree can help with that, trading memory usage for CPU time.
///
/// Only nodes of drivable roads are stored, so the tree answers the same question
/// as [Graph::find_closest_node]. If multiple nodes are equally close, the returned
/// one may differ between the two.
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: GraphNode,
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Finds the [GraphNode] closest to the given position (in the normalized map space).
    pub fn find_nearest_node(&self, x: f64, y: f64) -> GraphNode {
        self.find_nearest_node_impl(Point { x, y }, false).0
    }

    fn find_nearest_node_impl(&self, target: Point, y_divides: bool) -> (GraphNode, f64) {
        // Start by assuming that pivot is the closest
        let mut best = self.pivot;
        let mut best_dist = euclidean_distance(target, best.point);

        // Select which branch to recurse into first
        let first_left = if y_divides {
            target.y < best.point.y
        } else {
            target.x < best.point.x
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        // Recurse into the first branch
        if let Some(ref branch) = first {
            let (alt, alt_dist) = branch.find_nearest_node_impl(target, !y_divides);
            if alt_dist < best_dist {
                best = alt;
                best_dist = alt_dist;
            }
        }

        // (Optionally) recurse into the second branch
        if let Some(ref branch) = second {
            // A closer node is possible in the second branch if and only if
            // the splitting axis is closer than the current best candidate.
            let dist_to_axis = if y_divides {
                (target.y - self.pivot.point.y).abs()
            } else {
                (target.x - self.pivot.point.x).abs()
            };

            if dist_to_axis < best_dist {
                let (alt, alt_dist) = branch.find_nearest_node_impl(target, !y_divides);
                if alt_dist < best_dist {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        (best, best_dist)
    }

    /// Builds a k-d tree from all nodes of drivable roads of a [Graph].
    /// Returns `None` if the graph has no drivable roads.
    pub fn from_graph(g: &Graph) -> Option<Self> {
        let mut seen = HashSet::new();
        let mut nodes = g
            .road_nodes()
            .filter(|n| seen.insert(n.id))
            .collect::<Vec<_>>();

        let tree = Self::build(nodes.as_mut_slice());
        log::debug!("built k-d tree over {} road nodes", nodes.len());
        tree
    }

    /// Builds a k-d tree from a mutable slice of [GraphNodes](GraphNode). Nodes will be
    /// reordered in the slice to facilitate building the tree.
    pub fn build(nodes: &mut [GraphNode]) -> Option<Self> {
        Self::build_impl(nodes, false)
    }

    fn build_impl(nodes: &mut [GraphNode], y_divides: bool) -> Option<Self> {
        match nodes.len() {
            0 => None,
            1 => Some(Self {
                pivot: nodes[0],
                left: None,
                right: None,
            }),
            _ => {
                if y_divides {
                    nodes.sort_by(|a, b| a.point.y.total_cmp(&b.point.y));
                } else {
                    nodes.sort_by(|a, b| a.point.x.total_cmp(&b.point.x));
                }
                let median = nodes.len() / 2;
                let pivot = nodes[median];
                let (left, right_and_pivot) = nodes.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build_impl(left, !y_divides).map(Box::new),
                    right: Self::build_impl(right, !y_divides).map(Box::new),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures;
    use crate::model::{fixtures::model, RoadType};

    fn node(id: usize, x: f64, y: f64) -> GraphNode {
        GraphNode {
            id,
            point: Point { x, y },
        }
    }

    #[test]
    fn kd_tree() {
        let tree = KDTree::build(&mut [
            node(1, 0.01, 0.01),
            node(2, 0.05, 0.01),
            node(3, 0.09, 0.03),
            node(4, 0.03, 0.04),
            node(5, 0.07, 0.04),
            node(6, 0.03, 0.07),
            node(7, 0.01, 0.07),
            node(8, 0.05, 0.08),
            node(9, 0.09, 0.08),
        ])
        .expect("k-d tree from non-empty slice must not be empty");

        assert_eq!(tree.find_nearest_node(0.02, 0.02).id, 1);
        assert_eq!(tree.find_nearest_node(0.03, 0.05).id, 4);
        assert_eq!(tree.find_nearest_node(0.08, 0.05).id, 5);
        assert_eq!(tree.find_nearest_node(0.06, 0.09).id, 8);
    }

    #[test]
    fn empty() {
        assert!(KDTree::build(&mut []).is_none());
        let g = Graph::new(model(&[(0.0, 0.0)], &[(&[0], RoadType::Footway)]));
        assert!(KDTree::from_graph(&g).is_none());
    }

    #[test]
    fn agrees_with_linear_scan() {
        let g = fixtures::diamond();
        let tree = KDTree::from_graph(&g).unwrap();

        for i in -5..=15 {
            for j in -5..=10 {
                let (x, y) = (i as f64 * 0.1, j as f64 * 0.1);
                let target = Point { x, y };
                let linear = g.find_closest_node(x, y).unwrap();
                let indexed = tree.find_nearest_node(x, y);

                let linear_dist = euclidean_distance(target, linear.point);
                let indexed_dist = euclidean_distance(target, indexed.point);
                assert_almost_eq!(linear_dist, indexed_dist, 1e-12);
            }
        }
    }

    #[test]
    fn skips_footways() {
        let g = fixtures::footway_bridge();
        let tree = KDTree::from_graph(&g).unwrap();
        // Ends of the footway are still nodes of the residential roads
        assert_eq!(tree.find_nearest_node(0.4, 0.0).id, 1);
        assert_eq!(tree.find_nearest_node(0.6, 0.1).id, 2);

        let g = Graph::new(model(
            &[(0.0, 0.0), (1.0, 1.0)],
            &[(&[0], RoadType::Residential), (&[1], RoadType::Footway)],
        ));
        let tree = KDTree::from_graph(&g).unwrap();
        assert_eq!(tree.find_nearest_node(1.0, 1.0).id, 0);
    }
}
