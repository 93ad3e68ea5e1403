// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::model::Way;

/// Turns a list of multipolygon member ways into a list of closed rings.
///
/// Closed member ways are returned as-is. Open fragments are stitched together
/// (reversing them where necessary) into new closed [Ways](Way), which are appended
/// to `ways`. Fragments which can't be closed into a ring are dropped.
///
/// Returns indices (into `ways`) of all rings.
pub(super) fn assemble_rings(ways: &mut Vec<Way>, members: &[usize]) -> Vec<usize> {
    let (mut rings, open): (Vec<usize>, Vec<usize>) =
        members.iter().partition(|&&idx| ways[idx].is_closed());
    let open = open
        .into_iter()
        .filter(|&idx| ways[idx].nodes.len() > 1)
        .collect::<Vec<_>>();

    let mut fragments = Fragments::new(ways, open);
    let mut dropped = fragments.prune_dangling();
    let mut new_rings = Vec::default();

    for start in 0..fragments.open.len() {
        if !fragments.available[start] {
            continue;
        }

        match fragments.chain_from(start) {
            Some(ring) => new_rings.push(ring),
            None => {
                fragments.available[start] = false;
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        log::debug!("{} multipolygon fragment(s) don't form a closed ring", dropped);
    }

    for nodes in new_rings {
        rings.push(ways.len());
        ways.push(Way { nodes });
    }

    rings
}

/// Open member ways of a multipolygon, indexed by their end nodes.
struct Fragments<'w> {
    ways: &'w [Way],
    open: Vec<usize>,
    available: Vec<bool>,
    by_end: HashMap<usize, Vec<usize>>,
}

impl<'w> Fragments<'w> {
    /// Indexes `open` ways, all of which must have at least 2 nodes.
    fn new(ways: &'w [Way], open: Vec<usize>) -> Self {
        let mut by_end: HashMap<usize, Vec<usize>> = HashMap::default();
        for (i, &idx) in open.iter().enumerate() {
            let nodes = &ways[idx].nodes;
            by_end.entry(nodes[0]).or_default().push(i);
            by_end.entry(nodes[nodes.len() - 1]).or_default().push(i);
        }

        Self {
            ways,
            available: vec![true; open.len()],
            open,
            by_end,
        }
    }

    fn nodes(&self, i: usize) -> &'w [usize] {
        let ways: &'w [Way] = self.ways;
        &ways[self.open[i]].nodes
    }

    fn ends(&self, i: usize) -> (usize, usize) {
        let nodes = self.nodes(i);
        (nodes[0], nodes[nodes.len() - 1])
    }

    /// Number of available fragments starting or ending at `node`.
    fn degree(&self, node: usize) -> usize {
        self.by_end
            .get(&node)
            .map_or(0, |c| c.iter().filter(|&&i| self.available[i]).count())
    }

    /// Marks all fragments which can't be a part of any ring as unavailable:
    /// those with an end not shared with any other available fragment.
    /// Returns the number of such fragments.
    fn prune_dangling(&mut self) -> usize {
        let mut queue = (0..self.open.len()).collect::<Vec<_>>();
        let mut pruned = 0;

        while let Some(i) = queue.pop() {
            if !self.available[i] {
                continue;
            }

            let (first, last) = self.ends(i);
            if self.degree(first) > 1 && self.degree(last) > 1 {
                continue;
            }

            self.available[i] = false;
            pruned += 1;

            // Neighbors of the removed fragment might have become dangling
            for node in [first, last] {
                if let Some(candidates) = self.by_end.get(&node) {
                    queue.extend(candidates.iter().copied().filter(|&j| self.available[j]));
                }
            }
        }

        pruned
    }

    /// Greedily chains available fragments, starting with `start`, until the ring closes.
    /// On success, all used fragments become unavailable. Otherwise, nothing is changed.
    fn chain_from(&mut self, start: usize) -> Option<Vec<usize>> {
        let (head, mut tail) = self.ends(start);
        let mut ring = self.nodes(start).to_vec();
        let mut chained = vec![start];
        self.available[start] = false;

        while tail != head {
            let Some((i, reversed)) = self.next_fragment(tail, head) else {
                for i in chained {
                    self.available[i] = true;
                }
                return None;
            };

            // The joint node is already at the end of the ring
            let nodes = self.nodes(i);
            if reversed {
                ring.extend(nodes.iter().rev().skip(1));
            } else {
                ring.extend(nodes.iter().skip(1));
            }

            tail = ring[ring.len() - 1];
            self.available[i] = false;
            chained.push(i);
        }

        Some(ring)
    }

    /// Picks an available fragment continuing from `tail`, preferring one which
    /// leads straight back to `head`. Returns the fragment and whether it needs reversing.
    fn next_fragment(&self, tail: usize, head: usize) -> Option<(usize, bool)> {
        let mut fallback = None;

        for &i in self.by_end.get(&tail)? {
            if !self.available[i] {
                continue;
            }

            let (first, last) = self.ends(i);
            let (reversed, other) = if first == tail {
                (false, last)
            } else {
                (true, first)
            };

            if other == head {
                return Some((i, reversed));
            } else if fallback.is_none() {
                fallback = Some((i, reversed));
            }
        }

        fallback
    }
}
