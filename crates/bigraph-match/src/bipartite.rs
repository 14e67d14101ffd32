// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Maximum-cardinality bipartite matching (Hopcroft–Karp).
//!
//! [`BipartiteMatcher`] keeps its pairing and layering buffers between calls;
//! the structural matcher runs it once per partition in its inner loop.
use std::collections::VecDeque;

use bigraph_core::Control;
use rustc_hash::FxHashMap;

const NIL: usize = usize::MAX;
const INF: usize = usize::MAX;

/// Adjacency lists from the left partition `X` into `0..y_len`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BipartiteGraph {
    adjacency: Vec<Vec<usize>>,
    y_len: usize,
}

impl BipartiteGraph {
    /// Graph with `x_len` left and `y_len` right vertices and no edges.
    pub fn new(x_len: usize, y_len: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); x_len],
            y_len,
        }
    }

    /// Adds edge `(x, y)`.
    pub fn add_edge(&mut self, x: usize, y: usize) {
        debug_assert!(y < self.y_len);
        self.adjacency[x].push(y);
    }

    /// Size of the left partition.
    pub fn x_len(&self) -> usize {
        self.adjacency.len()
    }

    /// Size of the right partition.
    pub fn y_len(&self) -> usize {
        self.y_len
    }

    /// True if some `x` has no edge at all.
    pub fn has_isolated_x(&self) -> bool {
        self.adjacency.iter().any(Vec::is_empty)
    }
}

/// Result of one matching run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    /// Matched `(x, y)` pairs in `x` order.
    pub pairs: Vec<(usize, usize)>,
    /// Left vertices left unmatched (excluding the held-out one).
    pub unmatched_x: Vec<usize>,
    /// Right vertices left unmatched.
    pub unmatched_y: Vec<usize>,
}

impl Matching {
    /// Number of matched pairs.
    pub fn cardinality(&self) -> usize {
        self.pairs.len()
    }
}

/// Reusable Hopcroft–Karp state.
#[derive(Debug, Default)]
pub struct BipartiteMatcher {
    pair_x: Vec<usize>,
    pair_y: Vec<usize>,
    dist: Vec<usize>,
    queue: VecDeque<usize>,
    nil_dist: usize,
    held_out: Option<usize>,
}

impl BipartiteMatcher {
    /// Empty matcher; buffers grow on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum matching size on `graph`, ignoring left vertex `held_out`.
    ///
    /// The pairing stays available through [`Self::matching`] until the next call.
    pub fn max_cardinality(&mut self, graph: &BipartiteGraph, held_out: Option<usize>) -> usize {
        let x_len = graph.x_len();
        self.held_out = held_out;
        self.pair_x.clear();
        self.pair_x.resize(x_len, NIL);
        self.pair_y.clear();
        self.pair_y.resize(graph.y_len(), NIL);
        self.dist.clear();
        self.dist.resize(x_len, INF);

        // Greedy warm start: each x claims its first free neighbour.
        let mut size = 0;
        for x in 0..x_len {
            if Some(x) == held_out {
                continue;
            }
            if let Some(&y) = graph.adjacency[x].iter().find(|&&y| self.pair_y[y] == NIL) {
                self.pair_x[x] = y;
                self.pair_y[y] = x;
                size += 1;
            }
        }

        let target = x_len - usize::from(held_out.is_some_and(|h| h < x_len));
        while size < target && self.layer(graph) {
            for x in 0..x_len {
                if Some(x) != held_out && self.pair_x[x] == NIL && self.augment(graph, x) {
                    size += 1;
                }
            }
        }
        size
    }

    /// Pairing and losers of the last [`Self::max_cardinality`] run.
    pub fn matching(&self) -> Matching {
        let mut pairs = Vec::new();
        let mut unmatched_x = Vec::new();
        for (x, &y) in self.pair_x.iter().enumerate() {
            if Some(x) == self.held_out {
                continue;
            }
            if y == NIL {
                unmatched_x.push(x);
            } else {
                pairs.push((x, y));
            }
        }
        let unmatched_y = self
            .pair_y
            .iter()
            .enumerate()
            .filter(|(_, &x)| x == NIL)
            .map(|(y, _)| y)
            .collect();
        Matching {
            pairs,
            unmatched_x,
            unmatched_y,
        }
    }

    /// Breadth-first layering from free left vertices; true if a free right
    /// vertex is reachable.
    fn layer(&mut self, graph: &BipartiteGraph) -> bool {
        self.queue.clear();
        for x in 0..graph.x_len() {
            if Some(x) != self.held_out && self.pair_x[x] == NIL {
                self.dist[x] = 0;
                self.queue.push_back(x);
            } else {
                self.dist[x] = INF;
            }
        }
        self.nil_dist = INF;
        while let Some(x) = self.queue.pop_front() {
            if self.dist[x] >= self.nil_dist {
                continue;
            }
            for &y in &graph.adjacency[x] {
                let next = self.pair_y[y];
                if next == NIL {
                    if self.nil_dist == INF {
                        self.nil_dist = self.dist[x] + 1;
                    }
                } else if self.dist[next] == INF {
                    self.dist[next] = self.dist[x] + 1;
                    self.queue.push_back(next);
                }
            }
        }
        self.nil_dist != INF
    }

    /// Depth-first search along layers that grow by exactly one.
    fn augment(&mut self, graph: &BipartiteGraph, x: usize) -> bool {
        for &y in &graph.adjacency[x] {
            let next = self.pair_y[y];
            let reachable = if next == NIL {
                self.dist[x] + 1 == self.nil_dist
            } else {
                self.dist[next] == self.dist[x] + 1 && self.augment(graph, next)
            };
            if reachable {
                self.pair_x[x] = y;
                self.pair_y[y] = x;
                return true;
            }
        }
        self.dist[x] = INF;
        false
    }
}

/// How control multisets must relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityMode {
    /// The left multiset is contained in the right one.
    Subset,
    /// Both multisets are equal.
    Exact,
}

/// Compares the control multisets of `x` and `y`.
pub fn controls_are_compatible<'c>(
    x: impl IntoIterator<Item = &'c Control>,
    y: impl IntoIterator<Item = &'c Control>,
    mode: CompatibilityMode,
) -> bool {
    let mut balance: FxHashMap<&'c Control, isize> = FxHashMap::default();
    for control in x {
        *balance.entry(control).or_insert(0) += 1;
    }
    for control in y {
        *balance.entry(control).or_insert(0) -= 1;
    }
    match mode {
        CompatibilityMode::Subset => balance.values().all(|&n| n <= 0),
        CompatibilityMode::Exact => balance.values().all(|&n| n == 0),
    }
}
