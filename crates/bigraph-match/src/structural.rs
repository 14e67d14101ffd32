// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bottom-up structural matching.
//!
//! For every agent vertex `v` and redex vertex `u` the table records which
//! members of `u`'s open neighbourhood remain explainable when the agent
//! subtree at `v` is matched against `u`: `u` itself when every neighbour is
//! matched below `v`, or the one neighbour that was held out. A redex root
//! `r` occurs at `v` exactly when `r` explains itself there.
//!
//! Agent vertices are visited children first. At each `(v, u)` the bipartite
//! matcher pairs `u`'s neighbours with `v`'s children along table edges, once
//! for the full neighbourhood and once per held-out neighbour.
use bigraph_core::{Control, PlaceIx};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use crate::adapter::{AgentAdapter, MatchView, RedexAdapter};
use crate::bipartite::{controls_are_compatible, BipartiteGraph, BipartiteMatcher, CompatibilityMode};
use crate::links::LinkChecker;

/// `S[v][u]`: redex vertices explained when agent vertex `v` plays redex vertex `u`.
#[derive(Debug, Clone, Default)]
pub struct StructuralTable {
    entries: FxHashMap<(PlaceIx, PlaceIx), Vec<PlaceIx>>,
}

impl StructuralTable {
    /// Explained vertices for `(agent, redex)`; empty when the pair never matched.
    pub fn get(&self, agent: PlaceIx, redex: PlaceIx) -> &[PlaceIx] {
        self.entries.get(&(agent, redex)).map_or(&[], Vec::as_slice)
    }

    /// True if `explained` is recorded for `(agent, redex)`.
    pub fn contains(&self, agent: PlaceIx, redex: PlaceIx, explained: PlaceIx) -> bool {
        self.get(agent, redex).contains(&explained)
    }

    /// Number of non-empty entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no pair matched at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, agent: PlaceIx, redex: PlaceIx, explained: Vec<PlaceIx>) {
        self.entries.insert((agent, redex), explained);
    }
}

/// A redex root found at an agent vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootHit {
    /// Agent vertex hosting the root.
    pub agent: PlaceIx,
    /// Redex root.
    pub redex_root: PlaceIx,
    /// Index of the redex root.
    pub root_index: usize,
}

/// Everything the occurrence resolver needs from the structural pass.
#[derive(Debug, Clone, Default)]
pub struct StructuralOutcome {
    /// The finished table.
    pub table: StructuralTable,
    /// Hits found by the table, before the link prefilter.
    pub root_hits: Vec<RootHit>,
    /// Hits that passed the link prefilter, in discovery order.
    pub confirmed: Vec<RootHit>,
    /// Root indices each confirmed host vertex may take, in discovery order.
    pub hits_by_vertex: Vec<(PlaceIx, Vec<usize>)>,
}

/// Fills a [`StructuralTable`] for one agent/redex pair.
#[derive(Debug)]
pub struct StructuralMatcher<'a> {
    agent: AgentAdapter<'a>,
    redex: RedexAdapter<'a>,
    bipartite: BipartiteMatcher,
}

impl<'a> StructuralMatcher<'a> {
    /// Matcher over `agent` and `redex`.
    pub fn new(agent: AgentAdapter<'a>, redex: RedexAdapter<'a>) -> Self {
        Self {
            agent,
            redex,
            bipartite: BipartiteMatcher::new(),
        }
    }

    /// Redex roots fit anywhere; redex nodes need an agent node of the same control.
    fn vertex_compatible(&self, v: PlaceIx, u: PlaceIx) -> bool {
        match (self.redex.control(u), self.agent.control(v)) {
            (None, _) => true,
            (Some(redex), Some(agent)) => redex == agent,
            (Some(_), None) => false,
        }
    }

    /// Runs the bottom-up pass and collects root hits.
    #[instrument(
        skip_all,
        fields(
            agent_nodes = self.agent.bigraph().node_count(),
            redex_nodes = self.redex.bigraph().node_count()
        )
    )]
    pub fn run(mut self, links: &LinkChecker<'a>) -> StructuralOutcome {
        let agent = self.agent;
        let redex = self.redex;
        let redex_vertices = redex.vertices();
        let mut outcome = StructuralOutcome::default();
        let mut hit_slots: FxHashMap<PlaceIx, usize> = FxHashMap::default();

        // Leaf pairs explain their whole neighbourhood; the parent level decides.
        for &v in agent.bigraph().nodes() {
            if !agent.is_leaf(v) {
                continue;
            }
            for &u in &redex_vertices {
                if redex.is_leaf(u) && agent.control(v) == redex.control(u) {
                    outcome.table.insert(v, u, redex.open_neighborhood(u));
                }
            }
        }

        for v in agent.internal_post_order() {
            let children: Vec<PlaceIx> = agent.children(v).collect();
            let child_controls: Vec<&Control> =
                children.iter().filter_map(|&c| agent.control(c)).collect();

            for &u in &redex_vertices {
                if redex.degree(u) > children.len() + 1 || !self.vertex_compatible(v, u) {
                    continue;
                }
                let neighbors = redex.open_neighborhood(u);
                let mut graph = BipartiteGraph::new(neighbors.len(), children.len());
                for (i, &w) in neighbors.iter().enumerate() {
                    for (j, &c) in children.iter().enumerate() {
                        if outcome.table.contains(c, w, u) {
                            graph.add_edge(i, j);
                        }
                    }
                }

                let has_site = redex.has_site(u);
                let mode = if has_site {
                    CompatibilityMode::Subset
                } else {
                    CompatibilityMode::Exact
                };
                let mut explained = Vec::new();
                // A neighbour with no candidate child rules out the full partition.
                let isolated = graph.has_isolated_x();
                for partition in 0..=neighbors.len() {
                    let held_out = partition.checked_sub(1);
                    let size = neighbors.len() - usize::from(held_out.is_some());
                    // Without a site every agent child must be accounted for.
                    if (!has_site && size != children.len()) || (isolated && held_out.is_none()) {
                        continue;
                    }
                    if self.bipartite.max_cardinality(&graph, held_out) != size {
                        continue;
                    }
                    let partition_controls = neighbors
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| Some(i) != held_out)
                        .filter_map(|(_, &w)| redex.control(w));
                    if controls_are_compatible(partition_controls, child_controls.iter().copied(), mode) {
                        explained.push(held_out.map_or(u, |i| neighbors[i]));
                    }
                }
                if explained.is_empty() {
                    continue;
                }
                trace!(agent = ?v, redex = ?u, ?explained, "table entry");
                let is_hit = explained.contains(&u);
                outcome.table.insert(v, u, explained);

                let Some(root_index) = redex.root_index(u) else {
                    continue;
                };
                if !is_hit {
                    continue;
                }
                let hit = RootHit {
                    agent: v,
                    redex_root: u,
                    root_index,
                };
                outcome.root_hits.push(hit);
                if !links.root_hit_consistent(&outcome.table, v, u) {
                    continue;
                }
                outcome.confirmed.push(hit);
                let slot = *hit_slots.entry(v).or_insert_with(|| {
                    outcome.hits_by_vertex.push((v, Vec::new()));
                    outcome.hits_by_vertex.len() - 1
                });
                outcome.hits_by_vertex[slot].1.push(root_index);
            }
        }

        debug!(
            table_entries = outcome.table.len(),
            root_hits = outcome.root_hits.len(),
            confirmed = outcome.confirmed.len(),
            "structural pass finished"
        );
        outcome
    }
}
