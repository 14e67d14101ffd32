// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Link consistency between matched agent and redex nodes.
//!
//! Three rules apply to every matched pair:
//! the agent node uses exactly as many ports as the redex node; each agent
//! link owns at least as many ports as the redex link it answers for; and
//! redex ports that share a link map to agent ports that share a link.
//! Redex edges are closed, so they only match agent edges whose ports are
//! exactly the images of the redex ports.
use std::collections::hash_map::Entry;

use bigraph_core::{LinkIx, PlaceIx, Point};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::adapter::{AgentAdapter, MatchView, RedexAdapter};
use crate::structural::StructuralTable;

/// Checks link-graph constraints over agent/redex correspondences.
#[derive(Debug, Clone, Copy)]
pub struct LinkChecker<'a> {
    agent: AgentAdapter<'a>,
    redex: RedexAdapter<'a>,
}

impl<'a> LinkChecker<'a> {
    /// Checker over one agent/redex pair.
    pub fn new(agent: AgentAdapter<'a>, redex: RedexAdapter<'a>) -> Self {
        Self { agent, redex }
    }

    /// Every idle outer name of the redex is an outer name of the agent.
    pub fn idle_names_present(&self) -> bool {
        let redex = self.redex.bigraph();
        let agent = self.agent.bigraph();
        redex
            .outer_names()
            .filter(|&l| redex.points_of(l).is_empty())
            .all(|l| agent.outer_name(redex.link_name(l)).is_some())
    }

    /// A redex edge with no inner name is closed inside the occurrence.
    fn is_closed(&self, redex_link: LinkIx) -> bool {
        let redex = self.redex.bigraph();
        redex.is_edge(redex_link)
            && !redex
                .points_of(redex_link)
                .iter()
                .any(|p| matches!(p, Point::Inner(_)))
    }

    /// Can `agent_link` stand in for `redex_link`?
    fn link_fits(&self, agent_link: LinkIx, redex_link: LinkIx) -> bool {
        let agent = self.agent.bigraph();
        let needed = self.redex.bigraph().port_count(redex_link);
        if self.is_closed(redex_link) {
            agent.is_edge(agent_link) && agent.port_count(agent_link) == needed
        } else {
            agent.port_count(agent_link) >= needed
        }
    }

    /// Port-level compatibility of one agent node with one redex node.
    pub fn ports_compatible(&self, agent_node: PlaceIx, redex_node: PlaceIx) -> bool {
        let agent_ports = self.agent.links_of_node(agent_node);
        let redex_ports = self.redex.links_of_node(redex_node);
        if agent_ports.len() != redex_ports.len() {
            return false;
        }
        for (i, (a, r)) in agent_ports.iter().zip(&redex_ports).enumerate() {
            if !self.link_fits(a.link, r.link) {
                return false;
            }
            // Ports sharing a redex link must share the agent link.
            for (a2, r2) in agent_ports[i + 1..].iter().zip(&redex_ports[i + 1..]) {
                if r.link == r2.link && a.link != a2.link {
                    return false;
                }
            }
        }
        true
    }

    /// Necessary link condition for redex root `root` hosted at agent vertex `host`.
    ///
    /// Every redex node below `root` needs some agent node below `host` that
    /// the structural table accepts and whose ports fit.
    pub fn root_hit_consistent(&self, table: &StructuralTable, host: PlaceIx, root: PlaceIx) -> bool {
        let agent = self.agent.bigraph();
        let redex = self.redex.bigraph();
        let below = agent.descendants(host);
        for x in redex.descendants(root) {
            let Some(parent) = redex.parent(x) else {
                continue;
            };
            if !redex.is_node(x) {
                continue;
            }
            let found = below.iter().any(|&y| {
                agent.control(y) == redex.control(x)
                    && table.contains(y, x, parent)
                    && self.ports_compatible(y, x)
            });
            if !found {
                trace!(?host, ?root, node = ?x, "root hit rejected by link prefilter");
                return false;
            }
        }
        true
    }

    /// Full link check over a complete `(redex node, agent node)` mapping.
    pub fn embedding_consistent(&self, mapping: &[(PlaceIx, PlaceIx)]) -> bool {
        let agent = self.agent.bigraph();
        let redex = self.redex.bigraph();
        let mut images: FxHashMap<LinkIx, LinkIx> = FxHashMap::default();
        for &(x, y) in mapping {
            let redex_ports = redex.ports_of(x);
            let agent_ports = agent.ports_of(y);
            if redex_ports.len() != agent_ports.len() {
                return false;
            }
            for (&r, &a) in redex_ports.iter().zip(agent_ports) {
                match images.entry(r) {
                    Entry::Occupied(seen) if *seen.get() != a => return false,
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(a);
                    }
                }
            }
        }
        images.iter().all(|(&r, &a)| self.link_fits(a, r))
    }
}
