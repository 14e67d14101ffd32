// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Turns root hits into concrete occurrences.
//!
//! Resolution is lazy on two levels. [`RootAssignments`] enumerates maps from
//! redex roots to confirmed host vertices; several roots may share a host.
//! For each of them, [`Embeddings`] enumerates injective node correspondences
//! below the hosts. Both keep explicit cursors and only advance when asked for
//! the next item.
use std::collections::VecDeque;

use bigraph_core::{Bigraph, PlaceIx};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::adapter::{AgentAdapter, MatchView, RedexAdapter};
use crate::links::LinkChecker;
use crate::structural::StructuralTable;

/// Where a planned redex node hangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Directly under the root at this position of `redex.roots()`.
    Root(usize),
    /// Under the node placed at this earlier step.
    Step(usize),
}

/// One redex node in placement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanStep {
    /// Redex node to place.
    pub redex: PlaceIx,
    /// Where its image must hang.
    pub anchor: Anchor,
    /// Position of its root in `redex.roots()`.
    pub root: usize,
    /// Earlier sibling step with an interchangeable subtree. The image of
    /// this step must come after the twin's image.
    pub twin: Option<usize>,
}

/// Shape of every site-free redex node subtree: control, port links and the
/// sorted shapes of its children. Equal shapes under one parent can swap
/// images without changing the decomposition.
fn subtree_shapes(redex: &Bigraph) -> FxHashMap<PlaceIx, String> {
    let mut shapes: FxHashMap<PlaceIx, String> = FxHashMap::default();
    for p in redex.post_order() {
        let Some(control) = redex.control(p) else {
            continue;
        };
        let children: Option<Vec<String>> = redex.children(p).iter().map(|c| shapes.get(c).cloned()).collect();
        if let Some(mut children) = children {
            children.sort_unstable();
            let shape = format!("{}{:?}[{}]", control.name(), redex.ports_of(p), children.join(","));
            shapes.insert(p, shape);
        }
    }
    shapes
}

/// Redex nodes breadth-first from the roots, so parents are placed first.
pub fn embedding_plan(redex: RedexAdapter<'_>) -> Vec<PlanStep> {
    let mut steps = Vec::with_capacity(redex.bigraph().node_count());
    let mut queue: VecDeque<(PlaceIx, Anchor, usize)> = VecDeque::new();
    for (position, &root) in redex.roots().iter().enumerate() {
        queue.extend(redex.children(root).map(|c| (c, Anchor::Root(position), position)));
    }
    while let Some((node, anchor, root)) = queue.pop_front() {
        let step = steps.len();
        steps.push(PlanStep {
            redex: node,
            anchor,
            root,
            twin: None,
        });
        queue.extend(redex.children(node).map(|c| (c, Anchor::Step(step), root)));
    }

    let shapes = subtree_shapes(redex.bigraph());
    for j in 1..steps.len() {
        let Some(shape) = shapes.get(&steps[j].redex) else {
            continue;
        };
        let anchor = steps[j].anchor;
        steps[j].twin = steps[..j]
            .iter()
            .rposition(|s| s.anchor == anchor && shapes.get(&s.redex) == Some(shape));
    }
    steps
}

/// Lazy enumeration of root-level assignments.
///
/// Item `i` of each yielded vector hosts the redex root at position `i`. The
/// last root varies fastest.
#[derive(Debug, Clone)]
pub struct RootAssignments {
    choices: Vec<Vec<PlaceIx>>,
    cursors: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl RootAssignments {
    /// Assignments of `root_indices` (in root order) over `hits`.
    pub fn new(hits: &[(PlaceIx, Vec<usize>)], root_indices: &[usize]) -> Self {
        let choices = root_indices
            .iter()
            .map(|index| {
                hits.iter()
                    .filter(|(_, roots)| roots.contains(index))
                    .map(|&(host, _)| host)
                    .collect()
            })
            .collect();
        Self {
            choices,
            cursors: Vec::new(),
            started: false,
            exhausted: false,
        }
    }

    fn current(&self) -> Vec<PlaceIx> {
        self.choices
            .iter()
            .zip(&self.cursors)
            .map(|(hosts, &i)| hosts[i])
            .collect()
    }
}

impl Iterator for RootAssignments {
    type Item = Vec<PlaceIx>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            if self.choices.is_empty() || self.choices.iter().any(Vec::is_empty) {
                self.exhausted = true;
                return None;
            }
            self.cursors = vec![0; self.choices.len()];
            // One confirmed host per root: the identity is the only assignment.
            if self.choices.iter().all(|hosts| hosts.len() == 1) {
                self.exhausted = true;
            }
            return Some(self.current());
        }
        for depth in (0..self.choices.len()).rev() {
            self.cursors[depth] += 1;
            if self.cursors[depth] < self.choices[depth].len() {
                return Some(self.current());
            }
            self.cursors[depth] = 0;
        }
        self.exhausted = true;
        None
    }
}

/// Shared, read-only state for child-level resolution.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'m> {
    agent: AgentAdapter<'m>,
    redex: RedexAdapter<'m>,
    table: &'m StructuralTable,
    links: LinkChecker<'m>,
    plan: &'m [PlanStep],
}

impl<'m> Resolver<'m> {
    /// Resolver over a finished structural table.
    pub fn new(
        agent: AgentAdapter<'m>,
        redex: RedexAdapter<'m>,
        table: &'m StructuralTable,
        plan: &'m [PlanStep],
    ) -> Self {
        Self {
            agent,
            redex,
            table,
            links: LinkChecker::new(agent, redex),
            plan,
        }
    }

    /// Agent node `v` can play redex node `u` right here.
    fn locally_compatible(&self, v: PlaceIx, u: PlaceIx) -> bool {
        let Some(parent) = self.redex.parent(u) else {
            return false;
        };
        let (agent_children, redex_children) = (self.agent.child_count(v), self.redex.child_count(u));
        let counts_fit = if self.redex.has_site(u) {
            agent_children >= redex_children
        } else {
            agent_children == redex_children
        };
        self.agent.control(v).is_some()
            && self.agent.control(v) == self.redex.control(u)
            && counts_fit
            && self.table.contains(v, u, parent)
            && self.links.ports_compatible(v, u)
    }

    /// Subtree equivalence of agent node `v` and redex node `u`.
    ///
    /// Walks the redex subtree with an explicit stack, carrying for each
    /// redex node the agent nodes that could play it; every redex node must
    /// keep at least one candidate.
    pub fn the_same(&self, v: PlaceIx, u: PlaceIx) -> bool {
        if !self.locally_compatible(v, u) {
            return false;
        }
        let mut stack: Vec<(PlaceIx, Vec<PlaceIx>)> = vec![(u, vec![v])];
        while let Some((x, images)) = stack.pop() {
            for child in self.redex.children(x) {
                let candidates: Vec<PlaceIx> = images
                    .iter()
                    .flat_map(|&img| self.agent.children(img))
                    .filter(|&c| self.locally_compatible(c, child))
                    .collect();
                if candidates.is_empty() {
                    return false;
                }
                stack.push((child, candidates));
            }
        }
        true
    }

    /// No node matched under one root is an ancestor-or-self of another root's host.
    ///
    /// Roots sharing a host pass trivially; their nodes stay apart through
    /// the injectivity of the mapping.
    fn place_disjoint(&self, hosts: &[PlaceIx], mapping: &[(PlaceIx, PlaceIx)]) -> bool {
        let agent = self.agent.bigraph();
        self.plan.iter().zip(mapping).all(|(step, &(_, image))| {
            hosts.iter().enumerate().all(|(position, &host)| {
                position == step.root || (image != host && !agent.is_ancestor(image, host))
            })
        })
    }

    /// Lazy embeddings below `hosts`.
    pub fn embeddings(self, hosts: Vec<PlaceIx>) -> Embeddings<'m> {
        Embeddings {
            resolver: self,
            hosts,
            frames: Vec::new(),
            chosen: Vec::new(),
            used: FxHashSet::default(),
            started: false,
            exhausted: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Frame {
    candidates: Vec<PlaceIx>,
    next: usize,
}

/// Lazy enumeration of injective node correspondences below fixed hosts.
///
/// Each item pairs every redex node with its agent image, in plan order.
#[derive(Debug, Clone)]
pub struct Embeddings<'m> {
    resolver: Resolver<'m>,
    hosts: Vec<PlaceIx>,
    frames: Vec<Frame>,
    chosen: Vec<PlaceIx>,
    used: FxHashSet<PlaceIx>,
    started: bool,
    exhausted: bool,
}

impl Embeddings<'_> {
    /// Host vertex per redex root.
    pub fn hosts(&self) -> &[PlaceIx] {
        &self.hosts
    }

    fn push_frame(&mut self, step: usize) {
        let planned = self.resolver.plan[step];
        let anchor = match planned.anchor {
            Anchor::Root(position) => self.hosts[position],
            Anchor::Step(parent) => self.chosen[parent],
        };
        let resolver = self.resolver;
        let candidates = resolver
            .agent
            .children(anchor)
            .filter(|&c| resolver.the_same(c, planned.redex))
            .collect();
        self.frames.push(Frame {
            candidates,
            next: 0,
        });
    }

    fn mapping(&self) -> Vec<(PlaceIx, PlaceIx)> {
        self.resolver
            .plan
            .iter()
            .zip(&self.chosen)
            .map(|(step, &image)| (step.redex, image))
            .collect()
    }
}

impl Iterator for Embeddings<'_> {
    type Item = Vec<(PlaceIx, PlaceIx)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let steps = self.resolver.plan.len();
        if !self.started {
            self.started = true;
            if steps == 0 {
                self.exhausted = true;
                return Some(Vec::new());
            }
            self.push_frame(0);
        }
        loop {
            let Some(depth) = self.frames.len().checked_sub(1) else {
                self.exhausted = true;
                return None;
            };
            if self.chosen.len() > depth {
                if let Some(old) = self.chosen.pop() {
                    self.used.remove(&old);
                }
            }
            let floor = self.resolver.plan[depth].twin.map(|i| self.chosen[i]);
            let frame = &mut self.frames[depth];
            let mut pick = None;
            while frame.next < frame.candidates.len() {
                let c = frame.candidates[frame.next];
                frame.next += 1;
                if !self.used.contains(&c) && floor.is_none_or(|f| c > f) {
                    pick = Some(c);
                    break;
                }
            }
            let Some(c) = pick else {
                self.frames.pop();
                continue;
            };
            self.chosen.push(c);
            self.used.insert(c);
            if depth + 1 < steps {
                self.push_frame(depth + 1);
                continue;
            }
            let mapping = self.mapping();
            if !self.resolver.links.embedding_consistent(&mapping) {
                trace!("embedding rejected by link check");
                continue;
            }
            if !self.resolver.place_disjoint(&self.hosts, &mapping) {
                trace!("embedding rejected: roots overlap");
                continue;
            }
            return Some(mapping);
        }
    }
}
