// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Context and parameter construction for one resolved occurrence.
use std::collections::VecDeque;

use bigraph_core::{Bigraph, BigraphBuilder, BuildError, LinkIx, LinkKind, PlaceIx, Point};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::adapter::{AgentAdapter, MatchView, RedexAdapter};
use crate::config::MatchConfig;
use crate::error::MatchError;

/// Mints outer names that collide with nothing already taken.
#[derive(Debug, Clone)]
pub struct NameSupply {
    prefix: String,
    next: usize,
    taken: FxHashSet<String>,
}

impl NameSupply {
    /// Supply producing `prefix0`, `prefix1`, … while skipping `taken`.
    pub fn new(prefix: impl Into<String>, taken: impl IntoIterator<Item = String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
            taken: taken.into_iter().collect(),
        }
    }

    /// Next unused name.
    pub fn fresh(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", self.prefix, self.next);
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Output of [`MatchBuilder::build`].
#[derive(Debug, Clone)]
pub struct Built {
    /// Agent with the occurrence replaced by sites.
    pub context: Bigraph,
    /// One parameter per redex site, by site index.
    pub parameters: Vec<Bigraph>,
    /// Fresh names wiring parameters to the context, in minting order.
    pub fresh_names: Vec<String>,
}

/// Outer names for parameter links that leave their parameter.
#[derive(Debug)]
struct Boundary {
    supply: NameSupply,
    /// Agent links a redex inner name answers to, with that name.
    named: FxHashMap<LinkIx, String>,
    placed: FxHashSet<String>,
    /// Fresh names and the agent link each stands for, in minting order.
    fresh: Vec<(String, LinkIx)>,
}

impl Boundary {
    fn name_for(&mut self, link: LinkIx) -> String {
        if let Some(name) = self.named.remove(&link) {
            self.placed.insert(name.clone());
            return name;
        }
        let name = self.supply.fresh();
        self.fresh.push((name.clone(), link));
        name
    }
}

/// Copies agent links into a target builder, once per agent link.
#[derive(Debug, Default)]
struct LinkCopies {
    images: FxHashMap<LinkIx, LinkIx>,
}

impl LinkCopies {
    fn image(&mut self, target: &mut BigraphBuilder, agent: &Bigraph, link: LinkIx) -> Result<LinkIx, BuildError> {
        if let Some(&image) = self.images.get(&link) {
            return Ok(image);
        }
        let image = match agent.link_kind(link) {
            LinkKind::Edge { label, .. } => target.edge(label.clone())?,
            LinkKind::OuterName { name } => target.outer_name(name.clone())?,
        };
        self.images.insert(link, image);
        Ok(image)
    }
}

/// Splits the agent into context and parameters around one occurrence.
#[derive(Debug, Clone, Copy)]
pub struct MatchBuilder<'m> {
    agent: AgentAdapter<'m>,
    redex: RedexAdapter<'m>,
    config: &'m MatchConfig,
}

impl<'m> MatchBuilder<'m> {
    /// Builder for occurrences of `redex` in `agent`.
    pub fn new(agent: AgentAdapter<'m>, redex: RedexAdapter<'m>, config: &'m MatchConfig) -> Self {
        Self { agent, redex, config }
    }

    /// Builds the decomposition for `hosts` (per redex root) and `mapping`
    /// (redex node to agent node).
    ///
    /// # Errors
    /// [`MatchError::Build`] when reconstruction violates a builder
    /// invariant, [`MatchError::ContextIsNotActive`] when the configuration
    /// requires an active context and a site sits below a non-active node.
    pub fn build(&self, hosts: &[PlaceIx], mapping: &[(PlaceIx, PlaceIx)]) -> Result<Built, MatchError> {
        let agent = self.agent.bigraph();
        let redex = self.redex.bigraph();
        let images: FxHashMap<PlaceIx, PlaceIx> = mapping.iter().copied().collect();
        let matched: FxHashSet<PlaceIx> = mapping.iter().map(|&(_, y)| y).collect();
        // Roots sharing a host leave one site each under it.
        let mut site_at: FxHashMap<PlaceIx, Vec<usize>> = FxHashMap::default();
        for (&host, &root) in hosts.iter().zip(redex.roots()) {
            if let Some(index) = redex.root_index(root) {
                site_at.entry(host).or_default().push(index);
            }
        }

        let mut ctx = BigraphBuilder::new(agent.signature());
        let mut ctx_links = LinkCopies::default();
        let mut copies: FxHashMap<PlaceIx, PlaceIx> = FxHashMap::default();
        for &root in agent.roots() {
            if let Some(index) = agent.root_index(root) {
                copies.insert(root, ctx.root(index)?);
            }
        }

        // Breadth-first copy that stops at matched nodes.
        let mut queue: VecDeque<PlaceIx> = agent.roots().iter().copied().collect();
        while let Some(place) = queue.pop_front() {
            let Some(&copy) = copies.get(&place) else {
                continue;
            };
            for &child in agent.children(place) {
                if matched.contains(&child) {
                    continue;
                }
                let Some(data) = agent.node(child) else {
                    continue;
                };
                let node = ctx.node(data.control().name(), data.label())?;
                ctx.set_parent(node, copy)?;
                for &link in data.ports() {
                    let image = ctx_links.image(&mut ctx, agent, link)?;
                    ctx.connect_port(node, image)?;
                }
                copies.insert(child, node);
                queue.push_back(child);
            }
            for &index in site_at.get(&place).into_iter().flatten() {
                let site = ctx.site(index)?;
                ctx.set_parent(site, copy)?;
            }
        }

        if !self.agent.is_epimorphic() {
            for link in agent.outer_names() {
                if agent.points_of(link).is_empty() {
                    ctx_links.image(&mut ctx, agent, link)?;
                }
            }
        }

        // Redex outer names become context inner names on the agent link they hit.
        let mut redex_names = Vec::new();
        for link in redex.outer_names() {
            let name = redex.link_name(link);
            redex_names.push(name.to_owned());
            let inner = ctx.inner_name(name)?;
            if let Some(target) = self.link_image(&images, link) {
                let image = ctx_links.image(&mut ctx, agent, target)?;
                ctx.connect_inner(inner, image)?;
            }
        }

        // Parameter links answering to a redex inner name take that name.
        let mut inner_names = Vec::new();
        let mut named: FxHashMap<LinkIx, String> = FxHashMap::default();
        for inner in redex.inner_names() {
            let name = redex.inner_name(inner).to_owned();
            if let Some(target) = redex.inner_link(inner).and_then(|l| self.link_image(&images, l)) {
                named.entry(target).or_insert_with(|| name.clone());
            }
            inner_names.push(name);
        }

        let taken = redex_names.into_iter().chain(inner_names.iter().cloned());
        let mut boundary = Boundary {
            supply: NameSupply::new(self.config.fresh_name_prefix.clone(), taken),
            named,
            placed: FxHashSet::default(),
            fresh: Vec::new(),
        };
        let mut claimed: FxHashSet<PlaceIx> = FxHashSet::default();
        let mut parameters = Vec::with_capacity(redex.sites().len());
        for &site in redex.sites() {
            // The lowest-indexed site under a node takes all unmatched material.
            let content: Vec<PlaceIx> = match redex.parent(site) {
                Some(owner) if redex.is_node(owner) && claimed.insert(owner) => images
                    .get(&owner)
                    .map(|&y| {
                        agent
                            .children(y)
                            .iter()
                            .copied()
                            .filter(|c| !matched.contains(c))
                            .collect()
                    })
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            parameters.push(self.parameter(&content, &mut boundary)?);
        }
        // Inner names no parameter link answers to stay idle.
        if let Some(first) = parameters.first_mut() {
            for name in inner_names.iter().filter(|&n| !boundary.placed.contains(n)) {
                first.outer_name(name.clone())?;
            }
        }
        let parameters = parameters
            .into_iter()
            .map(BigraphBuilder::finish)
            .collect::<Result<Vec<_>, _>>()?;

        let mut fresh_names = Vec::with_capacity(boundary.fresh.len());
        for (name, link) in boundary.fresh {
            let inner = ctx.inner_name(name.clone())?;
            let image = ctx_links.image(&mut ctx, agent, link)?;
            ctx.connect_inner(inner, image)?;
            fresh_names.push(name);
        }

        let context = ctx.finish()?;
        if self.config.require_active_context {
            let sites = context.inactive_sites();
            if !sites.is_empty() {
                return Err(MatchError::ContextIsNotActive { sites });
            }
        }
        Ok(Built {
            context,
            parameters,
            fresh_names,
        })
    }

    /// Agent link that redex link `link` answers to under `images`.
    ///
    /// Found through a matched port, or by name for an outer name no
    /// matched port reaches.
    fn link_image(&self, images: &FxHashMap<PlaceIx, PlaceIx>, link: LinkIx) -> Option<LinkIx> {
        let agent = self.agent.bigraph();
        let redex = self.redex.bigraph();
        redex
            .points_of(link)
            .iter()
            .find_map(|point| match *point {
                Point::Port { node, port } => images.get(&node).and_then(|&y| agent.link_of_port(y, port)),
                Point::Inner(_) => None,
            })
            .or_else(|| {
                if redex.is_edge(link) {
                    None
                } else {
                    agent.outer_name(redex.link_name(link))
                }
            })
    }

    /// One-rooted copy of `content` and everything below it, left unfinished.
    ///
    /// Edges wholly inside the copy stay edges; every other link becomes an
    /// outer name chosen by `boundary`.
    fn parameter(&self, content: &[PlaceIx], boundary: &mut Boundary) -> Result<BigraphBuilder, MatchError> {
        let agent = self.agent.bigraph();
        let mut b = BigraphBuilder::new(agent.signature());
        let root = b.root(0)?;

        let mut region: FxHashSet<PlaceIx> = content.iter().copied().collect();
        for &top in content {
            region.extend(agent.descendants(top));
        }

        let mut links: FxHashMap<LinkIx, LinkIx> = FxHashMap::default();
        let mut queue: VecDeque<(PlaceIx, PlaceIx)> = content.iter().map(|&c| (c, root)).collect();
        while let Some((place, parent)) = queue.pop_front() {
            let Some(data) = agent.node(place) else {
                continue;
            };
            let node = b.node(data.control().name(), data.label())?;
            b.set_parent(node, parent)?;
            for &link in data.ports() {
                let image = if let Some(&image) = links.get(&link) {
                    image
                } else {
                    let closed_inside = agent.is_edge(link)
                        && agent.nodes_of_link(link).iter().all(|n| region.contains(n));
                    let image = if closed_inside {
                        b.edge(agent.link_name(link))?
                    } else {
                        b.outer_name(boundary.name_for(link))?
                    };
                    links.insert(link, image);
                    image
                };
                b.connect_port(node, image)?;
            }
            queue.extend(agent.children(place).iter().map(|&c| (c, node)));
        }
        Ok(b)
    }
}
