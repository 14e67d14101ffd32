// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-only navigation over the two bigraphs taking part in a match.
//!
//! [`AgentAdapter`] and [`RedexAdapter`] share the [`MatchView`] surface.
//! The only asymmetry is that an agent must be ground while a redex may
//! carry sites, so only the redex view reports them.
use bigraph_core::{Bigraph, Control, LinkIx, PlaceIx};

use crate::error::MatchError;

/// Control and link of one connected port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLink<'a> {
    /// Control of the owning node.
    pub control: &'a Control,
    /// Link attached to the port.
    pub link: LinkIx,
}

/// Navigation shared by agent and redex views.
///
/// Vertices are roots and nodes; sites never appear as vertices.
pub trait MatchView<'a>: Copy {
    /// Underlying bigraph.
    fn bigraph(&self) -> &'a Bigraph;

    /// Roots followed by nodes.
    fn vertices(&self) -> Vec<PlaceIx> {
        let g = self.bigraph();
        g.roots().iter().chain(g.nodes()).copied().collect()
    }

    /// Non-site children of `v`.
    fn children(&self, v: PlaceIx) -> impl Iterator<Item = PlaceIx> + 'a {
        let g = self.bigraph();
        g.children(v).iter().copied().filter(move |&c| !g.is_site(c))
    }

    /// Number of non-site children of `v`.
    fn child_count(&self, v: PlaceIx) -> usize {
        self.children(v).count()
    }

    /// Parent of `v`.
    fn parent(&self, v: PlaceIx) -> Option<PlaceIx> {
        self.bigraph().parent(v)
    }

    /// Non-site children plus one for a parent.
    fn degree(&self, v: PlaceIx) -> usize {
        self.child_count(v) + usize::from(self.parent(v).is_some())
    }

    /// Non-site children followed by the parent, if any.
    fn open_neighborhood(&self, v: PlaceIx) -> Vec<PlaceIx> {
        let mut out: Vec<PlaceIx> = self.children(v).collect();
        out.extend(self.parent(v));
        out
    }

    /// True if `v` is a root.
    fn is_root(&self, v: PlaceIx) -> bool {
        self.bigraph().is_root(v)
    }

    /// Control of `v`; `None` for roots.
    fn control(&self, v: PlaceIx) -> Option<&'a Control> {
        self.bigraph().control(v)
    }

    /// A node without non-site children.
    fn is_leaf(&self, v: PlaceIx) -> bool {
        self.bigraph().is_node(v) && self.children(v).next().is_none()
    }

    /// One entry per connected port of `v`, in port order.
    fn links_of_node(&self, v: PlaceIx) -> Vec<PortLink<'a>> {
        let g = self.bigraph();
        match g.control(v) {
            Some(control) => g
                .ports_of(v)
                .iter()
                .map(|&link| PortLink { control, link })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Nodes owning a port on `link`.
    fn nodes_of_link(&self, link: LinkIx) -> Vec<PlaceIx> {
        self.bigraph().nodes_of_link(link)
    }
}

/// View over the ground bigraph being searched.
#[derive(Debug, Clone, Copy)]
pub struct AgentAdapter<'a> {
    bigraph: &'a Bigraph,
}

impl<'a> AgentAdapter<'a> {
    /// Wraps `bigraph` after checking that it is ground.
    ///
    /// # Errors
    /// [`MatchError::AgentNotGround`] when it has sites or inner names.
    pub fn new(bigraph: &'a Bigraph) -> Result<Self, MatchError> {
        if !bigraph.is_ground() {
            return Err(MatchError::AgentNotGround {
                sites: bigraph.sites().len(),
                inner_names: bigraph.inner_names().count(),
            });
        }
        Ok(Self { bigraph })
    }

    /// True when no outer name is idle.
    pub fn is_epimorphic(&self) -> bool {
        !self.bigraph.has_idle_outer_names()
    }

    /// Roots and nodes with children, children before parents.
    pub fn internal_post_order(&self) -> Vec<PlaceIx> {
        self.bigraph
            .post_order()
            .into_iter()
            .filter(|&v| self.is_root(v) || !self.is_leaf(v))
            .collect()
    }
}

impl<'a> MatchView<'a> for AgentAdapter<'a> {
    fn bigraph(&self) -> &'a Bigraph {
        self.bigraph
    }
}

/// View over the pattern being searched for.
#[derive(Debug, Clone, Copy)]
pub struct RedexAdapter<'a> {
    bigraph: &'a Bigraph,
}

impl<'a> RedexAdapter<'a> {
    /// Wraps `bigraph`.
    pub fn new(bigraph: &'a Bigraph) -> Self {
        Self { bigraph }
    }

    /// Roots ordered by index.
    pub fn roots(&self) -> &'a [PlaceIx] {
        self.bigraph.roots()
    }

    /// Children of `v` including sites.
    pub fn children_with_sites(&self, v: PlaceIx) -> &'a [PlaceIx] {
        self.bigraph.children(v)
    }

    /// Roots always tolerate extra material; nodes only with a site child.
    pub fn has_site(&self, v: PlaceIx) -> bool {
        self.is_root(v)
            || self
                .children_with_sites(v)
                .iter()
                .any(|&c| self.bigraph.is_site(c))
    }

    /// Root index of `v`.
    pub fn root_index(&self, v: PlaceIx) -> Option<usize> {
        self.bigraph.root_index(v)
    }
}

impl<'a> MatchView<'a> for RedexAdapter<'a> {
    fn bigraph(&self) -> &'a Bigraph {
        self.bigraph
    }
}
