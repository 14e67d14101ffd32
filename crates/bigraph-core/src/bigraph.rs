// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arena-backed bigraph: a place forest plus a link hypergraph.
//!
//! A [`Bigraph`] is produced once by a [`BigraphBuilder`](crate::BigraphBuilder)
//! and is immutable afterwards. Places (roots, nodes, sites) live in one arena
//! addressed by [`PlaceIx`]; links (edges, outer names) live in a second arena
//! addressed by [`LinkIx`]; inner names live in a third.
use std::collections::VecDeque;

use blake3::Hasher;

use crate::control::{Control, Signature};
use crate::ident::{make_node_id, EdgeId, Hash, InnerIx, LinkIx, NodeId, PlaceIx};

/// Payload of a node place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub(crate) control: Control,
    pub(crate) label: String,
    pub(crate) id: NodeId,
    /// Port `i` is attached to `ports[i]`; length never exceeds the arity.
    pub(crate) ports: Vec<LinkIx>,
}

impl NodeData {
    pub(crate) fn new(control: Control, label: String) -> Self {
        let id = make_node_id(&label);
        Self {
            control,
            label,
            id,
            ports: Vec::new(),
        }
    }

    /// Control of the node.
    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Identity label, unique within the bigraph.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Content id derived from the label.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Links of the connected ports, in port order.
    pub fn ports(&self) -> &[LinkIx] {
        &self.ports
    }
}

/// The three kinds of place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceKind {
    /// Top-level region.
    Root {
        /// Position in the outer face.
        index: usize,
    },
    /// Hole awaiting a parameter.
    Site {
        /// Position in the inner face.
        index: usize,
    },
    /// Controlled node.
    Node(NodeData),
}

#[derive(Debug, Clone)]
pub(crate) struct Place {
    pub(crate) kind: PlaceKind,
    pub(crate) parent: Option<PlaceIx>,
    pub(crate) children: Vec<PlaceIx>,
}

/// The two kinds of link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Closed link, invisible from the outer face.
    Edge {
        /// Identity label, unique among edges.
        label: String,
        /// Content id derived from the label.
        id: EdgeId,
    },
    /// Open link exposed on the outer face.
    OuterName {
        /// Name, unique among outer names.
        name: String,
    },
}

/// Something a link can own.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Point {
    /// Port `port` of node `node`.
    Port {
        /// Owning node.
        node: PlaceIx,
        /// Zero-based port index.
        port: usize,
    },
    /// An inner name.
    Inner(InnerIx),
}

#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub(crate) kind: LinkKind,
    pub(crate) points: Vec<Point>,
}

#[derive(Debug, Clone)]
pub(crate) struct InnerName {
    pub(crate) name: String,
    pub(crate) link: Option<LinkIx>,
}

/// One side of a bigraph's interface: a place count plus a name set.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Face {
    /// Number of roots (outer face) or sites (inner face).
    pub places: usize,
    /// Outer or inner names, sorted.
    pub names: Vec<String>,
}

/// An immutable bigraph over a [`Signature`].
#[derive(Debug, Clone)]
pub struct Bigraph {
    pub(crate) signature: Signature,
    pub(crate) places: Vec<Place>,
    /// Sorted by root index.
    pub(crate) roots: Vec<PlaceIx>,
    /// Sorted by site index.
    pub(crate) sites: Vec<PlaceIx>,
    /// Creation order.
    pub(crate) nodes: Vec<PlaceIx>,
    pub(crate) links: Vec<Link>,
    pub(crate) inner_names: Vec<InnerName>,
}

impl Bigraph {
    /// Signature every node control belongs to.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Roots ordered by index.
    pub fn roots(&self) -> &[PlaceIx] {
        &self.roots
    }

    /// Sites ordered by index.
    pub fn sites(&self) -> &[PlaceIx] {
        &self.sites
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> &[PlaceIx] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Kind of place `p`.
    pub fn kind(&self, p: PlaceIx) -> &PlaceKind {
        &self.places[p.0].kind
    }

    /// Node payload of `p`, `None` for roots and sites.
    pub fn node(&self, p: PlaceIx) -> Option<&NodeData> {
        match &self.places[p.0].kind {
            PlaceKind::Node(data) => Some(data),
            _ => None,
        }
    }

    /// True if `p` is a root.
    pub fn is_root(&self, p: PlaceIx) -> bool {
        matches!(self.places[p.0].kind, PlaceKind::Root { .. })
    }

    /// True if `p` is a site.
    pub fn is_site(&self, p: PlaceIx) -> bool {
        matches!(self.places[p.0].kind, PlaceKind::Site { .. })
    }

    /// True if `p` is a node.
    pub fn is_node(&self, p: PlaceIx) -> bool {
        matches!(self.places[p.0].kind, PlaceKind::Node(_))
    }

    /// Root index of `p`, if it is a root.
    pub fn root_index(&self, p: PlaceIx) -> Option<usize> {
        match self.places[p.0].kind {
            PlaceKind::Root { index } => Some(index),
            _ => None,
        }
    }

    /// Site index of `p`, if it is a site.
    pub fn site_index(&self, p: PlaceIx) -> Option<usize> {
        match self.places[p.0].kind {
            PlaceKind::Site { index } => Some(index),
            _ => None,
        }
    }

    /// Control of `p`, if it is a node.
    pub fn control(&self, p: PlaceIx) -> Option<&Control> {
        self.node(p).map(NodeData::control)
    }

    /// Identity label of `p`, if it is a node.
    pub fn label(&self, p: PlaceIx) -> Option<&str> {
        self.node(p).map(NodeData::label)
    }

    /// Node with identity label `label`.
    pub fn node_by_label(&self, label: &str) -> Option<PlaceIx> {
        self.nodes
            .iter()
            .copied()
            .find(|&n| self.label(n) == Some(label))
    }

    /// Parent of `p`; `None` for roots.
    pub fn parent(&self, p: PlaceIx) -> Option<PlaceIx> {
        self.places[p.0].parent
    }

    /// Children of `p` (nodes and sites) in insertion order.
    pub fn children(&self, p: PlaceIx) -> &[PlaceIx] {
        &self.places[p.0].children
    }

    /// Links of the connected ports of `p`; empty for roots and sites.
    pub fn ports_of(&self, p: PlaceIx) -> &[LinkIx] {
        self.node(p).map_or(&[], NodeData::ports)
    }

    /// Link attached to port `port` of node `p`.
    pub fn link_of_port(&self, p: PlaceIx, port: usize) -> Option<LinkIx> {
        self.ports_of(p).get(port).copied()
    }

    /// All links, edges and outer names interleaved in creation order.
    pub fn links(&self) -> impl Iterator<Item = LinkIx> + '_ {
        (0..self.links.len()).map(LinkIx)
    }

    /// Edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = LinkIx> + '_ {
        self.links().filter(|&l| self.is_edge(l))
    }

    /// Outer names in creation order.
    pub fn outer_names(&self) -> impl Iterator<Item = LinkIx> + '_ {
        self.links().filter(|&l| !self.is_edge(l))
    }

    /// Outer name called `name`.
    pub fn outer_name(&self, name: &str) -> Option<LinkIx> {
        self.outer_names().find(|&l| self.link_name(l) == name)
    }

    /// Kind of link `l`.
    pub fn link_kind(&self, l: LinkIx) -> &LinkKind {
        &self.links[l.0].kind
    }

    /// True if `l` is an edge.
    pub fn is_edge(&self, l: LinkIx) -> bool {
        matches!(self.links[l.0].kind, LinkKind::Edge { .. })
    }

    /// Edge label or outer name of `l`.
    pub fn link_name(&self, l: LinkIx) -> &str {
        match &self.links[l.0].kind {
            LinkKind::Edge { label, .. } => label,
            LinkKind::OuterName { name } => name,
        }
    }

    /// Points owned by `l`.
    pub fn points_of(&self, l: LinkIx) -> &[Point] {
        &self.links[l.0].points
    }

    /// Number of ports (not inner names) owned by `l`.
    pub fn port_count(&self, l: LinkIx) -> usize {
        self.points_of(l)
            .iter()
            .filter(|p| matches!(p, Point::Port { .. }))
            .count()
    }

    /// Distinct nodes owning a port on `l`, in point order.
    pub fn nodes_of_link(&self, l: LinkIx) -> Vec<PlaceIx> {
        let mut out: Vec<PlaceIx> = Vec::new();
        for point in self.points_of(l) {
            if let Point::Port { node, .. } = *point {
                if !out.contains(&node) {
                    out.push(node);
                }
            }
        }
        out
    }

    /// Inner names in creation order.
    pub fn inner_names(&self) -> impl Iterator<Item = InnerIx> + '_ {
        (0..self.inner_names.len()).map(InnerIx)
    }

    /// Name of inner name `i`.
    pub fn inner_name(&self, i: InnerIx) -> &str {
        &self.inner_names[i.0].name
    }

    /// Link of inner name `i`.
    pub fn inner_link(&self, i: InnerIx) -> Option<LinkIx> {
        self.inner_names[i.0].link
    }

    /// True if `ancestor` is a strict ancestor of `p`.
    pub fn is_ancestor(&self, ancestor: PlaceIx, p: PlaceIx) -> bool {
        let mut cursor = self.parent(p);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Strict descendants of `p` in breadth-first order.
    pub fn descendants(&self, p: PlaceIx) -> Vec<PlaceIx> {
        let mut out = Vec::new();
        let mut queue: VecDeque<PlaceIx> = self.children(p).iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            out.push(current);
            queue.extend(self.children(current).iter().copied());
        }
        out
    }

    /// Every place, roots first, in breadth-first order.
    pub fn bfs_order(&self) -> Vec<PlaceIx> {
        let mut out = Vec::with_capacity(self.places.len());
        let mut queue: VecDeque<PlaceIx> = self.roots.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            out.push(current);
            queue.extend(self.children(current).iter().copied());
        }
        out
    }

    /// Every place, children before parents, roots in index order.
    pub fn post_order(&self) -> Vec<PlaceIx> {
        let mut out = Vec::with_capacity(self.places.len());
        // (place, children already expanded)
        let mut stack: Vec<(PlaceIx, bool)> = self.roots.iter().rev().map(|&r| (r, false)).collect();
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            stack.extend(self.children(current).iter().rev().map(|&c| (c, false)));
        }
        out
    }

    /// No sites and no inner names.
    pub fn is_ground(&self) -> bool {
        self.sites.is_empty() && self.inner_names.is_empty()
    }

    /// Exactly one root and no inner names.
    pub fn is_prime(&self) -> bool {
        self.roots.len() == 1 && self.inner_names.is_empty()
    }

    /// No idle roots and no idle outer names.
    pub fn is_epimorphic(&self) -> bool {
        self.roots.iter().all(|&r| !self.children(r).is_empty()) && !self.has_idle_outer_names()
    }

    /// True if some outer name has no point.
    pub fn has_idle_outer_names(&self) -> bool {
        self.outer_names().any(|l| self.points_of(l).is_empty())
    }

    /// No two sites are siblings and no two inner names share a link.
    pub fn is_monomorphic(&self) -> bool {
        let siblings = self.sites.iter().enumerate().any(|(i, &a)| {
            self.sites[i + 1..]
                .iter()
                .any(|&b| self.parent(a) == self.parent(b))
        });
        let shared = self
            .links()
            .any(|l| self.points_of(l).iter().filter(|p| matches!(p, Point::Inner(_))).count() > 1);
        !siblings && !shared
    }

    /// No idle edges.
    pub fn is_lean(&self) -> bool {
        self.edges().all(|e| !self.points_of(e).is_empty())
    }

    /// Every node above site `index` carries an active control.
    ///
    /// Returns `false` when no site has that index.
    pub fn is_active_at_site(&self, index: usize) -> bool {
        let Some(&site) = self.sites.iter().find(|&&s| self.site_index(s) == Some(index)) else {
            return false;
        };
        let mut cursor = self.parent(site);
        while let Some(current) = cursor {
            if let Some(control) = self.control(current) {
                if !control.is_active() {
                    return false;
                }
            }
            cursor = self.parent(current);
        }
        true
    }

    /// Active at every site.
    pub fn is_active(&self) -> bool {
        self.sites
            .iter()
            .filter_map(|&s| self.site_index(s))
            .all(|i| self.is_active_at_site(i))
    }

    /// Indices of sites with a non-active ancestor, ascending.
    pub fn inactive_sites(&self) -> Vec<usize> {
        self.sites
            .iter()
            .filter_map(|&s| self.site_index(s))
            .filter(|&i| !self.is_active_at_site(i))
            .collect()
    }

    /// No site sits directly under a root and no inner name reaches an outer name.
    pub fn is_guarding(&self) -> bool {
        self.sites
            .iter()
            .all(|&s| self.parent(s).is_some_and(|p| !self.is_root(p)))
            && self
                .inner_names
                .iter()
                .all(|i| i.link.is_none_or(|l| self.is_edge(l)))
    }

    /// No edges and every outer name owns exactly one point.
    pub fn is_discrete(&self) -> bool {
        self.edges().next().is_none() && self.outer_names().all(|l| self.points_of(l).len() == 1)
    }

    /// Site count and sorted inner names.
    pub fn inner_face(&self) -> Face {
        let mut names: Vec<String> = self.inner_names.iter().map(|i| i.name.clone()).collect();
        names.sort();
        Face {
            places: self.sites.len(),
            names,
        }
    }

    /// Root count and sorted outer names.
    pub fn outer_face(&self) -> Face {
        let mut names: Vec<String> = self
            .outer_names()
            .map(|l| self.link_name(l).to_owned())
            .collect();
        names.sort();
        Face {
            places: self.roots.len(),
            names,
        }
    }

    /// Canonical BLAKE3 digest of the bigraph.
    ///
    /// Two bigraphs with the same labels, controls, nesting and link
    /// attachments hash equally regardless of construction order.
    pub fn digest(&self) -> Hash {
        let mut records: Vec<String> = Vec::with_capacity(self.places.len() + self.links.len());
        for place in &self.places {
            let parent = place.parent.map_or_else(String::new, |p| self.place_key(p));
            match &place.kind {
                PlaceKind::Root { index } => records.push(format!("r:{index}")),
                PlaceKind::Site { index } => records.push(format!("s:{index}<{parent}")),
                PlaceKind::Node(data) => {
                    let ports: Vec<String> = data.ports.iter().map(|&l| self.link_key(l)).collect();
                    records.push(format!(
                        "n:{}:{}<{parent}|{}",
                        data.label,
                        data.control,
                        ports.join(",")
                    ));
                }
            }
        }
        for l in self.links() {
            records.push(format!("l:{}", self.link_key(l)));
        }
        for inner in &self.inner_names {
            let link = inner.link.map_or_else(|| "-".to_owned(), |l| self.link_key(l));
            records.push(format!("i:{}>{link}", inner.name));
        }
        records.sort();
        let mut hasher = Hasher::new();
        hasher.update(b"bigraph:");
        for record in &records {
            hasher.update(&(record.len() as u64).to_le_bytes());
            hasher.update(record.as_bytes());
        }
        hasher.finalize().into()
    }

    fn place_key(&self, p: PlaceIx) -> String {
        match &self.places[p.0].kind {
            PlaceKind::Root { index } => format!("r{index}"),
            PlaceKind::Site { index } => format!("s{index}"),
            PlaceKind::Node(data) => format!("n{}", data.label),
        }
    }

    fn link_key(&self, l: LinkIx) -> String {
        match &self.links[l.0].kind {
            LinkKind::Edge { label, .. } => format!("e{label}"),
            LinkKind::OuterName { name } => format!("o{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::builder::BigraphBuilder;
    use crate::control::ControlKind;

    fn signature() -> Signature {
        Signature::builder()
            .control("Room", 1, ControlKind::Active)
            .and_then(|b| b.control("Safe", 0, ControlKind::Passive))
            .and_then(|b| b.control("User", 1, ControlKind::Atomic))
            .unwrap()
            .finish()
    }

    #[test]
    fn navigation_orders_are_stable() {
        let mut b = BigraphBuilder::new(&signature());
        let r = b.root(0).unwrap();
        let room = b.child(r, "Room").unwrap();
        let u1 = b.child(room, "User").unwrap();
        let u2 = b.child(room, "User").unwrap();
        let g = b.finish().unwrap();

        assert_eq!(g.bfs_order(), vec![r, room, u1, u2]);
        assert_eq!(g.post_order(), vec![u1, u2, room, r]);
        assert_eq!(g.descendants(r), vec![room, u1, u2]);
        assert!(g.is_ancestor(r, u2));
        assert!(!g.is_ancestor(u1, u2));
        assert!(!g.is_ancestor(u1, u1));
    }

    #[test]
    fn predicates_follow_faces() {
        let sig = signature();
        let mut b = BigraphBuilder::new(&sig);
        let r = b.root(0).unwrap();
        let safe = b.child(r, "Safe").unwrap();
        let s = b.site(0).unwrap();
        b.set_parent(s, safe).unwrap();
        let idle = b.outer_name("idle").unwrap();
        let g = b.finish().unwrap();

        assert!(!g.is_ground());
        assert!(g.is_prime());
        assert!(!g.is_epimorphic());
        assert!(g.has_idle_outer_names());
        assert!(g.points_of(idle).is_empty());
        assert!(g.is_guarding());
        assert!(!g.is_active_at_site(0));
        assert!(!g.is_active());
        assert_eq!(g.inactive_sites(), vec![0]);
        assert!(!g.is_active_at_site(9));
        assert_eq!(
            g.outer_face(),
            Face {
                places: 1,
                names: vec!["idle".into()]
            }
        );
        assert_eq!(g.inner_face().places, 1);
    }

    #[test]
    fn links_report_points_and_nodes() {
        let mut b = BigraphBuilder::new(&signature());
        let r = b.root(0).unwrap();
        let room = b.child(r, "Room").unwrap();
        let user = b.child(r, "User").unwrap();
        let e = b.edge("e0").unwrap();
        b.connect_port(room, e).unwrap();
        b.connect_port(user, e).unwrap();
        let g = b.finish().unwrap();

        assert_eq!(g.nodes_of_link(e), vec![room, user]);
        assert_eq!(g.port_count(e), 2);
        assert_eq!(g.link_of_port(user, 0), Some(e));
        assert!(g.is_lean());
        assert!(!g.is_discrete());
        assert!(g.is_ground());
        assert!(g.is_monomorphic());
    }

    #[test]
    fn digest_ignores_construction_order() {
        let sig = signature();
        let build = |swap: bool| {
            let mut b = BigraphBuilder::new(&sig);
            let r = b.root(0).unwrap();
            let (first, second) = if swap { ("b", "a") } else { ("a", "b") };
            let n1 = b.node("Room", first).unwrap();
            let n2 = b.node("Room", second).unwrap();
            b.set_parent(n1, r).unwrap();
            b.set_parent(n2, r).unwrap();
            b.finish().unwrap()
        };
        assert_eq!(build(false).digest(), build(true).digest());

        let mut b = BigraphBuilder::new(&sig);
        let r = b.root(0).unwrap();
        let a = b.node("Room", "a").unwrap();
        b.set_parent(a, r).unwrap();
        let nested = b.node("Room", "b").unwrap();
        b.set_parent(nested, a).unwrap();
        assert_ne!(b.finish().unwrap().digest(), build(false).digest());
    }
}
