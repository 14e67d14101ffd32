// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validating builder for [`Bigraph`] values.
//!
//! Every structural invariant is checked when an entity is created or wired,
//! so a finished bigraph never needs to be re-validated.
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::bigraph::{Bigraph, InnerName, Link, LinkKind, NodeData, Place, PlaceKind, Point};
use crate::control::Signature;
use crate::ident::{make_edge_id, InnerIx, LinkIx, PlaceIx};

/// Errors raised while constructing a bigraph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No control with this name exists in the signature.
    #[error("unknown control: {0}")]
    UnknownControl(String),
    /// Connecting another port would exceed the control's arity.
    #[error("control {control} allows at most {arity} ports")]
    InvalidArityOfControl {
        /// Control name.
        control: String,
        /// Declared arity.
        arity: usize,
    },
    /// Atomic nodes cannot have children.
    #[error("atomic control {control} cannot have children")]
    AtomicControl {
        /// Control name.
        control: String,
    },
    /// A root with this index already exists.
    #[error("duplicate root index: {0}")]
    DuplicateRoot(usize),
    /// A site with this index already exists.
    #[error("duplicate site index: {0}")]
    DuplicateSite(usize),
    /// An outer name with this name already exists.
    #[error("duplicate outer name: {0}")]
    DuplicateOuterName(String),
    /// An inner name with this name already exists.
    #[error("duplicate inner name: {0}")]
    DuplicateInnerName(String),
    /// An edge with this label already exists.
    #[error("duplicate edge: {0}")]
    DuplicateEdge(String),
    /// A node with this label already exists.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),
    /// A control with this name was already declared.
    #[error("duplicate control: {0}")]
    DuplicateControl(String),
    /// The place index does not belong to this builder, or is not a node.
    #[error("unknown place")]
    UnknownPlace,
    /// The link index does not belong to this builder.
    #[error("unknown link")]
    UnknownLink,
    /// No outer name with this name exists.
    #[error("unknown outer name: {0}")]
    UnknownOuterName(String),
    /// The inner name index does not belong to this builder.
    #[error("unknown inner name")]
    UnknownInnerName,
    /// The inner name is already attached to a link.
    #[error("point already linked")]
    PointAlreadyLinked,
    /// Roots cannot be nested, sites cannot be parents, and the place graph must stay acyclic.
    #[error("invalid parent")]
    InvalidParent,
    /// A node or site was left without a parent.
    #[error("orphaned place: {0}")]
    Orphan(String),
}

/// Incrementally assembles a [`Bigraph`].
#[derive(Debug)]
pub struct BigraphBuilder {
    graph: Bigraph,
    root_indices: FxHashSet<usize>,
    site_indices: FxHashSet<usize>,
    labels: FxHashSet<String>,
    outer_names: FxHashMap<String, LinkIx>,
    edge_labels: FxHashSet<String>,
    inner_by_name: FxHashSet<String>,
    next_label: usize,
}

impl BigraphBuilder {
    /// Starts an empty bigraph over `signature`.
    pub fn new(signature: &Signature) -> Self {
        Self {
            graph: Bigraph {
                signature: signature.clone(),
                places: Vec::new(),
                roots: Vec::new(),
                sites: Vec::new(),
                nodes: Vec::new(),
                links: Vec::new(),
                inner_names: Vec::new(),
            },
            root_indices: FxHashSet::default(),
            site_indices: FxHashSet::default(),
            labels: FxHashSet::default(),
            outer_names: FxHashMap::default(),
            edge_labels: FxHashSet::default(),
            inner_by_name: FxHashSet::default(),
            next_label: 0,
        }
    }

    fn push_place(&mut self, kind: PlaceKind) -> PlaceIx {
        let ix = PlaceIx(self.graph.places.len());
        self.graph.places.push(Place {
            kind,
            parent: None,
            children: Vec::new(),
        });
        ix
    }

    fn push_link(&mut self, kind: LinkKind) -> LinkIx {
        let ix = LinkIx(self.graph.links.len());
        self.graph.links.push(Link {
            kind,
            points: Vec::new(),
        });
        ix
    }

    /// Creates root `index`.
    ///
    /// # Errors
    /// [`BuildError::DuplicateRoot`] if the index is taken.
    pub fn root(&mut self, index: usize) -> Result<PlaceIx, BuildError> {
        if !self.root_indices.insert(index) {
            return Err(BuildError::DuplicateRoot(index));
        }
        let ix = self.push_place(PlaceKind::Root { index });
        self.graph.roots.push(ix);
        Ok(ix)
    }

    /// Creates a detached site `index`; attach it with [`Self::set_parent`].
    ///
    /// # Errors
    /// [`BuildError::DuplicateSite`] if the index is taken.
    pub fn site(&mut self, index: usize) -> Result<PlaceIx, BuildError> {
        if !self.site_indices.insert(index) {
            return Err(BuildError::DuplicateSite(index));
        }
        let ix = self.push_place(PlaceKind::Site { index });
        self.graph.sites.push(ix);
        Ok(ix)
    }

    /// Creates a detached node of control `control` labelled `label`.
    ///
    /// # Errors
    /// [`BuildError::UnknownControl`] or [`BuildError::DuplicateNode`].
    pub fn node(&mut self, control: &str, label: impl Into<String>) -> Result<PlaceIx, BuildError> {
        let control = self
            .graph
            .signature
            .find(control)
            .cloned()
            .ok_or_else(|| BuildError::UnknownControl(control.to_owned()))?;
        let label = label.into();
        if !self.labels.insert(label.clone()) {
            return Err(BuildError::DuplicateNode(label));
        }
        let ix = self.push_place(PlaceKind::Node(NodeData::new(control, label)));
        self.graph.nodes.push(ix);
        Ok(ix)
    }

    /// Creates a node with a generated label and nests it under `parent`.
    ///
    /// # Errors
    /// Any error of [`Self::node`] or [`Self::set_parent`].
    pub fn child(&mut self, parent: PlaceIx, control: &str) -> Result<PlaceIx, BuildError> {
        let label = self.fresh_label("v", |b, l| b.labels.contains(l));
        let node = self.node(control, label)?;
        self.set_parent(node, parent)?;
        Ok(node)
    }

    fn fresh_label(&mut self, prefix: &str, taken: impl Fn(&Self, &str) -> bool) -> String {
        loop {
            let candidate = format!("{prefix}{}", self.next_label);
            self.next_label += 1;
            if !taken(self, &candidate) {
                return candidate;
            }
        }
    }

    /// Nests `child` under `parent`, detaching it from any previous parent.
    ///
    /// # Errors
    /// [`BuildError::UnknownPlace`] for foreign indices,
    /// [`BuildError::AtomicControl`] when `parent` is atomic, and
    /// [`BuildError::InvalidParent`] when `child` is a root, `parent` is a
    /// site, or the nesting would create a cycle.
    pub fn set_parent(&mut self, child: PlaceIx, parent: PlaceIx) -> Result<(), BuildError> {
        let len = self.graph.places.len();
        if child.0 >= len || parent.0 >= len {
            return Err(BuildError::UnknownPlace);
        }
        match &self.graph.places[parent.0].kind {
            PlaceKind::Site { .. } => return Err(BuildError::InvalidParent),
            PlaceKind::Node(data) if data.control.is_atomic() => {
                return Err(BuildError::AtomicControl {
                    control: data.control.name().to_owned(),
                });
            }
            _ => {}
        }
        if self.graph.is_root(child) || child == parent || self.graph.is_ancestor(child, parent) {
            return Err(BuildError::InvalidParent);
        }
        if let Some(old) = self.graph.places[child.0].parent {
            self.graph.places[old.0].children.retain(|&c| c != child);
        }
        self.graph.places[child.0].parent = Some(parent);
        self.graph.places[parent.0].children.push(child);
        Ok(())
    }

    /// Creates an outer name.
    ///
    /// # Errors
    /// [`BuildError::DuplicateOuterName`] if the name is taken.
    pub fn outer_name(&mut self, name: impl Into<String>) -> Result<LinkIx, BuildError> {
        let name = name.into();
        if self.outer_names.contains_key(&name) {
            return Err(BuildError::DuplicateOuterName(name));
        }
        let ix = self.push_link(LinkKind::OuterName { name: name.clone() });
        self.outer_names.insert(name, ix);
        Ok(ix)
    }

    /// Creates an edge labelled `label`.
    ///
    /// # Errors
    /// [`BuildError::DuplicateEdge`] if the label is taken.
    pub fn edge(&mut self, label: impl Into<String>) -> Result<LinkIx, BuildError> {
        let label = label.into();
        if !self.edge_labels.insert(label.clone()) {
            return Err(BuildError::DuplicateEdge(label));
        }
        let id = make_edge_id(&label);
        Ok(self.push_link(LinkKind::Edge { label, id }))
    }

    /// Creates an edge with a generated label.
    pub fn fresh_edge(&mut self) -> LinkIx {
        let label = self.fresh_label("e", |b, l| b.edge_labels.contains(l));
        self.edge_labels.insert(label.clone());
        let id = make_edge_id(&label);
        self.push_link(LinkKind::Edge { label, id })
    }

    /// Creates an unlinked inner name.
    ///
    /// # Errors
    /// [`BuildError::DuplicateInnerName`] if the name is taken.
    pub fn inner_name(&mut self, name: impl Into<String>) -> Result<InnerIx, BuildError> {
        let name = name.into();
        if !self.inner_by_name.insert(name.clone()) {
            return Err(BuildError::DuplicateInnerName(name));
        }
        let ix = InnerIx(self.graph.inner_names.len());
        self.graph.inner_names.push(InnerName { name, link: None });
        Ok(ix)
    }

    /// Attaches the next free port of `node` to `link` and returns its index.
    ///
    /// # Errors
    /// [`BuildError::UnknownPlace`] when `node` is not a node,
    /// [`BuildError::UnknownLink`] for a foreign link, and
    /// [`BuildError::InvalidArityOfControl`] when every port is taken.
    pub fn connect_port(&mut self, node: PlaceIx, link: LinkIx) -> Result<usize, BuildError> {
        if link.0 >= self.graph.links.len() {
            return Err(BuildError::UnknownLink);
        }
        let Some(Place {
            kind: PlaceKind::Node(data),
            ..
        }) = self.graph.places.get_mut(node.0)
        else {
            return Err(BuildError::UnknownPlace);
        };
        let port = data.ports.len();
        if port >= data.control.arity() {
            return Err(BuildError::InvalidArityOfControl {
                control: data.control.name().to_owned(),
                arity: data.control.arity(),
            });
        }
        data.ports.push(link);
        self.graph.links[link.0].points.push(Point::Port { node, port });
        Ok(port)
    }

    /// Attaches inner name `inner` to `link`.
    ///
    /// # Errors
    /// [`BuildError::UnknownInnerName`], [`BuildError::UnknownLink`], or
    /// [`BuildError::PointAlreadyLinked`].
    pub fn connect_inner(&mut self, inner: InnerIx, link: LinkIx) -> Result<(), BuildError> {
        if link.0 >= self.graph.links.len() {
            return Err(BuildError::UnknownLink);
        }
        let entry = self
            .graph
            .inner_names
            .get_mut(inner.0)
            .ok_or(BuildError::UnknownInnerName)?;
        if entry.link.is_some() {
            return Err(BuildError::PointAlreadyLinked);
        }
        entry.link = Some(link);
        self.graph.links[link.0].points.push(Point::Inner(inner));
        Ok(())
    }

    /// Turns outer name `name` into an edge with the same label.
    ///
    /// # Errors
    /// [`BuildError::UnknownOuterName`] or [`BuildError::DuplicateEdge`].
    pub fn close_outer_name(&mut self, name: &str) -> Result<LinkIx, BuildError> {
        let ix = *self
            .outer_names
            .get(name)
            .ok_or_else(|| BuildError::UnknownOuterName(name.to_owned()))?;
        if !self.edge_labels.insert(name.to_owned()) {
            return Err(BuildError::DuplicateEdge(name.to_owned()));
        }
        self.outer_names.remove(name);
        self.graph.links[ix.0].kind = LinkKind::Edge {
            label: name.to_owned(),
            id: make_edge_id(name),
        };
        Ok(ix)
    }

    /// Validates parentage and freezes the bigraph.
    ///
    /// # Errors
    /// [`BuildError::Orphan`] when a node or site has no parent.
    pub fn finish(mut self) -> Result<Bigraph, BuildError> {
        for place in self.graph.places.iter().filter(|p| p.parent.is_none()) {
            match &place.kind {
                PlaceKind::Root { .. } => {}
                PlaceKind::Site { index } => return Err(BuildError::Orphan(format!("site {index}"))),
                PlaceKind::Node(data) => return Err(BuildError::Orphan(data.label.clone())),
            }
        }
        let graph = &mut self.graph;
        let mut roots = std::mem::take(&mut graph.roots);
        roots.sort_by_key(|&r| graph.root_index(r));
        let mut sites = std::mem::take(&mut graph.sites);
        sites.sort_by_key(|&s| graph.site_index(s));
        graph.roots = roots;
        graph.sites = sites;
        Ok(self.graph)
    }
}

impl Bigraph {
    /// Bigraph with no places and no links.
    pub fn empty(signature: &Signature) -> Self {
        Self {
            signature: signature.clone(),
            places: Vec::new(),
            roots: Vec::new(),
            sites: Vec::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            inner_names: Vec::new(),
        }
    }

    /// Elementary identity linking: inner name `x` wired to outer name `x`
    /// for every `x` in `names`.
    ///
    /// # Errors
    /// [`BuildError::DuplicateOuterName`] when `names` repeats a name.
    pub fn identity_linking<S: AsRef<str>>(signature: &Signature, names: &[S]) -> Result<Self, BuildError> {
        let mut b = BigraphBuilder::new(signature);
        for name in names {
            let outer = b.outer_name(name.as_ref())?;
            let inner = b.inner_name(name.as_ref())?;
            b.connect_inner(inner, outer)?;
        }
        b.finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::control::ControlKind;

    fn signature() -> Signature {
        Signature::builder()
            .control("Room", 1, ControlKind::Active)
            .and_then(|b| b.control("User", 1, ControlKind::Atomic))
            .unwrap()
            .finish()
    }

    #[test]
    fn duplicate_indices_and_names_are_rejected() {
        let mut b = BigraphBuilder::new(&signature());
        b.root(0).unwrap();
        assert_eq!(b.root(0), Err(BuildError::DuplicateRoot(0)));
        b.site(1).unwrap();
        assert_eq!(b.site(1), Err(BuildError::DuplicateSite(1)));
        b.outer_name("a").unwrap();
        assert_eq!(b.outer_name("a"), Err(BuildError::DuplicateOuterName("a".into())));
        b.inner_name("x").unwrap();
        assert_eq!(b.inner_name("x"), Err(BuildError::DuplicateInnerName("x".into())));
        b.node("Room", "r").unwrap();
        assert_eq!(b.node("Room", "r"), Err(BuildError::DuplicateNode("r".into())));
        assert_eq!(b.node("Nope", "n"), Err(BuildError::UnknownControl("Nope".into())));
    }

    #[test]
    fn arity_is_enforced() {
        let mut b = BigraphBuilder::new(&signature());
        let r = b.root(0).unwrap();
        let room = b.child(r, "Room").unwrap();
        let a = b.outer_name("a").unwrap();
        assert_eq!(b.connect_port(room, a), Ok(0));
        assert_eq!(
            b.connect_port(room, a),
            Err(BuildError::InvalidArityOfControl {
                control: "Room".into(),
                arity: 1
            })
        );
        assert_eq!(b.connect_port(r, a), Err(BuildError::UnknownPlace));
    }

    #[test]
    fn atomic_nodes_and_cycles_are_rejected() {
        let mut b = BigraphBuilder::new(&signature());
        let r = b.root(0).unwrap();
        let user = b.child(r, "User").unwrap();
        let room = b.node("Room", "room").unwrap();
        assert_eq!(
            b.set_parent(room, user),
            Err(BuildError::AtomicControl {
                control: "User".into()
            })
        );
        b.set_parent(room, r).unwrap();
        let inner = b.child(room, "Room").unwrap();
        assert_eq!(b.set_parent(room, inner), Err(BuildError::InvalidParent));
        assert_eq!(b.set_parent(r, room), Err(BuildError::InvalidParent));
        let s = b.site(0).unwrap();
        assert_eq!(b.set_parent(inner, s), Err(BuildError::InvalidParent));
    }

    #[test]
    fn reparenting_moves_the_child() {
        let mut b = BigraphBuilder::new(&signature());
        let r = b.root(0).unwrap();
        let a = b.child(r, "Room").unwrap();
        let c = b.child(r, "Room").unwrap();
        let moved = b.child(a, "User").unwrap();
        b.set_parent(moved, c).unwrap();
        let g = b.finish().unwrap();
        assert!(g.children(a).is_empty());
        assert_eq!(g.children(c), &[moved]);
        assert_eq!(g.parent(moved), Some(c));
    }

    #[test]
    fn orphans_fail_finish() {
        let mut b = BigraphBuilder::new(&signature());
        b.root(0).unwrap();
        b.node("Room", "lost").unwrap();
        assert_eq!(b.finish().unwrap_err(), BuildError::Orphan("lost".into()));
    }

    #[test]
    fn roots_are_sorted_by_index() {
        let mut b = BigraphBuilder::new(&signature());
        let r1 = b.root(1).unwrap();
        let r0 = b.root(0).unwrap();
        let g = b.finish().unwrap();
        assert_eq!(g.roots(), &[r0, r1]);
    }

    #[test]
    fn closing_an_outer_name_keeps_its_points() {
        let mut b = BigraphBuilder::new(&signature());
        let r = b.root(0).unwrap();
        let room = b.child(r, "Room").unwrap();
        let a = b.outer_name("a").unwrap();
        b.connect_port(room, a).unwrap();
        let closed = b.close_outer_name("a").unwrap();
        assert_eq!(closed, a);
        assert_eq!(
            b.close_outer_name("a"),
            Err(BuildError::UnknownOuterName("a".into()))
        );
        let g = b.finish().unwrap();
        assert!(g.is_edge(a));
        assert_eq!(g.nodes_of_link(a), vec![room]);
        assert!(g.outer_name("a").is_none());
    }

    #[test]
    fn identity_linking_wires_each_name_to_itself() {
        let id = Bigraph::identity_linking(&signature(), &["y0", "y1"]).unwrap();
        assert_eq!(id.inner_face().names, vec!["y0", "y1"]);
        assert_eq!(id.outer_face().names, vec!["y0", "y1"]);
        assert!(id.is_discrete());
        for inner in id.inner_names() {
            let link = id.inner_link(inner).unwrap();
            assert_eq!(id.link_name(link), id.inner_name(inner));
        }
        assert!(Bigraph::identity_linking(&signature(), &["y", "y"]).is_err());
        assert_eq!(Bigraph::empty(&signature()).node_count(), 0);
    }
}
