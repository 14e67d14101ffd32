// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifiers for bigraph entities.
//!
//! Two families live here. Content ids ([`NodeId`], [`EdgeId`]) are stable
//! 256-bit hashes derived from identity labels, so a node keeps the same id
//! when it is copied into a context or a parameter. Arena indices
//! ([`PlaceIx`], [`LinkIx`], [`InnerIx`]) address entries inside one
//! [`Bigraph`](crate::Bigraph) and carry no meaning across bigraphs.
use blake3::Hasher;

/// Canonical 256-bit hash used for content ids and digests.
pub type Hash = [u8; 32];

/// Strongly typed identifier for a node, derived from its identity label.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub Hash);

impl NodeId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Strongly typed identifier for an edge, derived from its identity label.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub Hash);

impl EdgeId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Produces a stable, domain-separated node identifier (prefix `b"node:"`).
pub fn make_node_id(label: &str) -> NodeId {
    let mut hasher = Hasher::new();
    hasher.update(b"node:");
    hasher.update(label.as_bytes());
    NodeId(hasher.finalize().into())
}

/// Produces a stable, domain-separated edge identifier (prefix `b"edge:"`).
pub fn make_edge_id(label: &str) -> EdgeId {
    let mut hasher = Hasher::new();
    hasher.update(b"edge:");
    hasher.update(label.as_bytes());
    EdgeId(hasher.finalize().into())
}

/// Index of a place (root, node or site) inside one bigraph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PlaceIx(pub(crate) usize);

impl PlaceIx {
    /// Position of this place in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a link (edge or outer name) inside one bigraph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LinkIx(pub(crate) usize);

impl LinkIx {
    /// Position of this link in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an inner name inside one bigraph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct InnerIx(pub(crate) usize);

impl InnerIx {
    /// Position of this inner name in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}
