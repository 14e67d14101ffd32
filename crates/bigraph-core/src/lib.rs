// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bigraph-core: the bigraph data model.
//!
//! A bigraph pairs a place graph (a forest of roots, nodes and sites) with a
//! link graph (ports and inner names attached to edges and outer names).
//! Values are assembled with [`BigraphBuilder`] and are immutable once
//! finished; the matching engine only ever reads them.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod bigraph;
mod builder;
mod control;
mod ident;

pub use bigraph::{Bigraph, Face, LinkKind, NodeData, PlaceKind, Point};
pub use builder::{BigraphBuilder, BuildError};
pub use control::{Control, ControlKind, Signature, SignatureBuilder};
pub use ident::{make_edge_id, make_node_id, EdgeId, Hash, InnerIx, LinkIx, NodeId, PlaceIx};
