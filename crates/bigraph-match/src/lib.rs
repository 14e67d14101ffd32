// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bigraph-match: finds every occurrence of a redex bigraph inside a ground
//! agent bigraph.
//!
//! Matching runs in three phases:
//! 1. a bottom-up structural pass fills a table of which redex vertices each
//!    agent subtree can explain, driven by maximum bipartite matchings;
//! 2. root hits from that table are combined into root assignments and
//!    resolved into injective node mappings that respect the link graph;
//! 3. every accepted mapping is split into a context, the redex, and one
//!    parameter per redex site.
//!
//! Phases 2 and 3 are lazy: [`Matches`] yields [`ParametricMatch`] values on
//! demand and can be walked again from the start.
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
    clippy::use_self,
    clippy::missing_errors_doc
)]

mod adapter;
mod bipartite;
mod build;
mod config;
mod engine;
mod error;
mod links;
mod resolver;
mod structural;

pub use adapter::{AgentAdapter, MatchView, PortLink, RedexAdapter};
pub use bipartite::{controls_are_compatible, BipartiteGraph, BipartiteMatcher, CompatibilityMode, Matching};
pub use build::{Built, MatchBuilder, NameSupply};
pub use config::MatchConfig;
pub use engine::{MatchIter, Matcher, Matches, ParametricMatch};
pub use error::MatchError;
pub use links::LinkChecker;
pub use resolver::{embedding_plan, Anchor, Embeddings, PlanStep, Resolver, RootAssignments};
pub use structural::{RootHit, StructuralMatcher, StructuralOutcome, StructuralTable};
