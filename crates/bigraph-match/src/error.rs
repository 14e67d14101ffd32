// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Matching errors.
use bigraph_core::BuildError;
use thiserror::Error;

/// Errors produced by the matching engine.
///
/// [`MatchError::IncompatibleSignature`] and [`MatchError::AgentNotGround`]
/// abort [`Matcher::match_all`](crate::Matcher::match_all). The remaining
/// variants concern a single candidate occurrence, which is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Agent and redex are defined over different signatures.
    #[error("agent and redex signatures differ")]
    IncompatibleSignature,
    /// The agent has sites or inner names.
    #[error("agent is not ground: {sites} sites, {inner_names} inner names")]
    AgentNotGround {
        /// Number of sites in the agent.
        sites: usize,
        /// Number of inner names in the agent.
        inner_names: usize,
    },
    /// Reconstructing a context or parameter failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The built context has sites below non-active nodes.
    #[error("context is not active at sites {sites:?}")]
    ContextIsNotActive {
        /// Offending site indices, ascending.
        sites: Vec<usize>,
    },
}
