// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Public matching entry point and the lazy match sequence.
use std::sync::Arc;

use bigraph_core::{Bigraph, PlaceIx};
use tracing::{debug, instrument, trace};

use crate::adapter::{AgentAdapter, MatchView, RedexAdapter};
use crate::build::{Built, MatchBuilder};
use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::links::LinkChecker;
use crate::resolver::{embedding_plan, Embeddings, PlanStep, Resolver, RootAssignments};
use crate::structural::{RootHit, StructuralMatcher, StructuralOutcome};

/// One occurrence of a redex in an agent, decomposed for rewriting.
///
/// Plugging `redex_identity ⊗ redex` and the parameters back into the
/// context's sites reproduces the agent up to node identities.
#[derive(Debug, Clone)]
pub struct ParametricMatch {
    context: Bigraph,
    redex: Arc<Bigraph>,
    parameters: Vec<Bigraph>,
    redex_identity: Bigraph,
    root_images: Vec<PlaceIx>,
    node_mapping: Vec<(String, String)>,
}

impl ParametricMatch {
    /// Agent with the occurrence replaced by one site per redex root.
    pub fn context(&self) -> &Bigraph {
        &self.context
    }

    /// The redex that was matched.
    pub fn redex(&self) -> &Bigraph {
        &self.redex
    }

    /// One parameter per redex site, ordered by site index.
    pub fn parameters(&self) -> &[Bigraph] {
        &self.parameters
    }

    /// Identity on the fresh names joining parameters to the context.
    pub fn redex_identity(&self) -> &Bigraph {
        &self.redex_identity
    }

    /// Agent vertex hosting each redex root, by root position. Several roots
    /// may share a host.
    pub fn root_images(&self) -> &[PlaceIx] {
        &self.root_images
    }

    /// `(redex node label, agent node label)` for every matched node.
    pub fn node_mapping(&self) -> &[(String, String)] {
        &self.node_mapping
    }
}

/// Entry point of the matching engine.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    /// Matcher with the default [`MatchConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher with an explicit configuration.
    pub fn with_config(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Finds every occurrence of `redex` in `agent`.
    ///
    /// The structural table is computed here; resolution and construction
    /// happen as the returned [`Matches`] is iterated.
    ///
    /// # Errors
    /// [`MatchError::IncompatibleSignature`] when the signatures differ and
    /// [`MatchError::AgentNotGround`] when `agent` has sites or inner names.
    #[instrument(
        skip_all,
        fields(agent_nodes = agent.node_count(), redex_nodes = redex.node_count())
    )]
    pub fn match_all<'a>(&self, agent: &'a Bigraph, redex: &Bigraph) -> Result<Matches<'a>, MatchError> {
        if agent.signature() != redex.signature() {
            return Err(MatchError::IncompatibleSignature);
        }
        let agent_view = AgentAdapter::new(agent)?;
        let redex = Arc::new(redex.clone());
        let (outcome, plan) = {
            let redex_view = RedexAdapter::new(&redex);
            let links = LinkChecker::new(agent_view, redex_view);
            let outcome = if links.idle_names_present() {
                StructuralMatcher::new(agent_view, redex_view).run(&links)
            } else {
                debug!("redex idle names missing from agent");
                StructuralOutcome::default()
            };
            (outcome, embedding_plan(redex_view))
        };
        Ok(Matches {
            agent: agent_view,
            redex,
            config: self.config.clone(),
            outcome,
            plan,
        })
    }
}

/// Finite, restartable sequence of [`ParametricMatch`] values.
///
/// Holds the structural table for one agent/redex pair. Every call to
/// [`Matches::iter`] starts a fresh lazy walk over it.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    agent: AgentAdapter<'a>,
    redex: Arc<Bigraph>,
    config: MatchConfig,
    outcome: StructuralOutcome,
    plan: Vec<PlanStep>,
}

impl<'a> Matches<'a> {
    /// Starts a new pass over the matches.
    pub fn iter(&self) -> MatchIter<'_> {
        let agent = self.agent;
        let redex = RedexAdapter::new(&self.redex);
        let root_indices: Vec<usize> = self
            .redex
            .roots()
            .iter()
            .filter_map(|&r| self.redex.root_index(r))
            .collect();
        MatchIter {
            resolver: Resolver::new(agent, redex, &self.outcome.table, &self.plan),
            builder: MatchBuilder::new(agent, redex, &self.config),
            redex: &self.redex,
            agent: agent.bigraph(),
            config: &self.config,
            assignments: RootAssignments::new(&self.outcome.hits_by_vertex, &root_indices),
            current: None,
            explored: 0,
            yielded: 0,
        }
    }

    /// Confirmed root hits, in discovery order.
    pub fn root_hits(&self) -> &[RootHit] {
        &self.outcome.confirmed
    }

    /// True when no occurrence exists; stops at the first one found.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// The redex being searched for.
    pub fn redex(&self) -> &Bigraph {
        &self.redex
    }

    /// The agent being searched.
    pub fn agent(&self) -> &'a Bigraph {
        self.agent.bigraph()
    }
}

impl<'m> IntoIterator for &'m Matches<'_> {
    type Item = ParametricMatch;
    type IntoIter = MatchIter<'m>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over [`ParametricMatch`] values.
#[derive(Debug, Clone)]
pub struct MatchIter<'m> {
    resolver: Resolver<'m>,
    builder: MatchBuilder<'m>,
    redex: &'m Arc<Bigraph>,
    agent: &'m Bigraph,
    config: &'m MatchConfig,
    assignments: RootAssignments,
    current: Option<Embeddings<'m>>,
    explored: usize,
    yielded: usize,
}

impl MatchIter<'_> {
    fn finish(&self, hosts: &[PlaceIx], mapping: &[(PlaceIx, PlaceIx)], built: Built) -> ParametricMatch {
        let label = |g: &Bigraph, p: PlaceIx| g.label(p).unwrap_or_default().to_owned();
        let signature = self.agent.signature();
        let redex_identity = Bigraph::identity_linking(signature, &built.fresh_names)
            .unwrap_or_else(|_| Bigraph::empty(signature));
        ParametricMatch {
            context: built.context,
            redex: Arc::clone(self.redex),
            parameters: built.parameters,
            redex_identity,
            root_images: hosts.to_vec(),
            node_mapping: mapping
                .iter()
                .map(|&(x, y)| (label(&**self.redex, x), label(self.agent, y)))
                .collect(),
        }
    }
}

impl Iterator for MatchIter<'_> {
    type Item = ParametricMatch;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.config.max_matches.is_some_and(|limit| self.yielded >= limit) {
                return None;
            }
            if let Some(embeddings) = self.current.as_mut() {
                if let Some(mapping) = embeddings.next() {
                    let hosts = embeddings.hosts().to_vec();
                    match self.builder.build(&hosts, &mapping) {
                        Ok(built) => {
                            self.yielded += 1;
                            return Some(self.finish(&hosts, &mapping, built));
                        }
                        Err(err) => {
                            debug!(error = %err, "skipping candidate occurrence");
                            continue;
                        }
                    }
                }
                self.current = None;
            }
            if self
                .config
                .max_root_assignments
                .is_some_and(|limit| self.explored >= limit)
            {
                debug!(explored = self.explored, "root assignment limit reached");
                return None;
            }
            let Some(hosts) = self.assignments.next() else {
                debug!(explored = self.explored, yielded = self.yielded, "root assignments exhausted");
                return None;
            };
            self.explored += 1;
            trace!(?hosts, "root assignment");
            self.current = Some(self.resolver.embeddings(hosts));
        }
    }
}
