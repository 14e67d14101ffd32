// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Matcher configuration.

/// Tunables for one [`Matcher`](crate::Matcher).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    /// Prefix for fresh outer names minted on parameter boundaries.
    pub fresh_name_prefix: String,
    /// Reject candidates whose context has a site below a non-active node.
    pub require_active_context: bool,
    /// Stop after this many matches.
    pub max_matches: Option<usize>,
    /// Stop after exploring this many root-level assignments.
    pub max_root_assignments: Option<usize>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fresh_name_prefix: "y".to_owned(),
            require_active_context: true,
            max_matches: None,
            max_root_assignments: None,
        }
    }
}

impl MatchConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets [`Self::fresh_name_prefix`].
    pub fn with_fresh_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fresh_name_prefix = prefix.into();
        self
    }

    /// Sets [`Self::require_active_context`].
    pub fn with_require_active_context(mut self, require: bool) -> Self {
        self.require_active_context = require;
        self
    }

    /// Sets [`Self::max_matches`].
    pub fn with_max_matches(mut self, limit: usize) -> Self {
        self.max_matches = Some(limit);
        self
    }

    /// Sets [`Self::max_root_assignments`].
    pub fn with_max_root_assignments(mut self, limit: usize) -> Self {
        self.max_root_assignments = Some(limit);
        self
    }
}
