// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Controls and signatures.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::builder::BuildError;

/// Whether reactions may happen inside nodes carrying a control.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlKind {
    /// Nodes may not have children.
    Atomic,
    /// Reactions may occur inside.
    Active,
    /// Reactions may not occur inside.
    Passive,
}

/// Node type: a name, a port arity and a [`ControlKind`].
///
/// Two controls are equal when all three fields agree.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Control {
    name: String,
    arity: usize,
    kind: ControlKind,
}

impl Control {
    /// Creates a control.
    pub fn new(name: impl Into<String>, arity: usize, kind: ControlKind) -> Self {
        Self {
            name: name.into(),
            arity,
            kind,
        }
    }

    /// Control name, unique within a signature.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of ports a node of this control may use.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Activity of the control.
    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// True for [`ControlKind::Active`].
    pub fn is_active(&self) -> bool {
        self.kind == ControlKind::Active
    }

    /// True for [`ControlKind::Atomic`].
    pub fn is_atomic(&self) -> bool {
        self.kind == ControlKind::Atomic
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.arity)
    }
}

/// A finite set of controls keyed by name.
///
/// Cloning is cheap: the control table is shared. Equality compares the
/// control sets by value.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Signature {
    controls: Arc<BTreeMap<String, Control>>,
}

impl Signature {
    /// Starts a new signature.
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    /// Looks up a control by name.
    pub fn find(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    /// True when `control` is declared with the same name, arity and kind.
    pub fn contains(&self, control: &Control) -> bool {
        self.find(control.name()) == Some(control)
    }

    /// Iterates controls in name order.
    pub fn controls(&self) -> impl Iterator<Item = &Control> + '_ {
        self.controls.values()
    }

    /// Number of controls.
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// True when no control is declared.
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

/// Accumulates controls for a [`Signature`].
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    controls: BTreeMap<String, Control>,
}

impl SignatureBuilder {
    /// Declares a control.
    ///
    /// # Errors
    /// Returns [`BuildError::DuplicateControl`] if `name` was already declared.
    pub fn control(
        mut self,
        name: impl Into<String>,
        arity: usize,
        kind: ControlKind,
    ) -> Result<Self, BuildError> {
        let name = name.into();
        if self.controls.contains_key(&name) {
            return Err(BuildError::DuplicateControl(name));
        }
        self.controls
            .insert(name.clone(), Control::new(name, arity, kind));
        Ok(self)
    }

    /// Freezes the declared controls.
    pub fn finish(self) -> Signature {
        Signature {
            controls: Arc::new(self.controls),
        }
    }
}
