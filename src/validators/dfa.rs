//! Automaton-backed validator
//!
//! Used for every content model that is neither simple nor flat mixed.
//! Validation walks the synthesized automaton one child at a time; the only
//! per-call state is the current state id.

use tracing::trace;

use crate::namespaces::Symbol;

use super::automata::Automaton;
use super::models::{Expected, FirstBadIndex};

/// A content model validated by a deterministic automaton
#[derive(Debug, Clone)]
pub struct DfaModel {
    automaton: Automaton,
}

impl DfaModel {
    /// Wrap a synthesized automaton
    pub fn new(automaton: Automaton) -> Self {
        Self { automaton }
    }

    /// The underlying automaton
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Validate a child sequence
    pub fn validate(&self, children: &[Symbol]) -> Result<(), FirstBadIndex> {
        match self.automaton.run(children) {
            Err(index) => {
                trace!(index, child = %children[index], "child rejected by content model");
                Err(FirstBadIndex(index))
            }
            Ok(state) if self.automaton.is_accepting(state) => Ok(()),
            Ok(_) => Err(FirstBadIndex(children.len())),
        }
    }

    /// What may follow a prefix that is valid so far
    pub fn expected(&self, prefix: &[Symbol]) -> Option<Expected> {
        let state = self.automaton.run(prefix).ok()?;
        let (elements, wildcards) = self.automaton.expected(state);
        Some(Expected {
            elements,
            wildcards,
            can_end: self.automaton.is_accepting(state),
        })
    }
}
