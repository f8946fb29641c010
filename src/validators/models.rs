//! Compiled content models
//!
//! A [`ContentModel`] is the validator handed to the document scanner for
//! one element type. It is one of three strategies, fixed at compile time:
//! - [`SimpleModel`] for unary/binary specs such as `a+` or `(a|b)`
//! - [`MixedModel`] for flat `(#PCDATA | a | b)*` declarations
//! - [`DfaModel`] for everything else
//!
//! All three are immutable after construction and can be shared across
//! threads; `validate` keeps its traversal state on the stack.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::namespaces::Symbol;

use super::dfa::DfaModel;
use super::mixed::MixedModel;
use super::simple::SimpleModel;
use super::specs::{ContentSpec, Term};
use super::wildcards::NamespaceConstraint;

/// Index of the first child that could not be consumed.
///
/// An index equal to the number of children means the content is a valid
/// prefix that ended too early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FirstBadIndex(pub usize);

impl FirstBadIndex {
    /// 0-based child index
    pub fn index(&self) -> usize {
        self.0
    }

    /// Whether the failure is missing trailing content rather than a wrong child
    pub fn is_incomplete(&self, len: usize) -> bool {
        self.0 == len
    }
}

impl fmt::Display for FirstBadIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content is not valid at child {}", self.0)
    }
}

/// What may come next after a valid prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expected {
    /// Declared element types that may follow
    pub elements: Vec<Symbol>,
    /// Wildcards that may consume the next child
    pub wildcards: Vec<NamespaceConstraint>,
    /// Whether the content may end here
    pub can_end: bool,
}

impl Expected {
    pub(crate) fn push_term(&mut self, term: &Term) {
        match term {
            Term::Element(symbol) => {
                if !self.elements.contains(symbol) {
                    self.elements.push(*symbol);
                }
            }
            Term::Any(constraint) => {
                if !self.wildcards.contains(constraint) {
                    self.wildcards.push(constraint.clone());
                }
            }
            Term::Text | Term::Empty => {}
        }
    }
}

/// Validation strategy of a compiled model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Direct structural check
    Simple,
    /// Flat membership test
    Mixed,
    /// Automaton walk
    Dfa,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Mixed => write!(f, "mixed"),
            Self::Dfa => write!(f, "dfa"),
        }
    }
}

/// Serializable summary of a compiled model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Selected strategy
    pub strategy: StrategyKind,
    /// Number of element/wildcard positions
    pub positions: usize,
    /// Automaton states (0 for the non-automaton strategies)
    pub states: usize,
    /// Accepting automaton states
    pub accepting_states: usize,
    /// Mixed declarations listing an element type twice
    pub has_duplicates: bool,
}

/// A compiled content model
#[derive(Debug, Clone)]
pub enum ContentModel {
    /// Unary/binary structural check
    Simple(SimpleModel),
    /// Flat mixed content
    Mixed(MixedModel),
    /// Automaton-backed
    Dfa(DfaModel),
}

impl ContentModel {
    /// Validate the ordered child elements of one element instance
    pub fn validate(&self, children: &[Symbol]) -> Result<(), FirstBadIndex> {
        match self {
            Self::Simple(model) => model.validate(children),
            Self::Mixed(model) => model.validate(children),
            Self::Dfa(model) => model.validate(children),
        }
    }

    /// Check if a child sequence is accepted
    pub fn is_valid(&self, children: &[Symbol]) -> bool {
        self.validate(children).is_ok()
    }

    /// What may follow a prefix; `None` if the prefix is already invalid
    pub fn expected(&self, prefix: &[Symbol]) -> Option<Expected> {
        match self {
            Self::Simple(model) => model.expected(prefix),
            Self::Mixed(model) => model.expected(prefix),
            Self::Dfa(model) => model.expected(prefix),
        }
    }

    /// The strategy this model was compiled to
    pub fn strategy(&self) -> StrategyKind {
        match self {
            Self::Simple(_) => StrategyKind::Simple,
            Self::Mixed(_) => StrategyKind::Mixed,
            Self::Dfa(_) => StrategyKind::Dfa,
        }
    }

    /// Summary for diagnostics
    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats {
            strategy: self.strategy(),
            positions: 0,
            states: 0,
            accepting_states: 0,
            has_duplicates: false,
        };
        match self {
            Self::Simple(model) => stats.positions = model.term_count(),
            Self::Mixed(model) => {
                stats.positions = model.alternatives().len();
                stats.has_duplicates = model.has_duplicates();
            }
            Self::Dfa(model) => {
                let automaton = model.automaton();
                stats.positions = automaton.leaves().len();
                stats.states = automaton.state_count();
                stats.accepting_states = automaton.accepting_count();
            }
        }
        stats
    }

    /// Build one of the non-automaton strategies if `spec` has their shape.
    ///
    /// Simple shapes win over mixed. Either fast path can be switched off.
    pub fn fast_path(spec: &ContentSpec, simple: bool, mixed: bool) -> Option<Self> {
        let simple_model = simple
            .then(|| SimpleModel::from_spec(spec))
            .flatten()
            .map(Self::Simple);
        simple_model.or_else(|| {
            mixed
                .then(|| MixedModel::from_spec(spec))
                .flatten()
                .map(Self::Mixed)
        })
    }
}

/// Pick the cheapest strategy able to validate a spec
pub fn select_strategy(spec: &ContentSpec, simple: bool, mixed: bool) -> StrategyKind {
    ContentModel::fast_path(spec, simple, mixed)
        .map(|model| model.strategy())
        .unwrap_or(StrategyKind::Dfa)
}
