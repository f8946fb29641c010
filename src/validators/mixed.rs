//! Validator for flat mixed content
//!
//! `(#PCDATA | a | b | ...)*` admits any interleaving of text and the listed
//! elements, so validation is a membership test per child. Text never shows
//! up in the child list. Mixed declarations with nested groups are not
//! recognized here and compile to an automaton instead.

use std::collections::HashSet;

use crate::namespaces::Symbol;

use super::models::{Expected, FirstBadIndex};
use super::specs::{ContentSpec, NodeId, SpecNode, Term};

/// A flat mixed content model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedModel {
    alternatives: Vec<Symbol>,
    allowed: HashSet<Symbol>,
    duplicates: Vec<Symbol>,
}

impl MixedModel {
    /// Recognize `(#PCDATA | a | ...)*` or a bare `#PCDATA`
    pub fn from_spec(spec: &ContentSpec) -> Option<Self> {
        let group = match *spec.node(spec.root()) {
            SpecNode::ZeroOrMore(child) => child,
            SpecNode::Leaf {
                term: Term::Text, ..
            } => spec.root(),
            _ => return None,
        };

        let mut leaves = Vec::new();
        collect_alternatives(spec, group, &mut leaves)?;
        let mut has_text = false;
        let mut alternatives = Vec::new();
        for term in leaves {
            match term {
                Term::Text => has_text = true,
                Term::Element(symbol) => alternatives.push(*symbol),
                Term::Any(_) | Term::Empty => return None,
            }
        }
        if !has_text {
            return None;
        }
        Some(Self::new(alternatives))
    }

    /// Build from the declared alternatives, recording repeated ones
    pub fn new(alternatives: Vec<Symbol>) -> Self {
        let mut allowed = HashSet::with_capacity(alternatives.len());
        let mut duplicates = Vec::new();
        for symbol in &alternatives {
            if !allowed.insert(*symbol) && !duplicates.contains(symbol) {
                duplicates.push(*symbol);
            }
        }
        Self {
            alternatives,
            allowed,
            duplicates,
        }
    }

    /// Declared element alternatives, in declaration order
    pub fn alternatives(&self) -> &[Symbol] {
        &self.alternatives
    }

    /// Whether an element type is listed more than once
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Element types listed more than once
    pub fn duplicates(&self) -> &[Symbol] {
        &self.duplicates
    }

    /// Validate a child sequence
    pub fn validate(&self, children: &[Symbol]) -> Result<(), FirstBadIndex> {
        match children.iter().position(|c| !self.allowed.contains(c)) {
            Some(index) => Err(FirstBadIndex(index)),
            None => Ok(()),
        }
    }

    /// What may follow a prefix that is valid so far
    pub fn expected(&self, prefix: &[Symbol]) -> Option<Expected> {
        self.validate(prefix).ok()?;
        let mut expected = Expected {
            can_end: true,
            ..Expected::default()
        };
        for symbol in &self.alternatives {
            expected.push_term(&Term::Element(*symbol));
        }
        Some(expected)
    }
}

// Leaves of a tree made only of choices; None if anything else appears.
fn collect_alternatives<'a>(
    spec: &'a ContentSpec,
    node: NodeId,
    out: &mut Vec<&'a Term>,
) -> Option<()> {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match spec.node(current) {
            SpecNode::Leaf { term, .. } => out.push(term),
            SpecNode::Choice(left, right) => {
                stack.push(*right);
                stack.push(*left);
            }
            _ => return None,
        }
    }
    Some(())
}
