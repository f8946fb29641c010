//! Validator for unary and binary content models
//!
//! `a`, `a?`, `a*`, `a+`, `(a,b)` and `(a|b)` are checked directly against
//! the operator and its (at most two) terms, without an automaton.

use crate::namespaces::Symbol;

use super::models::{Expected, FirstBadIndex};
use super::specs::{ContentSpec, NodeId, SpecNode, Term};

/// Operator of a simple content model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleOp {
    /// `a`
    Leaf,
    /// `a?`
    ZeroOrOne,
    /// `a*`
    ZeroOrMore,
    /// `a+`
    OneOrMore,
    /// `(a,b)`
    Sequence,
    /// `(a|b)`
    Choice,
}

/// A content model checked structurally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleModel {
    op: SimpleOp,
    first: Term,
    second: Option<Term>,
}

impl SimpleModel {
    /// Recognize a spec that fits one of the simple shapes
    pub fn from_spec(spec: &ContentSpec) -> Option<Self> {
        let positioned = |id: NodeId| match spec.node(id) {
            SpecNode::Leaf { term, .. } if term.is_positioned() => Some(term.clone()),
            _ => None,
        };
        let (op, first, second) = match *spec.node(spec.root()) {
            SpecNode::Leaf { .. } => (SimpleOp::Leaf, positioned(spec.root())?, None),
            SpecNode::ZeroOrOne(child) => (SimpleOp::ZeroOrOne, positioned(child)?, None),
            SpecNode::ZeroOrMore(child) => (SimpleOp::ZeroOrMore, positioned(child)?, None),
            SpecNode::OneOrMore(child) => (SimpleOp::OneOrMore, positioned(child)?, None),
            SpecNode::Sequence(left, right) => {
                (SimpleOp::Sequence, positioned(left)?, Some(positioned(right)?))
            }
            SpecNode::Choice(left, right) => {
                (SimpleOp::Choice, positioned(left)?, Some(positioned(right)?))
            }
        };
        Some(Self { op, first, second })
    }

    /// The operator
    pub fn op(&self) -> SimpleOp {
        self.op
    }

    /// Number of positions (terms) in the model
    pub fn term_count(&self) -> usize {
        1 + self.second.is_some() as usize
    }

    fn second_matches(&self, symbol: Symbol) -> bool {
        self.second.as_ref().is_some_and(|t| t.matches(symbol))
    }

    /// Validate a child sequence
    pub fn validate(&self, children: &[Symbol]) -> Result<(), FirstBadIndex> {
        let len = children.len();
        match self.op {
            SimpleOp::Leaf => {
                if len == 0 {
                    return Err(FirstBadIndex(0));
                }
                if !self.first.matches(children[0]) {
                    return Err(FirstBadIndex(0));
                }
                if len > 1 {
                    return Err(FirstBadIndex(1));
                }
            }
            SimpleOp::ZeroOrOne => {
                if len >= 1 && !self.first.matches(children[0]) {
                    return Err(FirstBadIndex(0));
                }
                if len > 1 {
                    return Err(FirstBadIndex(1));
                }
            }
            SimpleOp::ZeroOrMore | SimpleOp::OneOrMore => {
                if let Some(index) = children.iter().position(|c| !self.first.matches(*c)) {
                    return Err(FirstBadIndex(index));
                }
                if self.op == SimpleOp::OneOrMore && len == 0 {
                    return Err(FirstBadIndex(0));
                }
            }
            SimpleOp::Sequence => {
                if len >= 1 && !self.first.matches(children[0]) {
                    return Err(FirstBadIndex(0));
                }
                if len >= 2 && !self.second_matches(children[1]) {
                    return Err(FirstBadIndex(1));
                }
                if len != 2 {
                    return Err(FirstBadIndex(len.min(2)));
                }
            }
            SimpleOp::Choice => {
                if len == 0 {
                    return Err(FirstBadIndex(0));
                }
                if !self.first.matches(children[0]) && !self.second_matches(children[0]) {
                    return Err(FirstBadIndex(0));
                }
                if len > 1 {
                    return Err(FirstBadIndex(1));
                }
            }
        }
        Ok(())
    }

    /// What may follow a prefix that is valid so far
    pub fn expected(&self, prefix: &[Symbol]) -> Option<Expected> {
        if let Err(bad) = self.validate(prefix) {
            if !bad.is_incomplete(prefix.len()) {
                return None;
            }
        }
        let mut expected = Expected::default();
        let len = prefix.len();
        match self.op {
            SimpleOp::Leaf | SimpleOp::ZeroOrOne => {
                if len == 0 {
                    expected.push_term(&self.first);
                }
                expected.can_end = len == 1 || self.op == SimpleOp::ZeroOrOne;
            }
            SimpleOp::ZeroOrMore | SimpleOp::OneOrMore => {
                expected.push_term(&self.first);
                expected.can_end = len > 0 || self.op == SimpleOp::ZeroOrMore;
            }
            SimpleOp::Sequence => {
                match len {
                    0 => expected.push_term(&self.first),
                    1 => {
                        if let Some(second) = &self.second {
                            expected.push_term(second);
                        }
                    }
                    _ => {}
                }
                expected.can_end = len == 2;
            }
            SimpleOp::Choice => {
                if len == 0 {
                    expected.push_term(&self.first);
                    if let Some(second) = &self.second {
                        expected.push_term(second);
                    }
                }
                expected.can_end = len == 1;
            }
        }
        Some(expected)
    }
}
