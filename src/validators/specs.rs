//! Content specification trees
//!
//! A [`ContentSpec`] is the declared grammar of one element type: an
//! immutable tree of leaves, sequences, choices and the `?`/`*`/`+`
//! repetition wrappers. Nodes live in an arena and refer to each other by
//! [`NodeId`]; a child always has a smaller id than its parent, so the arena
//! is acyclic by construction and a forward scan visits children first.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ParseError, Result};
use crate::limits::Limits;
use crate::namespaces::{Symbol, SymbolTable};

use super::particles::Occurs;
use super::wildcards::NamespaceConstraint;

/// Handle of a node in a [`ContentSpec`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a declared schema particle, used only for UPA diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ParticleId(pub u32);

/// What a leaf matches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named child element
    Element(Symbol),
    /// Any child element admitted by the namespace constraint
    Any(NamespaceConstraint),
    /// `#PCDATA`: text, never consumes a child element
    Text,
    /// Epsilon: matches the empty sequence only
    Empty,
}

impl Term {
    /// Whether this leaf receives a position (consumes a child element)
    pub fn is_positioned(&self) -> bool {
        matches!(self, Term::Element(_) | Term::Any(_))
    }

    /// Check if a child element is matched by this term
    pub fn matches(&self, symbol: Symbol) -> bool {
        if symbol.is_sentinel() {
            return false;
        }
        match self {
            Term::Element(expected) => *expected == symbol,
            Term::Any(constraint) => constraint.is_allowed(symbol.namespace),
            Term::Text | Term::Empty => false,
        }
    }

    /// Check if some child element is matched by both terms
    pub fn overlaps(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Element(a), Term::Element(b)) => a == b,
            (Term::Element(symbol), Term::Any(constraint))
            | (Term::Any(constraint), Term::Element(symbol)) => {
                constraint.is_allowed(symbol.namespace)
            }
            (Term::Any(a), Term::Any(b)) => !a.is_disjoint(b),
            _ => false,
        }
    }

    pub(crate) fn describe(&self, table: Option<&SymbolTable>) -> String {
        match self {
            Term::Element(symbol) => match table {
                Some(table) => table.display(*symbol),
                None => symbol.to_string(),
            },
            Term::Any(constraint) => format!("any({})", constraint),
            Term::Text => "#PCDATA".to_string(),
            Term::Empty => "EMPTY".to_string(),
        }
    }
}

impl From<Symbol> for Term {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::WILDCARD => Term::Any(NamespaceConstraint::Any),
            Symbol::PCDATA => Term::Text,
            symbol => Term::Element(symbol),
        }
    }
}

/// One node of the content specification tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecNode {
    /// A single term, optionally tagged with its declaring particle
    Leaf {
        /// What the leaf matches
        term: Term,
        /// Owning schema particle
        particle: Option<ParticleId>,
    },
    /// `(left, right)`
    Sequence(NodeId, NodeId),
    /// `(left | right)`
    Choice(NodeId, NodeId),
    /// `child?`
    ZeroOrOne(NodeId),
    /// `child*`
    ZeroOrMore(NodeId),
    /// `child+`
    OneOrMore(NodeId),
}

impl SpecNode {
    /// Child handles of this node, left to right
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        let (a, b) = match *self {
            SpecNode::Leaf { .. } => (None, None),
            SpecNode::Sequence(l, r) | SpecNode::Choice(l, r) => (Some(l), Some(r)),
            SpecNode::ZeroOrOne(c) | SpecNode::ZeroOrMore(c) | SpecNode::OneOrMore(c) => {
                (Some(c), None)
            }
        };
        a.into_iter().chain(b)
    }
}

/// An element type's declared content grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSpec {
    nodes: Vec<SpecNode>,
    root: NodeId,
    particles: Vec<String>,
}

impl ContentSpec {
    /// Assemble a spec from raw arena parts, checking that it is a tree.
    ///
    /// Every child handle must point at an earlier arena slot; anything else
    /// is a front-end bug and is rejected rather than repaired.
    pub fn from_parts(nodes: Vec<SpecNode>, root: NodeId, particles: Vec<String>) -> Result<Self> {
        if root.index() >= nodes.len() {
            return Err(ParseError::new("content specification root is out of range")
                .with_location(format!("node {}", root.0))
                .into());
        }
        for (index, node) in nodes.iter().enumerate() {
            for child in node.children() {
                if child.index() >= index {
                    return Err(ParseError::new(format!(
                        "node {} refers to node {} which is not an earlier node",
                        index, child.0
                    ))
                    .with_location(format!("node {}", index))
                    .into());
                }
            }
            if let SpecNode::Leaf {
                particle: Some(particle),
                ..
            } = node
            {
                if !particles.is_empty() && particle.0 as usize >= particles.len() {
                    return Err(ParseError::new(format!(
                        "leaf refers to undeclared particle {}",
                        particle.0
                    ))
                    .with_location(format!("node {}", index))
                    .into());
                }
            }
        }
        Ok(Self {
            nodes,
            root,
            particles,
        })
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> &SpecNode {
        &self.nodes[id.index()]
    }

    /// All arena nodes, children before parents
    pub fn nodes(&self) -> &[SpecNode] {
        &self.nodes
    }

    /// Label of a declared particle
    pub fn particle_label(&self, particle: ParticleId) -> String {
        self.particles
            .get(particle.0 as usize)
            .cloned()
            .unwrap_or_else(|| format!("particle {}", particle.0))
    }

    /// Render with element names resolved through a symbol table
    pub fn display_with<'a>(&'a self, table: &'a SymbolTable) -> SpecDisplay<'a> {
        SpecDisplay {
            spec: self,
            table: Some(table),
        }
    }

    fn render(&self, id: NodeId, table: Option<&SymbolTable>, out: &mut String) {
        match self.node(id) {
            SpecNode::Leaf { term, .. } => out.push_str(&term.describe(table)),
            SpecNode::Sequence(..) | SpecNode::Choice(..) => {
                let separator = if matches!(self.node(id), SpecNode::Sequence(..)) {
                    ","
                } else {
                    "|"
                };
                let mut items = Vec::new();
                self.flatten(id, &mut items);
                out.push('(');
                for (i, item) in items.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(separator);
                    }
                    self.render(item, table, out);
                }
                out.push(')');
            }
            SpecNode::ZeroOrOne(child) | SpecNode::ZeroOrMore(child) | SpecNode::OneOrMore(child) => {
                let op = match self.node(id) {
                    SpecNode::ZeroOrOne(_) => '?',
                    SpecNode::ZeroOrMore(_) => '*',
                    _ => '+',
                };
                match self.node(*child) {
                    SpecNode::ZeroOrOne(_) | SpecNode::ZeroOrMore(_) | SpecNode::OneOrMore(_) => {
                        out.push('(');
                        self.render(*child, table, out);
                        out.push(')');
                    }
                    _ => self.render(*child, table, out),
                }
                out.push(op);
            }
        }
    }

    // Collect the operands of a chain of same-kind binary nodes.
    fn flatten(&self, id: NodeId, items: &mut Vec<NodeId>) {
        let kind = std::mem::discriminant(self.node(id));
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match *self.node(current) {
                SpecNode::Sequence(l, r) | SpecNode::Choice(l, r)
                    if std::mem::discriminant(self.node(current)) == kind =>
                {
                    stack.push(r);
                    stack.push(l);
                }
                _ => items.push(current),
            }
        }
    }
}

impl fmt::Display for ContentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SpecDisplay {
            spec: self,
            table: None,
        }
        .fmt(f)
    }
}

/// [`Display`](fmt::Display) adapter returned by [`ContentSpec::display_with`]
pub struct SpecDisplay<'a> {
    spec: &'a ContentSpec,
    table: Option<&'a SymbolTable>,
}

impl fmt::Display for SpecDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.spec.render(self.spec.root, self.table, &mut out);
        f.write_str(&out)
    }
}

/// Incremental builder for [`ContentSpec`] trees
#[derive(Debug, Clone, Default)]
pub struct ContentSpecBuilder {
    nodes: Vec<SpecNode>,
    particles: Vec<String>,
    limits: Limits,
}

impl ContentSpecBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom limits for occurrence expansion
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    fn push(&mut self, node: SpecNode) -> NodeId {
        self.nodes.push(node);
        NodeId((self.nodes.len() - 1) as u32)
    }

    /// Add a leaf
    pub fn leaf(&mut self, term: impl Into<Term>) -> NodeId {
        self.push(SpecNode::Leaf {
            term: term.into(),
            particle: None,
        })
    }

    /// Add a named element leaf
    pub fn element(&mut self, symbol: Symbol) -> NodeId {
        self.leaf(symbol)
    }

    /// Add a wildcard leaf
    pub fn wildcard(&mut self, constraint: NamespaceConstraint) -> NodeId {
        self.leaf(Term::Any(constraint))
    }

    /// Add a `#PCDATA` leaf
    pub fn pcdata(&mut self) -> NodeId {
        self.leaf(Term::Text)
    }

    /// Add an epsilon leaf
    pub fn epsilon(&mut self) -> NodeId {
        self.leaf(Term::Empty)
    }

    /// Declare a schema particle and add its leaf
    pub fn particle(&mut self, label: impl Into<String>, term: impl Into<Term>) -> NodeId {
        let particle = ParticleId(self.particles.len() as u32);
        self.particles.push(label.into());
        self.push(SpecNode::Leaf {
            term: term.into(),
            particle: Some(particle),
        })
    }

    /// `(left, right)`
    pub fn seq(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(SpecNode::Sequence(left, right))
    }

    /// `(left | right)`
    pub fn choice(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(SpecNode::Choice(left, right))
    }

    /// `child?`
    pub fn opt(&mut self, child: NodeId) -> NodeId {
        self.push(SpecNode::ZeroOrOne(child))
    }

    /// `child*`
    pub fn star(&mut self, child: NodeId) -> NodeId {
        self.push(SpecNode::ZeroOrMore(child))
    }

    /// `child+`
    pub fn plus(&mut self, child: NodeId) -> NodeId {
        self.push(SpecNode::OneOrMore(child))
    }

    /// `(a, b, c, ...)`; an empty list is epsilon
    pub fn sequence_of(&mut self, items: &[NodeId]) -> NodeId {
        self.fold(items, Self::seq)
    }

    /// `(a | b | c | ...)`; an empty list is epsilon
    pub fn choice_of(&mut self, items: &[NodeId]) -> NodeId {
        self.fold(items, Self::choice)
    }

    fn fold(&mut self, items: &[NodeId], join: fn(&mut Self, NodeId, NodeId) -> NodeId) -> NodeId {
        match items.split_first() {
            None => self.epsilon(),
            Some((first, rest)) => rest.iter().fold(*first, |acc, item| join(self, acc, *item)),
        }
    }

    /// Wrap a subtree in arbitrary `minOccurs`/`maxOccurs` bounds.
    ///
    /// Bounded repetitions become nested optionals, `(a,(a,a?)?)?`, so that
    /// the copies never compete for the same child.
    pub fn repeat(&mut self, node: NodeId, occurs: Occurs) -> Result<NodeId> {
        if !occurs.is_valid() {
            return Err(ParseError::new(format!(
                "minOccurs {} is greater than maxOccurs {:?}",
                occurs.min, occurs.max
            ))
            .with_location(format!("node {}", node.0))
            .into());
        }
        self.limits
            .check_occurs_expansion(occurs.expanded_copies() * self.leaf_count(node))?;

        let optional_tail = |b: &mut Self, count: u32| -> Option<NodeId> {
            let mut tail: Option<NodeId> = None;
            for _ in 0..count {
                let copy = b.copy_subtree(node);
                let body = match tail {
                    Some(inner) => b.seq(copy, inner),
                    None => copy,
                };
                tail = Some(b.opt(body));
            }
            tail
        };

        let built = match (occurs.min, occurs.max) {
            (_, Some(0)) => self.epsilon(),
            (1, Some(1)) => node,
            (0, Some(1)) => self.opt(node),
            (0, None) => self.star(node),
            (1, None) => self.plus(node),
            (min, max) => {
                let mut parts = vec![node];
                for _ in 1..min.max(1) {
                    parts.push(self.copy_subtree(node));
                }
                match max {
                    None => {
                        // the last mandatory copy carries the loop
                        if let Some(last) = parts.pop() {
                            let looped = self.plus(last);
                            parts.push(looped);
                        }
                    }
                    Some(max) if min == 0 => {
                        // node itself heads the optional chain
                        parts.clear();
                        let inner = optional_tail(self, max - 1);
                        let body = match inner {
                            Some(inner) => self.seq(node, inner),
                            None => node,
                        };
                        parts.push(self.opt(body));
                    }
                    Some(max) => {
                        if let Some(tail) = optional_tail(self, max - min) {
                            parts.push(tail);
                        }
                    }
                }
                self.sequence_of(&parts)
            }
        };
        Ok(built)
    }

    fn leaf_count(&self, node: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match &self.nodes[current.index()] {
                SpecNode::Leaf { .. } => count += 1,
                other => stack.extend(other.children()),
            }
        }
        count
    }

    // Copies keep the particle of their original. An untagged positioned
    // leaf is tagged on its first copy, so the original and all its copies
    // are attributed to one particle.
    fn copy_subtree(&mut self, node: NodeId) -> NodeId {
        let mut members = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            members.push(current);
            stack.extend(self.nodes[current.index()].children());
        }
        // ascending ids: children are copied before their parents
        members.sort_unstable();
        members.dedup();

        let mut copies: HashMap<NodeId, NodeId> = HashMap::with_capacity(members.len());
        for original in members {
            let copied = match self.nodes[original.index()].clone() {
                SpecNode::Leaf {
                    term,
                    particle: None,
                } if term.is_positioned() => {
                    let particle = Some(ParticleId(self.particles.len() as u32));
                    self.particles.push(term.describe(None));
                    self.nodes[original.index()] = SpecNode::Leaf {
                        term: term.clone(),
                        particle,
                    };
                    SpecNode::Leaf { term, particle }
                }
                leaf @ SpecNode::Leaf { .. } => leaf,
                SpecNode::Sequence(l, r) => SpecNode::Sequence(copies[&l], copies[&r]),
                SpecNode::Choice(l, r) => SpecNode::Choice(copies[&l], copies[&r]),
                SpecNode::ZeroOrOne(c) => SpecNode::ZeroOrOne(copies[&c]),
                SpecNode::ZeroOrMore(c) => SpecNode::ZeroOrMore(copies[&c]),
                SpecNode::OneOrMore(c) => SpecNode::OneOrMore(copies[&c]),
            };
            let id = self.push(copied);
            copies.insert(original, id);
        }
        copies[&node]
    }

    /// Finish the tree rooted at `root`
    pub fn build(self, root: NodeId) -> Result<ContentSpec> {
        ContentSpec::from_parts(self.nodes, root, self.particles)
    }

    /// `EMPTY` content: no children at all
    pub fn empty() -> ContentSpec {
        let mut b = Self::new();
        let root = b.epsilon();
        ContentSpec {
            nodes: b.nodes,
            root,
            particles: b.particles,
        }
    }

    /// `ANY` content: any sequence of child elements
    pub fn any() -> ContentSpec {
        let mut b = Self::new();
        let wildcard = b.leaf(Symbol::WILDCARD);
        let root = b.star(wildcard);
        ContentSpec {
            nodes: b.nodes,
            root,
            particles: b.particles,
        }
    }

    /// Mixed content `(#PCDATA | a | b | ...)*`, or `(#PCDATA)` when empty
    pub fn mixed(alternatives: &[Symbol]) -> ContentSpec {
        let mut b = Self::new();
        let mut items = vec![b.pcdata()];
        for symbol in alternatives {
            items.push(b.element(*symbol));
        }
        let group = b.choice_of(&items);
        let root = if alternatives.is_empty() {
            group
        } else {
            b.star(group)
        };
        ContentSpec {
            nodes: b.nodes,
            root,
            particles: b.particles,
        }
    }
}
