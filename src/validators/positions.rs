//! Position assignment and first/last/follow sets
//!
//! Each leaf that consumes a child element gets a dense position, assigned
//! left to right by a single depth-first walk. A forward pass over the arena
//! then computes, for every node, its nullability and first/last position sets,
//! and wires the follow table: a sequence feeds `last(left)` into
//! `first(right)`, a repetition feeds its own `last` back into its `first`.
//! No NFA graph is ever materialized.

use std::mem::Discriminant;

use crate::error::{ParseError, Result};
use crate::limits::Limits;

use super::specs::{ContentSpec, NodeId, ParticleId, SpecNode, Term};
use super::statesets::{Position, StateSet};

/// A positioned leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionLeaf {
    /// What the leaf matches (always [`Term::Element`] or [`Term::Any`])
    pub term: Term,
    /// Owning schema particle, if the front end tagged one
    pub particle: Option<ParticleId>,
    /// Arena node the position was assigned to
    pub node: NodeId,
}

#[derive(Debug, Clone)]
struct NodeSets {
    first: StateSet,
    last: StateSet,
    nullable: bool,
}

impl NodeSets {
    fn epsilon(capacity: usize) -> Self {
        Self {
            first: StateSet::with_capacity(capacity),
            last: StateSet::with_capacity(capacity),
            nullable: true,
        }
    }
}

struct Frame {
    node: NodeId,
    depth: usize,
    group: Option<Discriminant<SpecNode>>,
    wrapped: bool,
}

/// Result of the Berry-Sethi position analysis of one content specification
#[derive(Debug, Clone)]
pub struct PositionAnalysis {
    leaves: Vec<PositionLeaf>,
    node_positions: Vec<Option<Position>>,
    first: StateSet,
    last: StateSet,
    nullable: bool,
    follow: Vec<StateSet>,
}

impl PositionAnalysis {
    /// Assign positions and compute first/last/follow sets for a spec
    pub fn analyze(spec: &ContentSpec, limits: &Limits) -> Result<Self> {
        let mut analysis = Self {
            leaves: Vec::new(),
            node_positions: vec![None; spec.nodes().len()],
            first: StateSet::default(),
            last: StateSet::default(),
            nullable: true,
            follow: Vec::new(),
        };

        let visited = analysis.assign(spec, limits)?;
        limits.check_positions(analysis.leaves.len())?;

        let capacity = analysis.leaves.len();
        analysis.follow = vec![StateSet::with_capacity(capacity); capacity];
        let root = analysis.compute(spec, &visited, capacity);
        analysis.first = root.first;
        analysis.last = root.last;
        analysis.nullable = root.nullable;
        Ok(analysis)
    }

    // Pre-order walk with an explicit stack. Depth counts group nesting: a
    // chain of same-kind groups is one level, even through `?`/`*`/`+`
    // wrappers, and a wrapper only adds a level when stacked on another.
    fn assign(&mut self, spec: &ContentSpec, limits: &Limits) -> Result<Vec<bool>> {
        let mut visited = vec![false; spec.nodes().len()];
        let mut stack = vec![Frame {
            node: spec.root(),
            depth: 0,
            group: None,
            wrapped: false,
        }];
        while let Some(frame) = stack.pop() {
            let node = frame.node;
            if std::mem::replace(&mut visited[node.index()], true) {
                return Err(ParseError::new("content specification node has more than one parent")
                    .with_location(format!("node {}", node.0))
                    .into());
            }
            let spec_node = spec.node(node);
            match *spec_node {
                SpecNode::Leaf {
                    ref term,
                    particle,
                } => {
                    if term.is_positioned() {
                        self.node_positions[node.index()] = Some(self.leaves.len());
                        self.leaves.push(PositionLeaf {
                            term: term.clone(),
                            particle,
                            node,
                        });
                    }
                }
                SpecNode::Sequence(left, right) | SpecNode::Choice(left, right) => {
                    let kind = std::mem::discriminant(spec_node);
                    let depth = frame.depth + usize::from(frame.group != Some(kind));
                    limits.check_depth(depth)?;
                    // right first so the left subtree is numbered first
                    for child in [right, left] {
                        stack.push(Frame {
                            node: child,
                            depth,
                            group: Some(kind),
                            wrapped: false,
                        });
                    }
                }
                SpecNode::ZeroOrOne(child)
                | SpecNode::ZeroOrMore(child)
                | SpecNode::OneOrMore(child) => {
                    let depth = frame.depth + usize::from(frame.wrapped);
                    limits.check_depth(depth)?;
                    stack.push(Frame {
                        node: child,
                        depth,
                        group: frame.group,
                        wrapped: true,
                    });
                }
            }
        }
        Ok(visited)
    }

    // Children precede parents in the arena, so one forward scan over the
    // reachable nodes is a post-order traversal. Each child has exactly one
    // parent, so its sets are moved out once consumed.
    fn compute(&mut self, spec: &ContentSpec, visited: &[bool], capacity: usize) -> NodeSets {
        let mut sets: Vec<Option<NodeSets>> = vec![None; spec.nodes().len()];
        let take = |sets: &mut Vec<Option<NodeSets>>, id: NodeId| {
            sets[id.index()]
                .take()
                .unwrap_or_else(|| NodeSets::epsilon(capacity))
        };

        for (index, node) in spec.nodes().iter().enumerate() {
            if !visited[index] {
                continue;
            }
            let computed = match *node {
                SpecNode::Leaf { .. } => match self.node_positions[index] {
                    Some(position) => NodeSets {
                        first: StateSet::singleton(capacity, position),
                        last: StateSet::singleton(capacity, position),
                        nullable: false,
                    },
                    // epsilon and #PCDATA leaves
                    None => NodeSets::epsilon(capacity),
                },
                SpecNode::Sequence(left, right) => {
                    let left = take(&mut sets, left);
                    let right = take(&mut sets, right);
                    for position in left.last.iter() {
                        self.follow[position].union_with(&right.first);
                    }
                    let mut first = left.first;
                    if left.nullable {
                        first.union_with(&right.first);
                    }
                    let mut last = right.last;
                    if right.nullable {
                        last.union_with(&left.last);
                    }
                    NodeSets {
                        first,
                        last,
                        nullable: left.nullable && right.nullable,
                    }
                }
                SpecNode::Choice(left, right) => {
                    let mut merged = take(&mut sets, left);
                    let right = take(&mut sets, right);
                    merged.first.union_with(&right.first);
                    merged.last.union_with(&right.last);
                    merged.nullable |= right.nullable;
                    merged
                }
                SpecNode::ZeroOrOne(child) => {
                    let mut child = take(&mut sets, child);
                    child.nullable = true;
                    child
                }
                SpecNode::ZeroOrMore(child) | SpecNode::OneOrMore(child) => {
                    let mut child = take(&mut sets, child);
                    for position in child.last.iter() {
                        self.follow[position].union_with(&child.first);
                    }
                    if matches!(node, SpecNode::ZeroOrMore(_)) {
                        child.nullable = true;
                    }
                    child
                }
            };
            sets[index] = Some(computed);
        }
        take(&mut sets, spec.root())
    }

    /// Number of positioned leaves
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Positioned leaves, indexed by position
    pub fn leaves(&self) -> &[PositionLeaf] {
        &self.leaves
    }

    /// Leaf at a position
    pub fn leaf(&self, position: Position) -> &PositionLeaf {
        &self.leaves[position]
    }

    /// Position assigned to an arena node, if it is a positioned leaf
    pub fn position_of(&self, node: NodeId) -> Option<Position> {
        self.node_positions.get(node.index()).copied().flatten()
    }

    /// Positions that can match the first child
    pub fn first(&self) -> &StateSet {
        &self.first
    }

    /// Positions that can match the last child
    pub fn last(&self) -> &StateSet {
        &self.last
    }

    /// Whether the whole content may be empty
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Positions that may follow the given one
    pub fn follow(&self, position: Position) -> &StateSet {
        &self.follow[position]
    }
}
