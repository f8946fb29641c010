//! Automaton synthesis by subset construction over position sets
//!
//! States are [`StateSet`]s of positions that may consume the next child.
//! The start state is `first(root)`; the successor of a state on an input
//! class is the union of `follow[p]` over every position `p` of the state
//! whose term admits that class. Because a state already is "the set of
//! positions alive here", the result is deterministic without any further
//! NFA-to-DFA step.
//!
//! An END position is appended after the last real leaf (`Sequence(root,
//! END)`); a state is accepting iff it contains END. The empty state set is
//! the absorbing reject state and is never materialized.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, trace};

use crate::error::Result;
use crate::limits::Limits;
use crate::namespaces::{NamespaceId, Symbol};

use super::positions::{PositionAnalysis, PositionLeaf};
use super::specs::Term;
use super::statesets::{Position, StateSet};
use super::wildcards::NamespaceConstraint;

/// Dense automaton state handle; the start state is 0
pub type StateId = u32;

/// The absorbing reject state
pub const REJECT: StateId = StateId::MAX;

/// An input class of the automaton alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputClass {
    /// A declared element symbol
    Element(Symbol),
    /// Undeclared elements of a namespace some wildcard singles out
    Namespace(NamespaceId),
    /// Undeclared elements of every other namespace
    Foreign,
}

impl InputClass {
    fn admitted_by(&self, term: &Term) -> bool {
        match (term, self) {
            (Term::Element(expected), InputClass::Element(symbol)) => expected == symbol,
            (Term::Any(constraint), InputClass::Element(symbol)) => {
                constraint.is_allowed(symbol.namespace)
            }
            (Term::Any(constraint), InputClass::Namespace(namespace)) => {
                constraint.is_allowed(*namespace)
            }
            (Term::Any(constraint), InputClass::Foreign) => constraint.allows_foreign(),
            _ => false,
        }
    }
}

/// A synthesized deterministic automaton
#[derive(Debug, Clone)]
pub struct Automaton {
    leaves: Vec<PositionLeaf>,
    end: Position,
    state_sets: Vec<StateSet>,
    accepting: Vec<bool>,
    classes: Vec<InputClass>,
    element_classes: HashMap<Symbol, usize>,
    namespace_classes: HashMap<NamespaceId, usize>,
    foreign_class: Option<usize>,
    table: Vec<StateId>,
}

impl Automaton {
    /// Run subset construction over an analyzed content specification
    pub fn synthesize(analysis: &PositionAnalysis, limits: &Limits) -> Result<Self> {
        let leaves = analysis.leaves().to_vec();
        let end = leaves.len();
        let capacity = end + 1;

        // follow table extended with the END position
        let mut follow: Vec<StateSet> = (0..end)
            .map(|position| {
                let mut set = StateSet::with_capacity(capacity);
                set.union_with(analysis.follow(position));
                set
            })
            .collect();
        for position in analysis.last().iter() {
            follow[position].insert(end);
        }

        let mut start = StateSet::with_capacity(capacity);
        start.union_with(analysis.first());
        if analysis.is_nullable() {
            start.insert(end);
        }

        let mut automaton = Self {
            end,
            state_sets: Vec::new(),
            accepting: Vec::new(),
            classes: Vec::new(),
            element_classes: HashMap::new(),
            namespace_classes: HashMap::new(),
            foreign_class: None,
            table: Vec::new(),
            leaves,
        };
        automaton.build_alphabet();

        // classes admitted by each position, computed once
        let admitted: Vec<Vec<usize>> = automaton
            .leaves
            .iter()
            .map(|leaf| match &leaf.term {
                Term::Element(symbol) => automaton
                    .element_classes
                    .get(symbol)
                    .copied()
                    .into_iter()
                    .collect(),
                term => automaton
                    .classes
                    .iter()
                    .enumerate()
                    .filter(|(_, class)| class.admitted_by(term))
                    .map(|(index, _)| index)
                    .collect(),
            })
            .collect();

        let class_count = automaton.classes.len();
        let mut seen: HashMap<StateSet, StateId> = HashMap::new();
        let mut queue = VecDeque::new();
        seen.insert(start.clone(), 0);
        automaton.push_state(start);
        queue.push_back(0 as StateId);

        while let Some(state) = queue.pop_front() {
            // only the classes some live position admits; the rest stay REJECT
            let mut successors: BTreeMap<usize, StateSet> = BTreeMap::new();
            for position in automaton.state_sets[state as usize].iter() {
                if position == end {
                    continue;
                }
                for class in &admitted[position] {
                    successors
                        .entry(*class)
                        .or_insert_with(|| StateSet::with_capacity(capacity))
                        .union_with(&follow[position]);
                }
            }

            for (class, successor) in successors {
                let target = if successor.is_empty() {
                    REJECT
                } else if let Some(existing) = seen.get(&successor) {
                    *existing
                } else {
                    let id = automaton.state_sets.len() as StateId;
                    limits.check_states(id as usize + 1)?;
                    trace!(state = id, positions = ?successor, "new automaton state");
                    seen.insert(successor.clone(), id);
                    automaton.push_state(successor);
                    queue.push_back(id);
                    id
                };
                automaton.table[state as usize * class_count + class] = target;
            }
        }

        debug!(
            positions = end,
            states = automaton.state_count(),
            classes = class_count,
            "synthesized content model automaton"
        );
        Ok(automaton)
    }

    fn build_alphabet(&mut self) {
        let mut wildcards = false;
        let mut namespaces = vec![NamespaceId::NONE];
        for leaf in &self.leaves {
            match &leaf.term {
                Term::Element(symbol) => {
                    if !self.element_classes.contains_key(symbol) {
                        self.element_classes.insert(*symbol, self.classes.len());
                        self.classes.push(InputClass::Element(*symbol));
                    }
                }
                Term::Any(constraint) => {
                    wildcards = true;
                    namespaces.extend(constraint.mentioned_namespaces());
                }
                Term::Text | Term::Empty => {}
            }
        }
        if !wildcards {
            return;
        }
        for namespace in namespaces {
            if !self.namespace_classes.contains_key(&namespace) {
                self.namespace_classes.insert(namespace, self.classes.len());
                self.classes.push(InputClass::Namespace(namespace));
            }
        }
        self.foreign_class = Some(self.classes.len());
        self.classes.push(InputClass::Foreign);
    }

    fn push_state(&mut self, set: StateSet) {
        self.accepting.push(set.contains(self.end));
        self.state_sets.push(set);
        self.table
            .extend(std::iter::repeat(REJECT).take(self.classes.len()));
    }

    /// The start state
    pub fn start(&self) -> StateId {
        0
    }

    /// Input class a child symbol falls into, if the alphabet knows it
    pub fn class_of(&self, symbol: Symbol) -> Option<usize> {
        if symbol.is_sentinel() {
            return None;
        }
        if let Some(class) = self.element_classes.get(&symbol) {
            return Some(*class);
        }
        self.foreign_class?;
        self.namespace_classes
            .get(&symbol.namespace)
            .copied()
            .or(self.foreign_class)
    }

    /// Follow one child; returns [`REJECT`] on a dead end
    pub fn step(&self, state: StateId, symbol: Symbol) -> StateId {
        if state == REJECT {
            return REJECT;
        }
        match self.class_of(symbol) {
            Some(class) => self.table[state as usize * self.classes.len() + class],
            None => REJECT,
        }
    }

    /// Run a whole child sequence from the start state.
    ///
    /// Returns the final state, or the index of the child that hit the
    /// reject state.
    pub fn run(&self, children: &[Symbol]) -> std::result::Result<StateId, usize> {
        let mut state = self.start();
        for (index, child) in children.iter().enumerate() {
            state = self.step(state, *child);
            if state == REJECT {
                return Err(index);
            }
        }
        Ok(state)
    }

    /// Whether the content may end in this state
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.get(state as usize).copied().unwrap_or(false)
    }

    /// Number of states, excluding the implicit reject state
    pub fn state_count(&self) -> usize {
        self.state_sets.len()
    }

    /// Number of accepting states
    pub fn accepting_count(&self) -> usize {
        self.accepting.iter().filter(|a| **a).count()
    }

    /// Positions alive in a state (may include [`Automaton::end_position`])
    pub fn state_set(&self, state: StateId) -> &StateSet {
        &self.state_sets[state as usize]
    }

    /// The END marker position
    pub fn end_position(&self) -> Position {
        self.end
    }

    /// Positioned leaves, indexed by position
    pub fn leaves(&self) -> &[PositionLeaf] {
        &self.leaves
    }

    /// The input alphabet
    pub fn classes(&self) -> &[InputClass] {
        &self.classes
    }

    /// Non-reject transitions out of a state
    pub fn transitions(&self, state: StateId) -> impl Iterator<Item = (InputClass, StateId)> + '_ {
        let row = state as usize * self.classes.len();
        self.classes
            .iter()
            .enumerate()
            .filter_map(move |(class, input)| {
                let target = self.table[row + class];
                (target != REJECT).then_some((*input, target))
            })
    }

    /// Declared elements and wildcards that may consume the next child
    pub fn expected(&self, state: StateId) -> (Vec<Symbol>, Vec<NamespaceConstraint>) {
        let mut elements = Vec::new();
        let mut wildcards: Vec<NamespaceConstraint> = Vec::new();
        for position in self.state_set(state).iter() {
            if position == self.end {
                continue;
            }
            match &self.leaves[position].term {
                Term::Element(symbol) if !elements.contains(symbol) => elements.push(*symbol),
                Term::Any(constraint) if !wildcards.contains(constraint) => {
                    wildcards.push(constraint.clone())
                }
                _ => {}
            }
        }
        (elements, wildcards)
    }
}
