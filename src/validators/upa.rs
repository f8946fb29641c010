//! Unique Particle Attribution check
//!
//! Schema content models must be deterministic at the particle level: in
//! every automaton state, a child element may be matched by at most one
//! particle. The check groups the live positions of each state by owning
//! particle and tests every pair of distinct particles for an overlapping
//! term. Positions copied from one particle by occurrence expansion share
//! its id, so `a{2,3}` does not conflict with itself.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#cos-nonambig

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::namespaces::SymbolTable;

use super::automata::{Automaton, StateId};
use super::specs::{ContentSpec, ParticleId, Term};
use super::statesets::Position;

/// The particle a position is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParticleRef {
    /// A particle declared by the front end
    Declared(ParticleId),
    /// An untagged leaf, identified by its position
    Position(Position),
}

impl fmt::Display for ParticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared(id) => write!(f, "particle {}", id.0),
            Self::Position(position) => write!(f, "position {}", position),
        }
    }
}

/// Two particles competing for the same child in one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpaConflict {
    /// First automaton state where the ambiguity shows up
    pub state: StateId,
    /// The particle declared first
    pub first: ParticleRef,
    /// The particle declared later
    pub second: ParticleRef,
    /// Human-readable description
    pub description: String,
}

impl fmt::Display for UpaConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

struct Candidate<'a> {
    particle: ParticleRef,
    term: &'a Term,
}

/// Report every pair of distinct particles that can both match some child
/// element in a reachable state.
///
/// Each unordered pair is reported once, at the lowest-numbered state where
/// it occurs.
pub fn check_unique_particle_attribution(
    automaton: &Automaton,
    spec: &ContentSpec,
    table: Option<&SymbolTable>,
) -> Vec<UpaConflict> {
    let leaves = automaton.leaves();
    let end = automaton.end_position();
    let mut reported: BTreeSet<(ParticleRef, ParticleRef)> = BTreeSet::new();
    let mut conflicts = Vec::new();

    for state in 0..automaton.state_count() as StateId {
        // one representative term per (particle, term) pair
        let mut candidates: Vec<Candidate<'_>> = Vec::new();
        for position in automaton.state_set(state).iter() {
            if position == end {
                continue;
            }
            let leaf = &leaves[position];
            let particle = match leaf.particle {
                Some(id) => ParticleRef::Declared(id),
                None => ParticleRef::Position(position),
            };
            if !candidates
                .iter()
                .any(|c| c.particle == particle && *c.term == leaf.term)
            {
                candidates.push(Candidate {
                    particle,
                    term: &leaf.term,
                });
            }
        }

        for (i, left) in candidates.iter().enumerate() {
            for right in &candidates[i + 1..] {
                if left.particle == right.particle || !left.term.overlaps(right.term) {
                    continue;
                }
                let pair = if left.particle <= right.particle {
                    (left.particle, right.particle)
                } else {
                    (right.particle, left.particle)
                };
                if !reported.insert(pair) {
                    continue;
                }
                let description = format!(
                    "particles {} and {} both match {} (state {})",
                    label(spec, left, table),
                    label(spec, right, table),
                    overlap(left.term, right.term, table),
                    state
                );
                warn!(state, first = %pair.0, second = %pair.1, "{}", description);
                conflicts.push(UpaConflict {
                    state,
                    first: pair.0,
                    second: pair.1,
                    description,
                });
            }
        }
    }
    conflicts
}

fn label(spec: &ContentSpec, candidate: &Candidate<'_>, table: Option<&SymbolTable>) -> String {
    match candidate.particle {
        ParticleRef::Declared(id) => format!("'{}'", spec.particle_label(id)),
        ParticleRef::Position(position) => {
            format!("'{}' at position {}", candidate.term.describe(table), position)
        }
    }
}

fn overlap(left: &Term, right: &Term, table: Option<&SymbolTable>) -> String {
    match (left, right) {
        (Term::Element(_), _) => format!("element '{}'", left.describe(table)),
        (_, Term::Element(_)) => format!("element '{}'", right.describe(table)),
        _ => format!(
            "elements admitted by both {} and {}",
            left.describe(table),
            right.describe(table)
        ),
    }
}
