//! Content model validators
//!
//! This module contains the compilation pipeline from content specification
//! trees to validators, and the validators themselves.

// Specification trees
pub mod particles;
pub mod specs;
pub mod wildcards;

// Position analysis and automaton synthesis
pub mod automata;
pub mod positions;
pub mod statesets;

// Validation strategies
pub mod dfa;
pub mod mixed;
pub mod models;
pub mod simple;

// Compilation and diagnostics
pub mod builders;
pub mod upa;

// Re-exports
pub use automata::{Automaton, InputClass, StateId, REJECT};
pub use builders::{
    compile, compile_with_symbols, CompileOptions, CompiledModel, GrammarKind, ModelRegistry,
    UpaMode,
};
pub use dfa::DfaModel;
pub use mixed::MixedModel;
pub use models::{select_strategy, ContentModel, Expected, FirstBadIndex, ModelStats, StrategyKind};
pub use particles::Occurs;
pub use positions::{PositionAnalysis, PositionLeaf};
pub use simple::{SimpleModel, SimpleOp};
pub use specs::{ContentSpec, ContentSpecBuilder, NodeId, ParticleId, SpecNode, Term};
pub use statesets::{Position, StateSet};
pub use upa::{check_unique_particle_attribution, ParticleRef, UpaConflict};
pub use wildcards::NamespaceConstraint;
