//! Content model compilation
//!
//! This module turns content specifications into [`ContentModel`]s. It picks
//! the validation strategy, synthesizes the automaton when needed, runs the
//! UPA check for schema grammars and keeps the compiled models of a grammar
//! in a [`ModelRegistry`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{Error, ParseError, Result, UpaErrors};
use crate::limits::Limits;
use crate::namespaces::{Symbol, SymbolTable};

use super::automata::Automaton;
use super::dfa::DfaModel;
use super::models::{ContentModel, FirstBadIndex, StrategyKind};
use super::positions::PositionAnalysis;
use super::specs::ContentSpec;
use super::upa::{check_unique_particle_attribution, UpaConflict};

/// Kind of grammar a content model is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarKind {
    /// DTD `<!ELEMENT>` declarations
    #[default]
    Dtd,
    /// XML Schema complex types
    Schema,
}

impl GrammarKind {
    /// Get as string
    pub fn as_str(&self) -> &'static str {
        match self {
            GrammarKind::Dtd => "dtd",
            GrammarKind::Schema => "schema",
        }
    }
}

impl fmt::Display for GrammarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do with Unique Particle Attribution conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpaMode {
    /// Skip the check
    Off,
    /// Collect conflicts alongside the compiled model
    #[default]
    Report,
    /// Fail compilation with [`Error::Upa`]
    Strict,
}

/// Options for content model compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Grammar kind; UPA only applies to schema grammars
    pub kind: GrammarKind,
    /// Resource limits
    pub limits: Limits,
    /// UPA handling
    pub upa: UpaMode,
    /// Allow the simple strategy
    pub simple_models: bool,
    /// Allow the flat mixed strategy
    pub mixed_models: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            kind: GrammarKind::Dtd,
            limits: Limits::default(),
            upa: UpaMode::Report,
            simple_models: true,
            mixed_models: true,
        }
    }
}

impl CompileOptions {
    /// Create options with default settings (DTD grammar)
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for schema content models
    pub fn schema() -> Self {
        Self {
            kind: GrammarKind::Schema,
            ..Self::default()
        }
    }

    /// Set the grammar kind
    pub fn with_kind(mut self, kind: GrammarKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the UPA mode
    pub fn with_upa(mut self, upa: UpaMode) -> Self {
        self.upa = upa;
        self
    }

    /// Enable or disable the simple strategy
    pub fn with_simple_models(mut self, enabled: bool) -> Self {
        self.simple_models = enabled;
        self
    }

    /// Enable or disable the flat mixed strategy
    pub fn with_mixed_models(mut self, enabled: bool) -> Self {
        self.mixed_models = enabled;
        self
    }

    /// Always build the automaton
    pub fn dfa_only(self) -> Self {
        self.with_simple_models(false).with_mixed_models(false)
    }

    fn checks_upa(&self) -> bool {
        self.kind == GrammarKind::Schema && self.upa != UpaMode::Off
    }
}

/// A compiled model with its UPA diagnostics
#[derive(Debug, Clone)]
pub struct CompiledModel {
    /// The validator
    pub model: ContentModel,
    /// UPA conflicts (schema grammars in report mode only)
    pub conflicts: Vec<UpaConflict>,
}

/// Compile a content specification
pub fn compile(spec: &ContentSpec, options: &CompileOptions) -> Result<CompiledModel> {
    compile_with_symbols(spec, options, None)
}

/// Compile a content specification, resolving names in diagnostics
pub fn compile_with_symbols(
    spec: &ContentSpec,
    options: &CompileOptions,
    table: Option<&SymbolTable>,
) -> Result<CompiledModel> {
    let fast = ContentModel::fast_path(spec, options.simple_models, options.mixed_models);

    // the UPA check needs an automaton even when a fast path validates
    let automaton = if fast.is_none() || options.checks_upa() {
        let analysis = PositionAnalysis::analyze(spec, &options.limits)?;
        Some(Automaton::synthesize(&analysis, &options.limits)?)
    } else {
        None
    };

    let conflicts = match &automaton {
        Some(automaton) if options.checks_upa() => {
            check_unique_particle_attribution(automaton, spec, table)
        }
        _ => Vec::new(),
    };
    if options.upa == UpaMode::Strict && !conflicts.is_empty() {
        return Err(Error::Upa(UpaErrors::new(conflicts)));
    }

    let model = match (fast, automaton) {
        (Some(model), _) => model,
        (None, Some(automaton)) => ContentModel::Dfa(DfaModel::new(automaton)),
        (None, None) => {
            return Err(Error::Other(
                "no automaton was synthesized for a non-simple content model".to_string(),
            ))
        }
    };

    if let ContentModel::Mixed(mixed) = &model {
        if options.kind == GrammarKind::Dtd && mixed.has_duplicates() {
            warn!(
                duplicates = mixed.duplicates().len(),
                "mixed content declaration lists an element type more than once"
            );
        }
    }

    let stats = model.stats();
    debug!(
        kind = %options.kind,
        strategy = %stats.strategy,
        positions = stats.positions,
        states = stats.states,
        conflicts = conflicts.len(),
        "compiled content model"
    );
    Ok(CompiledModel { model, conflicts })
}

/// Compiled content models of one grammar, keyed by element type
#[derive(Debug, Default)]
pub struct ModelRegistry {
    options: CompileOptions,
    symbols: Option<SymbolTable>,
    models: IndexMap<Symbol, Arc<ContentModel>>,
    conflicts: IndexMap<Symbol, Vec<UpaConflict>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Resolve element names through a symbol table in diagnostics
    pub fn with_symbols(mut self, table: SymbolTable) -> Self {
        self.symbols = Some(table);
        self
    }

    /// The compile options
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The symbol table, if one was attached
    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    fn name(&self, element: Symbol) -> String {
        match &self.symbols {
            Some(table) => table.display(element),
            None => element.to_string(),
        }
    }

    /// Compile and register the content model of an element type
    pub fn declare(&mut self, element: Symbol, spec: &ContentSpec) -> Result<Arc<ContentModel>> {
        if self.models.contains_key(&element) {
            return Err(ParseError::new(format!(
                "element type '{}' is declared more than once",
                self.name(element)
            ))
            .into());
        }

        let compiled =
            compile_with_symbols(spec, &self.options, self.symbols.as_ref()).map_err(|e| match e {
                Error::Parse(err) if err.location.is_none() => {
                    Error::Parse(err.with_location(format!("element '{}'", self.name(element))))
                }
                other => other,
            })?;

        let model = Arc::new(compiled.model);
        if !compiled.conflicts.is_empty() {
            self.conflicts.insert(element, compiled.conflicts);
        }
        self.models.insert(element, Arc::clone(&model));
        Ok(model)
    }

    /// Compiled model of an element type
    pub fn get(&self, element: Symbol) -> Option<&Arc<ContentModel>> {
        self.models.get(&element)
    }

    /// Check if an element type was declared
    pub fn contains(&self, element: Symbol) -> bool {
        self.models.contains_key(&element)
    }

    /// Number of declared element types
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if nothing was declared
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Declared element types, in declaration order
    pub fn elements(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.models.keys().copied()
    }

    /// UPA conflicts of one element type
    pub fn conflicts(&self, element: Symbol) -> &[UpaConflict] {
        self.conflicts
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every element type with UPA conflicts, in declaration order
    pub fn all_conflicts(&self) -> impl Iterator<Item = (Symbol, &[UpaConflict])> + '_ {
        self.conflicts
            .iter()
            .map(|(element, conflicts)| (*element, conflicts.as_slice()))
    }

    /// Validate the children of an element instance.
    ///
    /// Returns `None` if the element type was never declared.
    pub fn validate(
        &self,
        element: Symbol,
        children: &[Symbol],
    ) -> Option<std::result::Result<(), FirstBadIndex>> {
        self.models.get(&element).map(|model| model.validate(children))
    }

    /// Number of models per strategy
    pub fn strategy_counts(&self) -> IndexMap<StrategyKind, usize> {
        let mut counts = IndexMap::new();
        for model in self.models.values() {
            *counts.entry(model.strategy()).or_insert(0) += 1;
        }
        counts
    }

    /// JSON summary of every compiled model and its conflicts
    pub fn diagnostics(&self) -> serde_json::Value {
        let models: Vec<serde_json::Value> = self
            .models
            .iter()
            .map(|(element, model)| {
                json!({
                    "element": self.name(*element),
                    "symbol": element,
                    "stats": model.stats(),
                    "conflicts": self.conflicts(*element),
                })
            })
            .collect();
        json!({
            "kind": self.options.kind.as_str(),
            "models": models,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceId;
    use crate::validators::specs::ContentSpecBuilder;

    fn sym(local: u32) -> Symbol {
        Symbol::new(NamespaceId::NONE, local)
    }

    fn ambiguous() -> ContentSpec {
        // (x?, x)
        let mut b = ContentSpecBuilder::new();
        let first = b.particle("x", sym(0));
        let first = b.opt(first);
        let second = b.particle("x", sym(0));
        let root = b.seq(first, second);
        b.build(root).unwrap()
    }

    #[test]
    fn test_compile_options_builder() {
        let options = CompileOptions::schema()
            .with_upa(UpaMode::Strict)
            .with_limits(Limits::strict())
            .dfa_only();
        assert_eq!(options.kind, GrammarKind::Schema);
        assert_eq!(options.upa, UpaMode::Strict);
        assert_eq!(options.limits.max_states, 1_000);
        assert!(!options.simple_models);
        assert!(!options.mixed_models);
    }

    #[test]
    fn test_strategy_selection() {
        let options = CompileOptions::new();
        let simple = compile(&ContentSpecBuilder::any(), &options).unwrap();
        assert_eq!(simple.model.strategy(), StrategyKind::Simple);

        let mixed = compile(&ContentSpecBuilder::mixed(&[sym(0)]), &options).unwrap();
        assert_eq!(mixed.model.strategy(), StrategyKind::Mixed);

        let empty = compile(&ContentSpecBuilder::empty(), &options).unwrap();
        assert_eq!(empty.model.strategy(), StrategyKind::Dfa);

        let forced = compile(&ContentSpecBuilder::any(), &options.clone().dfa_only()).unwrap();
        assert_eq!(forced.model.strategy(), StrategyKind::Dfa);
    }

    #[test]
    fn test_upa_only_for_schema() {
        let spec = ambiguous();
        let dtd = compile(&spec, &CompileOptions::new()).unwrap();
        assert!(dtd.conflicts.is_empty());

        let schema = compile(&spec, &CompileOptions::schema()).unwrap();
        assert_eq!(schema.conflicts.len(), 1);
        // diagnostics never change acceptance
        assert!(schema.model.is_valid(&[sym(0)]));
        assert!(schema.model.is_valid(&[sym(0), sym(0)]));

        let off = compile(&spec, &CompileOptions::schema().with_upa(UpaMode::Off)).unwrap();
        assert!(off.conflicts.is_empty());
    }

    #[test]
    fn test_strict_upa_fails() {
        let err = compile(&ambiguous(), &CompileOptions::schema().with_upa(UpaMode::Strict))
            .unwrap_err();
        match err {
            Error::Upa(errors) => assert_eq!(errors.conflicts.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_upa_checked_for_simple_models() {
        // (x | x) is simple but still ambiguous
        let mut b = ContentSpecBuilder::new();
        let left = b.particle("x", sym(0));
        let right = b.particle("x", sym(0));
        let root = b.choice(left, right);
        let compiled = compile(&b.build(root).unwrap(), &CompileOptions::schema()).unwrap();
        assert_eq!(compiled.model.strategy(), StrategyKind::Simple);
        assert_eq!(compiled.conflicts.len(), 1);
    }

    #[test]
    fn test_state_limit_is_a_compile_error() {
        let mut b = ContentSpecBuilder::new();
        let na = b.element(sym(0));
        let nb = b.element(sym(1));
        let alt = b.choice(na, nb);
        let mut root = b.star(alt);
        let marker = b.element(sym(0));
        root = b.seq(root, marker);
        for _ in 0..6 {
            let na = b.element(sym(0));
            let nb = b.element(sym(1));
            let alt = b.choice(na, nb);
            root = b.seq(root, alt);
        }
        let spec = b.build(root).unwrap();
        let limits = Limits {
            max_states: 16,
            ..Limits::default()
        };
        let err = compile(&spec, &CompileOptions::new().with_limits(limits)).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_registry() {
        let mut registry = ModelRegistry::new(CompileOptions::new());
        registry.declare(sym(0), &ContentSpecBuilder::empty()).unwrap();
        registry
            .declare(sym(1), &ContentSpecBuilder::mixed(&[sym(0)]))
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.elements().collect::<Vec<_>>(), vec![sym(0), sym(1)]);

        assert_eq!(registry.validate(sym(0), &[]), Some(Ok(())));
        assert_eq!(registry.validate(sym(1), &[sym(1)]), Some(Err(FirstBadIndex(0))));
        assert_eq!(registry.validate(sym(9), &[]), None);

        let err = registry.declare(sym(0), &ContentSpecBuilder::any()).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_registry_diagnostics() {
        let mut table = SymbolTable::new();
        let root = table.intern_name("root").unwrap();
        let x = table.intern_name("x").unwrap();

        let mut b = ContentSpecBuilder::new();
        let first = b.particle("x", x);
        let first = b.opt(first);
        let second = b.particle("x", x);
        let top = b.seq(first, second);
        let spec = b.build(top).unwrap();

        let mut registry = ModelRegistry::new(CompileOptions::schema()).with_symbols(table);
        registry.declare(root, &spec).unwrap();
        assert_eq!(registry.conflicts(root).len(), 1);
        assert_eq!(registry.all_conflicts().count(), 1);

        let json = registry.diagnostics();
        assert_eq!(json["kind"], "schema");
        assert_eq!(json["models"][0]["element"], "root");
        assert_eq!(json["models"][0]["stats"]["strategy"], "dfa");
        assert_eq!(json["models"][0]["conflicts"].as_array().unwrap().len(), 1);
    }
}
