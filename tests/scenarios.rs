//! End-to-end content model scenarios
//!
//! Each test interns real element names, builds the content specification
//! the way a declaration parser would, compiles it and validates child
//! sequences.

use pretty_assertions::assert_eq;

use xmlcontent::namespaces::{Symbol, SymbolTable};
use xmlcontent::validators::{
    compile, compile_with_symbols, CompileOptions, ContentSpecBuilder, FirstBadIndex,
    NamespaceConstraint, Occurs, ParticleId, ParticleRef, StrategyKind, UpaMode,
};
use xmlcontent::Error;

fn names(table: &mut SymbolTable, list: &[&str]) -> Vec<Symbol> {
    list.iter()
        .map(|name| table.intern_name(name).unwrap())
        .collect()
}

#[test]
fn test_sequence_of_three() {
    // (a,b,c)
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["a", "b", "c"]);
    let mut b = ContentSpecBuilder::new();
    let leaves: Vec<_> = s.iter().map(|sym| b.element(*sym)).collect();
    let root = b.sequence_of(&leaves);
    let spec = b.build(root).unwrap();
    assert_eq!(spec.display_with(&table).to_string(), "(a,b,c)");

    let model = compile(&spec, &CompileOptions::new()).unwrap().model;
    assert_eq!(model.strategy(), StrategyKind::Dfa);
    assert_eq!(model.validate(&[s[0], s[1], s[2]]), Ok(()));
    assert_eq!(model.validate(&[s[0], s[2], s[1]]), Err(FirstBadIndex(1)));
}

#[test]
fn test_repeated_choice() {
    // (a|b)*
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["a", "b", "c"]);
    let mut b = ContentSpecBuilder::new();
    let na = b.element(s[0]);
    let nb = b.element(s[1]);
    let alt = b.choice(na, nb);
    let root = b.star(alt);
    let spec = b.build(root).unwrap();

    let model = compile(&spec, &CompileOptions::new()).unwrap().model;
    assert_eq!(model.strategy(), StrategyKind::Dfa);
    assert_eq!(model.validate(&[s[0], s[0], s[1], s[0]]), Ok(()));
    assert_eq!(model.validate(&[s[0], s[2]]), Err(FirstBadIndex(1)));
    assert_eq!(model.validate(&[]), Ok(()));
}

#[test]
fn test_optional_and_required_repetition() {
    // a,b?,c+
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["a", "b", "c"]);
    let mut b = ContentSpecBuilder::new();
    let na = b.element(s[0]);
    let nb = b.element(s[1]);
    let nb = b.opt(nb);
    let nc = b.element(s[2]);
    let nc = b.plus(nc);
    let root = b.sequence_of(&[na, nb, nc]);
    let spec = b.build(root).unwrap();
    assert_eq!(spec.display_with(&table).to_string(), "(a,b?,c+)");

    let model = compile(&spec, &CompileOptions::new()).unwrap().model;
    assert_eq!(model.validate(&[s[0], s[2]]), Ok(()));
    assert_eq!(model.validate(&[s[0], s[1], s[2], s[2]]), Ok(()));

    let bad = model.validate(&[s[0], s[1]]).unwrap_err();
    assert_eq!(bad, FirstBadIndex(2));
    assert!(bad.is_incomplete(2));

    let expected = model.expected(&[s[0], s[1]]).unwrap();
    assert_eq!(expected.elements, vec![s[2]]);
    assert!(!expected.can_end);
}

#[test]
fn test_mixed_content() {
    // (#PCDATA|x|y)*
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["x", "y", "z"]);
    let spec = ContentSpecBuilder::mixed(&s[..2]);
    assert_eq!(spec.display_with(&table).to_string(), "(#PCDATA|x|y)*");

    let model = compile(&spec, &CompileOptions::new()).unwrap().model;
    assert_eq!(model.strategy(), StrategyKind::Mixed);
    assert_eq!(model.validate(&[s[0], s[1], s[0]]), Ok(()));
    assert_eq!(model.validate(&[s[0], s[2]]), Err(FirstBadIndex(1)));
}

#[test]
fn test_upa_conflict_in_nested_choice() {
    // ((x|y)?, x, z): after nothing, the x of the choice and the x of the
    // sequence compete for the same child
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["x", "y", "z"]);
    let mut b = ContentSpecBuilder::new();
    let x1 = b.particle("x", s[0]);
    let y = b.particle("y", s[1]);
    let alt = b.choice(x1, y);
    let alt = b.opt(alt);
    let x2 = b.particle("x", s[0]);
    let z = b.particle("z", s[2]);
    let tail = b.seq(x2, z);
    let root = b.seq(alt, tail);
    let spec = b.build(root).unwrap();

    let compiled = compile_with_symbols(&spec, &CompileOptions::schema(), Some(&table)).unwrap();
    assert_eq!(compiled.conflicts.len(), 1);
    let conflict = &compiled.conflicts[0];
    assert_eq!(conflict.first, ParticleRef::Declared(ParticleId(0)));
    assert_eq!(conflict.second, ParticleRef::Declared(ParticleId(2)));
    assert!(conflict.description.contains("element 'x'"));

    // validation behavior is unaffected by the diagnostic
    assert!(compiled.model.is_valid(&[s[0], s[0], s[2]]));
    assert!(compiled.model.is_valid(&[s[0], s[2]]));

    let strict = compile(&spec, &CompileOptions::schema().with_upa(UpaMode::Strict));
    assert!(matches!(strict, Err(Error::Upa(_))));
}

#[test]
fn test_empty_and_any() {
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["a", "{urn:other}b"]);

    let empty = compile(&ContentSpecBuilder::empty(), &CompileOptions::new())
        .unwrap()
        .model;
    assert_eq!(empty.validate(&[]), Ok(()));
    assert_eq!(empty.validate(&[s[0]]), Err(FirstBadIndex(0)));

    let any = compile(&ContentSpecBuilder::any(), &CompileOptions::new())
        .unwrap()
        .model;
    assert_eq!(any.validate(&[]), Ok(()));
    assert_eq!(any.validate(&[s[0], s[1], s[0]]), Ok(()));
}

#[test]
fn test_other_namespace_wildcard() {
    // (a, ##other*) in target namespace urn:t
    let mut table = SymbolTable::new();
    let a = table.intern(Some("urn:t"), "a").unwrap();
    let local = table.intern(None, "local").unwrap();
    let same = table.intern(Some("urn:t"), "b").unwrap();
    let foreign = table.intern(Some("urn:f"), "c").unwrap();

    let constraint = NamespaceConstraint::from_namespace_attr("##other", Some("urn:t"), &mut table)
        .unwrap();
    let mut b = ContentSpecBuilder::new();
    let na = b.element(a);
    let any = b.wildcard(constraint);
    let any = b.star(any);
    let root = b.seq(na, any);
    let model = compile(&b.build(root).unwrap(), &CompileOptions::schema())
        .unwrap()
        .model;

    assert_eq!(model.validate(&[a, foreign, foreign]), Ok(()));
    assert_eq!(model.validate(&[a, same]), Err(FirstBadIndex(1)));
    assert_eq!(model.validate(&[a, local]), Err(FirstBadIndex(1)));
    // a namespace no declaration has ever seen is foreign too
    let unseen = table.intern(Some("urn:unseen"), "d").unwrap();
    assert_eq!(model.validate(&[a, unseen]), Ok(()));
}

#[test]
fn test_occurrence_bounds() {
    // item{2,4}
    let mut table = SymbolTable::new();
    let item = table.intern_name("item").unwrap();
    let mut b = ContentSpecBuilder::new();
    let leaf = b.particle("item", item);
    let root = b.repeat(leaf, Occurs::new(2, Some(4))).unwrap();
    let spec = b.build(root).unwrap();

    let compiled = compile(&spec, &CompileOptions::schema()).unwrap();
    assert!(compiled.conflicts.is_empty());
    let model = compiled.model;
    assert_eq!(model.validate(&[item]), Err(FirstBadIndex(1)));
    for count in 2..=4 {
        assert_eq!(model.validate(&vec![item; count]), Ok(()));
    }
    assert_eq!(model.validate(&[item; 5]), Err(FirstBadIndex(4)));
}

#[test]
fn test_pcdata_in_nested_group_uses_automaton() {
    // (#PCDATA | (a, b))*
    let mut table = SymbolTable::new();
    let s = names(&mut table, &["a", "b"]);
    let mut b = ContentSpecBuilder::new();
    let text = b.pcdata();
    let na = b.element(s[0]);
    let nb = b.element(s[1]);
    let pair = b.seq(na, nb);
    let alt = b.choice(text, pair);
    let root = b.star(alt);
    let model = compile(&b.build(root).unwrap(), &CompileOptions::new())
        .unwrap()
        .model;

    assert_eq!(model.strategy(), StrategyKind::Dfa);
    assert_eq!(model.validate(&[]), Ok(()));
    assert_eq!(model.validate(&[s[0], s[1], s[0], s[1]]), Ok(()));
    assert_eq!(model.validate(&[s[0], s[0]]), Err(FirstBadIndex(1)));
    assert_eq!(model.validate(&[s[0]]), Err(FirstBadIndex(1)));
}

#[test]
fn test_wide_sequence_under_default_limits() {
    // (e0, e1, ..., e299)
    let mut table = SymbolTable::new();
    let elements: Vec<Symbol> = (0..300)
        .map(|i| table.intern_name(&format!("e{}", i)).unwrap())
        .collect();
    let mut b = ContentSpecBuilder::new();
    let leaves: Vec<_> = elements.iter().map(|sym| b.element(*sym)).collect();
    let root = b.sequence_of(&leaves);
    let model = compile(&b.build(root).unwrap(), &CompileOptions::new())
        .unwrap()
        .model;

    assert_eq!(model.strategy(), StrategyKind::Dfa);
    assert_eq!(model.validate(&elements), Ok(()));
    assert_eq!(model.validate(&elements[..299]), Err(FirstBadIndex(299)));
    let mut swapped = elements.clone();
    swapped.swap(10, 11);
    assert_eq!(model.validate(&swapped), Err(FirstBadIndex(10)));
}

#[test]
fn test_large_bound_under_default_limits() {
    // a{0,200}
    let mut table = SymbolTable::new();
    let a = table.intern_name("a").unwrap();
    let mut b = ContentSpecBuilder::new();
    let leaf = b.element(a);
    let root = b.repeat(leaf, Occurs::new(0, Some(200))).unwrap();
    let compiled = compile(&b.build(root).unwrap(), &CompileOptions::schema()).unwrap();

    assert!(compiled.conflicts.is_empty());
    let model = compiled.model;
    assert_eq!(model.validate(&[]), Ok(()));
    assert_eq!(model.validate(&vec![a; 200]), Ok(()));
    assert_eq!(model.validate(&vec![a; 201]), Err(FirstBadIndex(200)));
}
