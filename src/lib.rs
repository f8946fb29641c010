//! # xmlcontent
//!
//! Compilation and validation of XML element content models, for DTD and
//! XML Schema grammars.
//!
//! A content specification (`(a, b?, c+)`, `(#PCDATA | x | y)*`, schema
//! groups with wildcards) is compiled once per element type into a
//! [`ContentModel`](validators::ContentModel). The document scanner then
//! hands it the ordered child elements of every element instance and gets
//! back either `Ok` or the index of the first child that does not fit.
//!
//! ## Features
//!
//! - Berry-Sethi position analysis, no epsilon transitions
//! - Subset-construction automata with exact wildcard handling
//! - Fast paths for unary/binary and flat mixed content models
//! - Unique Particle Attribution checking for schema grammars
//! - `minOccurs`/`maxOccurs` expansion with resource limits
//!
//! ## Example
//!
//! ```rust
//! use xmlcontent::namespaces::SymbolTable;
//! use xmlcontent::validators::{compile, CompileOptions, ContentSpecBuilder, FirstBadIndex};
//!
//! let mut table = SymbolTable::new();
//! let a = table.intern_name("a")?;
//! let b = table.intern_name("b")?;
//!
//! // (a, b*)
//! let mut builder = ContentSpecBuilder::new();
//! let head = builder.element(a);
//! let tail = builder.element(b);
//! let tail = builder.star(tail);
//! let root = builder.seq(head, tail);
//! let spec = builder.build(root)?;
//!
//! let compiled = compile(&spec, &CompileOptions::new())?;
//! assert!(compiled.model.is_valid(&[a, b, b]));
//! assert_eq!(compiled.model.validate(&[b]), Err(FirstBadIndex(0)));
//! # Ok::<(), xmlcontent::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and symbols
pub mod names;
pub mod namespaces;

// Content models
pub mod validators;

// Re-exports for convenience
pub use error::{Error, Result};
pub use namespaces::{NamespaceId, QName, Symbol, SymbolTable};
pub use validators::{
    compile, CompileOptions, ContentModel, ContentSpec, ContentSpecBuilder, FirstBadIndex,
    ModelRegistry,
};

/// Version of the xmlcontent library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
