//! Qualified names, interned symbols and the symbol table
//!
//! Content models never compare element names as strings. Every element
//! name is interned once into a [`Symbol`] (namespace id + local-name id) and
//! all matching is done on those integers.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::names::{split_clark_name, validate_ncname};

/// XML Namespace URI
pub type NamespaceUri = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Interned namespace URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceId(pub u32);

impl NamespaceId {
    /// The absent namespace (unqualified names)
    pub const NONE: NamespaceId = NamespaceId(0);

    const SENTINEL: NamespaceId = NamespaceId(u32::MAX);
}

/// An interned element name.
///
/// Two symbols are equal iff they were interned from the same expanded
/// name. Three sentinel values never come out of a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    /// Namespace of the element
    pub namespace: NamespaceId,
    /// Interned local name
    pub local: u32,
}

impl Symbol {
    /// Matches any child element (schema `any`)
    pub const WILDCARD: Symbol = Symbol {
        namespace: NamespaceId::SENTINEL,
        local: 0,
    };

    /// Synthetic end-of-content marker used by the automaton
    pub const END: Symbol = Symbol {
        namespace: NamespaceId::SENTINEL,
        local: 1,
    };

    /// The `#PCDATA` marker of mixed-content declarations
    pub const PCDATA: Symbol = Symbol {
        namespace: NamespaceId::SENTINEL,
        local: 2,
    };

    /// Build a symbol from raw ids
    pub const fn new(namespace: NamespaceId, local: u32) -> Self {
        Self { namespace, local }
    }

    /// Whether this is one of the sentinel values
    pub fn is_sentinel(&self) -> bool {
        self.namespace == NamespaceId::SENTINEL
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Symbol::WILDCARD => write!(f, "*"),
            Symbol::END => write!(f, "$"),
            Symbol::PCDATA => write!(f, "#PCDATA"),
            Symbol { namespace, local } if namespace == NamespaceId::NONE => {
                write!(f, "#{}", local)
            }
            Symbol { namespace, local } => write!(f, "#{}:{}", namespace.0, local),
        }
    }
}

/// Interning table for namespace URIs and local names
#[derive(Debug, Clone)]
pub struct SymbolTable {
    namespaces: IndexSet<String>,
    locals: IndexSet<String>,
}

impl SymbolTable {
    /// Create a table that already knows the absent namespace
    pub fn new() -> Self {
        let mut namespaces = IndexSet::new();
        namespaces.insert(String::new());
        Self {
            namespaces,
            locals: IndexSet::new(),
        }
    }

    /// Intern a namespace URI; the empty string is the absent namespace
    pub fn namespace(&mut self, uri: &str) -> NamespaceId {
        let (index, _) = self.namespaces.insert_full(uri.to_string());
        NamespaceId(index as u32)
    }

    /// Intern an element name
    pub fn intern(&mut self, namespace: Option<&str>, local: &str) -> Result<Symbol> {
        validate_ncname(local)?;
        let namespace = self.namespace(namespace.unwrap_or(""));
        let (index, _) = self.locals.insert_full(local.to_string());
        if index >= u32::MAX as usize {
            return Err(Error::LimitExceeded("symbol table is full".to_string()));
        }
        Ok(Symbol::new(namespace, index as u32))
    }

    /// Intern an expanded name written as `local` or `{uri}local`
    pub fn intern_name(&mut self, name: &str) -> Result<Symbol> {
        let (namespace, local) = split_clark_name(name)?;
        self.intern(namespace, local)
    }

    /// Intern a [`QName`]
    pub fn intern_qname(&mut self, qname: &QName) -> Result<Symbol> {
        self.intern(qname.namespace.as_deref(), &qname.local_name)
    }

    /// Look up a name without interning it
    pub fn lookup(&self, namespace: Option<&str>, local: &str) -> Option<Symbol> {
        let namespace = self.namespaces.get_index_of(namespace.unwrap_or(""))?;
        let local = self.locals.get_index_of(local)?;
        Some(Symbol::new(NamespaceId(namespace as u32), local as u32))
    }

    /// Namespace URI of an interned namespace id
    pub fn namespace_uri(&self, id: NamespaceId) -> Result<&str> {
        self.namespaces
            .get_index(id.0 as usize)
            .map(String::as_str)
            .ok_or_else(|| Error::Namespace(format!("unknown namespace id {}", id.0)))
    }

    /// Resolve a symbol back to its qualified name
    pub fn qname(&self, symbol: Symbol) -> Option<QName> {
        if symbol.is_sentinel() {
            return None;
        }
        let uri = self.namespaces.get_index(symbol.namespace.0 as usize)?;
        let local = self.locals.get_index(symbol.local as usize)?;
        Some(if uri.is_empty() {
            QName::local(local.as_str())
        } else {
            QName::namespaced(uri.as_str(), local.as_str())
        })
    }

    /// Human-readable name of a symbol, falling back to its raw ids
    pub fn display(&self, symbol: Symbol) -> String {
        self.qname(symbol)
            .map(|q| q.to_string())
            .unwrap_or_else(|| symbol.to_string())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
