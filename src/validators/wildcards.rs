//! Wildcard namespace constraints
//!
//! A schema `xs:any` particle admits child elements by namespace only. The
//! constraint here decides admission for a single namespace and whether two
//! constraints can admit a common namespace (needed by the UPA checker).
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Wildcards

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ParseError;
use crate::namespaces::{NamespaceId, SymbolTable};

/// Namespace constraint for wildcards
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target: NamespaceId,
    },
    /// Specific set of allowed namespaces
    Enumeration(BTreeSet<NamespaceId>),
    /// XSD 1.1: Set of disallowed namespaces (notNamespace)
    Not(BTreeSet<NamespaceId>),
}

impl NamespaceConstraint {
    /// Create from namespace attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
        table: &mut SymbolTable,
    ) -> Result<Self, ParseError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target: table.namespace(target_namespace.unwrap_or("")),
            }),
            value => Ok(Self::Enumeration(parse_namespace_list(
                value,
                "namespace",
                target_namespace,
                table,
            )?)),
        }
    }

    /// Create from notNamespace attribute (XSD 1.1)
    pub fn from_not_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
        table: &mut SymbolTable,
    ) -> Result<Self, ParseError> {
        Ok(Self::Not(parse_namespace_list(
            value,
            "notNamespace",
            target_namespace,
            table,
        )?))
    }

    /// Check if a namespace is allowed by this constraint
    pub fn is_allowed(&self, namespace: NamespaceId) -> bool {
        match self {
            Self::Any => true,
            Self::Other { target } => namespace != NamespaceId::NONE && namespace != *target,
            Self::Enumeration(set) => set.contains(&namespace),
            Self::Not(set) => !set.contains(&namespace),
        }
    }

    /// Check whether no namespace can satisfy both constraints.
    ///
    /// Conservative: returns `false` unless disjointness is provable.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Enumeration(a), Self::Enumeration(b)) => a.is_disjoint(b),
            (Self::Enumeration(set), x) | (x, Self::Enumeration(set)) => {
                set.iter().all(|ns| !x.is_allowed(*ns))
            }
            // Both sides admit infinitely many namespaces
            _ => false,
        }
    }

    /// Check if a namespace that is neither absent nor mentioned by this
    /// constraint is allowed
    pub fn allows_foreign(&self) -> bool {
        !matches!(self, Self::Enumeration(_))
    }

    /// Namespaces this constraint singles out
    pub fn mentioned_namespaces(&self) -> Vec<NamespaceId> {
        match self {
            Self::Any => Vec::new(),
            Self::Other { target } => vec![*target],
            Self::Enumeration(set) | Self::Not(set) => set.iter().copied().collect(),
        }
    }
}

fn parse_namespace_list(
    value: &str,
    attribute: &str,
    target_namespace: Option<&str>,
    table: &mut SymbolTable,
) -> Result<BTreeSet<NamespaceId>, ParseError> {
    let mut namespaces = BTreeSet::new();
    for ns in value.split_whitespace() {
        let id = match ns {
            "##local" => NamespaceId::NONE,
            "##targetNamespace" => table.namespace(target_namespace.unwrap_or("")),
            s if s.starts_with("##") => {
                return Err(ParseError::new(format!(
                    "wrong value '{}' in '{}' attribute",
                    s, attribute
                )));
            }
            uri => table.namespace(uri),
        };
        namespaces.insert(id);
    }
    Ok(namespaces)
}

impl fmt::Display for NamespaceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, set: &BTreeSet<NamespaceId>) -> fmt::Result {
            let ids: Vec<String> = set.iter().map(|ns| ns.0.to_string()).collect();
            write!(f, "[{}]", ids.join(" "))
        }
        match self {
            Self::Any => write!(f, "##any"),
            Self::Other { target } => write!(f, "##other({})", target.0),
            Self::Enumeration(set) => list(f, set),
            Self::Not(set) => {
                write!(f, "not")?;
                list(f, set)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[u32]) -> BTreeSet<NamespaceId> {
        ids.iter().map(|id| NamespaceId(*id)).collect()
    }

    #[test]
    fn test_namespace_constraint_any() {
        let c = NamespaceConstraint::Any;
        assert!(c.is_allowed(NamespaceId::NONE));
        assert!(c.is_allowed(NamespaceId(7)));
    }

    #[test]
    fn test_namespace_constraint_other() {
        let c = NamespaceConstraint::Other {
            target: NamespaceId(1),
        };
        assert!(!c.is_allowed(NamespaceId::NONE));
        assert!(!c.is_allowed(NamespaceId(1)));
        assert!(c.is_allowed(NamespaceId(2)));
    }

    #[test]
    fn test_namespace_constraint_from_attr() {
        let mut table = SymbolTable::new();
        let c = NamespaceConstraint::from_namespace_attr(
            "##local ##targetNamespace urn:extra",
            Some("urn:target"),
            &mut table,
        )
        .unwrap();
        let target = table.namespace("urn:target");
        let extra = table.namespace("urn:extra");
        assert_eq!(
            c,
            NamespaceConstraint::Enumeration(ids(&[0, target.0, extra.0]))
        );

        let other =
            NamespaceConstraint::from_namespace_attr("##other", Some("urn:target"), &mut table)
                .unwrap();
        assert_eq!(other, NamespaceConstraint::Other { target });

        assert!(
            NamespaceConstraint::from_namespace_attr("##bogus", None, &mut table).is_err()
        );
    }

    #[test]
    fn test_namespace_constraint_not() {
        let mut table = SymbolTable::new();
        let c = NamespaceConstraint::from_not_namespace_attr("urn:a ##local", None, &mut table)
            .unwrap();
        assert!(!c.is_allowed(NamespaceId::NONE));
        assert!(!c.is_allowed(table.namespace("urn:a")));
        assert!(c.is_allowed(table.namespace("urn:b")));
    }

    #[test]
    fn test_disjointness() {
        let any = NamespaceConstraint::Any;
        let other = NamespaceConstraint::Other {
            target: NamespaceId(1),
        };
        let local = NamespaceConstraint::Enumeration(ids(&[0]));
        let target = NamespaceConstraint::Enumeration(ids(&[1]));
        let foreign = NamespaceConstraint::Enumeration(ids(&[2]));
        let not_foreign = NamespaceConstraint::Not(ids(&[2]));

        assert!(!any.is_disjoint(&local));
        assert!(local.is_disjoint(&target));
        assert!(local.is_disjoint(&other));
        assert!(other.is_disjoint(&target));
        assert!(!other.is_disjoint(&foreign));
        assert!(foreign.is_disjoint(&not_foreign));
        assert!(not_foreign.is_disjoint(&foreign));
        assert!(!other.is_disjoint(&not_foreign));
        assert!(NamespaceConstraint::Enumeration(BTreeSet::new()).is_disjoint(&any));
    }

    #[test]
    fn test_allows_foreign() {
        assert!(NamespaceConstraint::Any.allows_foreign());
        assert!(NamespaceConstraint::Other {
            target: NamespaceId(1)
        }
        .allows_foreign());
        assert!(!NamespaceConstraint::Enumeration(ids(&[1])).allows_foreign());
        assert!(NamespaceConstraint::Not(ids(&[1])).allows_foreign());
    }

    #[test]
    fn test_mentioned_namespaces() {
        assert!(NamespaceConstraint::Any.mentioned_namespaces().is_empty());
        assert_eq!(
            NamespaceConstraint::Not(ids(&[3, 4])).mentioned_namespaces(),
            vec![NamespaceId(3), NamespaceId(4)]
        );
    }
}
