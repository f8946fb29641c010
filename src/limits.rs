//! Limits and constraints for content-model compilation
//!
//! Pathological content specifications can blow up during occurrence
//! expansion or subset construction. These limits make compilation fail
//! deterministically instead of running unbounded.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of leaf positions in one content specification
    pub max_positions: usize,

    /// Maximum number of distinct automaton states
    pub max_states: usize,

    /// Maximum group nesting depth of a content specification tree.
    ///
    /// A chain of same-kind groups is one level, so flat `(a,b,c,...)`
    /// groups and bounded repetitions do not count per member.
    pub max_depth: usize,

    /// Maximum number of leaf copies produced by minOccurs/maxOccurs expansion
    pub max_occurs_expansion: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_positions: 10_000,
            max_states: 10_000,
            max_depth: 256,
            max_occurs_expansion: 1_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_positions: 1_000,
            max_states: 1_000,
            max_depth: 64,
            max_occurs_expansion: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_positions: 100_000,
            max_states: 1_000_000,
            max_depth: 4_096,
            max_occurs_expansion: 100_000,
        }
    }

    /// Check if the number of positions is within limits
    pub fn check_positions(&self, count: usize) -> Result<()> {
        if count > self.max_positions {
            Err(Error::LimitExceeded(format!(
                "content model has {} positions, maximum is {}",
                count, self.max_positions
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of automaton states is within limits
    pub fn check_states(&self, count: usize) -> Result<()> {
        if count > self.max_states {
            Err(Error::LimitExceeded(format!(
                "automaton state count {} exceeds maximum {}",
                count, self.max_states
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the tree depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "content model depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if an occurrence expansion stays within limits
    pub fn check_occurs_expansion(&self, copies: usize) -> Result<()> {
        if copies > self.max_occurs_expansion {
            Err(Error::LimitExceeded(format!(
                "occurrence expansion to {} copies exceeds maximum {}",
                copies, self.max_occurs_expansion
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_states, 10_000);
        assert!(limits.check_states(500).is_ok());
        assert!(limits.check_states(10_001).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_states < Limits::default().max_states);
        assert!(limits.check_depth(65).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_positions > Limits::default().max_positions);
        assert!(limits.check_positions(50_000).is_ok());
    }

    #[test]
    fn test_check_occurs_expansion() {
        let limits = Limits::default();
        assert!(limits.check_occurs_expansion(1_000).is_ok());
        assert!(matches!(
            limits.check_occurs_expansion(1_001),
            Err(Error::LimitExceeded(_))
        ));
    }
}
