//! Error types for xmlcontent
//!
//! Grammar-construction failures (malformed content specifications, bad
//! occurrence bounds, resource limits, UPA violations in strict mode) are
//! reported through [`Error`]. Per-document content validation never
//! produces an `Error`: validators return a
//! [`FirstBadIndex`](crate::validators::FirstBadIndex) instead.

use std::fmt;
use thiserror::Error;

use crate::validators::upa::UpaConflict;

/// Result type alias using xmlcontent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for content-model compilation
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed content specification or occurrence bounds
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Unique Particle Attribution violations (strict mode only)
    #[error("{0}")]
    Upa(#[from] UpaErrors),

    /// Invalid XML name handed to the symbol table
    #[error("name error: {0}")]
    Name(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Content specification construction error with context
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Node or particle that caused the error
    pub location: Option<String>,
    /// Rendering of the offending content specification
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The UPA conflicts found in one content model
#[derive(Debug, Clone)]
pub struct UpaErrors {
    /// Every conflict reported by the checker
    pub conflicts: Vec<UpaConflict>,
}

impl UpaErrors {
    /// Wrap a list of conflicts
    pub fn new(conflicts: Vec<UpaConflict>) -> Self {
        Self { conflicts }
    }
}

impl fmt::Display for UpaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "content model violates Unique Particle Attribution ({} conflict{})",
            self.conflicts.len(),
            if self.conflicts.len() == 1 { "" } else { "s" }
        )?;
        for conflict in &self.conflicts {
            write!(f, "\n  {}", conflict.description)?;
        }
        Ok(())
    }
}

impl std::error::Error for UpaErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::specs::ParticleId;
    use crate::validators::upa::ParticleRef;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("choice node is missing its right operand")
            .with_location("node 4")
            .with_source("(a|)");

        let msg = format!("{}", err);
        assert!(msg.contains("missing its right operand"));
        assert!(msg.contains("Location: node 4"));
        assert!(msg.contains("Source:"));
    }

    #[test]
    fn test_upa_errors_display() {
        let conflict = UpaConflict {
            state: 0,
            first: ParticleRef::Declared(ParticleId(0)),
            second: ParticleRef::Declared(ParticleId(2)),
            description: "particles 'x' and 'x' both match element 'x'".to_string(),
        };
        let msg = UpaErrors::new(vec![conflict]).to_string();
        assert!(msg.contains("1 conflict)"));
        assert!(msg.contains("both match element 'x'"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ParseError::new("test").into();
        assert!(matches!(err, Error::Parse(_)));

        let err: Error = UpaErrors::new(Vec::new()).into();
        assert!(matches!(err, Error::Upa(_)));
    }
}
