//! Occurrence bounds for schema particles
//!
//! Schema particles carry arbitrary `minOccurs`/`maxOccurs` bounds. The
//! automaton only understands `?`, `*` and `+`, so
//! [`ContentSpecBuilder::repeat`](super::specs::ContentSpecBuilder::repeat)
//! expands an [`Occurs`] into those operators.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use crate::error::{ParseError, Result};

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max_occurs means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Empty (0, 0)
    pub fn empty() -> Self {
        Self { min: 0, max: Some(0) }
    }

    /// Check if min/max are consistent
    pub fn is_valid(&self) -> bool {
        match self.max {
            Some(max) => self.min <= max,
            None => true,
        }
    }

    /// Number of copies of the particle an expansion materializes
    pub fn expanded_copies(&self) -> usize {
        match self.max {
            Some(max) => max as usize,
            None => (self.min as usize).max(1),
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            ParseError::new("minOccurs value is not a valid non-negative integer")
                .with_source(min_str)
        })?;
    }

    match max_occurs.map(str::trim) {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.parse::<u32>().map_err(|_| {
                ParseError::new("maxOccurs value must be a non-negative integer or 'unbounded'")
                    .with_source(max_str)
            })?;
            if occurs.min > max {
                return Err(ParseError::new(
                    "maxOccurs must be 'unbounded' or greater than minOccurs",
                )
                .into());
            }
            occurs.max = Some(max);
        }
        None => {
            // Default maxOccurs is 1, but must be >= minOccurs
            if occurs.min > 1 {
                return Err(
                    ParseError::new("minOccurs must be lesser or equal than maxOccurs").into(),
                );
            }
        }
    }

    Ok(occurs)
}
