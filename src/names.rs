//! XML name validation and utilities
//!
//! Element names handed to the [`SymbolTable`](crate::namespaces::SymbolTable)
//! are checked here before they are interned.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// NCName: a Name without colons (BMP subset of NameStartChar / NameChar)
static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\-\.0-9\u{B7}\u{300}-\u{36F}\u{203F}-\u{2040}]*$",
    )
    .expect("NCName pattern is valid")
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    !name.is_empty() && NCNAME.is_match(name)
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid NCName: '{}'", name)))
    }
}

/// Split an expanded name in Clark notation (`{uri}local`) into its parts.
///
/// A name without braces has no namespace.
pub fn split_clark_name(name: &str) -> Result<(Option<&str>, &str)> {
    match name.strip_prefix('{') {
        Some(rest) => {
            let (uri, local) = rest.split_once('}').ok_or_else(|| {
                Error::Name(format!("Unterminated namespace in '{}'", name))
            })?;
            validate_ncname(local)?;
            Ok((if uri.is_empty() { None } else { Some(uri) }, local))
        }
        None => {
            validate_ncname(name)?;
            Ok((None, name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("_element.v2"));
        assert!(is_valid_ncname("caf\u{e9}"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("prefix:element"));
        assert!(!is_valid_ncname("123element"));
        assert!(!is_valid_ncname("-element"));
    }

    #[test]
    fn test_split_clark_name() {
        assert_eq!(split_clark_name("para").unwrap(), (None, "para"));
        assert_eq!(
            split_clark_name("{http://example.com}para").unwrap(),
            (Some("http://example.com"), "para")
        );
        assert_eq!(split_clark_name("{}para").unwrap(), (None, "para"));
        assert!(split_clark_name("{http://example.com").is_err());
        assert!(split_clark_name("{urn:x}1bad").is_err());
    }
}
