//! Validation findings and their codes.
//!
//! Fatal build errors carry codes `E001x`, see [`crate::BuildError::code`].
//! Structural validation collects `E002x`/`E003x` findings into a
//! [`DiagnosticBag`] so every problem of a schema is reported at once.

use crate::location::Location;
use std::fmt;

/// A declaration a finding points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub location: Location,
    pub message: String,
}

impl Label {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable code from [`codes`].
    pub code: &'static str,
    pub title: String,
    /// The first label is the primary site.
    pub labels: Vec<Label>,
}

impl Diagnostic {
    pub fn error(code: &'static str, title: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            labels: Vec::new(),
        }
    }

    /// Attaches a label at `location`.
    #[must_use]
    pub fn with_location(mut self, location: Location, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(location, message));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.title)?;
        if let Some(label) = self.labels.first() {
            write!(f, " at `{}`: {}", label.location, label.message)?;
        }
        Ok(())
    }
}

/// Findings collected by one validation pass, in discovery order.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error at `location`.
    pub fn error(
        &mut self,
        code: &'static str,
        title: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) {
        self.diagnostics
            .push(Diagnostic::error(code, title).with_location(location, message));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Diagnostic codes.
pub mod codes {
    pub const UNDETERMINED_TYPE: &str = "E0010";
    pub const UNDEFINED_RETURN_TYPE: &str = "E0011";
    pub const UNDEFINED_RESOLVER_TYPE: &str = "E0012";
    pub const CANNOT_DETERMINE_INPUT_TYPE: &str = "E0013";
    pub const NAMING_CONFLICT: &str = "E0014";
    pub const DUPLICATE_FIELD: &str = "E0015";
    pub const MISSING_ARGS_TYPE: &str = "E0016";
    pub const EMPTY_FIELDS: &str = "E0020";
    pub const INVALID_NAME: &str = "E0021";
    pub const MISSING_INTERFACE_FIELD: &str = "E0022";
    pub const UNKNOWN_DIRECTIVE: &str = "E0030";
    pub const MISSING_DIRECTIVE_SOURCE: &str = "E0031";
    /// Logged, never fatal.
    pub const DEFAULT_VALUE_CONFLICT: &str = "W0001";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_keeps_discovery_order() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());

        bag.error(
            codes::EMPTY_FIELDS,
            "empty field set",
            Location::owner("Recipe"),
            "object type `Recipe` must define one or more fields",
        );
        bag.error(
            codes::INVALID_NAME,
            "reserved name",
            Location::member("Recipe", "__title"),
            "reserved",
        );

        assert!(bag.has_errors());
        assert_eq!(bag.len(), 2);
        let found: Vec<_> = bag.iter().map(|d| d.code).collect();
        assert_eq!(found, ["E0020", "E0021"]);
        assert_eq!(bag.into_vec()[1].labels[0].location, Location::member("Recipe", "__title"));
    }

    #[test]
    fn test_display_uses_primary_label() {
        let diag = Diagnostic::error(codes::UNKNOWN_DIRECTIVE, "unknown directive")
            .with_location(Location::member("Query", "recipe"), "directive `@auth` is not defined")
            .with_location(Location::owner("Query"), "declared here");

        assert_eq!(
            diag.to_string(),
            "[E0030] unknown directive at `Query.recipe`: directive `@auth` is not defined"
        );
    }
}
