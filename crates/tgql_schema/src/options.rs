//! Schema build options.

use crate::schema::DirectiveDefinition;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How `Date` references are realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateScalarMode {
    /// ISO-8601 strings, realized as `DateTime`.
    #[default]
    IsoDate,
    /// Milliseconds since the epoch, realized as `Timestamp`.
    Timestamp,
}

/// How `Number` references are realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberScalarMode {
    #[default]
    Float,
    Integer,
}

/// The implementation a scalar name maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarImpl {
    /// Name of the realized scalar.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specified_by_url: Option<String>,
}

impl ScalarImpl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            specified_by_url: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Options for one schema build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildSchemaOptions {
    /// Custom scalar table, consulted before the built-in scalars.
    pub scalars_map: IndexMap<String, ScalarImpl>,
    pub date_scalar_mode: DateScalarMode,
    pub number_scalar_mode: NumberScalarMode,
    /// Extra directive definitions.
    pub directives: Vec<DirectiveDefinition>,
    /// Bypasses structural validation.
    pub skip_check: bool,
    /// Directive names that pull a declared type into the schema even when
    /// nothing returns or accepts it.
    pub orphan_directives: Vec<String>,
}

impl BuildSchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a scalar name to a custom implementation.
    #[must_use]
    pub fn with_scalar(mut self, name: impl Into<String>, scalar: ScalarImpl) -> Self {
        self.scalars_map.insert(name.into(), scalar);
        self
    }

    #[must_use]
    pub fn with_date_scalar_mode(mut self, mode: DateScalarMode) -> Self {
        self.date_scalar_mode = mode;
        self
    }

    #[must_use]
    pub fn with_number_scalar_mode(mut self, mode: NumberScalarMode) -> Self {
        self.number_scalar_mode = mode;
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: DirectiveDefinition) -> Self {
        self.directives.push(directive);
        self
    }

    #[must_use]
    pub fn with_skip_check(mut self, skip_check: bool) -> Self {
        self.skip_check = skip_check;
        self
    }

    #[must_use]
    pub fn with_orphan_directive(mut self, name: impl Into<String>) -> Self {
        self.orphan_directives.push(name.into());
        self
    }

    /// Returns true if applying `directive` to a type makes it an orphan.
    pub fn is_orphan_directive(&self, directive: &str) -> bool {
        self.orphan_directives.iter().any(|d| d == directive)
    }
}
