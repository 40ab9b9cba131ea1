//! Build errors for tgql.
//!
//! Every variant is fatal: a schema build stops at the first one and no
//! partial schema is produced.

use crate::diagnostics::{codes, Diagnostic};
use crate::location::Location;
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Result alias used across the build pipeline.
pub type BuildResult<T> = Result<T, BuildError>;

/// An error raised while registering declarations or building a schema.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    /// A return, field or argument type resolved to neither a scalar nor a
    /// declared class.
    #[error("undetermined type at `{location}`: make sure an explicit type is provided and the referenced class is declared")]
    #[diagnostic(code(tgql::undetermined_type))]
    UndeterminedType { location: Location },

    /// A handler was declared without any way to determine its return type.
    #[error("undefined return type for {kind} handler `{location}`")]
    #[diagnostic(
        code(tgql::undefined_return_type),
        help("pass an explicit return type to the handler declaration")
    )]
    UndefinedReturnType { kind: String, location: Location },

    /// A resolver class declares field resolvers but not the object type
    /// they augment.
    #[error("undefined resolver type for `{resolver}`")]
    #[diagnostic(
        code(tgql::undefined_resolver_type),
        help("declare the resolver class with the object type it resolves fields for")
    )]
    UndefinedResolverType { resolver: String },

    /// An input-position type is neither a scalar nor a declared input type.
    #[error("cannot determine input type at `{location}`: only scalars and declared input types are allowed")]
    #[diagnostic(code(tgql::cannot_determine_input_type))]
    CannotDetermineInputType { location: Location },

    /// An `args` parameter references a class that is not an argument bundle.
    #[error("`{location}` references `{bundle}`, which is not a declared arguments type")]
    #[diagnostic(code(tgql::missing_args_type))]
    MissingArgsType { location: Location, bundle: String },

    /// Two distinct declarations map to the same schema name.
    #[error("schema name `{name}` is declared by both `{first}` and `{second}`")]
    #[diagnostic(code(tgql::naming_conflict))]
    NamingConflict {
        name: String,
        first: String,
        second: String,
    },

    /// Two fields of one realized type share a schema name.
    #[error("field `{field}` is declared more than once on `{type_name}`")]
    #[diagnostic(code(tgql::duplicate_field))]
    DuplicateField { type_name: String, field: String },

    /// A deferred registration thunk failed.
    #[error("deferred registration for `{owner}` failed")]
    #[diagnostic(code(tgql::deferred_registration))]
    Deferred {
        owner: String,
        #[source]
        source: Box<BuildError>,
    },

    /// Structural validation rejected the realized schema.
    #[error("schema validation failed with {count} error(s): {}", summarize(.diagnostics))]
    #[diagnostic(
        code(tgql::invalid_schema),
        help("fix the reported declarations or build with `skip_check`")
    )]
    InvalidSchema {
        count: usize,
        diagnostics: Vec<Diagnostic>,
    },

    /// An optional directive source could not be loaded.
    #[error("directive source `{source_name}` is unavailable: {reason}")]
    #[diagnostic(
        code(tgql::missing_directive_source),
        help("install or point to the federation directive definitions")
    )]
    MissingDirectiveSource { source_name: String, reason: String },
}

impl BuildError {
    /// Attributes this error to the owner of a deferred registration.
    #[must_use]
    pub fn deferred(owner: impl Into<String>, source: BuildError) -> Self {
        Self::Deferred {
            owner: owner.into(),
            source: Box::new(source),
        }
    }

    /// Returns the diagnostic code of the innermost error.
    ///
    /// Validation failures have no code of their own; each collected
    /// diagnostic carries one.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        let code = match self.root_cause() {
            Self::UndeterminedType { .. } => codes::UNDETERMINED_TYPE,
            Self::UndefinedReturnType { .. } => codes::UNDEFINED_RETURN_TYPE,
            Self::UndefinedResolverType { .. } => codes::UNDEFINED_RESOLVER_TYPE,
            Self::CannotDetermineInputType { .. } => codes::CANNOT_DETERMINE_INPUT_TYPE,
            Self::MissingArgsType { .. } => codes::MISSING_ARGS_TYPE,
            Self::NamingConflict { .. } => codes::NAMING_CONFLICT,
            Self::DuplicateField { .. } => codes::DUPLICATE_FIELD,
            Self::MissingDirectiveSource { .. } => codes::MISSING_DIRECTIVE_SOURCE,
            Self::InvalidSchema { .. } | Self::Deferred { .. } => return None,
        };
        Some(code)
    }

    /// Returns the innermost error, unwrapping deferred attributions.
    #[must_use]
    pub fn root_cause(&self) -> &BuildError {
        match self {
            Self::Deferred { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
