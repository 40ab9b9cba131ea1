//! Federation directive sources.

use crate::directives::{federation_directives, federation_scalars, FEDERATION_ORPHAN_DIRECTIVES};
use crate::options::ScalarImpl;
use crate::schema::DirectiveDefinition;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tgql_core::{BuildError, BuildResult};
use tracing::debug;

/// Directive definitions a federated build adds to the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FederationDirectives {
    pub directives: Vec<DirectiveDefinition>,
    /// Scalars the directive arguments refer to.
    pub scalars: Vec<ScalarImpl>,
    /// Directives that make the type they are applied to an orphan.
    pub orphan_directives: Vec<String>,
}

impl FederationDirectives {
    /// The Apollo federation v1 set.
    pub fn apollo() -> Self {
        Self {
            directives: federation_directives(),
            scalars: federation_scalars(),
            orphan_directives: FEDERATION_ORPHAN_DIRECTIVES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Somewhere federation directives can be loaded from.
pub trait DirectiveSource {
    /// Name used in error reports.
    fn name(&self) -> &str;

    /// Loads the directive set.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingDirectiveSource`] if the source cannot be
    /// read.
    fn load(&self) -> BuildResult<FederationDirectives>;
}

/// The built-in Apollo federation directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApolloFederation;

impl DirectiveSource for ApolloFederation {
    fn name(&self) -> &str {
        "apollo-federation"
    }

    fn load(&self) -> BuildResult<FederationDirectives> {
        Ok(FederationDirectives::apollo())
    }
}

/// Directive definitions stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct FileDirectiveSource {
    path: PathBuf,
    name: String,
}

impl FileDirectiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl DirectiveSource for FileDirectiveSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> BuildResult<FederationDirectives> {
        let unavailable = |reason: String| BuildError::MissingDirectiveSource {
            source_name: self.name.clone(),
            reason,
        };
        let content = std::fs::read_to_string(&self.path).map_err(|e| unavailable(e.to_string()))?;
        let directives: FederationDirectives =
            serde_json::from_str(&content).map_err(|e| unavailable(e.to_string()))?;
        debug!(
            source = %self.name,
            directives = directives.directives.len(),
            "loaded federation directives"
        );
        Ok(directives)
    }
}
