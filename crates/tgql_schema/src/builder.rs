//! Schema building entry point.

use crate::context::BuildContext;
use crate::directives::{merge_directives, specified_directives};
use crate::federation::DirectiveSource;
use crate::options::{BuildSchemaOptions, ScalarImpl};
use crate::output::declaration_label;
use crate::schema::Schema;
use crate::validate::check_schema;
use indexmap::IndexMap;
use tgql_core::{BuildError, BuildResult};
use tgql_metadata::{ClassKind, EntityId, RootKind, TypeRegistry};
use tracing::{debug, info};

/// Builds schemas from a finished [`TypeRegistry`].
///
/// ```ignore
/// let schema = SchemaBuilder::new()
///     .with_options(BuildSchemaOptions::new().with_skip_check(true))
///     .with_resolvers([recipe_resolver])
///     .build(&registry)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    options: BuildSchemaOptions,
    resolvers: Option<Vec<EntityId>>,
    orphaned_types: Vec<EntityId>,
}

impl SchemaBuilder {
    /// Creates a builder with default options that includes every resolver
    /// class.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(mut self, options: BuildSchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Restricts root handlers and field resolvers to these resolver classes.
    #[must_use]
    pub fn with_resolvers(mut self, resolvers: impl IntoIterator<Item = EntityId>) -> Self {
        self.resolvers = Some(resolvers.into_iter().collect());
        self
    }

    /// Emits these declared types even if no handler reaches them.
    #[must_use]
    pub fn with_orphaned_types(mut self, types: impl IntoIterator<Item = EntityId>) -> Self {
        self.orphaned_types.extend(types);
        self
    }

    pub fn options(&self) -> &BuildSchemaOptions {
        &self.options
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Fails on the first declaration that cannot be realized, or with
    /// [`BuildError::InvalidSchema`] if structural validation is enabled and
    /// rejects the result.
    pub fn build(&self, registry: &TypeRegistry) -> BuildResult<Schema> {
        self.build_with(registry, &self.options, &[])
    }

    /// Builds a schema carrying the directives of `source`.
    ///
    /// The federation directives are merged after the specified directives
    /// and before the configured ones. Their argument scalars are added to
    /// the schema, their orphan triggers are registered and structural
    /// validation is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingDirectiveSource`] if the source cannot be
    /// loaded, and otherwise fails like [`build`](Self::build).
    pub fn build_federated(
        &self,
        registry: &TypeRegistry,
        source: &dyn DirectiveSource,
    ) -> BuildResult<Schema> {
        let federation = source.load()?;
        debug!(
            source = source.name(),
            directives = federation.directives.len(),
            "federated build"
        );

        let mut options = self.options.clone();
        let mut directives = specified_directives();
        merge_directives(&mut directives, federation.directives);
        merge_directives(&mut directives, std::mem::take(&mut options.directives));
        options.directives = directives;
        options.skip_check = true;
        for name in federation.orphan_directives {
            if !options.is_orphan_directive(&name) {
                options.orphan_directives.push(name);
            }
        }
        self.build_with(registry, &options, &federation.scalars)
    }

    fn build_with(
        &self,
        registry: &TypeRegistry,
        options: &BuildSchemaOptions,
        scalars: &[ScalarImpl],
    ) -> BuildResult<Schema> {
        check_naming_conflicts(registry)?;
        let mut context = BuildContext::new(registry, options, self.resolvers.as_deref())?;

        let query = context.build_root(RootKind::Query)?;
        let mutation = context.build_root(RootKind::Mutation)?;
        let subscription = context.build_root(RootKind::Subscription)?;

        for &id in &self.orphaned_types {
            context.orphans.register(id);
        }
        for class in registry.object_types_metadata().chain(registry.interfaces_metadata()) {
            if class.directives.iter().any(|d| options.is_orphan_directive(&d.name)) {
                context.orphans.register(class.target);
            }
        }
        let orphans = context.realize_orphans()?;
        for scalar in scalars {
            context.storage.scalar(scalar.clone())?;
        }

        let mut schema = context.into_schema();
        schema.query = query;
        schema.mutation = mutation;
        schema.subscription = subscription;
        let mut directives = specified_directives();
        merge_directives(&mut directives, options.directives.iter().cloned());
        schema.directives = directives;

        if !options.skip_check {
            check_schema(&schema)?;
        }
        info!(
            types = schema.len(),
            orphans,
            query = query.is_some(),
            mutation = mutation.is_some(),
            subscription = subscription.is_some(),
            "built schema"
        );
        Ok(schema)
    }
}

/// Rejects two declarations that would claim the same schema name.
///
/// Abstract classes never become schema types and are not considered. A
/// scalar is keyed with no class kind.
fn check_naming_conflicts(registry: &TypeRegistry) -> BuildResult<()> {
    let mut claimed: IndexMap<&str, NameClaim> = IndexMap::new();
    let categories = [
        (ClassKind::Object, registry.object_types_metadata().collect::<Vec<_>>()),
        (ClassKind::Interface, registry.interfaces_metadata().collect()),
        (ClassKind::InputObject, registry.input_types_metadata().collect()),
    ];
    for (kind, classes) in categories {
        for class in classes.into_iter().filter(|class| !class.is_abstract) {
            let label = declaration_label(kind, class, registry.entity_name(class.target));
            claim(&mut claimed, &class.name, (Some(kind), class.target), label)?;
        }
    }
    for scalar in registry.scalars_metadata() {
        let label = format!("scalar `{}`", scalar.name);
        claim(&mut claimed, &scalar.name, (None, scalar.target), label)?;
    }
    Ok(())
}

type NameClaim = ((Option<ClassKind>, EntityId), String);

fn claim<'r>(
    claimed: &mut IndexMap<&'r str, NameClaim>,
    name: &'r str,
    owner: (Option<ClassKind>, EntityId),
    label: String,
) -> BuildResult<()> {
    match claimed.get(name) {
        Some((existing, _)) if *existing == owner => Ok(()),
        Some((_, first)) => Err(BuildError::NamingConflict {
            name: name.to_string(),
            first: first.clone(),
            second: label,
        }),
        None => {
            claimed.insert(name, (owner, label));
            Ok(())
        }
    }
}
