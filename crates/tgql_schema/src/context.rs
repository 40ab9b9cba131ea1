//! State shared by the resolvers of one build.

use crate::mapper::TypeMapper;
use crate::options::BuildSchemaOptions;
use crate::orphans::OrphanedReferenceRegistry;
use crate::schema::{NamedType, Schema};
use crate::storage::{PendingWiring, TypeStorage};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tgql_core::diagnostics::codes;
use tgql_core::{BuildError, BuildResult};
use tgql_metadata::{
    ClassKind, DefaultValues, EntityId, FieldMetadata, HandlerMetadata, TypeReference, TypeRegistry,
};
use tracing::{debug, warn};

/// A handler as seen from the resolver class that exposes it.
///
/// `class` differs from `handler.target` when the handler is inherited from
/// an abstract resolver class.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HandlerBinding<'r> {
    pub(crate) class: EntityId,
    pub(crate) handler: &'r HandlerMetadata,
}

pub(crate) struct BuildContext<'r> {
    pub(crate) registry: &'r TypeRegistry,
    pub(crate) mapper: TypeMapper<'r>,
    pub(crate) storage: TypeStorage,
    pub(crate) orphans: OrphanedReferenceRegistry,
    resolvers: Option<&'r [EntityId]>,
    /// Field resolvers grouped by the object type they augment.
    field_resolvers: FxHashMap<EntityId, Vec<HandlerBinding<'r>>>,
}

impl<'r> BuildContext<'r> {
    pub(crate) fn new(
        registry: &'r TypeRegistry,
        options: &'r BuildSchemaOptions,
        resolvers: Option<&'r [EntityId]>,
    ) -> BuildResult<Self> {
        let mut context = Self {
            registry,
            mapper: TypeMapper::new(options),
            storage: TypeStorage::new(),
            orphans: OrphanedReferenceRegistry::new(),
            resolvers,
            field_resolvers: FxHashMap::default(),
        };
        context.group_field_resolvers()?;
        Ok(context)
    }

    fn includes_resolver(&self, class: EntityId) -> bool {
        self.resolvers.map_or(true, |allowed| allowed.contains(&class))
    }

    /// Returns the handlers each included resolver class exposes.
    ///
    /// Handlers of abstract resolver classes are not exposed themselves.
    /// Instead every concrete, included resolver class extending one
    /// inherits them, unless it already exposes a handler of the same schema
    /// name. Nearer ancestors shadow farther ones.
    pub(crate) fn effective_handlers(
        &self,
        handlers: impl Iterator<Item = &'r HandlerMetadata>,
    ) -> Vec<HandlerBinding<'r>> {
        let registry = self.registry;
        let (inherited, direct): (Vec<_>, Vec<_>) =
            handlers.partition(|h| registry.is_abstract_resolver(h.target));

        let mut claimed: IndexSet<(EntityId, &str)> = IndexSet::new();
        let mut bindings = Vec::new();
        for handler in direct {
            if self.includes_resolver(handler.target) {
                claimed.insert((handler.target, handler.schema_name.as_str()));
                bindings.push(HandlerBinding {
                    class: handler.target,
                    handler,
                });
            }
        }
        if inherited.is_empty() {
            return bindings;
        }

        for (class, _) in registry.entities().iter() {
            if registry.is_abstract_resolver(class)
                || registry.resolver_metadata(class).is_none()
                || !self.includes_resolver(class)
            {
                continue;
            }
            for ancestor in registry.entities().ancestors(class).into_iter().rev() {
                for &handler in inherited.iter().filter(|h| h.target == ancestor) {
                    if claimed.insert((class, handler.schema_name.as_str())) {
                        debug!(
                            class = %registry.entity_name(class),
                            handler = %handler.method_name,
                            "inherited handler from abstract resolver"
                        );
                        bindings.push(HandlerBinding { class, handler });
                    }
                }
            }
        }
        bindings
    }

    /// Finds the object type a resolver class augments, looking through
    /// its ancestors.
    fn resolver_object_type(&self, class: EntityId) -> BuildResult<&'r TypeReference> {
        let registry = self.registry;
        std::iter::once(class)
            .chain(registry.entities().ancestors(class).into_iter().rev())
            .find_map(|c| registry.resolver_metadata(c)?.type_fn.as_ref())
            .ok_or_else(|| BuildError::UndefinedResolverType {
                resolver: registry.entity_name(class).to_string(),
            })
    }

    fn group_field_resolvers(&mut self) -> BuildResult<()> {
        let registry = self.registry;
        for binding in self.effective_handlers(registry.field_resolvers_metadata()) {
            // Field resolvers only attach to declared object types.
            let object_ref = self.resolver_object_type(binding.class)?;
            let Some(object) = object_ref
                .entity()
                .and_then(|id| registry.object_type_metadata(id))
            else {
                return Err(BuildError::UndefinedResolverType {
                    resolver: registry.entity_name(binding.class).to_string(),
                });
            };

            let group = self.field_resolvers.entry(object.target).or_default();
            let schema_name = &binding.handler.schema_name;
            if let Some(existing) = group.iter().find(|b| &b.handler.schema_name == schema_name) {
                if existing.class != binding.class {
                    return Err(BuildError::DuplicateField {
                        type_name: object.name.clone(),
                        field: schema_name.clone(),
                    });
                }
                continue;
            }
            group.push(binding);
        }
        Ok(())
    }

    pub(crate) fn field_resolvers_for(&self, object: EntityId) -> Vec<HandlerBinding<'r>> {
        self.field_resolvers.get(&object).cloned().unwrap_or_default()
    }

    /// Fills the field maps of every shell created so far, including shells
    /// created while wiring. Returns the number of types wired.
    pub(crate) fn wire_pending(&mut self) -> BuildResult<usize> {
        let mut wired = 0;
        while let Some(pending) = self.storage.next_pending() {
            match pending {
                PendingWiring::Object { id, target } => {
                    let (interfaces, fields) = self.composite_fields(ClassKind::Object, target)?;
                    if let Some(NamedType::Object(object)) = self.storage.get_mut(id) {
                        object.interfaces = interfaces;
                        let rewired = object.fields.set(fields).is_err();
                        debug_assert!(!rewired, "object wired twice");
                    }
                }
                PendingWiring::Interface { id, target } => {
                    let (interfaces, fields) =
                        self.composite_fields(ClassKind::Interface, target)?;
                    if let Some(NamedType::Interface(interface)) = self.storage.get_mut(id) {
                        interface.interfaces = interfaces;
                        let rewired = interface.fields.set(fields).is_err();
                        debug_assert!(!rewired, "interface wired twice");
                    }
                }
                PendingWiring::Input { id, target } => {
                    let fields = self.input_fields(target)?;
                    if let Some(NamedType::InputObject(input)) = self.storage.get_mut(id) {
                        let rewired = input.fields.set(fields).is_err();
                        debug_assert!(!rewired, "input wired twice");
                    }
                }
            }
            wired += 1;
        }
        Ok(wired)
    }

    /// Realizes orphaned declarations until no new ones turn up. Returns
    /// the number of types this realized; types already reached from a
    /// root are not counted.
    pub(crate) fn realize_orphans(&mut self) -> BuildResult<usize> {
        let registry = self.registry;
        let mut realized = 0;
        loop {
            self.wire_pending()?;
            let orphans = self.orphans.drain_orphans(registry);
            if orphans.is_empty() && !self.storage.has_pending() {
                break;
            }
            for (kind, class) in orphans {
                let (cached, id) = match kind {
                    ClassKind::Object => (
                        self.storage.cached_object(class.target),
                        self.object_type(class.target)?,
                    ),
                    ClassKind::Interface => (
                        self.storage.cached_interface(class.target),
                        self.interface_type(class.target)?,
                    ),
                    ClassKind::InputObject => (
                        self.storage.cached_input(class.target),
                        self.input_type(class.target)?,
                    ),
                    ClassKind::Args => (None, None),
                };
                if cached.is_none() && id.is_some() {
                    realized += 1;
                }
            }
        }
        Ok(realized)
    }

    pub(crate) fn into_schema(self) -> Schema {
        self.storage.into_schema()
    }
}

/// Picks the default value of a property.
///
/// The value found on the representative instance wins; the explicit
/// default is the fallback.
pub(crate) fn resolve_default(
    class_name: &str,
    instance: Option<&DefaultValues>,
    field: &FieldMetadata,
) -> Option<Value> {
    let from_instance = instance.and_then(|values| values.get(&field.name));
    match (from_instance, &field.default_value) {
        (Some(value), Some(explicit)) => {
            if value != explicit {
                warn!(
                    code = codes::DEFAULT_VALUE_CONFLICT,
                    class = %class_name,
                    field = %field.name,
                    instance = %value,
                    explicit = %explicit,
                    "conflicting default values; using the instance default"
                );
            }
            Some(value.clone())
        }
        (Some(value), None) => Some(value.clone()),
        (None, explicit) => explicit.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tgql_metadata::{
        ClassDeclaration, Declarations, FieldDeclaration, HandlerDeclaration, ResolverDeclaration,
        RootKind, TypeOptions,
    };

    fn field(default_value: Option<Value>) -> FieldMetadata {
        FieldMetadata {
            name: "take".into(),
            schema_name: "take".into(),
            type_fn: TypeReference::scalar("Int"),
            options: TypeOptions::default(),
            description: None,
            deprecation_reason: None,
            default_value,
            directives: Vec::new(),
        }
    }

    #[test]
    fn test_resolve_default() {
        let mut instance = DefaultValues::new();
        instance.insert("take".into(), json!(25));

        assert_eq!(resolve_default("Args", Some(&instance), &field(None)), Some(json!(25)));
        assert_eq!(
            resolve_default("Args", Some(&instance), &field(Some(json!(10)))),
            Some(json!(25))
        );
        assert_eq!(resolve_default("Args", None, &field(Some(json!(10)))), Some(json!(10)));
        assert_eq!(resolve_default("Args", None, &field(None)), None);
    }

    #[test]
    fn test_abstract_handlers_are_inherited() {
        let mut decls = Declarations::new();
        let base = decls.entity("BaseResolver");
        let recipes = decls.entity_extending("RecipeResolver", base);
        let authors = decls.entity_extending("AuthorResolver", base);
        decls.resolver(ResolverDeclaration::new(base).abstract_resolver());
        decls.resolver(ResolverDeclaration::new(recipes));
        decls.resolver(ResolverDeclaration::new(authors));
        decls.query(HandlerDeclaration::new(base, "count", TypeReference::scalar("Int")));
        decls.query(HandlerDeclaration::new(recipes, "count", TypeReference::scalar("Int")));
        let registry = decls.finish().unwrap();

        let options = BuildSchemaOptions::default();
        let context = BuildContext::new(&registry, &options, None).unwrap();
        let bindings = context.effective_handlers(registry.root_handlers_metadata(RootKind::Query));

        let exposed: Vec<_> = bindings
            .iter()
            .map(|b| (registry.entity_name(b.class), registry.entity_name(b.handler.target)))
            .collect();
        assert_eq!(
            exposed,
            [("RecipeResolver", "RecipeResolver"), ("AuthorResolver", "BaseResolver")]
        );
    }

    #[test]
    fn test_resolver_filter() {
        let mut decls = Declarations::new();
        let recipes = decls.entity("RecipeResolver");
        let authors = decls.entity("AuthorResolver");
        decls.query(HandlerDeclaration::new(recipes, "recipes", TypeReference::scalar("String")));
        decls.query(HandlerDeclaration::new(authors, "authors", TypeReference::scalar("String")));
        let registry = decls.finish().unwrap();

        let options = BuildSchemaOptions::default();
        let allowed = [authors];
        let context = BuildContext::new(&registry, &options, Some(&allowed)).unwrap();
        let bindings = context.effective_handlers(registry.root_handlers_metadata(RootKind::Query));
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].handler.method_name, "authors");
    }

    #[test]
    fn test_field_resolver_on_interface_is_rejected() {
        let mut decls = Declarations::new();
        let node = decls.entity("Node");
        let resolver = decls.entity("NodeResolver");
        decls.interface_type(
            ClassDeclaration::new(node).field(FieldDeclaration::new("id", TypeReference::scalar("ID"))),
        );
        decls.resolver(ResolverDeclaration::new(resolver).of_type(TypeReference::declared(node)));
        decls.resolve_field(HandlerDeclaration::new(resolver, "label", TypeReference::scalar("String")));
        let registry = decls.finish().unwrap();

        let options = BuildSchemaOptions::default();
        let err = BuildContext::new(&registry, &options, None).err().unwrap();
        assert!(matches!(
            err,
            BuildError::UndefinedResolverType { ref resolver } if resolver == "NodeResolver"
        ));
    }

    #[test]
    fn test_orphan_count_skips_realized_types() {
        let mut decls = Declarations::new();
        let recipe = decls.entity("Recipe");
        let audit = decls.entity("Audit");
        let resolver = decls.entity("RecipeResolver");
        for target in [recipe, audit] {
            decls.object_type(
                ClassDeclaration::new(target).field(FieldDeclaration::new("id", TypeReference::scalar("ID"))),
            );
        }
        decls.query(HandlerDeclaration::new(resolver, "recipe", TypeReference::declared(recipe)));
        let registry = decls.finish().unwrap();

        let options = BuildSchemaOptions::default();
        let mut context = BuildContext::new(&registry, &options, None).unwrap();
        assert!(context.build_root(RootKind::Query).unwrap().is_some());
        context.orphans.register(audit);

        assert_eq!(context.realize_orphans().unwrap(), 1);
        assert!(context.storage.cached_object(audit).is_some());
    }

    #[test]
    fn test_field_resolver_without_type() {
        let mut decls = Declarations::new();
        let resolver = decls.entity("RecipeResolver");
        decls.resolver(ResolverDeclaration::new(resolver));
        decls.resolve_field(HandlerDeclaration::untyped(resolver, "rating"));
        let registry = decls.finish().unwrap();

        let options = BuildSchemaOptions::default();
        let err = BuildContext::new(&registry, &options, None).err().unwrap();
        assert!(matches!(
            err,
            BuildError::UndefinedResolverType { ref resolver } if resolver == "RecipeResolver"
        ));
    }
}
