//! The type registry.
//!
//! An append-only store of metadata records, one instance per build. Records
//! are keyed by their target entity; adding a record for a target that is
//! already present merges into the existing record instead of duplicating it.

use crate::entity::{EntityId, EntityTable};
use crate::metadata::{
    ClassMetadata, HandlerMetadata, ResolverClassMetadata, RootKind, ScalarMetadata,
};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// The category of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Object,
    InputObject,
    Interface,
    Args,
}

impl ClassKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object type",
            Self::InputObject => "input type",
            Self::Interface => "interface",
            Self::Args => "arguments type",
        }
    }
}

#[derive(Debug, Default)]
struct ClassStore {
    records: IndexMap<EntityId, ClassMetadata>,
}

impl ClassStore {
    fn upsert(&mut self, kind: ClassKind, metadata: ClassMetadata) {
        if let Some(existing) = self.records.get_mut(&metadata.target) {
            let skipped = existing.merge(metadata);
            for field in skipped {
                warn!(
                    class = %existing.name,
                    field = %field,
                    "skipping duplicate {} field",
                    kind.as_str()
                );
            }
            debug!(class = %existing.name, "merged {} metadata", kind.as_str());
        } else {
            debug!(class = %metadata.name, "registered {} metadata", kind.as_str());
            self.records.insert(metadata.target, metadata);
        }
    }
}

#[derive(Debug, Default)]
struct HandlerStore {
    records: IndexMap<(EntityId, String), HandlerMetadata>,
}

impl HandlerStore {
    fn upsert(&mut self, label: &str, metadata: HandlerMetadata) {
        let key = (metadata.target, metadata.method_name.clone());
        if let Some(existing) = self.records.get_mut(&key) {
            let skipped = existing.merge(metadata);
            debug!(handler = %existing.method_name, skipped, "merged {label} metadata");
        } else {
            debug!(handler = %metadata.method_name, "registered {label} metadata");
            self.records.insert(key, metadata);
        }
    }
}

/// Metadata of every declaration known to one build.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entities: EntityTable,
    object_types: ClassStore,
    input_types: ClassStore,
    interfaces: ClassStore,
    args: ClassStore,
    scalars: IndexMap<EntityId, ScalarMetadata>,
    resolvers: IndexMap<EntityId, ResolverClassMetadata>,
    queries: HandlerStore,
    mutations: HandlerStore,
    subscriptions: HandlerStore,
    field_resolvers: HandlerStore,
}

impl TypeRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityTable {
        &mut self.entities
    }

    /// Returns the name of an entity.
    pub fn entity_name(&self, id: EntityId) -> &str {
        self.entities.name(id)
    }

    pub fn add_object_type_metadata(&mut self, metadata: ClassMetadata) {
        self.object_types.upsert(ClassKind::Object, metadata);
    }

    pub fn add_input_type_metadata(&mut self, metadata: ClassMetadata) {
        self.input_types.upsert(ClassKind::InputObject, metadata);
    }

    pub fn add_interface_metadata(&mut self, metadata: ClassMetadata) {
        self.interfaces.upsert(ClassKind::Interface, metadata);
    }

    pub fn add_args_metadata(&mut self, metadata: ClassMetadata) {
        self.args.upsert(ClassKind::Args, metadata);
    }

    /// Adds a class record of the given category.
    pub fn add_class_metadata(&mut self, kind: ClassKind, metadata: ClassMetadata) {
        match kind {
            ClassKind::Object => self.add_object_type_metadata(metadata),
            ClassKind::InputObject => self.add_input_type_metadata(metadata),
            ClassKind::Interface => self.add_interface_metadata(metadata),
            ClassKind::Args => self.add_args_metadata(metadata),
        }
    }

    pub fn add_scalar_metadata(&mut self, metadata: ScalarMetadata) {
        debug!(scalar = %metadata.name, "registered scalar metadata");
        self.scalars.insert(metadata.target, metadata);
    }

    pub fn add_resolver_metadata(&mut self, metadata: ResolverClassMetadata) {
        match self.resolvers.get_mut(&metadata.target) {
            Some(existing) => {
                if metadata.type_fn.is_some() {
                    existing.type_fn = metadata.type_fn;
                }
                existing.is_abstract |= metadata.is_abstract;
            }
            None => {
                self.resolvers.insert(metadata.target, metadata);
            }
        }
    }

    pub fn add_query_metadata(&mut self, metadata: HandlerMetadata) {
        self.queries.upsert("query", metadata);
    }

    pub fn add_mutation_metadata(&mut self, metadata: HandlerMetadata) {
        self.mutations.upsert("mutation", metadata);
    }

    pub fn add_subscription_metadata(&mut self, metadata: HandlerMetadata) {
        self.subscriptions.upsert("subscription", metadata);
    }

    /// Adds a root handler of the given kind.
    pub fn add_root_handler_metadata(&mut self, kind: RootKind, metadata: HandlerMetadata) {
        match kind {
            RootKind::Query => self.add_query_metadata(metadata),
            RootKind::Mutation => self.add_mutation_metadata(metadata),
            RootKind::Subscription => self.add_subscription_metadata(metadata),
        }
    }

    pub fn add_field_resolver_metadata(&mut self, metadata: HandlerMetadata) {
        self.field_resolvers.upsert("field resolver", metadata);
    }

    pub fn object_types_metadata(&self) -> impl ExactSizeIterator<Item = &ClassMetadata> {
        self.object_types.records.values()
    }

    pub fn input_types_metadata(&self) -> impl ExactSizeIterator<Item = &ClassMetadata> {
        self.input_types.records.values()
    }

    pub fn interfaces_metadata(&self) -> impl ExactSizeIterator<Item = &ClassMetadata> {
        self.interfaces.records.values()
    }

    pub fn args_metadata(&self) -> impl ExactSizeIterator<Item = &ClassMetadata> {
        self.args.records.values()
    }

    pub fn scalars_metadata(&self) -> impl ExactSizeIterator<Item = &ScalarMetadata> {
        self.scalars.values()
    }

    pub fn resolvers_metadata(&self) -> impl ExactSizeIterator<Item = &ResolverClassMetadata> {
        self.resolvers.values()
    }

    /// Returns the root handlers of one kind, in registration order.
    pub fn root_handlers_metadata(
        &self,
        kind: RootKind,
    ) -> impl ExactSizeIterator<Item = &HandlerMetadata> {
        let store = match kind {
            RootKind::Query => &self.queries,
            RootKind::Mutation => &self.mutations,
            RootKind::Subscription => &self.subscriptions,
        };
        store.records.values()
    }

    pub fn field_resolvers_metadata(&self) -> impl ExactSizeIterator<Item = &HandlerMetadata> {
        self.field_resolvers.records.values()
    }

    /// Looks up a class record of one category.
    pub fn class_metadata(&self, kind: ClassKind, target: EntityId) -> Option<&ClassMetadata> {
        let store = match kind {
            ClassKind::Object => &self.object_types,
            ClassKind::InputObject => &self.input_types,
            ClassKind::Interface => &self.interfaces,
            ClassKind::Args => &self.args,
        };
        store.records.get(&target)
    }

    pub fn object_type_metadata(&self, target: EntityId) -> Option<&ClassMetadata> {
        self.class_metadata(ClassKind::Object, target)
    }

    pub fn input_type_metadata(&self, target: EntityId) -> Option<&ClassMetadata> {
        self.class_metadata(ClassKind::InputObject, target)
    }

    pub fn interface_metadata(&self, target: EntityId) -> Option<&ClassMetadata> {
        self.class_metadata(ClassKind::Interface, target)
    }

    pub fn args_type_metadata(&self, target: EntityId) -> Option<&ClassMetadata> {
        self.class_metadata(ClassKind::Args, target)
    }

    pub fn scalar_metadata(&self, target: EntityId) -> Option<&ScalarMetadata> {
        self.scalars.get(&target)
    }

    pub fn resolver_metadata(&self, target: EntityId) -> Option<&ResolverClassMetadata> {
        self.resolvers.get(&target)
    }

    /// Returns the class records of `kind` declared on the ancestors of
    /// `target`, most-base first.
    pub fn ancestor_metadata(&self, kind: ClassKind, target: EntityId) -> Vec<&ClassMetadata> {
        self.entities
            .ancestors(target)
            .into_iter()
            .filter_map(|ancestor| self.class_metadata(kind, ancestor))
            .collect()
    }

    /// Returns true if the resolver class is abstract.
    pub fn is_abstract_resolver(&self, target: EntityId) -> bool {
        self.resolvers.get(&target).is_some_and(|r| r.is_abstract)
    }
}
