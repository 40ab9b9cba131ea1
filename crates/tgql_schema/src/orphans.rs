//! Orphaned type tracking.
//!
//! Some declared types never appear in a root field's type graph but must
//! still be emitted: implementers of an interface that is only ever returned
//! as the interface, and types referenced from outside the schema (for
//! example through a federation `@key`).

use indexmap::IndexSet;
use tgql_metadata::{ClassKind, ClassMetadata, EntityId, TypeReference, TypeRegistry};
use tracing::trace;

/// Declared types that must be emitted even if nothing reaches them.
#[derive(Debug, Default)]
pub struct OrphanedReferenceRegistry {
    seen: IndexSet<EntityId>,
    pending: Vec<EntityId>,
}

impl OrphanedReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the declared entity behind `reference`. Scalars are ignored.
    /// Returns true if the entity was not known yet.
    pub fn register_if_orphan(&mut self, reference: &TypeReference) -> bool {
        reference.entity().is_some_and(|id| self.register(id))
    }

    /// Records an entity by handle.
    pub fn register(&mut self, id: EntityId) -> bool {
        if self.seen.insert(id) {
            trace!(entity = id.as_raw(), "registered orphan reference");
            self.pending.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Returns the declarations registered since the last drain.
    ///
    /// An interface registers every non-abstract object type implementing
    /// it; those are returned by the next drain. Abstract declarations and
    /// entities that are not object, interface or input types are skipped.
    pub fn drain_orphans<'r>(
        &mut self,
        registry: &'r TypeRegistry,
    ) -> Vec<(ClassKind, &'r ClassMetadata)> {
        let mut drained = Vec::new();
        for id in std::mem::take(&mut self.pending) {
            if let Some(interface) = registry.interface_metadata(id) {
                for object in registry.object_types_metadata() {
                    let implements = object
                        .interfaces
                        .iter()
                        .any(|i| i.entity() == Some(id));
                    if implements && !object.is_abstract {
                        self.register(object.target);
                    }
                }
                if !interface.is_abstract {
                    drained.push((ClassKind::Interface, interface));
                }
            }
            if let Some(object) = registry.object_type_metadata(id) {
                if !object.is_abstract {
                    drained.push((ClassKind::Object, object));
                }
            }
            if let Some(input) = registry.input_type_metadata(id) {
                if !input.is_abstract {
                    drained.push((ClassKind::InputObject, input));
                }
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgql_metadata::{ClassDeclaration, Declarations, FieldDeclaration};

    fn field(name: &str) -> FieldDeclaration {
        FieldDeclaration::new(name, TypeReference::scalar("ID"))
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut orphans = OrphanedReferenceRegistry::new();
        let node = EntityId::from_raw(0);

        assert!(orphans.register_if_orphan(&TypeReference::declared(node)));
        assert!(!orphans.register_if_orphan(&TypeReference::declared(node)));
        assert!(!orphans.register_if_orphan(&TypeReference::scalar("String")));
        assert_eq!(orphans.len(), 1);
    }

    #[test]
    fn test_interface_brings_implementers() {
        let mut decls = Declarations::new();
        let node = decls.entity("Node");
        let recipe = decls.entity("Recipe");
        let draft = decls.entity("Draft");
        decls.interface_type(ClassDeclaration::new(node).field(field("id")));
        decls.object_type(
            ClassDeclaration::new(recipe)
                .field(field("id"))
                .implements(TypeReference::declared(node)),
        );
        decls.object_type(
            ClassDeclaration::new(draft)
                .abstract_type()
                .field(field("id"))
                .implements(TypeReference::declared(node)),
        );
        let registry = decls.finish().unwrap();

        let mut orphans = OrphanedReferenceRegistry::new();
        orphans.register(node);
        let first: Vec<_> = orphans
            .drain_orphans(&registry)
            .into_iter()
            .map(|(kind, class)| (kind, class.name.clone()))
            .collect();
        assert_eq!(first, vec![(ClassKind::Interface, "Node".to_string())]);

        let second: Vec<_> = orphans
            .drain_orphans(&registry)
            .into_iter()
            .map(|(_, class)| class.name.clone())
            .collect();
        assert_eq!(second, vec!["Recipe".to_string()]);
        assert!(orphans.drain_orphans(&registry).is_empty());
        assert!(!orphans.contains(draft));
    }
}
