//! Per-build storage of realized types.

use crate::options::ScalarImpl;
use crate::schema::{InputObjectType, NamedType, ObjectType, ScalarType, Schema, TypeId};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tgql_core::{BuildError, BuildResult};
use tgql_metadata::{EntityId, RootKind};
use tracing::trace;

/// What claimed a schema name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NameOwner {
    Scalar,
    Root(RootKind),
    Object(EntityId),
    Interface(EntityId),
    Input(EntityId),
}

#[derive(Debug)]
struct NameClaim {
    id: TypeId,
    owner: NameOwner,
    /// Human-readable description of the claimant.
    label: String,
}

/// A type shell whose fields are still to be wired.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PendingWiring {
    Object { id: TypeId, target: EntityId },
    Interface { id: TypeId, target: EntityId },
    Input { id: TypeId, target: EntityId },
}

/// The arena under construction plus its caches.
///
/// Each declared entity is realized at most once per category; later
/// references get the cached [`TypeId`].
#[derive(Debug, Default)]
pub(crate) struct TypeStorage {
    types: Vec<NamedType>,
    names: IndexMap<String, NameClaim>,
    objects: FxHashMap<EntityId, TypeId>,
    interfaces: FxHashMap<EntityId, TypeId>,
    inputs: FxHashMap<EntityId, TypeId>,
    pending: VecDeque<PendingWiring>,
}

impl TypeStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, ty: NamedType, owner: NameOwner, label: String) -> BuildResult<TypeId> {
        let name = ty.name().to_string();
        if let Some(claim) = self.names.get(&name) {
            return Err(BuildError::NamingConflict {
                name,
                first: claim.label.clone(),
                second: label,
            });
        }
        let id = TypeId::from_index(self.types.len());
        trace!(name = %name, ?owner, "realized type shell");
        self.types.push(ty);
        self.names.insert(name, NameClaim { id, owner, label });
        Ok(id)
    }

    /// Returns the scalar with this name, realizing it on first use.
    pub(crate) fn scalar(&mut self, scalar: ScalarImpl) -> BuildResult<TypeId> {
        if let Some(claim) = self.names.get(&scalar.name) {
            if claim.owner == NameOwner::Scalar {
                return Ok(claim.id);
            }
        }
        let label = format!("scalar `{}`", scalar.name);
        self.insert(
            NamedType::Scalar(ScalarType {
                name: scalar.name,
                description: scalar.description,
                specified_by_url: scalar.specified_by_url,
            }),
            NameOwner::Scalar,
            label,
        )
    }

    pub(crate) fn cached_object(&self, target: EntityId) -> Option<TypeId> {
        self.objects.get(&target).copied()
    }

    pub(crate) fn cached_interface(&self, target: EntityId) -> Option<TypeId> {
        self.interfaces.get(&target).copied()
    }

    pub(crate) fn cached_input(&self, target: EntityId) -> Option<TypeId> {
        self.inputs.get(&target).copied()
    }

    /// Caches a new object shell and schedules its wiring. `label` names
    /// the declaration in conflict reports.
    pub(crate) fn object_shell(
        &mut self,
        target: EntityId,
        shell: ObjectType,
        label: String,
    ) -> BuildResult<TypeId> {
        let id = self.insert(NamedType::Object(shell), NameOwner::Object(target), label)?;
        self.objects.insert(target, id);
        self.pending.push_back(PendingWiring::Object { id, target });
        Ok(id)
    }

    pub(crate) fn interface_shell(
        &mut self,
        target: EntityId,
        shell: ObjectType,
        label: String,
    ) -> BuildResult<TypeId> {
        let id = self.insert(NamedType::Interface(shell), NameOwner::Interface(target), label)?;
        self.interfaces.insert(target, id);
        self.pending.push_back(PendingWiring::Interface { id, target });
        Ok(id)
    }

    pub(crate) fn input_shell(
        &mut self,
        target: EntityId,
        shell: InputObjectType,
        label: String,
    ) -> BuildResult<TypeId> {
        let id = self.insert(NamedType::InputObject(shell), NameOwner::Input(target), label)?;
        self.inputs.insert(target, id);
        self.pending.push_back(PendingWiring::Input { id, target });
        Ok(id)
    }

    /// Adds a root object. Root fields are wired by the caller.
    pub(crate) fn root(&mut self, kind: RootKind) -> BuildResult<TypeId> {
        self.insert(
            NamedType::Object(ObjectType::shell(kind.type_name(), None)),
            NameOwner::Root(kind),
            format!("{kind} root"),
        )
    }

    pub(crate) fn next_pending(&mut self) -> Option<PendingWiring> {
        self.pending.pop_front()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> Option<&mut NamedType> {
        self.types.get_mut(id.index())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.types.len()
    }

    /// Hands the arena over to a schema.
    pub(crate) fn into_schema(self) -> Schema {
        Schema {
            by_name: self
                .names
                .into_iter()
                .map(|(name, claim)| (name, claim.id))
                .collect(),
            types: self.types,
            ..Schema::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_is_interned() {
        let mut storage = TypeStorage::new();
        let a = storage.scalar(ScalarImpl::new("String")).unwrap();
        let b = storage.scalar(ScalarImpl::new("String")).unwrap();
        assert_eq!(a, b);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_shell_is_cached_and_pending() {
        let mut storage = TypeStorage::new();
        let recipe = EntityId::from_raw(0);
        let id = storage
            .object_shell(recipe, ObjectType::shell("Recipe", Some(recipe)), "Recipe".into())
            .unwrap();

        assert_eq!(storage.cached_object(recipe), Some(id));
        assert!(storage.cached_input(recipe).is_none());
        assert!(matches!(
            storage.next_pending(),
            Some(PendingWiring::Object { id: pending, .. }) if pending == id
        ));
        assert!(!storage.has_pending());
    }

    #[test]
    fn test_name_claimed_twice() {
        let mut storage = TypeStorage::new();
        let recipe = EntityId::from_raw(0);
        let other = EntityId::from_raw(1);
        storage
            .object_shell(recipe, ObjectType::shell("Recipe", Some(recipe)), "object type `Recipe`".into())
            .unwrap();

        let err = storage
            .input_shell(other, InputObjectType::shell("Recipe", Some(other)), "input type `Recipe`".into())
            .unwrap_err();
        match err {
            BuildError::NamingConflict { name, first, second } => {
                assert_eq!(name, "Recipe");
                assert_eq!(first, "object type `Recipe`");
                assert_eq!(second, "input type `Recipe`");
            }
            other => panic!("unexpected error: {other}"),
        }

        storage.root(RootKind::Query).unwrap();
        assert!(storage.scalar(ScalarImpl::new("Query")).is_err());
    }
}
