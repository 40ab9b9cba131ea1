//! Declared entities.
//!
//! An entity is the identity of a class-like declaration. Metadata records of
//! every category are keyed by [`EntityId`], never by name, so two
//! declarations that happen to share a name stay distinct.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A handle uniquely identifying a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an `EntityId` from a raw value.
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

/// Property defaults of a freshly constructed instance.
pub type DefaultValues = IndexMap<String, Value>;

/// Constructs the representative object of an entity and reports the
/// defaults its properties were assigned.
///
/// Factories must not have side effects beyond producing the defaults.
#[derive(Clone)]
pub struct DefaultsFactory(Arc<dyn Fn() -> DefaultValues + Send + Sync>);

impl DefaultsFactory {
    pub fn new(factory: impl Fn() -> DefaultValues + Send + Sync + 'static) -> Self {
        Self(Arc::new(factory))
    }

    /// Runs the factory.
    pub fn instantiate(&self) -> DefaultValues {
        (self.0)()
    }
}

impl fmt::Debug for DefaultsFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultsFactory(..)")
    }
}

/// A declared entity.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    /// The entity this one extends, if any.
    pub extends: Option<EntityId>,
    defaults: Option<DefaultsFactory>,
}

/// Append-only table of entities.
///
/// A parent must be declared before its children, so `extends` chains are
/// always finite.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: Vec<Entity>,
}

impl EntityTable {
    /// Creates an empty entity table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new entity.
    pub fn declare(&mut self, name: impl Into<String>) -> EntityId {
        self.push(name.into(), None)
    }

    /// Declares a new entity extending `parent`.
    pub fn declare_extending(&mut self, name: impl Into<String>, parent: EntityId) -> EntityId {
        debug_assert!(self.get(parent).is_some(), "parent must be declared first");
        self.push(name.into(), Some(parent))
    }

    fn push(&mut self, name: String, extends: Option<EntityId>) -> EntityId {
        let id = EntityId(u32::try_from(self.entities.len()).unwrap_or(u32::MAX));
        self.entities.push(Entity {
            name,
            extends,
            defaults: None,
        });
        id
    }

    /// Gets an entity by ID.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize)
    }

    /// Returns the entity name, or `<unknown>` for a foreign handle.
    pub fn name(&self, id: EntityId) -> &str {
        self.get(id).map_or("<unknown>", |e| e.name.as_str())
    }

    /// Returns the direct parent of an entity.
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.get(id).and_then(|e| e.extends)
    }

    /// Returns the ancestors of an entity, most-base first.
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if chain.contains(&parent) || parent == id {
                break;
            }
            chain.push(parent);
            current = self.parent(parent);
        }
        chain.reverse();
        chain
    }

    /// Attaches a defaults factory to an entity.
    pub fn set_defaults(&mut self, id: EntityId, factory: DefaultsFactory) {
        if let Some(entity) = self.entities.get_mut(id.0 as usize) {
            entity.defaults = Some(factory);
        }
    }

    /// Instantiates the representative object of an entity.
    ///
    /// Factories run most-base first, as constructors would; a value set by
    /// a derived entity replaces the inherited one. `None` if no entity in
    /// the chain has a factory.
    pub fn instantiate(&self, id: EntityId) -> Option<DefaultValues> {
        let mut instance: Option<DefaultValues> = None;
        for entity in self.ancestors(id).into_iter().chain(std::iter::once(id)) {
            let Some(factory) = self.get(entity).and_then(|e| e.defaults.as_ref()) else {
                continue;
            };
            instance.get_or_insert_with(DefaultValues::new).extend(factory.instantiate());
        }
        instance
    }

    /// Iterates over every entity in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(u32::try_from(i).unwrap_or(u32::MAX)), e))
    }

    /// Returns the number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity has been declared.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ancestors_most_base_first() {
        let mut table = EntityTable::new();
        let base = table.declare("PaginationArgs");
        let mid = table.declare_extending("FilterArgs", base);
        let leaf = table.declare_extending("RecipesArgs", mid);

        assert_eq!(table.ancestors(leaf), vec![base, mid]);
        assert!(table.ancestors(base).is_empty());
    }

    #[test]
    fn test_instantiate() {
        let mut table = EntityTable::new();
        let args = table.declare("RecipesArgs");
        assert!(table.instantiate(args).is_none());

        table.set_defaults(
            args,
            DefaultsFactory::new(|| {
                let mut defaults = DefaultValues::new();
                defaults.insert("take".into(), json!(25));
                defaults
            }),
        );
        let defaults = table.instantiate(args).unwrap();
        assert_eq!(defaults.get("take"), Some(&json!(25)));
    }

    #[test]
    fn test_instantiate_runs_ancestor_factories() {
        let mut table = EntityTable::new();
        let base = table.declare("PaginationArgs");
        let plain = table.declare_extending("RecipesArgs", base);
        let derived = table.declare_extending("TopRecipesArgs", base);
        table.set_defaults(
            base,
            DefaultsFactory::new(|| DefaultValues::from([("skip".into(), json!(0)), ("take".into(), json!(25))])),
        );
        table.set_defaults(
            derived,
            DefaultsFactory::new(|| DefaultValues::from([("take".into(), json!(5))])),
        );

        let plain = table.instantiate(plain).unwrap();
        assert_eq!(plain.get("take"), Some(&json!(25)));

        let derived = table.instantiate(derived).unwrap();
        assert_eq!(derived.get("skip"), Some(&json!(0)));
        assert_eq!(derived.get("take"), Some(&json!(5)));
    }

    #[test]
    fn test_name_of_foreign_handle() {
        let table = EntityTable::new();
        assert_eq!(table.name(EntityId::from_raw(7)), "<unknown>");
    }
}
