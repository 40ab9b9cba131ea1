//! Type references and wrapping options.

use crate::entity::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A lazily evaluated type reference.
#[derive(Clone)]
pub struct TypeThunk(Arc<dyn Fn() -> TypeReference + Send + Sync>);

impl TypeThunk {
    pub fn new(thunk: impl Fn() -> TypeReference + Send + Sync + 'static) -> Self {
        Self(Arc::new(thunk))
    }

    /// Evaluates the thunk once.
    pub fn call(&self) -> TypeReference {
        (self.0)()
    }
}

/// A reference to a type, as written at a declaration site.
#[derive(Clone)]
pub enum TypeReference {
    /// A scalar by name (`String`, `Int`, `Date`, or a custom scalar).
    Scalar(String),
    /// A declared class-like entity.
    Declared(EntityId),
    /// A forward reference, evaluated at build time.
    Thunk(TypeThunk),
    /// A list of the inner reference.
    ListOf(Box<TypeReference>),
}

impl TypeReference {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    pub fn declared(id: EntityId) -> Self {
        Self::Declared(id)
    }

    pub fn thunk(thunk: impl Fn() -> TypeReference + Send + Sync + 'static) -> Self {
        Self::Thunk(TypeThunk::new(thunk))
    }

    pub fn list(inner: TypeReference) -> Self {
        Self::ListOf(Box::new(inner))
    }

    /// Evaluates every thunk, returning a reference free of `Thunk`.
    #[must_use]
    pub fn force(&self) -> TypeReference {
        match self {
            Self::Thunk(thunk) => thunk.call().force(),
            Self::ListOf(inner) => Self::ListOf(Box::new(inner.force())),
            other => other.clone(),
        }
    }

    /// Forces the reference and strips list wrappers, returning the base
    /// reference and the number of list layers removed.
    pub fn unwrap_lists(&self) -> (TypeReference, u32) {
        let mut current = self.force();
        let mut depth = 0;
        while let Self::ListOf(inner) = current {
            current = *inner;
            depth += 1;
        }
        (current, depth)
    }

    /// Returns the declared entity at the base of this reference.
    pub fn entity(&self) -> Option<EntityId> {
        match self.unwrap_lists().0 {
            Self::Declared(id) => Some(id),
            _ => None,
        }
    }
}

impl PartialEq for TypeReference {
    fn eq(&self, other: &Self) -> bool {
        match (self.force(), other.force()) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Declared(a), Self::Declared(b)) => a == b,
            (Self::ListOf(a), Self::ListOf(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(name) => f.debug_tuple("Scalar").field(name).finish(),
            Self::Declared(id) => f.debug_tuple("Declared").field(id).finish(),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
            Self::ListOf(inner) => f.debug_tuple("ListOf").field(inner).finish(),
        }
    }
}

/// Nullability of list items, per list layer or for all layers.
///
/// Per-layer entries are ordered outermost first: entry `0` governs the items
/// of the outermost list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayNullable {
    All(bool),
    PerDepth(Vec<bool>),
}

impl Default for ArrayNullable {
    fn default() -> Self {
        Self::All(false)
    }
}

impl ArrayNullable {
    /// Returns whether the items of the list at `layer` (0 = outermost) are
    /// nullable. Missing entries are non-null.
    pub fn at(&self, layer: usize) -> bool {
        match self {
            Self::All(nullable) => *nullable,
            Self::PerDepth(layers) => layers.get(layer).copied().unwrap_or(false),
        }
    }
}

/// How a reference is wrapped in nullability and list layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeOptions {
    /// Nullability of the outermost layer.
    pub nullable: bool,
    pub is_array: bool,
    pub array_depth: u32,
    pub array_nullable: ArrayNullable,
}

impl TypeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the outermost layer nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Wraps the type in `depth` list layers.
    #[must_use]
    pub fn list(mut self, depth: u32) -> Self {
        self.is_array = depth > 0;
        self.array_depth = depth;
        self
    }

    #[must_use]
    pub fn with_array_nullable(mut self, array_nullable: ArrayNullable) -> Self {
        self.array_nullable = array_nullable;
        self
    }

    /// Returns the number of list layers to apply.
    pub fn depth(&self) -> u32 {
        if self.is_array {
            self.array_depth.max(1)
        } else {
            0
        }
    }

    /// Applies list layers discovered by unwrapping a reference. Layers found
    /// in the reference take precedence over declared ones.
    #[must_use]
    pub fn with_reference_depth(self, depth: u32) -> Self {
        if depth == 0 {
            self
        } else {
            self.list(depth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_thunk() {
        let id = EntityId::from_raw(3);
        let reference = TypeReference::thunk(move || TypeReference::list(TypeReference::declared(id)));

        let (base, depth) = reference.unwrap_lists();
        assert_eq!(depth, 1);
        assert_eq!(base, TypeReference::Declared(id));
        assert_eq!(reference.entity(), Some(id));
    }

    #[test]
    fn test_identity_equality() {
        let a = EntityId::from_raw(1);
        let b = EntityId::from_raw(2);
        assert_eq!(TypeReference::declared(a), TypeReference::thunk(move || TypeReference::declared(a)));
        assert_ne!(TypeReference::declared(a), TypeReference::declared(b));
        assert_ne!(TypeReference::scalar("String"), TypeReference::declared(a));
    }

    #[test]
    fn test_nested_list_depth() {
        let reference = TypeReference::list(TypeReference::list(TypeReference::scalar("Int")));
        let (base, depth) = reference.unwrap_lists();
        assert_eq!(depth, 2);
        assert_eq!(base, TypeReference::scalar("Int"));

        let options = TypeOptions::new().with_reference_depth(depth);
        assert!(options.is_array);
        assert_eq!(options.depth(), 2);
    }

    #[test]
    fn test_array_nullable_at() {
        assert!(!ArrayNullable::default().at(0));
        assert!(ArrayNullable::All(true).at(3));

        let per_depth = ArrayNullable::PerDepth(vec![true, false]);
        assert!(per_depth.at(0));
        assert!(!per_depth.at(1));
        assert!(!per_depth.at(2));
    }

    #[test]
    fn test_depth_without_array() {
        let options = TypeOptions {
            array_depth: 3,
            ..TypeOptions::default()
        };
        assert_eq!(options.depth(), 0);
        assert_eq!(TypeOptions::new().list(0).depth(), 0);
        assert_eq!(
            TypeOptions {
                is_array: true,
                ..TypeOptions::default()
            }
            .depth(),
            1
        );
    }
}
