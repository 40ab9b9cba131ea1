//! Metadata records stored in the type registry.

use crate::entity::EntityId;
use crate::reference::{TypeOptions, TypeReference};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The root operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootKind {
    Query,
    Mutation,
    Subscription,
}

impl RootKind {
    pub const ALL: [RootKind; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    /// Returns the name of the root object type.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A custom directive applied to a type or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveUsage {
    pub name: String,
    #[serde(default)]
    pub arguments: IndexMap<String, Value>,
}

impl DirectiveUsage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

/// A property of a declared class.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    /// Declaring property name.
    pub name: String,
    /// Name exposed in the schema.
    pub schema_name: String,
    pub type_fn: TypeReference,
    pub options: TypeOptions,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    /// Explicit default, used when the instance supplies none.
    pub default_value: Option<Value>,
    pub directives: Vec<DirectiveUsage>,
}

/// An object, input, interface or arguments type declaration.
#[derive(Debug, Clone)]
pub struct ClassMetadata {
    pub target: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub is_abstract: bool,
    pub properties: Vec<FieldMetadata>,
    pub interfaces: Vec<TypeReference>,
    pub directives: Vec<DirectiveUsage>,
}

impl ClassMetadata {
    /// Finds a property by schema name.
    pub fn property(&self, schema_name: &str) -> Option<&FieldMetadata> {
        self.properties.iter().find(|p| p.schema_name == schema_name)
    }

    /// Merges a re-registration of the same target into this record.
    ///
    /// New properties, interfaces and directives are appended; properties
    /// whose schema name is already present are skipped. Returns the names of
    /// the skipped properties.
    pub(crate) fn merge(&mut self, other: ClassMetadata) -> Vec<String> {
        debug_assert_eq!(self.target, other.target);
        let mut skipped = Vec::new();
        for property in other.properties {
            if self.property(&property.schema_name).is_some() {
                skipped.push(property.schema_name);
            } else {
                self.properties.push(property);
            }
        }
        for interface in other.interfaces {
            if !self.interfaces.contains(&interface) {
                self.interfaces.push(interface);
            }
        }
        for directive in other.directives {
            if !self.directives.contains(&directive) {
                self.directives.push(directive);
            }
        }
        self.is_abstract |= other.is_abstract;
        if self.description.is_none() {
            self.description = other.description;
        }
        skipped
    }
}

/// A parameter of a handler.
#[derive(Debug, Clone)]
pub enum MethodArgKind {
    /// A single named argument.
    Arg {
        name: String,
        type_fn: TypeReference,
        options: TypeOptions,
        description: Option<String>,
        default_value: Option<Value>,
    },
    /// A whole argument bundle.
    Args { type_fn: TypeReference },
}

#[derive(Debug, Clone)]
pub struct MethodArgMetadata {
    /// Parameter position in the handler signature.
    pub index: usize,
    pub kind: MethodArgKind,
}

impl MethodArgMetadata {
    fn same_parameter(&self, other: &MethodArgMetadata) -> bool {
        match (&self.kind, &other.kind) {
            (MethodArgKind::Arg { name: a, .. }, MethodArgKind::Arg { name: b, .. }) => a == b,
            _ => self.index == other.index,
        }
    }
}

/// A query, mutation, subscription or field-resolver handler.
#[derive(Debug, Clone)]
pub struct HandlerMetadata {
    pub method_name: String,
    pub schema_name: String,
    /// The resolver class declaring the handler.
    pub target: EntityId,
    /// Return type. Field resolvers may omit it and reuse the property type.
    pub type_fn: Option<TypeReference>,
    pub return_type_options: TypeOptions,
    pub method_args: Vec<MethodArgMetadata>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub directives: Vec<DirectiveUsage>,
    pub complexity: Option<u32>,
    pub extensions: IndexMap<String, Value>,
}

impl HandlerMetadata {
    /// Merges a re-registration of the same handler, appending parameters
    /// that are not yet known. Returns the number of skipped parameters.
    pub(crate) fn merge(&mut self, other: HandlerMetadata) -> usize {
        let mut skipped = 0;
        for arg in other.method_args {
            if self.method_args.iter().any(|a| a.same_parameter(&arg)) {
                skipped += 1;
            } else {
                self.method_args.push(arg);
            }
        }
        for directive in other.directives {
            if !self.directives.contains(&directive) {
                self.directives.push(directive);
            }
        }
        for (key, value) in other.extensions {
            self.extensions.entry(key).or_insert(value);
        }
        skipped
    }
}

/// A scalar declared as an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarMetadata {
    pub target: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
}

/// A resolver class.
#[derive(Debug, Clone)]
pub struct ResolverClassMetadata {
    pub target: EntityId,
    /// The object type whose fields this class resolves.
    pub type_fn: Option<TypeReference>,
    pub is_abstract: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str) -> FieldMetadata {
        FieldMetadata {
            name: name.to_string(),
            schema_name: name.to_string(),
            type_fn: TypeReference::scalar("String"),
            options: TypeOptions::default(),
            description: None,
            deprecation_reason: None,
            default_value: None,
            directives: Vec::new(),
        }
    }

    fn class(target: EntityId, fields: &[&str]) -> ClassMetadata {
        ClassMetadata {
            target,
            name: "Recipe".into(),
            description: None,
            is_abstract: false,
            properties: fields.iter().map(|f| field(f)).collect(),
            interfaces: Vec::new(),
            directives: Vec::new(),
        }
    }

    #[test]
    fn test_class_merge() {
        let id = EntityId::from_raw(0);
        let mut first = class(id, &["id", "title"]);
        let skipped = first.merge(class(id, &["title", "rating"]));

        assert_eq!(skipped, vec!["title".to_string()]);
        let names: Vec<_> = first.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["id", "title", "rating"]);
    }

    #[test]
    fn test_handler_merge() {
        let arg = |index: usize, name: &str| MethodArgMetadata {
            index,
            kind: MethodArgKind::Arg {
                name: name.into(),
                type_fn: TypeReference::scalar("String"),
                options: TypeOptions::default(),
                description: None,
                default_value: None,
            },
        };
        let handler = |args: Vec<MethodArgMetadata>| HandlerMetadata {
            method_name: "recipe".into(),
            schema_name: "recipe".into(),
            target: EntityId::from_raw(1),
            type_fn: Some(TypeReference::scalar("String")),
            return_type_options: TypeOptions::default(),
            method_args: args,
            description: None,
            deprecation_reason: None,
            directives: Vec::new(),
            complexity: None,
            extensions: IndexMap::new(),
        };

        let mut first = handler(vec![arg(0, "id")]);
        let mut second = handler(vec![arg(0, "id"), arg(1, "locale")]);
        second.extensions.insert("cost".into(), json!(3));
        let skipped = first.merge(second);

        assert_eq!(skipped, 1);
        assert_eq!(first.method_args.len(), 2);
        assert_eq!(first.extensions.get("cost"), Some(&json!(3)));
    }

    #[test]
    fn test_root_kind_names() {
        let names: Vec<_> = RootKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["Query", "Mutation", "Subscription"]);
    }
}
