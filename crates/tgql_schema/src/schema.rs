//! The realized schema graph.
//!
//! Named types live in an arena and refer to each other by [`TypeId`], so a
//! type that references itself, directly or through a cycle, points back at
//! the same arena slot instead of owning a copy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use tgql_metadata::{DirectiveUsage, EntityId, RootKind};

/// Index of a named type in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A possibly wrapped reference to a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeNode {
    Named(TypeId),
    List(Box<TypeNode>),
    NonNull(Box<TypeNode>),
}

impl TypeNode {
    pub fn list(inner: TypeNode) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeNode) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Returns the named type at the bottom of the wrappers.
    pub fn named(&self) -> TypeId {
        match self {
            Self::Named(id) => *id,
            Self::List(inner) | Self::NonNull(inner) => inner.named(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

/// Identifies the method an execution engine should call for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSlot {
    /// Declaring resolver class.
    pub target: EntityId,
    pub method_name: String,
}

/// Carries directives applied to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinitionNode {
    pub name: String,
    pub ty: TypeNode,
    pub directives: Vec<DirectiveUsage>,
}

/// Carries directives applied to an object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinitionNode {
    pub name: String,
    pub directives: Vec<DirectiveUsage>,
}

/// An argument or input object field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeNode,
    pub default_value: Option<Value>,
}

/// An output field.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub ty: TypeNode,
    pub args: IndexMap<String, InputValue>,
    /// Empty for plain property reads.
    pub resolver: Option<ResolverSlot>,
    pub ast_node: Option<FieldDefinitionNode>,
    pub extensions: IndexMap<String, Value>,
}

/// A built-in or custom scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
}

/// An object or interface type.
///
/// The shell is created as soon as the type is first referenced; its field
/// map is filled exactly once, after every type it depends on has a shell.
#[derive(Debug)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<TypeId>,
    pub ast_node: Option<TypeDefinitionNode>,
    /// The declaration this type was realized from. Roots have none.
    pub origin: Option<EntityId>,
    pub(crate) fields: OnceLock<IndexMap<String, Field>>,
}

impl ObjectType {
    pub(crate) fn shell(name: impl Into<String>, origin: Option<EntityId>) -> Self {
        Self {
            name: name.into(),
            description: None,
            interfaces: Vec::new(),
            ast_node: None,
            origin,
            fields: OnceLock::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get()?.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.get().into_iter().flat_map(IndexMap::values)
    }

    pub fn field_count(&self) -> usize {
        self.fields.get().map_or(0, IndexMap::len)
    }

    /// Returns true once the field map has been wired.
    pub fn is_wired(&self) -> bool {
        self.fields.get().is_some()
    }
}

#[derive(Debug)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub origin: Option<EntityId>,
    pub(crate) fields: OnceLock<IndexMap<String, InputValue>>,
}

impl InputObjectType {
    pub(crate) fn shell(name: impl Into<String>, origin: Option<EntityId>) -> Self {
        Self {
            name: name.into(),
            description: None,
            origin,
            fields: OnceLock::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&InputValue> {
        self.fields.get()?.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &InputValue> {
        self.fields.get().into_iter().flat_map(IndexMap::values)
    }

    pub fn field_count(&self) -> usize {
        self.fields.get().map_or(0, IndexMap::len)
    }
}

/// A named type of the schema.
#[derive(Debug)]
pub enum NamedType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(ObjectType),
    InputObject(InputObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Object(o) | Self::Interface(o) => &o.name,
            Self::InputObject(i) => &i.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => s.description.as_deref(),
            Self::Object(o) | Self::Interface(o) => o.description.as_deref(),
            Self::InputObject(i) => i.description.as_deref(),
        }
    }

    pub const fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Object(_) => TypeKind::Object,
            Self::Interface(_) => TypeKind::Interface,
            Self::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&ObjectType> {
        match self {
            Self::Interface(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            Self::InputObject(i) => Some(i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    InputObject,
}

impl TypeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "object type",
            Self::Interface => "interface",
            Self::InputObject => "input type",
        }
    }
}

/// Directive definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: IndexMap<String, DirectiveArgument>,
    pub locations: Vec<DirectiveLocation>,
    #[serde(default)]
    pub repeatable: bool,
}

/// An argument of a directive definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveArgument {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Type in schema notation, e.g. `[String!]!`.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl DirectiveArgument {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
        }
    }
}

/// Directive location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
            Self::Schema => "SCHEMA",
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::FieldDefinition => "FIELD_DEFINITION",
            Self::ArgumentDefinition => "ARGUMENT_DEFINITION",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::EnumValue => "ENUM_VALUE",
            Self::InputObject => "INPUT_OBJECT",
            Self::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A realized schema.
#[derive(Debug, Default)]
pub struct Schema {
    pub(crate) types: Vec<NamedType>,
    pub(crate) by_name: IndexMap<String, TypeId>,
    pub(crate) query: Option<TypeId>,
    pub(crate) mutation: Option<TypeId>,
    pub(crate) subscription: Option<TypeId>,
    pub(crate) directives: Vec<DirectiveDefinition>,
}

impl Schema {
    pub fn get(&self, id: TypeId) -> Option<&NamedType> {
        self.types.get(id.index())
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.type_id(name).and_then(|id| self.get(id))
    }

    /// Returns the name of a type, or an empty string for a foreign id.
    pub fn type_name(&self, id: TypeId) -> &str {
        self.get(id).map_or("", NamedType::name)
    }

    /// Returns all types in realization order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &NamedType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId::from_index(i), t))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn root_id(&self, kind: RootKind) -> Option<TypeId> {
        match kind {
            RootKind::Query => self.query,
            RootKind::Mutation => self.mutation,
            RootKind::Subscription => self.subscription,
        }
    }

    /// Returns the root object of one operation kind, if it is offered.
    pub fn root(&self, kind: RootKind) -> Option<&ObjectType> {
        self.root_id(kind)
            .and_then(|id| self.get(id))
            .and_then(NamedType::as_object)
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.root(RootKind::Query)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.root(RootKind::Mutation)
    }

    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.root(RootKind::Subscription)
    }

    pub fn directives(&self) -> &[DirectiveDefinition] {
        &self.directives
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// Renders a type node in schema notation.
    pub fn display_type(&self, node: &TypeNode) -> String {
        match node {
            TypeNode::Named(id) => self.type_name(*id).to_string(),
            TypeNode::List(inner) => format!("[{}]", self.display_type(inner)),
            TypeNode::NonNull(inner) => format!("{}!", self.display_type(inner)),
        }
    }
}
