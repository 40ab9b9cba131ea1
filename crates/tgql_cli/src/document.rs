//! JSON declaration documents.
//!
//! A document lists declared types and resolver classes by name. Types are
//! referenced with strings: `"Recipe"`, `"[Recipe]"`, `"String"`. Names of
//! declared entries become declared references, anything else is a scalar.
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "Recipe", "kind": "object", "fields": [
//!       { "name": "id", "type": "ID" },
//!       { "name": "tags", "type": "[String]", "nullable": true }
//!     ] }
//!   ],
//!   "resolvers": [
//!     { "name": "RecipeResolver", "of": "Recipe", "queries": [
//!       { "name": "recipes", "type": "[Recipe]", "args": [{ "name": "take", "type": "Int", "default": 10 }] }
//!     ] }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tgql_core::BuildError;
use tgql_metadata::{
    ArgDeclaration, ArrayNullable, ClassDeclaration, Declarations, DefaultValues, DirectiveUsage,
    EntityId, FieldDeclaration, HandlerDeclaration, NamedArg, ResolverDeclaration, TypeOptions,
    TypeReference, TypeRegistry,
};
use tgql_schema::BuildSchemaOptions;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a declaration document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed declaration document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{entity}` extends `{parent}`, which is not declared")]
    UnknownParent { entity: String, parent: String },

    #[error("inheritance cycle between {0}")]
    InheritanceCycle(String),

    #[error("`{0}` is not a declared type")]
    UnknownType(String),

    #[error("invalid type `{0}`")]
    InvalidTypeString(String),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl DocumentError {
    /// The diagnostic code of a fatal build error.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Build(error) => error.code(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeclarationDocument {
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub resolvers: Vec<ResolverEntry>,
    /// Types emitted even if nothing reaches them.
    #[serde(default)]
    pub orphaned_types: Vec<String>,
    #[serde(default)]
    pub options: BuildSchemaOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeEntryKind {
    Object,
    Interface,
    Input,
    Args,
    Scalar,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeEntry {
    /// Entity name. Entries of different kinds may share one entity.
    pub name: String,
    pub kind: TypeEntryKind,
    /// Name in the schema, if it differs from the entity name.
    pub schema_name: Option<String>,
    pub description: Option<String>,
    pub extends: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub schema_name: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    pub array_nullable: Option<ArrayNullable>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    /// Explicit default value.
    pub default: Option<Value>,
    /// Value the representative instance assigns.
    pub instance_default: Option<Value>,
    #[serde(default)]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolverEntry {
    pub name: String,
    pub extends: Option<String>,
    /// The object type field resolvers attach to.
    pub of: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub queries: Vec<HandlerEntry>,
    #[serde(default)]
    pub mutations: Vec<HandlerEntry>,
    #[serde(default)]
    pub subscriptions: Vec<HandlerEntry>,
    #[serde(default)]
    pub fields: Vec<HandlerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HandlerEntry {
    /// Method name.
    pub name: String,
    pub schema_name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    pub array_nullable: Option<ArrayNullable>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub complexity: Option<u32>,
    #[serde(default)]
    pub args: Vec<ArgEntry>,
    #[serde(default)]
    pub directives: Vec<DirectiveUsage>,
    #[serde(default)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgEntry {
    /// `{ "args": "RecipesArgs" }`
    Bundle { args: String },
    Named(NamedArgEntry),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NamedArgEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub nullable: bool,
    pub array_nullable: Option<ArrayNullable>,
    pub description: Option<String>,
    pub default: Option<Value>,
}

/// A document turned into a finished registry.
#[derive(Debug)]
pub struct DeclaredDocument {
    pub registry: TypeRegistry,
    pub entities: IndexMap<String, EntityId>,
    pub orphaned_types: Vec<EntityId>,
    pub options: BuildSchemaOptions,
}

impl DeclarationDocument {
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let source = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&source)
    }

    /// Registers every entry and drains the deferred queue.
    pub fn declare(&self) -> Result<DeclaredDocument, DocumentError> {
        let mut decls = Declarations::new();
        let entities = self.declare_entities(&mut decls)?;
        let scope = Scope {
            entities: &entities,
        };

        for entry in &self.types {
            let target = scope.entity(&entry.name)?;
            if entry.kind == TypeEntryKind::Scalar {
                decls.scalar(target, entry.schema_name.clone(), entry.description.clone());
                continue;
            }
            let defaults: DefaultValues = entry
                .fields
                .iter()
                .filter_map(|f| Some((f.name.clone(), f.instance_default.clone()?)))
                .collect();
            if !defaults.is_empty() {
                decls.set_defaults(target, move || defaults.clone());
            }

            let class = scope.class(target, entry)?;
            match entry.kind {
                TypeEntryKind::Object => decls.object_type(class),
                TypeEntryKind::Interface => decls.interface_type(class),
                TypeEntryKind::Input => decls.input_type(class),
                TypeEntryKind::Args => decls.args_type(class),
                TypeEntryKind::Scalar => {}
            }
        }

        for entry in &self.resolvers {
            let target = scope.entity(&entry.name)?;
            let mut resolver = ResolverDeclaration::new(target);
            if let Some(of) = &entry.of {
                resolver = resolver.of_type(TypeReference::declared(scope.entity(of)?));
            }
            if entry.is_abstract {
                resolver = resolver.abstract_resolver();
            }
            decls.resolver(resolver);

            for handler in &entry.queries {
                decls.query(scope.handler(target, handler)?);
            }
            for handler in &entry.mutations {
                decls.mutation(scope.handler(target, handler)?);
            }
            for handler in &entry.subscriptions {
                decls.subscription(scope.handler(target, handler)?);
            }
            for handler in &entry.fields {
                decls.resolve_field(scope.handler(target, handler)?);
            }
        }

        let orphaned_types = self
            .orphaned_types
            .iter()
            .map(|name| scope.entity(name))
            .collect::<Result<Vec<_>, _>>()?;
        let registry = decls.finish()?;
        debug!(entities = entities.len(), "declared document");
        Ok(DeclaredDocument {
            registry,
            entities,
            orphaned_types,
            options: self.options.clone(),
        })
    }

    /// Declares one entity per distinct name, parents before children.
    fn declare_entities(
        &self,
        decls: &mut Declarations,
    ) -> Result<IndexMap<String, EntityId>, DocumentError> {
        let mut wanted: IndexMap<&str, Option<&str>> = IndexMap::new();
        let named = self
            .types
            .iter()
            .map(|t| (t.name.as_str(), t.extends.as_deref()))
            .chain(self.resolvers.iter().map(|r| (r.name.as_str(), r.extends.as_deref())));
        for (name, parent) in named {
            let slot = wanted.entry(name).or_insert(None);
            if slot.is_none() {
                *slot = parent;
            }
        }

        let mut entities = IndexMap::new();
        while !wanted.is_empty() {
            let before = wanted.len();
            wanted.retain(|&name, parent| match parent {
                None => {
                    entities.insert(name.to_string(), decls.entity(name));
                    false
                }
                Some(parent) => match entities.get(*parent) {
                    Some(&parent_id) => {
                        entities.insert(name.to_string(), decls.entity_extending(name, parent_id));
                        false
                    }
                    None => true,
                },
            });
            if wanted.len() == before {
                return Err(unresolved_parents(&wanted));
            }
        }
        Ok(entities)
    }
}

fn unresolved_parents(wanted: &IndexMap<&str, Option<&str>>) -> DocumentError {
    for (name, parent) in wanted {
        if let Some(parent) = parent {
            if !wanted.contains_key(parent) {
                return DocumentError::UnknownParent {
                    entity: (*name).to_string(),
                    parent: (*parent).to_string(),
                };
            }
        }
    }
    let names: Vec<_> = wanted.keys().map(|n| format!("`{n}`")).collect();
    DocumentError::InheritanceCycle(names.join(", "))
}

struct Scope<'d> {
    entities: &'d IndexMap<String, EntityId>,
}

impl Scope<'_> {
    fn entity(&self, name: &str) -> Result<EntityId, DocumentError> {
        self.entities
            .get(name)
            .copied()
            .ok_or_else(|| DocumentError::UnknownType(name.to_string()))
    }

    /// Parses a type string. Brackets denote list layers.
    fn reference(&self, ty: &str) -> Result<TypeReference, DocumentError> {
        let ty = ty.trim();
        if let Some(inner) = ty.strip_prefix('[') {
            let inner = inner
                .strip_suffix(']')
                .ok_or_else(|| DocumentError::InvalidTypeString(ty.to_string()))?;
            return Ok(TypeReference::list(self.reference(inner)?));
        }
        if ty.is_empty() || ty.contains([']', '!', ' ']) {
            return Err(DocumentError::InvalidTypeString(ty.to_string()));
        }
        Ok(match self.entities.get(ty) {
            Some(&id) => TypeReference::declared(id),
            None => TypeReference::scalar(ty),
        })
    }

    fn class(&self, target: EntityId, entry: &TypeEntry) -> Result<ClassDeclaration, DocumentError> {
        let mut class = ClassDeclaration::new(target);
        if let Some(name) = &entry.schema_name {
            class = class.named(name);
        }
        if let Some(description) = &entry.description {
            class = class.description(description);
        }
        if entry.is_abstract {
            class = class.abstract_type();
        }
        for interface in &entry.implements {
            class = class.implements(TypeReference::declared(self.entity(interface)?));
        }
        for directive in &entry.directives {
            class = class.directive(directive.clone());
        }
        for field in &entry.fields {
            class = class.field(self.field(field)?);
        }
        Ok(class)
    }

    fn field(&self, entry: &FieldEntry) -> Result<FieldDeclaration, DocumentError> {
        let mut field = match &entry.ty {
            Some(ty) => FieldDeclaration::new(&entry.name, self.reference(ty)?),
            None => FieldDeclaration::untyped(&entry.name),
        };
        field = field.options(options(entry.nullable, entry.array_nullable.as_ref()));
        if let Some(name) = &entry.schema_name {
            field = field.renamed(name);
        }
        if let Some(description) = &entry.description {
            field = field.description(description);
        }
        if let Some(reason) = &entry.deprecation_reason {
            field = field.deprecated(reason);
        }
        if let Some(default) = &entry.default {
            field = field.default_value(default.clone());
        }
        for directive in &entry.directives {
            field = field.directive(directive.clone());
        }
        Ok(field)
    }

    fn handler(&self, target: EntityId, entry: &HandlerEntry) -> Result<HandlerDeclaration, DocumentError> {
        let mut handler = match &entry.ty {
            Some(ty) => HandlerDeclaration::new(target, &entry.name, self.reference(ty)?),
            None => HandlerDeclaration::untyped(target, &entry.name),
        };
        handler = handler.options(options(entry.nullable, entry.array_nullable.as_ref()));
        if let Some(name) = &entry.schema_name {
            handler = handler.named(name);
        }
        if let Some(description) = &entry.description {
            handler = handler.description(description);
        }
        if let Some(reason) = &entry.deprecation_reason {
            handler = handler.deprecated(reason);
        }
        if let Some(complexity) = entry.complexity {
            handler = handler.complexity(complexity);
        }
        for directive in &entry.directives {
            handler = handler.directive(directive.clone());
        }
        for (key, value) in &entry.extensions {
            handler = handler.extension(key, value.clone());
        }
        for arg in &entry.args {
            handler = handler.arg(self.arg(arg)?);
        }
        Ok(handler)
    }

    fn arg(&self, entry: &ArgEntry) -> Result<ArgDeclaration, DocumentError> {
        Ok(match entry {
            ArgEntry::Bundle { args } => ArgDeclaration::args(TypeReference::declared(self.entity(args)?)),
            ArgEntry::Named(named) => {
                let mut arg = NamedArg::new(&named.name, self.reference(&named.ty)?)
                    .options(options(named.nullable, named.array_nullable.as_ref()));
                if let Some(description) = &named.description {
                    arg = arg.description(description);
                }
                if let Some(default) = &named.default {
                    arg = arg.default_value(default.clone());
                }
                arg.into()
            }
        })
    }
}

/// List depth comes from the type string; only nullability is set here.
fn options(nullable: bool, array_nullable: Option<&ArrayNullable>) -> TypeOptions {
    let mut options = TypeOptions::new();
    if nullable {
        options = options.nullable();
    }
    if let Some(array_nullable) = array_nullable {
        options = options.with_array_nullable(array_nullable.clone());
    }
    options
}
