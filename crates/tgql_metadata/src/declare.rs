//! Registration API.
//!
//! Building a schema is a two-call contract: declare everything on a
//! [`Declarations`] value, then call [`Declarations::finish`] to drain the
//! deferred queue into a [`TypeRegistry`]. Declarations can be made in any
//! order; references between them are resolved only at drain time.

use crate::entity::{DefaultValues, DefaultsFactory, EntityId};
use crate::lazy::LazyMetadataQueue;
use crate::metadata::{
    ClassMetadata, DirectiveUsage, FieldMetadata, HandlerMetadata, MethodArgKind,
    MethodArgMetadata, ResolverClassMetadata, RootKind, ScalarMetadata,
};
use crate::reference::{TypeOptions, TypeReference};
use crate::registry::{ClassKind, TypeRegistry};
use indexmap::IndexMap;
use serde_json::Value;
use tgql_core::{BuildError, BuildResult, Location};

/// A property declaration.
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub name: String,
    pub schema_name: Option<String>,
    pub type_ref: Option<TypeReference>,
    pub options: TypeOptions,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub default_value: Option<Value>,
    pub directives: Vec<DirectiveUsage>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, type_ref: TypeReference) -> Self {
        Self {
            type_ref: Some(type_ref),
            ..Self::untyped(name)
        }
    }

    /// A property without a type. Registration fails when it is drained.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_name: None,
            type_ref: None,
            options: TypeOptions::default(),
            description: None,
            deprecation_reason: None,
            default_value: None,
            directives: Vec::new(),
        }
    }

    /// Exposes the property under a different schema name.
    #[must_use]
    pub fn renamed(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: TypeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.options.nullable = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: DirectiveUsage) -> Self {
        self.directives.push(directive);
        self
    }

    fn compile(self, owner: &str) -> BuildResult<FieldMetadata> {
        let type_fn = self.type_ref.ok_or_else(|| BuildError::UndeterminedType {
            location: Location::member(owner, &self.name),
        })?;
        Ok(FieldMetadata {
            schema_name: self.schema_name.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            type_fn,
            options: self.options,
            description: self.description,
            deprecation_reason: self.deprecation_reason,
            default_value: self.default_value,
            directives: self.directives,
        })
    }
}

/// An object, input, interface or arguments type declaration.
#[derive(Debug, Clone)]
pub struct ClassDeclaration {
    pub target: EntityId,
    /// Schema name; defaults to the entity name.
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_abstract: bool,
    pub fields: Vec<FieldDeclaration>,
    pub interfaces: Vec<TypeReference>,
    pub directives: Vec<DirectiveUsage>,
}

impl ClassDeclaration {
    pub fn new(target: EntityId) -> Self {
        Self {
            target,
            name: None,
            description: None,
            is_abstract: false,
            fields: Vec::new(),
            interfaces: Vec::new(),
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the type abstract: it lends fields to subtypes but is not
    /// emitted on its own.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: TypeReference) -> Self {
        self.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: DirectiveUsage) -> Self {
        self.directives.push(directive);
        self
    }

    fn compile(self, registry: &TypeRegistry) -> BuildResult<ClassMetadata> {
        let name = self
            .name
            .unwrap_or_else(|| registry.entity_name(self.target).to_string());
        let properties = self
            .fields
            .into_iter()
            .map(|field| field.compile(&name))
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(ClassMetadata {
            target: self.target,
            name,
            description: self.description,
            is_abstract: self.is_abstract,
            properties,
            interfaces: self.interfaces,
            directives: self.directives,
        })
    }
}

/// A single named handler argument.
#[derive(Debug, Clone)]
pub struct NamedArg {
    pub name: String,
    pub type_ref: Option<TypeReference>,
    pub options: TypeOptions,
    pub description: Option<String>,
    pub default_value: Option<Value>,
}

impl NamedArg {
    pub fn new(name: impl Into<String>, type_ref: TypeReference) -> Self {
        Self {
            name: name.into(),
            type_ref: Some(type_ref),
            options: TypeOptions::default(),
            description: None,
            default_value: None,
        }
    }

    #[must_use]
    pub fn options(mut self, options: TypeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.options.nullable = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A handler parameter.
#[derive(Debug, Clone)]
pub enum ArgDeclaration {
    Arg(NamedArg),
    /// A whole argument bundle.
    Args(Option<TypeReference>),
}

impl ArgDeclaration {
    pub fn arg(name: impl Into<String>, type_ref: TypeReference) -> Self {
        Self::Arg(NamedArg::new(name, type_ref))
    }

    pub fn args(bundle: TypeReference) -> Self {
        Self::Args(Some(bundle))
    }
}

impl From<NamedArg> for ArgDeclaration {
    fn from(arg: NamedArg) -> Self {
        Self::Arg(arg)
    }
}

/// A query, mutation, subscription or field-resolver declaration.
#[derive(Debug, Clone)]
pub struct HandlerDeclaration {
    /// The declaring resolver class.
    pub target: EntityId,
    pub method_name: String,
    /// Schema name; defaults to the method name.
    pub name: Option<String>,
    pub return_type: Option<TypeReference>,
    pub options: TypeOptions,
    pub args: Vec<ArgDeclaration>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub directives: Vec<DirectiveUsage>,
    pub complexity: Option<u32>,
    pub extensions: IndexMap<String, Value>,
}

impl HandlerDeclaration {
    pub fn new(target: EntityId, method_name: impl Into<String>, return_type: TypeReference) -> Self {
        Self {
            return_type: Some(return_type),
            ..Self::untyped(target, method_name)
        }
    }

    /// A handler without an explicit return type.
    pub fn untyped(target: EntityId, method_name: impl Into<String>) -> Self {
        Self {
            target,
            method_name: method_name.into(),
            name: None,
            return_type: None,
            options: TypeOptions::default(),
            args: Vec::new(),
            description: None,
            deprecation_reason: None,
            directives: Vec::new(),
            complexity: None,
            extensions: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: TypeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.options.nullable = true;
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<ArgDeclaration>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: DirectiveUsage) -> Self {
        self.directives.push(directive);
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: u32) -> Self {
        self.complexity = Some(complexity);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    fn compile(
        self,
        registry: &TypeRegistry,
        kind: &str,
        require_return_type: bool,
    ) -> BuildResult<HandlerMetadata> {
        let owner = registry.entity_name(self.target).to_string();
        if require_return_type && self.return_type.is_none() {
            return Err(BuildError::UndefinedReturnType {
                kind: kind.to_string(),
                location: Location::member(&owner, &self.method_name),
            });
        }

        let method_args = self
            .args
            .into_iter()
            .enumerate()
            .map(|(index, arg)| -> BuildResult<MethodArgMetadata> {
                let location = || Location::member(&owner, &self.method_name).with_index(index);
                let kind = match arg {
                    ArgDeclaration::Arg(arg) => MethodArgKind::Arg {
                        type_fn: arg
                            .type_ref
                            .ok_or_else(|| BuildError::UndeterminedType { location: location() })?,
                        name: arg.name,
                        options: arg.options,
                        description: arg.description,
                        default_value: arg.default_value,
                    },
                    ArgDeclaration::Args(bundle) => MethodArgKind::Args {
                        type_fn: bundle
                            .ok_or_else(|| BuildError::UndeterminedType { location: location() })?,
                    },
                };
                Ok(MethodArgMetadata { index, kind })
            })
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(HandlerMetadata {
            schema_name: self.name.unwrap_or_else(|| self.method_name.clone()),
            method_name: self.method_name,
            target: self.target,
            type_fn: self.return_type,
            return_type_options: self.options,
            method_args,
            description: self.description,
            deprecation_reason: self.deprecation_reason,
            directives: self.directives,
            complexity: self.complexity,
            extensions: self.extensions,
        })
    }
}

/// A resolver class declaration.
#[derive(Debug, Clone)]
pub struct ResolverDeclaration {
    pub target: EntityId,
    /// The object type whose fields the class resolves.
    pub of_type: Option<TypeReference>,
    pub is_abstract: bool,
}

impl ResolverDeclaration {
    pub fn new(target: EntityId) -> Self {
        Self {
            target,
            of_type: None,
            is_abstract: false,
        }
    }

    #[must_use]
    pub fn of_type(mut self, of_type: TypeReference) -> Self {
        self.of_type = Some(of_type);
        self
    }

    #[must_use]
    pub fn abstract_resolver(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

/// Collects declarations for one build.
#[derive(Debug, Default)]
pub struct Declarations {
    registry: TypeRegistry,
    queue: LazyMetadataQueue,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an entity handle.
    pub fn entity(&mut self, name: impl Into<String>) -> EntityId {
        self.registry.entities_mut().declare(name)
    }

    /// Declares an entity handle extending `parent`.
    pub fn entity_extending(&mut self, name: impl Into<String>, parent: EntityId) -> EntityId {
        self.registry.entities_mut().declare_extending(name, parent)
    }

    /// Attaches the representative-object factory used to read property
    /// defaults of `entity`.
    pub fn set_defaults(
        &mut self,
        entity: EntityId,
        factory: impl Fn() -> DefaultValues + Send + Sync + 'static,
    ) {
        self.registry
            .entities_mut()
            .set_defaults(entity, DefaultsFactory::new(factory));
    }

    pub fn object_type(&mut self, declaration: ClassDeclaration) {
        self.class(ClassKind::Object, declaration);
    }

    pub fn input_type(&mut self, declaration: ClassDeclaration) {
        self.class(ClassKind::InputObject, declaration);
    }

    pub fn interface_type(&mut self, declaration: ClassDeclaration) {
        self.class(ClassKind::Interface, declaration);
    }

    pub fn args_type(&mut self, declaration: ClassDeclaration) {
        self.class(ClassKind::Args, declaration);
    }

    fn class(&mut self, kind: ClassKind, declaration: ClassDeclaration) {
        self.queue.enqueue(Some(declaration.target), move |registry| {
            let metadata = declaration.compile(registry)?;
            registry.add_class_metadata(kind, metadata);
            Ok(())
        });
    }

    /// Declares an entity as a custom scalar.
    pub fn scalar(&mut self, target: EntityId, name: Option<String>, description: Option<String>) {
        self.queue.enqueue(Some(target), move |registry| {
            let name = name.unwrap_or_else(|| registry.entity_name(target).to_string());
            registry.add_scalar_metadata(ScalarMetadata {
                target,
                name,
                description,
                specified_by_url: None,
            });
            Ok(())
        });
    }

    pub fn resolver(&mut self, declaration: ResolverDeclaration) {
        self.queue.enqueue(Some(declaration.target), move |registry| {
            registry.add_resolver_metadata(ResolverClassMetadata {
                target: declaration.target,
                type_fn: declaration.of_type,
                is_abstract: declaration.is_abstract,
            });
            Ok(())
        });
    }

    pub fn query(&mut self, declaration: HandlerDeclaration) {
        self.root_handler(RootKind::Query, declaration);
    }

    pub fn mutation(&mut self, declaration: HandlerDeclaration) {
        self.root_handler(RootKind::Mutation, declaration);
    }

    pub fn subscription(&mut self, declaration: HandlerDeclaration) {
        self.root_handler(RootKind::Subscription, declaration);
    }

    fn root_handler(&mut self, kind: RootKind, declaration: HandlerDeclaration) {
        self.queue.enqueue(Some(declaration.target), move |registry| {
            let metadata = declaration.compile(registry, kind.type_name(), true)?;
            registry.add_root_handler_metadata(kind, metadata);
            Ok(())
        });
    }

    /// Declares a field resolver on a resolver class.
    pub fn resolve_field(&mut self, declaration: HandlerDeclaration) {
        self.queue.enqueue(Some(declaration.target), move |registry| {
            let metadata = declaration.compile(registry, "field resolver", false)?;
            registry.add_field_resolver_metadata(metadata);
            Ok(())
        });
    }

    /// Returns the registry as filled so far. Deferred declarations are not
    /// visible until [`finish`](Self::finish).
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Drains every deferred declaration and returns the complete registry.
    pub fn finish(mut self) -> BuildResult<TypeRegistry> {
        self.queue.drain(&mut self.registry)?;
        Ok(self.registry)
    }
}
