//! Output type resolution.

use crate::context::{BuildContext, HandlerBinding};
use crate::mapper::TypeMapper;
use crate::schema::{
    Field, FieldDefinitionNode, ObjectType, ResolverSlot, TypeDefinitionNode, TypeId, TypeNode,
};
use indexmap::IndexMap;
use tgql_core::{BuildError, BuildResult, Location};
use tgql_metadata::{
    ClassKind, ClassMetadata, DirectiveUsage, EntityId, FieldMetadata, TypeOptions, TypeReference,
};
use tracing::trace;

impl<'r> BuildContext<'r> {
    /// Realizes an output-position reference.
    ///
    /// Scalars are realized directly. Declared objects and interfaces get a
    /// shell on first reference and the cached shell afterwards, so cyclic
    /// references terminate and share one node.
    pub(crate) fn resolve_output(
        &mut self,
        host: &Location,
        reference: &TypeReference,
        options: &TypeOptions,
    ) -> BuildResult<TypeNode> {
        let (base, depth) = reference.unwrap_lists();
        let options = options.clone().with_reference_depth(depth);
        let named = self.output_named(host, &base)?;
        Ok(TypeMapper::wrap(named, &options))
    }

    fn output_named(&mut self, host: &Location, base: &TypeReference) -> BuildResult<TypeId> {
        if let Some(scalar) = self.mapper.map_scalar(base, self.registry) {
            return self.storage.scalar(scalar);
        }
        let undetermined = || BuildError::UndeterminedType {
            location: host.clone(),
        };
        let target = base.entity().ok_or_else(undetermined)?;
        if let Some(id) = self.object_type(target)? {
            return Ok(id);
        }
        self.interface_type(target)?.ok_or_else(undetermined)
    }

    /// Returns the object type realized from `target`, creating its shell
    /// on first use. `None` if `target` is not a declared object type.
    pub(crate) fn object_type(&mut self, target: EntityId) -> BuildResult<Option<TypeId>> {
        if let Some(id) = self.storage.cached_object(target) {
            return Ok(Some(id));
        }
        let Some(class) = self.registry.object_type_metadata(target) else {
            return Ok(None);
        };
        trace!(class = %class.name, "creating object type");
        let id = self.storage.object_shell(
            target,
            composite_shell(class),
            declaration_label(ClassKind::Object, class, self.registry.entity_name(target)),
        )?;
        Ok(Some(id))
    }

    /// Returns the interface realized from `target`, creating its shell on
    /// first use. Implementers of a realized interface are pulled in as
    /// orphans.
    pub(crate) fn interface_type(&mut self, target: EntityId) -> BuildResult<Option<TypeId>> {
        if let Some(id) = self.storage.cached_interface(target) {
            return Ok(Some(id));
        }
        let Some(class) = self.registry.interface_metadata(target) else {
            return Ok(None);
        };
        trace!(interface = %class.name, "creating interface");
        let id = self.storage.interface_shell(
            target,
            composite_shell(class),
            declaration_label(ClassKind::Interface, class, self.registry.entity_name(target)),
        )?;
        self.orphans.register(target);
        Ok(Some(id))
    }

    /// Computes the interfaces and fields of an object or interface.
    ///
    /// Fields are merged in this order, later entries replacing earlier ones
    /// of the same name: fields of implemented interfaces, fields of declared
    /// ancestors (most-base first), own fields, then field resolvers.
    pub(crate) fn composite_fields(
        &mut self,
        kind: ClassKind,
        target: EntityId,
    ) -> BuildResult<(Vec<TypeId>, IndexMap<String, Field>)> {
        let registry = self.registry;
        let Some(class) = registry.class_metadata(kind, target) else {
            return Ok((Vec::new(), IndexMap::new()));
        };
        let mut chain = registry.ancestor_metadata(kind, target);
        chain.push(class);

        let mut interface_ids = Vec::new();
        let mut fields = IndexMap::new();
        let mut seen_interfaces = Vec::new();
        for interface in chain.iter().flat_map(|c| c.interfaces.iter()) {
            let host = Location::owner(&class.name);
            let interface_target = interface.entity().ok_or_else(|| BuildError::UndeterminedType {
                location: host.clone(),
            })?;
            if seen_interfaces.contains(&interface_target) {
                continue;
            }
            seen_interfaces.push(interface_target);
            let id = self
                .interface_type(interface_target)?
                .ok_or(BuildError::UndeterminedType { location: host })?;
            interface_ids.push(id);

            let mut interface_chain = registry.ancestor_metadata(ClassKind::Interface, interface_target);
            interface_chain.extend(registry.interface_metadata(interface_target));
            for declaring in interface_chain {
                for property in &declaring.properties {
                    let field = self.property_field(declaring, property)?;
                    fields.insert(field.name.clone(), field);
                }
            }
        }

        for declaring in &chain {
            for property in &declaring.properties {
                let field = self.property_field(declaring, property)?;
                fields.insert(field.name.clone(), field);
            }
        }

        if kind == ClassKind::Object {
            for binding in self.field_resolvers_for(target) {
                let field = self.field_resolver_field(&chain, binding)?;
                fields.insert(field.name.clone(), field);
            }
        }
        Ok((interface_ids, fields))
    }

    fn property_field(
        &mut self,
        declaring: &ClassMetadata,
        property: &FieldMetadata,
    ) -> BuildResult<Field> {
        let host = Location::member(&declaring.name, &property.name);
        let ty = self.resolve_output(&host, &property.type_fn, &property.options)?;
        let ast_node = (!property.directives.is_empty())
            .then(|| field_node(&property.schema_name, &ty, &property.directives));
        Ok(Field {
            name: property.schema_name.clone(),
            description: property.description.clone(),
            deprecation_reason: property.deprecation_reason.clone(),
            ty,
            args: IndexMap::new(),
            resolver: None,
            ast_node,
            extensions: IndexMap::new(),
        })
    }

    /// A field resolver without a return type takes the type of the
    /// property it replaces.
    fn field_resolver_field(
        &mut self,
        chain: &[&ClassMetadata],
        binding: HandlerBinding<'r>,
    ) -> BuildResult<Field> {
        let handler = binding.handler;
        if let Some(type_fn) = &handler.type_fn {
            return self.handler_field(binding, type_fn, &handler.return_type_options);
        }
        let property = chain
            .iter()
            .rev()
            .find_map(|class| class.property(&handler.schema_name))
            .ok_or_else(|| BuildError::UndefinedReturnType {
                kind: "field resolver".to_string(),
                location: Location::member(
                    self.registry.entity_name(handler.target),
                    &handler.method_name,
                ),
            })?;
        self.handler_field(binding, &property.type_fn, &property.options)
    }

    /// Builds the field exposing a handler.
    pub(crate) fn handler_field(
        &mut self,
        binding: HandlerBinding<'r>,
        type_fn: &TypeReference,
        options: &TypeOptions,
    ) -> BuildResult<Field> {
        let registry = self.registry;
        let handler = binding.handler;
        let owner = registry.entity_name(handler.target);
        let host = Location::member(owner, &handler.method_name);
        let ty = self.resolve_output(&host, type_fn, options)?;
        let args = self.build_args(owner, &handler.method_name, &handler.method_args)?;

        let mut extensions = IndexMap::new();
        if let Some(complexity) = handler.complexity {
            extensions.insert("complexity".to_string(), complexity.into());
        }
        extensions.extend(handler.extensions.clone());

        Ok(Field {
            name: handler.schema_name.clone(),
            description: handler.description.clone(),
            deprecation_reason: handler.deprecation_reason.clone(),
            ast_node: Some(field_node(&handler.schema_name, &ty, &handler.directives)),
            ty,
            args,
            resolver: Some(ResolverSlot {
                target: binding.class,
                method_name: handler.method_name.clone(),
            }),
            extensions,
        })
    }
}

fn composite_shell(class: &ClassMetadata) -> ObjectType {
    let mut shell = ObjectType::shell(&class.name, Some(class.target));
    shell.description = class.description.clone();
    if !class.directives.is_empty() {
        shell.ast_node = Some(TypeDefinitionNode {
            name: class.name.clone(),
            directives: class.directives.clone(),
        });
    }
    shell
}

fn field_node(name: &str, ty: &TypeNode, directives: &[DirectiveUsage]) -> FieldDefinitionNode {
    FieldDefinitionNode {
        name: name.to_string(),
        ty: ty.clone(),
        directives: directives.to_vec(),
    }
}

pub(crate) fn declaration_label(kind: ClassKind, class: &ClassMetadata, entity: &str) -> String {
    if class.name == entity {
        format!("{} `{}`", kind.as_str(), class.name)
    } else {
        format!("{} `{}` (declared by `{entity}`)", kind.as_str(), class.name)
    }
}
