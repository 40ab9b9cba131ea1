//! Input type resolution.

use crate::context::{resolve_default, BuildContext};
use crate::mapper::TypeMapper;
use crate::output::declaration_label;
use crate::schema::{InputObjectType, InputValue, TypeId, TypeNode};
use indexmap::IndexMap;
use tgql_core::{BuildError, BuildResult, Location};
use tgql_metadata::{ClassKind, ClassMetadata, EntityId, TypeOptions, TypeReference};
use tracing::trace;

impl BuildContext<'_> {
    /// Realizes an input-position reference. Only scalars and declared input
    /// types are accepted.
    pub(crate) fn resolve_input(
        &mut self,
        host: &Location,
        reference: &TypeReference,
        options: &TypeOptions,
    ) -> BuildResult<TypeNode> {
        let (base, depth) = reference.unwrap_lists();
        let options = options.clone().with_reference_depth(depth);

        let named = if let Some(scalar) = self.mapper.map_scalar(&base, self.registry) {
            self.storage.scalar(scalar)?
        } else {
            base.entity()
                .map(|target| self.input_type(target))
                .transpose()?
                .flatten()
                .ok_or_else(|| BuildError::CannotDetermineInputType {
                    location: host.clone(),
                })?
        };
        Ok(TypeMapper::wrap(named, &options))
    }

    /// Returns the input type realized from `target`, creating its shell on
    /// first use. `None` if `target` is not a declared input type.
    pub(crate) fn input_type(&mut self, target: EntityId) -> BuildResult<Option<TypeId>> {
        if let Some(id) = self.storage.cached_input(target) {
            return Ok(Some(id));
        }
        let Some(class) = self.registry.input_type_metadata(target) else {
            return Ok(None);
        };
        trace!(input = %class.name, "creating input type");
        let mut shell = InputObjectType::shell(&class.name, Some(target));
        shell.description = class.description.clone();
        let id = self.storage.input_shell(
            target,
            shell,
            declaration_label(ClassKind::InputObject, class, self.registry.entity_name(target)),
        )?;
        Ok(Some(id))
    }

    /// Computes the fields of an input type, ancestors first.
    pub(crate) fn input_fields(&mut self, target: EntityId) -> BuildResult<IndexMap<String, InputValue>> {
        let registry = self.registry;
        let mut chain = registry.ancestor_metadata(ClassKind::InputObject, target);
        chain.extend(registry.input_type_metadata(target));

        let mut fields = IndexMap::new();
        for declaring in chain {
            self.merge_input_fields(declaring, &mut fields)?;
        }
        Ok(fields)
    }

    /// Adds the properties of one class to `fields`, reading defaults from
    /// the class's representative instance. Existing entries of the same
    /// name are replaced.
    pub(crate) fn merge_input_fields(
        &mut self,
        declaring: &ClassMetadata,
        fields: &mut IndexMap<String, InputValue>,
    ) -> BuildResult<()> {
        let instance = self.registry.entities().instantiate(declaring.target);
        for property in &declaring.properties {
            let host = Location::member(&declaring.name, &property.name);
            let ty = self.resolve_input(&host, &property.type_fn, &property.options)?;
            fields.insert(
                property.schema_name.clone(),
                InputValue {
                    name: property.schema_name.clone(),
                    description: property.description.clone(),
                    ty,
                    default_value: resolve_default(&declaring.name, instance.as_ref(), property),
                },
            );
        }
        Ok(())
    }
}
