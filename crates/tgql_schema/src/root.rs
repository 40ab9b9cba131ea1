//! Root operation types.

use crate::context::BuildContext;
use crate::schema::{NamedType, TypeId};
use indexmap::IndexMap;
use tgql_core::{BuildError, BuildResult, Location};
use tgql_metadata::RootKind;
use tracing::debug;

impl BuildContext<'_> {
    /// Builds the root object of one operation kind.
    ///
    /// Returns `None` when no handler of this kind remains after resolver
    /// filtering; the schema then does not offer the operation.
    pub(crate) fn build_root(&mut self, kind: RootKind) -> BuildResult<Option<TypeId>> {
        let registry = self.registry;
        let bindings = self.effective_handlers(registry.root_handlers_metadata(kind));
        if bindings.is_empty() {
            debug!(root = %kind, "no handlers; root omitted");
            return Ok(None);
        }

        let id = self.storage.root(kind)?;
        let mut fields = IndexMap::new();
        for binding in bindings {
            let handler = binding.handler;
            let type_fn = handler.type_fn.as_ref().ok_or_else(|| BuildError::UndefinedReturnType {
                kind: kind.type_name().to_string(),
                location: Location::member(registry.entity_name(handler.target), &handler.method_name),
            })?;
            if fields.contains_key(&handler.schema_name) {
                return Err(BuildError::DuplicateField {
                    type_name: kind.type_name().to_string(),
                    field: handler.schema_name.clone(),
                });
            }
            self.orphans.register_if_orphan(type_fn);
            let field = self.handler_field(binding, type_fn, &handler.return_type_options)?;
            fields.insert(field.name.clone(), field);
        }

        debug!(root = %kind, fields = fields.len(), "built root type");
        if let Some(NamedType::Object(root)) = self.storage.get_mut(id) {
            let rewired = root.fields.set(fields).is_err();
            debug_assert!(!rewired, "root wired twice");
        }
        Ok(Some(id))
    }
}
