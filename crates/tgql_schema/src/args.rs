//! Argument list building.

use crate::context::BuildContext;
use crate::schema::InputValue;
use indexmap::IndexMap;
use tgql_core::{BuildError, BuildResult, Location};
use tgql_metadata::{ClassKind, MethodArgKind, MethodArgMetadata, TypeReference};

impl BuildContext<'_> {
    /// Builds the argument map of one handler.
    ///
    /// Parameters are visited in signature order. A bundle parameter
    /// contributes the fields of its declared ancestors, most-base first,
    /// then its own; a field redeclared further down the chain replaces the
    /// inherited one.
    pub(crate) fn build_args(
        &mut self,
        owner: &str,
        method: &str,
        args: &[MethodArgMetadata],
    ) -> BuildResult<IndexMap<String, InputValue>> {
        let registry = self.registry;
        let mut ordered: Vec<&MethodArgMetadata> = args.iter().collect();
        ordered.sort_by_key(|arg| arg.index);

        let mut map = IndexMap::new();
        for arg in ordered {
            let host = Location::member(owner, method).with_index(arg.index);
            match &arg.kind {
                MethodArgKind::Arg {
                    name,
                    type_fn,
                    options,
                    description,
                    default_value,
                } => {
                    let ty = self.resolve_input(&host, type_fn, options)?;
                    map.insert(
                        name.clone(),
                        InputValue {
                            name: name.clone(),
                            description: description.clone(),
                            ty,
                            default_value: default_value.clone(),
                        },
                    );
                }
                MethodArgKind::Args { type_fn } => {
                    let bundle = match type_fn.unwrap_lists().0 {
                        TypeReference::Declared(id) => id,
                        other => {
                            return Err(BuildError::MissingArgsType {
                                location: host,
                                bundle: format!("{other:?}"),
                            })
                        }
                    };
                    let mut chain = registry.ancestor_metadata(ClassKind::Args, bundle);
                    chain.extend(registry.args_type_metadata(bundle));
                    if chain.is_empty() {
                        return Err(BuildError::MissingArgsType {
                            location: host,
                            bundle: registry.entity_name(bundle).to_string(),
                        });
                    }
                    for declaring in chain {
                        self.merge_input_fields(declaring, &mut map)?;
                    }
                }
            }
        }
        Ok(map)
    }
}
