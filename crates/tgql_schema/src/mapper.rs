//! Scalar mapping and type wrapping.

use crate::options::{BuildSchemaOptions, DateScalarMode, NumberScalarMode, ScalarImpl};
use crate::schema::{TypeId, TypeNode};
use tgql_metadata::{TypeOptions, TypeReference, TypeRegistry};

/// Scalars every schema has; they are never printed.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

const DATE_TIME_DESCRIPTION: &str =
    "A date-time string at UTC, such as 2019-12-03T09:54:33Z, compliant with the date-time format.";
const TIMESTAMP_DESCRIPTION: &str = "`Date` type as integer. Type represents date and time as number of milliseconds from start of UNIX epoch.";

/// Maps scalar references to implementations and wraps named types.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    options: &'a BuildSchemaOptions,
}

impl<'a> TypeMapper<'a> {
    pub fn new(options: &'a BuildSchemaOptions) -> Self {
        Self { options }
    }

    /// Returns the scalar a reference denotes, or `None` if it is not a
    /// scalar. List wrappers and thunks are looked through.
    ///
    /// Scalar names are looked up in the custom scalar table first, then in
    /// the built-in table. Declared entities are scalars when registered as
    /// such.
    pub fn map_scalar(
        &self,
        reference: &TypeReference,
        registry: &TypeRegistry,
    ) -> Option<ScalarImpl> {
        match reference.unwrap_lists().0 {
            TypeReference::Scalar(name) => self
                .options
                .scalars_map
                .get(&name)
                .cloned()
                .or_else(|| self.builtin(&name)),
            TypeReference::Declared(id) => registry.scalar_metadata(id).map(|scalar| ScalarImpl {
                name: scalar.name.clone(),
                description: scalar.description.clone(),
                specified_by_url: scalar.specified_by_url.clone(),
            }),
            TypeReference::Thunk(_) | TypeReference::ListOf(_) => None,
        }
    }

    fn builtin(&self, name: &str) -> Option<ScalarImpl> {
        let scalar = match name {
            "String" | "string" => ScalarImpl::new("String"),
            "Boolean" | "boolean" => ScalarImpl::new("Boolean"),
            "Int" => ScalarImpl::new("Int"),
            "Float" => ScalarImpl::new("Float"),
            "ID" => ScalarImpl::new("ID"),
            "Number" | "number" => match self.options.number_scalar_mode {
                NumberScalarMode::Float => ScalarImpl::new("Float"),
                NumberScalarMode::Integer => ScalarImpl::new("Int"),
            },
            "Date" => match self.options.date_scalar_mode {
                DateScalarMode::IsoDate => {
                    ScalarImpl::new("DateTime").with_description(DATE_TIME_DESCRIPTION)
                }
                DateScalarMode::Timestamp => {
                    ScalarImpl::new("Timestamp").with_description(TIMESTAMP_DESCRIPTION)
                }
            },
            _ => return None,
        };
        Some(scalar)
    }

    /// Wraps a named type in nullability and list layers.
    ///
    /// Layers are applied innermost first. The items of list layer `k`
    /// (0 = outermost) are non-null unless `array_nullable` says otherwise;
    /// the outermost layer is non-null unless `nullable` is set.
    pub fn wrap(named: TypeId, options: &TypeOptions) -> TypeNode {
        let mut node = TypeNode::Named(named);
        for layer in (0..options.depth() as usize).rev() {
            if !options.array_nullable.at(layer) {
                node = TypeNode::non_null(node);
            }
            node = TypeNode::list(node);
        }
        if options.nullable {
            node
        } else {
            TypeNode::non_null(node)
        }
    }
}
