//! Structural validation of a realized schema.

use crate::schema::{NamedType, ObjectType, Schema};
use tgql_core::diagnostics::codes;
use tgql_core::{BuildError, BuildResult, DiagnosticBag, Location};
use tgql_metadata::DirectiveUsage;

/// Checks a realized schema and returns every problem found.
pub fn validate_schema(schema: &Schema) -> DiagnosticBag {
    let mut validator = Validator {
        schema,
        diagnostics: DiagnosticBag::new(),
    };
    validator.validate();
    validator.diagnostics
}

/// Validates a schema, failing with [`BuildError::InvalidSchema`] if any
/// error was found.
///
/// # Errors
///
/// Returns the collected diagnostics as [`BuildError::InvalidSchema`].
pub fn check_schema(schema: &Schema) -> BuildResult<()> {
    let diagnostics = validate_schema(schema);
    if diagnostics.has_errors() {
        return Err(BuildError::InvalidSchema {
            count: diagnostics.len(),
            diagnostics: diagnostics.into_vec(),
        });
    }
    Ok(())
}

struct Validator<'s> {
    schema: &'s Schema,
    diagnostics: DiagnosticBag,
}

impl Validator<'_> {
    fn validate(&mut self) {
        for (_, ty) in self.schema.types() {
            self.check_name(Location::owner(ty.name()), ty.name());
            match ty {
                NamedType::Scalar(_) => {}
                NamedType::Object(object) => {
                    self.check_composite(object);
                    self.check_implementations(object);
                }
                NamedType::Interface(interface) => self.check_composite(interface),
                NamedType::InputObject(input) => {
                    if input.field_count() == 0 {
                        self.empty_fields(&input.name, "input type");
                    }
                    for field in input.fields() {
                        self.check_name(Location::member(&input.name, &field.name), &field.name);
                    }
                }
            }
        }
    }

    fn check_composite(&mut self, object: &ObjectType) {
        if object.field_count() == 0 {
            self.empty_fields(&object.name, "type");
        }
        if let Some(node) = &object.ast_node {
            self.check_directives(Location::owner(&object.name), &node.directives);
        }
        for field in object.fields() {
            let location = Location::member(&object.name, &field.name);
            self.check_name(location.clone(), &field.name);
            for (index, arg) in field.args.values().enumerate() {
                self.check_name(location.clone().with_index(index), &arg.name);
            }
            if let Some(node) = &field.ast_node {
                self.check_directives(location, &node.directives);
            }
        }
    }

    fn check_implementations(&mut self, object: &ObjectType) {
        for &interface_id in &object.interfaces {
            let Some(interface) = self.schema.get(interface_id).and_then(NamedType::as_interface)
            else {
                continue;
            };
            for field in interface.fields() {
                if object.field(&field.name).is_none() {
                    self.diagnostics.error(
                        codes::MISSING_INTERFACE_FIELD,
                        "missing interface field",
                        Location::owner(&object.name),
                        format!(
                            "`{}` implements `{}` but has no field `{}`",
                            object.name, interface.name, field.name
                        ),
                    );
                }
            }
        }
    }

    fn check_directives(&mut self, location: Location, directives: &[DirectiveUsage]) {
        for directive in directives {
            if self.schema.directive(&directive.name).is_none() {
                self.diagnostics.error(
                    codes::UNKNOWN_DIRECTIVE,
                    "unknown directive",
                    location.clone(),
                    format!("directive `@{}` is not defined", directive.name),
                );
            }
        }
    }

    fn check_name(&mut self, location: Location, name: &str) {
        if !is_valid_name(name) {
            self.diagnostics.error(
                codes::INVALID_NAME,
                "invalid name",
                location,
                format!("`{name}` is not a valid GraphQL name"),
            );
        } else if name.starts_with("__") {
            self.diagnostics.error(
                codes::INVALID_NAME,
                "reserved name",
                location,
                format!("`{name}` starts with `__`, which is reserved for introspection"),
            );
        }
    }

    fn empty_fields(&mut self, name: &str, what: &str) {
        self.diagnostics.error(
            codes::EMPTY_FIELDS,
            "empty field set",
            Location::owner(name),
            format!("{what} `{name}` must define one or more fields"),
        );
    }
}

/// Returns true if `name` matches `[_A-Za-z][_0-9A-Za-z]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("Recipe"));
        assert!(is_valid_name("_FieldSet"));
        assert!(is_valid_name("recipe2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("my-recipe"));
    }
}
