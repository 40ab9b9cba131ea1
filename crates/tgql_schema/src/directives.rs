//! Directive definitions shipped with the builder.
//!
//! This module defines:
//! - The specified directives every schema carries (@include, @skip,
//!   @deprecated, @specifiedBy)
//! - The Apollo federation v1 set (@key, @extends, @external, @requires,
//!   @provides)

use crate::options::ScalarImpl;
use crate::schema::{DirectiveArgument, DirectiveDefinition, DirectiveLocation};
use indexmap::IndexMap;
use serde_json::Value;

/// Reason used when `@deprecated` is applied without one.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Names of the federation directives that pull a type into the schema.
pub const FEDERATION_ORPHAN_DIRECTIVES: [&str; 2] = ["key", "extends"];

// =============================================================================
// Specified directives
// =============================================================================

/// Returns the directives every schema defines.
pub fn specified_directives() -> Vec<DirectiveDefinition> {
    vec![
        create_include_directive(),
        create_skip_directive(),
        create_deprecated_directive(),
        create_specified_by_directive(),
    ]
}

/// Returns true if `name` is one of the specified directives.
pub fn is_specified_directive(name: &str) -> bool {
    matches!(name, "include" | "skip" | "deprecated" | "specifiedBy")
}

fn create_include_directive() -> DirectiveDefinition {
    definition(
        "include",
        "Directs the executor to include this field or fragment only when the `if` argument is true.",
        [argument("if", "Boolean!", "Included when true.", None)],
        vec![
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
    )
}

fn create_skip_directive() -> DirectiveDefinition {
    definition(
        "skip",
        "Directs the executor to skip this field or fragment when the `if` argument is true.",
        [argument("if", "Boolean!", "Skipped when true.", None)],
        vec![
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
    )
}

fn create_deprecated_directive() -> DirectiveDefinition {
    definition(
        "deprecated",
        "Marks an element of a GraphQL schema as no longer supported.",
        [argument(
            "reason",
            "String",
            "Explains why this element was deprecated.",
            Some(Value::from(DEFAULT_DEPRECATION_REASON)),
        )],
        vec![
            DirectiveLocation::FieldDefinition,
            DirectiveLocation::ArgumentDefinition,
            DirectiveLocation::InputFieldDefinition,
            DirectiveLocation::EnumValue,
        ],
    )
}

fn create_specified_by_directive() -> DirectiveDefinition {
    definition(
        "specifiedBy",
        "Exposes a URL that specifies the behavior of this scalar.",
        [argument("url", "String!", "The URL that specifies the behavior of this scalar.", None)],
        vec![DirectiveLocation::Scalar],
    )
}

// =============================================================================
// Apollo federation
// =============================================================================

/// Returns the Apollo federation v1 directive set.
pub fn federation_directives() -> Vec<DirectiveDefinition> {
    vec![
        create_key_directive(),
        create_extends_directive(),
        create_external_directive(),
        create_requires_directive(),
        create_provides_directive(),
    ]
}

/// Returns the scalars the federation v1 directives take as arguments.
pub fn federation_scalars() -> Vec<ScalarImpl> {
    vec![ScalarImpl::new("_FieldSet")]
}

fn create_key_directive() -> DirectiveDefinition {
    definition(
        "key",
        "Designates an object type as an entity and specifies its key fields.",
        [argument("fields", "_FieldSet!", "", None)],
        vec![DirectiveLocation::Object, DirectiveLocation::Interface],
    )
}

fn create_extends_directive() -> DirectiveDefinition {
    definition(
        "extends",
        "Marks a type as an extension of a type defined by another service.",
        [],
        vec![DirectiveLocation::Object, DirectiveLocation::Interface],
    )
}

fn create_external_directive() -> DirectiveDefinition {
    definition(
        "external",
        "Marks a field as owned by another service.",
        [],
        vec![DirectiveLocation::FieldDefinition],
    )
}

fn create_requires_directive() -> DirectiveDefinition {
    definition(
        "requires",
        "Lists the external fields a resolver depends on.",
        [argument("fields", "_FieldSet!", "", None)],
        vec![DirectiveLocation::FieldDefinition],
    )
}

fn create_provides_directive() -> DirectiveDefinition {
    definition(
        "provides",
        "Lists the fields of a returned entity this service can resolve.",
        [argument("fields", "_FieldSet!", "", None)],
        vec![DirectiveLocation::FieldDefinition],
    )
}

// =============================================================================
// Helpers
// =============================================================================

fn argument(name: &str, ty: &str, description: &str, default_value: Option<Value>) -> DirectiveArgument {
    let mut argument = DirectiveArgument::new(name, ty);
    if !description.is_empty() {
        argument.description = Some(description.to_string());
    }
    argument.default_value = default_value;
    argument
}

fn definition<const N: usize>(
    name: &str,
    description: &str,
    arguments: [DirectiveArgument; N],
    locations: Vec<DirectiveLocation>,
) -> DirectiveDefinition {
    DirectiveDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        arguments: arguments
            .into_iter()
            .map(|a| (a.name.clone(), a))
            .collect::<IndexMap<_, _>>(),
        locations,
        repeatable: false,
    }
}

/// Appends `extra` to `target`, skipping definitions whose name is already
/// present. The first definition of a name wins.
pub fn merge_directives(
    target: &mut Vec<DirectiveDefinition>,
    extra: impl IntoIterator<Item = DirectiveDefinition>,
) {
    for directive in extra {
        if !target.iter().any(|d| d.name == directive.name) {
            target.push(directive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specified_directives() {
        let names: Vec<_> = specified_directives().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["include", "skip", "deprecated", "specifiedBy"]);
        assert!(names.iter().all(|n| is_specified_directive(n)));
        assert!(!is_specified_directive("key"));
    }

    #[test]
    fn test_deprecated_default_reason() {
        let deprecated = create_deprecated_directive();
        let reason = &deprecated.arguments["reason"];
        assert_eq!(reason.ty, "String");
        assert_eq!(reason.default_value, Some(Value::from("No longer supported")));
    }

    #[test]
    fn test_key_directive() {
        let key = create_key_directive();
        assert!(!key.repeatable);
        assert_eq!(key.arguments["fields"].ty, "_FieldSet!");
        assert_eq!(key.locations, [DirectiveLocation::Object, DirectiveLocation::Interface]);
    }

    #[test]
    fn test_merge_directives_first_wins() {
        let mut directives = specified_directives();
        let mut custom = create_skip_directive();
        custom.description = None;
        merge_directives(&mut directives, [custom, create_key_directive()]);

        assert_eq!(directives.len(), 5);
        assert!(directives[1].description.is_some());
        assert_eq!(directives[4].name, "key");
    }
}
