//! Schema definition language printing.

use crate::directives::{is_specified_directive, DEFAULT_DEPRECATION_REASON};
use crate::mapper::BUILTIN_SCALARS;
use crate::schema::{
    DirectiveDefinition, Field, InputObjectType, InputValue, NamedType, ObjectType, ScalarType,
    Schema, TypeId,
};
use serde_json::Value;
use tgql_metadata::{DirectiveUsage, RootKind};

/// Header written at the top of emitted schema files.
pub const SCHEMA_FILE_HEADER: &str = "# ------------------------------------------------------\n# THIS FILE WAS AUTOMATICALLY GENERATED (DO NOT MODIFY)\n# ------------------------------------------------------\n\n";

/// Printing options.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Number of spaces for indentation.
    pub indent_size: usize,
    /// Sort types, fields and arguments by name.
    pub sort_types: bool,
    /// Print directives applied to types and fields.
    pub applied_directives: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            sort_types: false,
            applied_directives: true,
        }
    }
}

/// Prints a schema in schema definition language.
///
/// Specified directives and built-in scalars are left out. Without
/// `sort_types`, root types come first, then the remaining types in the
/// order they were realized.
pub fn print_schema(schema: &Schema, options: &PrintOptions) -> String {
    let mut printer = Printer {
        schema,
        options,
        output: String::new(),
        indent: 0,
    };
    printer.print();
    printer.output
}

struct Printer<'a> {
    schema: &'a Schema,
    options: &'a PrintOptions,
    output: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn print(&mut self) {
        let schema = self.schema;
        let mut first = true;
        let mut separate = |output: &mut String| {
            if !first {
                output.push_str("\n\n");
            }
            first = false;
        };

        let mut directives: Vec<&DirectiveDefinition> = schema
            .directives()
            .iter()
            .filter(|d| !is_specified_directive(&d.name))
            .collect();
        if self.options.sort_types {
            directives.sort_by(|a, b| a.name.cmp(&b.name));
        }
        for directive in directives {
            separate(&mut self.output);
            self.print_directive_definition(directive);
        }

        for ty in self.ordered_types() {
            if matches!(ty, NamedType::Scalar(s) if BUILTIN_SCALARS.contains(&s.name.as_str())) {
                continue;
            }
            separate(&mut self.output);
            match ty {
                NamedType::Scalar(scalar) => self.print_scalar(scalar),
                NamedType::Object(object) => self.print_composite("type", object),
                NamedType::Interface(interface) => self.print_composite("interface", interface),
                NamedType::InputObject(input) => self.print_input(input),
            }
        }
        if !self.output.is_empty() {
            self.output.push('\n');
        }
    }

    fn ordered_types(&self) -> Vec<&'a NamedType> {
        let schema = self.schema;
        if self.options.sort_types {
            let mut types: Vec<_> = schema.types().map(|(_, ty)| ty).collect();
            types.sort_by(|a, b| a.name().cmp(b.name()));
            return types;
        }
        let roots: Vec<TypeId> = RootKind::ALL
            .iter()
            .filter_map(|&kind| schema.root_id(kind))
            .collect();
        roots
            .iter()
            .filter_map(|&id| schema.get(id))
            .chain(
                schema
                    .types()
                    .filter(|(id, _)| !roots.contains(id))
                    .map(|(_, ty)| ty),
            )
            .collect()
    }

    fn print_directive_definition(&mut self, directive: &DirectiveDefinition) {
        self.print_description(directive.description.as_deref());
        self.output.push_str("directive @");
        self.output.push_str(&directive.name);
        if !directive.arguments.is_empty() {
            self.output.push('(');
            for (i, arg) in directive.arguments.values().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                self.output.push_str(&arg.name);
                self.output.push_str(": ");
                self.output.push_str(&arg.ty);
                if let Some(default) = &arg.default_value {
                    self.output.push_str(" = ");
                    self.print_value(default);
                }
            }
            self.output.push(')');
        }
        if directive.repeatable {
            self.output.push_str(" repeatable");
        }
        self.output.push_str(" on ");
        let locations: Vec<_> = directive.locations.iter().map(|l| l.as_str()).collect();
        self.output.push_str(&locations.join(" | "));
    }

    fn print_scalar(&mut self, scalar: &ScalarType) {
        self.print_description(scalar.description.as_deref());
        self.output.push_str("scalar ");
        self.output.push_str(&scalar.name);
        if let Some(url) = &scalar.specified_by_url {
            self.output.push_str(" @specifiedBy(url: ");
            self.print_value(&Value::String(url.clone()));
            self.output.push(')');
        }
    }

    fn print_composite(&mut self, keyword: &str, object: &ObjectType) {
        self.print_description(object.description.as_deref());
        self.output.push_str(keyword);
        self.output.push(' ');
        self.output.push_str(&object.name);
        if !object.interfaces.is_empty() {
            let schema = self.schema;
            let names: Vec<_> = object.interfaces.iter().map(|&id| schema.type_name(id)).collect();
            self.output.push_str(" implements ");
            self.output.push_str(&names.join(" & "));
        }
        if let Some(node) = &object.ast_node {
            self.print_applied_directives(&node.directives);
        }

        let mut fields: Vec<&Field> = object.fields().collect();
        if self.options.sort_types {
            fields.sort_by(|a, b| a.name.cmp(&b.name));
        }
        self.output.push_str(" {\n");
        self.indent += 1;
        for field in fields {
            self.print_field(field);
        }
        self.indent -= 1;
        self.output.push('}');
    }

    fn print_field(&mut self, field: &Field) {
        self.print_description(field.description.as_deref());
        self.push_indent();
        self.output.push_str(&field.name);
        let mut args: Vec<&InputValue> = field.args.values().collect();
        if self.options.sort_types {
            args.sort_by(|a, b| a.name.cmp(&b.name));
        }
        self.print_arguments(&args);
        self.output.push_str(": ");
        self.output.push_str(&self.schema.display_type(&field.ty));
        if let Some(reason) = &field.deprecation_reason {
            self.print_deprecated(reason);
        }
        if let Some(node) = &field.ast_node {
            self.print_applied_directives(&node.directives);
        }
        self.output.push('\n');
    }

    /// Arguments go on one line unless one of them has a description.
    fn print_arguments(&mut self, args: &[&InputValue]) {
        if args.is_empty() {
            return;
        }
        if args.iter().all(|a| a.description.is_none()) {
            self.output.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                self.print_input_value(arg);
            }
            self.output.push(')');
            return;
        }

        self.output.push_str("(\n");
        self.indent += 1;
        for arg in args {
            self.print_description(arg.description.as_deref());
            self.push_indent();
            self.print_input_value(arg);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push(')');
    }

    fn print_input(&mut self, input: &InputObjectType) {
        self.print_description(input.description.as_deref());
        self.output.push_str("input ");
        self.output.push_str(&input.name);

        let mut fields: Vec<&InputValue> = input.fields().collect();
        if self.options.sort_types {
            fields.sort_by(|a, b| a.name.cmp(&b.name));
        }
        self.output.push_str(" {\n");
        self.indent += 1;
        for field in fields {
            self.print_description(field.description.as_deref());
            self.push_indent();
            self.print_input_value(field);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.output.push('}');
    }

    fn print_input_value(&mut self, value: &InputValue) {
        self.output.push_str(&value.name);
        self.output.push_str(": ");
        self.output.push_str(&self.schema.display_type(&value.ty));
        if let Some(default) = &value.default_value {
            self.output.push_str(" = ");
            self.print_value(default);
        }
    }

    fn print_deprecated(&mut self, reason: &str) {
        if reason == DEFAULT_DEPRECATION_REASON {
            self.output.push_str(" @deprecated");
        } else {
            self.output.push_str(" @deprecated(reason: ");
            self.print_value(&Value::String(reason.to_string()));
            self.output.push(')');
        }
    }

    fn print_applied_directives(&mut self, directives: &[DirectiveUsage]) {
        if !self.options.applied_directives {
            return;
        }
        for directive in directives {
            self.output.push_str(" @");
            self.output.push_str(&directive.name);
            if directive.arguments.is_empty() {
                continue;
            }
            self.output.push('(');
            for (i, (name, value)) in directive.arguments.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                self.output.push_str(name);
                self.output.push_str(": ");
                self.print_value(value);
            }
            self.output.push(')');
        }
    }

    /// Prints a JSON value as a GraphQL literal.
    fn print_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.output.push_str("null"),
            Value::Bool(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.output.push_str(&n.to_string()),
            // JSON string escapes are valid GraphQL string escapes.
            Value::String(s) => self.output.push_str(&Value::String(s.clone()).to_string()),
            Value::Array(items) => {
                self.output.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.print_value(item);
                }
                self.output.push(']');
            }
            Value::Object(entries) => {
                self.output.push('{');
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.output.push_str(key);
                    self.output.push_str(": ");
                    self.print_value(item);
                }
                self.output.push('}');
            }
        }
    }

    fn print_description(&mut self, description: Option<&str>) {
        let Some(description) = description else {
            return;
        };
        self.push_indent();
        if description.contains('\n') {
            self.output.push_str("\"\"\"\n");
            for line in description.lines() {
                self.push_indent();
                self.output.push_str(line);
                self.output.push('\n');
            }
            self.push_indent();
            self.output.push_str("\"\"\"\n");
        } else {
            self.output.push_str("\"\"\"");
            self.output.push_str(&description.replace("\"\"\"", "\\\"\"\""));
            self.output.push_str("\"\"\"\n");
        }
    }

    fn push_indent(&mut self) {
        for _ in 0..(self.indent * self.options.indent_size) {
            self.output.push(' ');
        }
    }
}
