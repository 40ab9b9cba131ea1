//! Schema building for tgql.
//!
//! This crate turns a finished [`TypeRegistry`](tgql_metadata::TypeRegistry)
//! into a realized schema graph:
//! - `schema`: The realized schema (type arena, fields, directives)
//! - `options`: Build options and scalar modes
//! - `mapper`: Scalar mapping and type wrapping
//! - `orphans`: Types emitted without being reached from a root
//! - `directives`: Specified and federation directive definitions
//! - `federation`: Federation directive sources
//! - `validate`: Structural validation
//! - `printer`: Schema definition language output
//! - `builder`: The `SchemaBuilder` entry point

mod args;
pub mod builder;
mod context;
pub mod directives;
pub mod federation;
mod input;
pub mod mapper;
pub mod options;
pub mod orphans;
mod output;
pub mod printer;
mod root;
pub mod schema;
mod storage;
pub mod validate;

pub use builder::SchemaBuilder;
pub use directives::{federation_directives, is_specified_directive, specified_directives};
pub use federation::{ApolloFederation, DirectiveSource, FederationDirectives, FileDirectiveSource};
pub use mapper::TypeMapper;
pub use options::{BuildSchemaOptions, DateScalarMode, NumberScalarMode, ScalarImpl};
pub use orphans::OrphanedReferenceRegistry;
pub use printer::{print_schema, PrintOptions, SCHEMA_FILE_HEADER};
pub use schema::{
    DirectiveArgument, DirectiveDefinition, DirectiveLocation, Field, FieldDefinitionNode,
    InputObjectType, InputValue, NamedType, ObjectType, ResolverSlot, ScalarType, Schema,
    TypeDefinitionNode, TypeId, TypeKind, TypeNode,
};
pub use validate::{check_schema, validate_schema};
