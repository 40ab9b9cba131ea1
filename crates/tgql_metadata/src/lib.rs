//! Declaration metadata for tgql.
//!
//! This crate provides:
//! - `entity`: Entity handles and the inheritance table
//! - `reference`: Type references and wrapping options
//! - `metadata`: Metadata records
//! - `registry`: The type registry
//! - `lazy`: The deferred registration queue
//! - `declare`: The registration API

pub mod declare;
pub mod entity;
pub mod lazy;
pub mod metadata;
pub mod reference;
pub mod registry;

pub use declare::{
    ArgDeclaration, ClassDeclaration, Declarations, FieldDeclaration, HandlerDeclaration,
    NamedArg, ResolverDeclaration,
};
pub use entity::{DefaultValues, DefaultsFactory, Entity, EntityId, EntityTable};
pub use lazy::{LazyMetadataQueue, LazyThunk};
pub use metadata::{
    ClassMetadata, DirectiveUsage, FieldMetadata, HandlerMetadata, MethodArgKind,
    MethodArgMetadata, ResolverClassMetadata, RootKind, ScalarMetadata,
};
pub use reference::{ArrayNullable, TypeOptions, TypeReference, TypeThunk};
pub use registry::{ClassKind, TypeRegistry};
