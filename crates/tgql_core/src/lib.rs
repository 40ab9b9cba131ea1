//! Core utilities for tgql.
//!
//! This crate provides foundational types used throughout tgql:
//! - `location`: Declaration sites
//! - `diagnostics`: Error reporting
//! - `error`: Fatal build errors

pub mod diagnostics;
pub mod error;
pub mod location;

pub use diagnostics::{Diagnostic, DiagnosticBag, Label};
pub use error::{BuildError, BuildResult};
pub use location::Location;
