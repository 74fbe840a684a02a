//! Core symbol model for the javamp translator.
//!
//! This crate holds the tree-independent data model shared by the
//! translation stage and the CLI:
//! - `classes` - arena-backed class graph of one compilation unit
//! - `vars` - captured-variable model with deterministic name mangling
//! - `directive` - pragma kinds, clause sets, and generated names

pub mod classes;
pub mod directive;
pub mod vars;

#[cfg(test)]
mod vars_tests;

pub use classes::{ClassArena, ClassEntry, ClassId, ClassKind};
pub use directive::{Clauses, DirectiveKind, EXECUTOR_CLASS, GeneratedNames, ReductionOp};
pub use vars::{VarKind, Variable, array_less};
