//! Closed configuration schema and the merge primitives over it.
//!
//! # Responsibility
//! - Define the option value tree contributed by extensions and defaults.
//! - Provide pure merge/fill functions used by the composer and the facade.
//!
//! # Invariants
//! - Merges accumulate containers and let the later operand win on scalars.
//! - A map meeting a list is a type mismatch, never a silent overwrite.
//! - Empty category contributions are never stored.

pub mod configuration;
pub mod merge;
pub mod value;
