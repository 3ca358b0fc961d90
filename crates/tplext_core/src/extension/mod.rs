//! Extension contracts and the extension registry.
//!
//! Extensions extend the renderer by contributing configuration fragments;
//! they never run inside the registry. Loading extensions from outside the
//! process is out of scope.

pub mod category;
pub mod contract;
pub mod identity;
pub mod registry;
