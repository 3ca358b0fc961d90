//! Extension contract and registration entries.
//!
//! # Responsibility
//! - Define the accessor surface a standard extension exposes.
//! - Distinguish standard extensions from module markers at the type level.
//!
//! # Invariants
//! - Accessors are pure: calling them twice yields equal fragments.
//! - Module markers contribute nothing through accessors.

use crate::config::value::{OptionMap, OptionValue};
use crate::extension::identity::{ExtensionId, IdentityError};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Standard extension: contributes fragments per category.
///
/// Every accessor defaults to "contributes nothing"; implementors override the
/// facets they fill.
pub trait Extension {
    /// Stable name used for identity (see [`ExtensionId::parse`]).
    fn name(&self) -> &str;

    /// General options, merged into the top level of the configuration.
    fn options(&self) -> OptionMap {
        OptionMap::new()
    }

    /// Event-handler bindings, merged into the top level of the configuration.
    fn events(&self) -> OptionMap {
        OptionMap::new()
    }

    fn includes(&self) -> Vec<OptionValue> {
        Vec::new()
    }

    fn scanners(&self) -> OptionMap {
        OptionMap::new()
    }

    fn token_handlers(&self) -> OptionMap {
        OptionMap::new()
    }

    fn node_compilers(&self) -> OptionMap {
        OptionMap::new()
    }

    fn formats(&self) -> OptionMap {
        OptionMap::new()
    }

    fn patterns(&self) -> OptionMap {
        OptionMap::new()
    }

    fn filters(&self) -> OptionMap {
        OptionMap::new()
    }

    fn keywords(&self) -> OptionMap {
        OptionMap::new()
    }

    fn element_handlers(&self) -> Vec<OptionValue> {
        Vec::new()
    }

    fn php_token_handlers(&self) -> OptionMap {
        OptionMap::new()
    }

    fn assignment_handlers(&self) -> Vec<OptionValue> {
        Vec::new()
    }
}

/// One entry handed to the registry or the standalone composer.
#[derive(Clone)]
pub enum ExtensionEntry {
    /// Extension contributing through the category accessors.
    Standard(Arc<dyn Extension>),
    /// Marker tracked only through the configuration `modules` list.
    Module(ExtensionId),
}

impl ExtensionEntry {
    pub fn standard(extension: impl Extension + 'static) -> Self {
        Self::Standard(Arc::new(extension))
    }

    pub fn module(name: &str) -> Result<Self, IdentityError> {
        ExtensionId::parse(name).map(Self::Module)
    }

    /// Normalized identity of this entry.
    pub fn id(&self) -> Result<ExtensionId, IdentityError> {
        match self {
            Self::Standard(extension) => ExtensionId::parse(extension.name()),
            Self::Module(id) => Ok(id.clone()),
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self, Self::Module(_))
    }
}

impl Debug for ExtensionEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard(extension) => f
                .debug_tuple("Standard")
                .field(&extension.name())
                .finish(),
            Self::Module(id) => f.debug_tuple("Module").field(id).finish(),
        }
    }
}
