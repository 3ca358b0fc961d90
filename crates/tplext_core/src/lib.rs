//! Extension registry and options composition for a template renderer.
//!
//! Extensions contribute configuration fragments per category; the registry
//! merges them into the renderer's effective configuration on add and
//! rebuilds that configuration from defaults and survivors on remove.

pub mod compose;
pub mod config;
pub mod extension;
pub mod logging;
pub mod renderer;

pub use compose::{compose_all, extract_fragments, fold_fragments, get_extensions_options};
pub use config::configuration::{
    fill_config, merge_config, overlay_config, pin_config, Configuration, Contribution,
};
pub use config::merge::{merge_values, MergeError, MergeResult};
pub use config::value::{option_map, OptionMap, OptionValue};
pub use extension::category::{parse_category, Category, CategoryError, CategoryShape};
pub use extension::contract::{Extension, ExtensionEntry};
pub use extension::identity::{ExtensionId, IdentityError};
pub use extension::registry::{ActiveExtension, ExtensionRegistry, RegistryError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use renderer::template::{RenderError, RenderResult};
pub use renderer::{builtin_defaults, Renderer, RendererFacade, RendererState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
