//! Renderer facade: owner of the live effective configuration.
//!
//! # Responsibility
//! - Expose the narrow read/merge/replace/fill surface the registry drives.
//! - Keep built-in defaults, explicit user settings and the effective
//!   configuration apart so recomputation can rebuild from them.
//! - Own one [`ExtensionRegistry`] per renderer; there is no global registry.
//!
//! # Invariants
//! - Explicit scalar settings win over defaults and extension fragments;
//!   lists set explicitly still accumulate extension contributions.
//! - A failed merge leaves the effective configuration unchanged.
//! - Access is single-threaded; callers serialize concurrent use themselves.

pub mod template;

use crate::config::configuration::{fill_config, merge_config, pin_config, Configuration};
use crate::config::merge::{MergeError, MergeResult};
use crate::config::value::{option_map, OptionMap, OptionValue};
use crate::extension::category::{Category, CategoryShape};
use crate::extension::contract::ExtensionEntry;
use crate::extension::registry::{ExtensionRegistry, RegistryError};
use crate::renderer::template::{
    RenderResult, OPTION_EXECUTE_CODE, PATTERN_DISPLAY_CODE, PATTERN_HANDLE_CODE,
    PATTERN_HTML_COMMENT,
};
use log::{debug, warn};

/// Configuration surface the extension registry mutates.
pub trait RendererFacade {
    fn current_configuration(&self) -> &Configuration;

    /// Replaces the effective configuration wholesale.
    fn replace_configuration(&mut self, configuration: Configuration);

    /// Recursively merges `fragment` in place.
    ///
    /// Implementations must leave the configuration unchanged on error.
    fn merge_into_configuration(&mut self, fragment: &Configuration) -> MergeResult<()>;

    /// Built-in defaults, the seed of every recomputation.
    fn default_configuration(&self) -> Configuration;

    /// Settings made explicitly by the user, outside any extension.
    fn explicit_configuration(&self) -> Configuration;

    /// Fills absent entries from `defaults` without overwriting present ones.
    fn set_options_defaults(&mut self, defaults: &Configuration);
}

/// Configuration state of one renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererState {
    defaults: Configuration,
    explicit: Configuration,
    current: Configuration,
}

impl RendererState {
    pub fn new(defaults: Configuration) -> Self {
        Self {
            current: defaults.clone(),
            defaults,
            explicit: Configuration::new(),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.current
    }

    /// Records an explicit top-level option.
    ///
    /// The effective configuration is untouched until the owning registry
    /// refreshes it.
    pub fn record_option(&mut self, name: &str, value: OptionValue) {
        self.explicit.options.insert(name.to_string(), value);
    }

    /// Records an explicit entry of a keyed category.
    pub fn record_category_option(
        &mut self,
        category: Category,
        key: &str,
        value: OptionValue,
    ) -> MergeResult<()> {
        if category.shape() != CategoryShape::Keyed {
            return Err(MergeError::TypeMismatch {
                path: format!("{category}.{key}"),
                existing: category.shape().type_name(),
                incoming: CategoryShape::Keyed.type_name(),
            });
        }
        self.explicit.extend_keyed(category, option_map([(key, value)]));
        Ok(())
    }
}

impl RendererFacade for RendererState {
    fn current_configuration(&self) -> &Configuration {
        &self.current
    }

    fn replace_configuration(&mut self, configuration: Configuration) {
        self.current = configuration;
    }

    fn merge_into_configuration(&mut self, fragment: &Configuration) -> MergeResult<()> {
        let mut merged = merge_config(self.current.clone(), fragment)?;
        pin_config(&mut merged, &self.explicit);
        self.current = merged;
        Ok(())
    }

    fn default_configuration(&self) -> Configuration {
        self.defaults.clone()
    }

    fn explicit_configuration(&self) -> Configuration {
        self.explicit.clone()
    }

    fn set_options_defaults(&mut self, defaults: &Configuration) {
        fill_config(&mut self.defaults, defaults);
        fill_config(&mut self.current, defaults);
    }
}

/// Built-in defaults understood by [`template::render`].
pub fn builtin_defaults() -> Configuration {
    let mut defaults = Configuration::new().with_option(OPTION_EXECUTE_CODE, true);
    let patterns: OptionMap = option_map([
        (PATTERN_HTML_COMMENT, "<!-- %s -->"),
        (PATTERN_HANDLE_CODE, "<?php %s ?>"),
        (PATTERN_DISPLAY_CODE, "<?= %s ?>"),
    ]);
    defaults.extend_keyed(Category::Patterns, patterns);
    defaults
}

/// Renderer owning its configuration state and extension registry.
#[derive(Debug, Clone)]
pub struct Renderer {
    state: RendererState,
    extensions: ExtensionRegistry,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(builtin_defaults())
    }
}

impl Renderer {
    pub fn new(defaults: Configuration) -> Self {
        Self {
            state: RendererState::new(defaults),
            extensions: ExtensionRegistry::new(),
        }
    }

    /// Builds a renderer whose defaults already carry `entries`.
    pub fn with_extensions(
        defaults: Configuration,
        entries: &[ExtensionEntry],
    ) -> Result<Self, RegistryError> {
        let mut renderer = Self::new(defaults);
        for entry in entries {
            renderer.add_extension(entry)?;
        }
        Ok(renderer)
    }

    pub fn configuration(&self) -> &Configuration {
        self.state.configuration()
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.configuration().option(name)
    }

    /// Sets an explicit top-level option and recomputes the configuration.
    ///
    /// On failure the previous explicit settings and configuration are kept.
    pub fn set_option(
        &mut self,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> Result<(), RegistryError> {
        let previous = self.state.clone();
        self.state.record_option(name, value.into());
        self.refresh(previous)?;
        debug!("event=option_set module=renderer status=ok name={name}");
        Ok(())
    }

    pub fn set_category_option(
        &mut self,
        category: Category,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> Result<(), RegistryError> {
        let previous = self.state.clone();
        self.state
            .record_category_option(category, key, value.into())
            .map_err(RegistryError::Rebuild)?;
        self.refresh(previous)?;
        debug!("event=option_set module=renderer status=ok category={category} key={key}");
        Ok(())
    }

    /// Fills absent entries from `defaults`, keeping everything already set.
    pub fn set_options_defaults(&mut self, defaults: &Configuration) {
        self.state.set_options_defaults(defaults);
    }

    fn refresh(&mut self, previous: RendererState) -> Result<(), RegistryError> {
        if let Err(err) = self.extensions.refresh(&mut self.state) {
            warn!("event=option_set module=renderer status=error error={err}");
            self.state = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn add_extension(&mut self, entry: &ExtensionEntry) -> Result<bool, RegistryError> {
        self.extensions.add(&mut self.state, entry)
    }

    pub fn remove_extension(&mut self, name: &str) -> Result<bool, RegistryError> {
        self.extensions.remove(&mut self.state, name)
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.has(&self.state, name)
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn state(&self) -> &RendererState {
        &self.state
    }

    /// Renders `source` with the current effective configuration.
    pub fn render(&self, source: &str) -> RenderResult<String> {
        template::render(source, self.configuration())
    }
}
