//! Extension registry: active set plus add/remove orchestration.
//!
//! # Responsibility
//! - Track which standard extensions are active, in registration order.
//! - Push additions into the facade by merge; rebuild it on removal.
//!
//! # Invariants
//! - An identity is active at most once; re-adding is a no-op.
//! - Effective configuration equals defaults overlaid with explicit user
//!   settings, merged with every active fragment in order, with explicit
//!   scalar leaves pinned back on top. Lists keep accumulating.
//! - Removal never subtracts; it recomputes from defaults and survivors.
//! - A failed add/remove leaves registry and facade unchanged.

use crate::compose::{extract_fragments, fold_fragments};
use crate::config::configuration::{overlay_config, pin_config, Configuration};
use crate::config::merge::MergeError;
use crate::extension::contract::ExtensionEntry;
use crate::extension::identity::{ExtensionId, IdentityError};
use crate::renderer::RendererFacade;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Active standard extension with the fragment it contributed at add time.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveExtension {
    pub id: ExtensionId,
    pub fragment: Configuration,
}

/// Ordered set of active standard extensions owned by one renderer.
#[derive(Debug, Default, Clone)]
pub struct ExtensionRegistry {
    active: Vec<ActiveExtension>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `entry` against `facade`.
    ///
    /// Returns `Ok(true)` on activation and `Ok(false)` when the identity was
    /// already active.
    pub fn add<F>(
        &mut self,
        facade: &mut F,
        entry: &ExtensionEntry,
    ) -> Result<bool, RegistryError>
    where
        F: RendererFacade + ?Sized,
    {
        let id = entry.id().map_err(RegistryError::InvalidIdentity)?;
        if self.has_id(facade, &id) {
            debug!(
                "event=extension_add module=registry status=skipped reason=already_active id={id}"
            );
            return Ok(false);
        }

        match entry {
            ExtensionEntry::Module(_) => {
                let mut fragment = Configuration::new();
                fragment.modules.push(id.clone());
                facade
                    .merge_into_configuration(&fragment)
                    .map_err(|error| RegistryError::merge(&id, error))?;
                info!("event=extension_add module=registry status=ok kind=module id={id}");
            }
            ExtensionEntry::Standard(extension) => {
                let fragment = extract_fragments(extension.as_ref())
                    .map_err(|error| RegistryError::merge(&id, error))?;
                facade
                    .merge_into_configuration(&fragment)
                    .map_err(|error| RegistryError::merge(&id, error))?;
                info!(
                    "event=extension_add module=registry status=ok kind=standard id={id} active={}",
                    self.active.len() + 1
                );
                self.active.push(ActiveExtension { id, fragment });
            }
        }
        Ok(true)
    }

    /// Deactivates the extension named `name`.
    ///
    /// Returns `Ok(false)` when nothing with that identity was active.
    pub fn remove<F>(&mut self, facade: &mut F, name: &str) -> Result<bool, RegistryError>
    where
        F: RendererFacade + ?Sized,
    {
        let id = ExtensionId::parse(name).map_err(RegistryError::InvalidIdentity)?;

        if let Some(position) = self.active.iter().position(|active| active.id == id) {
            let recomputed = self
                .rebuild(facade, Some(position))
                .map_err(|error| RegistryError::merge(&id, error))?;
            facade.replace_configuration(recomputed);
            self.active.remove(position);
            info!(
                "event=extension_remove module=registry status=ok kind=standard id={id} active={}",
                self.active.len()
            );
            return Ok(true);
        }

        if facade.current_configuration().has_module(&id) {
            let mut next = facade.current_configuration().clone();
            next.modules.retain(|module| module != &id);
            facade.replace_configuration(next);
            info!("event=extension_remove module=registry status=ok kind=module id={id}");
            return Ok(true);
        }

        debug!("event=extension_remove module=registry status=skipped reason=not_active id={id}");
        Ok(false)
    }

    /// Returns whether `name` is active as a standard extension or a module.
    ///
    /// Names that normalize to nothing are never active.
    pub fn has<F>(&self, facade: &F, name: &str) -> bool
    where
        F: RendererFacade + ?Sized,
    {
        ExtensionId::parse(name)
            .map(|id| self.has_id(facade, &id))
            .unwrap_or(false)
    }

    pub fn has_id<F>(&self, facade: &F, id: &ExtensionId) -> bool
    where
        F: RendererFacade + ?Sized,
    {
        self.active.iter().any(|active| &active.id == id)
            || facade.current_configuration().has_module(id)
    }

    /// Rebuilds the effective configuration from scratch, without touching state.
    pub fn recompose<F>(&self, facade: &F) -> Result<Configuration, MergeError>
    where
        F: RendererFacade + ?Sized,
    {
        self.rebuild(facade, None)
    }

    /// Replaces the facade configuration with a fresh rebuild.
    ///
    /// Called after explicit settings change so they land under the same
    /// layering as extension fragments.
    pub fn refresh<F>(&self, facade: &mut F) -> Result<(), RegistryError>
    where
        F: RendererFacade + ?Sized,
    {
        let rebuilt = self.rebuild(facade, None).map_err(RegistryError::Rebuild)?;
        facade.replace_configuration(rebuilt);
        debug!(
            "event=registry_refresh module=registry status=ok active={}",
            self.active.len()
        );
        Ok(())
    }

    fn rebuild<F>(&self, facade: &F, skip: Option<usize>) -> Result<Configuration, MergeError>
    where
        F: RendererFacade + ?Sized,
    {
        let explicit = facade.explicit_configuration();
        let mut seed = facade.default_configuration();
        overlay_config(&mut seed, &explicit);

        let fragments = self
            .active
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != skip)
            .map(|(_, active)| &active.fragment);
        let mut rebuilt = fold_fragments(seed, fragments)?;
        pin_config(&mut rebuilt, &explicit);
        rebuilt.modules = facade.current_configuration().modules.clone();
        Ok(rebuilt)
    }

    /// Active standard identities in registration order.
    pub fn active_ids(&self) -> impl Iterator<Item = &ExtensionId> {
        self.active.iter().map(|active| &active.id)
    }

    pub fn active(&self) -> &[ActiveExtension] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Registry add/remove failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidIdentity(IdentityError),
    Merge { id: ExtensionId, error: MergeError },
    /// Explicit settings no longer compose with the active fragments.
    Rebuild(MergeError),
}

impl RegistryError {
    fn merge(id: &ExtensionId, error: MergeError) -> Self {
        Self::Merge {
            id: id.clone(),
            error,
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentity(err) => write!(f, "invalid extension identity: {err}"),
            Self::Merge { id, error } => {
                write!(f, "failed to compose extension `{id}`: {error}")
            }
            Self::Rebuild(error) => write!(f, "failed to rebuild configuration: {error}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentity(err) => Some(err),
            Self::Merge { error, .. } => Some(error),
            Self::Rebuild(error) => Some(error),
        }
    }
}
