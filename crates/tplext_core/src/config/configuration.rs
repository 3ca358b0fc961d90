//! Effective configuration shape and whole-configuration merge/fill.
//!
//! # Responsibility
//! - Hold top-level options, per-category contributions and the modules list.
//! - Merge, fill, overlay and pin whole configurations without losing the
//!   category shapes.
//!
//! # Invariants
//! - A stored contribution always matches its category shape.
//! - Empty contributions are dropped, so absent and empty compare equal.

use crate::config::merge::{
    fill_map, merge_maps, overlay_map, pin_map, MergeError, MergeResult,
};
use crate::config::value::{OptionMap, OptionValue};
use crate::extension::category::{Category, CategoryShape};
use crate::extension::identity::ExtensionId;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Value held by one category: keyed entries or an ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contribution {
    Keyed(OptionMap),
    Sequence(Vec<OptionValue>),
}

impl Contribution {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Keyed(entries) => entries.is_empty(),
            Self::Sequence(items) => items.is_empty(),
        }
    }

    pub fn shape(&self) -> CategoryShape {
        match self {
            Self::Keyed(_) => CategoryShape::Keyed,
            Self::Sequence(_) => CategoryShape::Sequence,
        }
    }

    pub fn as_keyed(&self) -> Option<&OptionMap> {
        match self {
            Self::Keyed(entries) => Some(entries),
            Self::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[OptionValue]> {
        match self {
            Self::Sequence(items) => Some(items.as_slice()),
            Self::Keyed(_) => None,
        }
    }

    fn merge(self, incoming: &Contribution, path: &str) -> MergeResult<Self> {
        match (self, incoming) {
            (Self::Keyed(left), Self::Keyed(right)) => {
                merge_maps(left, right, path).map(Self::Keyed)
            }
            (Self::Sequence(mut left), Self::Sequence(right)) => {
                left.extend(right.iter().cloned());
                Ok(Self::Sequence(left))
            }
            (left, right) => Err(shape_mismatch(path, left.shape(), right.shape())),
        }
    }
}

/// Effective configuration consumed by the rendering pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Top-level entries: general options and event bindings.
    pub options: OptionMap,
    #[serde(deserialize_with = "deserialize_categories")]
    categories: BTreeMap<Category, Contribution>,
    /// Active module-kind extensions, in activation order.
    pub modules: Vec<ExtensionId>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder variant of setting one top-level option.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Builder variant of [`Configuration::set_category`].
    pub fn with_category(
        mut self,
        category: Category,
        contribution: Contribution,
    ) -> MergeResult<Self> {
        self.set_category(category, contribution)?;
        Ok(self)
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn category(&self, category: Category) -> Option<&Contribution> {
        self.categories.get(&category)
    }

    /// Returns keyed entries of `category`, `None` when absent or a sequence.
    pub fn keyed(&self, category: Category) -> Option<&OptionMap> {
        self.category(category).and_then(Contribution::as_keyed)
    }

    pub fn sequence(&self, category: Category) -> Option<&[OptionValue]> {
        self.category(category).and_then(Contribution::as_sequence)
    }

    /// Returns one keyed entry of `category`.
    pub fn category_entry(&self, category: Category, key: &str) -> Option<&OptionValue> {
        self.keyed(category).and_then(|entries| entries.get(key))
    }

    /// Replaces the contribution of `category`.
    ///
    /// Empty contributions clear the category. A contribution whose shape does
    /// not match the category fails with a type mismatch.
    pub fn set_category(
        &mut self,
        category: Category,
        contribution: Contribution,
    ) -> MergeResult<()> {
        if contribution.shape() != category.shape() {
            return Err(shape_mismatch(
                category.as_str(),
                category.shape(),
                contribution.shape(),
            ));
        }
        if contribution.is_empty() {
            self.categories.remove(&category);
        } else {
            self.categories.insert(category, contribution);
        }
        Ok(())
    }

    /// Inserts `entries` into a keyed category, replacing same-key values.
    ///
    /// Returns `false`, leaving the configuration untouched, when `category`
    /// is a sequence.
    pub fn extend_keyed(&mut self, category: Category, entries: OptionMap) -> bool {
        if category.shape() != CategoryShape::Keyed {
            return false;
        }
        if entries.is_empty() {
            return true;
        }
        match self.categories.get_mut(&category) {
            Some(Contribution::Keyed(present)) => present.extend(entries),
            _ => {
                self.categories.insert(category, Contribution::Keyed(entries));
            }
        }
        true
    }

    /// Merges `contribution` into the current value of `category`.
    pub fn merge_category(
        &mut self,
        category: Category,
        contribution: &Contribution,
    ) -> MergeResult<()> {
        if contribution.shape() != category.shape() {
            return Err(shape_mismatch(
                category.as_str(),
                category.shape(),
                contribution.shape(),
            ));
        }
        if contribution.is_empty() {
            return Ok(());
        }
        let merged = match self.categories.remove(&category) {
            Some(existing) => existing.merge(contribution, category.as_str())?,
            None => contribution.clone(),
        };
        self.categories.insert(category, merged);
        Ok(())
    }

    /// Iterates stored category contributions in category order.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &Contribution)> {
        self.categories.iter().map(|(category, value)| (*category, value))
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.categories.is_empty() && self.modules.is_empty()
    }

    pub fn has_module(&self, id: &ExtensionId) -> bool {
        self.modules.contains(id)
    }
}

/// Merges `right` onto `left`: options and categories accumulate, modules append.
pub fn merge_config(left: Configuration, right: &Configuration) -> MergeResult<Configuration> {
    let Configuration {
        options,
        categories,
        mut modules,
    } = left;
    let mut merged = Configuration {
        options: merge_maps(options, &right.options, "")?,
        categories,
        modules: Vec::new(),
    };
    for (category, contribution) in &right.categories {
        merged.merge_category(*category, contribution)?;
    }
    modules.extend(right.modules.iter().cloned());
    merged.modules = modules;
    Ok(merged)
}

/// Fills everything absent in `target` from `defaults` without overwriting.
pub fn fill_config(target: &mut Configuration, defaults: &Configuration) {
    fill_map(&mut target.options, &defaults.options);
    for (category, default) in &defaults.categories {
        if let Some(present) = target.categories.get_mut(category) {
            if let (Contribution::Keyed(present), Contribution::Keyed(default)) =
                (present, default)
            {
                fill_map(present, default);
            }
            continue;
        }
        target.categories.insert(*category, default.clone());
    }
    if target.modules.is_empty() {
        target.modules = defaults.modules.clone();
    }
}

/// Writes every option and category entry of `overrides` over `target`.
///
/// Keyed categories recurse like maps; sequences are replaced. Modules are
/// left alone.
pub fn overlay_config(target: &mut Configuration, overrides: &Configuration) {
    overlay_map(&mut target.options, &overrides.options);
    for (category, contribution) in &overrides.categories {
        match (target.categories.get_mut(category), contribution) {
            (Some(Contribution::Keyed(present)), Contribution::Keyed(entries)) => {
                overlay_map(present, entries);
            }
            _ => {
                target.categories.insert(*category, contribution.clone());
            }
        }
    }
}

/// Re-applies the scalar leaves of `pinned` onto `target`.
///
/// Accumulated lists and sequence categories are kept as they are.
pub fn pin_config(target: &mut Configuration, pinned: &Configuration) {
    pin_map(&mut target.options, &pinned.options);
    for (category, contribution) in &pinned.categories {
        let Contribution::Keyed(entries) = contribution else {
            continue;
        };
        match target.categories.get_mut(category) {
            Some(Contribution::Keyed(present)) => pin_map(present, entries),
            Some(Contribution::Sequence(_)) => {}
            None => {
                target.categories.insert(*category, contribution.clone());
            }
        }
    }
}

fn shape_mismatch(path: &str, existing: CategoryShape, incoming: CategoryShape) -> MergeError {
    MergeError::TypeMismatch {
        path: path.to_string(),
        existing: existing.type_name(),
        incoming: incoming.type_name(),
    }
}

fn deserialize_categories<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<Category, Contribution>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<Category, Contribution>::deserialize(deserializer)?;
    let mut categories = BTreeMap::new();
    for (category, contribution) in raw {
        if contribution.is_empty() {
            continue;
        }
        if contribution.shape() != category.shape() {
            return Err(serde::de::Error::custom(format!(
                "category `{}` expects a {} contribution",
                category.as_str(),
                category.shape().type_name()
            )));
        }
        categories.insert(category, contribution);
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::{
        fill_config, merge_config, overlay_config, pin_config, Configuration, Contribution,
    };
    use crate::config::merge::MergeError;
    use crate::config::value::{option_map, OptionValue};
    use crate::extension::category::Category;
    use crate::extension::identity::ExtensionId;

    fn keywords(entries: &[(&str, &str)]) -> Contribution {
        Contribution::Keyed(option_map(entries.iter().copied()))
    }

    fn module(name: &str) -> ExtensionId {
        ExtensionId::parse(name).expect("module id")
    }

    #[test]
    fn empty_contribution_is_not_stored() {
        let mut config = Configuration::new();
        config
            .set_category(Category::Keywords, Contribution::Keyed(Default::default()))
            .expect("set");
        assert!(config.category(Category::Keywords).is_none());
        assert_eq!(config, Configuration::new());
    }

    #[test]
    fn extend_keyed_replaces_entries_and_refuses_sequences() {
        let mut config = Configuration::new();
        assert!(config.extend_keyed(Category::Patterns, option_map([("a", "1"), ("b", "2")])));
        assert!(config.extend_keyed(Category::Patterns, option_map([("a", "3")])));
        assert_eq!(
            config.category_entry(Category::Patterns, "a"),
            Some(&OptionValue::from("3"))
        );
        assert_eq!(
            config.category_entry(Category::Patterns, "b"),
            Some(&OptionValue::from("2"))
        );

        assert!(!config.extend_keyed(Category::Includes, option_map([("a", "1")])));
        assert!(config.category(Category::Includes).is_none());
    }

    #[test]
    fn rejects_contribution_with_wrong_shape() {
        let mut config = Configuration::new();
        let err = config
            .set_category(Category::Includes, keywords(&[("a", "b")]))
            .expect_err("includes is a sequence");
        assert_eq!(
            err,
            MergeError::TypeMismatch {
                path: "includes".to_string(),
                existing: "list",
                incoming: "map",
            }
        );
    }

    #[test]
    fn merge_config_accumulates_categories_options_and_modules() {
        let mut left = Configuration::new().with_option("debug", false);
        left.set_category(Category::Keywords, keywords(&[("foo", "a")]))
            .expect("set");
        left.modules.push(module("CompilerModule"));

        let mut right = Configuration::new().with_option("debug", true);
        right
            .set_category(Category::Keywords, keywords(&[("bar", "b")]))
            .expect("set");
        right
            .set_category(
                Category::Includes,
                Contribution::Sequence(vec![OptionValue::from("mixins.tpl")]),
            )
            .expect("set");
        right.modules.push(module("FormatterModule"));

        let merged = merge_config(left, &right).expect("merge");
        assert_eq!(merged.option("debug"), Some(&OptionValue::Bool(true)));
        let keys: Vec<&str> = merged
            .keyed(Category::Keywords)
            .expect("keywords")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["foo", "bar"]);
        assert_eq!(
            merged.sequence(Category::Includes),
            Some(&[OptionValue::from("mixins.tpl")][..])
        );
        assert_eq!(
            merged.modules,
            vec![module("compilermodule"), module("formattermodule")]
        );
    }

    #[test]
    fn fill_config_keeps_target_values() {
        let mut target = Configuration::new().with_option("execute_code", true);
        target
            .set_category(Category::Patterns, keywords(&[("html_comment", "user")]))
            .expect("set");

        let mut defaults = Configuration::new()
            .with_option("execute_code", false)
            .with_option("pretty", false);
        defaults
            .set_category(
                Category::Patterns,
                keywords(&[("html_comment", "default"), ("handle_code", "code")]),
            )
            .expect("set");
        defaults
            .set_category(Category::Filters, keywords(&[("upper", "strtoupper")]))
            .expect("set");

        fill_config(&mut target, &defaults);
        assert_eq!(target.option("execute_code"), Some(&OptionValue::Bool(true)));
        assert_eq!(target.option("pretty"), Some(&OptionValue::Bool(false)));
        assert_eq!(
            target.category_entry(Category::Patterns, "html_comment"),
            Some(&OptionValue::from("user"))
        );
        assert_eq!(
            target.category_entry(Category::Patterns, "handle_code"),
            Some(&OptionValue::from("code"))
        );
        assert!(target.keyed(Category::Filters).is_some());
    }

    #[test]
    fn overlay_then_pin_keeps_user_scalars_over_extension_entries() {
        let mut defaults = Configuration::new();
        defaults
            .set_category(
                Category::Patterns,
                keywords(&[("html_comment", "default"), ("handle_code", "code")]),
            )
            .expect("set");
        let mut explicit = Configuration::new();
        explicit
            .set_category(Category::Patterns, keywords(&[("html_comment", "user")]))
            .expect("set");

        overlay_config(&mut defaults, &explicit);
        assert_eq!(
            defaults.category_entry(Category::Patterns, "html_comment"),
            Some(&OptionValue::from("user"))
        );

        let mut fragment = Configuration::new();
        fragment
            .set_category(Category::Patterns, keywords(&[("html_comment", "extension")]))
            .expect("set");
        let mut merged = merge_config(defaults, &fragment).expect("merge");
        pin_config(&mut merged, &explicit);
        assert_eq!(
            merged.category_entry(Category::Patterns, "html_comment"),
            Some(&OptionValue::from("user"))
        );
        assert_eq!(
            merged.category_entry(Category::Patterns, "handle_code"),
            Some(&OptionValue::from("code"))
        );
    }

    #[test]
    fn deserializes_from_json_and_normalizes_modules() {
        let json = serde_json::json!({
            "options": {"execute_code": true},
            "categories": {
                "patterns": {"html_comment": "<!-- %s -->"},
                "keywords": {}
            },
            "modules": ["\\Vendor\\CompilerModule"]
        });
        let config: Configuration = serde_json::from_value(json).expect("deserialize");

        assert_eq!(config.option("execute_code"), Some(&OptionValue::Bool(true)));
        assert!(config.category(Category::Keywords).is_none());
        assert_eq!(config.modules, vec![module("vendor\\compilermodule")]);
    }

    #[test]
    fn deserialize_rejects_shape_mismatch() {
        let json = serde_json::json!({"categories": {"includes": {"a": "b"}}});
        let err = serde_json::from_value::<Configuration>(json).expect_err("must fail");
        assert!(err.to_string().contains("includes"));
    }
}
