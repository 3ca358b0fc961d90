//! Options composer: folds extension fragments into one configuration.
//!
//! # Responsibility
//! - Extract every fragment a standard extension contributes.
//! - Fold fragments, in order, onto a base configuration.
//!
//! # Invariants
//! - General options and event bindings land at the top level.
//! - Category fragments land under their category.
//! - Empty fragments are skipped.
//! - Composition never touches registry or facade state.

use crate::config::configuration::{merge_config, Configuration};
use crate::config::merge::{merge_maps, MergeResult};
use crate::extension::category::Category;
use crate::extension::contract::{Extension, ExtensionEntry};
use log::trace;

/// Collects the fragments `extension` contributes into a fresh configuration.
pub fn extract_fragments(extension: &dyn Extension) -> MergeResult<Configuration> {
    let mut fragment = Configuration::new();

    for top_level in [extension.options(), extension.events()] {
        if !top_level.is_empty() {
            fragment.options = merge_maps(std::mem::take(&mut fragment.options), &top_level, "")?;
        }
    }

    for category in Category::ALL {
        let contribution = category.extract(extension);
        if !contribution.is_empty() {
            fragment.merge_category(category, &contribution)?;
        }
    }

    trace!(
        "event=extension_extract module=compose status=ok name={} categories={}",
        extension.name(),
        fragment.categories().count()
    );
    Ok(fragment)
}

/// Merges already-extracted fragments onto `base`, in iteration order.
pub fn fold_fragments<'a, I>(base: Configuration, fragments: I) -> MergeResult<Configuration>
where
    I: IntoIterator<Item = &'a Configuration>,
{
    fragments
        .into_iter()
        .try_fold(base, |accumulated, fragment| merge_config(accumulated, fragment))
}

/// Extracts and merges every extension onto `base`, in iteration order.
pub fn compose_all<'a, I>(base: Configuration, extensions: I) -> MergeResult<Configuration>
where
    I: IntoIterator<Item = &'a dyn Extension>,
{
    extensions.into_iter().try_fold(base, |accumulated, extension| {
        let fragment = extract_fragments(extension)?;
        merge_config(accumulated, &fragment)
    })
}

/// Composes `entries` onto `options` without any registry involvement.
///
/// Module entries are appended to `modules` as given; standard entries are
/// extracted and merged.
pub fn get_extensions_options(
    entries: &[ExtensionEntry],
    options: Configuration,
) -> MergeResult<Configuration> {
    entries.iter().try_fold(options, |mut accumulated, entry| match entry {
        ExtensionEntry::Module(id) => {
            accumulated.modules.push(id.clone());
            Ok(accumulated)
        }
        ExtensionEntry::Standard(extension) => {
            let fragment = extract_fragments(extension.as_ref())?;
            merge_config(accumulated, &fragment)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{compose_all, extract_fragments, fold_fragments, get_extensions_options};
    use crate::config::configuration::{Configuration, Contribution};
    use crate::config::merge::MergeError;
    use crate::config::value::{option_map, OptionMap, OptionValue};
    use crate::extension::category::Category;
    use crate::extension::contract::{Extension, ExtensionEntry};
    use crate::extension::identity::ExtensionId;

    struct Keywords {
        name: &'static str,
        entries: &'static [(&'static str, &'static str)],
    }

    impl Extension for Keywords {
        fn name(&self) -> &str {
            self.name
        }

        fn keywords(&self) -> OptionMap {
            option_map(self.entries.iter().copied())
        }
    }

    struct Events;

    impl Extension for Events {
        fn name(&self) -> &str {
            "events"
        }

        fn options(&self) -> OptionMap {
            option_map([("debug", true)])
        }

        fn events(&self) -> OptionMap {
            option_map([("on_render", OptionValue::List(vec!["log_render".into()]))])
        }

        fn includes(&self) -> Vec<OptionValue> {
            vec!["layout.tpl".into()]
        }
    }

    struct ListyOptions;

    impl Extension for ListyOptions {
        fn name(&self) -> &str {
            "listy"
        }

        fn options(&self) -> OptionMap {
            option_map([("on_render", OptionValue::Map(option_map([("x", 1_i64)])))])
        }
    }

    #[test]
    fn options_and_events_land_at_top_level() {
        let fragment = extract_fragments(&Events).expect("extract");

        assert_eq!(fragment.option("debug"), Some(&OptionValue::Bool(true)));
        assert_eq!(
            fragment.option("on_render"),
            Some(&OptionValue::List(vec!["log_render".into()]))
        );
        assert!(fragment.option("options").is_none());
        assert!(fragment.option("events").is_none());
        assert_eq!(
            fragment.sequence(Category::Includes),
            Some(&[OptionValue::from("layout.tpl")][..])
        );
        assert!(fragment.keyed(Category::Keywords).is_none());
    }

    #[test]
    fn compose_all_keeps_registration_order() {
        let first = Keywords {
            name: "first",
            entries: &[("alpha", "a")],
        };
        let second = Keywords {
            name: "second",
            entries: &[("beta", "b")],
        };
        let extensions: [&dyn Extension; 2] = [&first, &second];

        let composed = compose_all(Configuration::new(), extensions).expect("compose");
        let keys: Vec<&str> = composed
            .keyed(Category::Keywords)
            .expect("keywords")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["alpha", "beta"]);
    }

    #[test]
    fn fold_over_cached_fragments_equals_compose() {
        let first = Keywords {
            name: "first",
            entries: &[("same", "first")],
        };
        let second = Keywords {
            name: "second",
            entries: &[("same", "second")],
        };
        let base = Configuration::new().with_option("execute_code", true);

        let fragments = [
            extract_fragments(&first).expect("extract"),
            extract_fragments(&second).expect("extract"),
        ];
        let folded = fold_fragments(base.clone(), &fragments).expect("fold");
        let extensions: [&dyn Extension; 2] = [&first, &second];
        let composed = compose_all(base, extensions).expect("compose");

        assert_eq!(folded, composed);
        assert_eq!(
            folded.category_entry(Category::Keywords, "same"),
            Some(&OptionValue::from("second"))
        );
    }

    #[test]
    fn composition_mismatch_surfaces_as_merge_error() {
        let extensions: [&dyn Extension; 2] = [&Events, &ListyOptions];
        let err = compose_all(Configuration::new(), extensions).expect_err("must fail");
        assert!(matches!(err, MergeError::TypeMismatch { ref path, .. } if path == "on_render"));
    }

    #[test]
    fn get_extensions_options_appends_modules_and_merges_standard() {
        let mut base = Configuration::new();
        base.set_category(
            Category::Keywords,
            Contribution::Keyed(option_map([("base", "kept")])),
        )
        .expect("set");

        let entries = vec![
            ExtensionEntry::module("CompilerModule").expect("module"),
            ExtensionEntry::standard(Keywords {
                name: "kw",
                entries: &[("extra", "x")],
            }),
            ExtensionEntry::module("CompilerModule").expect("module"),
        ];

        let composed = get_extensions_options(&entries, base).expect("compose");
        let module = ExtensionId::parse("compilermodule").expect("id");
        assert_eq!(composed.modules, vec![module.clone(), module]);
        let keywords = composed.keyed(Category::Keywords).expect("keywords");
        assert_eq!(keywords.get("base"), Some(&OptionValue::from("kept")));
        assert_eq!(keywords.get("extra"), Some(&OptionValue::from("x")));
    }
}
