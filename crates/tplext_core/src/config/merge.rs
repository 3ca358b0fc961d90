//! Recursive merge and fill-only primitives.
//!
//! # Invariants
//! - Map + map unions keys and recurses on shared keys.
//! - List + list appends the right items after the left items.
//! - Map + list (either order) fails with [`MergeError::TypeMismatch`].
//! - Any other collision is won by the right operand.
//! - Fill never overwrites a present value; it only recurses into maps.
//! - Overlay replaces every value except map + map, which recurses.
//! - Pinning restores scalar leaves only; lists and other containers keep
//!   whatever accumulated under them.

use crate::config::value::{OptionMap, OptionValue};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Merge failures raised by the recursive merge primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Two containers of different kinds met under the same key.
    TypeMismatch {
        path: String,
        existing: &'static str,
        incoming: &'static str,
    },
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                path,
                existing,
                incoming,
            } => write!(
                f,
                "cannot merge {incoming} into existing {existing} at `{path}`"
            ),
        }
    }
}

impl Error for MergeError {}

pub type MergeResult<T> = Result<T, MergeError>;

/// Merges `right` onto `left`, accumulating containers.
///
/// `path` only feeds error messages; pass the dotted location of `left`.
pub fn merge_values(
    left: OptionValue,
    right: &OptionValue,
    path: &str,
) -> MergeResult<OptionValue> {
    match (left, right) {
        (OptionValue::Map(left), OptionValue::Map(right)) => {
            merge_maps(left, right, path).map(OptionValue::Map)
        }
        (OptionValue::List(mut left), OptionValue::List(right)) => {
            left.extend(right.iter().cloned());
            Ok(OptionValue::List(left))
        }
        (left, right) if left.is_container() && right.is_container() => {
            Err(MergeError::TypeMismatch {
                path: path.to_string(),
                existing: left.type_name(),
                incoming: right.type_name(),
            })
        }
        (_, right) => Ok(right.clone()),
    }
}

/// Merges every entry of `right` into `left`; new keys keep `right` order.
pub fn merge_maps(
    mut left: OptionMap,
    right: &OptionMap,
    path: &str,
) -> MergeResult<OptionMap> {
    for (key, incoming) in right {
        let key_path = child_path(path, key);
        let merged = match left.get_mut(key) {
            Some(existing) => merge_values(std::mem::take(existing), incoming, &key_path)?,
            None => incoming.clone(),
        };
        left.insert(key.clone(), merged);
    }
    Ok(left)
}

/// Fills absent entries of `target` from `defaults`.
///
/// Present values are kept as-is; when both sides hold maps the fill recurses.
pub fn fill_value(target: OptionValue, defaults: &OptionValue) -> OptionValue {
    match (target, defaults) {
        (OptionValue::Map(mut target), OptionValue::Map(defaults)) => {
            fill_map(&mut target, defaults);
            OptionValue::Map(target)
        }
        (target, _) => target,
    }
}

/// In-place map variant of [`fill_value`].
pub fn fill_map(target: &mut OptionMap, defaults: &OptionMap) {
    for (key, default) in defaults {
        match target.get_mut(key) {
            Some(present) => {
                let value = std::mem::take(present);
                *present = fill_value(value, default);
            }
            None => {
                target.insert(key.clone(), default.clone());
            }
        }
    }
}

/// Writes `overrides` over `target`, recursing only where both hold maps.
pub fn overlay_value(target: OptionValue, overrides: &OptionValue) -> OptionValue {
    match (target, overrides) {
        (OptionValue::Map(mut target), OptionValue::Map(overrides)) => {
            overlay_map(&mut target, overrides);
            OptionValue::Map(target)
        }
        (_, overrides) => overrides.clone(),
    }
}

/// In-place map variant of [`overlay_value`].
pub fn overlay_map(target: &mut OptionMap, overrides: &OptionMap) {
    for (key, value) in overrides {
        let next = match target.get_mut(key) {
            Some(present) => overlay_value(std::mem::take(present), value),
            None => value.clone(),
        };
        target.insert(key.clone(), next);
    }
}

/// Re-applies the scalar leaves of `pinned` onto `target`.
///
/// Maps recurse when `target` still holds a map at the same key. Lists in
/// `pinned` leave `target` alone so contributions appended after them stay.
pub fn pin_value(target: OptionValue, pinned: &OptionValue) -> OptionValue {
    match (target, pinned) {
        (OptionValue::Map(mut target), OptionValue::Map(pinned)) => {
            pin_map(&mut target, pinned);
            OptionValue::Map(target)
        }
        (target, pinned) if pinned.is_container() => target,
        (_, pinned) => pinned.clone(),
    }
}

/// In-place map variant of [`pin_value`]; keys missing from `target` are restored.
pub fn pin_map(target: &mut OptionMap, pinned: &OptionMap) {
    for (key, value) in pinned {
        match target.get_mut(key) {
            Some(present) => {
                let current = std::mem::take(present);
                *present = pin_value(current, value);
            }
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
