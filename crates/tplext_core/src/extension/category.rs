//! Category table: the fixed configuration facets an extension can fill.

use crate::config::configuration::Contribution;
use crate::extension::contract::Extension;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage shape of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryShape {
    /// Named entries; later contributors override same-key scalars.
    Keyed,
    /// Ordered entries; later contributors append.
    Sequence,
}

impl CategoryShape {
    /// Option value type name matching this shape.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Keyed => "map",
            Self::Sequence => "list",
        }
    }
}

/// Recognized configuration category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Includes,
    Scanners,
    TokenHandlers,
    NodeCompilers,
    Formats,
    Patterns,
    Filters,
    Keywords,
    ElementHandlers,
    PhpTokenHandlers,
    AssignmentHandlers,
}

impl Category {
    /// Every category, in extraction order.
    pub const ALL: [Category; 11] = [
        Self::Includes,
        Self::Scanners,
        Self::TokenHandlers,
        Self::NodeCompilers,
        Self::Formats,
        Self::Patterns,
        Self::Filters,
        Self::Keywords,
        Self::ElementHandlers,
        Self::PhpTokenHandlers,
        Self::AssignmentHandlers,
    ];

    /// Stable configuration key for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Includes => CATEGORY_INCLUDES,
            Self::Scanners => CATEGORY_SCANNERS,
            Self::TokenHandlers => CATEGORY_TOKEN_HANDLERS,
            Self::NodeCompilers => CATEGORY_NODE_COMPILERS,
            Self::Formats => CATEGORY_FORMATS,
            Self::Patterns => CATEGORY_PATTERNS,
            Self::Filters => CATEGORY_FILTERS,
            Self::Keywords => CATEGORY_KEYWORDS,
            Self::ElementHandlers => CATEGORY_ELEMENT_HANDLERS,
            Self::PhpTokenHandlers => CATEGORY_PHP_TOKEN_HANDLERS,
            Self::AssignmentHandlers => CATEGORY_ASSIGNMENT_HANDLERS,
        }
    }

    pub fn shape(self) -> CategoryShape {
        match self {
            Self::Includes | Self::ElementHandlers | Self::AssignmentHandlers => {
                CategoryShape::Sequence
            }
            Self::Scanners
            | Self::TokenHandlers
            | Self::NodeCompilers
            | Self::Formats
            | Self::Patterns
            | Self::Filters
            | Self::Keywords
            | Self::PhpTokenHandlers => CategoryShape::Keyed,
        }
    }

    /// Pulls this category's fragment out of `extension`.
    pub fn extract(self, extension: &dyn Extension) -> Contribution {
        match self {
            Self::Includes => Contribution::Sequence(extension.includes()),
            Self::Scanners => Contribution::Keyed(extension.scanners()),
            Self::TokenHandlers => Contribution::Keyed(extension.token_handlers()),
            Self::NodeCompilers => Contribution::Keyed(extension.node_compilers()),
            Self::Formats => Contribution::Keyed(extension.formats()),
            Self::Patterns => Contribution::Keyed(extension.patterns()),
            Self::Filters => Contribution::Keyed(extension.filters()),
            Self::Keywords => Contribution::Keyed(extension.keywords()),
            Self::ElementHandlers => Contribution::Sequence(extension.element_handlers()),
            Self::PhpTokenHandlers => Contribution::Keyed(extension.php_token_handlers()),
            Self::AssignmentHandlers => Contribution::Sequence(extension.assignment_handlers()),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CATEGORY_INCLUDES: &str = "includes";
pub const CATEGORY_SCANNERS: &str = "scanners";
pub const CATEGORY_TOKEN_HANDLERS: &str = "token_handlers";
pub const CATEGORY_NODE_COMPILERS: &str = "node_compilers";
pub const CATEGORY_FORMATS: &str = "formats";
pub const CATEGORY_PATTERNS: &str = "patterns";
pub const CATEGORY_FILTERS: &str = "filters";
pub const CATEGORY_KEYWORDS: &str = "keywords";
pub const CATEGORY_ELEMENT_HANDLERS: &str = "element_handlers";
pub const CATEGORY_PHP_TOKEN_HANDLERS: &str = "php_token_handlers";
pub const CATEGORY_ASSIGNMENT_HANDLERS: &str = "assignment_handlers";

/// Parses one category from its configuration key.
pub fn parse_category(value: &str) -> Result<Category, CategoryError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CategoryError::EmptyCategory);
    }

    Category::ALL
        .into_iter()
        .find(|category| category.as_str() == normalized)
        .ok_or_else(|| CategoryError::UnsupportedCategory(normalized.to_string()))
}

/// Category parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    EmptyCategory,
    UnsupportedCategory(String),
}

impl Display for CategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCategory => write!(f, "category name must not be empty"),
            Self::UnsupportedCategory(value) => write!(f, "category is unsupported: {value}"),
        }
    }
}

impl Error for CategoryError {}
