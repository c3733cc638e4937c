//! The closed set of product categories.
//!
//! Tags are written upper-snake (`HOME_GARDEN`) and read case-insensitively.
//! Anything outside the set degrades to [`Category::LEGACY_DEFAULT`] through
//! [`Category::parse_or_default`] so that a forward-incompatible tag never
//! aborts a catalog load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A product classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Shoes,
    Clothing,
    Accessories,
    Electronics,
    HomeGarden,
    SportsOutdoors,
    BooksMedia,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 7] = [
        Category::Shoes,
        Category::Clothing,
        Category::Accessories,
        Category::Electronics,
        Category::HomeGarden,
        Category::SportsOutdoors,
        Category::BooksMedia,
    ];

    /// Category assigned to products written before tags existed.
    pub const LEGACY_DEFAULT: Category = Category::Shoes;

    /// The on-disk tag.
    #[must_use]
    pub const fn as_tag(&self) -> &'static str {
        match self {
            Category::Shoes => "SHOES",
            Category::Clothing => "CLOTHING",
            Category::Accessories => "ACCESSORIES",
            Category::Electronics => "ELECTRONICS",
            Category::HomeGarden => "HOME_GARDEN",
            Category::SportsOutdoors => "SPORTS_OUTDOORS",
            Category::BooksMedia => "BOOKS_MEDIA",
        }
    }

    /// Human-readable name for listings.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Category::Shoes => "Shoes",
            Category::Clothing => "Clothing",
            Category::Accessories => "Accessories",
            Category::Electronics => "Electronics",
            Category::HomeGarden => "Home & Garden",
            Category::SportsOutdoors => "Sports & Outdoors",
            Category::BooksMedia => "Books & Media",
        }
    }

    /// Strict, case-insensitive tag lookup. Surrounding whitespace is ignored.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Category> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_tag().eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive lookup by display name ("home & garden").
    #[must_use]
    pub fn from_display_name(name: &str) -> Option<Category> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.display_name().eq_ignore_ascii_case(name))
    }

    /// Tag lookup that never fails: unknown or blank tags become the legacy default.
    #[must_use]
    pub fn parse_or_default(tag: &str) -> Category {
        Self::from_tag(tag).unwrap_or(Self::LEGACY_DEFAULT)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::LEGACY_DEFAULT
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
            .or_else(|| Self::from_display_name(s))
            .ok_or_else(|| crate::Error::UnknownCategory(s.to_string()))
    }
}
