//! Read-only service category catalog.

use serde::{Deserialize, Serialize};

/// A named service category the user can request a quote for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_key: String,
    #[serde(default)]
    pub image_url: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon_key: String::new(),
            image_url: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon_key: impl Into<String>) -> Self {
        self.icon_key = icon_key.into();
        self
    }
}

/// Source of the category list.
pub trait CatalogProvider {
    fn list(&self) -> Vec<Category>;
}

/// In-memory catalog backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    categories: Vec<Category>,
}

impl StaticCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }
}

impl CatalogProvider for StaticCatalog {
    fn list(&self) -> Vec<Category> {
        self.categories.clone()
    }
}

/// Picks the category for a wizard session.
///
/// The hint is matched against ids first, then names, ignoring case and
/// surrounding whitespace. Without a match the first catalog entry is used.
pub fn resolve_category<C: CatalogProvider + ?Sized>(
    catalog: &C,
    hint: Option<&str>,
) -> Option<Category> {
    let categories = catalog.list();
    let normalized = hint
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    if let Some(needle) = normalized {
        let matched = categories
            .iter()
            .find(|category| category.id.to_lowercase() == needle)
            .or_else(|| {
                categories
                    .iter()
                    .find(|category| category.name.trim().to_lowercase() == needle)
            });
        if let Some(category) = matched {
            return Some(category.clone());
        }
        tracing::debug!(hint = %needle, "category hint unmatched; using default category");
    }

    categories.into_iter().next()
}
