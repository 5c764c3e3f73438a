use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Language, MenuKind, Ordered};

/// A named grouping of menu items, shared by the food and alcohol menus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub restaurant_id: String,
    pub kind: MenuKind,
    pub name_en: String,
    pub name_mr: Option<String>,
    pub display_order: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for creating a new category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name_en: String,
    #[serde(default)]
    pub name_mr: Option<String>,
}

/// Request model for renaming a category
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name_en: Option<String>,
    pub name_mr: Option<String>,
}

/// Category as listed by the public menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub display_order: Option<i32>,
}

/// Short prefixed identifier, e.g. `C1a2b3c4d`
pub(crate) fn generate_id(prefix: char) -> String {
    format!(
        "{}{}",
        prefix,
        Uuid::new_v4()
            .simple()
            .to_string()
            .get(0..8)
            .unwrap_or("00000000")
    )
}

/// Trim a text field and collapse blank values to `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Category {
    /// Create a category appended at `display_order`
    pub fn new(
        restaurant_id: &str,
        kind: MenuKind,
        request: CreateCategoryRequest,
        display_order: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id('C'),
            restaurant_id: restaurant_id.to_string(),
            kind,
            name_en: request.name_en.trim().to_string(),
            name_mr: if kind.requires_marathi_name() {
                non_blank(request.name_mr)
            } else {
                None
            },
            display_order: Some(display_order),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, request: UpdateCategoryRequest) {
        if let Some(name_en) = request.name_en {
            self.name_en = name_en.trim().to_string();
        }
        if self.kind.requires_marathi_name() {
            if let Some(name_mr) = non_blank(request.name_mr) {
                self.name_mr = Some(name_mr);
            }
        }
        self.updated_at = Utc::now();
    }

    /// Name in the requested language, falling back to English
    pub fn localized_name(&self, language: Language) -> &str {
        match (language, &self.name_mr) {
            (Language::Mr, Some(name_mr)) => name_mr,
            _ => &self.name_en,
        }
    }

    pub fn to_summary(&self, language: Language) -> CategorySummary {
        CategorySummary {
            id: self.id.clone(),
            name: self.localized_name(language).to_string(),
            display_order: self.display_order,
        }
    }
}

impl Ordered for Category {
    fn order_id(&self) -> &str {
        &self.id
    }

    fn display_order(&self) -> Option<i32> {
        self.display_order
    }
}
