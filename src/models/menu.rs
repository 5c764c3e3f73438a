use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CategorySummary, ItemTags, Language, MenuItem, MenuKind};

/// Filters accepted by the public menu
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuFilters {
    /// Category id or localized category name
    pub category: Option<String>,
    pub search: Option<String>,
}

impl MenuFilters {
    pub fn is_active(&self) -> bool {
        let set = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        set(&self.category) || set(&self.search)
    }
}

/// Public menu for one kind in one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuResponse {
    pub kind: MenuKind,
    pub language: Language,
    pub sections: Vec<MenuSection>,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSection {
    pub category: CategorySummary,
    pub items: Vec<MenuEntry>,
}

/// An item as shown to guests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: ItemTags,
    pub prices: Vec<MenuPrice>,
    pub single_price: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuPrice {
    pub label: Option<String>,
    pub amount: Decimal,
}

impl MenuEntry {
    pub fn from_item(item: &MenuItem, language: Language) -> Self {
        let prices: Vec<MenuPrice> = item
            .prices
            .iter()
            .filter(|price| price.amount > Decimal::ZERO)
            .map(|price| MenuPrice {
                label: price.localized_label(language).map(str::to_string),
                amount: price.amount,
            })
            .collect();
        let single_price = prices.len() == 1 && prices[0].label.is_none();

        Self {
            id: item.id.clone(),
            name: item.localized_name(language).to_string(),
            description: item.localized_description(language).map(str::to_string),
            image_url: item.public_image().map(str::to_string),
            tags: item.tags,
            prices,
            single_price,
        }
    }
}
