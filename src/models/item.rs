use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::{generate_id, non_blank};
use super::{Language, MenuKind, Ordered};

/// A dish on the food menu or a drink on the alcohol menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub kind: MenuKind,
    pub category_id: String,
    pub name_en: String,
    pub name_mr: Option<String>,
    pub description_en: Option<String>,
    pub description_mr: Option<String>,
    pub image_url: Option<String>,
    pub is_visible: bool,
    pub is_image_visible: bool,
    pub tags: ItemTags,
    pub display_order: Option<i32>,
    pub prices: Vec<Price>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dietary and promotional markers shown next to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTags {
    pub is_veg: bool,
    pub is_chef_special: bool,
    pub is_house_special: bool,
    pub is_bestseller: bool,
}

impl Default for ItemTags {
    fn default() -> Self {
        Self {
            is_veg: true,
            is_chef_special: false,
            is_house_special: false,
            is_bestseller: false,
        }
    }
}

impl ItemTags {
    /// Drinks only carry the bestseller marker
    pub fn for_kind(self, kind: MenuKind) -> Self {
        if kind.supports_dish_tags() {
            self
        } else {
            Self {
                is_veg: false,
                is_chef_special: false,
                is_house_special: false,
                is_bestseller: self.is_bestseller,
            }
        }
    }
}

/// One priced variant of an item, e.g. "Half" and "Full"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub item_id: String,
    pub label_en: Option<String>,
    pub label_mr: Option<String>,
    pub amount: Decimal,
}

/// Price row as submitted by the admin form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInput {
    #[serde(default)]
    pub label_en: Option<String>,
    #[serde(default)]
    pub label_mr: Option<String>,
    pub amount: Decimal,
}

impl PriceInput {
    /// Rows with a zero or negative amount are placeholders and never stored
    pub fn is_persistable(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// Request model for creating a menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub category_id: String,
    pub name_en: String,
    #[serde(default)]
    pub name_mr: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_mr: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_image_visible: Option<bool>,
    #[serde(default)]
    pub tags: ItemTags,
    #[serde(default)]
    pub prices: Vec<PriceInput>,
}

/// Request model for saving the admin edit form; replaces every editable field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub category_id: String,
    pub name_en: String,
    #[serde(default)]
    pub name_mr: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_mr: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_visible: Option<bool>,
    #[serde(default)]
    pub is_image_visible: Option<bool>,
    #[serde(default)]
    pub tags: ItemTags,
    #[serde(default)]
    pub prices: Vec<PriceInput>,
}

/// Keep only storable price rows, with blank labels normalized away
pub fn normalize_prices(item_id: &str, inputs: &[PriceInput]) -> Vec<Price> {
    inputs
        .iter()
        .filter(|input| input.is_persistable())
        .map(|input| Price {
            id: generate_id('P'),
            item_id: item_id.to_string(),
            label_en: non_blank(input.label_en.clone()),
            label_mr: non_blank(input.label_mr.clone()),
            amount: input.amount,
        })
        .collect()
}

impl Price {
    pub fn localized_label(&self, language: Language) -> Option<&str> {
        match language {
            Language::Mr => self.label_mr.as_deref().or(self.label_en.as_deref()),
            Language::En => self.label_en.as_deref(),
        }
    }
}

impl MenuItem {
    /// Create a visible item placed at `display_order` within its category
    pub fn new(
        restaurant_id: &str,
        kind: MenuKind,
        request: CreateItemRequest,
        display_order: i32,
    ) -> Self {
        let now = Utc::now();
        let id = generate_id('I');
        let prices = normalize_prices(&id, &request.prices);
        Self {
            id,
            restaurant_id: restaurant_id.to_string(),
            kind,
            category_id: request.category_id,
            name_en: request.name_en.trim().to_string(),
            name_mr: non_blank(request.name_mr),
            description_en: non_blank(request.description_en),
            description_mr: non_blank(request.description_mr),
            image_url: non_blank(request.image_url),
            is_visible: true,
            is_image_visible: request.is_image_visible.unwrap_or(true),
            tags: request.tags.for_kind(kind),
            display_order: Some(display_order),
            prices,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the edit form. Prices are rebuilt from scratch.
    pub fn apply_update(&mut self, request: UpdateItemRequest) {
        self.category_id = request.category_id;
        self.name_en = request.name_en.trim().to_string();
        self.name_mr = non_blank(request.name_mr);
        self.description_en = non_blank(request.description_en);
        self.description_mr = non_blank(request.description_mr);
        self.image_url = non_blank(request.image_url);
        if let Some(is_visible) = request.is_visible {
            self.is_visible = is_visible;
        }
        if let Some(is_image_visible) = request.is_image_visible {
            self.is_image_visible = is_image_visible;
        }
        self.tags = request.tags.for_kind(self.kind);
        self.prices = normalize_prices(&self.id, &request.prices);
        self.updated_at = Utc::now();
    }

    pub fn localized_name(&self, language: Language) -> &str {
        match (language, &self.name_mr) {
            (Language::Mr, Some(name_mr)) => name_mr,
            _ => &self.name_en,
        }
    }

    pub fn localized_description(&self, language: Language) -> Option<&str> {
        match language {
            Language::Mr => self
                .description_mr
                .as_deref()
                .or(self.description_en.as_deref()),
            Language::En => self.description_en.as_deref(),
        }
    }

    /// Image to show publicly, if any
    pub fn public_image(&self) -> Option<&str> {
        if self.is_image_visible {
            self.image_url.as_deref()
        } else {
            None
        }
    }

    /// Case-insensitive substring match on the localized name
    pub fn matches_search(&self, term: &str, language: Language) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.localized_name(language).to_lowercase().contains(&term)
    }
}

impl Ordered for MenuItem {
    fn order_id(&self) -> &str {
        &self.id
    }

    fn display_order(&self) -> Option<i32> {
        self.display_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_item_request() -> CreateItemRequest {
        CreateItemRequest {
            category_id: "C1".to_string(),
            name_en: "Paneer Tikka".to_string(),
            name_mr: Some("पनीर टिक्का".to_string()),
            description_en: Some("Char-grilled cottage cheese".to_string()),
            description_mr: Some("".to_string()),
            image_url: None,
            is_image_visible: None,
            tags: ItemTags::default(),
            prices: vec![
                PriceInput {
                    label_en: Some("Half".to_string()),
                    label_mr: Some("हाफ".to_string()),
                    amount: dec!(180),
                },
                PriceInput {
                    label_en: Some("Full".to_string()),
                    label_mr: Some("पूर्ण".to_string()),
                    amount: dec!(0),
                },
            ],
        }
    }

    #[test]
    fn test_item_creation_defaults() {
        let item = MenuItem::new("R1", MenuKind::Food, create_test_item_request(), 3);

        assert!(item.id.starts_with('I'));
        assert!(item.is_visible);
        assert!(item.is_image_visible);
        assert!(item.tags.is_veg);
        assert_eq!(item.display_order, Some(3));
        assert_eq!(item.description_mr, None);
        assert_eq!(item.prices.len(), 1);
        assert_eq!(item.prices[0].item_id, item.id);
        assert_eq!(item.prices[0].amount, dec!(180));
    }

    #[test]
    fn test_alcohol_item_strips_dish_tags() {
        let mut request = create_test_item_request();
        request.tags = ItemTags {
            is_veg: true,
            is_chef_special: true,
            is_house_special: true,
            is_bestseller: true,
        };
        let item = MenuItem::new("R1", MenuKind::Alcohol, request, 1);

        assert_eq!(
            item.tags,
            ItemTags {
                is_veg: false,
                is_chef_special: false,
                is_house_special: false,
                is_bestseller: true,
            }
        );
    }

    #[test]
    fn test_apply_update_replaces_prices() {
        let mut item = MenuItem::new("R1", MenuKind::Food, create_test_item_request(), 1);
        let original_updated_at = item.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(1));

        item.apply_update(UpdateItemRequest {
            category_id: "C2".to_string(),
            name_en: "Paneer Tikka Masala".to_string(),
            name_mr: None,
            description_en: None,
            description_mr: None,
            image_url: Some("https://cdn.example.com/p.jpg".to_string()),
            is_visible: Some(false),
            is_image_visible: None,
            tags: ItemTags::default(),
            prices: vec![PriceInput {
                label_en: Some("  ".to_string()),
                label_mr: None,
                amount: dec!(250.50),
            }],
        });

        assert_eq!(item.category_id, "C2");
        assert!(!item.is_visible);
        assert!(item.is_image_visible);
        assert_eq!(item.prices.len(), 1);
        assert_eq!(item.prices[0].label_en, None);
        assert!(item.updated_at > original_updated_at);
    }

    #[test]
    fn test_public_image_respects_flag() {
        let mut item = MenuItem::new("R1", MenuKind::Food, create_test_item_request(), 1);
        item.image_url = Some("https://cdn.example.com/p.jpg".to_string());
        assert!(item.public_image().is_some());

        item.is_image_visible = false;
        assert!(item.public_image().is_none());
    }

    #[test]
    fn test_localization_and_search() {
        let item = MenuItem::new("R1", MenuKind::Food, create_test_item_request(), 1);

        assert_eq!(item.localized_name(Language::Mr), "पनीर टिक्का");
        assert_eq!(
            item.localized_description(Language::Mr),
            Some("Char-grilled cottage cheese")
        );
        assert!(item.matches_search("TIKKA", Language::En));
        assert!(item.matches_search("पनीर", Language::Mr));
        assert!(!item.matches_search("chicken", Language::En));
        assert!(item.matches_search("  ", Language::En));
    }

    #[test]
    fn test_price_label_fallback() {
        let price = Price {
            id: "P1".to_string(),
            item_id: "I1".to_string(),
            label_en: Some("Peg".to_string()),
            label_mr: None,
            amount: dec!(120),
        };
        assert_eq!(price.localized_label(Language::Mr), Some("Peg"));
    }

    #[test]
    fn test_serde_serialization() {
        let item = MenuItem::new("R1", MenuKind::Food, create_test_item_request(), 1);

        let json = serde_json::to_string(&item).unwrap();
        let deserialized: MenuItem = serde_json::from_str(&json).unwrap();

        assert_eq!(item, deserialized);
    }
}
