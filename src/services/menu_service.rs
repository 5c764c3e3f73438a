use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    sort_by_display_order, Category, CategorySummary, Language, MenuEntry, MenuFilters, MenuItem,
    MenuKind, MenuResponse, MenuSection, ServiceResult,
};
use crate::repositories::{CategoryRepository, ItemRepository};

/// Read-only service behind the public menu pages
pub struct MenuService {
    categories: Arc<dyn CategoryRepository>,
    items: Arc<dyn ItemRepository>,
}

impl MenuService {
    pub fn new(categories: Arc<dyn CategoryRepository>, items: Arc<dyn ItemRepository>) -> Self {
        Self { categories, items }
    }

    #[instrument(skip(self), fields(kind = %kind, language = %language))]
    pub async fn menu(
        &self,
        kind: MenuKind,
        language: Language,
        filters: MenuFilters,
    ) -> ServiceResult<MenuResponse> {
        let (categories, items) = tokio::join!(
            self.categories.find_all(kind),
            self.items.find_all(kind)
        );

        let response = assemble_menu(kind, language, categories?, items?, &filters);
        crate::info_with_trace!(
            sections = response.sections.len(),
            total_items = response.total_items,
            "Menu assembled"
        );
        Ok(response)
    }

    /// Category bar of the public menu
    #[instrument(skip(self), fields(kind = %kind, language = %language))]
    pub async fn categories(
        &self,
        kind: MenuKind,
        language: Language,
    ) -> ServiceResult<Vec<CategorySummary>> {
        let mut categories = self.categories.find_all(kind).await?;
        sort_by_display_order(&mut categories);
        Ok(categories
            .iter()
            .map(|category| category.to_summary(language))
            .collect())
    }
}

fn category_matches(category: &Category, wanted: &str, language: Language) -> bool {
    let wanted = wanted.trim().to_lowercase();
    category.id.to_lowercase() == wanted
        || category.name_en.to_lowercase() == wanted
        || category.localized_name(language).to_lowercase() == wanted
}

/// Build the guest-facing menu: categories and items in display order,
/// hidden items left out, text in the requested language.
pub fn assemble_menu(
    kind: MenuKind,
    language: Language,
    mut categories: Vec<Category>,
    items: Vec<MenuItem>,
    filters: &MenuFilters,
) -> MenuResponse {
    sort_by_display_order(&mut categories);

    let category_filter = filters
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let search = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut by_category: HashMap<String, Vec<MenuItem>> = HashMap::new();
    for item in items {
        if !item.is_visible {
            continue;
        }
        if let Some(term) = search {
            if !item.matches_search(term, language) {
                continue;
            }
        }
        by_category
            .entry(item.category_id.clone())
            .or_default()
            .push(item);
    }

    let keep_empty = !filters.is_active();
    let mut total_items = 0;
    let sections: Vec<MenuSection> = categories
        .iter()
        .filter(|category| {
            category_filter.map_or(true, |wanted| category_matches(category, wanted, language))
        })
        .filter_map(|category| {
            let mut items = by_category.remove(&category.id).unwrap_or_default();
            if items.is_empty() && !keep_empty {
                return None;
            }
            sort_by_display_order(&mut items);
            total_items += items.len();
            Some(MenuSection {
                category: category.to_summary(language),
                items: items
                    .iter()
                    .map(|item| MenuEntry::from_item(item, language))
                    .collect(),
            })
        })
        .collect();

    MenuResponse {
        kind,
        language,
        sections,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateCategoryRequest, CreateItemRequest, ItemTags, PriceInput};
    use crate::services::mocks::{MockTestCategoryRepository, MockTestItemRepository};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn category(id: &str, name_en: &str, name_mr: &str, order: Option<i32>) -> Category {
        let mut category = Category::new(
            "R1",
            MenuKind::Food,
            CreateCategoryRequest {
                name_en: name_en.to_string(),
                name_mr: Some(name_mr.to_string()),
            },
            1,
        );
        category.id = id.to_string();
        category.display_order = order;
        category
    }

    fn item(id: &str, category_id: &str, name_en: &str, order: i32, amount: Decimal) -> MenuItem {
        let mut item = MenuItem::new(
            "R1",
            MenuKind::Food,
            CreateItemRequest {
                category_id: category_id.to_string(),
                name_en: name_en.to_string(),
                name_mr: None,
                description_en: None,
                description_mr: None,
                image_url: Some(format!("https://cdn.example.com/{}.jpg", id)),
                is_image_visible: None,
                tags: ItemTags::default(),
                prices: vec![PriceInput {
                    label_en: None,
                    label_mr: None,
                    amount,
                }],
            },
            order,
        );
        item.id = id.to_string();
        item
    }

    fn fixture() -> (Vec<Category>, Vec<MenuItem>) {
        let categories = vec![
            category("C2", "Main Course", "मुख्य जेवण", Some(2)),
            category("C1", "Starters", "स्टार्टर्स", Some(1)),
            category("C3", "Desserts", "गोड", None),
        ];
        let mut hidden = item("I4", "C1", "Hidden Kebab", 3, dec!(300));
        hidden.is_visible = false;
        let mut no_image = item("I5", "C2", "Bombil Fry", 1, dec!(260));
        no_image.is_image_visible = false;
        let items = vec![
            item("I2", "C1", "Chicken Lollipop", 2, dec!(220)),
            item("I1", "C1", "Paneer Tikka", 1, dec!(240)),
            hidden,
            no_image,
            item("I6", "C9", "Orphan", 1, dec!(10)),
        ];
        (categories, items)
    }

    #[test]
    fn test_menu_orders_sections_and_items() {
        let (categories, items) = fixture();
        let menu = assemble_menu(
            MenuKind::Food,
            Language::En,
            categories,
            items,
            &MenuFilters::default(),
        );

        let sections: Vec<&str> = menu.sections.iter().map(|s| s.category.id.as_str()).collect();
        assert_eq!(sections, vec!["C1", "C2", "C3"]);

        let starters: Vec<&str> = menu.sections[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(starters, vec!["I1", "I2"]);
        assert!(menu.sections[2].items.is_empty());
        assert_eq!(menu.total_items, 3);
    }

    #[test]
    fn test_menu_hides_image_when_flag_off() {
        let (categories, items) = fixture();
        let menu = assemble_menu(
            MenuKind::Food,
            Language::En,
            categories,
            items,
            &MenuFilters::default(),
        );

        let bombil = &menu.sections[1].items[0];
        assert_eq!(bombil.image_url, None);
        assert!(bombil.single_price);
        assert!(menu.sections[0].items[0].image_url.is_some());
    }

    #[test]
    fn test_search_filter_drops_empty_sections() {
        let (categories, items) = fixture();
        let menu = assemble_menu(
            MenuKind::Food,
            Language::En,
            categories,
            items,
            &MenuFilters {
                category: None,
                search: Some("LOLLI".to_string()),
            },
        );

        assert_eq!(menu.sections.len(), 1);
        assert_eq!(menu.sections[0].items[0].id, "I2");
        assert_eq!(menu.total_items, 1);
    }

    #[test]
    fn test_category_filter_by_localized_name() {
        let (categories, items) = fixture();
        let menu = assemble_menu(
            MenuKind::Food,
            Language::Mr,
            categories,
            items,
            &MenuFilters {
                category: Some("मुख्य जेवण".to_string()),
                search: None,
            },
        );

        assert_eq!(menu.sections.len(), 1);
        assert_eq!(menu.sections[0].category.name, "मुख्य जेवण");
        assert_eq!(menu.sections[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_menu_service_reads_both_repositories() {
        let (categories, items) = fixture();
        let mut category_repo = MockTestCategoryRepository::new();
        category_repo
            .expect_find_all()
            .times(1)
            .returning(move |_| Ok(categories.clone()));
        let mut item_repo = MockTestItemRepository::new();
        item_repo
            .expect_find_all()
            .times(1)
            .returning(move |_| Ok(items.clone()));

        let service = MenuService::new(Arc::new(category_repo), Arc::new(item_repo));
        let menu = service
            .menu(MenuKind::Food, Language::Mr, MenuFilters::default())
            .await
            .unwrap();

        assert_eq!(menu.language, Language::Mr);
        assert_eq!(menu.sections[0].category.name, "स्टार्टर्स");
    }

    #[tokio::test]
    async fn test_category_bar() {
        let (categories, _) = fixture();
        let mut category_repo = MockTestCategoryRepository::new();
        category_repo
            .expect_find_all()
            .returning(move |_| Ok(categories.clone()));

        let service = MenuService::new(
            Arc::new(category_repo),
            Arc::new(MockTestItemRepository::new()),
        );
        let bar = service
            .categories(MenuKind::Food, Language::En)
            .await
            .unwrap();

        let names: Vec<&str> = bar.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Starters", "Main Course", "Desserts"]);
    }
}
