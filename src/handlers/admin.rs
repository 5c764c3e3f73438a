use axum::{extract::State, http::StatusCode, response::Json};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::errors::{error_body, service_error_to_response, ApiError};
use super::AppState;
use crate::models::{
    CreateCategoryRequest, CreateItemRequest, ItemTags, MenuKind, PriceInput,
};

/// Response for seeding operations
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub categories_created: usize,
    pub items_created: usize,
    pub skipped_kinds: Vec<MenuKind>,
    pub timestamp: String,
}

/// Response for table setup operations
#[derive(Debug, Serialize)]
pub struct SetupTablesResponse {
    pub message: String,
    pub tables_created: Vec<String>,
    pub timestamp: String,
}

/// Create the categories, items and prices tables
#[instrument(name = "setup_tables", skip(state), fields(
    categories_table = %state.tables.categories,
    items_table = %state.tables.items,
    prices_table = %state.tables.prices,
))]
pub async fn setup_tables(
    State(state): State<AppState>,
) -> Result<Json<SetupTablesResponse>, ApiError> {
    let Some(table_manager) = state.table_manager.as_ref() else {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "Unsupported",
            "Tables can only be created on the DynamoDB storage backend",
        ));
    };

    info!("Setting up DynamoDB tables");

    let tables = &state.tables;
    let result = state
        .database_tracing
        .trace_operation(
            "create_tables",
            &tables.categories,
            table_manager.create_all_tables(&tables.categories, &tables.items, &tables.prices),
        )
        .await;

    match result {
        Ok(()) => {
            let tables_created = vec![
                tables.categories.clone(),
                tables.items.clone(),
                tables.prices.clone(),
            ];
            info!("Successfully created tables: {:?}", tables_created);

            Ok(Json(SetupTablesResponse {
                message: format!("Successfully created {} tables", tables_created.len()),
                tables_created,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }))
        }
        Err(err) => {
            error!("Failed to create tables: {}", err);
            Err(error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create tables",
                err.to_string(),
            ))
        }
    }
}

/// Load a starter menu into every kind that has no categories yet
#[instrument(name = "seed_database", skip(state))]
pub async fn seed_database(State(state): State<AppState>) -> Result<Json<SeedResponse>, ApiError> {
    let mut categories_created = 0;
    let mut items_created = 0;
    let mut skipped_kinds = Vec::new();

    for kind in MenuKind::ALL {
        let existing = state
            .category_service
            .list(kind)
            .await
            .map_err(service_error_to_response)?;
        if !existing.is_empty() {
            warn!("Skipping {} seed, {} categories exist", kind, existing.len());
            skipped_kinds.push(kind);
            continue;
        }

        for (category_request, items) in sample_menu(kind) {
            let category = state
                .category_service
                .create(kind, category_request)
                .await
                .map_err(service_error_to_response)?;
            categories_created += 1;

            for mut item in items {
                item.category_id = category.id.clone();
                state
                    .item_service
                    .create(kind, item)
                    .await
                    .map_err(service_error_to_response)?;
                items_created += 1;
            }
        }
    }

    info!(
        "Seeded {} categories and {} items",
        categories_created, items_created
    );

    Ok(Json(SeedResponse {
        message: format!(
            "Seeded {} categories and {} items",
            categories_created, items_created
        ),
        categories_created,
        items_created,
        skipped_kinds,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

fn price(label_en: &str, label_mr: &str, amount: Decimal) -> PriceInput {
    PriceInput {
        label_en: Some(label_en.to_string()).filter(|l| !l.is_empty()),
        label_mr: Some(label_mr.to_string()).filter(|l| !l.is_empty()),
        amount,
    }
}

fn sample_item(
    name_en: &str,
    name_mr: &str,
    description_en: &str,
    tags: ItemTags,
    prices: Vec<PriceInput>,
) -> CreateItemRequest {
    CreateItemRequest {
        category_id: String::new(),
        name_en: name_en.to_string(),
        name_mr: Some(name_mr.to_string()),
        description_en: Some(description_en.to_string()),
        description_mr: None,
        image_url: None,
        is_image_visible: None,
        tags,
        prices,
    }
}

/// Starter categories with their items; `category_id` is filled in while seeding
fn sample_menu(kind: MenuKind) -> Vec<(CreateCategoryRequest, Vec<CreateItemRequest>)> {
    let category = |name_en: &str, name_mr: &str| CreateCategoryRequest {
        name_en: name_en.to_string(),
        name_mr: Some(name_mr.to_string()),
    };

    match kind {
        MenuKind::Food => vec![
            (
                category("Starters", "स्टार्टर्स"),
                vec![
                    sample_item(
                        "Paneer Tikka",
                        "पनीर टिक्का",
                        "Cottage cheese cubes grilled in the tandoor",
                        ItemTags {
                            is_veg: true,
                            is_chef_special: true,
                            ..ItemTags::default()
                        },
                        vec![price("", "", dec!(240))],
                    ),
                    sample_item(
                        "Chicken Lollipop",
                        "चिकन लॉलीपॉप",
                        "Spiced chicken wings, fried crisp",
                        ItemTags {
                            is_veg: false,
                            is_bestseller: true,
                            ..ItemTags::default()
                        },
                        vec![price("Half", "हाफ", dec!(180)), price("Full", "फुल", dec!(320))],
                    ),
                ],
            ),
            (
                category("Seafood", "सीफूड"),
                vec![sample_item(
                    "Surmai Thali",
                    "सुरमई थाळी",
                    "Kingfish fry with solkadhi, rice and bhakri",
                    ItemTags {
                        is_veg: false,
                        is_house_special: true,
                        ..ItemTags::default()
                    },
                    vec![price("", "", dec!(450))],
                )],
            ),
        ],
        MenuKind::Alcohol => vec![(
            CreateCategoryRequest {
                name_en: "Whisky".to_string(),
                name_mr: None,
            },
            vec![sample_item(
                "Black Dog",
                "ब्लॅक डॉग",
                "Blended Scotch whisky",
                ItemTags {
                    is_bestseller: true,
                    ..ItemTags::default()
                },
                vec![
                    price("30 ml", "३० मिली", dec!(190)),
                    price("60 ml", "६० मिली", dec!(360)),
                    price("Bottle", "बाटली", dec!(4200)),
                ],
            )],
        )],
    }
}
