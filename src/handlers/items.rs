use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::categories::reorder_status;
use super::errors::{parse_kind, service_error_to_response, ApiError};
use super::AppState;
use crate::models::{
    CreateItemRequest, MenuItem, ReorderOutcome, ReorderRequest, UpdateItemRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub category_id: Option<String>,
}

/// Admin item list, hidden items included
#[instrument(name = "list_items", skip(state), fields(
    kind = %kind,
    category_id = query.category_id.as_deref(),
))]
pub async fn list_items(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let result = match query.category_id.as_deref().filter(|c| !c.is_empty()) {
        Some(category_id) => state.item_service.list_in_category(kind, category_id).await,
        None => state.item_service.list_admin(kind).await,
    };

    result.map(Json).map_err(|err| {
        error!("Failed to list items: {}", err);
        service_error_to_response(err)
    })
}

#[instrument(name = "get_item", skip(state), fields(kind = %kind, id = %id))]
pub async fn get_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<MenuItem>, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .item_service
        .get(kind, &id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "create_item", skip(state, request), fields(
    kind = %kind,
    name = %request.name_en,
    category_id = %request.category_id,
    prices = request.prices.len(),
))]
pub async fn create_item(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    let kind = parse_kind(&kind)?;

    let item = state
        .business_tracing
        .trace_menu_operation(
            "create_item",
            &kind.to_string(),
            state.item_service.create(kind, request),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Created item {} with {} prices", item.id, item.prices.len());
    Ok((StatusCode::CREATED, Json(item)))
}

/// Save the edit form; the price list is replaced wholesale
#[instrument(name = "update_item", skip(state, request), fields(
    kind = %kind,
    id = %id,
    category_id = %request.category_id,
))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<MenuItem>, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .business_tracing
        .trace_menu_operation(
            "update_item",
            &kind.to_string(),
            state.item_service.update(kind, &id, request),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "delete_item", skip(state), fields(kind = %kind, id = %id))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .business_tracing
        .trace_menu_operation(
            "delete_item",
            &kind.to_string(),
            state.item_service.delete(kind, &id),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Deleted item {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "toggle_item_visibility", skip(state), fields(kind = %kind, id = %id))]
pub async fn toggle_visibility(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<MenuItem>, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .business_tracing
        .trace_menu_operation(
            "toggle_visibility",
            &kind.to_string(),
            state.item_service.toggle_visibility(kind, &id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "toggle_item_image_visibility", skip(state), fields(kind = %kind, id = %id))]
pub async fn toggle_image_visibility(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<MenuItem>, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .business_tracing
        .trace_menu_operation(
            "toggle_image_visibility",
            &kind.to_string(),
            state.item_service.toggle_image_visibility(kind, &id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Persist a complete item ordering inside one category
#[instrument(name = "reorder_items", skip(state, request), fields(
    kind = %kind,
    category_id = %category_id,
    count = request.ordered_ids.len(),
))]
pub async fn reorder_items(
    State(state): State<AppState>,
    Path((kind, category_id)): Path<(String, String)>,
    Json(request): Json<ReorderRequest>,
) -> Result<(StatusCode, Json<ReorderOutcome>), ApiError> {
    let kind = parse_kind(&kind)?;

    let outcome = state
        .business_tracing
        .trace_menu_operation(
            "reorder_items",
            &kind.to_string(),
            state
                .item_service
                .reorder_in_category(kind, &category_id, &request.ordered_ids),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok((reorder_status(&outcome), Json(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_list_query() {
        let query: ItemListQuery = serde_json::from_str(r#"{"category_id":"C1a2b3c4d"}"#).unwrap();
        assert_eq!(query.category_id.as_deref(), Some("C1a2b3c4d"));

        let query: ItemListQuery = serde_json::from_str("{}").unwrap();
        assert!(query.category_id.is_none());
    }
}
