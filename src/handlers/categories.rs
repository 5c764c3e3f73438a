use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, instrument};

use super::errors::{parse_kind, service_error_to_response, ApiError};
use super::AppState;
use crate::models::{
    Category, CreateCategoryRequest, MoveRequest, ReorderOutcome, ReorderRequest,
    UpdateCategoryRequest,
};

/// 207 when some positions could not be written
pub(crate) fn reorder_status(outcome: &ReorderOutcome) -> StatusCode {
    if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    }
}

/// Categories of one menu in display order
#[instrument(name = "list_categories", skip(state), fields(kind = %kind))]
pub async fn list_categories(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let kind = parse_kind(&kind)?;

    match state.category_service.list(kind).await {
        Ok(categories) => Ok(Json(categories)),
        Err(err) => {
            error!("Failed to list categories: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "create_category", skip(state, request), fields(
    kind = %kind,
    name = %request.name_en,
))]
pub async fn create_category(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let kind = parse_kind(&kind)?;

    let category = state
        .business_tracing
        .trace_menu_operation(
            "create_category",
            &kind.to_string(),
            state.category_service.create(kind, request),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Created category {}", category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(name = "rename_category", skip(state, request), fields(kind = %kind, id = %id))]
pub async fn rename_category(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .business_tracing
        .trace_menu_operation(
            "rename_category",
            &kind.to_string(),
            state.category_service.rename(kind, &id, request),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Delete an empty category; 409 while items still reference it
#[instrument(name = "delete_category", skip(state), fields(kind = %kind, id = %id))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .business_tracing
        .trace_menu_operation(
            "delete_category",
            &kind.to_string(),
            state.category_service.delete(kind, &id),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Persist a complete category ordering
#[instrument(name = "reorder_categories", skip(state, request), fields(
    kind = %kind,
    count = request.ordered_ids.len(),
))]
pub async fn reorder_categories(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Result<(StatusCode, Json<ReorderOutcome>), ApiError> {
    let kind = parse_kind(&kind)?;

    let outcome = state
        .business_tracing
        .trace_menu_operation(
            "reorder_categories",
            &kind.to_string(),
            state.category_service.reorder(kind, &request.ordered_ids),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok((reorder_status(&outcome), Json(outcome)))
}

/// Move one category by index, as the drag-and-drop list does
#[instrument(name = "move_category", skip(state), fields(kind = %kind))]
pub async fn move_category(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<(StatusCode, Json<ReorderOutcome>), ApiError> {
    let kind = parse_kind(&kind)?;

    let outcome = state
        .business_tracing
        .trace_menu_operation(
            "move_category",
            &kind.to_string(),
            state
                .category_service
                .move_category(kind, request.from, request.to),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok((reorder_status(&outcome), Json(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderAssignment, ReorderFailure};

    #[test]
    fn test_reorder_status() {
        let mut outcome = ReorderOutcome {
            updated: vec![OrderAssignment {
                id: "C1".to_string(),
                display_order: 2,
            }],
            unchanged: 1,
            failed: vec![],
        };
        assert_eq!(reorder_status(&outcome), StatusCode::OK);

        outcome.failed.push(ReorderFailure {
            id: "C2".to_string(),
            error: "Rate limit exceeded".to_string(),
        });
        assert_eq!(reorder_status(&outcome), StatusCode::MULTI_STATUS);
    }
}
