use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::errors::{parse_kind, service_error_to_response, ApiError};
use super::AppState;
use crate::models::{CategorySummary, Language, MenuFilters, MenuResponse, ServiceError};

/// Query parameters of the public menu
#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    #[serde(alias = "language")]
    pub lang: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "q")]
    pub search: Option<String>,
}

impl MenuQuery {
    fn language(&self) -> Result<Language, ApiError> {
        match self.lang.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            None => Ok(Language::default()),
            Some(lang) => lang.parse::<Language>().map_err(|message| {
                service_error_to_response(ServiceError::ValidationError { message })
            }),
        }
    }

    fn filters(&self) -> MenuFilters {
        MenuFilters {
            category: self.category.clone(),
            search: self.search.clone(),
        }
    }
}

/// Public menu of one kind
#[instrument(name = "get_menu", skip(state), fields(
    kind = %kind,
    lang = query.lang.as_deref(),
    category = query.category.as_deref(),
    search = query.search.as_deref(),
))]
pub async fn get_menu(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let language = query.language()?;

    match state.menu_service.menu(kind, language, query.filters()).await {
        Ok(menu) => {
            info!(
                "Serving {} menu with {} sections",
                kind,
                menu.sections.len()
            );
            state.metrics.record_menu_served(
                &kind.to_string(),
                &language.to_string(),
                menu.total_items,
            );
            Ok(Json(menu))
        }
        Err(err) => {
            error!("Failed to assemble menu: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Category bar of the public menu
#[instrument(name = "get_menu_categories", skip(state), fields(kind = %kind))]
pub async fn get_menu_categories(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let language = query.language()?;

    state
        .menu_service
        .categories(kind, language)
        .await
        .map(Json)
        .map_err(|err| {
            error!("Failed to list menu categories: {}", err);
            service_error_to_response(err)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_menu_query_language() {
        let query = MenuQuery {
            lang: Some("MR".to_string()),
            ..Default::default()
        };
        assert_eq!(query.language().unwrap(), Language::Mr);

        let query = MenuQuery::default();
        assert_eq!(query.language().unwrap(), Language::En);

        let query = MenuQuery {
            lang: Some("fr".to_string()),
            ..Default::default()
        };
        let (status, _) = query.language().unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_menu_query_filters() {
        let query: MenuQuery =
            serde_json::from_str(r#"{"lang":"en","category":"C1","q":"paneer"}"#).unwrap();
        let filters = query.filters();
        assert_eq!(filters.category.as_deref(), Some("C1"));
        assert_eq!(filters.search.as_deref(), Some("paneer"));
        assert!(filters.is_active());
    }
}
