use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    admin, auth, categories, cors_middleware, health_check, items, menu, metrics_handler,
    request_validation_middleware, require_admin, security_headers_middleware, upload, AppState,
};
use crate::observability::observability_middleware;

/// Public menu, admin API, health and metrics in one router
pub fn create_app(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    let metrics_for_middleware = state.metrics.clone();

    let public = Router::new()
        .route("/api/menu/:kind", get(menu::get_menu))
        .route("/api/menu/:kind/categories", get(menu::get_menu_categories))
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        .with_state(state.clone());

    let admin = Router::new()
        .route("/api/admin/setup-tables", post(admin::setup_tables))
        .route("/api/admin/seed", post(admin::seed_database))
        .route(
            "/api/admin/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/admin/:kind/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/admin/:kind/categories/order",
            put(categories::reorder_categories),
        )
        .route(
            "/api/admin/:kind/categories/move",
            post(categories::move_category),
        )
        .route(
            "/api/admin/:kind/categories/:id",
            put(categories::rename_category).delete(categories::delete_category),
        )
        .route(
            "/api/admin/:kind/categories/:id/items/order",
            put(items::reorder_items),
        )
        .route(
            "/api/admin/:kind/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/api/admin/:kind/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route(
            "/api/admin/:kind/items/:id/visibility",
            post(items::toggle_visibility),
        )
        .route(
            "/api/admin/:kind/items/:id/image-visibility",
            post(items::toggle_image_visibility),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state);

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(public)
        .merge(admin)
        // outermost last
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
