use crate::handlers::{
    accounts::{
        close_account, create_account, delete_account, get_account_transactions,
        get_household_accounts,
    },
    categories::{create_category, get_household_categories},
    generation::run_generation,
    health::health_check,
    households::{create_household, get_household},
    recurring_patterns::{
        create_recurring_pattern, deactivate_recurring_pattern, delete_recurring_pattern,
        get_household_recurring_patterns, get_recurring_pattern, get_recurring_pattern_logs,
        get_upcoming_occurrences, toggle_recurring_pattern, update_recurring_pattern,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Households and their accounts and categories
        .route("/api/v1/households", post(create_household))
        .route("/api/v1/households/:household_id", get(get_household))
        .route(
            "/api/v1/households/:household_id/accounts",
            post(create_account).get(get_household_accounts),
        )
        .route(
            "/api/v1/households/:household_id/categories",
            post(create_category).get(get_household_categories),
        )
        .route("/api/v1/accounts/:account_id", delete(delete_account))
        .route("/api/v1/accounts/:account_id/close", post(close_account))
        .route("/api/v1/accounts/:account_id/transactions", get(get_account_transactions))
        // Recurring patterns
        .route(
            "/api/v1/households/:household_id/recurring-patterns",
            post(create_recurring_pattern).get(get_household_recurring_patterns),
        )
        .route("/api/v1/recurring-patterns/generate", post(run_generation))
        .route(
            "/api/v1/recurring-patterns/:pattern_id",
            get(get_recurring_pattern)
                .put(update_recurring_pattern)
                .delete(delete_recurring_pattern),
        )
        .route("/api/v1/recurring-patterns/:pattern_id/toggle", post(toggle_recurring_pattern))
        .route(
            "/api/v1/recurring-patterns/:pattern_id/deactivate",
            post(deactivate_recurring_pattern),
        )
        .route("/api/v1/recurring-patterns/:pattern_id/logs", get(get_recurring_pattern_logs))
        .route("/api/v1/recurring-patterns/:pattern_id/upcoming", get(get_upcoming_occurrences))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
