use crate::handlers::{
    bazar::{create_bazar_expense, delete_bazar_expense, get_bazar_expenses, update_bazar_expense},
    deposits::{create_deposit, delete_deposit, get_deposits, update_deposit},
    financials::{export_household_financials, get_household_financials, get_household_stats},
    health::health_check,
    households::{create_household, delete_household, get_household, get_households},
    meals::{create_meal_record, delete_meal_record, get_meal_records, update_meal_record},
    members::{create_member, delete_member, get_member, get_members, update_member},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
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
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Household CRUD routes
        .route("/api/v1/households", post(create_household))
        .route("/api/v1/households", get(get_households))
        .route("/api/v1/households/:household_id", get(get_household))
        .route("/api/v1/households/:household_id", delete(delete_household))
        // Member CRUD routes
        .route("/api/v1/households/:household_id/members", post(create_member))
        .route("/api/v1/households/:household_id/members", get(get_members))
        .route("/api/v1/members/:member_id", get(get_member))
        .route("/api/v1/members/:member_id", put(update_member))
        .route("/api/v1/members/:member_id", delete(delete_member))
        // Meal record routes
        .route("/api/v1/members/:member_id/meals", post(create_meal_record))
        .route("/api/v1/households/:household_id/meals", get(get_meal_records))
        .route("/api/v1/meals/:meal_id", put(update_meal_record))
        .route("/api/v1/meals/:meal_id", delete(delete_meal_record))
        // Deposit routes
        .route("/api/v1/members/:member_id/deposits", post(create_deposit))
        .route("/api/v1/households/:household_id/deposits", get(get_deposits))
        .route("/api/v1/deposits/:deposit_id", put(update_deposit))
        .route("/api/v1/deposits/:deposit_id", delete(delete_deposit))
        // Bazar expense routes
        .route("/api/v1/households/:household_id/bazar", post(create_bazar_expense))
        .route("/api/v1/households/:household_id/bazar", get(get_bazar_expenses))
        .route("/api/v1/bazar/:expense_id", put(update_bazar_expense))
        .route("/api/v1/bazar/:expense_id", delete(delete_bazar_expense))
        // Financial reconciliation routes
        .route(
            "/api/v1/households/:household_id/financials",
            get(get_household_financials),
        )
        .route(
            "/api/v1/households/:household_id/financials/export",
            get(export_household_financials),
        )
        .route(
            "/api/v1/households/:household_id/stats",
            get(get_household_stats),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
