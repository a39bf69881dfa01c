use common::{FinancialReport, FinancialSummary, MealAggregateStats, MemberFinancials};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::helpers::guard::InFlight;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
    /// Per-household re-entrancy slots preventing overlapping financial
    /// recomputation. A busy slot skips the request, it never queues it.
    pub financials_in_flight: Arc<InFlight>,
}

impl AppState {
    /// Drop cached financial reports and stats after a successful write so
    /// the next read recomputes. The 5-minute TTL remains the backstop.
    pub fn invalidate_report_caches(&self) {
        self.cache.invalidate_all();
    }
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Financials(FinancialReport),
    Stats(MealAggregateStats),
}

/// Query parameters for month-scoped endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct MonthQuery {
    /// Calendar month restriction (YYYY-MM); omit for all-time
    pub month: Option<String>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::households::create_household,
        crate::handlers::households::get_households,
        crate::handlers::households::get_household,
        crate::handlers::households::delete_household,
        crate::handlers::members::create_member,
        crate::handlers::members::get_members,
        crate::handlers::members::get_member,
        crate::handlers::members::update_member,
        crate::handlers::members::delete_member,
        crate::handlers::meals::create_meal_record,
        crate::handlers::meals::get_meal_records,
        crate::handlers::meals::update_meal_record,
        crate::handlers::meals::delete_meal_record,
        crate::handlers::deposits::create_deposit,
        crate::handlers::deposits::get_deposits,
        crate::handlers::deposits::update_deposit,
        crate::handlers::deposits::delete_deposit,
        crate::handlers::bazar::create_bazar_expense,
        crate::handlers::bazar::get_bazar_expenses,
        crate::handlers::bazar::update_bazar_expense,
        crate::handlers::bazar::delete_bazar_expense,
        crate::handlers::financials::get_household_financials,
        crate::handlers::financials::export_household_financials,
        crate::handlers::financials::get_household_stats,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            MonthQuery,
            ApiResponse<FinancialReport>,
            ApiResponse<MealAggregateStats>,
            FinancialReport,
            FinancialSummary,
            MemberFinancials,
            MealAggregateStats,
            common::BalanceStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "households", description = "Household CRUD endpoints"),
        (name = "members", description = "Member CRUD endpoints"),
        (name = "meals", description = "Meal record CRUD endpoints"),
        (name = "deposits", description = "Deposit CRUD endpoints"),
        (name = "bazar", description = "Bazar expense CRUD endpoints"),
        (name = "financials", description = "Financial reconciliation endpoints"),
    ),
    info(
        title = "MealMate API",
        description = "Shared-household meal and expense tracker - members record grocery purchases, deposits, and daily meals; the system derives a per-meal cost rate and per-member balances",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
