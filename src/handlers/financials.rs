use crate::helpers::params::parse_month;
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse, MonthQuery};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Json,
};
use common::{FinancialReport, MealAggregateStats};
use compute::{compute_member_financials, DbFinancialSource, FinancialDataSource};
use model::entities::household;
use sea_orm::EntityTrait;
use tracing::{debug, error, info, instrument, warn};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, error: String, code: &str) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
            success: false,
        }),
    )
}

async fn ensure_household_exists(state: &AppState, household_id: i32) -> Result<(), HandlerError> {
    match household::Entity::find_by_id(household_id).one(&state.db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("Household with ID {} not found", household_id);
            Err(error_response(
                StatusCode::NOT_FOUND,
                format!("Household {} not found", household_id),
                "HOUSEHOLD_NOT_FOUND",
            ))
        }
        Err(db_error) => {
            error!("Failed to lookup household {}: {}", household_id, db_error);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                db_error.to_string(),
                "DATABASE_ERROR",
            ))
        }
    }
}

/// Build (or fetch from cache) the reconciliation report for a household.
///
/// Holds the household's in-flight slot for the duration of the computation;
/// if another request already holds it the caller gets 429 and must retry,
/// the request is never queued. Other households are unaffected.
async fn household_report(
    state: &AppState,
    household_id: i32,
    month: Option<compute::MonthFilter>,
) -> Result<FinancialReport, HandlerError> {
    let cache_key = format!("financials_{}_{:?}", household_id, month);

    if let Some(CachedData::Financials(report)) = state.cache.get(&cache_key).await {
        debug!("Financial report for household {} served from cache", household_id);
        return Ok(report);
    }

    let Some(_guard) = state.financials_in_flight.try_begin(household_id) else {
        warn!(
            "Financial report for household {} skipped, another computation is in flight",
            household_id
        );
        return Err(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "A financial report is already being computed, retry shortly".to_string(),
            "REPORT_IN_PROGRESS",
        ));
    };

    let source = DbFinancialSource::new(state.db.clone());
    match compute_member_financials(&source, household_id, month).await {
        Ok(report) => {
            state
                .cache
                .insert(cache_key, CachedData::Financials(report.clone()))
                .await;
            Ok(report)
        }
        Err(compute_error) => {
            error!(
                "Failed to reconcile finances for household {}: {}",
                household_id, compute_error
            );
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                compute_error.to_string(),
                "RECONCILIATION_FAILED",
            ))
        }
    }
}

/// Get the member financial reconciliation report for a household
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/financials",
    tag = "financials",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
        ("month" = Option<String>, Query, description = "Calendar month restriction (YYYY-MM)"),
    ),
    responses(
        (status = 200, description = "Financial report computed successfully", body = ApiResponse<FinancialReport>),
        (status = 400, description = "Malformed month filter", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 429, description = "A report computation is already in flight", body = ErrorResponse),
        (status = 500, description = "Reconciliation failed", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_household_financials(
    Path(household_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FinancialReport>>, HandlerError> {
    let month = parse_month(query.month.as_deref())?;
    ensure_household_exists(&state, household_id).await?;

    let report = household_report(&state, household_id, month).await?;
    info!(
        "Financial report for household {} covers {} members",
        household_id,
        report.members.len()
    );

    Ok(Json(ApiResponse {
        data: report,
        message: "Financial report computed successfully".to_string(),
        success: true,
    }))
}

/// Export the reconciliation report as CSV
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/financials/export",
    tag = "financials",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
        ("month" = Option<String>, Query, description = "Calendar month restriction (YYYY-MM)"),
    ),
    responses(
        (status = 200, description = "CSV export of the financial report", content_type = "text/csv", body = String),
        (status = 400, description = "Malformed month filter", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 429, description = "A report computation is already in flight", body = ErrorResponse),
        (status = 500, description = "Reconciliation failed", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn export_household_financials(
    Path(household_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    State(state): State<AppState>,
) -> Result<([(header::HeaderName, String); 2], String), HandlerError> {
    let month = parse_month(query.month.as_deref())?;
    ensure_household_exists(&state, household_id).await?;

    let report = household_report(&state, household_id, month).await?;
    let filename = match &month {
        Some(filter) => format!("financials_{}_{}.csv", household_id, filter),
        None => format!("financials_{}.csv", household_id),
    };
    info!("Exporting financial report for household {} as {}", household_id, filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        report.to_csv(),
    ))
}

/// Get dashboard counters for a household
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/stats",
    tag = "financials",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
        ("month" = Option<String>, Query, description = "Calendar month restriction (YYYY-MM)"),
    ),
    responses(
        (status = 200, description = "Household stats retrieved successfully", body = ApiResponse<MealAggregateStats>),
        (status = 400, description = "Malformed month filter", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_household_stats(
    Path(household_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MealAggregateStats>>, HandlerError> {
    let month = parse_month(query.month.as_deref())?;
    ensure_household_exists(&state, household_id).await?;

    let cache_key = format!("stats_{}_{:?}", household_id, month);
    if let Some(CachedData::Stats(stats)) = state.cache.get(&cache_key).await {
        return Ok(Json(ApiResponse {
            data: stats,
            message: "Household stats retrieved from cache".to_string(),
            success: true,
        }));
    }

    let source = DbFinancialSource::new(state.db.clone());
    match source.meal_aggregate_stats(household_id, month).await {
        Ok(stats) => {
            state
                .cache
                .insert(cache_key, CachedData::Stats(stats.clone()))
                .await;
            Ok(Json(ApiResponse {
                data: stats,
                message: "Household stats retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(compute_error) => {
            error!(
                "Failed to compute stats for household {}: {}",
                household_id, compute_error
            );
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                compute_error.to_string(),
                "STATS_FAILED",
            ))
        }
    }
}
