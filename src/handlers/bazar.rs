use crate::helpers::params::parse_month;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, MonthQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{bazar_expense, household};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for recording a bazar (grocery) expense
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateBazarExpenseRequest {
    /// Member who did the shopping, if known
    pub member_id: Option<i32>,
    pub date: NaiveDate,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub total_cost: Decimal,
}

/// Request body for correcting a bazar expense
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBazarExpenseRequest {
    pub member_id: Option<i32>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub total_cost: Option<Decimal>,
}

/// Bazar expense response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BazarExpenseResponse {
    pub id: i32,
    pub household_id: i32,
    pub member_id: Option<i32>,
    pub date: NaiveDate,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub total_cost: Decimal,
}

impl From<bazar_expense::Model> for BazarExpenseResponse {
    fn from(model: bazar_expense::Model) -> Self {
        Self {
            id: model.id,
            household_id: model.household_id,
            member_id: model.member_id,
            date: model.date,
            description: model.description,
            total_cost: model.total_cost,
        }
    }
}

/// Record a bazar expense for a household
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/bazar",
    tag = "bazar",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
    ),
    request_body = CreateBazarExpenseRequest,
    responses(
        (status = 201, description = "Bazar expense created successfully", body = ApiResponse<BazarExpenseResponse>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_bazar_expense(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateBazarExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BazarExpenseResponse>>), StatusCode> {
    debug!(
        "Recording bazar expense of {} for household {} on {}",
        request.total_cost, household_id, request.date
    );

    // The household must exist
    match household::Entity::find_by_id(household_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Household with ID {} not found", household_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup household {}: {}", household_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let new_expense = bazar_expense::ActiveModel {
        household_id: Set(household_id),
        member_id: Set(request.member_id),
        date: Set(request.date),
        description: Set(request.description),
        total_cost: Set(request.total_cost),
        ..Default::default()
    };

    match new_expense.insert(&state.db).await {
        Ok(model) => {
            info!("Bazar expense created successfully with ID: {}", model.id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: BazarExpenseResponse::from(model),
                message: "Bazar expense created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create bazar expense for household {}: {}",
                household_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all bazar expenses of a household, optionally restricted to one month
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/bazar",
    tag = "bazar",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
        ("month" = Option<String>, Query, description = "Calendar month restriction (YYYY-MM)"),
    ),
    responses(
        (status = 200, description = "Bazar expenses retrieved successfully", body = ApiResponse<Vec<BazarExpenseResponse>>),
        (status = 400, description = "Malformed month filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_bazar_expenses(
    Path(household_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BazarExpenseResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let month = parse_month(query.month.as_deref())?;

    let mut select = bazar_expense::Entity::find()
        .filter(bazar_expense::Column::HouseholdId.eq(household_id));
    if let Some(filter) = &month {
        select = select.filter(
            bazar_expense::Column::Date.between(filter.first_day(), filter.last_day()),
        );
    }

    match select.all(&state.db).await {
        Ok(expenses) => {
            debug!(
                "Retrieved {} bazar expenses for household {} (month: {:?})",
                expenses.len(),
                household_id,
                month
            );
            let response = ApiResponse {
                data: expenses
                    .into_iter()
                    .map(BazarExpenseResponse::from)
                    .collect(),
                message: "Bazar expenses retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to retrieve bazar expenses for household {}: {}",
                household_id, db_error
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: db_error.to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Correct a bazar expense
#[utoipa::path(
    put,
    path = "/api/v1/bazar/{expense_id}",
    tag = "bazar",
    params(
        ("expense_id" = i32, Path, description = "Bazar expense ID"),
    ),
    request_body = UpdateBazarExpenseRequest,
    responses(
        (status = 200, description = "Bazar expense updated successfully", body = ApiResponse<BazarExpenseResponse>),
        (status = 404, description = "Bazar expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_bazar_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBazarExpenseRequest>,
) -> Result<Json<ApiResponse<BazarExpenseResponse>>, StatusCode> {
    let existing = match bazar_expense::Entity::find_by_id(expense_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("Bazar expense with ID {} not found for update", expense_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup bazar expense {}: {}", expense_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut active: bazar_expense::ActiveModel = existing.into();
    if let Some(member_id) = request.member_id {
        active.member_id = Set(Some(member_id));
    }
    if let Some(date) = request.date {
        active.date = Set(date);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(total_cost) = request.total_cost {
        active.total_cost = Set(total_cost);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Bazar expense with ID {} updated successfully", expense_id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: BazarExpenseResponse::from(updated),
                message: "Bazar expense updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update bazar expense {}: {}", expense_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a bazar expense
#[utoipa::path(
    delete,
    path = "/api/v1/bazar/{expense_id}",
    tag = "bazar",
    params(
        ("expense_id" = i32, Path, description = "Bazar expense ID"),
    ),
    responses(
        (status = 200, description = "Bazar expense deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Bazar expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_bazar_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    match bazar_expense::Entity::delete_by_id(expense_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Bazar expense with ID {} deleted successfully", expense_id);
                state.invalidate_report_caches();
                let response = ApiResponse {
                    data: format!("Bazar expense {} deleted", expense_id),
                    message: "Bazar expense deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Bazar expense with ID {} not found for deletion", expense_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete bazar expense {}: {}", expense_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
