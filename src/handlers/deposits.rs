use crate::helpers::params::parse_month;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, MonthQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{deposit, member};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for recording a deposit into the shared fund
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateDepositRequest {
    pub date: NaiveDate,
    /// Amount paid into the shared fund
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Request body for correcting a deposit
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateDepositRequest {
    pub date: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

/// Deposit response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepositResponse {
    pub id: i32,
    pub member_id: i32,
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub description: Option<String>,
}

impl From<deposit::Model> for DepositResponse {
    fn from(model: deposit::Model) -> Self {
        Self {
            id: model.id,
            member_id: model.member_id,
            date: model.date,
            amount: model.amount,
            description: model.description,
        }
    }
}

/// Record a deposit made by a member
#[utoipa::path(
    post,
    path = "/api/v1/members/{member_id}/deposits",
    tag = "deposits",
    params(
        ("member_id" = i32, Path, description = "Member ID"),
    ),
    request_body = CreateDepositRequest,
    responses(
        (status = 201, description = "Deposit created successfully", body = ApiResponse<DepositResponse>),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_deposit(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateDepositRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DepositResponse>>), StatusCode> {
    debug!(
        "Recording deposit of {} for member {} on {}",
        request.amount, member_id, request.date
    );

    // The member must exist
    match member::Entity::find_by_id(member_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Member with ID {} not found", member_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup member {}: {}", member_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let new_deposit = deposit::ActiveModel {
        member_id: Set(member_id),
        date: Set(request.date),
        amount: Set(request.amount),
        description: Set(request.description),
        ..Default::default()
    };

    match new_deposit.insert(&state.db).await {
        Ok(model) => {
            info!("Deposit created successfully with ID: {}", model.id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: DepositResponse::from(model),
                message: "Deposit created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create deposit for member {}: {}",
                member_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all deposits of a household, optionally restricted to one month
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/deposits",
    tag = "deposits",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
        ("month" = Option<String>, Query, description = "Calendar month restriction (YYYY-MM)"),
    ),
    responses(
        (status = 200, description = "Deposits retrieved successfully", body = ApiResponse<Vec<DepositResponse>>),
        (status = 400, description = "Malformed month filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_deposits(
    Path(household_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DepositResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let month = parse_month(query.month.as_deref())?;

    let mut select = deposit::Entity::find()
        .join(JoinType::InnerJoin, deposit::Relation::Member.def())
        .filter(member::Column::HouseholdId.eq(household_id));
    if let Some(filter) = &month {
        select =
            select.filter(deposit::Column::Date.between(filter.first_day(), filter.last_day()));
    }

    match select.all(&state.db).await {
        Ok(deposits) => {
            debug!(
                "Retrieved {} deposits for household {} (month: {:?})",
                deposits.len(),
                household_id,
                month
            );
            let response = ApiResponse {
                data: deposits.into_iter().map(DepositResponse::from).collect(),
                message: "Deposits retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to retrieve deposits for household {}: {}",
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

/// Correct a deposit
#[utoipa::path(
    put,
    path = "/api/v1/deposits/{deposit_id}",
    tag = "deposits",
    params(
        ("deposit_id" = i32, Path, description = "Deposit ID"),
    ),
    request_body = UpdateDepositRequest,
    responses(
        (status = 200, description = "Deposit updated successfully", body = ApiResponse<DepositResponse>),
        (status = 404, description = "Deposit not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_deposit(
    Path(deposit_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateDepositRequest>,
) -> Result<Json<ApiResponse<DepositResponse>>, StatusCode> {
    let existing = match deposit::Entity::find_by_id(deposit_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("Deposit with ID {} not found for update", deposit_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup deposit {}: {}", deposit_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut active: deposit::ActiveModel = existing.into();
    if let Some(date) = request.date {
        active.date = Set(date);
    }
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Deposit with ID {} updated successfully", deposit_id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: DepositResponse::from(updated),
                message: "Deposit updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update deposit {}: {}", deposit_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a deposit
#[utoipa::path(
    delete,
    path = "/api/v1/deposits/{deposit_id}",
    tag = "deposits",
    params(
        ("deposit_id" = i32, Path, description = "Deposit ID"),
    ),
    responses(
        (status = 200, description = "Deposit deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Deposit not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_deposit(
    Path(deposit_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    match deposit::Entity::delete_by_id(deposit_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Deposit with ID {} deleted successfully", deposit_id);
                state.invalidate_report_caches();
                let response = ApiResponse {
                    data: format!("Deposit {} deleted", deposit_id),
                    message: "Deposit deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Deposit with ID {} not found for deletion", deposit_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete deposit {}: {}", deposit_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
