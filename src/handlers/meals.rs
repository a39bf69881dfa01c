use crate::helpers::params::parse_month;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, MonthQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{meal_record, member};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for recording a day's meals
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateMealRecordRequest {
    /// Day the meals were taken
    pub date: NaiveDate,
    pub breakfast: i32,
    pub lunch: i32,
    pub dinner: i32,
    pub notes: Option<String>,
}

/// Request body for correcting a meal record
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateMealRecordRequest {
    pub date: Option<NaiveDate>,
    pub breakfast: Option<i32>,
    pub lunch: Option<i32>,
    pub dinner: Option<i32>,
    pub notes: Option<String>,
}

/// Meal record response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MealRecordResponse {
    pub id: i32,
    pub member_id: i32,
    pub date: NaiveDate,
    pub breakfast: i32,
    pub lunch: i32,
    pub dinner: i32,
    /// Sum of the three slots
    pub total_count: i64,
    pub notes: Option<String>,
}

impl From<meal_record::Model> for MealRecordResponse {
    fn from(model: meal_record::Model) -> Self {
        let total_count = model.total_count();
        Self {
            id: model.id,
            member_id: model.member_id,
            date: model.date,
            breakfast: model.breakfast,
            lunch: model.lunch,
            dinner: model.dinner,
            total_count,
            notes: model.notes,
        }
    }
}

/// Record meals for a member on a given day
#[utoipa::path(
    post,
    path = "/api/v1/members/{member_id}/meals",
    tag = "meals",
    params(
        ("member_id" = i32, Path, description = "Member ID"),
    ),
    request_body = CreateMealRecordRequest,
    responses(
        (status = 201, description = "Meal record created successfully", body = ApiResponse<MealRecordResponse>),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_meal_record(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateMealRecordRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MealRecordResponse>>), StatusCode> {
    debug!("Recording meals for member {} on {}", member_id, request.date);

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

    let new_record = meal_record::ActiveModel {
        member_id: Set(member_id),
        date: Set(request.date),
        breakfast: Set(request.breakfast),
        lunch: Set(request.lunch),
        dinner: Set(request.dinner),
        notes: Set(request.notes),
        ..Default::default()
    };

    match new_record.insert(&state.db).await {
        Ok(model) => {
            info!("Meal record created successfully with ID: {}", model.id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: MealRecordResponse::from(model),
                message: "Meal record created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create meal record for member {}: {}",
                member_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all meal records of a household, optionally restricted to one month
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/meals",
    tag = "meals",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
        ("month" = Option<String>, Query, description = "Calendar month restriction (YYYY-MM)"),
    ),
    responses(
        (status = 200, description = "Meal records retrieved successfully", body = ApiResponse<Vec<MealRecordResponse>>),
        (status = 400, description = "Malformed month filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_meal_records(
    Path(household_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MealRecordResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let month = parse_month(query.month.as_deref())?;

    let mut select = meal_record::Entity::find()
        .join(JoinType::InnerJoin, meal_record::Relation::Member.def())
        .filter(member::Column::HouseholdId.eq(household_id));
    if let Some(filter) = &month {
        select = select.filter(
            meal_record::Column::Date.between(filter.first_day(), filter.last_day()),
        );
    }

    match select.all(&state.db).await {
        Ok(records) => {
            debug!(
                "Retrieved {} meal records for household {} (month: {:?})",
                records.len(),
                household_id,
                month
            );
            let response = ApiResponse {
                data: records.into_iter().map(MealRecordResponse::from).collect(),
                message: "Meal records retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to retrieve meal records for household {}: {}",
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

/// Correct a meal record
#[utoipa::path(
    put,
    path = "/api/v1/meals/{meal_id}",
    tag = "meals",
    params(
        ("meal_id" = i32, Path, description = "Meal record ID"),
    ),
    request_body = UpdateMealRecordRequest,
    responses(
        (status = 200, description = "Meal record updated successfully", body = ApiResponse<MealRecordResponse>),
        (status = 404, description = "Meal record not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_meal_record(
    Path(meal_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateMealRecordRequest>,
) -> Result<Json<ApiResponse<MealRecordResponse>>, StatusCode> {
    let existing = match meal_record::Entity::find_by_id(meal_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("Meal record with ID {} not found for update", meal_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup meal record {}: {}", meal_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut active: meal_record::ActiveModel = existing.into();
    if let Some(date) = request.date {
        active.date = Set(date);
    }
    if let Some(breakfast) = request.breakfast {
        active.breakfast = Set(breakfast);
    }
    if let Some(lunch) = request.lunch {
        active.lunch = Set(lunch);
    }
    if let Some(dinner) = request.dinner {
        active.dinner = Set(dinner);
    }
    if let Some(notes) = request.notes {
        active.notes = Set(Some(notes));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Meal record with ID {} updated successfully", meal_id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: MealRecordResponse::from(updated),
                message: "Meal record updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update meal record {}: {}", meal_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a meal record
#[utoipa::path(
    delete,
    path = "/api/v1/meals/{meal_id}",
    tag = "meals",
    params(
        ("meal_id" = i32, Path, description = "Meal record ID"),
    ),
    responses(
        (status = 200, description = "Meal record deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Meal record not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_meal_record(
    Path(meal_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    match meal_record::Entity::delete_by_id(meal_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Meal record with ID {} deleted successfully", meal_id);
                state.invalidate_report_caches();
                let response = ApiResponse {
                    data: format!("Meal record {} deleted", meal_id),
                    message: "Meal record deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Meal record with ID {} not found for deletion", meal_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete meal record {}: {}", meal_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
