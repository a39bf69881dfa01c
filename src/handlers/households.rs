use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::household;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for creating a new household
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateHouseholdRequest {
    /// Household name
    pub name: String,
}

/// Household response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HouseholdResponse {
    pub id: i32,
    pub name: String,
}

impl From<household::Model> for HouseholdResponse {
    fn from(model: household::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Create a new household
#[utoipa::path(
    post,
    path = "/api/v1/households",
    tag = "households",
    request_body = CreateHouseholdRequest,
    responses(
        (status = 201, description = "Household created successfully", body = ApiResponse<HouseholdResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_household(
    State(state): State<AppState>,
    Json(request): Json<CreateHouseholdRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HouseholdResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Creating household with name: {}", request.name);

    let new_household = household::ActiveModel {
        name: Set(request.name.clone()),
        ..Default::default()
    };

    match new_household.insert(&state.db).await {
        Ok(model) => {
            info!("Household created successfully with ID: {}", model.id);
            let response = ApiResponse {
                data: HouseholdResponse::from(model),
                message: "Household created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create household '{}': {}", request.name, db_error);
            let error_response = ErrorResponse {
                error: "Internal server error while creating household".to_string(),
                code: "DATABASE_ERROR".to_string(),
                success: false,
            };
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)))
        }
    }
}

/// Get all households
#[utoipa::path(
    get,
    path = "/api/v1/households",
    tag = "households",
    responses(
        (status = 200, description = "Households retrieved successfully", body = ApiResponse<Vec<HouseholdResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_households(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<HouseholdResponse>>>, StatusCode> {
    match household::Entity::find().all(&state.db).await {
        Ok(households) => {
            debug!("Retrieved {} households from database", households.len());
            let response = ApiResponse {
                data: households
                    .into_iter()
                    .map(HouseholdResponse::from)
                    .collect(),
                message: "Households retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve households: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific household by ID
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}",
    tag = "households",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
    ),
    responses(
        (status = 200, description = "Household retrieved successfully", body = ApiResponse<HouseholdResponse>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_household(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HouseholdResponse>>, StatusCode> {
    match household::Entity::find_by_id(household_id).one(&state.db).await {
        Ok(Some(model)) => {
            let response = ApiResponse {
                data: HouseholdResponse::from(model),
                message: "Household retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Household with ID {} not found", household_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!(
                "Failed to retrieve household with ID {}: {}",
                household_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a household
#[utoipa::path(
    delete,
    path = "/api/v1/households/{household_id}",
    tag = "households",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
    ),
    responses(
        (status = 200, description = "Household deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_household(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    match household::Entity::delete_by_id(household_id)
        .exec(&state.db)
        .await
    {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Household with ID {} deleted successfully", household_id);
                state.invalidate_report_caches();
                let response = ApiResponse {
                    data: format!("Household {} deleted", household_id),
                    message: "Household deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Household with ID {} not found for deletion", household_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!(
                "Failed to delete household with ID {}: {}",
                household_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
