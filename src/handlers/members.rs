use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{household, member};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

/// Request body for creating a new member
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateMemberRequest {
    /// Member display name
    pub name: String,
}

/// Request body for updating a member
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateMemberRequest {
    /// Member display name
    pub name: Option<String>,
}

/// Member response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub id: i32,
    pub household_id: i32,
    pub name: String,
}

impl From<member::Model> for MemberResponse {
    fn from(model: member::Model) -> Self {
        Self {
            id: model.id,
            household_id: model.household_id,
            name: model.name,
        }
    }
}

/// Create a new member in a household
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/members",
    tag = "members",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
    ),
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member created successfully", body = ApiResponse<MemberResponse>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_member(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MemberResponse>>), StatusCode> {
    debug!(
        "Creating member '{}' in household {}",
        request.name, household_id
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

    let new_member = member::ActiveModel {
        household_id: Set(household_id),
        name: Set(request.name.clone()),
        ..Default::default()
    };

    match new_member.insert(&state.db).await {
        Ok(model) => {
            info!("Member created successfully with ID: {}", model.id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: MemberResponse::from(model),
                message: "Member created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create member '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all members of a household
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/members",
    tag = "members",
    params(
        ("household_id" = i32, Path, description = "Household ID"),
    ),
    responses(
        (status = 200, description = "Members retrieved successfully", body = ApiResponse<Vec<MemberResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_members(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MemberResponse>>>, StatusCode> {
    match member::Entity::find()
        .filter(member::Column::HouseholdId.eq(household_id))
        .all(&state.db)
        .await
    {
        Ok(members) => {
            debug!(
                "Retrieved {} members for household {}",
                members.len(),
                household_id
            );
            let response = ApiResponse {
                data: members.into_iter().map(MemberResponse::from).collect(),
                message: "Members retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to retrieve members for household {}: {}",
                household_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific member by ID
#[utoipa::path(
    get,
    path = "/api/v1/members/{member_id}",
    tag = "members",
    params(
        ("member_id" = i32, Path, description = "Member ID"),
    ),
    responses(
        (status = 200, description = "Member retrieved successfully", body = ApiResponse<MemberResponse>),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_member(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MemberResponse>>, StatusCode> {
    match member::Entity::find_by_id(member_id).one(&state.db).await {
        Ok(Some(model)) => {
            let response = ApiResponse {
                data: MemberResponse::from(model),
                message: "Member retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Member with ID {} not found", member_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve member {}: {}", member_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Update a member
#[utoipa::path(
    put,
    path = "/api/v1/members/{member_id}",
    tag = "members",
    params(
        ("member_id" = i32, Path, description = "Member ID"),
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Member updated successfully", body = ApiResponse<MemberResponse>),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_member(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<ApiResponse<MemberResponse>>, StatusCode> {
    let existing = match member::Entity::find_by_id(member_id).one(&state.db).await {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("Member with ID {} not found for update", member_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup member {}: {}", member_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut active: member::ActiveModel = existing.into();
    if let Some(name) = request.name {
        debug!("Updating member {} name to: {}", member_id, name);
        active.name = Set(name);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Member with ID {} updated successfully", member_id);
            state.invalidate_report_caches();
            let response = ApiResponse {
                data: MemberResponse::from(updated),
                message: "Member updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update member {}: {}", member_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a member
#[utoipa::path(
    delete,
    path = "/api/v1/members/{member_id}",
    tag = "members",
    params(
        ("member_id" = i32, Path, description = "Member ID"),
    ),
    responses(
        (status = 200, description = "Member deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_member(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    match member::Entity::delete_by_id(member_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Member with ID {} deleted successfully", member_id);
                state.invalidate_report_caches();
                let response = ApiResponse {
                    data: format!("Member {} deleted", member_id),
                    message: "Member deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Member with ID {} not found for deletion", member_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete member {}: {}", member_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
