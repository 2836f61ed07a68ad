use crate::helpers::converters::household_to_dto;
use crate::helpers::errors::{database_error, not_found, validate_request, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::HouseholdDto;
use model::entities::household;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a household
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateHouseholdRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Load a household or answer 404.
pub async fn find_household(state: &AppState, household_id: i32) -> Result<household::Model, ApiError> {
    match household::Entity::find_by_id(household_id).one(&state.db).await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => Err(not_found("HOUSEHOLD_NOT_FOUND", "Household", household_id)),
        Err(e) => Err(database_error("Failed to retrieve household", e)),
    }
}

/// Create a household
#[utoipa::path(
    post,
    path = "/api/v1/households",
    tag = "households",
    request_body = CreateHouseholdRequest,
    responses(
        (status = 201, description = "Household created successfully", body = ApiResponse<HouseholdDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_household(
    State(state): State<AppState>,
    Json(request): Json<CreateHouseholdRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HouseholdDto>>), ApiError> {
    trace!("Entering create_household function");
    validate_request(&request)?;

    let created = household::ActiveModel {
        name: Set(request.name.trim().to_string()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("Failed to create household", e))?;

    info!("Created household {} ({})", created.id, created.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(household_to_dto(created), "Household created successfully")),
    ))
}

/// Get a household by ID
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}",
    tag = "households",
    params(("household_id" = i32, Path, description = "Household ID")),
    responses(
        (status = 200, description = "Household retrieved successfully", body = ApiResponse<HouseholdDto>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_household(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<HouseholdDto>>), ApiError> {
    debug!("Fetching household with ID: {}", household_id);
    let found = find_household(&state, household_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(household_to_dto(found), "Household retrieved successfully")),
    ))
}
