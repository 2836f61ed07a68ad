use crate::handlers::households::find_household;
use crate::helpers::converters::category_to_dto;
use crate::helpers::errors::{database_error, validate_request, validation_error, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::CategoryDto;
use model::entities::category;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request structure for creating a new category
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    /// The name of the category (unique within the household)
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Create a category in a household
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/categories",
    tag = "households",
    params(("household_id" = i32, Path, description = "Household ID")),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryDto>),
        (status = 400, description = "Invalid request or duplicate name", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryDto>>), ApiError> {
    trace!("Entering create_category function");
    validate_request(&request)?;
    find_household(&state, household_id).await?;

    let duplicate = category::Entity::find()
        .filter(category::Column::HouseholdId.eq(household_id))
        .filter(category::Column::Name.eq(request.name.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to validate category name", e))?;
    if duplicate.is_some() {
        warn!("Category '{}' already exists in household {}", request.name, household_id);
        return Err(validation_error(format!(
            "Category '{}' already exists in this household",
            request.name
        )));
    }

    let created = category::ActiveModel {
        household_id: Set(household_id),
        name: Set(request.name),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("Failed to create category", e))?;

    info!("Created category {} in household {}", created.id, household_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(category_to_dto(created), "Category created successfully")),
    ))
}

/// List the categories of a household
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/categories",
    tag = "households",
    params(("household_id" = i32, Path, description = "Household ID")),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryDto>>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_household_categories(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CategoryDto>>>), ApiError> {
    find_household(&state, household_id).await?;

    let categories = category::Entity::find()
        .filter(category::Column::HouseholdId.eq(household_id))
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve categories", e))?;

    debug!("Found {} categories for household {}", categories.len(), household_id);
    let data = categories.into_iter().map(category_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(data, "Categories retrieved successfully")),
    ))
}
