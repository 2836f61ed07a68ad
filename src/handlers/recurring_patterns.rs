use crate::handlers::households::find_household;
use crate::helpers::converters::{log_to_dto, pattern_to_dto};
use crate::helpers::errors::{
    api_error, database_error, from_compute_error, not_found, optional_json_body,
    validate_request, validation_error, ApiError,
};
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::{GenerationLogPage, RecurringPatternDto, UpcomingOccurrencesDto};
use compute::lifecycle::{
    apply_action, has_generation_history, initial_next_generation_date,
    rescheduled_next_generation_date,
};
use compute::{LifecycleAction, Schedule};
use model::entities::recurring_pattern::{self, Frequency, PatternStatus, TransactionType};
use model::entities::{account, category, recurring_transaction_log};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for creating a recurring pattern
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateRecurringPatternRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    /// Account the generated transactions are booked on
    pub account_id: i32,
    pub category_id: Option<i32>,
    /// DAILY, WEEKLY, BIWEEKLY, MONTHLY, QUARTERLY or YEARLY
    pub frequency: String,
    /// DEBIT or CREDIT
    pub transaction_type: String,
    /// Positive amount, as a number or a string
    #[schema(value_type = String, example = "1200.00")]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    /// Last date an occurrence may fall on
    pub end_date: Option<NaiveDate>,
    /// 1-31, required for MONTHLY
    pub day_of_month: Option<i32>,
    /// 0-6 with 0 = Sunday, required for WEEKLY
    pub day_of_week: Option<i32>,
}

/// Request body for updating a recurring pattern.
///
/// Omitted fields are left unchanged; an explicit `null` clears a nullable field.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateRecurringPatternRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub account_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    pub frequency: Option<String>,
    pub transaction_type: Option<String>,
    #[schema(value_type = Option<String>, example = "1200.00")]
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub day_of_month: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub day_of_week: Option<Option<i32>>,
}

/// Distinguishes an absent field (`None`) from an explicit null (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Optional body of the toggle endpoint
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TogglePatternRequest {
    /// `true` pauses, `false` resumes. Without it the state is flipped.
    pub paused: Option<bool>,
}

/// Query parameters for listing patterns
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatternListQuery {
    /// Only ACTIVE and PAUSED patterns
    pub active_only: Option<bool>,
}

/// Query parameters for the generation log
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PatternLogsQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 20)
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

/// Query parameters for the occurrence preview
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct UpcomingQuery {
    /// Number of dates (default: 5)
    #[validate(range(min = 1, max = 100))]
    pub count: Option<usize>,
}

fn parse_frequency(value: &str) -> Result<Frequency, ApiError> {
    value.parse::<Frequency>().map_err(|e| {
        warn!("{}", e);
        validation_error(e)
    })
}

fn parse_transaction_type(value: &str) -> Result<TransactionType, ApiError> {
    value.parse::<TransactionType>().map_err(|e| {
        warn!("{}", e);
        validation_error(e)
    })
}

fn ensure_positive_amount(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        warn!("Rejected non-positive amount {}", amount);
        return Err(validation_error(format!("amount must be positive, got {}", amount)));
    }
    Ok(())
}

/// The account must exist, be open and belong to the pattern's household.
async fn validate_account(state: &AppState, household_id: i32, account_id: i32) -> Result<(), ApiError> {
    let found = account::Entity::find_by_id(account_id)
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to validate account", e))?;

    match found {
        Some(account) if account.household_id == household_id && !account.is_closed => Ok(()),
        Some(account) if account.is_closed => Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_ACCOUNT_ID",
            format!("Account with id {} is closed", account_id),
        )),
        _ => {
            warn!("Account {} is not part of household {}", account_id, household_id);
            Err(api_error(
                StatusCode::BAD_REQUEST,
                "INVALID_ACCOUNT_ID",
                format!("Account with id {} does not exist in household {}", account_id, household_id),
            ))
        }
    }
}

async fn validate_category(state: &AppState, household_id: i32, category_id: i32) -> Result<(), ApiError> {
    let found = category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to validate category", e))?;

    match found {
        Some(category) if category.household_id == household_id => Ok(()),
        _ => {
            warn!("Category {} is not part of household {}", category_id, household_id);
            Err(api_error(
                StatusCode::BAD_REQUEST,
                "INVALID_CATEGORY_ID",
                format!("Category with id {} does not exist in household {}", category_id, household_id),
            ))
        }
    }
}

async fn find_pattern(state: &AppState, pattern_id: i32) -> Result<recurring_pattern::Model, ApiError> {
    match recurring_pattern::Entity::find_by_id(pattern_id).one(&state.db).await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => Err(not_found("RECURRING_PATTERN_NOT_FOUND", "Recurring pattern", pattern_id)),
        Err(e) => Err(database_error("Failed to retrieve recurring pattern", e)),
    }
}

/// Create a recurring pattern
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/recurring-patterns",
    tag = "recurring-patterns",
    params(("household_id" = i32, Path, description = "Household ID")),
    request_body = CreateRecurringPatternRequest,
    responses(
        (status = 201, description = "Recurring pattern created successfully", body = ApiResponse<RecurringPatternDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_recurring_pattern(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateRecurringPatternRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPatternDto>>), ApiError> {
    trace!("Entering create_recurring_pattern function");
    validate_request(&request)?;
    find_household(&state, household_id).await?;

    let frequency = parse_frequency(&request.frequency)?;
    let transaction_type = parse_transaction_type(&request.transaction_type)?;
    ensure_positive_amount(request.amount)?;

    let schedule = Schedule::new(
        frequency,
        request.start_date,
        request.day_of_month,
        request.day_of_week,
    )
    .map_err(from_compute_error)?;
    let next_generation_date =
        initial_next_generation_date(&schedule, request.start_date, request.end_date)
            .map_err(from_compute_error)?;

    validate_account(&state, household_id, request.account_id).await?;
    if let Some(category_id) = request.category_id {
        validate_category(&state, household_id, category_id).await?;
    }

    let created = recurring_pattern::ActiveModel {
        household_id: Set(household_id),
        account_id: Set(request.account_id),
        category_id: Set(request.category_id),
        name: Set(request.name),
        description: Set(request.description),
        frequency: Set(frequency),
        transaction_type: Set(transaction_type),
        amount: Set(request.amount),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        day_of_month: Set(request.day_of_month),
        day_of_week: Set(request.day_of_week),
        next_generation_date: Set(next_generation_date),
        last_generated_date: Set(None),
        status: Set(PatternStatus::Active),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("Failed to create recurring pattern", e))?;

    info!(
        "Created recurring pattern {} ({}), first occurrence {}",
        created.id, created.frequency, created.next_generation_date
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(pattern_to_dto(created), "Recurring pattern created successfully")),
    ))
}

/// List the recurring patterns of a household
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/recurring-patterns",
    tag = "recurring-patterns",
    params(("household_id" = i32, Path, description = "Household ID"), PatternListQuery),
    responses(
        (status = 200, description = "Recurring patterns retrieved successfully", body = ApiResponse<Vec<RecurringPatternDto>>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_household_recurring_patterns(
    Path(household_id): Path<i32>,
    Query(query): Query<PatternListQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<RecurringPatternDto>>>), ApiError> {
    find_household(&state, household_id).await?;

    let mut query_builder = recurring_pattern::Entity::find()
        .filter(recurring_pattern::Column::HouseholdId.eq(household_id));
    if query.active_only.unwrap_or(false) {
        query_builder =
            query_builder.filter(recurring_pattern::Column::Status.ne(PatternStatus::Inactive));
    }

    let patterns = query_builder
        .order_by_asc(recurring_pattern::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve recurring patterns", e))?;

    debug!("Found {} recurring patterns for household {}", patterns.len(), household_id);
    let data = patterns.into_iter().map(pattern_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(data, "Recurring patterns retrieved successfully")),
    ))
}

/// Get a recurring pattern by ID
#[utoipa::path(
    get,
    path = "/api/v1/recurring-patterns/{pattern_id}",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID")),
    responses(
        (status = 200, description = "Recurring pattern retrieved successfully", body = ApiResponse<RecurringPatternDto>),
        (status = 404, description = "Recurring pattern not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_recurring_pattern(
    Path(pattern_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPatternDto>>), ApiError> {
    let pattern = find_pattern(&state, pattern_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(pattern_to_dto(pattern), "Recurring pattern retrieved successfully")),
    ))
}

/// Update a recurring pattern
///
/// Changing the frequency, an anchor or the start date recomputes the next
/// generation date without moving it back before already generated periods.
#[utoipa::path(
    put,
    path = "/api/v1/recurring-patterns/{pattern_id}",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID")),
    request_body = UpdateRecurringPatternRequest,
    responses(
        (status = 200, description = "Recurring pattern updated successfully", body = ApiResponse<RecurringPatternDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Recurring pattern not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_recurring_pattern(
    Path(pattern_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateRecurringPatternRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPatternDto>>), ApiError> {
    trace!("Entering update_recurring_pattern function");
    validate_request(&request)?;
    let existing = find_pattern(&state, pattern_id).await?;

    let frequency = match &request.frequency {
        Some(value) => parse_frequency(value)?,
        None => existing.frequency,
    };
    let transaction_type = match &request.transaction_type {
        Some(value) => parse_transaction_type(value)?,
        None => existing.transaction_type,
    };
    if let Some(amount) = request.amount {
        ensure_positive_amount(amount)?;
    }

    let start_date = request.start_date.unwrap_or(existing.start_date);
    let end_date = request.end_date.unwrap_or(existing.end_date);
    let day_of_month = request.day_of_month.unwrap_or(existing.day_of_month);
    let day_of_week = request.day_of_week.unwrap_or(existing.day_of_week);

    let schedule =
        Schedule::new(frequency, start_date, day_of_month, day_of_week).map_err(from_compute_error)?;
    if let Some(end) = end_date {
        if end < start_date {
            return Err(validation_error(format!(
                "end_date {} is before start_date {}",
                end, start_date
            )));
        }
    }

    if let Some(account_id) = request.account_id {
        validate_account(&state, existing.household_id, account_id).await?;
    }
    if let Some(Some(category_id)) = request.category_id {
        validate_category(&state, existing.household_id, category_id).await?;
    }

    let rule_changed = frequency != existing.frequency
        || start_date != existing.start_date
        || day_of_month != existing.day_of_month
        || day_of_week != existing.day_of_week;
    let next_generation_date = if rule_changed && existing.status != PatternStatus::Inactive {
        let generated = has_generation_history(&state.db, existing.id)
            .await
            .map_err(from_compute_error)?;
        let next =
            rescheduled_next_generation_date(&existing, generated, &schedule, start_date, end_date)
                .map_err(from_compute_error)?;
        debug!(
            "Rule of pattern {} changed, next generation moves {} -> {}",
            pattern_id, existing.next_generation_date, next
        );
        Some(next)
    } else {
        None
    };

    let mut active: recurring_pattern::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(account_id) = request.account_id {
        active.account_id = Set(account_id);
    }
    if let Some(category_id) = request.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if request.frequency.is_some() {
        active.frequency = Set(frequency);
    }
    if request.transaction_type.is_some() {
        active.transaction_type = Set(transaction_type);
    }
    if request.start_date.is_some() {
        active.start_date = Set(start_date);
    }
    if request.end_date.is_some() {
        active.end_date = Set(end_date);
    }
    if request.day_of_month.is_some() {
        active.day_of_month = Set(day_of_month);
    }
    if request.day_of_week.is_some() {
        active.day_of_week = Set(day_of_week);
    }
    if let Some(next) = next_generation_date {
        active.next_generation_date = Set(next);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to update recurring pattern", e))?;

    info!("Updated recurring pattern {}", pattern_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(pattern_to_dto(updated), "Recurring pattern updated successfully")),
    ))
}

/// Delete a recurring pattern. Its generation log is kept.
#[utoipa::path(
    delete,
    path = "/api/v1/recurring-patterns/{pattern_id}",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID")),
    responses(
        (status = 200, description = "Recurring pattern deleted", body = ApiResponse<String>),
        (status = 404, description = "Recurring pattern not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_recurring_pattern(
    Path(pattern_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    let result = recurring_pattern::Entity::delete_by_id(pattern_id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete recurring pattern", e))?;

    if result.rows_affected == 0 {
        return Err(not_found("RECURRING_PATTERN_NOT_FOUND", "Recurring pattern", pattern_id));
    }

    info!("Recurring pattern {} deleted", pattern_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(
            format!("Recurring pattern {} deleted", pattern_id),
            "Recurring pattern deleted successfully",
        )),
    ))
}

async fn change_lifecycle(
    state: &AppState,
    pattern_id: i32,
    action: LifecycleAction,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPatternDto>>), ApiError> {
    let pattern = find_pattern(state, pattern_id).await?;
    let updated = apply_action(&state.db, pattern, action)
        .await
        .map_err(from_compute_error)?;

    let message = format!("Recurring pattern is now {}", updated.status);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(pattern_to_dto(updated), message)),
    ))
}

/// Pause or resume a recurring pattern
#[utoipa::path(
    post,
    path = "/api/v1/recurring-patterns/{pattern_id}/toggle",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID")),
    request_body = TogglePatternRequest,
    responses(
        (status = 200, description = "Pattern paused or resumed", body = ApiResponse<RecurringPatternDto>),
        (status = 404, description = "Recurring pattern not found", body = ErrorResponse),
        (status = 409, description = "Pattern is inactive", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body))]
pub async fn toggle_recurring_pattern(
    Path(pattern_id): Path<i32>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPatternDto>>), ApiError> {
    let request = optional_json_body::<TogglePatternRequest>(&body)?;
    let action = match request.and_then(|request| request.paused) {
        Some(true) => LifecycleAction::Pause,
        Some(false) => LifecycleAction::Resume,
        None => LifecycleAction::Toggle,
    };
    debug!("Applying {} to recurring pattern {}", action, pattern_id);
    change_lifecycle(&state, pattern_id, action).await
}

/// Deactivate a recurring pattern for good
#[utoipa::path(
    post,
    path = "/api/v1/recurring-patterns/{pattern_id}/deactivate",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID")),
    responses(
        (status = 200, description = "Pattern deactivated", body = ApiResponse<RecurringPatternDto>),
        (status = 404, description = "Recurring pattern not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn deactivate_recurring_pattern(
    Path(pattern_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringPatternDto>>), ApiError> {
    change_lifecycle(&state, pattern_id, LifecycleAction::Deactivate).await
}

/// Generation history of a pattern, newest first
///
/// Also answers for patterns that were deleted since.
#[utoipa::path(
    get,
    path = "/api/v1/recurring-patterns/{pattern_id}/logs",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID"), PatternLogsQuery),
    responses(
        (status = 200, description = "Generation logs retrieved successfully", body = ApiResponse<GenerationLogPage>),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_recurring_pattern_logs(
    Path(pattern_id): Path<i32>,
    Valid(Query(query)): Valid<Query<PatternLogsQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<GenerationLogPage>>), ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    debug!("Fetching logs of pattern {} - page: {}, limit: {}", pattern_id, page, limit);

    let paginator = recurring_transaction_log::Entity::find()
        .filter(recurring_transaction_log::Column::RecurringPatternId.eq(pattern_id))
        .order_by_desc(recurring_transaction_log::Column::Id)
        .paginate(&state.db, limit);

    let total = paginator
        .num_items()
        .await
        .map_err(|e| database_error("Failed to count generation logs", e))?;
    let logs = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| database_error("Failed to retrieve generation logs", e))?;

    let data = GenerationLogPage {
        logs: logs.into_iter().map(log_to_dto).collect(),
        page,
        limit,
        total,
    };
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(data, "Generation logs retrieved successfully")),
    ))
}

/// Preview the next occurrences of a pattern
///
/// Starts at the pending `next_generation_date` and stops at `end_date`.
/// Inactive patterns have no upcoming occurrences.
#[utoipa::path(
    get,
    path = "/api/v1/recurring-patterns/{pattern_id}/upcoming",
    tag = "recurring-patterns",
    params(("pattern_id" = i32, Path, description = "Recurring pattern ID"), UpcomingQuery),
    responses(
        (status = 200, description = "Upcoming occurrences", body = ApiResponse<UpcomingOccurrencesDto>),
        (status = 404, description = "Recurring pattern not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_upcoming_occurrences(
    Path(pattern_id): Path<i32>,
    Valid(Query(query)): Valid<Query<UpcomingQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<UpcomingOccurrencesDto>>), ApiError> {
    let pattern = find_pattern(&state, pattern_id).await?;
    let count = query.count.unwrap_or(5);

    // updated_at changes on every write, so a stale entry is never hit.
    let cache_key = format!("upcoming_{}_{}_{}", pattern.id, pattern.updated_at, count);
    if let Some(CachedData::Upcoming(cached)) = state.cache.get(&cache_key).await {
        debug!("Returning cached upcoming occurrences for pattern {}", pattern_id);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::new(cached, "Upcoming occurrences retrieved successfully")),
        ));
    }

    let dates = if pattern.status == PatternStatus::Inactive {
        Vec::new()
    } else {
        let schedule = Schedule::from_pattern(&pattern).map_err(from_compute_error)?;
        schedule.upcoming(pattern.next_generation_date, pattern.end_date, count)
    };

    let data = UpcomingOccurrencesDto {
        recurring_pattern_id: pattern.id,
        dates,
    };
    state
        .cache
        .insert(cache_key, CachedData::Upcoming(data.clone()))
        .await;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(data, "Upcoming occurrences retrieved successfully")),
    ))
}
