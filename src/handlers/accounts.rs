use crate::handlers::households::find_household;
use crate::helpers::converters::{account_to_dto, transaction_to_dto};
use crate::helpers::errors::{
    api_error, database_error, not_found, validate_request, ApiError,
};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{normalize_currency_code, AccountDto, TransactionDto};
use model::entities::{account, transaction};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for creating an account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// ISO 4217 currency code, e.g. "USD"
    pub currency_code: String,
}

/// Query parameters for listing account transactions
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AccountTransactionsQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 50)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

async fn find_account(state: &AppState, account_id: i32) -> Result<account::Model, ApiError> {
    match account::Entity::find_by_id(account_id).one(&state.db).await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => Err(not_found("ACCOUNT_NOT_FOUND", "Account", account_id)),
        Err(e) => Err(database_error("Failed to retrieve account", e)),
    }
}

/// Create an account in a household
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/accounts",
    tag = "households",
    params(("household_id" = i32, Path, description = "Household ID")),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_account(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), ApiError> {
    trace!("Entering create_account function");
    validate_request(&request)?;
    find_household(&state, household_id).await?;

    let currency_code = normalize_currency_code(&request.currency_code).map_err(|e| {
        warn!("Rejected account currency: {}", e);
        api_error(StatusCode::BAD_REQUEST, "INVALID_CURRENCY_CODE", e.to_string())
    })?;

    let created = account::ActiveModel {
        household_id: Set(household_id),
        name: Set(request.name),
        currency_code: Set(currency_code),
        is_closed: Set(false),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("Failed to create account", e))?;

    info!("Created account {} in household {}", created.id, household_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(account_to_dto(created), "Account created successfully")),
    ))
}

/// List the accounts of a household
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/accounts",
    tag = "households",
    params(("household_id" = i32, Path, description = "Household ID")),
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountDto>>),
        (status = 404, description = "Household not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_household_accounts(
    Path(household_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AccountDto>>>), ApiError> {
    find_household(&state, household_id).await?;

    let accounts = account::Entity::find()
        .filter(account::Column::HouseholdId.eq(household_id))
        .order_by_asc(account::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve accounts", e))?;

    debug!("Found {} accounts for household {}", accounts.len(), household_id);
    let data = accounts.into_iter().map(account_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(data, "Accounts retrieved successfully")),
    ))
}

/// Close an account. Patterns booking on it fail from then on.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{account_id}/close",
    tag = "households",
    params(("account_id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account closed", body = ApiResponse<AccountDto>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn close_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), ApiError> {
    let existing = find_account(&state, account_id).await?;
    if existing.is_closed {
        debug!("Account {} is already closed", account_id);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::new(account_to_dto(existing), "Account is already closed")),
        ));
    }

    let mut active: account::ActiveModel = existing.into();
    active.is_closed = Set(true);
    let closed = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to close account", e))?;

    info!("Closed account {}", account_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(account_to_dto(closed), "Account closed successfully")),
    ))
}

/// Delete an account together with its transactions
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{account_id}",
    tag = "households",
    params(("account_id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<String>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    let result = account::Entity::delete_by_id(account_id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete account", e))?;

    if result.rows_affected == 0 {
        return Err(not_found("ACCOUNT_NOT_FOUND", "Account", account_id));
    }

    info!("Account with ID {} deleted successfully", account_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(
            format!("Account {} deleted", account_id),
            "Account deleted successfully",
        )),
    ))
}

/// List the transactions booked on an account, newest first
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}/transactions",
    tag = "households",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
        AccountTransactionsQuery
    ),
    responses(
        (status = 200, description = "Account transactions retrieved successfully", body = ApiResponse<Vec<TransactionDto>>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_transactions(
    Path(account_id): Path<i32>,
    Valid(Query(query)): Valid<Query<AccountTransactionsQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<TransactionDto>>>), ApiError> {
    find_account(&state, account_id).await?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    debug!("Fetching transactions of account {} - page: {}, limit: {}", account_id, page, limit);

    let transactions = transaction::Entity::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .paginate(&state.db, limit)
        .fetch_page(page - 1)
        .await
        .map_err(|e| database_error("Failed to retrieve transactions", e))?;

    let data = transactions.into_iter().map(transaction_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(data, "Account transactions retrieved successfully")),
    ))
}
