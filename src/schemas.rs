use crate::config::AppConfig;
use common::{
    AccountDto, CategoryDto, GenerationLogDto, GenerationLogPage, GenerationReportDto,
    HouseholdDto, PatternRunDto, RecurringPatternDto, TransactionDto, UpcomingOccurrencesDto,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

pub use common::ApiResponse;

use crate::handlers::accounts::CreateAccountRequest;
use crate::handlers::categories::CreateCategoryRequest;
use crate::handlers::generation::GenerateRequest;
use crate::handlers::households::CreateHouseholdRequest;
use crate::handlers::recurring_patterns::{
    CreateRecurringPatternRequest, TogglePatternRequest, UpdateRecurringPatternRequest,
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for occurrence previews
    pub cache: Cache<String, CachedData>,
    pub config: Arc<AppConfig>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Upcoming(UpcomingOccurrencesDto),
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::households::create_household,
        crate::handlers::households::get_household,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_household_accounts,
        crate::handlers::accounts::close_account,
        crate::handlers::accounts::delete_account,
        crate::handlers::accounts::get_account_transactions,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_household_categories,
        crate::handlers::recurring_patterns::create_recurring_pattern,
        crate::handlers::recurring_patterns::get_household_recurring_patterns,
        crate::handlers::recurring_patterns::get_recurring_pattern,
        crate::handlers::recurring_patterns::update_recurring_pattern,
        crate::handlers::recurring_patterns::delete_recurring_pattern,
        crate::handlers::recurring_patterns::toggle_recurring_pattern,
        crate::handlers::recurring_patterns::deactivate_recurring_pattern,
        crate::handlers::recurring_patterns::get_recurring_pattern_logs,
        crate::handlers::recurring_patterns::get_upcoming_occurrences,
        crate::handlers::generation::run_generation,
    ),
    components(
        schemas(
            ApiResponse<HouseholdDto>,
            ApiResponse<AccountDto>,
            ApiResponse<Vec<AccountDto>>,
            ApiResponse<CategoryDto>,
            ApiResponse<Vec<CategoryDto>>,
            ApiResponse<Vec<TransactionDto>>,
            ApiResponse<RecurringPatternDto>,
            ApiResponse<Vec<RecurringPatternDto>>,
            ApiResponse<GenerationLogPage>,
            ApiResponse<UpcomingOccurrencesDto>,
            ApiResponse<GenerationReportDto>,
            ErrorResponse,
            HealthResponse,
            HouseholdDto,
            AccountDto,
            CategoryDto,
            TransactionDto,
            RecurringPatternDto,
            GenerationLogDto,
            GenerationLogPage,
            UpcomingOccurrencesDto,
            PatternRunDto,
            GenerationReportDto,
            CreateHouseholdRequest,
            CreateAccountRequest,
            CreateCategoryRequest,
            CreateRecurringPatternRequest,
            UpdateRecurringPatternRequest,
            TogglePatternRequest,
            GenerateRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "households", description = "Household, account and category management"),
        (name = "recurring-patterns", description = "Recurring pattern management and generation"),
    ),
    info(
        title = "Hearth API",
        description = "Household finance backend: recurring transaction patterns and their generation",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
