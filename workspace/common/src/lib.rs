//! Common transport-layer types shared between the HTTP handlers and API clients.
//! These structs mirror the JSON payloads the backend emits so clients can
//! deserialize responses without duplicating shapes.

mod money;

pub use money::{normalize_currency_code, CurrencyError};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// A successful response.
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

// ===================== Households =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct HouseholdDto {
    pub id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
}

// ===================== Accounts =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AccountDto {
    pub id: i32,
    pub household_id: i32,
    pub name: String,
    /// ISO 4217 code, upper case.
    pub currency_code: String,
    pub is_closed: bool,
}

// ===================== Categories =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryDto {
    pub id: i32,
    pub household_id: i32,
    pub name: String,
}

// ===================== Transactions =====================

/// A ledger entry, either entered by hand or generated from a recurring pattern.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TransactionDto {
    pub id: i32,
    pub account_id: i32,
    pub category_id: Option<i32>,
    /// Set when the entry was generated; cleared if the pattern is deleted.
    pub recurring_pattern_id: Option<i32>,
    /// DEBIT or CREDIT
    pub transaction_type: String,
    #[schema(value_type = String, example = "1200.00")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

// ===================== Recurring patterns =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RecurringPatternDto {
    pub id: i32,
    pub household_id: i32,
    pub account_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    /// DAILY, WEEKLY, BIWEEKLY, MONTHLY, QUARTERLY or YEARLY
    pub frequency: String,
    /// DEBIT or CREDIT
    pub transaction_type: String,
    #[schema(value_type = String, example = "1200.00")]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub day_of_month: Option<i32>,
    /// 0 = Sunday ... 6 = Saturday
    pub day_of_week: Option<i32>,
    pub next_generation_date: NaiveDate,
    pub last_generated_date: Option<NaiveDate>,
    /// ACTIVE, PAUSED or INACTIVE
    pub status: String,
    /// True unless the pattern is INACTIVE.
    pub is_active: bool,
    pub is_paused: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One entry of a pattern's generation history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GenerationLogDto {
    pub id: i32,
    pub recurring_pattern_id: i32,
    pub transaction_id: Option<i32>,
    pub generated_date: NaiveDate,
    /// SUCCESS, FAILED or SKIPPED
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A page of generation logs, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GenerationLogPage {
    pub logs: Vec<GenerationLogDto>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

/// Preview of the dates a pattern will fire on.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UpcomingOccurrencesDto {
    pub recurring_pattern_id: i32,
    pub dates: Vec<NaiveDate>,
}

// ===================== Generation runs =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PatternRunDto {
    pub pattern_id: i32,
    pub occurrence: NaiveDate,
    /// GENERATED, FAILED, SKIPPED, ALREADY_PROCESSED or ABORTED
    pub outcome: String,
    pub transaction_id: Option<i32>,
    pub next_generation_date: Option<NaiveDate>,
    /// The pattern became INACTIVE during this run.
    pub deactivated: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GenerationReportDto {
    pub as_of: NaiveDate,
    pub processed: usize,
    pub generated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub runs: Vec<PatternRunDto>,
}
