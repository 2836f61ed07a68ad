use crate::helpers::converters::report_to_dto;
use crate::helpers::errors::{api_error, from_compute_error, optional_json_body, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use common::GenerationReportDto;
use compute::GenerationRunner;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Header carrying the shared secret of the generation trigger.
pub const GENERATION_TOKEN_HEADER: &str = "x-generation-token";

/// Optional body of the generation trigger
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct GenerateRequest {
    /// Run date; defaults to today (UTC)
    pub as_of: Option<NaiveDate>,
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.generation_token.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(GENERATION_TOKEN_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();
    if bool::from(provided.ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        warn!("Rejected generation trigger with missing or wrong token");
        Err(api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "A valid generation token is required",
        ))
    }
}

/// Generate the transactions of every due pattern
///
/// Each due ACTIVE pattern fires at most once per run. Failures are recorded
/// in the pattern's log and do not stop the run.
#[utoipa::path(
    post,
    path = "/api/v1/recurring-patterns/generate",
    tag = "recurring-patterns",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generation run finished", body = ApiResponse<GenerationReportDto>),
        (status = 401, description = "Missing or wrong generation token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers, body))]
pub async fn run_generation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<GenerationReportDto>>), ApiError> {
    authorize(&state, &headers)?;

    let as_of = optional_json_body::<GenerateRequest>(&body)?
        .and_then(|request| request.as_of)
        .unwrap_or_else(|| Utc::now().date_naive());

    let report = GenerationRunner::new()
        .run(&state.db, as_of)
        .await
        .map_err(from_compute_error)?;

    info!(
        "Generation run for {}: {} processed, {} generated, {} failed",
        as_of,
        report.processed(),
        report.generated(),
        report.failed()
    );
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(report_to_dto(&report), "Generation run completed")),
    ))
}
