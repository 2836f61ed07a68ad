use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use compute::GenerationRunner;
use sea_orm::Database;
use tracing::{debug, info, warn};

use crate::helpers::converters::report_to_dto;

/// One generation pass over every due pattern. Exits non-zero only when the
/// database is unreachable; per-pattern failures end up in the report.
pub async fn generate(database_url: &str, as_of: Option<NaiveDate>) -> Result<()> {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    info!("Running recurring pattern generation as of {}", as_of);
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", database_url))?;

    let report = GenerationRunner::new()
        .run(&db, as_of)
        .await
        .context("Generation run failed")?;

    if report.failed() > 0 {
        warn!("{} of {} patterns failed to generate", report.failed(), report.processed());
    }
    info!(
        "Generated {} transactions, skipped {}",
        report.generated(),
        report.skipped()
    );

    let json = serde_json::to_string_pretty(&report_to_dto(&report))?;
    println!("{}", json);
    Ok(())
}
