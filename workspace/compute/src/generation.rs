use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use model::entities::recurring_pattern::{self, PatternStatus};
use model::entities::recurring_transaction_log::{self, LogStatus};
use model::entities::{account, category, transaction};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ComputeError, Result};
use crate::lifecycle::status_after_advance;
use crate::recurrence::Schedule;

/// Turns one occurrence of a pattern into a ledger transaction.
///
/// Called inside a savepoint of the runner's database transaction; an error
/// rolls back whatever the implementation wrote and is recorded as a FAILED
/// log entry.
#[async_trait]
pub trait Materializer: Send + Sync {
    async fn materialize(
        &self,
        txn: &DatabaseTransaction,
        pattern: &recurring_pattern::Model,
        occurrence: NaiveDate,
    ) -> Result<transaction::Model>;
}

/// Books occurrences into the `transactions` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerMaterializer;

#[async_trait]
impl Materializer for LedgerMaterializer {
    async fn materialize(
        &self,
        txn: &DatabaseTransaction,
        pattern: &recurring_pattern::Model,
        occurrence: NaiveDate,
    ) -> Result<transaction::Model> {
        let account = account::Entity::find_by_id(pattern.account_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ComputeError::Materialization(format!("Account {} not found", pattern.account_id))
            })?;
        if account.household_id != pattern.household_id {
            return Err(ComputeError::Materialization(format!(
                "Account {} does not belong to household {}",
                account.id, pattern.household_id
            )));
        }
        if account.is_closed {
            return Err(ComputeError::Materialization(format!(
                "Account {} is closed",
                account.id
            )));
        }

        if let Some(category_id) = pattern.category_id {
            let category = category::Entity::find_by_id(category_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ComputeError::Materialization(format!("Category {} not found", category_id))
                })?;
            if category.household_id != pattern.household_id {
                return Err(ComputeError::Materialization(format!(
                    "Category {} does not belong to household {}",
                    category_id, pattern.household_id
                )));
            }
        }

        let description = pattern
            .description
            .clone()
            .unwrap_or_else(|| pattern.name.clone());

        let created = transaction::ActiveModel {
            account_id: Set(account.id),
            category_id: Set(pattern.category_id),
            recurring_pattern_id: Set(Some(pattern.id)),
            transaction_type: Set(pattern.transaction_type),
            amount: Set(pattern.amount),
            date: Set(occurrence),
            description: Set(Some(description)),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        Ok(created)
    }
}

/// What happened to one due pattern during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated {
        transaction_id: i32,
        next_generation_date: NaiveDate,
        /// The advance moved past `end_date`.
        deactivated: bool,
    },
    Failed {
        error: String,
        next_generation_date: NaiveDate,
        deactivated: bool,
    },
    /// The occurrence was past `end_date`; the pattern is now inactive.
    Skipped,
    /// Another runner claimed the occurrence first.
    AlreadyProcessed,
    /// The pattern could not be processed at all; nothing was written.
    Aborted { error: String },
}

impl GenerationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationOutcome::Generated { .. } => "GENERATED",
            GenerationOutcome::Failed { .. } => "FAILED",
            GenerationOutcome::Skipped => "SKIPPED",
            GenerationOutcome::AlreadyProcessed => "ALREADY_PROCESSED",
            GenerationOutcome::Aborted { .. } => "ABORTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternRun {
    pub pattern_id: i32,
    pub occurrence: NaiveDate,
    pub outcome: GenerationOutcome,
}

/// Summary of one runner pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub as_of: NaiveDate,
    pub runs: Vec<PatternRun>,
}

impl GenerationReport {
    fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            runs: Vec::new(),
        }
    }

    pub fn processed(&self) -> usize {
        self.runs.len()
    }

    pub fn generated(&self) -> usize {
        self.count(|outcome| matches!(outcome, GenerationOutcome::Generated { .. }))
    }

    /// Failed materializations plus aborted patterns.
    pub fn failed(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                GenerationOutcome::Failed { .. } | GenerationOutcome::Aborted { .. }
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, GenerationOutcome::Skipped))
    }

    pub fn already_processed(&self) -> usize {
        self.count(|outcome| matches!(outcome, GenerationOutcome::AlreadyProcessed))
    }

    fn count(&self, predicate: impl Fn(&GenerationOutcome) -> bool) -> usize {
        self.runs.iter().filter(|run| predicate(&run.outcome)).count()
    }
}

/// Materializes every due occurrence of every active pattern.
///
/// Each pattern is handled in its own database transaction. The occurrence
/// is claimed with a conditional update on (`status`, `next_generation_date`),
/// so concurrent runners never generate the same occurrence twice.
#[derive(Debug, Clone, Default)]
pub struct GenerationRunner<M = LedgerMaterializer> {
    materializer: M,
}

impl GenerationRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: Materializer> GenerationRunner<M> {
    pub fn with_materializer(materializer: M) -> Self {
        Self { materializer }
    }

    #[instrument(skip(self, db))]
    pub async fn run<C>(&self, db: &C, as_of: NaiveDate) -> Result<GenerationReport>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let due = recurring_pattern::Entity::find()
            .filter(recurring_pattern::Column::Status.eq(PatternStatus::Active))
            .filter(recurring_pattern::Column::NextGenerationDate.lte(as_of))
            .order_by_asc(recurring_pattern::Column::NextGenerationDate)
            .order_by_asc(recurring_pattern::Column::Id)
            .all(db)
            .await?;
        info!("Found {} due recurring patterns as of {}", due.len(), as_of);

        let mut report = GenerationReport::new(as_of);
        for pattern in due {
            let outcome = match self.process(db, &pattern, as_of).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Failed to process recurring pattern {}: {}", pattern.id, e);
                    GenerationOutcome::Aborted {
                        error: e.to_string(),
                    }
                }
            };
            report.runs.push(PatternRun {
                pattern_id: pattern.id,
                occurrence: pattern.next_generation_date,
                outcome,
            });
        }

        info!(
            "Generation run as of {} done: processed={}, generated={}, failed={}, skipped={}",
            as_of,
            report.processed(),
            report.generated(),
            report.failed(),
            report.skipped()
        );
        Ok(report)
    }

    /// Processes a single pattern as loaded by `run`.
    ///
    /// Everything goes through `txn`; with a single-connection pool touching
    /// `db` here would wait on ourselves.
    #[instrument(skip(self, db, pattern), fields(pattern_id = pattern.id))]
    pub async fn process<C>(
        &self,
        db: &C,
        pattern: &recurring_pattern::Model,
        as_of: NaiveDate,
    ) -> Result<GenerationOutcome>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let occurrence = pattern.next_generation_date;
        let txn = db.begin().await?;

        if let Some(end_date) = pattern.end_date.filter(|end| occurrence > *end) {
            if !claim(&txn, pattern.id, occurrence, occurrence, PatternStatus::Inactive).await? {
                txn.rollback().await?;
                debug!("Pattern {} was already processed", pattern.id);
                return Ok(GenerationOutcome::AlreadyProcessed);
            }
            append_log(
                &txn,
                pattern.id,
                occurrence,
                LogStatus::Skipped,
                None,
                Some(format!("Occurrence {} is after end date {}", occurrence, end_date)),
            )
            .await?;
            txn.commit().await?;
            info!("Pattern {} expired on {}, skipped {}", pattern.id, end_date, occurrence);
            return Ok(GenerationOutcome::Skipped);
        }

        let schedule = Schedule::from_pattern(pattern)?;
        let next = schedule.advance_past(occurrence, as_of).ok_or_else(|| {
            ComputeError::Date(format!("no occurrence representable after {}", occurrence))
        })?;
        let status = status_after_advance(next, pattern.end_date);
        let deactivated = status == PatternStatus::Inactive;

        if !claim(&txn, pattern.id, occurrence, next, status).await? {
            txn.rollback().await?;
            debug!("Pattern {} was already processed", pattern.id);
            return Ok(GenerationOutcome::AlreadyProcessed);
        }

        let savepoint = txn.begin().await?;
        let materialized = self
            .materializer
            .materialize(&savepoint, pattern, occurrence)
            .await;

        let outcome = match materialized {
            Ok(created) => {
                savepoint.commit().await?;
                recurring_pattern::Entity::update_many()
                    .col_expr(
                        recurring_pattern::Column::LastGeneratedDate,
                        Expr::value(Some(as_of)),
                    )
                    .filter(recurring_pattern::Column::Id.eq(pattern.id))
                    .exec(&txn)
                    .await?;
                append_log(
                    &txn,
                    pattern.id,
                    occurrence,
                    LogStatus::Success,
                    Some(created.id),
                    None,
                )
                .await?;
                info!(
                    "Generated transaction {} for pattern {} on {}, next {}",
                    created.id, pattern.id, occurrence, next
                );
                GenerationOutcome::Generated {
                    transaction_id: created.id,
                    next_generation_date: next,
                    deactivated,
                }
            }
            Err(e) => {
                savepoint.rollback().await?;
                let message = e.to_string();
                append_log(
                    &txn,
                    pattern.id,
                    occurrence,
                    LogStatus::Failed,
                    None,
                    Some(message.clone()),
                )
                .await?;
                warn!(
                    "Generation failed for pattern {} on {}: {}",
                    pattern.id, occurrence, message
                );
                GenerationOutcome::Failed {
                    error: message,
                    next_generation_date: next,
                    deactivated,
                }
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }
}

/// Moves the pattern from `occurrence` to `next` if nobody else did.
async fn claim(
    txn: &DatabaseTransaction,
    pattern_id: i32,
    occurrence: NaiveDate,
    next: NaiveDate,
    status: PatternStatus,
) -> Result<bool> {
    let result = recurring_pattern::Entity::update_many()
        .col_expr(recurring_pattern::Column::NextGenerationDate, Expr::value(next))
        .col_expr(recurring_pattern::Column::Status, Expr::value(status))
        .col_expr(
            recurring_pattern::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(recurring_pattern::Column::Id.eq(pattern_id))
        .filter(recurring_pattern::Column::Status.eq(PatternStatus::Active))
        .filter(recurring_pattern::Column::NextGenerationDate.eq(occurrence))
        .exec(txn)
        .await?;

    Ok(result.rows_affected == 1)
}

async fn append_log(
    txn: &DatabaseTransaction,
    pattern_id: i32,
    generated_date: NaiveDate,
    status: LogStatus,
    transaction_id: Option<i32>,
    error_message: Option<String>,
) -> Result<recurring_transaction_log::Model> {
    let log = recurring_transaction_log::ActiveModel {
        recurring_pattern_id: Set(pattern_id),
        transaction_id: Set(transaction_id),
        generated_date: Set(generated_date),
        status: Set(status),
        error_message: Set(error_message),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    Ok(log)
}
