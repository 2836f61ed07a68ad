use chrono::{NaiveDate, Utc};
use model::entities::recurring_pattern::{self, PatternStatus};
use model::entities::recurring_transaction_log;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::error::{ComputeError, Result};
use crate::recurrence::Schedule;

/// A user-initiated lifecycle change of a recurring pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Pause,
    Resume,
    /// Pause an active pattern, resume a paused one.
    Toggle,
    Deactivate,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            LifecycleAction::Pause => "pause",
            LifecycleAction::Resume => "resume",
            LifecycleAction::Toggle => "toggle",
            LifecycleAction::Deactivate => "deactivate",
        };
        f.write_str(verb)
    }
}

/// Computes the state reached by applying `action` in state `status`.
///
/// Pausing a paused pattern, resuming an active one and deactivating an
/// inactive one are no-ops. INACTIVE is terminal for everything else.
pub fn transition(status: PatternStatus, action: LifecycleAction) -> Result<PatternStatus> {
    use LifecycleAction::*;
    use PatternStatus::*;

    match (status, action) {
        (Active | Paused, Pause) => Ok(Paused),
        (Active | Paused, Resume) => Ok(Active),
        (Active, Toggle) => Ok(Paused),
        (Paused, Toggle) => Ok(Active),
        (_, Deactivate) => Ok(Inactive),
        (Inactive, Pause | Resume | Toggle) => Err(ComputeError::Lifecycle {
            action: action.to_string(),
            status: status.to_string(),
        }),
    }
}

/// The state a pattern is left in after its next date moved to `next`.
pub fn status_after_advance(next: NaiveDate, end_date: Option<NaiveDate>) -> PatternStatus {
    match end_date {
        Some(end) if next > end => PatternStatus::Inactive,
        _ => PatternStatus::Active,
    }
}

/// The `next_generation_date` a new pattern starts with.
///
/// Fails when the rule has no occurrence between `start_date` and `end_date`.
pub fn initial_next_generation_date(
    schedule: &Schedule,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<NaiveDate> {
    if let Some(end) = end_date {
        if end < start_date {
            return Err(ComputeError::Validation(format!(
                "end_date {} is before start_date {}",
                end, start_date
            )));
        }
    }

    let first = schedule.first_occurrence(start_date).ok_or_else(|| {
        ComputeError::Date(format!("no occurrence representable after {}", start_date))
    })?;
    ensure_within_end(first, start_date, end_date)?;
    Ok(first)
}

/// Recomputes `next_generation_date` after the rule of `previous` changed.
///
/// A pattern that never generated restarts from its (new) start date. Once
/// any occurrence was claimed (`generated`), the result is never before the
/// previous next date, so no claimed occurrence is produced twice.
pub fn rescheduled_next_generation_date(
    previous: &recurring_pattern::Model,
    generated: bool,
    schedule: &Schedule,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<NaiveDate> {
    let from = if generated {
        start_date.max(previous.next_generation_date)
    } else {
        start_date
    };

    if let Some(end) = end_date {
        if end < start_date {
            return Err(ComputeError::Validation(format!(
                "end_date {} is before start_date {}",
                end, start_date
            )));
        }
    }

    let next = schedule
        .first_on_or_after(start_date, from)
        .ok_or_else(|| ComputeError::Date(format!("no occurrence representable after {}", from)))?;
    ensure_within_end(next, start_date, end_date)?;
    Ok(next)
}

/// Whether the runner ever claimed an occurrence of the pattern.
///
/// Every claim appends a log entry, whether it succeeded or failed.
pub async fn has_generation_history<C: ConnectionTrait>(db: &C, pattern_id: i32) -> Result<bool> {
    let count = recurring_transaction_log::Entity::find()
        .filter(recurring_transaction_log::Column::RecurringPatternId.eq(pattern_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

fn ensure_within_end(
    next: NaiveDate,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<()> {
    match end_date {
        Some(end) if next > end => Err(ComputeError::NoOccurrence {
            start_date,
            end_date: end,
        }),
        _ => Ok(()),
    }
}

/// Applies a lifecycle action to a stored pattern.
///
/// Only the status column is written, so a concurrent generation run never
/// has its `next_generation_date` overwritten. Pausing freezes the date;
/// resuming picks it up unchanged.
///
/// The write is conditional on the status `pattern` was loaded with. If the
/// row changed meanwhile (e.g. the runner expired it), the pattern is
/// reloaded and the action re-evaluated against the fresh status.
#[instrument(skip(db, pattern), fields(pattern_id = pattern.id, status = %pattern.status))]
pub async fn apply_action<C: ConnectionTrait>(
    db: &C,
    pattern: recurring_pattern::Model,
    action: LifecycleAction,
) -> Result<recurring_pattern::Model> {
    let pattern_id = pattern.id;
    let mut current = pattern;

    loop {
        let new_status = transition(current.status, action)?;
        if new_status == current.status {
            debug!("Pattern {} already {}, nothing to {}", pattern_id, new_status, action);
            return Ok(current);
        }

        let result = recurring_pattern::Entity::update_many()
            .col_expr(recurring_pattern::Column::Status, Expr::value(new_status))
            .col_expr(
                recurring_pattern::Column::UpdatedAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(recurring_pattern::Column::Id.eq(pattern_id))
            .filter(recurring_pattern::Column::Status.eq(current.status))
            .exec(db)
            .await?;

        let reloaded = find_pattern(db, pattern_id).await?;
        if result.rows_affected == 1 {
            info!("Pattern {} is now {} after {}", pattern_id, reloaded.status, action);
            return Ok(reloaded);
        }

        warn!(
            "Pattern {} changed from {} to {} before {}, retrying",
            pattern_id, current.status, reloaded.status, action
        );
        current = reloaded;
    }
}

async fn find_pattern<C: ConnectionTrait>(db: &C, pattern_id: i32) -> Result<recurring_pattern::Model> {
    recurring_pattern::Entity::find_by_id(pattern_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ComputeError::Database(DbErr::RecordNotFound(format!(
                "Recurring pattern {} not found",
                pattern_id
            )))
        })
}
