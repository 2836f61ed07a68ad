use common::{
    AccountDto, CategoryDto, GenerationLogDto, GenerationReportDto, HouseholdDto, PatternRunDto,
    RecurringPatternDto, TransactionDto,
};
use compute::{GenerationOutcome, GenerationReport, PatternRun};
use model::entities::{
    account, category, household, recurring_pattern, recurring_transaction_log, transaction,
};

pub fn household_to_dto(model: household::Model) -> HouseholdDto {
    HouseholdDto {
        id: model.id,
        name: model.name,
        created_at: model.created_at,
    }
}

pub fn account_to_dto(model: account::Model) -> AccountDto {
    AccountDto {
        id: model.id,
        household_id: model.household_id,
        name: model.name,
        currency_code: model.currency_code,
        is_closed: model.is_closed,
    }
}

pub fn category_to_dto(model: category::Model) -> CategoryDto {
    CategoryDto {
        id: model.id,
        household_id: model.household_id,
        name: model.name,
    }
}

pub fn transaction_to_dto(model: transaction::Model) -> TransactionDto {
    TransactionDto {
        id: model.id,
        account_id: model.account_id,
        category_id: model.category_id,
        recurring_pattern_id: model.recurring_pattern_id,
        transaction_type: model.transaction_type.to_string(),
        amount: model.amount,
        date: model.date,
        description: model.description,
        created_at: model.created_at,
    }
}

pub fn pattern_to_dto(model: recurring_pattern::Model) -> RecurringPatternDto {
    let is_active = model.is_active();
    let is_paused = model.is_paused();
    RecurringPatternDto {
        id: model.id,
        household_id: model.household_id,
        account_id: model.account_id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        frequency: model.frequency.to_string(),
        transaction_type: model.transaction_type.to_string(),
        amount: model.amount,
        start_date: model.start_date,
        end_date: model.end_date,
        day_of_month: model.day_of_month,
        day_of_week: model.day_of_week,
        next_generation_date: model.next_generation_date,
        last_generated_date: model.last_generated_date,
        status: model.status.to_string(),
        is_active,
        is_paused,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn log_to_dto(model: recurring_transaction_log::Model) -> GenerationLogDto {
    GenerationLogDto {
        id: model.id,
        recurring_pattern_id: model.recurring_pattern_id,
        transaction_id: model.transaction_id,
        generated_date: model.generated_date,
        status: model.status.to_string(),
        error_message: model.error_message,
        created_at: model.created_at,
    }
}

fn run_to_dto(run: &PatternRun) -> PatternRunDto {
    let (transaction_id, next_generation_date, deactivated, error) = match &run.outcome {
        GenerationOutcome::Generated {
            transaction_id,
            next_generation_date,
            deactivated,
        } => (Some(*transaction_id), Some(*next_generation_date), *deactivated, None),
        GenerationOutcome::Failed {
            error,
            next_generation_date,
            deactivated,
        } => (None, Some(*next_generation_date), *deactivated, Some(error.clone())),
        GenerationOutcome::Skipped => (None, None, true, None),
        GenerationOutcome::AlreadyProcessed => (None, None, false, None),
        GenerationOutcome::Aborted { error } => (None, None, false, Some(error.clone())),
    };

    PatternRunDto {
        pattern_id: run.pattern_id,
        occurrence: run.occurrence,
        outcome: run.outcome.as_str().to_string(),
        transaction_id,
        next_generation_date,
        deactivated,
        error,
    }
}

pub fn report_to_dto(report: &GenerationReport) -> GenerationReportDto {
    GenerationReportDto {
        as_of: report.as_of,
        processed: report.processed(),
        generated: report.generated(),
        failed: report.failed(),
        skipped: report.skipped(),
        runs: report.runs.iter().map(run_to_dto).collect(),
    }
}
