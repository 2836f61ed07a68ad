use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use model::entities::{account, household, recurring_pattern};
use model::entities::recurring_pattern::{Frequency, PatternStatus, TransactionType};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

use crate::recurrence::Schedule;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await.unwrap();
    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

/// Fresh database with one household owning one open USD account.
pub async fn setup_household() -> (DatabaseConnection, i32, i32) {
    static HOUSEHOLD_ID: AtomicU64 = AtomicU64::new(0);
    let current_id = HOUSEHOLD_ID.fetch_add(1, Ordering::SeqCst);

    let db = setup_db().await;
    let household = household::ActiveModel {
        name: Set(format!("Household {}", current_id)),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let account = account::ActiveModel {
        household_id: Set(household.id),
        name: Set("Checking".to_string()),
        currency_code: Set("USD".to_string()),
        is_closed: Set(false),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    (db, household.id, account.id)
}

pub async fn insert_pattern(
    db: &DatabaseConnection,
    household_id: i32,
    account_id: i32,
    frequency: Frequency,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    day_of_month: Option<i32>,
    day_of_week: Option<i32>,
) -> recurring_pattern::Model {
    let schedule = Schedule::new(frequency, start_date, day_of_month, day_of_week).unwrap();
    recurring_pattern::ActiveModel {
        household_id: Set(household_id),
        account_id: Set(account_id),
        category_id: Set(None),
        name: Set(format!("{} bill", frequency)),
        description: Set(None),
        frequency: Set(frequency),
        transaction_type: Set(TransactionType::Debit),
        amount: Set(Decimal::new(120000, 2)),
        start_date: Set(start_date),
        end_date: Set(end_date),
        day_of_month: Set(day_of_month),
        day_of_week: Set(day_of_week),
        next_generation_date: Set(schedule.first_occurrence(start_date).unwrap()),
        last_generated_date: Set(None),
        status: Set(PatternStatus::Active),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_monthly_pattern(
    db: &DatabaseConnection,
    household_id: i32,
    account_id: i32,
    start_date: NaiveDate,
    day_of_month: i32,
) -> recurring_pattern::Model {
    insert_pattern(
        db,
        household_id,
        account_id,
        Frequency::Monthly,
        start_date,
        None,
        Some(day_of_month),
        None,
    )
    .await
}
