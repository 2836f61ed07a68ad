use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use std::fmt;
use std::str::FromStr;

pub use super::transaction::TransactionType;

/// How often a recurring pattern fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Frequency {
    #[sea_orm(string_value = "DAILY")]
    Daily,
    /// Anchored on `day_of_week`.
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    #[sea_orm(string_value = "BIWEEKLY")]
    Biweekly,
    /// Anchored on `day_of_month`.
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
    #[sea_orm(string_value = "QUARTERLY")]
    Quarterly,
    #[sea_orm(string_value = "YEARLY")]
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "BIWEEKLY" => Ok(Frequency::Biweekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            "YEARLY" => Ok(Frequency::Yearly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}

/// Lifecycle state of a recurring pattern.
///
/// Replaces the `is_active` / `is_paused` flag pair so that an inactive
/// pattern can never also be paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum PatternStatus {
    /// Generates whenever `next_generation_date` is due.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Frozen; `next_generation_date` is kept as is.
    #[sea_orm(string_value = "PAUSED")]
    Paused,
    /// Terminal. Either deactivated explicitly or expired past `end_date`.
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
}

impl PatternStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternStatus::Active => "ACTIVE",
            PatternStatus::Paused => "PAUSED",
            PatternStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for PatternStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring obligation of a household (rent, salary, subscriptions).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_patterns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub household_id: i32,
    /// Account the generated transactions are booked on. Not a foreign key:
    /// the account may disappear while the pattern lives on.
    pub account_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub transaction_type: TransactionType,
    /// Always positive.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    /// Last date an occurrence may fall on. If null, repeats indefinitely.
    pub end_date: Option<NaiveDate>,
    /// 1-31, set only for monthly patterns.
    pub day_of_month: Option<i32>,
    /// 0-6 with 0 = Sunday, set only for weekly patterns.
    pub day_of_week: Option<i32>,
    /// The occurrence the generation runner will materialize next.
    pub next_generation_date: NaiveDate,
    /// Run date of the last successful generation.
    pub last_generated_date: Option<NaiveDate>,
    pub status: PatternStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::household::Entity",
        from = "Column::HouseholdId",
        to = "super::household::Column::Id",
        on_delete = "Cascade"
    )]
    Household,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
}

impl Related<super::household::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Household.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status != PatternStatus::Inactive
    }

    pub fn is_paused(&self) -> bool {
        self.status == PatternStatus::Paused
    }

    /// Whether the runner should materialize an occurrence on `as_of`.
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.status == PatternStatus::Active && self.next_generation_date <= as_of
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now().naive_utc();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
