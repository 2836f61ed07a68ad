use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use std::fmt;

/// Result of one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum LogStatus {
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "SKIPPED")]
    Skipped,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "SUCCESS",
            LogStatus::Failed => "FAILED",
            LogStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per generation attempt of a recurring pattern.
///
/// The table is an append-only audit trail. It has no foreign key to the
/// pattern, so rows stay queryable by `recurring_pattern_id` after the
/// pattern itself is deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_transaction_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub recurring_pattern_id: i32,
    /// The transaction produced by a successful attempt.
    pub transaction_id: Option<i32>,
    /// The occurrence date the attempt was made for.
    pub generated_date: NaiveDate,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            return Err(DbErr::Custom(
                "recurring transaction logs are append-only".to_string(),
            ));
        }
        self.created_at = Set(chrono::Utc::now().naive_utc());
        Ok(self)
    }

    async fn before_delete<C>(self, _db: &C) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        Err(DbErr::Custom(
            "recurring transaction logs are append-only".to_string(),
        ))
    }
}
