use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{
    account, category, household, recurring_pattern, recurring_transaction_log, transaction,
};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create recurring_patterns table. Account and category are plain
        // columns: generation reports a missing account as a failed attempt.
        manager
            .create_table(
                Table::create()
                    .table(RecurringPattern::table())
                    .if_not_exists()
                    .col(pk_auto(RecurringPattern::column(recurring_pattern::Column::Id)))
                    .col(integer(RecurringPattern::column(recurring_pattern::Column::HouseholdId)))
                    .col(integer(RecurringPattern::column(recurring_pattern::Column::AccountId)))
                    .col(integer_null(RecurringPattern::column(recurring_pattern::Column::CategoryId)))
                    .col(string(RecurringPattern::column(recurring_pattern::Column::Name)))
                    .col(string_null(RecurringPattern::column(recurring_pattern::Column::Description)))
                    .col(
                        string(RecurringPattern::column(recurring_pattern::Column::Frequency))
                            .string_len(10),
                    )
                    .col(
                        string(RecurringPattern::column(recurring_pattern::Column::TransactionType))
                            .string_len(6),
                    )
                    .col(
                        decimal(RecurringPattern::column(recurring_pattern::Column::Amount))
                            .decimal_len(16, 4),
                    )
                    .col(date(RecurringPattern::column(recurring_pattern::Column::StartDate)))
                    .col(date_null(RecurringPattern::column(recurring_pattern::Column::EndDate)))
                    .col(integer_null(RecurringPattern::column(recurring_pattern::Column::DayOfMonth)))
                    .col(integer_null(RecurringPattern::column(recurring_pattern::Column::DayOfWeek)))
                    .col(date(RecurringPattern::column(
                        recurring_pattern::Column::NextGenerationDate,
                    )))
                    .col(date_null(RecurringPattern::column(
                        recurring_pattern::Column::LastGeneratedDate,
                    )))
                    .col(
                        string(RecurringPattern::column(recurring_pattern::Column::Status))
                            .string_len(8),
                    )
                    .col(date_time(RecurringPattern::column(recurring_pattern::Column::CreatedAt)))
                    .col(date_time(RecurringPattern::column(recurring_pattern::Column::UpdatedAt)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_patterns_household")
                            .from(
                                RecurringPattern::table(),
                                RecurringPattern::column(recurring_pattern::Column::HouseholdId),
                            )
                            .to(Household::table(), Household::column(household::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The generation runner scans for due active patterns
        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_patterns_due")
                    .table(RecurringPattern::table())
                    .col(RecurringPattern::column(recurring_pattern::Column::Status))
                    .col(RecurringPattern::column(
                        recurring_pattern::Column::NextGenerationDate,
                    ))
                    .to_owned(),
            )
            .await?;

        // Create transactions table
        manager
            .create_table(
                Table::create()
                    .table(Transaction::table())
                    .if_not_exists()
                    .col(pk_auto(Transaction::column(transaction::Column::Id)))
                    .col(integer(Transaction::column(transaction::Column::AccountId)))
                    .col(integer_null(Transaction::column(transaction::Column::CategoryId)))
                    .col(integer_null(Transaction::column(
                        transaction::Column::RecurringPatternId,
                    )))
                    .col(
                        string(Transaction::column(transaction::Column::TransactionType))
                            .string_len(6),
                    )
                    .col(decimal(Transaction::column(transaction::Column::Amount)).decimal_len(16, 4))
                    .col(date(Transaction::column(transaction::Column::Date)))
                    .col(string_null(Transaction::column(transaction::Column::Description)))
                    .col(date_time(Transaction::column(transaction::Column::CreatedAt)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_account")
                            .from(Transaction::table(), Transaction::column(transaction::Column::AccountId))
                            .to(Account::table(), Account::column(account::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_category")
                            .from(Transaction::table(), Transaction::column(transaction::Column::CategoryId))
                            .to(Category::table(), Category::column(category::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_recurring_pattern")
                            .from(
                                Transaction::table(),
                                Transaction::column(transaction::Column::RecurringPatternId),
                            )
                            .to(
                                RecurringPattern::table(),
                                RecurringPattern::column(recurring_pattern::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recurring_transaction_logs table. No foreign keys: the audit
        // trail outlives both the pattern and the transaction it references.
        manager
            .create_table(
                Table::create()
                    .table(RecurringTransactionLog::table())
                    .if_not_exists()
                    .col(pk_auto(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::Id,
                    )))
                    .col(integer(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::RecurringPatternId,
                    )))
                    .col(integer_null(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::TransactionId,
                    )))
                    .col(date(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::GeneratedDate,
                    )))
                    .col(
                        string(RecurringTransactionLog::column(
                            recurring_transaction_log::Column::Status,
                        ))
                        .string_len(7),
                    )
                    .col(text_null(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::ErrorMessage,
                    )))
                    .col(date_time(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::CreatedAt,
                    )))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_transaction_logs_pattern")
                    .table(RecurringTransactionLog::table())
                    .col(RecurringTransactionLog::column(
                        recurring_transaction_log::Column::RecurringPatternId,
                    ))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringTransactionLog::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transaction::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringPattern::table()).to_owned())
            .await?;

        Ok(())
    }
}
