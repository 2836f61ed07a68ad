use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{account, category, household};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create households table
        manager
            .create_table(
                Table::create()
                    .table(Household::table())
                    .if_not_exists()
                    .col(pk_auto(Household::column(household::Column::Id)))
                    .col(string(Household::column(household::Column::Name)))
                    .col(date_time(Household::column(household::Column::CreatedAt)))
                    .to_owned(),
            )
            .await?;

        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Account::table())
                    .if_not_exists()
                    .col(pk_auto(Account::column(account::Column::Id)))
                    .col(integer(Account::column(account::Column::HouseholdId)))
                    .col(string(Account::column(account::Column::Name)))
                    .col(string(Account::column(account::Column::CurrencyCode)).string_len(3))
                    .col(boolean(Account::column(account::Column::IsClosed)).default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_household")
                            .from(Account::table(), Account::column(account::Column::HouseholdId))
                            .to(Household::table(), Household::column(household::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Category::table())
                    .if_not_exists()
                    .col(pk_auto(Category::column(category::Column::Id)))
                    .col(integer(Category::column(category::Column::HouseholdId)))
                    .col(string(Category::column(category::Column::Name)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_household")
                            .from(Category::table(), Category::column(category::Column::HouseholdId))
                            .to(Household::table(), Household::column(household::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Category names are unique within a household
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_household_name")
                    .table(Category::table())
                    .col(Category::column(category::Column::HouseholdId))
                    .col(Category::column(category::Column::Name))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Category::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Account::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Household::table()).to_owned())
            .await?;

        Ok(())
    }
}
