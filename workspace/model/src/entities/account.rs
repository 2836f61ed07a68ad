use sea_orm::entity::prelude::*;

/// A bank-like account shared by the members of a household.
///
/// Recurring patterns point at an account by id only; the account may be
/// closed or removed later, in which case generation for the pattern fails
/// and is recorded in the generation log.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The household that owns this account.
    pub household_id: i32,
    pub name: String,
    /// ISO 4217 currency code, e.g., "USD", "EUR".
    pub currency_code: String,
    /// A closed account accepts no new transactions.
    #[sea_orm(default_value = "false")]
    pub is_closed: bool,
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

impl ActiveModelBehavior for ActiveModel {}
