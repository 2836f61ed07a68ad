//! Root of all SeaORM entity modules.
//!
//! Households own accounts, categories and recurring patterns. The generation
//! runner turns due patterns into rows of `transactions` and records every
//! attempt in `recurring_transaction_logs`.

pub mod account;
pub mod category;
pub mod household;
pub mod recurring_pattern;
pub mod recurring_transaction_log;
pub mod transaction;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::category::Entity as Category;
    pub use super::household::Entity as Household;
    pub use super::recurring_pattern::Entity as RecurringPattern;
    pub use super::recurring_transaction_log::Entity as RecurringTransactionLog;
    pub use super::transaction::Entity as Transaction;
}
