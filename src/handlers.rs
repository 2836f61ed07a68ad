pub mod accounts;
pub mod categories;
pub mod generation;
pub mod health;
pub mod households;
pub mod recurring_patterns;
