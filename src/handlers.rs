pub mod bazar;
pub mod deposits;
pub mod financials;
pub mod health;
pub mod households;
pub mod meals;
pub mod members;
