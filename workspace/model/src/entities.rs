//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the meal/expense tracking application here:
//! households scope everything, members eat meals and deposit funds, and
//! bazar expenses record the household's grocery spend.

pub mod bazar_expense;
pub mod deposit;
pub mod household;
pub mod meal_record;
pub mod member;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::bazar_expense::Entity as BazarExpense;
    pub use super::deposit::Entity as Deposit;
    pub use super::household::Entity as Household;
    pub use super::meal_record::Entity as MealRecord;
    pub use super::member::Entity as Member;
}
