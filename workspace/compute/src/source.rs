//! The data-source seam of the reconciliation engine.
//!
//! The engine only ever reads. Every read goes through [`FinancialDataSource`],
//! and every read that has a fallback tier reports its outcome as a
//! [`Sourced`] value so the fallback decision is an explicit, testable match
//! rather than nested conditionals.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::MealAggregateStats;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, Result};
use crate::month::MonthFilter;

/// Outcome of a fetch that has a lower-tier fallback. `Unavailable` means the
/// endpoint answered but had nothing usable; a transport-level failure is the
/// `Err` arm of the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sourced<T> {
    Available(T),
    Unavailable,
}

impl<T> Sourced<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Sourced::Available(value) => Some(value),
            Sourced::Unavailable => None,
        }
    }
}

/// A member eligible for meals and deposits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: i32,
    pub name: String,
}

/// One day of meal counts for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRecordRow {
    pub member_id: i32,
    pub date: NaiveDate,
    pub breakfast: i32,
    pub lunch: i32,
    pub dinner: i32,
}

impl MealRecordRow {
    pub fn total_count(&self) -> i64 {
        i64::from(self.breakfast) + i64::from(self.lunch) + i64::from(self.dinner)
    }
}

/// One deposit made by a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRow {
    pub member_id: i32,
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// One grocery purchase for the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BazarExpenseRow {
    pub date: NaiveDate,
    pub total_cost: Decimal,
}

/// Pre-aggregated per-member totals, the basis of the reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTotals {
    pub member_id: i32,
    pub name: String,
    pub total_meals: i64,
    pub total_deposits: Decimal,
}

/// Shape of the raw deposits fetch. Some sources return a bare list, others a
/// wrapper object holding the list; anything else is a shape failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DepositsPayload {
    Rows(Vec<DepositRow>),
    Wrapped { deposits: Option<Vec<DepositRow>> },
}

impl DepositsPayload {
    /// Extracts the deposit list, failing when the wrapper carries none.
    pub fn into_rows(self) -> Result<Vec<DepositRow>> {
        match self {
            DepositsPayload::Rows(rows) => Ok(rows),
            DepositsPayload::Wrapped {
                deposits: Some(rows),
            } => Ok(rows),
            DepositsPayload::Wrapped { deposits: None } => Err(ComputeError::Shape(
                "Deposits data is not an array".to_string(),
            )),
        }
    }
}

impl Default for DepositsPayload {
    fn default() -> Self {
        DepositsPayload::Rows(Vec::new())
    }
}

/// Logical read operations the engine consumes from the external data store.
///
/// The summary endpoints are the primary tier and arrive already scoped and
/// month-filtered; the raw record fetches are the fallback tier and are
/// filtered in the engine by calendar month.
#[async_trait]
pub trait FinancialDataSource: Send + Sync {
    /// Primary basis: per-member meal/deposit totals.
    async fn member_financial_summary(
        &self,
        household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<Sourced<Vec<MemberTotals>>>;

    /// Primary bazar total: aggregate grocery spend.
    async fn grocery_expense_summary(
        &self,
        household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<Sourced<Decimal>>;

    /// Dashboard counters; not an engine input.
    async fn meal_aggregate_stats(
        &self,
        household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<MealAggregateStats>;

    /// Fallback: raw grocery purchase records, unfiltered.
    async fn bazar_expense_records(&self, household_id: i32) -> Result<Vec<BazarExpenseRow>>;

    /// Fallback: full member list.
    async fn members(&self, household_id: i32) -> Result<Vec<MemberRow>>;

    /// Fallback: raw meal records, unfiltered.
    async fn meal_records(&self, household_id: i32) -> Result<Vec<MealRecordRow>>;

    /// Fallback: raw deposit records, unfiltered, list-or-wrapper shaped.
    async fn deposit_records(&self, household_id: i32) -> Result<DepositsPayload>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposits_payload_bare_list() {
        let json = r#"[{"member_id":1,"date":"2024-03-01","amount":"100.00"}]"#;
        let payload: DepositsPayload = serde_json::from_str(json).unwrap();
        let rows = payload.into_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_id, 1);
    }

    #[test]
    fn test_deposits_payload_wrapper() {
        let json = r#"{"deposits":[{"member_id":2,"date":"2024-03-02","amount":"50.00"}]}"#;
        let payload: DepositsPayload = serde_json::from_str(json).unwrap();
        let rows = payload.into_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_id, 2);
    }

    #[test]
    fn test_deposits_payload_malformed_wrapper() {
        // A wrapper object without the expected inner list is a shape failure.
        let json = r#"{"data":[1,2,3]}"#;
        let payload: DepositsPayload = serde_json::from_str(json).unwrap();
        let err = payload.into_rows().unwrap_err();
        assert_eq!(err.to_string(), "Deposits data is not an array");
    }
}
