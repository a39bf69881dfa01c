//! In-memory [`FinancialDataSource`] used by the engine's tests.
//!
//! Every tier can be pointed at fixed data, marked unavailable, or made to
//! fail, so fallback resolution can be exercised without a database.

use async_trait::async_trait;
use common::MealAggregateStats;
use rust_decimal::Decimal;

use crate::error::{ComputeError, Result};
use crate::month::MonthFilter;
use crate::source::{
    BazarExpenseRow, DepositsPayload, FinancialDataSource, MealRecordRow, MemberRow, MemberTotals,
    Sourced,
};

/// A data source serving canned responses.
///
/// `member_summary`/`grocery_summary` of `None` mean the endpoint answers
/// `Unavailable`; the `*_fails` flags make the fetch itself fail.
#[derive(Debug, Clone, Default)]
pub struct StaticFinancialSource {
    pub member_summary: Option<Vec<MemberTotals>>,
    pub member_summary_fails: bool,
    pub grocery_summary: Option<Decimal>,
    pub grocery_summary_fails: bool,
    pub members: Vec<MemberRow>,
    pub meals: Vec<MealRecordRow>,
    pub deposits: DepositsPayload,
    pub bazar: Vec<BazarExpenseRow>,
}

#[async_trait]
impl FinancialDataSource for StaticFinancialSource {
    async fn member_financial_summary(
        &self,
        _household_id: i32,
        _month: Option<MonthFilter>,
    ) -> Result<Sourced<Vec<MemberTotals>>> {
        if self.member_summary_fails {
            return Err(ComputeError::Source(
                "member summary endpoint failed".to_string(),
            ));
        }
        Ok(match &self.member_summary {
            Some(rows) => Sourced::Available(rows.clone()),
            None => Sourced::Unavailable,
        })
    }

    async fn grocery_expense_summary(
        &self,
        _household_id: i32,
        _month: Option<MonthFilter>,
    ) -> Result<Sourced<Decimal>> {
        if self.grocery_summary_fails {
            return Err(ComputeError::Source(
                "grocery summary endpoint failed".to_string(),
            ));
        }
        Ok(match self.grocery_summary {
            Some(total) => Sourced::Available(total),
            None => Sourced::Unavailable,
        })
    }

    async fn meal_aggregate_stats(
        &self,
        _household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<MealAggregateStats> {
        let total_meals = self
            .meals
            .iter()
            .filter(|r| month.is_none_or(|m| m.contains(r.date)))
            .map(MealRecordRow::total_count)
            .sum();
        Ok(MealAggregateStats {
            total_meals,
            total_bazar_cost: self.grocery_summary.unwrap_or(Decimal::ZERO),
            today_meals: 0,
        })
    }

    async fn bazar_expense_records(&self, _household_id: i32) -> Result<Vec<BazarExpenseRow>> {
        Ok(self.bazar.clone())
    }

    async fn members(&self, _household_id: i32) -> Result<Vec<MemberRow>> {
        Ok(self.members.clone())
    }

    async fn meal_records(&self, _household_id: i32) -> Result<Vec<MealRecordRow>> {
        Ok(self.meals.clone())
    }

    async fn deposit_records(&self, _household_id: i32) -> Result<DepositsPayload> {
        Ok(self.deposits.clone())
    }
}
