//! Common transport-layer types shared across the workspace.
//! These structs mirror the backend handlers' response payloads so the
//! compute crate can produce them directly and the handlers can serialize
//! them without duplicating shapes.

mod financials;

pub use financials::{
    BalanceStatus, FinancialReport, FinancialSummary, MealAggregateStats, MemberFinancials,
};
