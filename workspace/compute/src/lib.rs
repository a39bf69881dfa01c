//! Member financial reconciliation for the meal tracker.
//!
//! The engine takes a household's meal records, deposits, and grocery
//! ("bazar") spend for an optional calendar month, derives the system-wide
//! meal rate, and nets each member's deposits against their share of the
//! spend. Data arrives through the [`source::FinancialDataSource`] seam with
//! a pre-aggregated primary tier and a raw-record fallback tier.

pub mod db;
pub mod error;
pub mod month;
pub mod reconcile;
pub mod source;
pub mod testing;

pub use db::DbFinancialSource;
pub use error::{ComputeError, Result};
pub use month::MonthFilter;
pub use reconcile::{compute_member_financials, reconcile};
pub use source::{FinancialDataSource, MemberTotals, Sourced};
