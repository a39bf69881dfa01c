//! Member financial reconciliation.
//!
//! Given per-member meal/deposit totals and the household's aggregate grocery
//! spend for an optional month window, derives the global meal rate and every
//! member's cost, remaining balance, and status. The arithmetic core
//! ([`reconcile`]) is a pure function; [`compute_member_financials`] wraps it
//! with the two-tier data sourcing described in the source module.

use std::collections::HashMap;

use common::{BalanceStatus, FinancialReport, FinancialSummary, MemberFinancials};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::month::MonthFilter;
use crate::source::{FinancialDataSource, MemberTotals, Sourced};

/// Runs a full reconciliation against `source` for one household.
///
/// The per-member basis comes from the pre-aggregated summary endpoint when it
/// yields rows; otherwise it is rebuilt from the raw member/meal/deposit
/// lists, filtered to the requested calendar month in-process. The bazar
/// total degrades the same way, from the aggregate endpoint to a sum over raw
/// purchase records. Independent fetches run concurrently; the engine holds
/// no state between calls and performs no writes.
#[instrument(skip(source))]
pub async fn compute_member_financials(
    source: &dyn FinancialDataSource,
    household_id: i32,
    month: Option<MonthFilter>,
) -> Result<FinancialReport> {
    let (summary, bazar_total) = tokio::join!(
        source.member_financial_summary(household_id, month),
        resolve_bazar_total(source, household_id, month),
    );
    let bazar_total = bazar_total?;

    let basis = match summary {
        Ok(Sourced::Available(rows)) if !rows.is_empty() => {
            debug!(rows = rows.len(), "using pre-aggregated member summary");
            rows
        }
        Ok(_) => {
            debug!("member summary empty, aggregating from raw records");
            aggregate_from_raw(source, household_id, month).await?
        }
        Err(err) => {
            warn!(%err, "member summary fetch failed, aggregating from raw records");
            aggregate_from_raw(source, household_id, month).await?
        }
    };

    Ok(reconcile(basis, bazar_total, month))
}

/// The pure arithmetic core: no I/O, deterministic for identical inputs.
///
/// The meal rate is system-wide, never per-member; when no meals were eaten
/// in scope the rate is zero rather than a division error. Members are
/// returned sorted by remaining balance descending (surplus first).
pub fn reconcile(
    basis: Vec<MemberTotals>,
    total_bazar_cost: Decimal,
    month: Option<MonthFilter>,
) -> FinancialReport {
    let filtered_by_month = month.map(|m| m.to_string());

    if basis.is_empty() {
        return FinancialReport {
            members: Vec::new(),
            summary: FinancialSummary {
                total_bazar_cost: Decimal::ZERO,
                total_meals: 0,
                meal_rate: Decimal::ZERO,
                total_members: 0,
                members_in_surplus: 0,
                members_in_deficit: 0,
                total_deposits: Decimal::ZERO,
                total_meal_cost: Decimal::ZERO,
                total_remaining: Decimal::ZERO,
                filtered_by_month,
            },
        };
    }

    let total_meals: i64 = basis.iter().map(|b| b.total_meals).sum();
    let meal_rate = if total_meals > 0 {
        total_bazar_cost / Decimal::from(total_meals)
    } else {
        Decimal::ZERO
    };

    let mut members: Vec<MemberFinancials> = basis
        .into_iter()
        .map(|b| {
            let meal_cost = Decimal::from(b.total_meals) * meal_rate;
            let remaining_balance = b.total_deposits - meal_cost;
            let status = if remaining_balance >= Decimal::ZERO {
                BalanceStatus::Positive
            } else {
                BalanceStatus::Negative
            };
            MemberFinancials {
                member_id: b.member_id,
                name: b.name,
                total_meals: b.total_meals,
                total_deposits: b.total_deposits,
                meal_cost,
                remaining_balance,
                status,
            }
        })
        .collect();

    // Surplus members first.
    members.sort_by(|a, b| b.remaining_balance.cmp(&a.remaining_balance));

    let members_in_surplus = members
        .iter()
        .filter(|m| m.status == BalanceStatus::Positive)
        .count();
    let summary = FinancialSummary {
        total_bazar_cost,
        total_meals,
        meal_rate,
        total_members: members.len(),
        members_in_surplus,
        members_in_deficit: members.len() - members_in_surplus,
        total_deposits: members.iter().map(|m| m.total_deposits).sum(),
        total_meal_cost: members.iter().map(|m| m.meal_cost).sum(),
        total_remaining: members.iter().map(|m| m.remaining_balance).sum(),
        filtered_by_month,
    };

    FinancialReport { members, summary }
}

/// Aggregate grocery spend, preferring the summary endpoint and degrading to
/// a sum over raw purchase records filtered by calendar month.
#[instrument(skip(source))]
async fn resolve_bazar_total(
    source: &dyn FinancialDataSource,
    household_id: i32,
    month: Option<MonthFilter>,
) -> Result<Decimal> {
    match source.grocery_expense_summary(household_id, month).await {
        Ok(Sourced::Available(total)) => return Ok(total),
        Ok(Sourced::Unavailable) => {
            debug!("grocery summary unavailable, summing raw bazar records");
        }
        Err(err) => {
            warn!(%err, "grocery summary fetch failed, summing raw bazar records");
        }
    }

    let records = source.bazar_expense_records(household_id).await?;
    Ok(records
        .into_iter()
        .filter(|r| month.is_none_or(|m| m.contains(r.date)))
        .map(|r| r.total_cost)
        .sum())
}

/// Fallback basis: fetch raw member/meal/deposit lists concurrently, filter
/// meals and deposits to the requested month, and group totals per member.
/// Members without records in scope still appear, zero-valued.
#[instrument(skip(source))]
async fn aggregate_from_raw(
    source: &dyn FinancialDataSource,
    household_id: i32,
    month: Option<MonthFilter>,
) -> Result<Vec<MemberTotals>> {
    let (members, meals, deposits) = tokio::join!(
        source.members(household_id),
        source.meal_records(household_id),
        source.deposit_records(household_id),
    );
    let members = members?;
    let meals = meals?;
    let deposits = deposits?.into_rows()?;

    let mut meal_totals: HashMap<i32, i64> = HashMap::new();
    for record in meals
        .iter()
        .filter(|r| month.is_none_or(|m| m.contains(r.date)))
    {
        *meal_totals.entry(record.member_id).or_insert(0) += record.total_count();
    }

    let mut deposit_totals: HashMap<i32, Decimal> = HashMap::new();
    for deposit in deposits
        .iter()
        .filter(|d| month.is_none_or(|m| m.contains(d.date)))
    {
        *deposit_totals.entry(deposit.member_id).or_insert(Decimal::ZERO) += deposit.amount;
    }

    Ok(members
        .into_iter()
        .map(|m| MemberTotals {
            total_meals: meal_totals.get(&m.id).copied().unwrap_or(0),
            total_deposits: deposit_totals.get(&m.id).copied().unwrap_or(Decimal::ZERO),
            member_id: m.id,
            name: m.name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BazarExpenseRow, DepositRow, DepositsPayload, MealRecordRow, MemberRow};
    use crate::testing::StaticFinancialSource;
    use chrono::NaiveDate;

    fn totals(member_id: i32, name: &str, meals: i64, deposits: Decimal) -> MemberTotals {
        MemberTotals {
            member_id,
            name: name.to_string(),
            total_meals: meals,
            total_deposits: deposits,
        }
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_rate_and_balances() {
        // Two members, 40 meals total, 400 spent: rate is exactly 10.
        let report = reconcile(
            vec![
                totals(1, "Alice", 10, dec(500)),
                totals(2, "Bob", 30, dec(300)),
            ],
            dec(400),
            None,
        );

        assert_eq!(report.summary.meal_rate, dec(10));
        assert_eq!(report.summary.total_meals, 40);

        // Sorted by remaining balance descending: Alice (400) before Bob (0).
        assert_eq!(report.members[0].member_id, 1);
        assert_eq!(report.members[0].meal_cost, dec(100));
        assert_eq!(report.members[0].remaining_balance, dec(400));
        assert_eq!(report.members[0].status, BalanceStatus::Positive);

        assert_eq!(report.members[1].member_id, 2);
        assert_eq!(report.members[1].meal_cost, dec(300));
        assert_eq!(report.members[1].remaining_balance, dec(0));
        // Zero balance counts as positive.
        assert_eq!(report.members[1].status, BalanceStatus::Positive);

        assert_eq!(report.summary.members_in_surplus, 2);
        assert_eq!(report.summary.members_in_deficit, 0);
    }

    #[test]
    fn test_zero_meals_means_zero_rate() {
        // Spend with no meals must not divide by zero.
        let report = reconcile(
            vec![totals(1, "Alice", 0, dec(100)), totals(2, "Bob", 0, dec(0))],
            Decimal::new(15000, 2),
            None,
        );

        assert_eq!(report.summary.meal_rate, Decimal::ZERO);
        assert_eq!(report.summary.total_bazar_cost, Decimal::new(15000, 2));
        for member in &report.members {
            assert_eq!(member.meal_cost, Decimal::ZERO);
        }
    }

    #[test]
    fn test_empty_basis_zeroes_summary() {
        let month = MonthFilter::new(2024, 3);
        let report = reconcile(Vec::new(), dec(250), month);

        assert!(report.members.is_empty());
        assert_eq!(report.summary.total_bazar_cost, Decimal::ZERO);
        assert_eq!(report.summary.total_meals, 0);
        assert_eq!(report.summary.total_members, 0);
        assert_eq!(report.summary.filtered_by_month.as_deref(), Some("2024-03"));
    }

    #[test]
    fn test_balance_identity_and_partition() {
        let basis = vec![
            totals(1, "A", 7, Decimal::new(12345, 2)),
            totals(2, "B", 13, Decimal::new(987, 2)),
            totals(3, "C", 0, Decimal::ZERO),
            totals(4, "D", 21, Decimal::new(50000, 2)),
        ];
        let report = reconcile(basis, Decimal::new(41170, 2), None);

        for member in &report.members {
            assert_eq!(
                member.remaining_balance,
                member.total_deposits - member.meal_cost
            );
        }
        assert_eq!(
            report.summary.members_in_surplus + report.summary.members_in_deficit,
            report.summary.total_members
        );
        // Non-increasing by remaining balance.
        for pair in report.members.windows(2) {
            assert!(pair[0].remaining_balance >= pair[1].remaining_balance);
        }
        // Meal costs redistribute the full bazar spend.
        let cost_sum: Decimal = report.members.iter().map(|m| m.meal_cost).sum();
        assert!((cost_sum - Decimal::new(41170, 2)).abs() < Decimal::new(1, 2));
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let basis = vec![
            totals(1, "A", 11, Decimal::new(2000, 1)),
            totals(2, "B", 3, Decimal::new(750, 1)),
        ];
        let first = reconcile(basis.clone(), dec(95), None);
        let second = reconcile(basis, dec(95), None);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_engine_uses_primary_summary() {
        let source = StaticFinancialSource {
            member_summary: Some(vec![
                totals(1, "Alice", 10, dec(500)),
                totals(2, "Bob", 30, dec(300)),
            ]),
            grocery_summary: Some(dec(400)),
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, None).await.unwrap();
        assert_eq!(report.summary.meal_rate, dec(10));
        assert_eq!(report.summary.total_members, 2);
    }

    #[tokio::test]
    async fn test_engine_falls_back_when_primary_empty() {
        // Primary returns an empty collection; raw records carry the data.
        let source = StaticFinancialSource {
            member_summary: Some(Vec::new()),
            grocery_summary: Some(dec(90)),
            members: vec![
                MemberRow {
                    id: 1,
                    name: "Alice".to_string(),
                },
                MemberRow {
                    id: 2,
                    name: "Bob".to_string(),
                },
            ],
            meals: vec![
                MealRecordRow {
                    member_id: 1,
                    date: date(2024, 3, 5),
                    breakfast: 1,
                    lunch: 1,
                    dinner: 1,
                },
                MealRecordRow {
                    member_id: 2,
                    date: date(2024, 3, 6),
                    breakfast: 0,
                    lunch: 3,
                    dinner: 3,
                },
            ],
            deposits: DepositsPayload::Rows(vec![
                DepositRow {
                    member_id: 1,
                    date: date(2024, 3, 1),
                    amount: dec(100),
                },
                DepositRow {
                    member_id: 2,
                    date: date(2024, 3, 2),
                    amount: dec(20),
                },
            ]),
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, None).await.unwrap();
        assert_eq!(report.summary.total_members, 2);
        assert_eq!(report.summary.total_meals, 9);
        assert_eq!(report.summary.meal_rate, dec(10));

        let alice = report.members.iter().find(|m| m.member_id == 1).unwrap();
        assert_eq!(alice.total_meals, 3);
        assert_eq!(alice.meal_cost, dec(30));
        assert_eq!(alice.remaining_balance, dec(70));

        let bob = report.members.iter().find(|m| m.member_id == 2).unwrap();
        assert_eq!(bob.remaining_balance, dec(-40));
        assert_eq!(bob.status, BalanceStatus::Negative);
    }

    #[tokio::test]
    async fn test_engine_falls_back_when_primary_fails() {
        let source = StaticFinancialSource {
            member_summary_fails: true,
            grocery_summary: Some(dec(0)),
            members: vec![MemberRow {
                id: 7,
                name: "Carol".to_string(),
            }],
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, None).await.unwrap();
        assert_eq!(report.summary.total_members, 1);
        assert_eq!(report.members[0].name, "Carol");
        assert_eq!(report.members[0].total_meals, 0);
    }

    #[tokio::test]
    async fn test_fallback_filters_by_month() {
        let source = StaticFinancialSource {
            grocery_summary: Some(dec(30)),
            members: vec![MemberRow {
                id: 1,
                name: "Alice".to_string(),
            }],
            meals: vec![
                MealRecordRow {
                    member_id: 1,
                    date: date(2024, 3, 5),
                    breakfast: 1,
                    lunch: 1,
                    dinner: 1,
                },
                // Outside the filtered month, must be excluded.
                MealRecordRow {
                    member_id: 1,
                    date: date(2024, 4, 1),
                    breakfast: 5,
                    lunch: 5,
                    dinner: 5,
                },
            ],
            deposits: DepositsPayload::Rows(vec![
                DepositRow {
                    member_id: 1,
                    date: date(2024, 3, 1),
                    amount: dec(45),
                },
                DepositRow {
                    member_id: 1,
                    date: date(2024, 2, 28),
                    amount: dec(500),
                },
            ]),
            ..Default::default()
        };

        let month = MonthFilter::new(2024, 3);
        let report = compute_member_financials(&source, 1, month).await.unwrap();
        assert_eq!(report.summary.total_meals, 3);
        assert_eq!(report.summary.meal_rate, dec(10));
        assert_eq!(report.members[0].total_deposits, dec(45));
        assert_eq!(report.members[0].remaining_balance, dec(15));
        assert_eq!(report.summary.filtered_by_month.as_deref(), Some("2024-03"));
    }

    #[tokio::test]
    async fn test_bazar_total_falls_back_to_raw_records() {
        let source = StaticFinancialSource {
            member_summary: Some(vec![totals(1, "Alice", 4, dec(100))]),
            // No grocery summary: the engine must sum raw records in-month.
            grocery_summary: None,
            bazar: vec![
                BazarExpenseRow {
                    date: date(2024, 3, 9),
                    total_cost: dec(25),
                },
                BazarExpenseRow {
                    date: date(2024, 3, 20),
                    total_cost: dec(15),
                },
                BazarExpenseRow {
                    date: date(2024, 2, 1),
                    total_cost: dec(999),
                },
            ],
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, MonthFilter::new(2024, 3))
            .await
            .unwrap();
        assert_eq!(report.summary.total_bazar_cost, dec(40));
        assert_eq!(report.summary.meal_rate, dec(10));
    }

    #[tokio::test]
    async fn test_malformed_deposits_shape_is_fatal() {
        let source = StaticFinancialSource {
            grocery_summary: Some(dec(10)),
            members: vec![MemberRow {
                id: 1,
                name: "Alice".to_string(),
            }],
            deposits: DepositsPayload::Wrapped { deposits: None },
            ..Default::default()
        };

        let err = compute_member_financials(&source, 1, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Deposits data is not an array");
    }

    #[tokio::test]
    async fn test_wrapped_deposits_are_extracted() {
        let source = StaticFinancialSource {
            grocery_summary: Some(dec(0)),
            members: vec![MemberRow {
                id: 1,
                name: "Alice".to_string(),
            }],
            deposits: DepositsPayload::Wrapped {
                deposits: Some(vec![DepositRow {
                    member_id: 1,
                    date: date(2024, 3, 1),
                    amount: dec(75),
                }]),
            },
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, None).await.unwrap();
        assert_eq!(report.members[0].total_deposits, dec(75));
    }

    #[tokio::test]
    async fn test_no_members_anywhere_is_zeroed_success() {
        let source = StaticFinancialSource {
            grocery_summary: Some(dec(120)),
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, MonthFilter::new(2024, 5))
            .await
            .unwrap();
        assert!(report.members.is_empty());
        assert_eq!(report.summary.total_bazar_cost, Decimal::ZERO);
        assert_eq!(report.summary.filtered_by_month.as_deref(), Some("2024-05"));
    }

    #[tokio::test]
    async fn test_engine_is_idempotent() {
        let source = StaticFinancialSource {
            member_summary: Some(vec![
                totals(1, "Alice", 10, dec(500)),
                totals(2, "Bob", 30, dec(300)),
            ]),
            grocery_summary: Some(dec(400)),
            ..Default::default()
        };

        let first = compute_member_financials(&source, 1, None).await.unwrap();
        let second = compute_member_financials(&source, 1, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_inexact_rate_still_redistributes_spend() {
        // 3 meals for 100 units: the rate is periodic, the redistribution
        // property holds within rounding tolerance.
        let source = StaticFinancialSource {
            member_summary: Some(vec![
                totals(1, "Alice", 1, dec(40)),
                totals(2, "Bob", 2, dec(60)),
            ]),
            grocery_summary: Some(dec(100)),
            ..Default::default()
        };

        let report = compute_member_financials(&source, 1, None).await.unwrap();
        let cost_sum: Decimal = report.members.iter().map(|m| m.meal_cost).sum();
        assert!((cost_sum - dec(100)).abs() < Decimal::new(1, 2));
    }
}
