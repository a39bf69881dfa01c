use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sign of a member's remaining balance. A balance of exactly zero counts as
/// positive: the member has covered their meal cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Positive,
    Negative,
}

impl BalanceStatus {
    /// Human-readable label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            BalanceStatus::Positive => "Positive",
            BalanceStatus::Negative => "Negative",
        }
    }
}

/// Per-member financial breakdown for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemberFinancials {
    pub member_id: i32,
    pub name: String,
    /// Sum of all meal units (breakfast + lunch + dinner) in scope.
    pub total_meals: i64,
    /// Sum of the member's deposits in scope.
    #[schema(value_type = String)]
    pub total_deposits: Decimal,
    /// `total_meals * meal_rate`.
    #[schema(value_type = String)]
    pub meal_cost: Decimal,
    /// `total_deposits - meal_cost`.
    #[schema(value_type = String)]
    pub remaining_balance: Decimal,
    pub status: BalanceStatus,
}

/// Aggregates over a whole reconciliation run.
///
/// `meal_rate` is the system-wide average cost per meal unit; it is identical
/// for every member in the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialSummary {
    #[schema(value_type = String)]
    pub total_bazar_cost: Decimal,
    pub total_meals: i64,
    #[schema(value_type = String)]
    pub meal_rate: Decimal,
    pub total_members: usize,
    /// Members with `remaining_balance >= 0`.
    pub members_in_surplus: usize,
    /// Members with `remaining_balance < 0`.
    pub members_in_deficit: usize,
    #[schema(value_type = String)]
    pub total_deposits: Decimal,
    #[schema(value_type = String)]
    pub total_meal_cost: Decimal,
    #[schema(value_type = String)]
    pub total_remaining: Decimal,
    /// The applied month filter (`YYYY-MM`), or null for all-time.
    pub filtered_by_month: Option<String>,
}

/// Full result of a reconciliation run: per-member rows sorted by remaining
/// balance descending, plus the summary aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialReport {
    pub members: Vec<MemberFinancials>,
    pub summary: FinancialSummary,
}

impl FinancialReport {
    /// CSV projection: header, one row per member, one summary row.
    /// Columns: name, total meals, total deposits, meal cost, remaining
    /// balance, status, meal rate.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "Name,Total Meals,Total Deposits,Meal Cost,Remaining Balance,Status,Meal Rate\n",
        );
        for m in &self.members {
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_field(&m.name),
                m.total_meals,
                m.total_deposits,
                m.meal_cost,
                m.remaining_balance,
                m.status.label(),
                self.summary.meal_rate,
            ));
        }
        let s = &self.summary;
        out.push_str(&format!(
            "Total,{},{},{},{},,{}\n",
            s.total_meals, s.total_deposits, s.total_meal_cost, s.total_remaining, s.meal_rate,
        ));
        out
    }
}

/// Dashboard aggregate counters for one household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MealAggregateStats {
    pub total_meals: i64,
    #[schema(value_type = String)]
    pub total_bazar_cost: Decimal,
    pub today_meals: i64,
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_fixture() -> FinancialReport {
        FinancialReport {
            members: vec![MemberFinancials {
                member_id: 1,
                name: "Alice".to_string(),
                total_meals: 10,
                total_deposits: Decimal::new(50000, 2),
                meal_cost: Decimal::new(10000, 2),
                remaining_balance: Decimal::new(40000, 2),
                status: BalanceStatus::Positive,
            }],
            summary: FinancialSummary {
                total_bazar_cost: Decimal::new(10000, 2),
                total_meals: 10,
                meal_rate: Decimal::new(1000, 2),
                total_members: 1,
                members_in_surplus: 1,
                members_in_deficit: 0,
                total_deposits: Decimal::new(50000, 2),
                total_meal_cost: Decimal::new(10000, 2),
                total_remaining: Decimal::new(40000, 2),
                filtered_by_month: Some("2024-03".to_string()),
            },
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BalanceStatus::Positive).unwrap(),
            "\"positive\""
        );
        assert_eq!(
            serde_json::to_string(&BalanceStatus::Negative).unwrap(),
            "\"negative\""
        );
    }

    #[test]
    fn test_report_roundtrip() {
        let report = report_fixture();
        let json = serde_json::to_string(&report).unwrap();
        let back: FinancialReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert_eq!(back.summary.filtered_by_month.as_deref(), Some("2024-03"));
    }

    #[test]
    fn test_csv_projection() {
        let csv = report_fixture().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name,Total Meals"));
        assert_eq!(lines[1], "Alice,10,500.00,100.00,400.00,Positive,10.00");
        assert!(lines[2].starts_with("Total,10,"));
    }

    #[test]
    fn test_csv_escapes_commas_in_names() {
        let mut report = report_fixture();
        report.members[0].name = "Doe, Jane".to_string();
        let csv = report.to_csv();
        assert!(csv.contains("\"Doe, Jane\""));
    }
}
