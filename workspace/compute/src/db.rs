//! SeaORM-backed [`FinancialDataSource`].
//!
//! The summary operations aggregate on the database side (grouped `SUM`
//! queries); the raw operations fetch full row sets for the engine's
//! client-side fallback aggregation.

use async_trait::async_trait;
use chrono::Utc;
use common::MealAggregateStats;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait,
};
use tracing::instrument;

use model::entities::{bazar_expense, deposit, meal_record, member};

use crate::error::Result;
use crate::month::MonthFilter;
use crate::source::{
    BazarExpenseRow, DepositRow, DepositsPayload, FinancialDataSource, MealRecordRow, MemberRow,
    MemberTotals, Sourced,
};

/// Read-only view over the application database, scoped per call by
/// household id.
#[derive(Debug, Clone)]
pub struct DbFinancialSource {
    db: DatabaseConnection,
}

impl DbFinancialSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(FromQueryResult)]
struct MealTotalsRow {
    member_id: i32,
    total_meals: Option<i64>,
}

#[derive(FromQueryResult)]
struct DepositTotalsRow {
    member_id: i32,
    total_deposits: Option<Decimal>,
}

#[derive(FromQueryResult)]
struct SumRow {
    total: Option<Decimal>,
}

#[derive(FromQueryResult)]
struct CountRow {
    total: Option<i64>,
}

/// Per-row meal unit count, summed DB-side.
fn meal_units_expr() -> sea_orm::sea_query::SimpleExpr {
    Expr::col((meal_record::Entity, meal_record::Column::Breakfast))
        .add(Expr::col((meal_record::Entity, meal_record::Column::Lunch)))
        .add(Expr::col((meal_record::Entity, meal_record::Column::Dinner)))
}

#[async_trait]
impl FinancialDataSource for DbFinancialSource {
    #[instrument(skip(self))]
    async fn member_financial_summary(
        &self,
        household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<Sourced<Vec<MemberTotals>>> {
        let members = member::Entity::find()
            .filter(member::Column::HouseholdId.eq(household_id))
            .all(&self.db)
            .await?;
        if members.is_empty() {
            return Ok(Sourced::Available(Vec::new()));
        }

        let mut meal_query = meal_record::Entity::find()
            .select_only()
            .column(meal_record::Column::MemberId)
            .column_as(Expr::expr(meal_units_expr()).sum(), "total_meals")
            .join(JoinType::InnerJoin, meal_record::Relation::Member.def())
            .filter(member::Column::HouseholdId.eq(household_id))
            .group_by(meal_record::Column::MemberId);
        if let Some(m) = month {
            meal_query =
                meal_query.filter(meal_record::Column::Date.between(m.first_day(), m.last_day()));
        }
        let meal_totals = meal_query.into_model::<MealTotalsRow>().all(&self.db).await?;

        let mut deposit_query = deposit::Entity::find()
            .select_only()
            .column(deposit::Column::MemberId)
            .column_as(deposit::Column::Amount.sum(), "total_deposits")
            .join(JoinType::InnerJoin, deposit::Relation::Member.def())
            .filter(member::Column::HouseholdId.eq(household_id))
            .group_by(deposit::Column::MemberId);
        if let Some(m) = month {
            deposit_query =
                deposit_query.filter(deposit::Column::Date.between(m.first_day(), m.last_day()));
        }
        let deposit_totals = deposit_query
            .into_model::<DepositTotalsRow>()
            .all(&self.db)
            .await?;

        let rows = members
            .into_iter()
            .map(|m| MemberTotals {
                total_meals: meal_totals
                    .iter()
                    .find(|t| t.member_id == m.id)
                    .and_then(|t| t.total_meals)
                    .unwrap_or(0),
                total_deposits: deposit_totals
                    .iter()
                    .find(|t| t.member_id == m.id)
                    .and_then(|t| t.total_deposits)
                    .unwrap_or(Decimal::ZERO),
                member_id: m.id,
                name: m.name,
            })
            .collect();

        Ok(Sourced::Available(rows))
    }

    #[instrument(skip(self))]
    async fn grocery_expense_summary(
        &self,
        household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<Sourced<Decimal>> {
        let mut query = bazar_expense::Entity::find()
            .select_only()
            .column_as(bazar_expense::Column::TotalCost.sum(), "total")
            .filter(bazar_expense::Column::HouseholdId.eq(household_id));
        if let Some(m) = month {
            query =
                query.filter(bazar_expense::Column::Date.between(m.first_day(), m.last_day()));
        }
        let row = query.into_model::<SumRow>().one(&self.db).await?;

        Ok(Sourced::Available(
            row.and_then(|r| r.total).unwrap_or(Decimal::ZERO),
        ))
    }

    #[instrument(skip(self))]
    async fn meal_aggregate_stats(
        &self,
        household_id: i32,
        month: Option<MonthFilter>,
    ) -> Result<MealAggregateStats> {
        let mut meal_query = meal_record::Entity::find()
            .select_only()
            .column_as(Expr::expr(meal_units_expr()).sum(), "total")
            .join(JoinType::InnerJoin, meal_record::Relation::Member.def())
            .filter(member::Column::HouseholdId.eq(household_id));
        if let Some(m) = month {
            meal_query =
                meal_query.filter(meal_record::Column::Date.between(m.first_day(), m.last_day()));
        }
        let total_meals = meal_query
            .into_model::<CountRow>()
            .one(&self.db)
            .await?
            .and_then(|r| r.total)
            .unwrap_or(0);

        let total_bazar_cost = self
            .grocery_expense_summary(household_id, month)
            .await?
            .into_option()
            .unwrap_or(Decimal::ZERO);

        let today = Utc::now().date_naive();
        let today_meals = meal_record::Entity::find()
            .select_only()
            .column_as(Expr::expr(meal_units_expr()).sum(), "total")
            .join(JoinType::InnerJoin, meal_record::Relation::Member.def())
            .filter(member::Column::HouseholdId.eq(household_id))
            .filter(meal_record::Column::Date.eq(today))
            .into_model::<CountRow>()
            .one(&self.db)
            .await?
            .and_then(|r| r.total)
            .unwrap_or(0);

        Ok(MealAggregateStats {
            total_meals,
            total_bazar_cost,
            today_meals,
        })
    }

    #[instrument(skip(self))]
    async fn bazar_expense_records(&self, household_id: i32) -> Result<Vec<BazarExpenseRow>> {
        let records = bazar_expense::Entity::find()
            .filter(bazar_expense::Column::HouseholdId.eq(household_id))
            .all(&self.db)
            .await?;
        Ok(records
            .into_iter()
            .map(|r| BazarExpenseRow {
                date: r.date,
                total_cost: r.total_cost,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn members(&self, household_id: i32) -> Result<Vec<MemberRow>> {
        let members = member::Entity::find()
            .filter(member::Column::HouseholdId.eq(household_id))
            .all(&self.db)
            .await?;
        Ok(members
            .into_iter()
            .map(|m| MemberRow {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn meal_records(&self, household_id: i32) -> Result<Vec<MealRecordRow>> {
        let records = meal_record::Entity::find()
            .join(JoinType::InnerJoin, meal_record::Relation::Member.def())
            .filter(member::Column::HouseholdId.eq(household_id))
            .all(&self.db)
            .await?;
        Ok(records
            .into_iter()
            .map(|r| MealRecordRow {
                member_id: r.member_id,
                date: r.date,
                breakfast: r.breakfast,
                lunch: r.lunch,
                dinner: r.dinner,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn deposit_records(&self, household_id: i32) -> Result<DepositsPayload> {
        let records = deposit::Entity::find()
            .join(JoinType::InnerJoin, deposit::Relation::Member.def())
            .filter(member::Column::HouseholdId.eq(household_id))
            .all(&self.db)
            .await?;
        Ok(DepositsPayload::Rows(
            records
                .into_iter()
                .map(|d| DepositRow {
                    member_id: d.member_id,
                    date: d.date,
                    amount: d.amount,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::compute_member_financials;
    use chrono::NaiveDate;
    use common::BalanceStatus;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, Set};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Migrations failed");
        db
    }

    async fn seed_household(db: &DatabaseConnection) -> (i32, i32, i32) {
        let household = model::entities::household::ActiveModel {
            name: Set("Flat 4B".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        let alice = model::entities::member::ActiveModel {
            household_id: Set(household.id),
            name: Set("Alice".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        let bob = model::entities::member::ActiveModel {
            household_id: Set(household.id),
            name: Set("Bob".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        // Alice: 10 meals, Bob: 30 meals, all in March 2024.
        for (member_id, breakfast, lunch, dinner, day) in [
            (alice.id, 4, 3, 3, 10),
            (bob.id, 10, 10, 5, 11),
            (bob.id, 0, 0, 5, 12),
        ] {
            model::entities::meal_record::ActiveModel {
                member_id: Set(member_id),
                date: Set(NaiveDate::from_ymd_opt(2024, 3, day).unwrap()),
                breakfast: Set(breakfast),
                lunch: Set(lunch),
                dinner: Set(dinner),
                notes: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }

        for (member_id, amount) in [(alice.id, 500), (bob.id, 300)] {
            model::entities::deposit::ActiveModel {
                member_id: Set(member_id),
                date: Set(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
                amount: Set(Decimal::from(amount)),
                description: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }

        // 400 spent in March, plus an out-of-month purchase.
        for (amount, month, day) in [(250, 3, 9), (150, 3, 23), (999, 4, 2)] {
            model::entities::bazar_expense::ActiveModel {
                household_id: Set(household.id),
                member_id: Set(Some(alice.id)),
                date: Set(NaiveDate::from_ymd_opt(2024, month, day).unwrap()),
                description: Set(None),
                total_cost: Set(Decimal::from(amount)),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }

        (household.id, alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_db_backed_reconciliation() {
        let db = setup_db().await;
        let (household_id, alice_id, bob_id) = seed_household(&db).await;
        let source = DbFinancialSource::new(db);

        let month = MonthFilter::new(2024, 3);
        let report = compute_member_financials(&source, household_id, month)
            .await
            .unwrap();

        assert_eq!(report.summary.total_meals, 40);
        assert_eq!(report.summary.total_bazar_cost, Decimal::from(400));
        assert_eq!(report.summary.meal_rate, Decimal::from(10));

        let alice = report.members.iter().find(|m| m.member_id == alice_id).unwrap();
        assert_eq!(alice.total_meals, 10);
        assert_eq!(alice.remaining_balance, Decimal::from(400));
        assert_eq!(alice.status, BalanceStatus::Positive);

        let bob = report.members.iter().find(|m| m.member_id == bob_id).unwrap();
        assert_eq!(bob.total_meals, 30);
        assert_eq!(bob.remaining_balance, Decimal::ZERO);
        assert_eq!(bob.status, BalanceStatus::Positive);

        // Sorted surplus first.
        assert_eq!(report.members[0].member_id, alice_id);
    }

    #[tokio::test]
    async fn test_db_summary_scopes_by_household() {
        let db = setup_db().await;
        let (household_id, ..) = seed_household(&db).await;

        // A second household whose records must not leak into the first.
        let other = model::entities::household::ActiveModel {
            name: Set("Other".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let carol = model::entities::member::ActiveModel {
            household_id: Set(other.id),
            name: Set("Carol".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        model::entities::meal_record::ActiveModel {
            member_id: Set(carol.id),
            date: Set(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()),
            breakfast: Set(9),
            lunch: Set(9),
            dinner: Set(9),
            notes: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let source = DbFinancialSource::new(db);
        let summary = source
            .member_financial_summary(household_id, None)
            .await
            .unwrap()
            .into_option()
            .unwrap();

        assert_eq!(summary.len(), 2);
        assert!(summary.iter().all(|row| row.name != "Carol"));
        assert_eq!(summary.iter().map(|r| r.total_meals).sum::<i64>(), 40);
    }

    #[tokio::test]
    async fn test_db_aggregate_stats() {
        let db = setup_db().await;
        let (household_id, ..) = seed_household(&db).await;
        let source = DbFinancialSource::new(db);

        let stats = source
            .meal_aggregate_stats(household_id, MonthFilter::new(2024, 3))
            .await
            .unwrap();
        assert_eq!(stats.total_meals, 40);
        assert_eq!(stats.total_bazar_cost, Decimal::from(400));
        // Seed data is fixed in 2024, so nothing falls on the current day.
        assert_eq!(stats.today_meals, 0);
    }

    #[tokio::test]
    async fn test_db_empty_household_reports_zeroes() {
        let db = setup_db().await;
        let household = model::entities::household::ActiveModel {
            name: Set("Empty".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let source = DbFinancialSource::new(db);
        let report = compute_member_financials(&source, household.id, None)
            .await
            .unwrap();
        assert!(report.members.is_empty());
        assert_eq!(report.summary.total_meals, 0);
        assert_eq!(report.summary.meal_rate, Decimal::ZERO);
    }
}
