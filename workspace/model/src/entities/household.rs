use sea_orm::entity::prelude::*;

/// A household is the tenant boundary for the application: members, meal
/// records, deposits, and bazar expenses are all scoped to one household.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "households")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::member::Entity")]
    Member,
    #[sea_orm(has_many = "super::bazar_expense::Entity")]
    BazarExpense,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::bazar_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BazarExpense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
