use sea_orm::entity::prelude::*;

/// One member's meal counts for a single day. Counts are non-negative; a
/// record with all three counts at zero is meaningless but not forbidden.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meal_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub date: Date,
    pub breakfast: i32,
    pub lunch: i32,
    pub dinner: i32,
    pub notes: Option<String>,
}

impl Model {
    /// Total meal units recorded for the day.
    pub fn total_count(&self) -> i64 {
        i64::from(self.breakfast) + i64::from(self.lunch) + i64::from(self.dinner)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
