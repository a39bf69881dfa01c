use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create households table
        manager
            .create_table(
                Table::create()
                    .table(Households::Table)
                    .if_not_exists()
                    .col(pk_auto(Households::Id))
                    .col(string(Households::Name))
                    .to_owned(),
            )
            .await?;

        // Create members table
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(pk_auto(Members::Id))
                    .col(integer(Members::HouseholdId))
                    .col(string(Members::Name))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_household")
                            .from(Members::Table, Members::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create meal_records table
        manager
            .create_table(
                Table::create()
                    .table(MealRecords::Table)
                    .if_not_exists()
                    .col(pk_auto(MealRecords::Id))
                    .col(integer(MealRecords::MemberId))
                    .col(date(MealRecords::Date))
                    .col(integer(MealRecords::Breakfast).default(0))
                    .col(integer(MealRecords::Lunch).default(0))
                    .col(integer(MealRecords::Dinner).default(0))
                    .col(string_null(MealRecords::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meal_record_member")
                            .from(MealRecords::Table, MealRecords::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create deposits table
        manager
            .create_table(
                Table::create()
                    .table(Deposits::Table)
                    .if_not_exists()
                    .col(pk_auto(Deposits::Id))
                    .col(integer(Deposits::MemberId))
                    .col(date(Deposits::Date))
                    .col(decimal(Deposits::Amount))
                    .col(string_null(Deposits::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deposit_member")
                            .from(Deposits::Table, Deposits::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bazar_expenses table
        manager
            .create_table(
                Table::create()
                    .table(BazarExpenses::Table)
                    .if_not_exists()
                    .col(pk_auto(BazarExpenses::Id))
                    .col(integer(BazarExpenses::HouseholdId))
                    .col(integer_null(BazarExpenses::MemberId))
                    .col(date(BazarExpenses::Date))
                    .col(string_null(BazarExpenses::Description))
                    .col(decimal(BazarExpenses::TotalCost))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bazar_expense_household")
                            .from(BazarExpenses::Table, BazarExpenses::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bazar_expense_member")
                            .from(BazarExpenses::Table, BazarExpenses::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BazarExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deposits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MealRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Households::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Households {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    HouseholdId,
    Name,
}

#[derive(DeriveIden)]
enum MealRecords {
    Table,
    Id,
    MemberId,
    Date,
    Breakfast,
    Lunch,
    Dinner,
    Notes,
}

#[derive(DeriveIden)]
enum Deposits {
    Table,
    Id,
    MemberId,
    Date,
    Amount,
    Description,
}

#[derive(DeriveIden)]
enum BazarExpenses {
    Table,
    Id,
    HouseholdId,
    MemberId,
    Date,
    Description,
    TotalCost,
}
