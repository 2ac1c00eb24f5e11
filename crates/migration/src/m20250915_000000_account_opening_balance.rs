//! Adds `accounts.opening_balance_minor`, the baseline a balance is rebuilt
//! from during reconciliation.
//!
//! Existing rows are backfilled so that
//! `balance_minor == opening_balance_minor + Σ signed transaction amounts`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const BACKFILL: &str = "UPDATE accounts SET opening_balance_minor = balance_minor - COALESCE((\
    SELECT SUM(CASE t.kind WHEN 'income' THEN t.amount_minor ELSE -t.amount_minor END) \
    FROM transactions t WHERE t.account_id = accounts.id), 0)";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Accounts::Table)
                    .add_column(
                        ColumnDef::new(Accounts::OpeningBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager.get_connection().execute_unprepared(BACKFILL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Accounts::Table)
                    .drop_column(Accounts::OpeningBalanceMinor)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    OpeningBalanceMinor,
}
