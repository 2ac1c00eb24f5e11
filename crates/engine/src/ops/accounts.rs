use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, AccountPatch, EngineError, NewAccount, ResultEngine, Transaction, accounts,
    money::{checked_total, ensure_in_range},
    transactions,
    util::normalize_required_text,
};

use super::{Engine, with_tx};

/// An account together with its ledger, newest transaction first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountDetail {
    pub account: Account,
    pub transactions: Vec<Transaction>,
}

async fn ensure_account_number_free<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    account_number: &str,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    let mut query = accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(user_id.to_string()))
        .filter(accounts::Column::AccountNumber.eq(account_number));
    if let Some(id) = except {
        query = query.filter(accounts::Column::Id.ne(id.to_string()));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(format!(
            "account number {account_number}"
        )));
    }
    Ok(())
}

impl Engine {
    pub async fn list_accounts(&self, user_id: Uuid) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub async fn account(&self, account_id: Uuid, user_id: Uuid) -> ResultEngine<Account> {
        let model = self
            .require_account(&self.database, account_id, user_id)
            .await?;
        Account::try_from(model)
    }

    /// Account detail with its transactions, newest first.
    pub async fn account_detail(
        &self,
        account_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<AccountDetail> {
        let account = self.account(account_id, user_id).await?;
        let transactions = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(transactions::Column::OccurredAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(AccountDetail {
            account,
            transactions,
        })
    }

    /// Creates an account. `balance_minor` becomes both the current and the
    /// opening balance.
    pub async fn create_account(&self, user_id: Uuid, cmd: NewAccount) -> ResultEngine<Account> {
        let account_type = normalize_required_text(&cmd.account_type, "account_type")?;
        let branch_name = normalize_required_text(&cmd.branch_name, "branch_name")?;
        let account_number = normalize_required_text(&cmd.account_number, "account_number")?;
        let bank_name = normalize_required_text(&cmd.bank_name, "bank_name")?;
        ensure_in_range(cmd.balance_minor, "balance_minor")?;

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            account_type,
            branch_name,
            account_number,
            bank_name,
            balance_minor: cmd.balance_minor,
            opening_balance_minor: cmd.balance_minor,
            created_at: now,
            updated_at: now,
        };

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            ensure_account_number_free(&db_tx, user_id, &account.account_number, None).await?;
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(())
        });
        result?;

        tracing::info!(account_id = %account.id, %user_id, "account created");
        self.notify(format!(
            "New account created: {} ({})",
            account.bank_name, account.account_type
        ));
        Ok(account)
    }

    /// Applies a partial update.
    ///
    /// A new `balance_minor` is written together with a matching shift of the
    /// opening balance, so `opening + Σ effects == balance` still holds.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        patch: AccountPatch,
    ) -> ResultEngine<Account> {
        let account_type = patch
            .account_type
            .as_deref()
            .map(|v| normalize_required_text(v, "account_type"))
            .transpose()?;
        let branch_name = patch
            .branch_name
            .as_deref()
            .map(|v| normalize_required_text(v, "branch_name"))
            .transpose()?;
        let account_number = patch
            .account_number
            .as_deref()
            .map(|v| normalize_required_text(v, "account_number"))
            .transpose()?;
        let bank_name = patch
            .bank_name
            .as_deref()
            .map(|v| normalize_required_text(v, "bank_name"))
            .transpose()?;
        if let Some(balance) = patch.balance_minor {
            ensure_in_range(balance, "balance_minor")?;
        }

        let result: ResultEngine<Account> = with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            if let Some(number) = account_number.as_deref() {
                ensure_account_number_free(&db_tx, user_id, number, Some(account_id)).await?;
            }
            if let Some(new_balance) = patch.balance_minor {
                // The shifted opening balance must still fit the column.
                checked_total(model.opening_balance_minor, new_balance)
                    .and_then(|v| checked_total(v, -model.balance_minor))?;
            }

            let mut active = model.into_active_model();
            if let Some(value) = account_type {
                active.account_type = ActiveValue::Set(value);
            }
            if let Some(value) = branch_name {
                active.branch_name = ActiveValue::Set(value);
            }
            if let Some(value) = account_number {
                active.account_number = ActiveValue::Set(value);
            }
            if let Some(value) = bank_name {
                active.bank_name = ActiveValue::Set(value);
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await?;

            if let Some(new_balance) = patch.balance_minor {
                // Both right-hand sides read the pre-update row.
                accounts::Entity::update_many()
                    .col_expr(
                        accounts::Column::OpeningBalanceMinor,
                        Expr::col(accounts::Column::OpeningBalanceMinor)
                            .add(new_balance)
                            .sub(Expr::col(accounts::Column::BalanceMinor)),
                    )
                    .col_expr(accounts::Column::BalanceMinor, Expr::value(new_balance))
                    .filter(accounts::Column::Id.eq(account_id.to_string()))
                    .exec(&db_tx)
                    .await?;
            }

            let model = self.require_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        });
        let account = result?;

        tracing::info!(%account_id, %user_id, "account updated");
        self.notify(format!(
            "Account updated: {} ({})",
            account.bank_name, account.account_type
        ));
        Ok(account)
    }

    /// Deletes an account. Its transactions are left in place.
    pub async fn delete_account(&self, account_id: Uuid, user_id: Uuid) -> ResultEngine<Account> {
        let result: ResultEngine<Account> = with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            let account = Account::try_from(model)?;
            accounts::Entity::delete_by_id(account_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(account)
        });
        let account = result?;

        tracing::info!(%account_id, %user_id, "account deleted");
        self.notify(format!(
            "Account deleted: {} ({})",
            account.bank_name, account.account_type
        ));
        Ok(account)
    }
}
