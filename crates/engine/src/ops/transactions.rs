//! Ledger operations: every transaction write and its balance adjustment run
//! in one database transaction.

use chrono::Utc;
use sea_orm::{IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Money, NewTransaction, ResultEngine, Transaction, TransactionKind, TransactionPatch, accounts,
    money::{checked_total, sum_minor},
    transactions::{self, validate_amount},
    util::{apply_optional_text_patch, normalize_optional_text},
};

use super::{
    Engine,
    balances::{apply_balance_delta, coalesce_effects},
    with_tx,
};

/// Totals across all of a user's accounts and transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    pub total_balance_minor: i64,
    pub total_revenues_minor: i64,
    pub total_expenses_minor: i64,
}

impl Engine {
    /// Transactions of `user_id`, newest first.
    pub async fn list_transactions(&self, user_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = self
            .require_transaction(&self.database, transaction_id, user_id)
            .await?;
        Transaction::try_from(model)
    }

    /// Records a transaction and applies its signed effect to the account.
    ///
    /// The account must exist and belong to `user_id`.
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        cmd: NewTransaction,
    ) -> ResultEngine<Transaction> {
        validate_amount(cmd.amount_minor)?;
        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            user_id,
            account_id: cmd.account_id,
            kind: cmd.kind,
            amount_minor: cmd.amount_minor,
            title: normalize_optional_text(cmd.title.as_deref()),
            shop: normalize_optional_text(cmd.shop.as_deref()),
            category: normalize_optional_text(cmd.category.as_deref()),
            occurred_at: cmd.occurred_at.unwrap_or(now),
            method: cmd.method,
            status: cmd.status,
            receipt: normalize_optional_text(cmd.receipt.as_deref()),
            created_at: now,
            updated_at: now,
        };

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            self.require_account(&db_tx, tx.account_id, user_id).await?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            apply_balance_delta(&db_tx, tx.account_id, user_id, tx.signed_amount()).await?;
            Ok(())
        });
        result?;

        tracing::info!(
            transaction_id = %tx.id,
            account_id = %tx.account_id,
            delta = tx.signed_amount(),
            "transaction applied"
        );
        self.notify(format!(
            "New transaction created: {} - {}",
            tx.kind,
            Money::new(tx.amount_minor)
        ));
        Ok(tx)
    }

    /// Applies `patch` and moves the balance by the difference between the new
    /// and the old effect.
    ///
    /// When the account changes, the old account receives the inverse of the
    /// old effect and the new one (which must exist and be owned) the new
    /// effect. A missing old account is skipped.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        if let Some(amount_minor) = patch.amount_minor {
            validate_amount(amount_minor)?;
        }

        let result: ResultEngine<Transaction> = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let old = Transaction::try_from(model.clone())?;

            let account_id = patch.account_id.unwrap_or(old.account_id);
            if account_id != old.account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }

            let new = Transaction {
                account_id,
                kind: patch.kind.unwrap_or(old.kind),
                amount_minor: patch.amount_minor.unwrap_or(old.amount_minor),
                title: apply_optional_text_patch(old.title.clone(), patch.title.as_deref()),
                shop: apply_optional_text_patch(old.shop.clone(), patch.shop.as_deref()),
                category: apply_optional_text_patch(
                    old.category.clone(),
                    patch.category.as_deref(),
                ),
                occurred_at: patch.occurred_at.unwrap_or(old.occurred_at),
                method: patch.method.or(old.method),
                status: patch.status.unwrap_or(old.status),
                receipt: apply_optional_text_patch(old.receipt.clone(), patch.receipt.as_deref()),
                updated_at: Utc::now(),
                ..old.clone()
            };

            let mut active = model.into_active_model();
            let desired = transactions::ActiveModel::from(&new);
            active.account_id = desired.account_id;
            active.kind = desired.kind;
            active.amount_minor = desired.amount_minor;
            active.title = desired.title;
            active.shop = desired.shop;
            active.category = desired.category;
            active.occurred_at = desired.occurred_at;
            active.method = desired.method;
            active.status = desired.status;
            active.receipt = desired.receipt;
            active.updated_at = desired.updated_at;
            active.update(&db_tx).await?;

            let effects = coalesce_effects(&[
                (old.account_id, -old.signed_amount()),
                (new.account_id, new.signed_amount()),
            ]);
            for (account_id, delta) in effects {
                apply_balance_delta(&db_tx, account_id, user_id, delta).await?;
            }
            Ok(new)
        });
        let tx = result?;

        tracing::info!(%transaction_id, account_id = %tx.account_id, "transaction reapplied");
        self.notify(format!(
            "Transaction updated: {} - {}",
            tx.kind,
            Money::new(tx.amount_minor)
        ));
        Ok(tx)
    }

    /// Removes a transaction and reverts its effect on the account, if the
    /// account still exists.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let result: ResultEngine<Transaction> = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let tx = Transaction::try_from(model)?;
            transactions::Entity::delete_by_id(transaction_id.to_string())
                .exec(&db_tx)
                .await?;
            apply_balance_delta(&db_tx, tx.account_id, user_id, -tx.signed_amount()).await?;
            Ok(tx)
        });
        let tx = result?;

        tracing::info!(%transaction_id, account_id = %tx.account_id, "transaction retracted");
        self.notify(format!(
            "Transaction deleted: {} - {}",
            tx.kind,
            Money::new(tx.amount_minor)
        ));
        Ok(tx)
    }

    /// Sum of account balances plus income and expense totals.
    pub async fn transaction_summary(&self, user_id: Uuid) -> ResultEngine<TransactionSummary> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .all(&self.database)
            .await?;
        let txs = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .all(&self.database)
            .await?;

        let mut summary = TransactionSummary {
            total_balance_minor: sum_minor(accounts.iter().map(|a| a.balance_minor))?,
            ..TransactionSummary::default()
        };
        for model in txs {
            let total = match TransactionKind::try_from(model.kind.as_str())? {
                TransactionKind::Income => &mut summary.total_revenues_minor,
                TransactionKind::Expense => &mut summary.total_expenses_minor,
            };
            *total = checked_total(*total, model.amount_minor)?;
        }
        Ok(summary)
    }
}
