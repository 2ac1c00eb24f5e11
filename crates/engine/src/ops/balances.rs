use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, MAX_AMOUNT_MINOR, ResultEngine, Transaction, accounts, money::checked_total,
    transactions, util::parse_uuid,
};

use super::{Engine, with_tx};

/// An account whose stored balance disagreed with its ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceDrift {
    pub account_id: Uuid,
    pub stored_minor: i64,
    pub expected_minor: i64,
}

/// Adds `delta` to an account balance in a single relative UPDATE.
///
/// The UPDATE only matches while the resulting balance stays within
/// ±[`MAX_AMOUNT_MINOR`], so a stored balance can never overflow. Returns
/// `false` when the account is gone, in which case nothing is written, and
/// `InvalidAmount` when the account exists but the new balance is out of range.
pub(super) async fn apply_balance_delta<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: Uuid,
    delta: i64,
) -> ResultEngine<bool> {
    if delta == 0 {
        return Ok(true);
    }
    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::BalanceMinor,
            Expr::col(accounts::Column::BalanceMinor).add(delta),
        )
        .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(accounts::Column::Id.eq(account_id.to_string()))
        .filter(accounts::Column::UserId.eq(user_id.to_string()))
        .filter(
            Expr::expr(Expr::col(accounts::Column::BalanceMinor).add(delta))
                .between(-MAX_AMOUNT_MINOR, MAX_AMOUNT_MINOR),
        )
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        return Ok(true);
    }

    let exists = accounts::Entity::find_by_id(account_id.to_string())
        .filter(accounts::Column::UserId.eq(user_id.to_string()))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Err(EngineError::InvalidAmount(format!(
            "account balance would leave ±{MAX_AMOUNT_MINOR}"
        )));
    }
    tracing::warn!(%account_id, delta, "balance adjustment skipped: account missing");
    Ok(false)
}

/// Sums per-account deltas, dropping accounts whose net change is zero.
///
/// Order follows first appearance so writes are deterministic.
pub(super) fn coalesce_effects(effects: &[(Uuid, i64)]) -> Vec<(Uuid, i64)> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for (account_id, delta) in effects {
        let total = totals.entry(*account_id).or_insert_with(|| {
            order.push(*account_id);
            0
        });
        *total += delta;
    }
    order
        .into_iter()
        .filter_map(|id| {
            let delta = totals.get(&id).copied().unwrap_or(0);
            (delta != 0).then_some((id, delta))
        })
        .collect()
}

impl Engine {
    /// Recomputes every account of `user_id` as
    /// `opening_balance + Σ signed effects` and persists the result.
    ///
    /// Returns the accounts that had drifted. Running it twice in a row
    /// returns an empty list the second time.
    pub async fn reconcile_balances(&self, user_id: Uuid) -> ResultEngine<Vec<BalanceDrift>> {
        let result: ResultEngine<Vec<BalanceDrift>> = with_tx!(self, |db_tx| {
            let account_models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(accounts::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let tx_models = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut effects: HashMap<String, i64> = HashMap::new();
            for model in tx_models {
                let tx = Transaction::try_from(model)?;
                let total = effects.entry(tx.account_id.to_string()).or_default();
                *total = checked_total(*total, tx.signed_amount())?;
            }

            let mut drifts = Vec::new();
            for model in account_models {
                let expected = checked_total(
                    model.opening_balance_minor,
                    effects.get(&model.id).copied().unwrap_or(0),
                )?;
                if expected == model.balance_minor {
                    continue;
                }
                let account_id = parse_uuid(&model.id, "account")?;
                accounts::Entity::update_many()
                    .col_expr(accounts::Column::BalanceMinor, Expr::value(expected))
                    .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(accounts::Column::Id.eq(model.id.clone()))
                    .exec(&db_tx)
                    .await?;
                drifts.push(BalanceDrift {
                    account_id,
                    stored_minor: model.balance_minor,
                    expected_minor: expected,
                });
            }
            Ok(drifts)
        });
        let drifts = result?;

        if drifts.is_empty() {
            tracing::debug!(%user_id, "balances consistent");
        } else {
            tracing::warn!(%user_id, repaired = drifts.len(), "repaired drifted balances");
            self.notify(format!("Balances reconciled: {} account(s) repaired", drifts.len()));
        }
        Ok(drifts)
    }
}
