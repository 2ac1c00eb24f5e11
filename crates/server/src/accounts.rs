//! Account endpoints.

use api_types::account::{
    AccountDetail, AccountNew, AccountUpdate, AccountView, BalanceDriftView, ReconcileResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Account, AccountPatch, NewAccount};
use uuid::Uuid;

use crate::{AuthUser, ServerError, server::ServerState, transactions::transaction_view};

fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        account_type: account.account_type,
        branch_name: account.branch_name,
        account_number: account.account_number,
        bank_name: account.bank_name,
        balance_minor: account.balance_minor,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.list_accounts(user.id).await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let account = state
        .engine
        .create_account(
            user.id,
            NewAccount {
                account_type: payload.account_type,
                branch_name: payload.branch_name,
                account_number: payload.account_number,
                bank_name: payload.bank_name,
                balance_minor: payload.balance_minor,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn detail(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountDetail>, ServerError> {
    let detail = state.engine.account_detail(id, user.id).await?;
    Ok(Json(AccountDetail {
        account: account_view(detail.account),
        transactions: detail
            .transactions
            .into_iter()
            .map(transaction_view)
            .collect(),
    }))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .engine
        .update_account(
            id,
            user.id,
            AccountPatch {
                account_type: payload.account_type,
                branch_name: payload.branch_name,
                account_number: payload.account_number,
                bank_name: payload.bank_name,
                balance_minor: payload.balance_minor,
            },
        )
        .await?;
    Ok(Json(account_view(account)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.delete_account(id, user.id).await?;
    Ok(Json(account_view(account)))
}

pub async fn reconcile(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<ReconcileResponse>, ServerError> {
    let drifts = state.engine.reconcile_balances(user.id).await?;
    Ok(Json(ReconcileResponse {
        repaired: drifts
            .into_iter()
            .map(|d| BalanceDriftView {
                account_id: d.account_id,
                stored_minor: d.stored_minor,
                expected_minor: d.expected_minor,
            })
            .collect(),
    }))
}
