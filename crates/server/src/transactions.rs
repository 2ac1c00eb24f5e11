//! Transaction endpoints. Writes go through the ledger so the account balance
//! follows every create, update and delete.

use api_types::transaction::{
    PaymentMethod as ApiMethod, TransactionKind as ApiKind, TransactionNew,
    TransactionStatus as ApiStatus, TransactionSummary, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    NewTransaction, PaymentMethod, Transaction, TransactionKind, TransactionPatch,
    TransactionStatus,
};
use uuid::Uuid;

use crate::{AuthUser, ServerError, server::ServerState};

fn map_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Expense => TransactionKind::Expense,
    }
}

fn map_method(method: ApiMethod) -> PaymentMethod {
    match method {
        ApiMethod::CreditCard => PaymentMethod::CreditCard,
        ApiMethod::DebitCard => PaymentMethod::DebitCard,
        ApiMethod::Cash => PaymentMethod::Cash,
        ApiMethod::BankTransfer => PaymentMethod::BankTransfer,
    }
}

fn map_status(status: ApiStatus) -> TransactionStatus {
    match status {
        ApiStatus::Pending => TransactionStatus::Pending,
        ApiStatus::Complete => TransactionStatus::Complete,
    }
}

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        kind: match tx.kind {
            TransactionKind::Income => ApiKind::Income,
            TransactionKind::Expense => ApiKind::Expense,
        },
        amount_minor: tx.amount_minor,
        title: tx.title,
        shop: tx.shop,
        category: tx.category,
        occurred_at: tx.occurred_at,
        method: tx.method.map(|m| match m {
            PaymentMethod::CreditCard => ApiMethod::CreditCard,
            PaymentMethod::DebitCard => ApiMethod::DebitCard,
            PaymentMethod::Cash => ApiMethod::Cash,
            PaymentMethod::BankTransfer => ApiMethod::BankTransfer,
        }),
        status: match tx.status {
            TransactionStatus::Pending => ApiStatus::Pending,
            TransactionStatus::Complete => ApiStatus::Complete,
        },
        receipt: tx.receipt,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let txs = state.engine.list_transactions(user.id).await?;
    Ok(Json(txs.into_iter().map(transaction_view).collect()))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(id, user.id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let cmd = NewTransaction {
        account_id: payload.account_id,
        kind: map_kind(payload.kind),
        amount_minor: payload.amount_minor,
        title: payload.title,
        shop: payload.shop,
        category: payload.category,
        occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
        method: payload.method.map(map_method),
        status: payload.status.map(map_status).unwrap_or_default(),
        receipt: payload.receipt,
    };
    let tx = state.engine.create_transaction(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let patch = TransactionPatch {
        account_id: payload.account_id,
        kind: payload.kind.map(map_kind),
        amount_minor: payload.amount_minor,
        title: payload.title,
        shop: payload.shop,
        category: payload.category,
        occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
        method: payload.method.map(map_method),
        status: payload.status.map(map_status),
        receipt: payload.receipt,
    };
    let tx = state.engine.update_transaction(id, user.id, patch).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.delete_transaction(id, user.id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn summary(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<TransactionSummary>, ServerError> {
    let summary = state.engine.transaction_summary(user.id).await?;
    Ok(Json(TransactionSummary {
        total_balance_minor: summary.total_balance_minor,
        total_revenues_minor: summary.total_revenues_minor,
        total_expenses_minor: summary.total_expenses_minor,
    }))
}
