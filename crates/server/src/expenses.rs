//! Expense endpoints and the analytics views built on them.

use api_types::expense::{
    BreakdownResponse, BucketView, CategoryView, ComparisonQuery, ComparisonResponse, ExpenseNew,
    ExpenseUpdate, ExpenseView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CompareFilter, Expense, ExpensePatch, NewExpense};
use uuid::Uuid;

use crate::{AuthUser, ServerError, server::ServerState};

fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        title: expense.title,
        category: expense.category,
        amount_minor: expense.amount_minor,
        occurred_at: expense.occurred_at,
        account_id: expense.account_id,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.list_expenses(user.id).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    Ok(Json(expense_view(state.engine.expense(id, user.id).await?)))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let cmd = NewExpense {
        title: payload.title,
        category: payload.category,
        amount_minor: payload.amount_minor,
        occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
        account_id: payload.account_id,
    };
    let expense = state.engine.create_expense(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let patch = ExpensePatch {
        title: payload.title,
        category: payload.category,
        amount_minor: payload.amount_minor,
        occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
        account_id: payload.account_id,
    };
    let expense = state.engine.update_expense(id, user.id, patch).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    Ok(Json(expense_view(
        state.engine.delete_expense(id, user.id).await?,
    )))
}

pub async fn comparison(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<ComparisonResponse>, ServerError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<CompareFilter>()?,
        None => CompareFilter::default(),
    };
    let buckets = state.engine.expense_comparison(user.id, filter).await?;
    Ok(Json(ComparisonResponse {
        filter: filter.to_string(),
        data: buckets
            .into_iter()
            .map(|b| BucketView {
                label: b.label,
                total_minor: b.total_minor,
            })
            .collect(),
    }))
}

pub async fn breakdown(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<BreakdownResponse>, ServerError> {
    let groups = state.engine.expense_breakdown(user.id).await?;
    Ok(Json(BreakdownResponse {
        data: groups
            .into_iter()
            .map(|g| CategoryView {
                category: g.category,
                total_minor: g.total_minor,
                change_percent: g.change_percent,
                items: g.items.into_iter().map(expense_view).collect(),
            })
            .collect(),
    }))
}
