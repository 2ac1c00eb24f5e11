use api_types::bill::{BillNew, BillUpdate, BillView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Bill, BillPatch, NewBill};
use uuid::Uuid;

use crate::{AuthUser, ServerError, server::ServerState};

fn bill_view(bill: Bill) -> BillView {
    BillView {
        id: bill.id,
        vendor: bill.vendor,
        plan: bill.plan,
        due_date: bill.due_date,
        amount_minor: bill.amount_minor,
        logo_url: bill.logo_url,
        last_charge_date: bill.last_charge_date,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BillView>>, ServerError> {
    let bills = state.engine.list_bills(user.id).await?;
    Ok(Json(bills.into_iter().map(bill_view).collect()))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillView>, ServerError> {
    Ok(Json(bill_view(state.engine.bill(id, user.id).await?)))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<BillNew>,
) -> Result<(StatusCode, Json<BillView>), ServerError> {
    let cmd = NewBill {
        vendor: payload.vendor,
        plan: payload.plan,
        due_date: payload.due_date.with_timezone(&Utc),
        amount_minor: payload.amount_minor,
        logo_url: payload.logo_url,
        last_charge_date: payload.last_charge_date.map(|dt| dt.with_timezone(&Utc)),
    };
    let bill = state.engine.create_bill(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(bill_view(bill))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BillUpdate>,
) -> Result<Json<BillView>, ServerError> {
    let patch = BillPatch {
        vendor: payload.vendor,
        plan: payload.plan,
        due_date: payload.due_date.map(|dt| dt.with_timezone(&Utc)),
        amount_minor: payload.amount_minor,
        logo_url: payload.logo_url,
        last_charge_date: payload.last_charge_date.map(|dt| dt.with_timezone(&Utc)),
    };
    let bill = state.engine.update_bill(id, user.id, patch).await?;
    Ok(Json(bill_view(bill)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillView>, ServerError> {
    Ok(Json(bill_view(state.engine.delete_bill(id, user.id).await?)))
}
