use api_types::goal::{GoalNew, GoalUpdate, GoalView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Goal, GoalPatch, NewGoal};
use uuid::Uuid;

use crate::{AuthUser, ServerError, server::ServerState};

fn goal_view(goal: Goal) -> GoalView {
    GoalView {
        progress_percent: goal.progress_percent(),
        id: goal.id,
        title: goal.title,
        target_amount_minor: goal.target_amount_minor,
        current_amount_minor: goal.current_amount_minor,
        deadline: goal.deadline,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state.engine.list_goals(user.id).await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    Ok(Json(goal_view(state.engine.goal(id, user.id).await?)))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let cmd = NewGoal::new(
        payload.title,
        payload.target_amount_minor,
        payload.deadline.with_timezone(&Utc),
    )
    .current_amount_minor(payload.current_amount_minor);
    let goal = state.engine.create_goal(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(goal_view(goal))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let patch = GoalPatch {
        title: payload.title,
        target_amount_minor: payload.target_amount_minor,
        current_amount_minor: payload.current_amount_minor,
        deadline: payload.deadline.map(|dt| dt.with_timezone(&Utc)),
    };
    let goal = state.engine.update_goal(id, user.id, patch).await?;
    Ok(Json(goal_view(goal)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    Ok(Json(goal_view(state.engine.delete_goal(id, user.id).await?)))
}
