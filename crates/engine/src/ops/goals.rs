use chrono::Utc;
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Goal, GoalPatch, NewGoal, ResultEngine, goals, money::ensure_in_range,
    util::normalize_required_text,
};

use super::{Engine, with_tx};

fn validate_goal_amounts(target_amount_minor: i64, current_amount_minor: i64) -> ResultEngine<()> {
    if target_amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "target_amount_minor must be > 0".to_string(),
        ));
    }
    if current_amount_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "current_amount_minor must be >= 0".to_string(),
        ));
    }
    ensure_in_range(target_amount_minor, "target_amount_minor")?;
    ensure_in_range(current_amount_minor, "current_amount_minor")
}

impl Engine {
    pub async fn list_goals(&self, user_id: Uuid) -> ResultEngine<Vec<Goal>> {
        goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(goals::Column::Deadline)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    pub async fn goal(&self, goal_id: Uuid, user_id: Uuid) -> ResultEngine<Goal> {
        let model = self.require_goal(&self.database, goal_id, user_id).await?;
        Goal::try_from(model)
    }

    pub async fn create_goal(&self, user_id: Uuid, cmd: NewGoal) -> ResultEngine<Goal> {
        let title = normalize_required_text(&cmd.title, "title")?;
        validate_goal_amounts(cmd.target_amount_minor, cmd.current_amount_minor)?;
        let now = Utc::now();
        let goal = Goal {
            id: Uuid::new_v4(),
            user_id,
            title,
            target_amount_minor: cmd.target_amount_minor,
            current_amount_minor: cmd.current_amount_minor,
            deadline: cmd.deadline,
            created_at: now,
            updated_at: now,
        };

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            goals::ActiveModel::from(&goal).insert(&db_tx).await?;
            Ok(())
        });
        result?;

        self.notify(format!("New goal created: {}", goal.title));
        Ok(goal)
    }

    pub async fn update_goal(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
        patch: GoalPatch,
    ) -> ResultEngine<Goal> {
        let title = patch
            .title
            .as_deref()
            .map(|v| normalize_required_text(v, "title"))
            .transpose()?;

        let result: ResultEngine<Goal> = with_tx!(self, |db_tx| {
            let model = self.require_goal(&db_tx, goal_id, user_id).await?;
            let mut goal = Goal::try_from(model.clone())?;
            if let Some(title) = title {
                goal.title = title;
            }
            goal.target_amount_minor = patch.target_amount_minor.unwrap_or(goal.target_amount_minor);
            goal.current_amount_minor =
                patch.current_amount_minor.unwrap_or(goal.current_amount_minor);
            goal.deadline = patch.deadline.unwrap_or(goal.deadline);
            validate_goal_amounts(goal.target_amount_minor, goal.current_amount_minor)?;
            goal.updated_at = Utc::now();

            let mut active = model.into_active_model();
            active.title = ActiveValue::Set(goal.title.clone());
            active.target_amount_minor = ActiveValue::Set(goal.target_amount_minor);
            active.current_amount_minor = ActiveValue::Set(goal.current_amount_minor);
            active.deadline = ActiveValue::Set(goal.deadline);
            active.updated_at = ActiveValue::Set(goal.updated_at);
            active.update(&db_tx).await?;
            Ok(goal)
        });
        let goal = result?;

        self.notify(format!("Goal updated: {}", goal.title));
        Ok(goal)
    }

    pub async fn delete_goal(&self, goal_id: Uuid, user_id: Uuid) -> ResultEngine<Goal> {
        let result: ResultEngine<Goal> = with_tx!(self, |db_tx| {
            let model = self.require_goal(&db_tx, goal_id, user_id).await?;
            let goal = Goal::try_from(model)?;
            goals::Entity::delete_by_id(goal_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(goal)
        });
        let goal = result?;

        self.notify(format!("Goal deleted: {}", goal.title));
        Ok(goal)
    }
}
