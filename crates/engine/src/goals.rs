//! Savings goals.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A savings target with a deadline.
///
/// Progress is tracked manually through `current_amount_minor`; goals never
/// touch account balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Completion in whole percent, capped at 100.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        if self.target_amount_minor <= 0 {
            return 0;
        }
        let pct = (i128::from(self.current_amount_minor.max(0)) * 100)
            / i128::from(self.target_amount_minor);
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub deadline: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(goal: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id.to_string()),
            user_id: ActiveValue::Set(goal.user_id.to_string()),
            title: ActiveValue::Set(goal.title.clone()),
            target_amount_minor: ActiveValue::Set(goal.target_amount_minor),
            current_amount_minor: ActiveValue::Set(goal.current_amount_minor),
            deadline: ActiveValue::Set(goal.deadline),
            created_at: ActiveValue::Set(goal.created_at),
            updated_at: ActiveValue::Set(goal.updated_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            title: model.title,
            target_amount_minor: model.target_amount_minor,
            current_amount_minor: model.current_amount_minor,
            deadline: model.deadline,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::Goal;

    fn goal(current: i64, target: i64) -> Goal {
        let now = Utc::now();
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Bike".to_string(),
            target_amount_minor: target,
            current_amount_minor: current,
            deadline: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(goal(0, 1000).progress_percent(), 0);
        assert_eq!(goal(250, 1000).progress_percent(), 25);
        assert_eq!(goal(5000, 1000).progress_percent(), 100);
    }
}
