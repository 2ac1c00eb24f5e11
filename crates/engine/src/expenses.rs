//! Standalone expense records used by the analytics views.
//!
//! An expense may name an account for reference, but it never changes that
//! account's balance.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub occurred_at: DateTime<Utc>,
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    pub account_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            user_id: ActiveValue::Set(expense.user_id.to_string()),
            title: ActiveValue::Set(expense.title.clone()),
            category: ActiveValue::Set(expense.category.clone()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            occurred_at: ActiveValue::Set(expense.occurred_at),
            account_id: ActiveValue::Set(expense.account_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            title: model.title,
            category: model.category,
            amount_minor: model.amount_minor,
            occurred_at: model.occurred_at,
            account_id: model
                .account_id
                .as_deref()
                .map(|id| parse_uuid(id, "account"))
                .transpose()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
