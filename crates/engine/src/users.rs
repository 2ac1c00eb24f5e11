//! Users: local credentials and profile.
//!
//! Every other record is scoped by `user_id`, which is the user's UUID.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A registered user, without the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub avatar_id: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_id: Option<String>,
    pub avatar_url: Option<String>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            email: model.email,
            full_name: model.full_name,
            avatar_id: model.avatar_id,
            avatar_url: model.avatar_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl User {
    pub(crate) fn active_model(&self, password_hash: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            email: ActiveValue::Set(self.email.clone()),
            full_name: ActiveValue::Set(self.full_name.clone()),
            password_hash: ActiveValue::Set(password_hash),
            avatar_id: ActiveValue::Set(self.avatar_id.clone()),
            avatar_url: ActiveValue::Set(self.avatar_url.clone()),
            reset_token_hash: ActiveValue::NotSet,
            reset_token_expires_at: ActiveValue::NotSet,
            created_at: ActiveValue::Set(self.created_at),
            updated_at: ActiveValue::Set(self.updated_at),
        }
    }
}
