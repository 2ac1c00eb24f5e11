//! The module contains `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A bank account.
///
/// `balance_minor` is a denormalized running balance. The ledger keeps it equal
/// to `opening_balance_minor` plus the signed effect of every transaction
/// referencing the account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_type: String,
    pub branch_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub balance_minor: i64,
    pub opening_balance_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_type: String,
    pub branch_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub balance_minor: i64,
    pub opening_balance_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            user_id: ActiveValue::Set(account.user_id.to_string()),
            account_type: ActiveValue::Set(account.account_type.clone()),
            branch_name: ActiveValue::Set(account.branch_name.clone()),
            account_number: ActiveValue::Set(account.account_number.clone()),
            bank_name: ActiveValue::Set(account.bank_name.clone()),
            balance_minor: ActiveValue::Set(account.balance_minor),
            opening_balance_minor: ActiveValue::Set(account.opening_balance_minor),
            created_at: ActiveValue::Set(account.created_at),
            updated_at: ActiveValue::Set(account.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            account_type: model.account_type,
            branch_name: model.branch_name,
            account_number: model.account_number,
            bank_name: model.bank_name,
            balance_minor: model.balance_minor,
            opening_balance_minor: model.opening_balance_minor,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
