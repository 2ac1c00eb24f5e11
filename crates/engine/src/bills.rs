//! Recurring bills (subscriptions, utilities).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vendor: String,
    pub plan: Option<String>,
    pub due_date: DateTime<Utc>,
    pub amount_minor: i64,
    pub logo_url: Option<String>,
    pub last_charge_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub vendor: String,
    pub plan: Option<String>,
    pub due_date: DateTimeUtc,
    pub amount_minor: i64,
    pub logo_url: Option<String>,
    pub last_charge_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Bill> for ActiveModel {
    fn from(bill: &Bill) -> Self {
        Self {
            id: ActiveValue::Set(bill.id.to_string()),
            user_id: ActiveValue::Set(bill.user_id.to_string()),
            vendor: ActiveValue::Set(bill.vendor.clone()),
            plan: ActiveValue::Set(bill.plan.clone()),
            due_date: ActiveValue::Set(bill.due_date),
            amount_minor: ActiveValue::Set(bill.amount_minor),
            logo_url: ActiveValue::Set(bill.logo_url.clone()),
            last_charge_date: ActiveValue::Set(bill.last_charge_date),
            created_at: ActiveValue::Set(bill.created_at),
            updated_at: ActiveValue::Set(bill.updated_at),
        }
    }
}

impl TryFrom<Model> for Bill {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "bill")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            vendor: model.vendor,
            plan: model.plan,
            due_date: model.due_date,
            amount_minor: model.amount_minor,
            logo_url: model.logo_url,
            last_charge_date: model.last_charge_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
