use chrono::Utc;
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Bill, BillPatch, EngineError, NewBill, ResultEngine, bills,
    money::ensure_in_range,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

fn validate_bill_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "bill amount_minor must be >= 0".to_string(),
        ));
    }
    ensure_in_range(amount_minor, "amount_minor")
}

fn describe(bill: &Bill) -> String {
    match bill.plan.as_deref() {
        Some(plan) => format!("{} - {plan}", bill.vendor),
        None => bill.vendor.clone(),
    }
}

impl Engine {
    /// Bills of `user_id`, earliest due date first.
    pub async fn list_bills(&self, user_id: Uuid) -> ResultEngine<Vec<Bill>> {
        bills::Entity::find()
            .filter(bills::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(bills::Column::DueDate)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Bill::try_from)
            .collect()
    }

    pub async fn bill(&self, bill_id: Uuid, user_id: Uuid) -> ResultEngine<Bill> {
        let model = self.require_bill(&self.database, bill_id, user_id).await?;
        Bill::try_from(model)
    }

    pub async fn create_bill(&self, user_id: Uuid, cmd: NewBill) -> ResultEngine<Bill> {
        let vendor = normalize_required_text(&cmd.vendor, "vendor")?;
        validate_bill_amount(cmd.amount_minor)?;
        let now = Utc::now();
        let bill = Bill {
            id: Uuid::new_v4(),
            user_id,
            vendor,
            plan: normalize_optional_text(cmd.plan.as_deref()),
            due_date: cmd.due_date,
            amount_minor: cmd.amount_minor,
            logo_url: normalize_optional_text(cmd.logo_url.as_deref()),
            last_charge_date: cmd.last_charge_date,
            created_at: now,
            updated_at: now,
        };

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            bills::ActiveModel::from(&bill).insert(&db_tx).await?;
            Ok(())
        });
        result?;

        self.notify(format!("New bill created: {}", describe(&bill)));
        Ok(bill)
    }

    pub async fn update_bill(
        &self,
        bill_id: Uuid,
        user_id: Uuid,
        patch: BillPatch,
    ) -> ResultEngine<Bill> {
        let vendor = patch
            .vendor
            .as_deref()
            .map(|v| normalize_required_text(v, "vendor"))
            .transpose()?;
        if let Some(amount_minor) = patch.amount_minor {
            validate_bill_amount(amount_minor)?;
        }

        let result: ResultEngine<Bill> = with_tx!(self, |db_tx| {
            let model = self.require_bill(&db_tx, bill_id, user_id).await?;
            let mut bill = Bill::try_from(model.clone())?;
            if let Some(vendor) = vendor {
                bill.vendor = vendor;
            }
            bill.plan = apply_optional_text_patch(bill.plan, patch.plan.as_deref());
            bill.logo_url = apply_optional_text_patch(bill.logo_url, patch.logo_url.as_deref());
            bill.due_date = patch.due_date.unwrap_or(bill.due_date);
            bill.amount_minor = patch.amount_minor.unwrap_or(bill.amount_minor);
            bill.last_charge_date = patch.last_charge_date.or(bill.last_charge_date);
            bill.updated_at = Utc::now();

            let mut active = model.into_active_model();
            active.vendor = ActiveValue::Set(bill.vendor.clone());
            active.plan = ActiveValue::Set(bill.plan.clone());
            active.logo_url = ActiveValue::Set(bill.logo_url.clone());
            active.due_date = ActiveValue::Set(bill.due_date);
            active.amount_minor = ActiveValue::Set(bill.amount_minor);
            active.last_charge_date = ActiveValue::Set(bill.last_charge_date);
            active.updated_at = ActiveValue::Set(bill.updated_at);
            active.update(&db_tx).await?;
            Ok(bill)
        });
        let bill = result?;

        self.notify(format!("Bill updated: {}", describe(&bill)));
        Ok(bill)
    }

    pub async fn delete_bill(&self, bill_id: Uuid, user_id: Uuid) -> ResultEngine<Bill> {
        let result: ResultEngine<Bill> = with_tx!(self, |db_tx| {
            let model = self.require_bill(&db_tx, bill_id, user_id).await?;
            let bill = Bill::try_from(model)?;
            bills::Entity::delete_by_id(bill_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(bill)
        });
        let bill = result?;

        self.notify(format!("Bill deleted: {}", describe(&bill)));
        Ok(bill)
    }
}
