use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Bucket, CategoryBreakdown, CompareFilter, Expense, ExpensePatch, Money, NewExpense,
    ResultEngine, analytics, expenses, transactions::validate_amount,
    util::normalize_required_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Expenses of `user_id`, most recent first.
    pub async fn list_expenses(&self, user_id: Uuid) -> ResultEngine<Vec<Expense>> {
        expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(expenses::Column::OccurredAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    pub async fn expense(&self, expense_id: Uuid, user_id: Uuid) -> ResultEngine<Expense> {
        let model = self
            .require_expense(&self.database, expense_id, user_id)
            .await?;
        Expense::try_from(model)
    }

    /// Records an expense. A referenced account must be owned by `user_id`
    /// but its balance is not touched.
    pub async fn create_expense(&self, user_id: Uuid, cmd: NewExpense) -> ResultEngine<Expense> {
        let title = normalize_required_text(&cmd.title, "title")?;
        let category = normalize_required_text(&cmd.category, "category")?;
        validate_amount(cmd.amount_minor)?;
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            title,
            category,
            amount_minor: cmd.amount_minor,
            occurred_at: cmd.occurred_at.unwrap_or(now),
            account_id: cmd.account_id,
            created_at: now,
            updated_at: now,
        };

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            if let Some(account_id) = expense.account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
            }
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            Ok(())
        });
        result?;

        self.notify(format!(
            "New expense added: {} - {}",
            expense.title,
            Money::new(expense.amount_minor)
        ));
        Ok(expense)
    }

    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        user_id: Uuid,
        patch: ExpensePatch,
    ) -> ResultEngine<Expense> {
        let title = patch
            .title
            .as_deref()
            .map(|v| normalize_required_text(v, "title"))
            .transpose()?;
        let category = patch
            .category
            .as_deref()
            .map(|v| normalize_required_text(v, "category"))
            .transpose()?;
        if let Some(amount_minor) = patch.amount_minor {
            validate_amount(amount_minor)?;
        }

        let result: ResultEngine<Expense> = with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id, user_id).await?;
            let mut expense = Expense::try_from(model.clone())?;
            if let Some(account_id) = patch.account_id {
                self.require_account(&db_tx, account_id, user_id).await?;
                expense.account_id = Some(account_id);
            }
            if let Some(title) = title {
                expense.title = title;
            }
            if let Some(category) = category {
                expense.category = category;
            }
            expense.amount_minor = patch.amount_minor.unwrap_or(expense.amount_minor);
            expense.occurred_at = patch.occurred_at.unwrap_or(expense.occurred_at);
            expense.updated_at = Utc::now();

            let mut active = model.into_active_model();
            active.title = ActiveValue::Set(expense.title.clone());
            active.category = ActiveValue::Set(expense.category.clone());
            active.amount_minor = ActiveValue::Set(expense.amount_minor);
            active.occurred_at = ActiveValue::Set(expense.occurred_at);
            active.account_id = ActiveValue::Set(expense.account_id.map(|id| id.to_string()));
            active.updated_at = ActiveValue::Set(expense.updated_at);
            active.update(&db_tx).await?;
            Ok(expense)
        });
        let expense = result?;

        self.notify(format!(
            "Expense updated: {} - {}",
            expense.title,
            Money::new(expense.amount_minor)
        ));
        Ok(expense)
    }

    pub async fn delete_expense(&self, expense_id: Uuid, user_id: Uuid) -> ResultEngine<Expense> {
        let result: ResultEngine<Expense> = with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, expense_id, user_id).await?;
            let expense = Expense::try_from(model)?;
            expenses::Entity::delete_by_id(expense_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(expense)
        });
        let expense = result?;

        self.notify(format!(
            "Expense deleted: {} - {}",
            expense.title,
            Money::new(expense.amount_minor)
        ));
        Ok(expense)
    }

    /// Time-bucketed expense totals relative to today (UTC).
    pub async fn expense_comparison(
        &self,
        user_id: Uuid,
        filter: CompareFilter,
    ) -> ResultEngine<Vec<Bucket>> {
        self.expense_comparison_at(user_id, filter, Utc::now().date_naive())
            .await
    }

    /// Same as [`Engine::expense_comparison`] with an explicit reference date.
    pub async fn expense_comparison_at(
        &self,
        user_id: Uuid,
        filter: CompareFilter,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Bucket>> {
        let expenses = self.list_expenses(user_id).await?;
        analytics::compare(&expenses, filter, today)
    }

    pub async fn expense_breakdown(&self, user_id: Uuid) -> ResultEngine<Vec<CategoryBreakdown>> {
        let expenses = self.list_expenses(user_id).await?;
        analytics::breakdown(expenses)
    }
}
