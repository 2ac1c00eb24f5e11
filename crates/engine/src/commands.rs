//! Command structs for engine write operations.
//!
//! `New*` types carry the fields required to create a record; `*Patch` types
//! carry a partial update where `None` leaves a field untouched. For optional
//! text fields a blank string clears the stored value.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{PaymentMethod, TransactionKind, TransactionStatus};

/// Register a local user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl NewUser {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
        }
    }
}

/// Stored avatar reference produced by the blob store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarRef {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub avatar: Option<AvatarRef>,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub account_type: String,
    pub branch_name: String,
    pub account_number: String,
    pub bank_name: String,
    /// Opening balance; may be negative (overdraft, credit line).
    pub balance_minor: i64,
}

/// Partial account update.
///
/// Setting `balance_minor` is a direct edit: the opening balance moves with it
/// so that reconciliation keeps agreeing with the stored value.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub account_type: Option<String>,
    pub branch_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub balance_minor: Option<i64>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.account_type.is_none()
            && self.branch_name.is_none()
            && self.account_number.is_none()
            && self.bank_name.is_none()
            && self.balance_minor.is_none()
    }
}

/// Create an income or expense transaction against one account.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub title: Option<String>,
    pub shop: Option<String>,
    pub category: Option<String>,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
    pub method: Option<PaymentMethod>,
    pub status: TransactionStatus,
    pub receipt: Option<String>,
}

impl NewTransaction {
    #[must_use]
    pub fn new(account_id: Uuid, kind: TransactionKind, amount_minor: i64) -> Self {
        Self {
            account_id,
            kind,
            amount_minor,
            title: None,
            shop: None,
            category: None,
            occurred_at: None,
            method: None,
            status: TransactionStatus::default(),
            receipt: None,
        }
    }

    #[must_use]
    pub fn income(account_id: Uuid, amount_minor: i64) -> Self {
        Self::new(account_id, TransactionKind::Income, amount_minor)
    }

    #[must_use]
    pub fn expense(account_id: Uuid, amount_minor: i64) -> Self {
        Self::new(account_id, TransactionKind::Expense, amount_minor)
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn shop(mut self, shop: impl Into<String>) -> Self {
        self.shop = Some(shop.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }
}

/// Partial transaction update (Reapply).
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub account_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub amount_minor: Option<i64>,
    pub title: Option<String>,
    pub shop: Option<String>,
    pub category: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub method: Option<PaymentMethod>,
    pub status: Option<TransactionStatus>,
    pub receipt: Option<String>,
}

impl TransactionPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewBill {
    pub vendor: String,
    pub plan: Option<String>,
    pub due_date: DateTime<Utc>,
    pub amount_minor: i64,
    pub logo_url: Option<String>,
    pub last_charge_date: Option<DateTime<Utc>>,
}

impl NewBill {
    #[must_use]
    pub fn new(vendor: impl Into<String>, due_date: DateTime<Utc>, amount_minor: i64) -> Self {
        Self {
            vendor: vendor.into(),
            plan: None,
            due_date,
            amount_minor,
            logo_url: None,
            last_charge_date: None,
        }
    }

    #[must_use]
    pub fn plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct BillPatch {
    pub vendor: Option<String>,
    pub plan: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub amount_minor: Option<i64>,
    pub logo_url: Option<String>,
    pub last_charge_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct NewGoal {
    pub title: String,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub deadline: DateTime<Utc>,
}

impl NewGoal {
    #[must_use]
    pub fn new(title: impl Into<String>, target_amount_minor: i64, deadline: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            target_amount_minor,
            current_amount_minor: 0,
            deadline,
        }
    }

    #[must_use]
    pub fn current_amount_minor(mut self, current_amount_minor: i64) -> Self {
        self.current_amount_minor = current_amount_minor;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub target_amount_minor: Option<i64>,
    pub current_amount_minor: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct NewExpense {
    pub title: String,
    pub category: String,
    pub amount_minor: i64,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
}

impl NewExpense {
    #[must_use]
    pub fn new(title: impl Into<String>, category: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            amount_minor,
            occurred_at: None,
            account_id: None,
        }
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub amount_minor: Option<i64>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub account_id: Option<Uuid>,
}
