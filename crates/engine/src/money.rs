use std::fmt;

use crate::{EngineError, ResultEngine};

/// Largest magnitude accepted for any single amount or stored balance
/// (10^13 rupees). Sums of bounded values are still checked.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Amount in integer minor units (paise).
///
/// Amounts and balances are stored as `i64` minor units everywhere; `Money`
/// only adds the human formatting used in notifications and CLI output.
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!(Money::new(250_00).to_string(), "250.00");
/// assert_eq!(Money::new(-5).to_string(), "-0.05");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

/// Rejects magnitudes above [`MAX_AMOUNT_MINOR`].
pub(crate) fn ensure_in_range(amount_minor: i64, field: &str) -> ResultEngine<()> {
    if amount_minor.unsigned_abs() > MAX_AMOUNT_MINOR.unsigned_abs() {
        return Err(EngineError::InvalidAmount(format!(
            "{field} must be within ±{MAX_AMOUNT_MINOR}"
        )));
    }
    Ok(())
}

/// `total + amount`, or `InvalidAmount` when the result leaves `i64`.
pub(crate) fn checked_total(total: i64, amount: i64) -> ResultEngine<i64> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::InvalidAmount("total out of range".to_string()))
}

/// Checked sum of minor-unit amounts.
pub(crate) fn sum_minor(amounts: impl IntoIterator<Item = i64>) -> ResultEngine<i64> {
    amounts.into_iter().try_fold(0, checked_total)
}
