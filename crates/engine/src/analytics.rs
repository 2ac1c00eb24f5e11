//! Expense aggregation: time-bucketed comparison and per-category breakdown.
//!
//! Both views are pure functions over a user's expenses so they can be tested
//! without a database. The engine only loads the rows and supplies "today".

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Expense, ResultEngine, calendar,
    money::{checked_total, sum_minor},
};

/// Days covered by the daily comparison, today included.
pub const DAILY_WINDOW_DAYS: i64 = 30;
/// Years covered by the yearly comparison, the current one included.
pub const YEARLY_WINDOW: i32 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareFilter {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl CompareFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for CompareFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly]
            .into_iter()
            .find(|filter| filter.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::Validation(format!("unknown comparison filter: {s}")))
    }
}

/// One labeled aggregation unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub total_minor: i64,
}

impl Bucket {
    fn new(label: impl Into<String>, total_minor: i64) -> Self {
        Self {
            label: label.into(),
            total_minor,
        }
    }
}

/// Buckets `expenses` according to `filter`, relative to `today` (UTC date).
///
/// - `Daily`: 30 entries `today-29..=today`, labeled `YYYY-MM-DD`.
/// - `Weekly`: one entry per week number that has data, ascending, labeled
///   `Week N`. Weeks are keyed by number only, so the same week of different
///   years shares a bucket.
/// - `Monthly`: 12 entries `Jan`..`Dec` for the year of `today`.
/// - `Yearly`: 5 entries from `year-4` to `year`.
///
/// Missing periods are emitted with a zero total except in the weekly view.
/// A bucket total that does not fit `i64` is an `InvalidAmount` error.
pub fn compare(
    expenses: &[Expense],
    filter: CompareFilter,
    today: NaiveDate,
) -> ResultEngine<Vec<Bucket>> {
    match filter {
        CompareFilter::Daily => daily(expenses, today),
        CompareFilter::Weekly => weekly(expenses),
        CompareFilter::Monthly => monthly(expenses, today.year()),
        CompareFilter::Yearly => yearly(expenses, today.year()),
    }
}

fn daily(expenses: &[Expense], today: NaiveDate) -> ResultEngine<Vec<Bucket>> {
    let start = today - Duration::days(DAILY_WINDOW_DAYS - 1);
    let mut totals: HashMap<NaiveDate, i64> = HashMap::new();
    for expense in expenses {
        let day = expense.occurred_at.date_naive();
        if day >= start && day <= today {
            let total = totals.entry(day).or_default();
            *total = checked_total(*total, expense.amount_minor)?;
        }
    }

    Ok(start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| {
            Bucket::new(
                day.format("%Y-%m-%d").to_string(),
                totals.get(&day).copied().unwrap_or(0),
            )
        })
        .collect())
}

fn weekly(expenses: &[Expense]) -> ResultEngine<Vec<Bucket>> {
    let mut totals: BTreeMap<u32, i64> = BTreeMap::new();
    for expense in expenses {
        let week = calendar::week_of_year(expense.occurred_at.date_naive());
        let total = totals.entry(week).or_default();
        *total = checked_total(*total, expense.amount_minor)?;
    }
    Ok(totals
        .into_iter()
        .map(|(week, total)| Bucket::new(format!("Week {week}"), total))
        .collect())
}

fn monthly(expenses: &[Expense], year: i32) -> ResultEngine<Vec<Bucket>> {
    let mut totals = [0_i64; 12];
    for expense in expenses {
        let date = expense.occurred_at.date_naive();
        if date.year() == year {
            let total = &mut totals[date.month0() as usize];
            *total = checked_total(*total, expense.amount_minor)?;
        }
    }
    Ok(calendar::MONTH_LABELS
        .iter()
        .zip(totals)
        .map(|(label, total)| Bucket::new(*label, total))
        .collect())
}

fn yearly(expenses: &[Expense], year: i32) -> ResultEngine<Vec<Bucket>> {
    let first = year - (YEARLY_WINDOW - 1);
    let mut totals: BTreeMap<i32, i64> = (first..=year).map(|y| (y, 0)).collect();
    for expense in expenses {
        if let Some(total) = totals.get_mut(&expense.occurred_at.year()) {
            *total = checked_total(*total, expense.amount_minor)?;
        }
    }
    Ok(totals
        .into_iter()
        .map(|(y, total)| Bucket::new(y.to_string(), total))
        .collect())
}

/// Expenses of one category with their total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total_minor: i64,
    /// Reserved; always 0.
    pub change_percent: i64,
    pub items: Vec<Expense>,
}

/// Groups expenses by category, categories in ascending order.
pub fn breakdown(expenses: Vec<Expense>) -> ResultEngine<Vec<CategoryBreakdown>> {
    let mut groups: BTreeMap<String, Vec<Expense>> = BTreeMap::new();
    for expense in expenses {
        groups
            .entry(expense.category.clone())
            .or_default()
            .push(expense);
    }
    groups
        .into_iter()
        .map(|(category, items)| {
            Ok(CategoryBreakdown {
                category,
                total_minor: sum_minor(items.iter().map(|e| e.amount_minor))?,
                change_percent: 0,
                items,
            })
        })
        .collect()
}
