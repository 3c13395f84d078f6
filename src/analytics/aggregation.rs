//! Turns the transaction list into balances and the analytics views.
//!
//! Every function here is pure: the same list (and clock reading) always
//! gives the same result, and the input is never modified.

use std::collections::{BTreeMap, HashMap};

use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::transaction::Transaction;

/// The most merchants listed by [top_merchants].
pub const TOP_MERCHANT_COUNT: usize = 5;

/// Income and spending for one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyStats {
    /// The sum of non-negative amounts.
    pub income: f64,
    /// The sum of the magnitudes of negative amounts.
    pub expense: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MerchantTotal {
    pub merchant: String,
    pub value: f64,
}

/// The running balance after a transaction, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// The date part of `inserted_at`, or an empty string if it is unknown.
    pub date: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Over,
    Under,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetComparison {
    /// The month as "YYYY-MM".
    pub month: String,
    pub status: BudgetStatus,
    /// The distance between the month's spending and the budget, always non-negative.
    pub difference: f64,
}

/// The sum of all transaction amounts.
pub fn balance(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum()
}

/// Group income and spending by calendar month, keyed as "YYYY-MM".
///
/// The month is taken from `inserted_at` in the local timezone given by
/// `local_offset`. Transactions without a usable timestamp are counted in
/// the month of `now`.
pub fn monthly_stats(
    transactions: &[Transaction],
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> BTreeMap<String, MonthlyStats> {
    let mut stats: BTreeMap<String, MonthlyStats> = BTreeMap::new();

    for transaction in transactions {
        let timestamp = transaction
            .inserted_at
            .as_deref()
            .and_then(|inserted_at| OffsetDateTime::parse(inserted_at, &Rfc3339).ok())
            .unwrap_or(now)
            .to_offset(local_offset);

        let entry = stats.entry(month_key(timestamp)).or_default();

        if transaction.amount >= 0.0 {
            entry.income += transaction.amount;
        } else {
            entry.expense += transaction.amount.abs();
        }
    }

    stats
}

fn month_key(timestamp: OffsetDateTime) -> String {
    format!("{:04}-{:02}", timestamp.year(), u8::from(timestamp.month()))
}

/// Sum the magnitude of amounts per category, in the order categories first appear.
pub fn category_totals(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions {
        match positions.get(transaction.category.as_str()) {
            Some(&index) => totals[index].value += transaction.amount.abs(),
            None => {
                positions.insert(&transaction.category, totals.len());
                totals.push(CategoryTotal {
                    category: transaction.category.clone(),
                    value: transaction.amount.abs(),
                });
            }
        }
    }

    totals
}

/// The merchants with the largest totals, largest first.
///
/// Transactions without a merchant are skipped. Ties keep the order in which
/// the merchants first appear.
pub fn top_merchants(transactions: &[Transaction]) -> Vec<MerchantTotal> {
    let mut totals: Vec<MerchantTotal> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions {
        if transaction.merchant.is_empty() {
            continue;
        }

        match positions.get(transaction.merchant.as_str()) {
            Some(&index) => totals[index].value += transaction.amount.abs(),
            None => {
                positions.insert(&transaction.merchant, totals.len());
                totals.push(MerchantTotal {
                    merchant: transaction.merchant.clone(),
                    value: transaction.amount.abs(),
                });
            }
        }
    }

    // `sort_by` is stable, so equal totals stay in first-seen order.
    totals.sort_by(|a, b| b.value.total_cmp(&a.value));
    totals.truncate(TOP_MERCHANT_COUNT);

    totals
}

/// The running balance over the list from oldest to newest.
///
/// The list is stored newest first, so it is walked in reverse.
pub fn balance_trend(transactions: &[Transaction]) -> Vec<TrendPoint> {
    let mut running_balance = 0.0;

    transactions
        .iter()
        .rev()
        .map(|transaction| {
            running_balance += transaction.amount;

            TrendPoint {
                date: transaction
                    .inserted_at
                    .as_deref()
                    .map(|inserted_at| inserted_at.chars().take(10).collect())
                    .unwrap_or_default(),
                balance: running_balance,
            }
        })
        .collect()
}

/// Compare each month's spending against `budget`.
///
/// A month is over budget only when spending is strictly greater than the budget.
pub fn compare_to_budget(
    monthly: &BTreeMap<String, MonthlyStats>,
    budget: f64,
) -> Vec<BudgetComparison> {
    monthly
        .iter()
        .map(|(month, stats)| BudgetComparison {
            month: month.clone(),
            status: if stats.expense > budget {
                BudgetStatus::Over
            } else {
                BudgetStatus::Under
            },
            difference: (stats.expense - budget).abs(),
        })
        .collect()
}

/// All of the analytics views for one transaction list.
#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    pub balance: f64,
    pub monthly: BTreeMap<String, MonthlyStats>,
    pub categories: Vec<CategoryTotal>,
    pub merchants: Vec<MerchantTotal>,
    pub trend: Vec<TrendPoint>,
    pub budget: Vec<BudgetComparison>,
}

impl Analytics {
    pub fn compute(
        transactions: &[Transaction],
        budget: f64,
        now: OffsetDateTime,
        local_offset: UtcOffset,
    ) -> Self {
        let monthly = monthly_stats(transactions, now, local_offset);
        let budget = compare_to_budget(&monthly, budget);

        Self {
            balance: balance(transactions),
            categories: category_totals(transactions),
            merchants: top_merchants(transactions),
            trend: balance_trend(transactions),
            monthly,
            budget,
        }
    }
}
