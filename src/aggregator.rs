use crate::error::{AnalyticsError, Result};
use crate::ingestion::{group_name, normalize_currency, validate_record};
use crate::schema::*;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Merchant rows shown before the list is expanded.
pub const VISIBLE_MERCHANT_ROWS: usize = 3;

// Running totals for one category or merchant while records are folded in
#[derive(Default)]
struct GroupTotals {
    amount: Decimal,
    count: usize,
    any_recurring: bool,
}

impl GroupTotals {
    fn add(&mut self, idx: usize, record: &TransactionRecord) -> Result<()> {
        self.amount = self
            .amount
            .checked_add(record.amount.abs())
            .ok_or_else(|| overflow_error(idx))?;
        self.count += 1;
        self.any_recurring |= record.is_recurring;
        Ok(())
    }
}

/// Builds the snapshot for one aggregation window.
///
/// Amounts are sign-normalized (absolute values) before summing. Records in
/// other currencies are skipped unless the window is in unified mode, in which
/// case amounts are summed as-is without conversion.
pub fn aggregate(
    records: &[TransactionRecord],
    window: &AggregationWindow,
) -> Result<AnalyticsSnapshot> {
    window.period.validate()?;
    for (idx, record) in records.iter().enumerate() {
        validate_record(idx, record)?;
    }

    let filtered: Vec<(usize, &TransactionRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| window.includes(r))
        .collect();

    debug!(
        "{} of {} records fall inside {}..={} ({:?}, {:?})",
        filtered.len(),
        records.len(),
        window.period.start,
        window.period.end,
        window.currency,
        window.type_filter
    );

    let currency = window.currency.display_code();
    let last_idx = match filtered.last() {
        Some((idx, _)) => *idx,
        None => return Ok(AnalyticsSnapshot::empty(currency)),
    };

    let category_groups = group_records(&filtered, |r| {
        group_name(Some(r.category.as_str()), UNCATEGORIZED_LABEL)
    })?;
    let merchant_groups = group_records(&filtered, |r| {
        group_name(Some(r.merchant.as_str()), UNKNOWN_MERCHANT_LABEL)
    })?;

    let mut category_breakdown: Vec<CategoryData> = category_groups
        .into_iter()
        .map(|(name, totals)| CategoryData {
            name,
            amount: totals.amount,
            transaction_count: totals.count,
        })
        .collect();
    category_breakdown
        .sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));

    let mut top_merchants: Vec<MerchantData> = merchant_groups
        .into_iter()
        .map(|(name, totals)| MerchantData {
            name,
            amount: totals.amount,
            transaction_count: totals.count,
            is_subscription: totals.any_recurring,
        })
        .collect();
    top_merchants.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));

    let total_spending = checked_total(category_breakdown.iter().map(|c| c.amount))
        .ok_or_else(|| overflow_error(last_idx))?;
    let transaction_count = filtered.len();
    let average_amount = total_spending / Decimal::from(transaction_count);

    let top = category_breakdown.first();
    let top_category = top.map(|c| c.name.clone());
    let top_category_percentage = top
        .map(|c| share_of(c.amount, total_spending))
        .unwrap_or(0.0);

    debug!(
        "Aggregated {} categories and {} merchants, total {} {}",
        category_breakdown.len(),
        top_merchants.len(),
        total_spending,
        currency
    );

    Ok(AnalyticsSnapshot {
        total_spending,
        transaction_count,
        average_amount,
        top_category,
        top_category_percentage,
        category_breakdown,
        top_merchants,
        currency,
    })
}

/// One snapshot per distinct currency present in `records`, keyed by code.
pub fn aggregate_per_currency(
    records: &[TransactionRecord],
    period: DateRange,
    type_filter: TransactionTypeFilter,
) -> Result<BTreeMap<String, AnalyticsSnapshot>> {
    for (idx, record) in records.iter().enumerate() {
        validate_record(idx, record)?;
    }

    available_currencies(records)
        .into_iter()
        .map(|code| {
            let selection = CurrencySelection::Code(code.clone());
            let window = AggregationWindow::new(period, selection, type_filter);
            aggregate(records, &window).map(|snapshot| (code, snapshot))
        })
        .collect()
}

/// Sorted, de-duplicated currency codes. Records with unusable codes are skipped.
pub fn available_currencies(records: &[TransactionRecord]) -> Vec<String> {
    let codes: BTreeSet<String> = records
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| normalize_currency(idx, &r.currency).ok())
        .collect();
    codes.into_iter().collect()
}

/// A currency picker only makes sense with several currencies and no unified view.
pub fn should_offer_currency_choice(available: &[String], selection: &CurrencySelection) -> bool {
    available.len() > 1 && !selection.is_unified()
}

/// Splits rows into the ones shown up front and the ones behind "show more".
pub fn split_visible<T>(rows: &[T], n: usize) -> (&[T], &[T]) {
    rows.split_at(n.min(rows.len()))
}

/// The `n` biggest merchants of a snapshot.
pub fn top_merchants(snapshot: &AnalyticsSnapshot, n: usize) -> &[MerchantData] {
    split_visible(&snapshot.top_merchants, n).0
}

/// Sum of `amounts`, or `None` if it does not fit in a `Decimal`.
pub fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

fn overflow_error(record: usize) -> AnalyticsError {
    AnalyticsError::ValidationError {
        record,
        details: "amount total overflows".to_string(),
    }
}

/// Share of `total` held by `amount`, clamped to `[0, 1]`; 0 when `total` is 0.
pub fn share_of(amount: Decimal, total: Decimal) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (amount / total).to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
}

fn group_records<F>(
    records: &[(usize, &TransactionRecord)],
    key: F,
) -> Result<BTreeMap<String, GroupTotals>>
where
    F: Fn(&TransactionRecord) -> String,
{
    let mut groups: BTreeMap<String, GroupTotals> = BTreeMap::new();
    for &(idx, record) in records {
        groups.entry(key(record)).or_default().add(idx, record)?;
    }
    Ok(groups)
}
