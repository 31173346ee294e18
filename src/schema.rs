use crate::aggregator::split_visible;
use crate::error::{AnalyticsError, Result};
use crate::utils::{
    first_day_of_month, first_day_of_year, last_day_of_month, parse_period_string, shift_months,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bucket used for records that arrive without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Bucket used for records that arrive without a merchant.
pub const UNKNOWN_MERCHANT_LABEL: &str = "Unknown";

/// Currency reported by snapshots built in unified mode.
pub const UNIFIED_CURRENCY: &str = "ALL";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    #[schemars(description = "Money received (salary, refunds, interest)")]
    Income,

    #[schemars(description = "Money spent (purchases, bills, subscriptions)")]
    Expense,

    #[schemars(description = "Movement between the user's own accounts")]
    Transfer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionTypeFilter {
    #[default]
    Expense,
    Income,
    All,
}

impl TransactionTypeFilter {
    /// Every filter, in the order a selector presents them.
    pub const ALL_FILTERS: [TransactionTypeFilter; 3] = [
        TransactionTypeFilter::Expense,
        TransactionTypeFilter::Income,
        TransactionTypeFilter::All,
    ];

    pub fn matches(&self, transaction_type: TransactionType) -> bool {
        match self {
            TransactionTypeFilter::Expense => transaction_type == TransactionType::Expense,
            TransactionTypeFilter::Income => transaction_type == TransactionType::Income,
            TransactionTypeFilter::All => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionTypeFilter::Expense => "Expenses",
            TransactionTypeFilter::Income => "Income",
            TransactionTypeFilter::All => "All",
        }
    }

    /// Number of filters that differ from their default, for an "active filters" badge.
    pub fn active_filter_count(&self) -> usize {
        if *self == TransactionTypeFilter::default() {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TransactionRecord {
    #[schemars(description = "Signed amount in the record's currency. Expenses are usually negative.")]
    pub amount: Decimal,

    #[schemars(description = "ISO 4217 currency code, e.g. 'USD'")]
    pub currency: String,

    pub category: String,

    pub merchant: String,

    pub timestamp: NaiveDateTime,

    pub transaction_type: TransactionType,

    #[schemars(
        description = "Set by the upstream recurring-payment detector when this record belongs to a subscription."
    )]
    #[serde(default)]
    pub is_recurring: bool,
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn all_time() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    /// Parses "YYYY-MM" or "YYYY-MM:YYYY-MM" into a range of whole months.
    pub fn parse(period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        Self::new(start, end)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(AnalyticsError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimePeriod {
    #[schemars(description = "From the first of the current month up to today")]
    ThisMonth,

    #[schemars(description = "The whole previous calendar month")]
    LastMonth,

    #[schemars(description = "The current month and the two before it, up to today")]
    LastThreeMonths,

    #[schemars(description = "The current month and the five before it, up to today")]
    LastSixMonths,

    #[schemars(description = "From January 1st of the current year up to today")]
    ThisYear,

    AllTime,

    Custom(DateRange),
}

impl TimePeriod {
    /// The periods offered as one-tap presets.
    pub const PRESETS: [TimePeriod; 6] = [
        TimePeriod::ThisMonth,
        TimePeriod::LastMonth,
        TimePeriod::LastThreeMonths,
        TimePeriod::LastSixMonths,
        TimePeriod::ThisYear,
        TimePeriod::AllTime,
    ];

    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        let (start, end) = match self {
            TimePeriod::ThisMonth => (first_day_of_month(today), today),
            TimePeriod::LastMonth => {
                let previous = shift_months(first_day_of_month(today), -1);
                (previous, last_day_of_month(previous))
            }
            TimePeriod::LastThreeMonths => (shift_months(first_day_of_month(today), -2), today),
            TimePeriod::LastSixMonths => (shift_months(first_day_of_month(today), -5), today),
            TimePeriod::ThisYear => (first_day_of_year(today), today),
            TimePeriod::AllTime => return DateRange::all_time(),
            TimePeriod::Custom(range) => return *range,
        };
        DateRange { start, end }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, TimePeriod::Custom(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencySelection {
    #[schemars(description = "Only records in this ISO 4217 currency")]
    Code(String),

    #[schemars(
        description = "Records in every currency, summed as-is without conversion"
    )]
    Unified,
}

impl CurrencySelection {
    pub fn matches(&self, currency: &str) -> bool {
        match self {
            CurrencySelection::Code(code) => code.trim().eq_ignore_ascii_case(currency.trim()),
            CurrencySelection::Unified => true,
        }
    }

    pub fn is_unified(&self) -> bool {
        matches!(self, CurrencySelection::Unified)
    }

    /// Currency label carried by snapshots built with this selection.
    pub fn display_code(&self) -> String {
        match self {
            CurrencySelection::Code(code) => code.trim().to_uppercase(),
            CurrencySelection::Unified => UNIFIED_CURRENCY.to_string(),
        }
    }
}

/// The filter set that decides which records feed a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AggregationWindow {
    pub period: DateRange,
    pub currency: CurrencySelection,
    #[serde(default)]
    pub type_filter: TransactionTypeFilter,
}

impl AggregationWindow {
    pub fn new(
        period: DateRange,
        currency: CurrencySelection,
        type_filter: TransactionTypeFilter,
    ) -> Self {
        Self {
            period,
            currency,
            type_filter,
        }
    }

    pub fn includes(&self, record: &TransactionRecord) -> bool {
        self.period.contains(record.timestamp)
            && self.currency.matches(&record.currency)
            && self.type_filter.matches(record.transaction_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryData {
    pub name: String,
    pub amount: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MerchantData {
    pub name: String,
    pub amount: Decimal,
    pub transaction_count: usize,
    pub is_subscription: bool,
}

impl MerchantData {
    /// e.g. "1 transaction" or "12 transactions • Subscription"
    pub fn activity_label(&self) -> String {
        let noun = if self.transaction_count == 1 {
            "transaction"
        } else {
            "transactions"
        };
        let mut label = format!("{} {}", self.transaction_count, noun);
        if self.is_subscription {
            label.push_str(" • Subscription");
        }
        label
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_spending: Decimal,
    pub transaction_count: usize,
    pub average_amount: Decimal,
    pub top_category: Option<String>,
    /// Share of `total_spending` held by `top_category`, in `[0, 1]`.
    pub top_category_percentage: f64,
    pub category_breakdown: Vec<CategoryData>,
    pub top_merchants: Vec<MerchantData>,
    pub currency: String,
}

impl AnalyticsSnapshot {
    pub fn empty(currency: impl Into<String>) -> Self {
        Self {
            total_spending: Decimal::ZERO,
            transaction_count: 0,
            average_amount: Decimal::ZERO,
            top_category: None,
            top_category_percentage: 0.0,
            category_breakdown: Vec::new(),
            top_merchants: Vec::new(),
            currency: currency.into(),
        }
    }

    /// Whether there is anything worth summarising in this window.
    pub fn has_activity(&self) -> bool {
        self.total_spending > Decimal::ZERO || self.transaction_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.category_breakdown.is_empty() && self.top_merchants.is_empty()
    }

    /// Category rows as `(label, amount)` pairs, the input shape of the chart layouts.
    pub fn category_series(&self) -> Vec<(String, Decimal)> {
        self.category_breakdown
            .iter()
            .map(|c| (c.name.clone(), c.amount))
            .collect()
    }

    /// Merchants beyond the first `visible` rows of the expandable list.
    pub fn hidden_merchants(&self, visible: usize) -> &[MerchantData] {
        split_visible(&self.top_merchants, visible).1
    }

    pub fn merchant_series(&self) -> Vec<(String, Decimal)> {
        self.top_merchants
            .iter()
            .map(|m| (m.name.clone(), m.amount))
            .collect()
    }
}
