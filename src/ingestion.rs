use crate::error::{AnalyticsError, Result};
use crate::schema::{
    TransactionRecord, TransactionType, UNCATEGORIZED_LABEL, UNKNOWN_MERCHANT_LABEL,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A flat row as a query layer or CSV export hands it over: optional
/// category/merchant, free-form currency casing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub amount: Decimal,
    pub currency: String,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub timestamp: NaiveDateTime,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub is_recurring: Option<bool>,
}

pub fn convert_rows_to_records(rows: &[TransactionRow]) -> Result<Vec<TransactionRecord>> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let currency = normalize_currency(idx, &row.currency)?;
            Ok(TransactionRecord {
                amount: row.amount,
                currency,
                category: group_name(row.category.as_deref(), UNCATEGORIZED_LABEL),
                merchant: group_name(row.merchant.as_deref(), UNKNOWN_MERCHANT_LABEL),
                timestamp: row.timestamp,
                transaction_type: row.transaction_type,
                is_recurring: row.is_recurring.unwrap_or(false),
            })
        })
        .collect()
}

/// Checks the parts of a record the aggregator cannot repair on its own.
pub fn validate_record(idx: usize, record: &TransactionRecord) -> Result<()> {
    normalize_currency(idx, &record.currency).map(|_| ())
}

/// Trimmed group key, or `fallback` when the name is missing or blank.
pub fn group_name(name: Option<&str>, fallback: &str) -> String {
    match name.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => fallback.to_string(),
    }
}

pub fn normalize_currency(idx: usize, currency: &str) -> Result<String> {
    let code = currency.trim();
    if code.is_empty() {
        return Err(AnalyticsError::ValidationError {
            record: idx,
            details: "currency code is blank".to_string(),
        });
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AnalyticsError::ValidationError {
            record: idx,
            details: format!("currency code '{}' contains invalid characters", code),
        });
    }
    Ok(code.to_ascii_uppercase())
}
