//! Normalization of upstream records into the canonical core shapes.
//!
//! This runs once at the ingestion boundary so the rollup and resolver never
//! see alias keys, string amounts or padded descriptions.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sniffer_core::{CategoryBreakdownItem, Transaction, WeekPoint};
use std::collections::HashSet;
use std::str::FromStr;
use sniffer_core::time::parse_calendar_date;
use tracing::{debug, warn};

use crate::types::{BreakdownRecord, FeedRecord, HistBin, SummaryFeed, WeeklyStats};

/// Date formats accepted from feeds and statement exports, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// A summary feed after normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFeed {
    pub breakdown: Vec<CategoryBreakdownItem>,
    pub points: Vec<WeekPoint>,
    pub stats: WeeklyStats,
    pub hist: Vec<HistBin>,
    pub transactions: Vec<Transaction>,
    /// Category names the feed offers for filtering
    pub filter_categories: Vec<String>,
    /// Records dropped because a date or amount could not be read
    pub skipped: usize,
    /// Transactions dropped because upstream marks them hidden
    pub hidden: usize,
}

impl SummaryFeed {
    /// Normalize every record, skipping (and logging) the unreadable ones.
    pub fn normalize(self) -> NormalizedFeed {
        let mut skipped = 0;

        let breakdown = self
            .categories
            .iter()
            .filter_map(|record| match normalize_breakdown_item(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("skipping breakdown entry: {e:#}");
                    skipped += 1;
                    None
                }
            })
            .collect();

        let (hidden, visible): (Vec<_>, Vec<_>) =
            self.transactions.iter().partition(|record| record.is_hidden());
        if !hidden.is_empty() {
            debug!(hidden = hidden.len(), "dropping hidden feed transactions");
        }

        let transactions = visible
            .into_iter()
            .filter_map(|record| match normalize_transaction(record) {
                Ok(tx) => Some(tx),
                Err(e) => {
                    warn!("skipping feed transaction: {e:#}");
                    skipped += 1;
                    None
                }
            })
            .collect();

        NormalizedFeed {
            breakdown,
            points: self.weekly.points,
            stats: self.weekly.stats,
            hist: self.hist,
            transactions,
            filter_categories: self.filters.categories,
            skipped,
            hidden: hidden.len(),
        }
    }
}

pub fn normalize_transaction(record: &FeedRecord) -> Result<Transaction> {
    let date_raw = record.date.as_deref().context("transaction has no date")?;
    let date = parse_date(date_raw).with_context(|| format!("bad date {date_raw:?}"))?;
    let amount = record
        .amount
        .as_ref()
        .context("transaction has no amount")
        .and_then(amount_from_value)?;

    let tx = Transaction::new(date, amount, record.category.as_deref().unwrap_or("").trim());
    Ok(tx.with_description(collapse_whitespace(
        record.description.as_deref().unwrap_or(""),
    )))
}

pub fn normalize_breakdown_item(record: &BreakdownRecord) -> Result<CategoryBreakdownItem> {
    let amount = record
        .amount
        .as_ref()
        .context("breakdown entry has no amount")
        .and_then(amount_from_value)?;
    Ok(CategoryBreakdownItem::new(
        record.category.as_deref().unwrap_or("").trim(),
        amount,
    ))
}

/// Read a date in any of the accepted formats.
///
/// Also takes `2024-03-04T00:00:00` and the HTTP-date form
/// (`Mon, 04 Mar 2024 00:00:00 GMT`) that JSON encoders emit for timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_calendar_date(raw))
        .or_else(|| {
            DateTime::parse_from_rfc2822(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse `-$1,234.50`, `1234.5` or `$-3` into a decimal.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Err(anyhow!("empty amount"));
    }
    Decimal::from_str(&cleaned).with_context(|| format!("bad amount {raw:?}"))
}

fn amount_from_value(value: &Value) -> Result<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            // serde_json prints large and tiny floats in exponent form
            parse_amount(&text).or_else(|_| {
                Decimal::from_scientific(&text).with_context(|| format!("bad amount {text}"))
            })
        }
        Value::String(s) => parse_amount(s),
        other => Err(anyhow!("amount is not a number: {other}")),
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable identity for a transaction: hex SHA-256 of
/// `date|amount_cents|payee`, payee lowercased and whitespace-collapsed.
pub fn fingerprint(tx: &Transaction) -> String {
    let cents = (tx.amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let payee = collapse_whitespace(&tx.description).to_lowercase();
    let key = format!("{}|{}|{}", tx.date, cents, payee);
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Drop transactions whose fingerprint was already seen, keeping the first.
pub fn dedupe(txns: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    txns.into_iter()
        .filter(|tx| seen.insert(fingerprint(tx)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FeedRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_transaction() {
        let tx = normalize_transaction(&record(json!({
            "tx_date": "2024-03-04",
            "amount": "-$1,234.50",
            "Category": "  Rent ",
            "description": "  ACME   Property\tMgmt "
        })))
        .unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(tx.amount, Decimal::from_str("-1234.50").unwrap());
        assert_eq!(tx.category, "Rent");
        assert_eq!(tx.description, "ACME Property Mgmt");
    }

    #[test]
    fn test_normalize_day_month_year_and_numeric_amount() {
        let tx = normalize_transaction(&record(json!({"date": "04/03/2024", "amount": -12.5})))
            .unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(tx.amount, Decimal::from_str("-12.5").unwrap());
        assert_eq!(tx.category, "");
    }

    #[test]
    fn test_normalize_rejects_missing_fields() {
        assert!(normalize_transaction(&record(json!({"amount": 1}))).is_err());
        assert!(normalize_transaction(&record(json!({"date": "2024-03-04"}))).is_err());
        assert!(normalize_transaction(&record(json!({"date": "yesterday", "amount": 1}))).is_err());
        assert!(
            normalize_transaction(&record(json!({"date": "2024-03-04", "amount": true}))).is_err()
        );
    }

    #[test]
    fn test_normalize_exponent_amounts() {
        let big = normalize_transaction(&record(json!({"date": "2024-03-04", "amount": 1e16})))
            .unwrap();
        assert_eq!(big.amount, Decimal::from(10_000_000_000_000_000i64));
        let tiny =
            normalize_transaction(&record(json!({"date": "2024-03-04", "amount": -1.5e-5})))
                .unwrap();
        assert_eq!(tiny.amount, Decimal::from_str("-0.000015").unwrap());
    }

    #[test]
    fn test_parse_date_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4);
        assert_eq!(parse_date("Mon, 04 Mar 2024 00:00:00 GMT"), expected);
        assert_eq!(parse_date("2024-03-04T00:00:00"), expected);
        assert_eq!(parse_date("2024-03-04 13:45:00"), expected);
        assert_eq!(parse_date("March 4th"), None);
    }

    #[test]
    fn test_normalize_feed_drops_hidden_transactions() {
        let feed: SummaryFeed = serde_json::from_value(json!({
            "transactions": [
                {"tx_date": "2024-03-04", "amount": -10, "category": "Dining", "hidden": 0},
                {"tx_date": "2024-03-05", "amount": -990, "category": "Dining", "hidden": 1}
            ],
            "filters": {"categories": ["Dining"]}
        }))
        .unwrap();
        let normalized = feed.normalize();
        assert_eq!(normalized.transactions.len(), 1);
        assert_eq!(normalized.transactions[0].amount, Decimal::from(-10));
        assert_eq!(normalized.hidden, 1);
        assert_eq!(normalized.skipped, 0);
        assert_eq!(normalized.filter_categories, vec!["Dining"]);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$50.00").unwrap(), Decimal::from(50));
        assert_eq!(parse_amount(" -1,000 ").unwrap(), Decimal::from(-1000));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_normalize_feed_counts_skipped() {
        let feed: SummaryFeed = serde_json::from_value(json!({
            "categories": [
                {"category": "Dining", "amount": -40},
                {"Category": "Rent"}
            ],
            "transactions": [
                {"date": "2024-03-04", "amount": -3, "category": "Dining"},
                {"date": "not a date", "amount": -3}
            ]
        }))
        .unwrap();
        let normalized = feed.normalize();
        assert_eq!(normalized.breakdown.len(), 1);
        assert_eq!(normalized.transactions.len(), 1);
        assert_eq!(normalized.skipped, 2);
    }

    #[test]
    fn test_fingerprint_ignores_scale_and_payee_case() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let a = Transaction::new(date, Decimal::from_str("-5.0").unwrap(), "")
            .with_description("Coffee  Shop");
        let b = Transaction::new(date, Decimal::from_str("-5.00").unwrap(), "Dining")
            .with_description("coffee shop");
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);

        let c = Transaction::new(date, Decimal::from_str("-5.01").unwrap(), "")
            .with_description("coffee shop");
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let first = Transaction::new(date, Decimal::from(-5), "Dining").with_description("cafe");
        let again = Transaction::new(date, Decimal::from(-5), "").with_description("CAFE");
        let other = Transaction::new(date, Decimal::from(-6), "").with_description("cafe");
        let out = dedupe(vec![first.clone(), again, other.clone()]);
        assert_eq!(out, vec![first, other]);
    }
}
