//! Plain-text rendering for terminal output.

use rust_decimal::Decimal;
use sniffer_core::{DateRange, SuperCategoryTotal};

pub fn money(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

pub fn range_line(range: &DateRange) -> String {
    format!("{} | {} .. {}", range.iso_label(), range.start, range.end)
}

/// One aligned `name  $amount` line per total.
pub fn totals_table(totals: &[SuperCategoryTotal]) -> String {
    let width = totals
        .iter()
        .map(|t| t.super_category.len())
        .max()
        .unwrap_or(0);
    totals
        .iter()
        .map(|t| format!("{:<width$}  {:>12}", t.super_category, money(t.amount)))
        .collect::<Vec<_>>()
        .join("\n")
}
