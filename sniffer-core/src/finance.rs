//! Finance record types exchanged with the upstream feed and the view layer

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category given to items whose category is empty or missing.
pub const UNCATEGORISED: &str = "Uncategorised";
/// Super-category for categories the mapping does not mention.
pub const DISCRETIONARY: &str = "Discretionary";
pub const ESSENTIALS: &str = "Essentials";

/// Categories that never count as spend (compared case-insensitively)
pub const EXCLUDED_CATEGORIES: [&str; 2] = ["Income", "Transfer"];

/// A transaction as supplied by the upstream service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Positive = inflow, negative = outflow
    pub amount: Decimal,
    /// May be empty; see [`normalize_category`]
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: Decimal, category: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns true if money left the account
    pub fn is_outflow(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn normalized_category(&self) -> &str {
        normalize_category(&self.category)
    }
}

/// A precomputed (category, amount) pair from the upstream breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryBreakdownItem {
    pub category: String,
    pub amount: Decimal,
}

impl CategoryBreakdownItem {
    pub fn new(category: impl Into<String>, amount: Decimal) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}

/// One bar of the weekly chart.
///
/// When both `start` and `end` are present they are authoritative and the
/// `week` label is not parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeekPoint {
    pub week: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Net amount for the week, displayed only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

impl WeekPoint {
    pub fn labelled(week: impl Into<String>) -> Self {
        Self {
            week: week.into(),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }
}

/// An inclusive calendar-date range.
///
/// Ranges derived from a label always span seven days (`end = start + 6`).
/// Ranges copied from an explicit [`WeekPoint`] are taken as given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The seven-day range beginning at `start`
    pub fn week_from(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// ISO week label of the week holding `start`, e.g. `2024-W05`
    pub fn iso_label(&self) -> String {
        let week = self.start.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Spend rolled up into one super-category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuperCategoryTotal {
    #[serde(rename = "super")]
    pub super_category: String,
    /// Non-negative, two decimal places
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl SuperCategoryTotal {
    pub fn new(super_category: impl Into<String>, amount: Decimal) -> Self {
        Self {
            super_category: super_category.into(),
            amount,
        }
    }
}

/// Trim a category; empty becomes [`UNCATEGORISED`].
pub fn normalize_category(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNCATEGORISED
    } else {
        trimmed
    }
}

/// Returns true for Income/Transfer in any letter case
pub fn is_excluded(category: &str) -> bool {
    EXCLUDED_CATEGORIES
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(category))
}

/// Round to cents, halves away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
