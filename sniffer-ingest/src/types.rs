use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sniffer_core::WeekPoint;

/// A transaction as the upstream feed sends it, before normalization.
///
/// Accepts the key spellings seen in the wild; amounts may be JSON numbers
/// or strings such as `"-$1,234.50"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(default, alias = "tx_date", alias = "Date")]
    pub date: Option<String>,
    #[serde(default, alias = "Amount")]
    pub amount: Option<Value>,
    #[serde(default, alias = "Category", alias = "cat")]
    pub category: Option<String>,
    #[serde(default, alias = "Description", alias = "details", alias = "payee")]
    pub description: Option<String>,
    /// `0`/`1` or a boolean; hidden rows are listed upstream but never analysed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Value>,
}

impl FeedRecord {
    pub fn is_hidden(&self) -> bool {
        match &self.hidden {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "True"),
            _ => false,
        }
    }
}

/// One entry of the upstream category breakdown, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRecord {
    #[serde(default, alias = "Category", alias = "cat")]
    pub category: Option<String>,
    #[serde(default, alias = "Amount", alias = "total")]
    pub amount: Option<Value>,
}

/// Weekly statistics computed upstream. Displayed as-is, never derived here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyStats {
    pub avg: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub mode_nearest_thousand: Decimal,
}

/// Histogram bin computed upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistBin {
    pub bin_from: Decimal,
    pub bin_to: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyFeed {
    pub points: Vec<WeekPoint>,
    pub stats: WeeklyStats,
}

/// Category list offered for filtering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedFilters {
    pub categories: Vec<String>,
}

/// Payload of one summary query window.
///
/// `transactions` is the table listing: newest first, capped upstream and
/// including hidden rows. Totals should come from `categories` when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryFeed {
    #[serde(alias = "categories_breakdown")]
    pub categories: Vec<BreakdownRecord>,
    pub weekly: WeeklyFeed,
    pub hist: Vec<HistBin>,
    pub transactions: Vec<FeedRecord>,
    pub filters: FeedFilters,
}
