//! sniffer-ingest: the one place where upstream shapes (feed JSON, bank CSV
//! exports) become the canonical records `sniffer-core` works on.

pub mod normalizer;
pub mod parsers;
pub mod types;

pub use normalizer::{
    NormalizedFeed, dedupe, fingerprint, normalize_breakdown_item, normalize_transaction,
};
pub use parsers::bank_csv::{parse_bank_csv, parse_bank_csv_reader};
pub use types::{BreakdownRecord, FeedRecord, HistBin, SummaryFeed, WeeklyFeed, WeeklyStats};
