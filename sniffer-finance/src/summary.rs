//! View-ready summary: what the dashboard renders after a refresh.

use serde::Serialize;
use sniffer_core::finance::normalize_category;
use sniffer_core::{
    CategoryBreakdownItem, CategoryMappingConfig, CategoryRollupEngine, DateRange, RollupSource,
    SuperCategoryTotal, Transaction, Unresolved, WeekLabelResolver, WeekPoint,
};
use sniffer_ingest::{HistBin, NormalizedFeed, WeeklyStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    /// Supers that received spend, sorted by name
    pub rollup: Vec<SuperCategoryTotal>,
    /// `rollup` reconciled against the configured supers (zero-filled)
    pub axis: Vec<SuperCategoryTotal>,
    pub breakdown: Vec<CategoryBreakdownItem>,
    pub category_options: Vec<String>,
    pub points: Vec<WeekPoint>,
    pub stats: WeeklyStats,
    pub hist: Vec<HistBin>,
}

impl SummaryView {
    /// Roll up from the breakdown when the feed carries one, else from the
    /// transactions.
    ///
    /// A feed's transaction list is a capped table listing, so it only stands
    /// in for totals when no breakdown was sent.
    pub fn build(feed: &NormalizedFeed, config: &CategoryMappingConfig) -> Self {
        let source = if feed.breakdown.is_empty() {
            RollupSource::Transactions(&feed.transactions)
        } else {
            RollupSource::Breakdown(&feed.breakdown)
        };
        let rollup = CategoryRollupEngine::new(config).rollup(source);

        let known = feed
            .breakdown
            .iter()
            .map(|i| normalize_category(&i.category))
            .chain(feed.transactions.iter().map(Transaction::normalized_category))
            .chain(feed.filter_categories.iter().map(|c| normalize_category(c)));

        Self {
            axis: config.complete_axis(&rollup),
            rollup,
            breakdown: feed.breakdown.clone(),
            category_options: config.category_options(known),
            points: feed.points.clone(),
            stats: feed.stats.clone(),
            hist: feed.hist.clone(),
        }
    }

    /// Summary of a bare transaction list, e.g. a freshly parsed statement.
    pub fn from_transactions(txns: &[Transaction], config: &CategoryMappingConfig) -> Self {
        let feed = NormalizedFeed {
            transactions: txns.to_vec(),
            ..NormalizedFeed::default()
        };
        Self::build(&feed, config)
    }

    /// Date range behind the weekly bar at `index`.
    pub fn resolve_bar(
        &self,
        resolver: &WeekLabelResolver,
        index: usize,
    ) -> Result<DateRange, Unresolved> {
        let point = self.points.get(index).ok_or(Unresolved::NoLabel)?;
        resolver.resolve(None, Some(point))
    }
}

/// Transactions inside `range`, oldest first.
pub fn drill_down(txns: &[Transaction], range: &DateRange) -> Vec<Transaction> {
    let mut out: Vec<Transaction> = txns
        .iter()
        .filter(|tx| range.contains(tx.date))
        .cloned()
        .collect();
    out.sort_by_key(|tx| tx.date);
    out
}
