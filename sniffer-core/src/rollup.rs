//! Roll per-category spend up into super-categories.
//!
//! Per item: normalize the category, drop Income/Transfer, pick the super via
//! the mapping (unmapped → Discretionary, Uncategorised stays put), then add
//! the magnitude. Totals are rounded once, after accumulation.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::finance::{
    CategoryBreakdownItem, SuperCategoryTotal, Transaction, is_excluded, normalize_category,
    round_money,
};
use crate::mapping::CategoryMappingConfig;

/// Input to a rollup: raw transactions or an upstream breakdown.
#[derive(Debug, Clone, Copy)]
pub enum RollupSource<'a> {
    /// Only outflows (negative amounts) count as spend.
    Transactions(&'a [Transaction]),
    /// Assumed pre-filtered upstream; every amount counts by magnitude.
    Breakdown(&'a [CategoryBreakdownItem]),
}

impl<'a> From<&'a [Transaction]> for RollupSource<'a> {
    fn from(txns: &'a [Transaction]) -> Self {
        RollupSource::Transactions(txns)
    }
}

impl<'a> From<&'a [CategoryBreakdownItem]> for RollupSource<'a> {
    fn from(items: &'a [CategoryBreakdownItem]) -> Self {
        RollupSource::Breakdown(items)
    }
}

impl<'a> From<&'a Vec<Transaction>> for RollupSource<'a> {
    fn from(txns: &'a Vec<Transaction>) -> Self {
        RollupSource::Transactions(txns)
    }
}

impl<'a> From<&'a Vec<CategoryBreakdownItem>> for RollupSource<'a> {
    fn from(items: &'a Vec<CategoryBreakdownItem>) -> Self {
        RollupSource::Breakdown(items)
    }
}

impl RollupSource<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            RollupSource::Transactions(txns) => txns.is_empty(),
            RollupSource::Breakdown(items) => items.is_empty(),
        }
    }

    /// (category, spend) for every item that contributes, before exclusion.
    fn contributions(&self) -> Vec<(&str, Decimal)> {
        match self {
            RollupSource::Transactions(txns) => txns
                .iter()
                .filter(|t| t.is_outflow())
                .map(|t| (t.category.as_str(), t.amount.abs()))
                .collect(),
            RollupSource::Breakdown(items) => items
                .iter()
                .map(|i| (i.category.as_str(), i.amount.abs()))
                .collect(),
        }
    }
}

/// Rolls spend up under one mapping config.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRollupEngine<'c> {
    config: &'c CategoryMappingConfig,
}

impl<'c> CategoryRollupEngine<'c> {
    pub fn new(config: &'c CategoryMappingConfig) -> Self {
        Self { config }
    }

    /// One total per super that received spend, sorted by super name.
    pub fn rollup<'s>(&self, source: impl Into<RollupSource<'s>>) -> Vec<SuperCategoryTotal> {
        let source = source.into();
        let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();

        for (raw_category, spend) in source.contributions() {
            let category = normalize_category(raw_category);
            if is_excluded(category) {
                continue;
            }
            *sums.entry(self.config.super_for(category)).or_default() += spend;
        }

        sums.into_iter()
            .map(|(name, amount)| SuperCategoryTotal::new(name, round_money(amount)))
            .collect()
    }
}

/// Shorthand for `CategoryRollupEngine::new(config).rollup(source)`.
pub fn rollup<'s>(
    source: impl Into<RollupSource<'s>>,
    config: &CategoryMappingConfig,
) -> Vec<SuperCategoryTotal> {
    CategoryRollupEngine::new(config).rollup(source)
}
