//! Category → super-category mapping, passed explicitly into every rollup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::MappingError;
use crate::finance::{DISCRETIONARY, ESSENTIALS, SuperCategoryTotal, UNCATEGORISED};
use rust_decimal::Decimal;

/// Category list offered to pickers when neither data nor config name any.
pub const FALLBACK_CATEGORIES: [&str; 16] = [
    "Groceries",
    "Utilities",
    "Transport",
    "Dining",
    "Housing",
    "Entertainment",
    "Healthcare",
    "Insurance",
    "Education",
    "Fees",
    "Gifts",
    "Travel",
    "Savings",
    "Transfer",
    "Income",
    UNCATEGORISED,
];

/// Mapping document as fetched from the category-mapping resource.
///
/// Immutable once built; a refresh builds a new value rather than editing one
/// that a rollup may be reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryMappingConfig {
    /// Ordered super-category names, e.g. Essentials/Discretionary/Uncategorised
    pub supers: Vec<String>,
    /// Keys are matched exactly as written, case-sensitive
    pub category_to_super: BTreeMap<String, String>,
    /// Categories to surface even when the current data has none
    pub extra_categories: Vec<String>,
}

impl Default for CategoryMappingConfig {
    fn default() -> Self {
        Self {
            supers: vec![
                ESSENTIALS.to_string(),
                DISCRETIONARY.to_string(),
                UNCATEGORISED.to_string(),
            ],
            category_to_super: BTreeMap::new(),
            extra_categories: Vec::new(),
        }
    }
}

impl CategoryMappingConfig {
    /// Parse and validate a mapping document.
    pub fn from_json_str(json: &str) -> Result<Self, MappingError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject duplicate supers and mappings that point at an unknown super.
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut seen = HashSet::new();
        for name in &self.supers {
            if name.trim().is_empty() {
                return Err(MappingError::Invalid("empty super-category name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(MappingError::Invalid(format!(
                    "super-category \"{name}\" listed twice"
                )));
            }
        }

        for (category, target) in &self.category_to_super {
            if !seen.contains(target.as_str()) {
                return Err(MappingError::Invalid(format!(
                    "\"{category}\" maps to \"{target}\", which is not in supers"
                )));
            }
        }

        Ok(())
    }

    /// Super-category for an already-normalized category.
    ///
    /// Unmapped categories are discretionary spend, except `Uncategorised`
    /// which keeps its own bucket.
    pub fn super_for(&self, category: &str) -> &str {
        match self.category_to_super.get(category) {
            Some(target) => target.as_str(),
            None if category == UNCATEGORISED => UNCATEGORISED,
            None => DISCRETIONARY,
        }
    }

    /// Sorted, de-duplicated category names for a picker.
    pub fn category_options<I, S>(&self, known: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options: BTreeSet<String> = known
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .chain(self.extra_categories.iter().map(|c| c.trim().to_string()))
            .filter(|c| !c.is_empty())
            .collect();

        if options.is_empty() {
            options = FALLBACK_CATEGORIES.iter().map(|c| c.to_string()).collect();
        }
        options.into_iter().collect()
    }

    /// Reconcile a rollup against the configured supers.
    ///
    /// Every configured super appears once, in config order, zero-filled when
    /// absent from `totals`. Supers present in `totals` but not configured
    /// follow, in their existing order.
    pub fn complete_axis(&self, totals: &[SuperCategoryTotal]) -> Vec<SuperCategoryTotal> {
        let by_name: BTreeMap<&str, Decimal> = totals
            .iter()
            .map(|t| (t.super_category.as_str(), t.amount))
            .collect();

        let mut axis: Vec<SuperCategoryTotal> = self
            .supers
            .iter()
            .map(|name| {
                let amount = by_name.get(name.as_str()).copied().unwrap_or_default();
                SuperCategoryTotal::new(name.clone(), amount)
            })
            .collect();

        axis.extend(
            totals
                .iter()
                .filter(|t| !self.supers.contains(&t.super_category))
                .cloned(),
        );
        axis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_mapping() {
        let config = CategoryMappingConfig::default();
        assert_eq!(config.supers, vec!["Essentials", "Discretionary", "Uncategorised"]);
        assert!(config.category_to_super.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config =
            CategoryMappingConfig::from_json_str(r#"{"category_to_super": {"Rent": "Essentials"}}"#)
                .unwrap();
        assert_eq!(config.supers.len(), 3);
        assert_eq!(config.super_for("Rent"), "Essentials");
    }

    #[test]
    fn test_super_for_fallbacks() {
        let config = CategoryMappingConfig::default();
        assert_eq!(config.super_for("Streaming"), DISCRETIONARY);
        assert_eq!(config.super_for(UNCATEGORISED), UNCATEGORISED);
    }

    #[test]
    fn test_mapping_keys_are_case_sensitive() {
        let mut config = CategoryMappingConfig::default();
        config
            .category_to_super
            .insert("Groceries".into(), ESSENTIALS.into());
        assert_eq!(config.super_for("Groceries"), ESSENTIALS);
        assert_eq!(config.super_for("groceries"), DISCRETIONARY);
    }

    #[test]
    fn test_uncategorised_can_be_remapped() {
        let config = CategoryMappingConfig::from_json_str(
            r#"{"category_to_super": {"Uncategorised": "Discretionary"}}"#,
        )
        .unwrap();
        assert_eq!(config.super_for(UNCATEGORISED), DISCRETIONARY);
    }

    #[test]
    fn test_rejects_unknown_target() {
        let err = CategoryMappingConfig::from_json_str(
            r#"{"supers": ["Essentials"], "category_to_super": {"Dining": "Fun"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MappingError::Invalid(_)));
    }

    #[test]
    fn test_rejects_duplicate_supers() {
        let err =
            CategoryMappingConfig::from_json_str(r#"{"supers": ["Essentials", "Essentials"]}"#)
                .unwrap_err();
        assert!(matches!(err, MappingError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = CategoryMappingConfig::from_json_str("{\"supers\": 3}").unwrap_err();
        assert!(matches!(err, MappingError::Malformed(_)));
    }

    #[test]
    fn test_category_options_merges_extras() {
        let mut config = CategoryMappingConfig::default();
        config.extra_categories = vec!["Pets".into(), " Dining ".into()];
        let options = config.category_options(["Dining", "Groceries", "", "Groceries"]);
        assert_eq!(options, vec!["Dining", "Groceries", "Pets"]);
    }

    #[test]
    fn test_category_options_fallback_list() {
        let config = CategoryMappingConfig::default();
        let options = config.category_options(Vec::<String>::new());
        assert_eq!(options.len(), FALLBACK_CATEGORIES.len());
        assert_eq!(options[0], "Dining");
        assert!(options.contains(&UNCATEGORISED.to_string()));
    }

    #[test]
    fn test_complete_axis_zero_fills_in_config_order() {
        let config = CategoryMappingConfig::default();
        let totals = vec![SuperCategoryTotal::new(
            UNCATEGORISED,
            Decimal::from_str("12.50").unwrap(),
        )];
        let axis = config.complete_axis(&totals);
        let names: Vec<_> = axis.iter().map(|t| t.super_category.as_str()).collect();
        assert_eq!(names, vec!["Essentials", "Discretionary", "Uncategorised"]);
        assert_eq!(axis[0].amount, Decimal::ZERO);
        assert_eq!(axis[2].amount, Decimal::from_str("12.50").unwrap());
    }

    #[test]
    fn test_complete_axis_keeps_unconfigured_supers() {
        let config = CategoryMappingConfig {
            supers: vec![ESSENTIALS.into()],
            ..CategoryMappingConfig::default()
        };
        let totals = vec![SuperCategoryTotal::new(DISCRETIONARY, Decimal::from(7))];
        let axis = config.complete_axis(&totals);
        assert_eq!(axis.len(), 2);
        assert_eq!(axis[1].super_category, DISCRETIONARY);
    }
}
