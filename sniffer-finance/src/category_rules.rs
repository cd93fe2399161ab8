//! Deterministic rules mapping transaction descriptions to categories.
//!
//! Rules come from a JSON document. First matching rule wins; substring
//! matches (`contains_any`) and regex searches (`regex_any`) run against the
//! lowercased, whitespace-collapsed description. Regexes are compiled once,
//! when the document is read.
//!
//! Manual recategorisations feed back in through [`RulesDocument::learn`].

use anyhow::{Context, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sniffer_core::{Transaction, UNCATEGORISED};
use sniffer_ingest::normalizer::collapse_whitespace;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Category given to unmatched inflows
pub const INCOME: &str = "Income";

/// Words never chosen as a learned phrase
const SKIP_WORDS: [&str; 11] = [
    "the", "and", "or", "at", "in", "on", "to", "for", "of", "with", "by",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesDocument {
    #[serde(default = "unknown_version")]
    pub version: String,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Falls back to the document's default category when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "match")]
    pub matcher: RuleMatch,
}

/// Phrases and patterns of one rule. `regex_any` is compiled on
/// construction; patterns that fail to compile are logged and left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "MatchPatterns", into = "MatchPatterns")]
pub struct RuleMatch {
    pub contains_any: Vec<String>,
    regex_any: Vec<String>,
    compiled: Vec<Regex>,
}

/// Wire shape of [`RuleMatch`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MatchPatterns {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    contains_any: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    regex_any: Vec<String>,
}

impl From<MatchPatterns> for RuleMatch {
    fn from(patterns: MatchPatterns) -> Self {
        Self::new(patterns.contains_any, patterns.regex_any)
    }
}

impl From<RuleMatch> for MatchPatterns {
    fn from(matcher: RuleMatch) -> Self {
        Self {
            contains_any: matcher.contains_any,
            regex_any: matcher.regex_any,
        }
    }
}

impl PartialEq for RuleMatch {
    fn eq(&self, other: &Self) -> bool {
        self.contains_any == other.contains_any && self.regex_any == other.regex_any
    }
}

impl Eq for RuleMatch {}

impl RuleMatch {
    pub fn new(contains_any: Vec<String>, regex_any: Vec<String>) -> Self {
        let compiled = regex_any
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern, "skipping invalid rule regex: {e}");
                    None
                }
            })
            .collect();
        Self {
            contains_any,
            regex_any,
            compiled,
        }
    }

    pub fn contains(phrase: impl Into<String>) -> Self {
        Self::new(vec![phrase.into()], Vec::new())
    }

    pub fn regex_any(&self) -> &[String] {
        &self.regex_any
    }

    fn matches(&self, normalized: &str) -> bool {
        self.contains_any
            .iter()
            .any(|phrase| !phrase.trim().is_empty() && normalized.contains(&phrase.to_lowercase()))
            || self.compiled.iter().any(|re| re.is_match(normalized))
    }
}

fn unknown_version() -> String {
    "unknown".to_string()
}

fn default_category() -> String {
    UNCATEGORISED.to_string()
}

impl Default for RulesDocument {
    fn default() -> Self {
        Self {
            version: unknown_version(),
            default_category: default_category(),
            rules: Vec::new(),
        }
    }
}

impl RulesDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parse rules document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load, or log and fall back to an empty rule set.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(doc)) => {
                debug!(version = %doc.version, rules = doc.rules.len(), "loaded rules");
                doc
            }
            Some(Err(e)) => {
                warn!("failed to load rules: {e:#}");
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serialize rules document")?;
        fs::write(path, text + "\n").with_context(|| format!("write {}", path.display()))
    }

    /// Add a `contains_any` rule learned from a manual recategorisation.
    ///
    /// Returns the learned phrase, or `None` when the description yields no
    /// phrase or a rule with that phrase and category already exists.
    pub fn learn(&mut self, description: &str, category: &str) -> Option<String> {
        let category = category.trim();
        if category.is_empty() {
            return None;
        }
        let phrase = learning_phrase(description)?;

        let known = self.rules.iter().any(|rule| {
            self.category_of(rule) == category && rule.matcher.contains_any.contains(&phrase)
        });
        if known {
            debug!(phrase = %phrase, category, "rule already known");
            return None;
        }

        self.rules.push(Rule {
            name: Some(format!("User: {phrase} -> {category}")),
            category: Some(category.to_string()),
            matcher: RuleMatch::contains(phrase.clone()),
        });
        info!(phrase = %phrase, category, "learned rule");
        Some(phrase)
    }

    /// Every category the rules can assign, in rule order, without repeats.
    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for rule in &self.rules {
            let category = self.category_of(rule).trim();
            if !category.is_empty() && !out.iter().any(|c| c == category) {
                out.push(category.to_string());
            }
        }
        out
    }

    fn category_of<'a>(&'a self, rule: &'a Rule) -> &'a str {
        rule.category.as_deref().unwrap_or(&self.default_category)
    }
}

impl Rule {
    fn matches(&self, normalized: &str) -> bool {
        self.matcher.matches(normalized)
    }
}

/// Lowercase and collapse whitespace
pub fn normalise_description(description: &str) -> String {
    collapse_whitespace(description).to_lowercase()
}

/// First word of the normalised description longer than two characters
/// that is not a filler word, else the first word.
pub fn learning_phrase(description: &str) -> Option<String> {
    let normalized = normalise_description(description);
    normalized
        .split_whitespace()
        .find(|word| word.chars().count() > 2 && !SKIP_WORDS.contains(word))
        .or_else(|| normalized.split_whitespace().next())
        .map(str::to_string)
}

/// Category for a description/amount pair.
///
/// No rule matched: inflows are Income, everything else the default category.
pub fn categorize<'a>(rules: &'a RulesDocument, description: &str, amount: Decimal) -> &'a str {
    let normalized = normalise_description(description);
    if let Some(rule) = rules.rules.iter().find(|rule| rule.matches(&normalized)) {
        return rules.category_of(rule);
    }
    if amount > Decimal::ZERO {
        INCOME
    } else {
        rules.default_category.as_str()
    }
}

/// Fill in categories for transactions that arrived without one.
pub fn categorize_missing(rules: &RulesDocument, txns: &mut [Transaction]) -> usize {
    let mut filled = 0;
    for tx in txns.iter_mut().filter(|tx| tx.category.trim().is_empty()) {
        tx.category = categorize(rules, &tx.description, tx.amount).to_string();
        filled += 1;
    }
    filled
}
