//! sniffer-finance: mapping resource loading, rules categorisation, and the
//! view-ready summary built on top of `sniffer-core`

pub mod category_rules;
pub mod mapping_store;
pub mod summary;

pub use category_rules::{Rule, RuleMatch, RulesDocument, categorize, categorize_missing};
pub use mapping_store::{MappingStore, load_mapping, load_mapping_or_default};
pub use summary::{SummaryView, drill_down};
