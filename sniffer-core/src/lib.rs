//! sniffer-core: week-label resolution and super-category rollups for the budget dashboard.
//!
//! Everything in this crate is pure: no I/O, no shared mutable state. Loading the
//! mapping resource and talking to the upstream feed live in `sniffer-finance`
//! and `sniffer-ingest`.

pub mod error;
pub mod finance;
pub mod mapping;
pub mod period;
pub mod rollup;
pub mod time;

pub use error::{MappingError, Unresolved};
pub use finance::{
    CategoryBreakdownItem, DateRange, SuperCategoryTotal, Transaction, WeekPoint, DISCRETIONARY,
    ESSENTIALS, UNCATEGORISED,
};
pub use mapping::CategoryMappingConfig;
pub use period::{WeekLabelResolver, iso_week_start, week_containing};
pub use rollup::{CategoryRollupEngine, RollupSource, rollup};
