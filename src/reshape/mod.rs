//! Indicator reshaping.
//!
//! Pivots the flat source table into the nested lookup the dashboard reads:
//! segment → topic → indicator → category → summed value. Category labels
//! are renamed per segment and anything outside the whitelist is folded into
//! the catch-all bucket.

pub mod builder;
pub mod reshaper;
pub mod types;

pub use builder::build_lookup;
pub use reshaper::{Target, normalize_label, reshape};
pub use types::{BuildSummary, CategoryTotals, IndicatorLookup, ReshapeError, TopicBreakdown};
