//! Data types produced by the reshaping pipeline.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Summed value per category label, keys in ascending order.
pub type CategoryTotals = BTreeMap<String, f64>;

/// Largest magnitude below which every whole `f64` is an exact integer.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// A total written as a JSON integer when it has no fractional part.
struct Amount(f64);

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < EXACT_INTEGER_LIMIT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

struct Totals<'a>(&'a CategoryTotals);

impl Serialize for Totals<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_totals(self.0, serializer)
    }
}

fn serialize_totals<S: Serializer>(totals: &CategoryTotals, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(totals.iter().map(|(label, value)| (label, Amount(*value))))
}

fn serialize_by_indicator<S: Serializer>(
    by_indicator: &IndexMap<String, CategoryTotals>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(by_indicator.iter().map(|(indicator, totals)| (indicator, Totals(totals))))
}

/// What a topic holds under one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopicBreakdown {
    /// Flat topics map categories straight to totals.
    Flat(#[serde(serialize_with = "serialize_totals")] CategoryTotals),
    /// indicator → category totals.
    ByIndicator(#[serde(serialize_with = "serialize_by_indicator")] IndexMap<String, CategoryTotals>),
}

impl TopicBreakdown {
    pub fn as_flat(&self) -> Option<&CategoryTotals> {
        match self {
            TopicBreakdown::Flat(totals) => Some(totals),
            TopicBreakdown::ByIndicator(_) => None,
        }
    }

    pub fn indicator(&self, indicator: &str) -> Option<&CategoryTotals> {
        match self {
            TopicBreakdown::Flat(_) => None,
            TopicBreakdown::ByIndicator(by_indicator) => by_indicator.get(indicator),
        }
    }
}

/// topic → breakdown, for one segment.
pub type SegmentBreakdown = IndexMap<String, TopicBreakdown>;

/// The full lookup document: segment → topic → breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndicatorLookup(pub IndexMap<String, SegmentBreakdown>);

impl IndicatorLookup {
    pub fn segment(&self, segment: &str) -> Option<&SegmentBreakdown> {
        self.0.get(segment)
    }

    pub fn topic(&self, segment: &str, topic: &str) -> Option<&TopicBreakdown> {
        self.segment(segment).and_then(|s| s.get(topic))
    }
}

/// Why one (segment, topic, indicator) combination could not be reshaped.
#[derive(Debug, Error, PartialEq)]
pub enum ReshapeError {
    #[error("segment column '{0}' not found in source table")]
    MissingColumn(String),

    #[error("no category whitelist for topic '{topic}' and segment '{segment}'")]
    NoWhitelist { topic: String, segment: String },

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// Counters collected while building an [`IndicatorLookup`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub segments: usize,
    pub combinations: usize,
    pub empty: usize,
    pub failed: usize,
}
