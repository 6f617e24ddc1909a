use crate::layout::ReportLayout;
use crate::reshape::reshaper::{Target, reshape};
use crate::reshape::types::{
    BuildSummary, CategoryTotals, IndicatorLookup, ReshapeError, SegmentBreakdown, TopicBreakdown,
};
use crate::table::SourceTable;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Runs one combination, turning any failure into an empty mapping.
fn reshape_or_empty(
    table: &SourceTable,
    layout: &ReportLayout,
    target: Target<'_>,
    summary: &mut BuildSummary,
) -> CategoryTotals {
    summary.combinations += 1;

    let totals = match reshape(table, layout, target) {
        Ok(totals) => totals,
        Err(e) => {
            summary.failed += 1;
            if matches!(e, ReshapeError::MissingColumn(_)) {
                debug!(
                    segment = target.segment,
                    topic = target.topic,
                    indicator = target.indicator,
                    error = %e,
                    "Combination skipped"
                );
            } else {
                warn!(
                    segment = target.segment,
                    topic = target.topic,
                    indicator = target.indicator,
                    error = %e,
                    "Combination could not be reshaped, using empty mapping"
                );
            }
            CategoryTotals::new()
        }
    };

    if totals.is_empty() {
        summary.empty += 1;
    }
    totals
}

/// Builds the full segment → topic → indicator → category lookup.
///
/// Every layout segment gets a key. The total segment only carries the total
/// topic. Flat topics hold their category totals directly; the others hold
/// one entry per indicator seen under the topic.
pub fn build_lookup(table: &SourceTable, layout: &ReportLayout) -> (IndicatorLookup, BuildSummary) {
    let topics = table.topics();
    let indicators: IndexMap<&str, Vec<&str>> =
        topics.iter().map(|t| (*t, table.indicators(t))).collect();

    let mut summary = BuildSummary::default();
    let mut lookup = IndicatorLookup::default();

    for segment in &layout.segments {
        let mut breakdown = SegmentBreakdown::new();

        for (&topic, topic_indicators) in &indicators {
            if !layout.includes(segment, topic) {
                continue;
            }

            let entry = if layout.is_flat(topic) {
                let target = Target {
                    topic,
                    indicator: "",
                    segment: segment.as_str(),
                };
                TopicBreakdown::Flat(reshape_or_empty(table, layout, target, &mut summary))
            } else {
                let by_indicator = topic_indicators
                    .iter()
                    .map(|&indicator| {
                        let target = Target {
                            topic,
                            indicator,
                            segment: segment.as_str(),
                        };
                        let totals = reshape_or_empty(table, layout, target, &mut summary);
                        (indicator.to_string(), totals)
                    })
                    .collect();
                TopicBreakdown::ByIndicator(by_indicator)
            };

            breakdown.insert(topic.to_string(), entry);
        }

        lookup.0.insert(segment.clone(), breakdown);
    }

    summary.segments = lookup.0.len();
    info!(
        segments = summary.segments,
        topics = topics.len(),
        combinations = summary.combinations,
        empty = summary.empty,
        failed = summary.failed,
        "Indicator lookup built"
    );

    (lookup, summary)
}
