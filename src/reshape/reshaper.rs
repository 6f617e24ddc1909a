use crate::layout::ReportLayout;
use crate::reshape::types::{CategoryTotals, ReshapeError};
use crate::table::SourceTable;

/// One (topic, indicator, segment) cell of the lookup to compute.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub topic: &'a str,
    /// Ignored for flat topics.
    pub indicator: &'a str,
    pub segment: &'a str,
}

/// Maps a raw category label to the label reported for `segment`.
///
/// The segment rewrite runs first, then anything outside `allowed` becomes the
/// catch-all. Blank labels always end up in the catch-all.
pub fn normalize_label<'a>(
    layout: &'a ReportLayout,
    allowed: &'a [String],
    segment: &str,
    label: &'a str,
) -> &'a str {
    let label = layout.rewrite(segment, label);
    if allowed.iter().any(|a| a == label) {
        label
    } else {
        layout.catch_all.as_str()
    }
}

/// Sums the segment column per category for the rows matching `target`.
///
/// Flat topics match on topic alone and keep their labels verbatim (rows with
/// a blank label are dropped). Other topics also match on indicator and go
/// through [`normalize_label`]. Blank or non-finite numeric cells add nothing
/// but still create their category.
///
/// # Errors
///
/// Returns a [`ReshapeError`] if the segment column is absent, the topic has
/// no whitelist for the segment, or a matching cell is not numeric.
pub fn reshape(
    table: &SourceTable,
    layout: &ReportLayout,
    target: Target<'_>,
) -> Result<CategoryTotals, ReshapeError> {
    let column = table
        .column_index(target.segment)
        .ok_or_else(|| ReshapeError::MissingColumn(target.segment.to_string()))?;

    let allowed = if layout.is_flat(target.topic) {
        None
    } else {
        let allowed = layout.allowed(target.topic, target.segment).ok_or_else(|| {
            ReshapeError::NoWhitelist {
                topic: target.topic.to_string(),
                segment: target.segment.to_string(),
            }
        })?;
        Some(allowed)
    };

    let mut totals = CategoryTotals::new();

    for (idx, row) in table.rows().enumerate() {
        if row.topic() != target.topic {
            continue;
        }

        let label = match allowed {
            Some(allowed) => {
                if row.indicator() != target.indicator {
                    continue;
                }
                normalize_label(layout, allowed, target.segment, row.category())
            }
            None if row.category().is_empty() => continue,
            None => row.category(),
        };

        let value = row
            .number(column)
            .map_err(|_| ReshapeError::InvalidNumber {
                row: idx + 1,
                column: target.segment.to_string(),
                value: row.cell(column).to_string(),
            })?
            .unwrap_or(0.0);

        *totals.entry(label.to_string()).or_insert(0.0) += value;
    }

    Ok(totals)
}
