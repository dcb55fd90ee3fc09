//! Windowed aggregation over the timeline
//!
//! Two aggregators share the same admission pattern (append to a timeline,
//! roll over when an incoming window lands past the horizon) but derive
//! different state: periodic traffic summaries and a hysteresis-based
//! high-traffic alert. Section grouping is a standalone helper composed
//! into the summary aggregator rather than a shared base.

mod alert;
mod summary;

pub use alert::{Alert, AlertAggregator};
pub use summary::{SectionStat, Summary, SummaryAggregator};

use std::collections::BTreeMap;

use crate::record::LogRecord;
use crate::timeline::Timeline;

/// Round to two decimal places, as rendered rates and percentages are.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Group every record in the timeline by section.
///
/// The BTreeMap keeps groups name-ascending, so a later stable sort by hit
/// count leaves ties in alphabetical order.
fn section_stats(timeline: &Timeline) -> Vec<SectionStat> {
    let mut groups: BTreeMap<String, Vec<LogRecord>> = BTreeMap::new();
    for window in timeline.windows() {
        for record in window.records() {
            groups
                .entry(record.section())
                .or_default()
                .push(record.clone());
        }
    }

    groups
        .into_iter()
        .map(|(name, records)| SectionStat {
            name,
            hits: records.len(),
            records,
        })
        .collect()
}

/// The `limit` highest-hit sections, ties broken by section name.
pub(crate) fn top_sections(timeline: &Timeline, limit: usize) -> Vec<SectionStat> {
    let mut sections = section_stats(timeline);
    sections.sort_by(|a, b| b.hits.cmp(&a.hits));
    sections.truncate(limit);
    sections
}
