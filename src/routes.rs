//! Destination ranking for a single export origin

use std::collections::HashMap;

use crate::config::RouteFilter;
use crate::data::RouteRecord;

/// Top destinations with their shipment counts, most frequent first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSummary {
    pub destinations: Vec<(String, u64)>,
}

impl RouteSummary {
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.destinations.iter().map(|(d, _)| d.clone()).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.destinations.iter().map(|(_, c)| *c).collect()
    }
}

fn matches(record: &RouteRecord, filter: &RouteFilter) -> bool {
    record.kind.trim() == filter.shipment_type.trim()
        && record.origin_city.trim() == filter.origin_city.trim()
        && record.origin_country.trim() == filter.origin_country.trim()
}

/// Count destinations among shipments matching `filter`
///
/// Ties keep the order in which destinations first appear in the filtered
/// records. Blank destinations are not counted. No matching shipments yields
/// an empty summary.
pub fn top_destinations(records: &[RouteRecord], filter: &RouteFilter) -> RouteSummary {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    for record in records.iter().filter(|r| matches(r, filter)) {
        let destination = record.destination.trim();
        if destination.is_empty() {
            continue;
        }
        match index.get(destination) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(destination, counts.len());
                counts.push((destination.to_string(), 1));
            }
        }
    }

    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(filter.top_n);

    RouteSummary {
        destinations: counts,
    }
}
