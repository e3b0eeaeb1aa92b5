//! Anonymity filtering and recency ranking of merged aggregates.

use crate::merge::AggregateMap;
use crate::model::CustomerAggregate;
use crate::temporal::parse_timestamp;
use std::cmp::Reverse;
use time::OffsetDateTime;

/// Last-seen time, else updated time. `None` orders below every instant.
pub fn recency(aggregate: &CustomerAggregate) -> Option<OffsetDateTime> {
    parse_timestamp(&aggregate.last_seen_at).or_else(|| parse_timestamp(&aggregate.updated_at))
}

/// Drop anonymous aggregates unless asked to keep them, then order by recency.
///
/// Returns the ordered aggregates and how many were dropped. Equal recency
/// keeps identity-key order, since the map iterates in key order and the sort
/// is stable.
pub fn filter_and_rank(
    aggregates: AggregateMap,
    include_anonymous: bool,
) -> (Vec<CustomerAggregate>, usize) {
    let total = aggregates.len();
    let mut ranked: Vec<CustomerAggregate> = aggregates
        .into_values()
        .filter(|aggregate| include_anonymous || !aggregate.is_anonymous())
        .collect();
    let dropped = total - ranked.len();

    ranked.sort_by_cached_key(|aggregate| Reverse(recency(aggregate)));
    (ranked, dropped)
}
