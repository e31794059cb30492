//! Record slicing ahead of graph construction

use itertools::Itertools;

use crate::data::EventRecord;
use crate::storage::Scope;

/// Records of one (city, segment) slice, in source order
pub fn select<'a, I>(records: I, city: &Scope, segment: &Scope) -> Vec<&'a EventRecord>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    records
        .into_iter()
        .filter(|r| city.matches(&r.venue_city) && segment.matches(&r.segment_name))
        .collect()
}

/// Records whose venue is in one of `cities`; an empty list keeps everything
pub fn within_cities<'a>(records: &'a [EventRecord], cities: &[String]) -> Vec<&'a EventRecord> {
    if cities.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| cities.iter().any(|c| c == &r.venue_city))
        .collect()
}

/// Sorted distinct segment names
pub fn distinct_segments<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    records
        .into_iter()
        .map(|r| r.segment_name.as_str())
        .unique()
        .sorted()
        .map(str::to_string)
        .collect()
}

/// Sorted distinct venue cities
pub fn distinct_cities<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    records
        .into_iter()
        .map(|r| r.venue_city.as_str())
        .unique()
        .sorted()
        .map(str::to_string)
        .collect()
}
