//! Tabular aggregations over the raw records: top attractions, genre prices
//! and shares, and per-state event counts

use std::cmp::Ordering;

use itertools::Itertools;
use serde::Serialize;

use crate::data::preprocessing::select;
use crate::data::{EventField, EventRecord};
use crate::storage::Scope;

/// Label of the bucket small genres are folded into
pub const OTHER_GENRE: &str = "Other";

/// Placeholder genre of unclassified events, left out of state tables
pub const UNDEFINED_GENRE: &str = "Undefined";

/// One attraction with its event count and average prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttractionSummary {
    pub attraction: String,
    /// Distinct venue states, sorted and joined with ", "
    pub states: String,
    /// Mean of the known minimum prices, rounded to cents
    pub avg_min_price: Option<f64>,
    pub avg_max_price: Option<f64>,
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenrePriceRange {
    pub genre: String,
    pub lowest_min_price: Option<f64>,
    pub highest_max_price: Option<f64>,
    /// `highest_max_price - lowest_min_price`, when both are known
    pub range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreMeanPrices {
    pub genre: String,
    pub mean_min_price: Option<f64>,
    pub mean_max_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreShare {
    pub genre: String,
    /// Percentage of the slice's events
    pub percent: f64,
}

/// Attractions of a segment (optionally one genre) ordered by event count.
///
/// Records without an attraction are ignored. Ties keep attraction name order.
pub fn top_attractions(records: &[EventRecord], segment: &str, genre: &Scope, n: usize) -> Vec<AttractionSummary> {
    records
        .iter()
        .filter(|r| r.segment_name == segment && genre.matches(&r.genre_name))
        .filter_map(|r| r.attraction_name.as_deref().map(|name| (name, r)))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(attraction, events)| AttractionSummary {
            attraction: attraction.to_string(),
            states: events
                .iter()
                .map(|r| r.venue_state.as_str())
                .unique()
                .sorted()
                .join(", "),
            avg_min_price: mean(events.iter().filter_map(|r| r.min_price)).map(round_cents),
            avg_max_price: mean(events.iter().filter_map(|r| r.max_price)).map(round_cents),
            events: events.len(),
        })
        .sorted_by(|a, b| b.events.cmp(&a.events))
        .take(n)
        .collect()
}

/// Per-genre price spread within a segment and city, widest range first.
///
/// Genres without any price sort last, in name order.
pub fn price_range_per_genre(records: &[EventRecord], segment: &str, city: &Scope) -> Vec<GenrePriceRange> {
    let segment = Scope::named(segment);

    select(records, city, &segment)
        .into_iter()
        .into_group_map_by(|r| r.genre_name.as_str())
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(genre, events)| {
            let lowest_min_price = events.iter().filter_map(|r| r.min_price).reduce(f64::min);
            let highest_max_price = events.iter().filter_map(|r| r.max_price).reduce(f64::max);
            let range = lowest_min_price
                .zip(highest_max_price)
                .map(|(low, high)| high - low);

            GenrePriceRange {
                genre: genre.to_string(),
                lowest_min_price,
                highest_max_price,
                range,
            }
        })
        .sorted_by(|a, b| match (a.range, b.range) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .collect()
}

/// Percentage of events per genre in a segment and city.
///
/// Genres under `threshold` percent are folded into an `Other` entry, placed
/// last. Returns `None` when the slice has no events.
pub fn genre_share(records: &[EventRecord], segment: &str, city: &Scope, threshold: f64) -> Option<Vec<GenreShare>> {
    let slice = select(records, city, &Scope::named(segment));
    if slice.is_empty() {
        log::debug!("No events for segment {} in {}", segment, city);
        return None;
    }

    let total = slice.len() as f64;
    let counts = slice.iter().map(|r| r.genre_name.as_str()).counts();

    let mut shares: Vec<GenreShare> = counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(genre, count)| GenreShare {
            genre: genre.to_string(),
            percent: count as f64 / total * 100.0,
        })
        .collect();

    let folded: f64 = shares
        .iter()
        .filter(|s| s.percent < threshold || s.genre == OTHER_GENRE)
        .map(|s| s.percent)
        .sum();
    shares.retain(|s| s.percent >= threshold && s.genre != OTHER_GENRE);

    if folded > 0.0 {
        shares.push(GenreShare {
            genre: OTHER_GENRE.to_string(),
            percent: folded,
        });
    }

    Some(shares)
}

/// Number of named events held in one state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateEventCount {
    pub state: String,
    pub events: usize,
}

/// Average ticket price of one sub-genre in one state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubGenrePrice {
    pub state: String,
    pub segment: String,
    pub genre: String,
    pub sub_genre: String,
    /// Mean of `(min_price + max_price) / 2` over events with both prices
    pub average_price: Option<f64>,
    /// Events with a known maximum price
    pub priced_events: usize,
}

/// Mean minimum and mean maximum price per genre within a segment and city,
/// in genre name order
pub fn mean_prices_per_genre(records: &[EventRecord], segment: &str, city: &Scope) -> Vec<GenreMeanPrices> {
    select(records, city, &Scope::named(segment))
        .into_iter()
        .into_group_map_by(|r| r.genre_name.as_str())
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(genre, events)| GenreMeanPrices {
            genre: genre.to_string(),
            mean_min_price: mean(events.iter().filter_map(|r| r.min_price)),
            mean_max_price: mean(events.iter().filter_map(|r| r.max_price)),
        })
        .collect()
}

/// Event counts per venue state, busiest state first.
///
/// `Scope::All` for both arguments gives the per-state totals; naming a
/// segment, and then a genre, narrows the counts. Events of the undefined
/// genre and events without a name are not counted.
pub fn event_counts_by_state(records: &[EventRecord], segment: &Scope, genre: &Scope) -> Vec<StateEventCount> {
    records
        .iter()
        .filter(|r| r.genre_name != UNDEFINED_GENRE && r.event_name.is_some())
        .filter(|r| segment.matches(&r.segment_name) && genre.matches(&r.genre_name))
        .map(|r| r.venue_state.as_str())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(state, events)| StateEventCount {
            state: state.to_string(),
            events,
        })
        .collect()
}

/// Average price per (state, segment, genre, sub-genre), ordered by those
/// four fields.
///
/// Records without a sub-genre and records of the undefined genre are left
/// out.
pub fn average_price_per_sub_genre(records: &[EventRecord], segment: &Scope) -> Vec<SubGenrePrice> {
    records
        .iter()
        .filter(|r| r.genre_name != UNDEFINED_GENRE && segment.matches(&r.segment_name))
        .filter_map(|r| {
            let sub_genre = r.key(EventField::SubGenre)?;
            let group = (
                r.venue_state.as_str(),
                r.segment_name.as_str(),
                r.genre_name.as_str(),
                sub_genre,
            );
            Some((group, r))
        })
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|((state, segment, genre, sub_genre), events)| SubGenrePrice {
            state: state.to_string(),
            segment: segment.to_string(),
            genre: genre.to_string(),
            sub_genre: sub_genre.to_string(),
            average_price: mean(
                events
                    .iter()
                    .filter_map(|r| r.min_price.zip(r.max_price))
                    .map(|(low, high)| (low + high) / 2.0),
            ),
            priced_events: events.iter().filter(|r| r.max_price.is_some()).count(),
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::data::fixtures::{event, show};

    fn priced(mut record: EventRecord, state: &str, min: Option<f64>, max: Option<f64>) -> EventRecord {
        record.venue_state = state.to_string();
        record.min_price = min;
        record.max_price = max;
        record
    }

    #[test]
    fn top_attractions_orders_by_event_count() {
        let records = vec![
            priced(show("Solo", "v1", "Boston", "Music", "Rock"), "MA", Some(10.0), Some(20.0)),
            priced(show("Duo", "v1", "Boston", "Music", "Rock"), "MA", Some(10.0), None),
            priced(show("Duo", "v2", "Denver", "Music", "Jazz"), "CO", Some(15.34), Some(40.0)),
            priced(show("Duo", "v3", "Austin", "Music", "Rock"), "TX", None, Some(50.0)),
            show("Team", "v4", "Austin", "Sports", "Hockey"),
            event("v5", "Austin", "Music", "Rock"),
        ];

        let top = top_attractions(&records, "Music", &Scope::All, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].attraction, "Duo");
        assert_eq!(top[0].events, 3);
        assert_eq!(top[0].states, "CO, MA, TX");
        assert_eq!(top[0].avg_min_price, Some(12.67));
        assert_eq!(top[0].avg_max_price, Some(45.0));

        let rock = top_attractions(&records, "Music", &Scope::named("Rock"), 1);
        assert_eq!(rock.len(), 1);
        assert_eq!(rock[0].attraction, "Duo");
        assert_eq!(rock[0].events, 2);
    }

    #[test]
    fn price_ranges_sort_widest_first() {
        let records = vec![
            priced(event("v1", "Boston", "Music", "Rock"), "MA", Some(20.0), Some(80.0)),
            priced(event("v2", "Boston", "Music", "Rock"), "MA", Some(15.0), Some(60.0)),
            priced(event("v3", "Boston", "Music", "Jazz"), "MA", Some(30.0), Some(200.0)),
            priced(event("v4", "Boston", "Music", "Folk"), "MA", None, None),
            priced(event("v5", "Denver", "Music", "Rock"), "CO", Some(1.0), Some(999.0)),
        ];

        let ranges = price_range_per_genre(&records, "Music", &Scope::named("Boston"));
        let genres: Vec<_> = ranges.iter().map(|r| r.genre.as_str()).collect();
        assert_eq!(genres, vec!["Jazz", "Rock", "Folk"]);
        assert_eq!(ranges[1].lowest_min_price, Some(15.0));
        assert_eq!(ranges[1].range, Some(65.0));
        assert_eq!(ranges[2].range, None);
    }

    #[test]
    fn small_genres_fold_into_other() {
        let mut records = Vec::new();
        for i in 0..60 {
            records.push(event(&format!("r{}", i), "Boston", "Music", "Rock"));
        }
        for i in 0..39 {
            records.push(event(&format!("p{}", i), "Boston", "Music", "Pop"));
        }
        records.push(event("f0", "Boston", "Music", "Folk"));

        let shares = genre_share(&records, "Music", &Scope::All, 2.5).unwrap();
        let genres: Vec<_> = shares.iter().map(|s| s.genre.as_str()).collect();
        assert_eq!(genres, vec!["Rock", "Pop", "Other"]);
        assert_relative_eq!(shares[0].percent, 60.0, epsilon = 1e-9);
        assert_relative_eq!(shares[2].percent, 1.0, epsilon = 1e-9);
        assert_relative_eq!(shares.iter().map(|s| s.percent).sum::<f64>(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn genre_share_of_empty_slice_is_none() {
        let records = vec![event("v1", "Boston", "Music", "Rock")];
        assert!(genre_share(&records, "Sports", &Scope::All, 2.5).is_none());
        assert!(genre_share(&records, "Music", &Scope::named("Denver"), 2.5).is_none());
    }

    #[test]
    fn mean_prices_average_each_bound_separately() {
        let records = vec![
            priced(event("v1", "Boston", "Music", "Rock"), "MA", Some(20.0), Some(80.0)),
            priced(event("v2", "Boston", "Music", "Rock"), "MA", Some(10.0), None),
            priced(event("v3", "Boston", "Music", "Jazz"), "MA", None, None),
            priced(event("v4", "Denver", "Music", "Rock"), "CO", Some(500.0), Some(900.0)),
            priced(event("v5", "Boston", "Sports", "Hockey"), "MA", Some(50.0), Some(300.0)),
        ];

        let prices = mean_prices_per_genre(&records, "Music", &Scope::named("Boston"));
        assert_eq!(
            prices,
            vec![
                GenreMeanPrices {
                    genre: "Jazz".into(),
                    mean_min_price: None,
                    mean_max_price: None,
                },
                GenreMeanPrices {
                    genre: "Rock".into(),
                    mean_min_price: Some(15.0),
                    mean_max_price: Some(80.0),
                },
            ]
        );

        let everywhere = mean_prices_per_genre(&records, "Music", &Scope::All);
        assert_eq!(everywhere[1].mean_min_price.map(round_cents), Some(176.67));
    }

    #[test]
    fn state_counts_skip_undefined_and_unnamed_events() {
        let named = |venue: &str, state: &str, segment: &str, genre: &str| {
            let mut record = priced(event(venue, "Somewhere", segment, genre), state, None, None);
            record.event_name = Some(format!("{} night", venue));
            record
        };
        let records = vec![
            named("v1", "MA", "Music", "Rock"),
            named("v2", "MA", "Music", "Jazz"),
            named("v3", "MA", "Sports", "Hockey"),
            named("v4", "CO", "Music", "Rock"),
            named("v5", "CO", "Music", "Rock"),
            named("v6", "TX", "Music", UNDEFINED_GENRE),
            priced(event("v7", "Austin", "Music", "Rock"), "TX", None, None),
        ];

        let totals = event_counts_by_state(&records, &Scope::All, &Scope::All);
        let totals: Vec<_> = totals.iter().map(|c| (c.state.as_str(), c.events)).collect();
        assert_eq!(totals, vec![("MA", 3), ("CO", 2)]);

        let music = event_counts_by_state(&records, &Scope::named("Music"), &Scope::All);
        let music: Vec<_> = music.iter().map(|c| (c.state.as_str(), c.events)).collect();
        assert_eq!(music, vec![("CO", 2), ("MA", 2)]);

        let jazz = event_counts_by_state(&records, &Scope::named("Music"), &Scope::named("Jazz"));
        assert_eq!(jazz, vec![StateEventCount { state: "MA".into(), events: 1 }]);
    }

    #[test]
    fn sub_genre_prices_use_the_midpoint() {
        let with_sub = |record: EventRecord, sub_genre: Option<&str>| EventRecord {
            sub_genre_name: sub_genre.map(str::to_string),
            ..record
        };
        let records = vec![
            with_sub(priced(event("v1", "Boston", "Music", "Rock"), "MA", Some(20.0), Some(60.0)), Some("Indie")),
            with_sub(priced(event("v2", "Boston", "Music", "Rock"), "MA", Some(10.0), Some(30.0)), Some("Indie")),
            with_sub(priced(event("v3", "Boston", "Music", "Rock"), "MA", None, Some(99.0)), Some("Indie")),
            with_sub(priced(event("v4", "Boston", "Music", "Rock"), "MA", Some(5.0), Some(5.0)), Some("Punk")),
            with_sub(priced(event("v5", "Boston", "Music", "Rock"), "MA", Some(1.0), Some(1.0)), None),
            with_sub(priced(event("v6", "Boston", "Music", UNDEFINED_GENRE), "MA", Some(1.0), Some(1.0)), Some("Misc")),
            with_sub(priced(event("v7", "Denver", "Sports", "Hockey"), "CO", None, None), Some("NHL")),
        ];

        let music = average_price_per_sub_genre(&records, &Scope::named("Music"));
        let subs: Vec<_> = music.iter().map(|p| p.sub_genre.as_str()).collect();
        assert_eq!(subs, vec!["Indie", "Punk"]);
        assert_relative_eq!(music[0].average_price.unwrap(), 30.0, epsilon = 1e-9);
        assert_eq!(music[0].priced_events, 3);
        assert_eq!(music[1].average_price, Some(5.0));

        let all = average_price_per_sub_genre(&records, &Scope::All);
        assert_eq!(all[0].state, "CO");
        assert_eq!(all[0].average_price, None);
        assert_eq!(all[0].priced_events, 0);
    }
}
