//! Event records and their loading

pub mod loader;
pub mod preprocessing;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::graph::Node;

/// One validated row of the events table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_name: Option<String>,
    pub attraction_name: Option<String>,
    pub venue_id: String,
    pub venue_name: String,
    pub venue_city: String,
    pub venue_state: String,
    pub venue_latitude: Option<f64>,
    pub venue_longitude: Option<f64>,
    pub segment_name: String,
    pub genre_name: String,
    pub sub_genre_name: Option<String>,
    pub start_date: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Record columns that can become graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Venue,
    Artist,
    Genre,
    SubGenre,
}

impl EventRecord {
    /// Node key for the given column, `None` when the record has no value there
    pub fn key(&self, field: EventField) -> Option<&str> {
        match field {
            EventField::Venue => Some(&self.venue_id),
            EventField::Artist => self.attraction_name.as_deref(),
            EventField::Genre => Some(&self.genre_name),
            EventField::SubGenre => self.sub_genre_name.as_deref(),
        }
    }

    /// Build the node this record contributes for the given column
    pub fn node(&self, field: EventField) -> Option<Node> {
        match field {
            EventField::Venue => Some(Node::Venue {
                id: self.venue_id.clone(),
                name: self.venue_name.clone(),
                city: self.venue_city.clone(),
                state: self.venue_state.clone(),
            }),
            EventField::Artist => self
                .attraction_name
                .as_ref()
                .map(|name| Node::Artist { name: name.clone() }),
            EventField::Genre => Some(Node::Genre {
                name: self.genre_name.clone(),
            }),
            EventField::SubGenre => self
                .sub_genre_name
                .as_ref()
                .map(|name| Node::Genre { name: name.clone() }),
        }
    }
}

/// A row as read from the source file, before required fields are checked
#[derive(Debug, Clone, Default)]
pub struct RawEventRow {
    pub event_name: Option<String>,
    pub attraction_name: Option<String>,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub venue_city: Option<String>,
    pub venue_state: Option<String>,
    pub venue_latitude: Option<f64>,
    pub venue_longitude: Option<f64>,
    pub segment_name: Option<String>,
    pub genre_name: Option<String>,
    pub sub_genre_name: Option<String>,
    pub start_date: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

fn required(value: Option<String>, row: usize, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AnalyticsError::MalformedRecord { row, field }),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawEventRow {
    /// Check required fields; `row` is only used for the error report
    pub fn validate(self, row: usize) -> Result<EventRecord> {
        Ok(EventRecord {
            venue_id: required(self.venue_id, row, "venue_id")?,
            venue_name: required(self.venue_name, row, "venue_name")?,
            venue_city: required(self.venue_city, row, "venue_city")?,
            venue_state: required(self.venue_state, row, "venue_state")?,
            segment_name: required(self.segment_name, row, "segment_name")?,
            genre_name: required(self.genre_name, row, "genre_name")?,
            event_name: optional(self.event_name),
            attraction_name: optional(self.attraction_name),
            sub_genre_name: optional(self.sub_genre_name),
            start_date: optional(self.start_date),
            venue_latitude: self.venue_latitude,
            venue_longitude: self.venue_longitude,
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::EventRecord;

    /// Minimal record for tests: venue id doubles as its name
    pub fn event(venue: &str, city: &str, segment: &str, genre: &str) -> EventRecord {
        EventRecord {
            event_name: None,
            attraction_name: None,
            venue_id: venue.to_string(),
            venue_name: format!("{} Hall", venue),
            venue_city: city.to_string(),
            venue_state: "XX".to_string(),
            venue_latitude: None,
            venue_longitude: None,
            segment_name: segment.to_string(),
            genre_name: genre.to_string(),
            sub_genre_name: None,
            start_date: None,
            min_price: None,
            max_price: None,
        }
    }

    pub fn show(artist: &str, venue: &str, city: &str, segment: &str, genre: &str) -> EventRecord {
        EventRecord {
            attraction_name: Some(artist.to_string()),
            ..event(venue, city, segment, genre)
        }
    }
}
