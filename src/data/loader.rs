//! CSV and Parquet loading of the events table

use std::path::Path;

use polars::prelude::*;

use crate::data::{EventRecord, RawEventRow};
use crate::error::{AnalyticsError, Result};

/// Validated records plus the number of rows that were skipped
#[derive(Debug, Clone, Default)]
pub struct LoadedEvents {
    pub records: Vec<EventRecord>,
    pub malformed: usize,
}

/// Load the events table, reading Parquet for `.parquet` files and CSV otherwise
pub fn load_events(path: impl AsRef<Path>) -> Result<LoadedEvents> {
    let path = path.as_ref();
    log::info!("Reading events file: {}", path.display());

    if !path.exists() {
        return Err(AnalyticsError::NotFound(format!(
            "events file {}",
            path.display()
        )));
    }

    let df = match path.extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
        _ => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .finish()?
            .collect()?,
    };

    log::debug!("File schema: {:?}", df.schema());
    log::info!("Loaded {} event rows", df.height());

    events_from_frame(&df)
}

/// Convert an already-loaded frame into validated records
pub fn events_from_frame(df: &DataFrame) -> Result<LoadedEvents> {
    let height = df.height();

    let mut venue_id = required_strings(df, "venue_id")?;
    let mut venue_name = required_strings(df, "venue_name")?;
    let mut venue_city = required_strings(df, "venue_city")?;
    let mut venue_state = required_strings(df, "venue_state")?;
    let mut segment_name = required_strings(df, "segment_name")?;
    let mut genre_name = required_strings(df, "genre_name")?;

    let mut event_name = optional_strings(df, "event_name", height)?;
    let mut attraction_name = optional_strings(df, "attraction_name", height)?;
    let mut sub_genre_name = optional_strings(df, "sub_genre_name", height)?;
    let mut start_date = optional_strings(df, "start_date", height)?;

    let venue_latitude = optional_floats(df, "venue_latitude", height)?;
    let venue_longitude = optional_floats(df, "venue_longitude", height)?;
    let min_price = optional_floats(df, "min_price", height)?;
    let max_price = optional_floats(df, "max_price", height)?;

    let mut loaded = LoadedEvents {
        records: Vec::with_capacity(height),
        malformed: 0,
    };

    for i in 0..height {
        let raw = RawEventRow {
            event_name: event_name[i].take(),
            attraction_name: attraction_name[i].take(),
            venue_id: venue_id[i].take(),
            venue_name: venue_name[i].take(),
            venue_city: venue_city[i].take(),
            venue_state: venue_state[i].take(),
            venue_latitude: venue_latitude[i],
            venue_longitude: venue_longitude[i],
            segment_name: segment_name[i].take(),
            genre_name: genre_name[i].take(),
            sub_genre_name: sub_genre_name[i].take(),
            start_date: start_date[i].take(),
            min_price: min_price[i],
            max_price: max_price[i],
        };

        match raw.validate(i) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                log::debug!("Skipping row: {}", e);
                loaded.malformed += 1;
            }
        }
    }

    if loaded.malformed > 0 {
        log::warn!(
            "Skipped {} malformed rows out of {}",
            loaded.malformed,
            height
        );
    }

    Ok(loaded)
}

fn strings_of(column: &Column) -> Result<Vec<Option<String>>> {
    let column = column.cast(&DataType::String)?;
    let values = column
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

fn required_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    strings_of(df.column(name)?)
}

fn optional_strings(df: &DataFrame, name: &str, height: usize) -> Result<Vec<Option<String>>> {
    match df.column(name) {
        Ok(column) => strings_of(column),
        Err(_) => Ok(vec![None; height]),
    }
}

fn optional_floats(df: &DataFrame, name: &str, height: usize) -> Result<Vec<Option<f64>>> {
    match df.column(name) {
        Ok(column) => {
            let column = column.cast(&DataType::Float64)?;
            let values = column.f64()?.into_iter().collect();
            Ok(values)
        }
        Err(_) => Ok(vec![None; height]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_csv_and_counts_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "event_name,attraction_name,venue_id,venue_name,venue_city,venue_state,segment_name,genre_name,min_price,max_price"
        )
        .unwrap();
        writeln!(file, "Show A,Band A,v1,Arena,Boston,MA,Music,Rock,10.5,50").unwrap();
        writeln!(file, "Show B,Band B,v2,Club,Boston,MA,Music,,12,30").unwrap();
        writeln!(file, "Game,Team,v3,Stadium,Denver,CO,Sports,Football,20,90").unwrap();
        drop(file);

        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.malformed, 1);

        let first = &loaded.records[0];
        assert_eq!(first.venue_id, "v1");
        assert_eq!(first.attraction_name.as_deref(), Some("Band A"));
        assert_eq!(first.min_price, Some(10.5));
        assert_eq!(first.max_price, Some(50.0));
        assert_eq!(first.sub_genre_name, None);
    }

    #[test]
    fn loads_parquet_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.parquet");
        let mut df = df!(
            "event_name" => ["Show A", "Game"],
            "attraction_name" => [Some("Band A"), None],
            "venue_id" => ["v1", "v3"],
            "venue_name" => ["Arena", "Stadium"],
            "venue_city" => ["Boston", "Denver"],
            "venue_state" => ["MA", "CO"],
            "segment_name" => ["Music", "Sports"],
            "genre_name" => [Some("Rock"), None],
            "sub_genre_name" => ["Indie", "NFL"],
            "min_price" => [Some(10.5), None],
            "max_price" => [50.0, 90.0]
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();

        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.malformed, 1);

        let record = &loaded.records[0];
        assert_eq!(record.venue_city, "Boston");
        assert_eq!(record.sub_genre_name.as_deref(), Some("Indie"));
        assert_eq!(record.min_price, Some(10.5));
        assert_eq!(record.max_price, Some(50.0));
        assert_eq!(record.venue_latitude, None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_events(dir.path().join("nope.csv"));
        assert!(matches!(result, Err(AnalyticsError::NotFound(_))));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let df = df!(
            "venue_id" => ["v1"],
            "venue_name" => ["Arena"]
        )
        .unwrap();
        assert!(matches!(
            events_from_frame(&df),
            Err(AnalyticsError::Polars(_))
        ));
    }
}
