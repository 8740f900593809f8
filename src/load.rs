use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};
use std::{path::PathBuf, str::FromStr};

use crate::model::{Coordinates, Station, StationId, Trip};

pub const DEFAULT_STATIONS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
pub const DEFAULT_TRIPS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";

const STATION_ID_KEYS: &[&str] = &["station_id", "short_name", "id", "Number"];
const STATION_NAME_KEYS: &[&str] = &["name", "NAME", "Name"];
const LONGITUDE_KEYS: &[&str] = &["lon", "Long", "longitude", "lng"];
const LATITUDE_KEYS: &[&str] = &["lat", "Lat", "latitude"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_string()))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DataSource {
    pub async fn read(&self) -> Result<Vec<u8>> {
        match self {
            DataSource::Url(url) => {
                log::info!("Fetching {}", url);
                let response = reqwest::get(url)
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?
                    .error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            DataSource::File(path) => {
                log::info!("Reading {:?}", path);
                tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {:?}", path))
            }
        }
    }
}

/// Stations and trips as loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub stations: Vec<Station>,
    pub trips: Vec<Trip>,
}

/// Fetches both inputs concurrently. A source that cannot be loaded is logged
/// and contributes an empty list so the rest of the pipeline keeps working.
pub async fn load_dataset(stations_source: &DataSource, trips_source: &DataSource) -> Dataset {
    let (stations, trips) = futures::join!(
        load_stations(stations_source),
        load_trips(trips_source)
    );

    let stations = stations.unwrap_or_else(|error| {
        log::error!("Error loading stations from {}: {:#}", stations_source, error);
        vec![]
    });
    let trips = trips.unwrap_or_else(|error| {
        log::error!("Error loading trips from {}: {:#}", trips_source, error);
        vec![]
    });
    log::info!("Loaded {} stations and {} trips", stations.len(), trips.len());
    Dataset { stations, trips }
}

pub async fn load_stations(source: &DataSource) -> Result<Vec<Station>> {
    let bytes = source.read().await?;
    parse_stations_json(&bytes)
}

pub async fn load_trips(source: &DataSource) -> Result<Vec<Trip>> {
    let bytes = source.read().await?;
    parse_trips_csv(&bytes[..])
}

pub fn parse_stations_json(bytes: &[u8]) -> Result<Vec<Station>> {
    let document: Value = serde_json::from_slice(bytes).context("Stations are not valid JSON")?;
    let records = match &document {
        Value::Array(records) => records,
        Value::Object(_) => match document.pointer("/data/stations") {
            Some(Value::Array(records)) => records,
            _ => bail!("Stations JSON has no data.stations array"),
        },
        _ => bail!("Stations JSON must be an object or an array"),
    };

    let mut stations = vec![];
    let mut skipped = 0usize;
    for record in records {
        let Some(record) = record.as_object() else {
            skipped += 1;
            continue;
        };
        match station_from_record(record) {
            Some(station) => stations.push(station),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {} station records without an identifier", skipped);
    }
    Ok(stations)
}

/// Takes the first key whose value converts, so an empty or zero value under
/// one spelling falls through to the next.
fn first_value<T>(
    record: &Map<String, Value>,
    keys: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(convert)
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if number == 0.0 || !number.is_finite() {
        return None;
    }
    Some(number)
}

fn station_from_record(record: &Map<String, Value>) -> Option<Station> {
    let id = first_value(record, STATION_ID_KEYS, value_as_string)?;
    let id = StationId::new(&id);
    let longitude = first_value(record, LONGITUDE_KEYS, value_as_coordinate);
    let latitude = first_value(record, LATITUDE_KEYS, value_as_coordinate);
    let coordinates = match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Coordinates {
            longitude,
            latitude,
        },
        _ => {
            log::warn!("Invalid coordinates for station {}", id);
            Coordinates::ORIGIN
        }
    };

    let mut station = Station::new(id, coordinates);
    station.name = first_value(record, STATION_NAME_KEYS, value_as_string);
    Some(station)
}

#[derive(Debug, serde::Deserialize)]
struct TripRecord {
    start_station_id: String,
    end_station_id: String,
    started_at: String,
    ended_at: String,
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|time| time.naive_local())
        })
}

fn trip_from_record(record: TripRecord) -> Option<Trip> {
    let start = record.start_station_id.trim();
    let end = record.end_station_id.trim();
    if start.is_empty() || end.is_empty() {
        return None;
    }
    Some(Trip {
        start_station_id: StationId::new(start),
        end_station_id: StationId::new(end),
        started_at: parse_timestamp(&record.started_at)?,
        ended_at: parse_timestamp(&record.ended_at)?,
    })
}

pub fn parse_trips_csv(reader: impl std::io::Read) -> Result<Vec<Trip>> {
    let progress = indicatif::ProgressBar::new_spinner().with_style(
        indicatif::ProgressStyle::with_template("[{elapsed_precise}] {spinner} {human_pos} {msg}")?,
    );
    progress.set_message("trips parsed");

    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut trips = vec![];
    let mut skipped = 0usize;
    for record in csv_reader.deserialize::<TripRecord>() {
        let trip = match record {
            Ok(record) => trip_from_record(record),
            Err(error) => {
                if let csv::ErrorKind::Io(_) = error.kind() {
                    return Err(error).context("Failed to read trips CSV");
                }
                None
            }
        };
        match trip {
            Some(trip) => trips.push(trip),
            None => skipped += 1,
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if skipped > 0 {
        log::warn!("Skipped {} trip records that could not be parsed", skipped);
    }
    Ok(trips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const STATIONS_JSON: &str = r#"{
        "data": {
            "stations": [
                {"station_id": "A32000", "name": "Fan Pier", "lon": -71.044, "lat": 42.353},
                {"short_name": "B32006", "Long": "-71.09", "Lat": "42.36"},
                {"station_id": "C32001", "longitude": 0, "latitude": 42.1},
                {"name": "No id here", "lon": -71.0, "lat": 42.0},
                {"station_id": "D32002"}
            ]
        }
    }"#;

    const TRIPS_CSV: &str = "\
ride_id,start_station_id,end_station_id,started_at,ended_at,is_member
r1,A32000,B32006,2024-03-01 08:00:06.123,2024-03-01 08:10:41.000,1
r2,B32006,A32000,2024-03-01T17:45:00,2024-03-01T18:05:00,0
r3,A32000,,2024-03-01 09:00:00,2024-03-01 09:10:00,1
r4,A32000,B32006,yesterday,2024-03-01 09:10:00,1
";

    #[test]
    fn stations_are_normalized_from_key_variants() {
        let stations = parse_stations_json(STATIONS_JSON.as_bytes()).unwrap();
        let ids: Vec<&str> = stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A32000", "B32006", "C32001", "D32002"]);

        assert_eq!(stations[0].name.as_deref(), Some("Fan Pier"));
        assert_eq!(stations[0].coordinates.longitude, -71.044);
        assert_eq!(stations[1].coordinates.latitude, 42.36);
        assert_eq!(stations[2].coordinates, Coordinates::ORIGIN);
        assert_eq!(stations[3].coordinates, Coordinates::ORIGIN);
    }

    #[test]
    fn rejected_coordinate_falls_through_to_next_spelling() {
        let json = r#"[{
            "station_id": "", "id": "E1",
            "lon": 0, "Long": -71.1,
            "lat": "", "latitude": 42.3
        }]"#;
        let stations = parse_stations_json(json.as_bytes()).unwrap();
        assert_eq!(stations[0].id.as_str(), "E1");
        assert_eq!(
            stations[0].coordinates,
            Coordinates {
                longitude: -71.1,
                latitude: 42.3
            }
        );
    }

    #[test]
    fn bare_station_array_is_accepted() {
        let stations =
            parse_stations_json(br#"[{"id": 7, "lon": -71.1, "lat": 42.3}]"#).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id.as_str(), "7");
    }

    #[test]
    fn stations_without_array_are_rejected() {
        assert!(parse_stations_json(br#"{"data": {}}"#).is_err());
        assert!(parse_stations_json(b"not json").is_err());
    }

    #[test]
    fn trips_skip_unparseable_rows() {
        let trips = parse_trips_csv(TRIPS_CSV.as_bytes()).unwrap();
        assert_eq!(trips.len(), 2);

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(trips[0].start_station_id.as_str(), "A32000");
        assert_eq!(trips[0].end_station_id.as_str(), "B32006");
        assert_eq!(
            trips[0].started_at,
            day.and_hms_milli_opt(8, 0, 6, 123).unwrap()
        );
        assert_eq!(trips[1].ended_at, day.and_hms_opt(18, 5, 0).unwrap());
    }

    #[test]
    fn rfc3339_timestamps_keep_wall_clock_time() {
        let time = parse_timestamp("2024-03-01T08:15:00-05:00").unwrap();
        assert_eq!(time.format("%H:%M").to_string(), "08:15");
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn data_source_detects_urls() {
        assert_eq!(
            "https://example.com/trips.csv".parse::<DataSource>().unwrap(),
            DataSource::Url("https://example.com/trips.csv".to_string())
        );
        assert_eq!(
            "data/trips.csv".parse::<DataSource>().unwrap(),
            DataSource::File(PathBuf::from("data/trips.csv"))
        );
    }

    #[tokio::test]
    async fn dataset_loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let stations_path = dir.path().join("stations.json");
        let trips_path = dir.path().join("trips.csv");
        std::fs::write(&stations_path, STATIONS_JSON).unwrap();
        std::fs::write(&trips_path, TRIPS_CSV).unwrap();

        let dataset = load_dataset(
            &DataSource::File(stations_path),
            &DataSource::File(trips_path),
        )
        .await;
        assert_eq!(dataset.stations.len(), 4);
        assert_eq!(dataset.trips.len(), 2);
    }

    #[tokio::test]
    async fn missing_files_degrade_to_empty_lists() {
        let dir = tempfile::tempdir().unwrap();
        let trips_path = dir.path().join("trips.csv");
        std::fs::write(&trips_path, TRIPS_CSV).unwrap();

        let dataset = load_dataset(
            &DataSource::File(dir.path().join("missing.json")),
            &DataSource::File(trips_path),
        )
        .await;
        assert!(dataset.stations.is_empty());
        assert_eq!(dataset.trips.len(), 2);
    }
}
