use chrono::NaiveDateTime;
use ustr::{ustr, Ustr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct StationId(pub Ustr);

impl StationId {
    pub fn new(id: &str) -> Self {
        StationId(ustr(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Used for stations whose source record has no usable position.
    pub const ORIGIN: Coordinates = Coordinates {
        longitude: 0.0,
        latitude: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: Option<String>,
    pub coordinates: Coordinates,
    pub arrivals: u32,
    pub departures: u32,
    pub total_traffic: u32,
}

impl Station {
    pub fn new(id: StationId, coordinates: Coordinates) -> Self {
        Station {
            id,
            name: None,
            coordinates,
            arrivals: 0,
            departures: 0,
            total_traffic: 0,
        }
    }

    pub fn set_traffic(&mut self, arrivals: u32, departures: u32) {
        self.arrivals = arrivals;
        self.departures = departures;
        self.total_traffic = arrivals + departures;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub start_station_id: StationId,
    pub end_station_id: StationId,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}
