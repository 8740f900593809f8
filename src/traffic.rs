use std::{cmp::Ordering, collections::HashMap};

use crate::model::{Station, StationId, Trip};

/// Overwrites the arrival, departure and total counters of every station with
/// counts taken from `trips`. Nothing from a previous call is carried over.
pub fn compute_station_traffic(stations: &mut [Station], trips: &[Trip]) {
    let mut departures: HashMap<StationId, u32> = HashMap::new();
    let mut arrivals: HashMap<StationId, u32> = HashMap::new();
    for trip in trips {
        *departures.entry(trip.start_station_id).or_insert(0) += 1;
        *arrivals.entry(trip.end_station_id).or_insert(0) += 1;
    }

    for station in stations.iter_mut() {
        station.set_traffic(
            arrivals.get(&station.id).copied().unwrap_or(0),
            departures.get(&station.id).copied().unwrap_or(0),
        );
    }
}

pub fn max_total_traffic(stations: &[Station]) -> u32 {
    stations
        .iter()
        .map(|station| station.total_traffic)
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSummary {
    pub stations: usize,
    pub trips: usize,
    pub busiest: Option<(StationId, u32)>,
}

impl TrafficSummary {
    pub fn new(stations: &[Station], trips: &[Trip]) -> Self {
        let busiest = stations
            .iter()
            .filter(|station| station.total_traffic > 0)
            .min_by(|a, b| busier_first(a, b))
            .map(|station| (station.id, station.total_traffic));
        TrafficSummary {
            stations: stations.len(),
            trips: trips.len(),
            busiest,
        }
    }
}

/// Descending total traffic, ties broken by ascending id.
fn busier_first(a: &Station, b: &Station) -> Ordering {
    b.total_traffic
        .cmp(&a.total_traffic)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn busiest_stations(stations: &[Station], count: usize) -> Vec<&Station> {
    let mut sorted: Vec<&Station> = stations.iter().collect();
    sorted.sort_by(|a, b| busier_first(a, b));
    sorted.truncate(count);
    sorted
}
