use crate::{
    load::Dataset,
    markers::MarkerLayer,
    model::{Station, Trip},
    scale::RadiusScale,
    time_filter::{filter_trips_by_time, TimeFilter},
    traffic::{compute_station_traffic, max_total_traffic, TrafficSummary},
};

/// Everything the map view needs between slider events.
#[derive(Debug, Clone)]
pub struct AppState {
    stations: Vec<Station>,
    trips: Vec<Trip>,
    time_filter: TimeFilter,
    window_minutes: u16,
}

impl AppState {
    pub fn new(dataset: Dataset, window_minutes: u16) -> Self {
        let mut state = AppState {
            stations: dataset.stations,
            trips: dataset.trips,
            time_filter: TimeFilter::Any,
            window_minutes,
        };
        state.set_time_filter(TimeFilter::Any);
        state
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.time_filter
    }

    /// Recomputes traffic from the full trip list for the new filter.
    pub fn set_time_filter(&mut self, filter: TimeFilter) -> TrafficSummary {
        let filtered = filter_trips_by_time(&self.trips, filter, self.window_minutes);
        compute_station_traffic(&mut self.stations, &filtered);
        self.time_filter = filter;
        log::debug!(
            "Filter {} keeps {} of {} trips",
            filter.label(),
            filtered.len(),
            self.trips.len()
        );
        TrafficSummary::new(&self.stations, &filtered)
    }

    pub fn marker_layer(&self) -> MarkerLayer {
        let scale = RadiusScale::for_filter(self.time_filter, max_total_traffic(&self.stations));
        MarkerLayer::new(&self.stations, self.time_filter, &scale)
    }
}
