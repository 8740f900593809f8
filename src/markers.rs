use anyhow::{Context, Result};
use std::{io::Write, path::Path};

use crate::{
    model::{Station, StationId},
    scale::RadiusScale,
    time_filter::TimeFilter,
};

/// GeoJSON line layer drawn underneath the station markers.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LineOverlay {
    pub id: &'static str,
    pub url: &'static str,
}

pub const BIKE_LANE_OVERLAYS: &[LineOverlay] = &[
    LineOverlay {
        id: "bike-lanes",
        url: concat!(
            "https://bostonopendata-boston.opendata.arcgis.com",
            "/datasets/boston::existing-bike-network-2022.geojson"
        ),
    },
    LineOverlay {
        id: "cambridge-bike-lanes",
        url: concat!(
            "https://raw.githubusercontent.com/cambridgegis/cambridgegis_data",
            "/main/Recreation/Bike_Facilities/RECREATION_BikeFacilities.geojson"
        ),
    },
];

#[derive(Debug, Clone, serde::Serialize)]
pub struct MarkerLayer {
    pub time_filter: i32,
    pub time_label: String,
    pub overlays: &'static [LineOverlay],
    pub markers: Vec<StationMarker>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StationMarker {
    pub station_id: StationId,
    pub longitude: f64,
    pub latitude: f64,
    pub radius: f64,
    pub arrivals: u32,
    pub departures: u32,
    pub total_traffic: u32,
    pub tooltip: String,
}

pub fn tooltip(station: &Station) -> String {
    format!(
        "{} trips ({} departures, {} arrivals)",
        station.total_traffic, station.departures, station.arrivals
    )
}

impl MarkerLayer {
    pub fn new(stations: &[Station], filter: TimeFilter, scale: &RadiusScale) -> Self {
        let markers = stations
            .iter()
            .map(|station| StationMarker {
                station_id: station.id,
                longitude: station.coordinates.longitude,
                latitude: station.coordinates.latitude,
                radius: scale.radius(station.total_traffic),
                arrivals: station.arrivals,
                departures: station.departures,
                total_traffic: station.total_traffic,
                tooltip: tooltip(station),
            })
            .collect();
        MarkerLayer {
            time_filter: filter.slider_value(),
            time_label: filter.label(),
            overlays: BIKE_LANE_OVERLAYS,
            markers,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn export_marker_layer(layer: &MarkerLayer, output_path: Option<&Path>) -> Result<()> {
    let json = layer.to_json()?;
    match output_path {
        Some(path) => {
            log::info!("Writing {} markers to {:?}", layer.markers.len(), path);
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            file.write_all(json.as_bytes())?;
        }
        None => println!("{}", json),
    }
    Ok(())
}
