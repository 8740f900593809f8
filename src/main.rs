use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

mod app_state;
mod load;
mod markers;
mod model;
mod scale;
mod time_filter;
mod traffic;

use app_state::AppState;
use load::DataSource;
use time_filter::{TimeFilter, DEFAULT_WINDOW_MINUTES};
use traffic::{busiest_stations, TrafficSummary};

#[derive(Parser, Debug)]
#[command(about = "Bike-share station traffic by time of day")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the station marker layer as JSON.
    Export {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the busiest stations for one time filter.
    Summary {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Read slider values from stdin and print a summary for each.
    Explore {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Station metadata JSON, as a path or http(s) URL.
    #[arg(long, default_value = load::DEFAULT_STATIONS_URL)]
    stations: DataSource,
    /// Trip log CSV, as a path or http(s) URL.
    #[arg(long, default_value = load::DEFAULT_TRIPS_URL)]
    trips: DataSource,
    /// Minute of the day (0-1439), or -1 for the whole day.
    #[arg(long, default_value_t = time_filter::ANY_TIME, allow_negative_numbers = true)]
    time: i32,
    /// Trips starting or ending this many minutes from the selected time are kept.
    #[arg(long, default_value_t = DEFAULT_WINDOW_MINUTES)]
    window: u16,
}

impl DataArgs {
    async fn load_state(&self) -> Result<(AppState, TrafficSummary)> {
        let filter = TimeFilter::from_slider(self.time)?;
        let dataset = load::load_dataset(&self.stations, &self.trips).await;
        let mut state = AppState::new(dataset, self.window);
        let summary = state.set_time_filter(filter);
        if let Some((station_id, traffic)) = summary.busiest {
            log::info!("Busiest station is {} with {} trips", station_id, traffic);
        }
        Ok((state, summary))
    }
}

fn print_summary(state: &AppState, summary: &TrafficSummary, top: usize) {
    println!(
        "{}: {} of {} trips across {} stations",
        state.time_filter().label(),
        summary.trips,
        state.trips().len(),
        summary.stations
    );
    for station in busiest_stations(state.stations(), top) {
        println!(
            "  {:>10}  {:<40}  {}",
            station.id.as_str(),
            station.name.as_deref().unwrap_or(""),
            markers::tooltip(station)
        );
    }
}

fn slider_filter(line: &str) -> Result<TimeFilter> {
    let value = line
        .parse::<i32>()
        .with_context(|| format!("{:?} is not a whole number", line))?;
    TimeFilter::from_slider(value)
}

/// Applies one slider value per input line and returns how many were applied.
async fn explore(
    state: &mut AppState,
    input: impl AsyncBufRead + Unpin,
    top: usize,
) -> Result<usize> {
    let mut applied = 0;
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let filter = match slider_filter(line) {
            Ok(filter) => filter,
            Err(error) => {
                log::warn!("Ignoring slider value: {:#}", error);
                continue;
            }
        };
        let summary = state.set_time_filter(filter);
        print_summary(state, &summary, top);
        applied += 1;
    }
    Ok(applied)
}

#[tokio::main]
async fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let cli = Cli::parse();
    match cli.command {
        Command::Export { data, output } => {
            let (state, _) = data.load_state().await?;
            markers::export_marker_layer(&state.marker_layer(), output.as_deref())?;
        }
        Command::Summary { data, top } => {
            let (state, summary) = data.load_state().await?;
            print_summary(&state, &summary, top);
        }
        Command::Explore { data, top } => {
            let (mut state, _) = data.load_state().await?;
            let stdin = BufReader::new(tokio::io::stdin());
            let applied = explore(&mut state, stdin, top).await?;
            log::info!("Applied {} slider values", applied);
        }
    }
    Ok(())
}
