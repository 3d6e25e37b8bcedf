#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the parking availability board.
//!
//! Reads the same environment configuration as the server
//! (`PARKING_STORE`, `PARKING_DATA_PATH`, `PARKING_DISTANCE_UNIT`, ...), so
//! reports filed here show up in the server's searches and vice versa.

use clap::{Parser, Subcommand};
use parking_index::{AvailabilityIndex, IndexConfig, SearchRequest};
use parking_report_models::{DraftCoordinates, LocationKind, ReportDraft};
use parking_server_models::SearchResponse;
use parking_store::StoreConfig;

#[derive(Parser)]
#[command(name = "parking_cli", about = "Parking availability board tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Report open parking spots
    Report {
        /// Latitude of the spots
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the spots
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Street address
        #[arg(long)]
        address: String,
        /// Number of open spots
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        spots: i64,
        /// How the coordinates were obtained ("current" or "other")
        #[arg(long, default_value = "other")]
        location: LocationKind,
    },
    /// Search for open spots near a point
    Search {
        /// Query latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Query longitude
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Search radius in the configured unit (defaults to the configured radius)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Print every active report
    List,
}

fn report_draft(
    lat: f64,
    lng: f64,
    address: String,
    spots: i64,
    location: LocationKind,
) -> ReportDraft {
    ReportDraft {
        location_kind: Some(location),
        spot_count: Some(spots.into()),
        address: Some(address),
        coordinates: Some(DraftCoordinates {
            lat: Some(lat),
            lng: Some(lng),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so run it on a blocking
            // thread rather than nesting runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(parking_server::run_server())
            })
            .await??;
        }
        Commands::Report {
            lat,
            lng,
            address,
            spots,
            location,
        } => {
            let store = StoreConfig::from_env()?.open().await?;
            let draft = report_draft(lat, lng, address, spots, location);
            let report = store.append(&draft).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Search { lat, lng, radius } => {
            let store = StoreConfig::from_env()?.open().await?;
            let index = AvailabilityIndex::new(store, IndexConfig::from_env()?);
            let results = index.query(&SearchRequest::new(lat, lng, radius)).await?;
            let response = SearchResponse::from(results);
            if let Some(message) = &response.message {
                log::info!("{message}");
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::List => {
            let store = StoreConfig::from_env()?.open().await?;
            let reports = store.scan_active().await?;
            log::info!("{} active report(s)", reports.len());
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_arguments_become_a_valid_draft() {
        let cli = Cli::try_parse_from([
            "parking_cli",
            "report",
            "--lat",
            "37.77",
            "--lng",
            "-122.42",
            "--address",
            "Hayes St",
            "--spots",
            "2",
            "--location",
            "current",
        ])
        .unwrap();

        let Commands::Report {
            lat,
            lng,
            address,
            spots,
            location,
        } = cli.command
        else {
            panic!("expected report command");
        };

        let report = report_draft(lat, lng, address, spots, location)
            .validate()
            .unwrap();
        assert_eq!(report.spot_count, 2);
        assert_eq!(report.location_kind, LocationKind::Current);
        assert!((report.coordinates.lng + 122.42).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_spots_fail_validation() {
        let draft = report_draft(37.77, -122.42, "x".to_string(), 0, LocationKind::Other);
        assert!(draft.validate().is_err());
    }
}
