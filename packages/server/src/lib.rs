#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the parking availability board.
//!
//! Exposes exactly two operations over the report store and the
//! availability index: ingesting a report (`POST /api/parking/report`) and
//! searching for open spots near a point (`GET /api/parking/search`).
//! Authentication, sessions, and page rendering belong to the surrounding
//! web application and are not served here.

pub mod config;
mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use parking_index::AvailabilityIndex;
use parking_store::ReportStore;

pub use config::ServerConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Report store used by the ingest endpoint.
    pub store: ReportStore,
    /// Availability index used by the search endpoint.
    pub index: AvailabilityIndex,
}

impl AppState {
    /// Builds the state for an index; ingest goes to the index's store.
    #[must_use]
    pub fn new(index: AvailabilityIndex) -> Self {
        Self {
            store: index.store().clone(),
            index,
        }
    }
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(handlers::json_error))
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
            .route("/health", web::get().to(handlers::health))
            .route("/parking/report", web::post().to(handlers::report))
            .route("/parking/search", web::get().to(handlers::search)),
    );
}

/// Starts the API server with configuration from the environment.
///
/// Opens the configured report store and serves until shut down. This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration is invalid, the
/// store cannot be opened, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;
    run_server_with(config).await
}

/// Starts the API server with explicit configuration.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the store cannot be opened or the
/// HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server_with(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening report store...");
    let store = config.store.open().await.map_err(std::io::Error::other)?;

    log::info!(
        "Ranking within {} {} by default, at most {} result(s)",
        config.index.default_radius,
        config.index.unit,
        config.index.max_results
    );
    let state = web::Data::new(AppState::new(AvailabilityIndex::new(store, config.index)));

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
