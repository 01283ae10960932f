#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::cargo_common_metadata,
    clippy::future_not_send
)]

//! Actix-Web API server for the incident dashboard.
//!
//! Serves read-only JSON endpoints for KPIs, trends, distributions, the
//! sector/week heatmap and the paginated incident list. All queries go
//! through `ops_dashboard_analytics` against a single shared Postgres
//! connection.

mod error;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use ops_dashboard_database::db;
use switchy_database::Database;

pub use error::ApiError;

/// Shared application state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<dyn Database>,
}

/// Interface bound when `BIND_ADDR` is not set.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Port used when `PORT` is not set or not a valid port number.
pub const DEFAULT_PORT: u16 = 8000;

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// TCP port.
    pub port: u16,
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("BIND_ADDR").ok(),
            std::env::var("PORT").ok().as_deref(),
        )
    }

    /// Builds a config from raw values, falling back to the defaults for
    /// anything missing or unparseable.
    #[must_use]
    pub fn from_values(bind_addr: Option<String>, port: Option<&str>) -> Self {
        let port = port.map_or(DEFAULT_PORT, |p| {
            p.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{p}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            })
        });

        Self {
            bind_addr: bind_addr.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
        }
    }
}

/// Registers every API route together with the extractor configs that
/// turn malformed query strings and paths into JSON error bodies.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::Malformed {
            parameter: None,
            message: err.to_string(),
        }
        .into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::Malformed {
            parameter: Some("id"),
            message: err.to_string(),
        }
        .into()
    }))
    .route("/", web::get().to(handlers::root))
    .route("/health", web::get().to(handlers::health))
    .route("/filters", web::get().to(handlers::filters))
    .route("/kpi", web::get().to(handlers::kpi))
    .route("/trend", web::get().to(handlers::trend))
    .route(
        "/distribution/sectors",
        web::get().to(handlers::distribution_sectors),
    )
    .route(
        "/distribution/directions",
        web::get().to(handlers::distribution_directions),
    )
    .route(
        "/distribution/types",
        web::get().to(handlers::distribution_types),
    )
    .route("/heatmap", web::get().to(handlers::heatmap))
    .route("/incidents", web::get().to(handlers::incidents))
    .route("/incidents/{id}", web::get().to(handlers::incident));
}

/// Starts the incident dashboard API server.
///
/// Connects to Postgres using `DATABASE_URL` and starts the Actix-Web
/// HTTP server on `BIND_ADDR:PORT`. This is a regular async function; the
/// caller provides the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database connection fails,
/// the HTTP server fails to bind, or it encounters a runtime error.
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env().await.map_err(|e| {
        log::error!("Failed to connect to database: {e}");
        std::io::Error::other(e.to_string())
    })?;

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
    });

    let ServerConfig { bind_addr, port } = ServerConfig::from_env();

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
