#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for safer.
//!
//! Serves the public incident dashboard API (list, detail, statistics,
//! weekly digest), the report submission and admin status endpoints,
//! community alert sign-ups, and the hire-an-agent job request flow with
//! price quotes.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use safer_database::{db, run_migrations};
use safer_pricing::PricingConfig;
use safer_server_models::ApiError;
use switchy_database::Database;

/// Shared application state.
pub struct AppState {
    /// Database connection, opened once at startup.
    pub db: Arc<dyn Database>,
    /// Pricing used for job quotes.
    pub pricing: Arc<PricingConfig>,
}

/// Registers every `/api` route. Literal incident paths are registered
/// before `/incidents/{id}` so they are not captured as ids.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid JSON body: {err}");
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(ApiError::new(message)))
            .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query parameters: {err}");
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(ApiError::new(message)))
            .into()
    }))
    .route("/health", web::get().to(handlers::health))
    .route("/incidents", web::get().to(handlers::list_incidents))
    .route("/incidents", web::post().to(handlers::submit_report))
    .route("/incidents/digest", web::get().to(handlers::incident_digest))
    .route("/incidents/status", web::post().to(handlers::update_incident_status))
    .route(
        "/incidents/stats/status-summary",
        web::get().to(handlers::status_summary),
    )
    .route("/incidents/stats/summary", web::get().to(handlers::totals_summary))
    .route("/incidents/stats/types", web::get().to(handlers::type_breakdown))
    .route("/incidents/stats/timeline", web::get().to(handlers::timeline))
    .route("/incidents/stats/victims", web::get().to(handlers::victim_totals))
    .route("/incidents/{id}", web::get().to(handlers::get_incident))
    .route("/pricing/quote", web::get().to(handlers::price_quote))
    .route("/subscribe", web::post().to(handlers::subscribe))
    .route("/jobs", web::get().to(handlers::list_jobs))
    .route("/jobs", web::post().to(handlers::create_job))
    .route("/jobs/status", web::post().to(handlers::update_job_status))
    .route("/jobs/{id}", web::get().to(handlers::get_job))
    .route("/jobs/{id}/quote", web::get().to(handlers::job_quote));
}

/// Starts the safer API server.
///
/// Connects to the database named by `DATABASE_URL`, runs migrations,
/// loads pricing from `PRICING_CONFIG` (or the built-in defaults), and
/// serves on `BIND_ADDR:PORT`. This is a regular async function; the
/// caller provides the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the database connection fails, migrations fail, or the
/// pricing configuration cannot be loaded.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .expect("Failed to connect to database");

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .expect("Failed to run migrations");

    let pricing_path = std::env::var("PRICING_CONFIG").ok().map(PathBuf::from);
    let pricing =
        PricingConfig::load(pricing_path.as_deref()).expect("Failed to load pricing config");

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
        pricing: Arc::new(pricing),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(web::scope("/api").configure(configure_api))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
