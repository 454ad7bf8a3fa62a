//! DevScan server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use devscan_lib::api::{self, ApiDoc};
use devscan_lib::config::Config;
use devscan_lib::db::DbPool;
use devscan_lib::middleware::{REQUEST_ID_HEADER, RequestLogger};
use devscan_lib::services::{self, AnalysisClient, GitHubClient};

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and DEVSCAN_SESSION_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  DevScan Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }
    if !config.github_oauth.enabled {
        warn!("GitHub OAuth is not configured; sign-in is disabled");
    }

    // Initialize database
    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    // Outbound HTTP clients
    let github = match GitHubClient::new(&config.github_api) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create GitHub client: {}", e);
            std::process::exit(1);
        }
    };
    let analysis = match AnalysisClient::new(&config.analysis) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create analysis client: {}", e);
            std::process::exit(1);
        }
    };
    info!("Analysis service: {}", config.analysis.service_url);

    let bind_address = config.bind_address();
    let cors_origin = config.cors_origin.clone();

    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);
    let github = web::Data::new(github);
    let analysis = web::Data::new(analysis);

    let server = HttpServer::new(move || {
        // Credentialed CORS for the single configured frontend origin
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static(REQUEST_ID_HEADER),
            ])
            .expose_headers(vec![header::HeaderName::from_static(REQUEST_ID_HEADER)])
            .supports_credentials()
            .max_age(3600);

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(RequestLogger)
            // Add shared state
            .app_data(config.clone())
            .app_data(pool.clone())
            .app_data(github.clone())
            .app_data(analysis.clone())
            // Configure API routes
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(services::configure_auth_routes)
                    .configure(api::configure_repo_routes)
                    .configure(api::configure_commit_routes),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}")
                    .url("/api/openapi.json", ApiDoc::openapi()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
