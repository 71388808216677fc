use std::{sync::Arc, time::Duration, time::Instant};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{debug, info};

use crate::{
    config::{Config, Environment},
    errors::AppError,
    middleware::RequestLogger,
    routes, services,
    store::{self, KvStore, MemoryStore, StoreBackend},
    types::AppState,
    utils::{Clock, SystemClock},
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

/// Largest accepted JSON body
const JSON_LIMIT_BYTES: usize = 32 * 1024;

/// How often the in-memory store drops expired entries
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> Result<(), AppError> {
    // Configure log level based on environment and config
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info".to_string(),
        Environment::Production => "info,actix_web=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

fn build_cors(config: &Config) -> Cors {
    let cors_config = config.cors.clone();
    Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .allowed_origin_fn(move |origin, _| {
            origin
                .to_str()
                .map(|origin| cors_config.allows(origin))
                .unwrap_or(false)
        })
}

/// Registers shared state, services and routes. Used by the server and by
/// the HTTP tests so both run the same wiring.
pub fn configure_app(
    cfg: &mut web::ServiceConfig,
    config: &Config,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    start_time: Instant,
) {
    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into());

    cfg.app_data(web::Data::new(AppState {
        start_time,
        name: config.app.name.clone(),
        version: config.app.version.clone(),
    }))
    // Make the full configuration available to handlers
    .app_data(web::Data::new(config.clone()))
    .app_data(web::Data::from(store.clone()))
    .app_data(web::Data::from(clock.clone()))
    .app_data(json_config);

    services::register(store, clock, config, cfg);
    routes::configure_routes(cfg);
}

/// Periodically drops expired entries so an idle in-memory store does not grow
fn spawn_purge_task(memory: Arc<MemoryStore>) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            memory.purge_expired().await;
        }
    });
}

pub async fn server() -> AppResult<()> {
    // Load application configuration
    let config = Config::load()?;

    // Setup enhanced logging based on configuration
    setup_logging(&config)?;

    // Capture start time for uptime calculation
    let start_time = Instant::now();

    // Log startup information
    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );
    info!(
        "Rate limit: {} requests per {}s, link ttl {}s",
        config.rate_limit.max_requests, config.rate_limit.window_seconds, config.links.ttl_seconds
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
        debug!("Full configuration: {:?}", config);
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn KvStore> = match config.store.backend {
        StoreBackend::Memory => {
            let memory = Arc::new(MemoryStore::new(clock.clone()));
            spawn_purge_task(memory.clone());
            memory
        }
        StoreBackend::Redis => store::connect(&config.store, clock.clone()).await?,
    };

    // Determine if we should enable more verbose logging
    let enable_debug_logging = config.app.environment != Environment::Production;

    // Create a cloned config for the closure
    let app_config = config.clone();

    // Determine log format based on environment
    let log_format = if enable_debug_logging {
        "%a \"%r\" %s %b %T"
    } else {
        "%a \"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{X-Request-ID}o"
    };

    // Start the HTTP server
    HttpServer::new(move || {
        let store = store.clone();
        let clock = clock.clone();
        let config = app_config.clone();

        App::new()
            .configure(|cfg| configure_app(cfg, &config, store, clock, start_time))
            .wrap(RequestLogger::new(enable_debug_logging))
            .wrap(Logger::new(log_format))
            .wrap(build_cors(&app_config))
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run()
    .await?;

    info!("{} stopped", config.app.name);
    Ok(())
}
