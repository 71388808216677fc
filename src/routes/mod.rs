use actix_web::{http::header, web, HttpResponse, Responder};

use crate::{
    middleware::RateLimit,
    store::KvStore,
    types::{AppState, HealthStatus, ProbeStatus, WelcomePayload},
    utils::Clock,
};

mod link;

/// Key read by the warmup probe
const WARMUP_KEY: &str = "warmcheck";

// Handler function for the root route "/"
async fn index(data: web::Data<AppState>) -> impl Responder {
    let welcome_message = WelcomePayload {
        message: format!("Welcome to the {} API", data.name),
        version: data.version.clone(),
    };

    // Return the struct as JSON
    HttpResponse::Ok().json(welcome_message)
}

// Handler function for the health check endpoint
async fn health_check(data: web::Data<AppState>, store: web::Data<dyn KvStore>) -> impl Responder {
    // Calculate uptime in seconds
    let uptime = data.start_time.elapsed().as_secs();

    let status = HealthStatus {
        status: String::from("OK"),
        version: data.version.clone(),
        store_backend: store.backend().to_string(),
        uptime_seconds: uptime,
    };

    HttpResponse::Ok().json(status)
}

// Liveness probe reporting the server clock
async fn ping(clock: web::Data<dyn Clock>) -> impl Responder {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .json(ProbeStatus {
            status: String::from("ok"),
            time: Some(clock.now_millis()),
        })
}

// Touches the store so a cold backend connection gets established; the
// outcome of the read is irrelevant
async fn warmup(store: web::Data<dyn KvStore>) -> impl Responder {
    let _ = store.get(WARMUP_KEY).await;

    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "public, max-age=30"))
        .json(ProbeStatus {
            status: String::from("ok"),
            time: None,
        })
}

// Configure all routes function
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .wrap(RateLimit)
            .route(web::get().to(index)),
    );
    cfg.route("/health", web::get().to(health_check));
    cfg.route("/ping", web::get().to(ping));
    cfg.route("/warmup", web::get().to(warmup));

    link::configure_routes(cfg);
}
