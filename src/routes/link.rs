use actix_web::{web, HttpRequest, Responder};

use crate::{
    config::Config,
    handlers::{create_handler, list_handler, resolve_handler},
    middleware::RateLimit,
    models::CreateLinkDto,
    services::LinkService,
    store::KvStore,
    types::Result,
};

// Create link route handler
async fn create_link(
    dto: web::Json<CreateLinkDto>,
    service: web::Data<LinkService>,
) -> Result<impl Responder> {
    create_handler(dto, service).await
}

// Resolve link route handler
async fn resolve_link(req: HttpRequest, service: web::Data<LinkService>) -> Result<impl Responder> {
    resolve_handler(req, service).await
}

// Admin key listing route handler
async fn list_keys(
    req: HttpRequest,
    config: web::Data<Config>,
    store: web::Data<dyn KvStore>,
) -> Result<impl Responder> {
    list_handler(req, config, store).await
}

// Configure all link routes, each behind the rate limiter
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/create")
            .wrap(RateLimit)
            .route(web::post().to(create_link)),
    )
    .service(
        web::resource("/resolve/{code}")
            .wrap(RateLimit)
            .route(web::get().to(resolve_link)),
    )
    .service(
        web::resource("/admin/list")
            .wrap(RateLimit)
            .route(web::get().to(list_keys)),
    );
}
