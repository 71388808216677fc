use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use log::debug;
use validator::Validate;

use crate::{
    models::CreateLinkDto,
    services::{LinkService, LinkServiceTrait},
    types::Result,
};

/// Create link route handler
pub async fn create_handler(
    dto: web::Json<CreateLinkDto>,
    service: web::Data<LinkService>,
) -> Result<impl Responder> {
    let dto = dto.into_inner();
    dto.validate()?;

    let payload = dto.payload.unwrap_or_default();
    let link = service
        .allocate(&payload, dto.custom_code.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(link))
}

/// Resolve link route handler
///
/// The code is taken from the raw request path and percent-decoded by the
/// service exactly once.
pub async fn resolve_handler(
    req: HttpRequest,
    service: web::Data<LinkService>,
) -> Result<impl Responder> {
    let raw_code = req.uri().path().rsplit('/').next().unwrap_or_default();
    debug!("Resolve requested for code: {}", raw_code);

    let entry = service.resolve(raw_code).await?;
    let max_age = service.config().effective_cache_max_age();

    Ok(HttpResponse::Ok()
        .insert_header((
            header::CACHE_CONTROL,
            format!("public, max-age={}", max_age),
        ))
        .json(entry))
}
