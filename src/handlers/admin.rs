use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{info, warn};

use crate::{
    config::Config,
    errors::AppError,
    models::KeyListing,
    store::KvStore,
    types::Result,
    utils::hash::secrets_match,
};

/// Header carrying the administrative shared secret
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

fn authorize(req: &HttpRequest, config: &Config) -> Result<()> {
    let Some(secret) = config.admin.secret.as_deref() else {
        warn!("Admin listing requested but no admin secret is configured");
        return Err(AppError::Unauthorized("Admin access is disabled".to_string()));
    };

    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided.is_empty() || !secrets_match(provided, secret) {
        warn!("Rejected admin request with a bad or missing key");
        return Err(AppError::Unauthorized("Invalid admin key".to_string()));
    }

    Ok(())
}

/// List all live keys route handler
pub async fn list_handler(
    req: HttpRequest,
    config: web::Data<Config>,
    store: web::Data<dyn KvStore>,
) -> Result<impl Responder> {
    authorize(&req, &config)?;

    let keys = store.list().await?;
    info!("Admin listing returned {} keys", keys.len());

    Ok(HttpResponse::Ok().json(KeyListing {
        count: keys.len(),
        keys,
    }))
}
