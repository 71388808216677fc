use std::sync::Arc;

use actix_web::web;

mod link;
mod rate_limiter;

pub use link::{normalize_code, LinkService, LinkServiceTrait};
pub use rate_limiter::{RateDecision, RateLimiter};

use crate::{config::Config, store::KvStore, utils::Clock};

/// Service Register
pub fn register(
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    config: &Config,
    cfg: &mut web::ServiceConfig,
) {
    let link_service = LinkService::new(store.clone(), clock.clone(), config.links.clone());
    let rate_limiter = RateLimiter::new(store, clock, config.rate_limit.clone());
    cfg.app_data(web::Data::new(link_service));
    cfg.app_data(web::Data::new(rate_limiter));
}
